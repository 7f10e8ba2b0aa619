pub mod client;
pub mod codec;
pub mod headers;
pub mod redirect;

pub use client::ProxyClient;
pub use codec::ContentEncoding;
pub use headers::AuthParams;
pub use redirect::RedirectResolver;
