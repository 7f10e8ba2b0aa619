pub mod config;
pub mod emby;
pub mod error;
pub mod proxy;
pub mod rewrite;
pub mod rules;
pub mod server;

#[cfg(test)]
mod test_util;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
