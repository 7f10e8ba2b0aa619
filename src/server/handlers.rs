mod dispatch;
mod stream;

pub use dispatch::dispatch;
pub use stream::handle_stream;
