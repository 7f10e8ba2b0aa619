pub mod chain;
pub mod classifier;
pub mod context;
pub mod remote;
pub mod transforms;

pub use chain::TransformChain;
pub use classifier::RouteKind;
pub use context::RequestContext;
pub use transforms::{PlaybackInfoRewrite, PlayerScriptPatch, ResponseTransform};
