pub mod client;
pub mod models;

pub use client::EmbyClient;
pub use models::{
    BaseItem, ItemsResponse, MediaSource, PlaybackInfoResponse, Protocol, strip_source_prefix,
};
