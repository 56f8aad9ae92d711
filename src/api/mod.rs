pub mod downstream;

pub use downstream::{DownstreamApi, DownstreamClient, DownstreamReply};
