pub mod cache;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod segment;
pub mod source;
pub mod stitch;
