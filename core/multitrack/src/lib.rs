pub mod config;
pub mod constants;
pub mod decoder;
pub mod device_manager;
pub mod error;
pub mod graph;
pub mod mixer;
pub mod scheduler;
pub mod track;

pub use error::{DecodeError, SourceError, TrackError};
