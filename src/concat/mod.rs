//! Clip concatenation: timeline placement and lossless export

mod export;
mod timeline;

pub use export::{concat_manifest, concatenate, ExportRequest, ExportResult};
pub use timeline::{Timeline, TimelineEntry};
