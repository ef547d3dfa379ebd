//! OpenShift image-stream-tag updates.

pub mod header;
pub mod payload;
pub mod target;
pub mod updater;

pub use header::build_header;
pub use payload::ImageStreamTag;
pub use target::{TargetSelector, TargetSpec};
pub use updater::{TagUpdate, TagUpdater, UpdateOutcome, UpstreamResponse};
