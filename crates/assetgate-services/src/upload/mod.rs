//! Upload pipeline coordination

pub mod batch;
pub mod orchestrator;
pub mod stage;

pub use batch::BatchItemResult;
pub use orchestrator::UploadOrchestrator;
pub use stage::{StageTracker, UploadStage};
