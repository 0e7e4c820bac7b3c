pub mod concurrency;
pub mod merge;
pub mod orchestrator;
pub mod sync;

pub use concurrency::map_with_concurrency;
pub use merge::merge;
pub use orchestrator::{Harvester, RunState, RunSummary};
