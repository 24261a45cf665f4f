pub mod engine;
pub mod fallback;

pub use engine::{Orchestrator, PipelineFault};
pub use fallback::{with_local_fallback, StrategyOutcome};
