pub mod classifier;
pub mod error;
pub mod locator;
pub mod orchestrator;
pub mod session;

pub use classifier::StateMarkers;
pub use error::{Error, Result};
pub use locator::{ControlRole, LocatedControl, Strategy, StrategySpec};
pub use orchestrator::{Orchestrator, RunSummary};
pub use session::{LocatorQuery, PageSession};
