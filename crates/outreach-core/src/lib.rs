pub mod config;
pub mod delay;
pub mod error;
pub mod ledger;
pub mod quota;
pub mod target;
pub mod template;

pub use config::{ActionRole, RunConfig};
pub use delay::DelayScheduler;
pub use error::{Error, Result};
pub use ledger::{ActionRecord, OutcomeKind, ResultLedger};
pub use quota::{QuotaState, QuotaTracker};
pub use target::Target;
pub use template::MessageTemplate;
