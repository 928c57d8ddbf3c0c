use crate::{Error, Result};
use std::time::Duration;

/// The semantic action attempted against each target profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionRole {
    /// Send a relationship request, optionally with a personalized note.
    Connect,
    /// Send a direct message to an existing contact.
    Message,
}

impl ActionRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionRole::Connect => "connect",
            ActionRole::Message => "message",
        }
    }
}

/// Validated run settings consumed by the orchestrator.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Maximum permitted actions per calendar day.
    pub daily_limit: u32,

    /// Lower bound of the randomized inter-action pause.
    pub delay_min: Duration,

    /// Upper bound of the randomized inter-action pause.
    pub delay_max: Duration,

    /// Which action to perform on each target.
    pub role: ActionRole,

    /// Note/message template; `{name}` and target columns are substituted.
    pub note_template: Option<String>,

    /// Emit diagnostic screenshots at each pipeline step.
    pub debug: bool,
}

impl RunConfig {
    /// Check the settings before any browser work starts.
    ///
    /// Invalid bounds are a hard stop, not something to paper over with
    /// defaults mid-run.
    pub fn validate(&self) -> Result<()> {
        if self.daily_limit == 0 {
            return Err(Error::Config(
                "daily limit must be a positive integer".to_string(),
            ));
        }

        if self.delay_min > self.delay_max {
            return Err(Error::Config(format!(
                "delay range is inverted: min {}s > max {}s",
                self.delay_min.as_secs(),
                self.delay_max.as_secs()
            )));
        }

        Ok(())
    }
}
