//! The per-target state machine.
//!
//! One target is fully processed (navigate, locate, act, classify,
//! record) before the next begins; the browser session is exclusively
//! owned here and never shared. Per-target errors become `Failed` ledger
//! rows and the run continues; only a lost session is fatal.

use crate::classifier::{classify, StateMarkers};
use crate::locator::{self, ControlRole, LocatedControl};
use crate::session::PageSession;
use crate::Result;
use outreach_core::{
    ActionRecord, ActionRole, DelayScheduler, MessageTemplate, OutcomeKind, QuotaTracker,
    ResultLedger, RunConfig, Target,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_CONFIRMATION_WAIT: Duration = Duration::from_secs(6);
const CONFIRMATION_POLL: Duration = Duration::from_millis(500);

/// Counts reported when a run finishes or stops.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub succeeded: usize,
    pub already_done: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.already_done + self.failed
    }

    pub fn total(&self) -> usize {
        self.attempted() + self.skipped
    }

    fn tally(&mut self, outcome: OutcomeKind) {
        match outcome {
            OutcomeKind::Succeeded => self.succeeded += 1,
            OutcomeKind::AlreadyDone => self.already_done += 1,
            OutcomeKind::Failed => self.failed += 1,
            OutcomeKind::Skipped => self.skipped += 1,
        }
    }
}

/// Drives the pipeline: quota permit, navigate, locate, act, classify,
/// record, wait.
pub struct Orchestrator<S: PageSession> {
    session: S,
    config: RunConfig,
    quota: QuotaTracker,
    delay: DelayScheduler,
    markers: StateMarkers,
    template: Option<MessageTemplate>,
    confirmation_wait: Duration,
    abort: Arc<AtomicBool>,
}

impl<S: PageSession> Orchestrator<S> {
    /// Build an orchestrator; fails fast on an invalid configuration
    /// before any browser work starts.
    pub fn new(session: S, config: RunConfig, quota: QuotaTracker) -> Result<Self> {
        config.validate()?;
        let delay = DelayScheduler::new(config.delay_min, config.delay_max)?;
        let template = config
            .note_template
            .as_ref()
            .map(|template| MessageTemplate::new(template.clone()));

        Ok(Self {
            session,
            config,
            quota,
            delay,
            markers: StateMarkers::default(),
            template,
            confirmation_wait: DEFAULT_CONFIRMATION_WAIT,
            abort: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Replace the default state markers.
    pub fn with_markers(mut self, markers: StateMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// Bound the post-action confirmation wait (tests shorten this).
    pub fn with_confirmation_wait(mut self, wait: Duration) -> Self {
        self.confirmation_wait = wait;
        self
    }

    /// Flag checked at state-machine step boundaries only, never while
    /// a page interaction is in flight, so an operator stop cannot
    /// leave the browser mid-action.
    pub fn abort_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Process the whole queue. Every target gets exactly one ledger
    /// row, including the ones never attempted.
    pub async fn run(
        &mut self,
        targets: Vec<Target>,
        ledger: &mut ResultLedger,
        mut on_record: impl FnMut(&ActionRecord),
    ) -> Result<RunSummary> {
        let total = targets.len();
        let mut summary = RunSummary::default();

        tracing::info!(
            "Starting run: {} targets, {} actions remaining today",
            total,
            self.quota.remaining()
        );

        let mut idx = 0;
        while idx < targets.len() {
            if self.abort.load(Ordering::SeqCst) {
                tracing::warn!("Abort requested, skipping {} targets", targets.len() - idx);
                self.skip_rest(&targets[idx..], "operator abort", ledger, &mut summary, &mut on_record)?;
                break;
            }

            if !self.quota.try_reserve()? {
                self.skip_rest(
                    &targets[idx..],
                    "daily limit reached",
                    ledger,
                    &mut summary,
                    &mut on_record,
                )?;
                break;
            }

            let target = &targets[idx];
            tracing::info!("Target {}/{}: {}", idx + 1, total, target.profile_url);

            let record = match self.process_target(target).await {
                Ok(record) => record,
                Err(err) if err.is_fatal() => {
                    // Flush what we have; the caller reports completed
                    // vs. remaining counts.
                    ledger.flush()?;
                    tracing::error!(
                        "Session lost after {} of {} targets: {}",
                        summary.attempted(),
                        total,
                        err
                    );
                    return Err(err);
                }
                Err(err) => ActionRecord::new(
                    &target.profile_url,
                    OutcomeKind::Failed,
                    Some(err.to_string()),
                ),
            };

            summary.tally(record.outcome);
            on_record(&record);
            // Record before waiting: a crash mid-pause never loses a
            // completed action's row.
            ledger.append(record)?;

            idx += 1;
            if idx < targets.len() {
                let pause = self.delay.next_delay();
                if !pause.is_zero() {
                    tracing::info!("Waiting {:.1}s before next target", pause.as_secs_f64());
                }
                tokio::time::sleep(pause).await;
            }
        }

        ledger.flush()?;
        tracing::info!(
            "Run finished: {} succeeded, {} already done, {} failed, {} skipped",
            summary.succeeded,
            summary.already_done,
            summary.failed,
            summary.skipped
        );
        Ok(summary)
    }

    async fn process_target(&self, target: &Target) -> Result<ActionRecord> {
        // Loading
        if let Err(err) = self.session.navigate(&target.profile_url).await {
            if err.is_fatal() {
                return Err(err);
            }
            return Ok(ActionRecord::new(
                &target.profile_url,
                OutcomeKind::Failed,
                Some(format!("navigation failed: {}", err)),
            ));
        }
        self.capture("profile_page").await;

        let page_before = match self.session.page_text().await {
            Ok(text) => text,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                tracing::warn!("Could not read page text: {}", err);
                String::new()
            }
        };

        // Locating
        let located = match locator::locate(&self.session, ControlRole::primary(self.config.role)).await
        {
            Ok(located) => located,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                return Ok(ActionRecord::new(
                    &target.profile_url,
                    OutcomeKind::Failed,
                    Some(format!("element lookup failed: {}", err)),
                ));
            }
        };

        // Acting
        let performed = match &located {
            None => {
                self.capture("control_not_found").await;
                false
            }
            Some(control) => match self.perform_action(target, control).await {
                Ok(()) => true,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    self.capture("action_error").await;
                    return Ok(ActionRecord::new(
                        &target.profile_url,
                        OutcomeKind::Failed,
                        Some(format!("action raised an error: {}", err)),
                    ));
                }
            },
        };

        // Classifying
        let page_after = if performed {
            self.await_confirmation().await
        } else {
            String::new()
        };

        let (outcome, detail) = classify(
            &self.markers,
            located.as_ref().map(|control| control.strategy),
            performed,
            &page_before,
            &page_after,
        );

        Ok(ActionRecord::new(&target.profile_url, outcome, detail))
    }

    /// Click the primary control, best-effort note entry, then the send
    /// control when the layout presents one.
    async fn perform_action(
        &self,
        target: &Target,
        control: &LocatedControl<S::Handle>,
    ) -> Result<()> {
        self.capture("before_primary_click").await;
        self.session.click(&control.handle).await?;
        self.capture("after_primary_click").await;

        if let Some(template) = &self.template {
            let text = template.render(target);
            match self.config.role {
                ActionRole::Connect => self.try_add_note(&text).await?,
                ActionRole::Message => self.try_type_into_field(&text).await?,
            }
        }

        // Some layouts submit on the primary click alone; a missing send
        // control is left to the confirmation check, not failed here.
        if let Some(send) = locator::locate(&self.session, ControlRole::Send).await? {
            self.capture("before_send_click").await;
            self.session.click(&send.handle).await?;
            self.capture("after_send_click").await;
        }

        Ok(())
    }

    /// Open the add-note dialog and type the note. Missing dialog
    /// controls downgrade to sending without a note.
    async fn try_add_note(&self, note: &str) -> Result<()> {
        let Some(add_note) = locator::locate(&self.session, ControlRole::AddNote).await? else {
            tracing::warn!("Add-note control not present, sending without note");
            return Ok(());
        };
        self.session.click(&add_note.handle).await?;

        self.try_type_into_field(note).await
    }

    async fn try_type_into_field(&self, text: &str) -> Result<()> {
        let Some(field) = locator::locate(&self.session, ControlRole::NoteField).await? else {
            tracing::warn!("Text field not found, continuing without it");
            return Ok(());
        };
        self.session.type_text(&field.handle, text).await?;
        self.capture("text_entered").await;
        Ok(())
    }

    /// Poll the page for a confirmation marker within the bounded wait;
    /// returns the last observed page text either way.
    async fn await_confirmation(&self) -> String {
        let deadline = tokio::time::Instant::now() + self.confirmation_wait;
        let mut last = String::new();

        loop {
            if let Ok(text) = self.session.page_text().await {
                last = text;
                if self.markers.matches_confirmation(&last) {
                    return last;
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return last;
            }
            tokio::time::sleep(CONFIRMATION_POLL).await;
        }
    }

    fn skip_rest(
        &self,
        rest: &[Target],
        reason: &str,
        ledger: &mut ResultLedger,
        summary: &mut RunSummary,
        on_record: &mut impl FnMut(&ActionRecord),
    ) -> Result<()> {
        for target in rest {
            let record = ActionRecord::new(
                &target.profile_url,
                OutcomeKind::Skipped,
                Some(reason.to_string()),
            );
            summary.tally(record.outcome);
            on_record(&record);
            ledger.append(record)?;
        }
        Ok(())
    }

    async fn capture(&self, label: &str) {
        if self.config.debug {
            self.session.capture(label).await;
        }
    }
}
