//! Wizard state machine with explicit legal transitions.
//!
//! Every step change goes through `advance()`, which checks the transition
//! table and appends to the transition log. `reset()` is the one edge that is
//! legal from any step.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::domain::WizardStep;

/// Legal step changes other than reset.
///
/// ```text
/// Overview  → WorkType
/// WorkType  → Overview | Analyzing
/// Analyzing → Result | WorkType
/// Result    → Overview
/// ```
fn is_legal_transition(from: WizardStep, to: WizardStep) -> bool {
    use WizardStep::*;

    matches!(
        (from, to),
        (Overview, WorkType)
            | (WorkType, Overview)
            | (WorkType, Analyzing)
            // success shows the report; any failure returns to the input step
            | (Analyzing, Result)
            | (Analyzing, WorkType)
            | (Result, Overview)
    )
}

/// A single recorded step change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// The step transitioned from.
    pub from: WizardStep,
    /// The step transitioned to.
    pub to: WizardStep,
    /// Milliseconds since the wizard was created.
    pub elapsed_ms: u64,
    /// What triggered the change (intent name or failure kind).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Error returned when an illegal step change is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllegalTransition {
    /// Step the wizard was in.
    pub from: WizardStep,
    /// Step that was requested.
    pub to: WizardStep,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Illegal step transition: {} → {}", self.from, self.to)
    }
}

impl std::error::Error for IllegalTransition {}

/// Current wizard step plus the log of how it got there.
///
/// Enforces the transition table and keeps every accepted change for
/// diagnostics. Rejected changes leave both the step and the log untouched.
#[derive(Debug)]
pub struct StepMachine {
    /// Step the wizard is in now.
    current: WizardStep,
    /// Origin for `TransitionRecord::elapsed_ms`.
    created_at: Instant,
    /// Every accepted change, oldest first.
    transitions: Vec<TransitionRecord>,
}

impl Default for StepMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StepMachine {
    /// Start at `Overview` with an empty log.
    pub fn new() -> Self {
        Self {
            current: WizardStep::Overview,
            created_at: Instant::now(),
            transitions: Vec::new(),
        }
    }

    /// Get the current step.
    pub fn current(&self) -> WizardStep {
        self.current
    }

    /// Move to `to` if the edge is in the transition table.
    ///
    /// Returns `Err(IllegalTransition)` without recording anything when the
    /// edge is not legal.
    pub fn advance(&mut self, to: WizardStep, reason: Option<&str>) -> Result<(), IllegalTransition> {
        if !is_legal_transition(self.current, to) {
            return Err(IllegalTransition {
                from: self.current,
                to,
            });
        }
        self.record(to, reason);
        Ok(())
    }

    /// Return to `Overview` from any step. A no-op (and not logged) when
    /// already there.
    pub fn reset(&mut self) {
        if self.current != WizardStep::Overview {
            self.record(WizardStep::Overview, Some("reset"));
        }
    }

    /// Append a record and move to `to`. Callers have already checked legality.
    fn record(&mut self, to: WizardStep, reason: Option<&str>) {
        tracing::debug!(from = %self.current, to = %to, reason, "Step transition");

        self.transitions.push(TransitionRecord {
            from: self.current,
            to,
            elapsed_ms: self.created_at.elapsed().as_millis() as u64,
            reason: reason.map(String::from),
        });
        self.current = to;
    }

    /// Get the full transition log, oldest first.
    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    /// One-line history, e.g. `OVERVIEW → WORK_TYPE (3 transitions) [...]`.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} → {} ({} transitions)",
            WizardStep::Overview,
            self.current,
            self.transitions.len()
        );
        if !self.transitions.is_empty() {
            let steps: Vec<String> = self.transitions.iter().map(|t| t.to.to_string()).collect();
            summary.push_str(&format!(" [{}]", steps.join(" → ")));
        }
        summary
    }
}
