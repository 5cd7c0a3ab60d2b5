//! The assessment wizard: owns the session state and applies operator intents.
//!
//! One controller per session. Intents that arrive in the wrong step are
//! rejected without touching state. `submit_work_types` holds `&mut self`
//! across the generation call, so a second submission cannot start while one
//! is in flight.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use super::progress::ProgressTicker;
use super::state_machine::{IllegalTransition, StepMachine, TransitionRecord};
use crate::domain::{AssessmentResult, OverviewField, ProjectOverview, RiskItem, WizardStep};
use crate::generation::{GenerationClient, GenerationError};

/// Why an intent was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("required overview fields are empty: {}", field_list(.0))]
    MissingFields(Vec<OverviewField>),

    #[error("work types are empty")]
    EmptyWorkTypes,

    #[error("intent only valid in {expected}, wizard is in {actual}")]
    WrongStep {
        expected: WizardStep,
        actual: WizardStep,
    },

    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransition),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

fn field_list(fields: &[OverviewField]) -> String {
    fields
        .iter()
        .map(|field| field.label())
        .collect::<Vec<_>>()
        .join(", ")
}

impl WizardError {
    /// Operator-facing text.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingFields(fields) => {
                format!("필수 항목을 입력해주세요: {}", field_list(fields))
            }
            Self::EmptyWorkTypes => "평가할 공종을 입력해주세요.".to_string(),
            Self::Generation(err) => err.user_message(),
            Self::WrongStep { .. } | Self::IllegalTransition(_) => self.to_string(),
        }
    }
}

/// Operator actions, for presentation adapters that route input generically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardIntent {
    UpdateOverviewField { field: OverviewField, value: String },
    SubmitOverview,
    UpdateWorkTypes(String),
    SubmitWorkTypes,
    GoBack,
    Reset,
}

/// Session state plus the generation client it submits to.
#[derive(Debug)]
pub struct WizardController {
    client: GenerationClient,
    machine: StepMachine,
    overview: ProjectOverview,
    work_types: String,
    report: Option<AssessmentResult>,
    last_error: Option<String>,
    progress: Arc<watch::Sender<String>>,
}

impl WizardController {
    pub fn new(client: GenerationClient) -> Self {
        let (progress, _) = watch::channel(String::new());
        Self {
            client,
            machine: StepMachine::new(),
            overview: ProjectOverview::default(),
            work_types: String::new(),
            report: None,
            last_error: None,
            progress: Arc::new(progress),
        }
    }

    // ── Presentation accessors ───────────────────────────────────────────

    pub fn step(&self) -> WizardStep {
        self.machine.current()
    }

    pub fn overview(&self) -> &ProjectOverview {
        &self.overview
    }

    pub fn work_types(&self) -> &str {
        &self.work_types
    }

    /// Items of the finished assessment; empty outside `RESULT`.
    pub fn results(&self) -> &[RiskItem] {
        self.report
            .as_ref()
            .map(|report| report.items.as_slice())
            .unwrap_or_default()
    }

    pub fn report(&self) -> Option<&AssessmentResult> {
        self.report.as_ref()
    }

    /// Message of the last failed analysis, cleared by the next submission.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Current progress text; empty when no analysis is running.
    pub fn progress_message(&self) -> String {
        self.progress.borrow().clone()
    }

    /// Receiver that observes progress messages while an analysis runs.
    pub fn subscribe_progress(&self) -> watch::Receiver<String> {
        self.progress.subscribe()
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        self.machine.transitions()
    }

    /// One-line step history, for diagnostics.
    pub fn history_summary(&self) -> String {
        self.machine.summary()
    }

    // ── Intents ──────────────────────────────────────────────────────────

    /// Edit one overview field. The value is stored verbatim.
    pub fn update_overview_field(
        &mut self,
        field: OverviewField,
        value: impl Into<String>,
    ) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Overview)?;
        self.overview.set(field, value);
        Ok(())
    }

    /// Validate the overview and move to work-type entry.
    pub fn submit_overview(&mut self) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Overview)?;

        let missing = self.overview.missing_required();
        if !missing.is_empty() {
            tracing::debug!(missing = %field_list(&missing), "overview rejected");
            return Err(WizardError::MissingFields(missing));
        }

        self.machine
            .advance(WizardStep::WorkType, Some("overview submitted"))?;
        Ok(())
    }

    /// Replace the work-types text. Stored verbatim.
    pub fn update_work_types(&mut self, text: impl Into<String>) -> Result<(), WizardError> {
        self.expect_step(WizardStep::WorkType)?;
        self.work_types = text.into();
        Ok(())
    }

    /// Run the analysis for the current overview and work types.
    ///
    /// On success the wizard ends in `RESULT`. On any generation failure it
    /// returns to `WORK_TYPE` with the work types untouched, the message in
    /// `last_error()`, and the error returned as `WizardError::Generation`.
    pub async fn submit_work_types(&mut self) -> Result<(), WizardError> {
        self.expect_step(WizardStep::WorkType)?;
        if self.work_types.trim().is_empty() {
            return Err(WizardError::EmptyWorkTypes);
        }

        self.machine
            .advance(WizardStep::Analyzing, Some("work types submitted"))?;
        self.last_error = None;

        let ticker = ProgressTicker::start(Arc::clone(&self.progress));
        let outcome = self
            .client
            .generate_risk_assessment(&self.overview, &self.work_types)
            .await;
        ticker.stop().await;
        self.progress.send_replace(String::new());

        match outcome {
            Ok(items) => {
                tracing::info!(items = items.len(), "analysis complete");
                self.report = Some(AssessmentResult::new(self.overview.clone(), items));
                self.machine
                    .advance(WizardStep::Result, Some("analysis complete"))?;
                Ok(())
            }
            Err(err) => {
                self.last_error = Some(err.user_message());
                self.machine.advance(WizardStep::WorkType, Some(err.kind()))?;
                Err(err.into())
            }
        }
    }

    /// From work-type entry back to the overview. Both inputs are kept.
    pub fn go_back(&mut self) -> Result<(), WizardError> {
        self.expect_step(WizardStep::WorkType)?;
        self.machine.advance(WizardStep::Overview, Some("go back"))?;
        self.last_error = None;
        Ok(())
    }

    /// Discard the session and start over. Legal from any step; idempotent.
    pub fn reset(&mut self) {
        self.machine.reset();
        self.overview = ProjectOverview::default();
        self.work_types.clear();
        self.report = None;
        self.last_error = None;
        self.progress.send_replace(String::new());
    }

    /// Apply an intent and return the resulting step.
    pub async fn dispatch(&mut self, intent: WizardIntent) -> Result<WizardStep, WizardError> {
        match intent {
            WizardIntent::UpdateOverviewField { field, value } => {
                self.update_overview_field(field, value)?
            }
            WizardIntent::SubmitOverview => self.submit_overview()?,
            WizardIntent::UpdateWorkTypes(text) => self.update_work_types(text)?,
            WizardIntent::SubmitWorkTypes => self.submit_work_types().await?,
            WizardIntent::GoBack => self.go_back()?,
            WizardIntent::Reset => self.reset(),
        }
        Ok(self.step())
    }

    fn expect_step(&self, expected: WizardStep) -> Result<(), WizardError> {
        let actual = self.step();
        if actual == expected {
            Ok(())
        } else {
            Err(WizardError::WrongStep { expected, actual })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::domain::RiskLevel;
    use crate::generation::{BackendFailure, GenerationBackend, GenerationRequest, GenerationResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every call with the same canned result.
    struct CannedBackend {
        reply: Result<GenerationResponse, BackendFailure>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GenerationBackend for CannedBackend {
        async fn generate(
            &self,
            _request: &GenerationRequest,
            _api_key: &str,
        ) -> Result<GenerationResponse, BackendFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    fn controller(
        reply: Result<GenerationResponse, BackendFailure>,
    ) -> (WizardController, Arc<CannedBackend>) {
        let backend = Arc::new(CannedBackend {
            reply,
            calls: AtomicUsize::new(0),
        });
        let config = GenerationConfig::default().with_api_key("test-key");
        let client = GenerationClient::new(config, backend.clone());
        (WizardController::new(client), backend)
    }

    fn one_item() -> Result<GenerationResponse, BackendFailure> {
        Ok(GenerationResponse::with_text(
            r#"[{"workType": "비계", "riskFactor": "추락", "riskLevel": "HIGH", "safetyMeasure": "난간"}]"#,
        ))
    }

    fn fill_overview(wizard: &mut WizardController) {
        wizard
            .update_overview_field(OverviewField::ProjectName, "Sample Tower")
            .unwrap();
        wizard
            .update_overview_field(OverviewField::Location, "Seoul")
            .unwrap();
        wizard
            .update_overview_field(OverviewField::Duration, "2024.01–2025.12")
            .unwrap();
    }

    #[test]
    fn starts_empty_at_overview() {
        let (wizard, _) = controller(one_item());
        assert_eq!(wizard.step(), WizardStep::Overview);
        assert_eq!(wizard.overview(), &ProjectOverview::default());
        assert!(wizard.work_types().is_empty());
        assert!(wizard.results().is_empty());
        assert!(wizard.last_error().is_none());
    }

    #[test]
    fn submit_overview_lists_missing_fields() {
        let (mut wizard, _) = controller(one_item());
        wizard
            .update_overview_field(OverviewField::Location, "Seoul")
            .unwrap();

        let err = wizard.submit_overview().unwrap_err();
        assert_eq!(
            err,
            WizardError::MissingFields(vec![OverviewField::ProjectName, OverviewField::Duration])
        );
        assert!(err.user_message().contains("공사명"));
        assert_eq!(wizard.step(), WizardStep::Overview);
        assert!(wizard.transitions().is_empty());
    }

    #[test]
    fn overview_values_are_kept_verbatim() {
        let (mut wizard, _) = controller(one_item());
        fill_overview(&mut wizard);
        wizard
            .update_overview_field(OverviewField::Description, "  RC structure ")
            .unwrap();
        wizard.submit_overview().unwrap();

        assert_eq!(wizard.step(), WizardStep::WorkType);
        assert_eq!(wizard.overview().description, "  RC structure ");
    }

    #[test]
    fn intents_in_wrong_step_leave_state_alone() {
        let (mut wizard, _) = controller(one_item());
        let err = wizard.update_work_types("용접").unwrap_err();
        assert_eq!(
            err,
            WizardError::WrongStep {
                expected: WizardStep::WorkType,
                actual: WizardStep::Overview,
            }
        );
        assert!(wizard.work_types().is_empty());
        assert!(wizard.go_back().is_err());
        assert_eq!(wizard.step(), WizardStep::Overview);
    }

    #[test]
    fn overview_is_frozen_after_submission() {
        let (mut wizard, _) = controller(one_item());
        fill_overview(&mut wizard);
        wizard.submit_overview().unwrap();

        assert!(wizard
            .update_overview_field(OverviewField::ProjectName, "Other")
            .is_err());
        assert_eq!(wizard.overview().project_name, "Sample Tower");
    }

    #[test]
    fn go_back_keeps_both_inputs() {
        let (mut wizard, _) = controller(one_item());
        fill_overview(&mut wizard);
        wizard.submit_overview().unwrap();
        wizard.update_work_types("비계 설치").unwrap();

        wizard.go_back().unwrap();
        assert_eq!(wizard.step(), WizardStep::Overview);
        assert_eq!(wizard.overview().location, "Seoul");
        assert_eq!(wizard.work_types(), "비계 설치");
    }

    #[tokio::test]
    async fn blank_work_types_are_rejected_without_a_call() {
        let (mut wizard, backend) = controller(one_item());
        fill_overview(&mut wizard);
        wizard.submit_overview().unwrap();
        wizard.update_work_types("   ").unwrap();

        let err = wizard.submit_work_types().await.unwrap_err();
        assert_eq!(err, WizardError::EmptyWorkTypes);
        assert_eq!(wizard.step(), WizardStep::WorkType);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn success_ends_in_result() {
        let (mut wizard, backend) = controller(one_item());
        fill_overview(&mut wizard);
        wizard.submit_overview().unwrap();
        wizard.update_work_types("비계 설치").unwrap();

        wizard.submit_work_types().await.unwrap();
        assert_eq!(wizard.step(), WizardStep::Result);
        assert_eq!(wizard.results().len(), 1);
        assert_eq!(wizard.results()[0].risk_level, RiskLevel::High);
        let report = wizard.report().unwrap();
        assert_eq!(report.project_overview.project_name, "Sample Tower");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert!(wizard.progress_message().is_empty());
    }

    #[tokio::test]
    async fn failure_returns_to_work_type_with_message() {
        let (mut wizard, _) = controller(Err(BackendFailure::new(Some(500), "model overloaded")));
        fill_overview(&mut wizard);
        wizard.submit_overview().unwrap();
        wizard.update_work_types("비계 설치").unwrap();

        let err = wizard.submit_work_types().await.unwrap_err();
        assert!(matches!(err, WizardError::Generation(GenerationError::Backend(_))));
        assert_eq!(wizard.step(), WizardStep::WorkType);
        assert_eq!(wizard.work_types(), "비계 설치");
        assert_eq!(wizard.last_error(), Some("model overloaded"));
        assert!(wizard.report().is_none());

        let last = wizard.transitions().last().unwrap();
        assert_eq!((last.from, last.to), (WizardStep::Analyzing, WizardStep::WorkType));
        assert_eq!(last.reason.as_deref(), Some("backend"));
    }

    #[tokio::test]
    async fn history_summary_lists_visited_steps() {
        let (mut wizard, _) = controller(one_item());
        fill_overview(&mut wizard);
        wizard.submit_overview().unwrap();
        wizard.update_work_types("비계 설치").unwrap();
        wizard.submit_work_types().await.unwrap();

        let summary = wizard.history_summary();
        assert!(summary.contains("3 transitions"), "{summary}");
        assert!(summary.contains("[WORK_TYPE → ANALYZING → RESULT]"), "{summary}");
    }

    #[tokio::test]
    async fn dispatch_routes_every_intent() {
        let (mut wizard, _) = controller(one_item());
        let steps = [
            WizardIntent::UpdateOverviewField {
                field: OverviewField::ProjectName,
                value: "Tower".into(),
            },
            WizardIntent::UpdateOverviewField {
                field: OverviewField::Location,
                value: "Busan".into(),
            },
            WizardIntent::UpdateOverviewField {
                field: OverviewField::Duration,
                value: "6개월".into(),
            },
            WizardIntent::SubmitOverview,
            WizardIntent::UpdateWorkTypes("타설".into()),
            WizardIntent::SubmitWorkTypes,
        ];
        let mut last = WizardStep::Overview;
        for intent in steps {
            last = wizard.dispatch(intent).await.unwrap();
        }
        assert_eq!(last, WizardStep::Result);
        assert_eq!(wizard.dispatch(WizardIntent::Reset).await.unwrap(), WizardStep::Overview);
    }

    #[tokio::test]
    async fn reset_clears_everything_and_is_idempotent() {
        let (mut wizard, _) = controller(one_item());
        fill_overview(&mut wizard);
        wizard.submit_overview().unwrap();
        wizard.update_work_types("비계 설치").unwrap();
        wizard.submit_work_types().await.unwrap();

        wizard.reset();
        wizard.reset();
        assert_eq!(wizard.step(), WizardStep::Overview);
        assert_eq!(wizard.overview(), &ProjectOverview::default());
        assert!(wizard.work_types().is_empty());
        assert!(wizard.results().is_empty());
        assert!(wizard.report().is_none());
        assert!(wizard.last_error().is_none());
    }
}
