//! Construction risk-assessment wizard.
//!
//! The operator fills in a project overview and a list of work types; the
//! wizard submits both to a structured-generation backend and turns the
//! schema-constrained answer into a risk-assessment table.
//!
//! - [`domain`]: overview, risk items, severity levels, wizard steps
//! - [`config`]: backend credential, model and endpoint
//! - [`generation`]: instruction, response schema, backend boundary, client
//! - [`wizard`]: step machine, progress ticker, controller
//! - [`report`]: text and JSON rendering of a finished assessment

pub mod config;
pub mod domain;
pub mod generation;
pub mod report;
pub mod wizard;

pub use config::GenerationConfig;
pub use domain::{AssessmentResult, OverviewField, ProjectOverview, RiskItem, RiskLevel, WizardStep};
pub use generation::{GenerationClient, GenerationError};
pub use wizard::{WizardController, WizardError, WizardIntent};
