//! The four-step assessment wizard.

pub mod controller;
pub mod progress;
pub mod state_machine;

pub use controller::{WizardController, WizardError, WizardIntent};
pub use progress::{ProgressTicker, INITIAL_PROGRESS_MESSAGE, PROGRESS_INTERVAL, PROGRESS_MESSAGES};
pub use state_machine::{IllegalTransition, StepMachine, TransitionRecord};
