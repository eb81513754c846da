pub mod engine;
pub mod states;
pub mod validation;

pub use engine::{IntakeController, StepAdvance, SubmissionDeliverer, SubmitOutcome, WizardError};
pub use states::{UiIntent, WizardState, WizardStep};
pub use validation::{is_valid_email, validate_step};
