pub mod config;
pub mod domain;
pub mod errors;
pub mod wizard;

pub use domain::submission::{
    BudgetBracket, CommunicationStyle, CompanySize, ContactChannel, FieldKind, FieldName,
    FieldUpdate, FieldUpdateError, SubmissionRecord, CHALLENGE_CATALOG, GOAL_CATALOG,
    SOLUTION_CATALOG,
};
pub use errors::DeliveryError;
pub use wizard::engine::{
    IntakeController, StepAdvance, SubmissionDeliverer, SubmitOutcome, WizardError,
};
pub use wizard::states::{UiIntent, WizardState, WizardStep};
pub use wizard::validation::{is_valid_email, validate_step};
