use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::submission::{FieldName, FieldUpdate, FieldUpdateError, SubmissionRecord};
use crate::errors::DeliveryError;
use crate::wizard::states::{UiIntent, WizardState, WizardStep};
use crate::wizard::validation::validate_step;

/// Delivery seam for `submit`. The controller never performs network I/O
/// itself; the embedding layer injects whatever relay it configured.
#[async_trait]
pub trait SubmissionDeliverer: Send + Sync {
    async fn deliver(&self, record: &SubmissionRecord) -> Result<(), DeliveryError>;
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("a submission is in flight; navigation is disabled until it completes")]
    SubmissionInFlight,
    #[error("step {target:?} is ahead of the current step and cannot be jumped to")]
    StepNotReachable { target: WizardStep },
    #[error("submit is only available from the contact step, not {step:?}")]
    SubmitUnavailable { step: WizardStep },
    #[error("restart is only available from the success step, not {step:?}")]
    RestartUnavailable { step: WizardStep },
    #[error("the wizard is at its terminal step; restart to begin a new request")]
    AtTerminalStep,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepAdvance {
    Advanced { from: WizardStep, to: WizardStep },
    /// Validation failed: the wizard stays put and `errors` holds exactly
    /// one message per failing field of the current step.
    Blocked { errors: BTreeMap<FieldName, String> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Delivery succeeded; the wizard is now at the terminal step.
    Delivered { intents: Vec<UiIntent> },
    /// Contact-step validation failed; nothing was delivered.
    Blocked { errors: BTreeMap<FieldName, String> },
    /// Delivery failed; the wizard stays on the contact step and the
    /// message is mirrored into `last_submission_error` for the banner.
    Failed { message: String },
}

/// Owns the wizard state and the submission record. All mutation funnels
/// through the operations below; nothing else may write either value.
#[derive(Clone, Debug, Default)]
pub struct IntakeController {
    state: WizardState,
    record: SubmissionRecord,
}

impl IntakeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn record(&self) -> &SubmissionRecord {
        &self.record
    }

    pub fn current_step(&self) -> WizardStep {
        self.state.current_step
    }

    /// Applies a field update and clears only that field's pending error.
    /// Full validation is deliberately not re-run here; the next
    /// `advance`/`submit` does that.
    pub fn apply(&mut self, update: &FieldUpdate) -> Result<(), FieldUpdateError> {
        self.record.apply(update)?;
        let field = match update {
            FieldUpdate::SetScalar { field, .. } | FieldUpdate::ToggleLabel { field, .. } => *field,
        };
        self.state.errors_by_field.remove(&field);
        Ok(())
    }

    /// Validates the current step and moves forward one step when it
    /// passes. On failure the wizard stays put and the error map is
    /// replaced with the step's failing fields.
    pub fn advance(&mut self) -> Result<StepAdvance, WizardError> {
        self.ensure_idle()?;
        let from = self.state.current_step;
        let Some(to) = from.next() else {
            return Err(WizardError::AtTerminalStep);
        };

        let errors = validate_step(from, &self.record);
        if !errors.is_empty() {
            self.state.errors_by_field = errors.clone();
            return Ok(StepAdvance::Blocked { errors });
        }

        self.state.errors_by_field.clear();
        self.state.current_step = to;
        Ok(StepAdvance::Advanced { from, to })
    }

    /// Moves back one step without re-validation. No-op at the first step.
    pub fn retreat(&mut self) -> Result<(), WizardError> {
        self.ensure_idle()?;
        let step = self.state.current_step;
        if step.is_terminal() {
            return Err(WizardError::AtTerminalStep);
        }
        if let Some(previous) = step.previous() {
            self.state.current_step = previous;
        }
        Ok(())
    }

    /// Progress-indicator navigation: already-visited or current steps
    /// only, so nothing ahead of the validated frontier can be skipped to.
    pub fn jump_to(&mut self, target: WizardStep) -> Result<(), WizardError> {
        self.ensure_idle()?;
        if self.state.current_step.is_terminal() {
            return Err(WizardError::AtTerminalStep);
        }
        if target > self.state.current_step {
            return Err(WizardError::StepNotReachable { target });
        }
        self.state.current_step = target;
        Ok(())
    }

    /// Re-validates the contact step and hands the record to the deliverer.
    /// `submission_in_flight` is true for exactly the duration of the await
    /// and is reset before any state transition is applied, so observers
    /// never see an in-flight flag alongside a completed outcome.
    pub async fn submit<D>(&mut self, deliverer: &D) -> Result<SubmitOutcome, WizardError>
    where
        D: SubmissionDeliverer + ?Sized,
    {
        self.ensure_idle()?;
        let step = self.state.current_step;
        if step != WizardStep::ContactBudget {
            return Err(WizardError::SubmitUnavailable { step });
        }

        self.state.last_submission_error = None;
        let errors = validate_step(step, &self.record);
        if !errors.is_empty() {
            self.state.errors_by_field = errors.clone();
            return Ok(SubmitOutcome::Blocked { errors });
        }
        self.state.errors_by_field.clear();

        self.state.submission_in_flight = true;
        let result = deliverer.deliver(&self.record).await;
        self.state.submission_in_flight = false;

        match result {
            Ok(()) => {
                self.state.current_step = WizardStep::Success;
                Ok(SubmitOutcome::Delivered { intents: vec![UiIntent::ScrollToSuccessRegion] })
            }
            Err(error) => {
                let message = error.to_string();
                self.state.last_submission_error = Some(message.clone());
                Ok(SubmitOutcome::Failed { message })
            }
        }
    }

    /// Leaves the terminal step by reinitializing both the wizard state and
    /// the record. The only exit the terminal step has.
    pub fn restart(&mut self) -> Result<(), WizardError> {
        self.ensure_idle()?;
        let step = self.state.current_step;
        if !step.is_terminal() {
            return Err(WizardError::RestartUnavailable { step });
        }
        self.state = WizardState::default();
        self.record = SubmissionRecord::default();
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), WizardError> {
        if self.state.submission_in_flight {
            Err(WizardError::SubmissionInFlight)
        } else {
            Ok(())
        }
    }
}
