use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::submission::{FieldName, SubmissionRecord};
use crate::wizard::states::WizardStep;

static EMAIL_PATTERN: OnceLock<Regex> = OnceLock::new();

/// The intake form's email check, reproduced exactly.
pub fn is_valid_email(raw: &str) -> bool {
    let pattern = EMAIL_PATTERN
        .get_or_init(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern is valid"));
    pattern.is_match(raw)
}

/// Runs the owning step's rules against the current record and returns one
/// message per failing field. An empty map means the step passes. Pure:
/// never mutates the record, never looks at other steps.
pub fn validate_step(
    step: WizardStep,
    record: &SubmissionRecord,
) -> BTreeMap<FieldName, String> {
    let mut errors = BTreeMap::new();

    match step {
        WizardStep::BusinessInfo => {
            if record.name.trim().is_empty() {
                errors.insert(FieldName::Name, "Company name is required".to_owned());
            }
            if record.industry.trim().is_empty() {
                errors.insert(FieldName::Industry, "Industry is required".to_owned());
            }
            if record.company_size.is_none() {
                errors.insert(FieldName::CompanySize, "Company size is required".to_owned());
            }
        }
        WizardStep::Solutions => {
            if record.project_type.is_empty() {
                errors.insert(
                    FieldName::ProjectType,
                    "Please select at least one solution".to_owned(),
                );
            }
        }
        WizardStep::Challenges => {
            if record.challenges.is_empty() {
                errors.insert(
                    FieldName::Challenges,
                    "Please select at least one challenge".to_owned(),
                );
            }
        }
        WizardStep::Goals => {
            if record.goals.is_empty() {
                errors.insert(FieldName::Goals, "Please select at least one goal".to_owned());
            }
        }
        WizardStep::ContactBudget => {
            if record.email.trim().is_empty() {
                errors.insert(FieldName::Email, "Email is required".to_owned());
            } else if !is_valid_email(&record.email) {
                errors.insert(
                    FieldName::Email,
                    "Please enter a valid email address".to_owned(),
                );
            }
            if record.preferred_contact.is_none() {
                errors.insert(
                    FieldName::PreferredContact,
                    "Preferred contact method is required".to_owned(),
                );
            }
            if record.budget.is_none() {
                errors.insert(FieldName::Budget, "Please select a budget range".to_owned());
            }
        }
        WizardStep::Success => {}
    }

    errors
}
