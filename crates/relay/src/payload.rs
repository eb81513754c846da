use std::collections::BTreeSet;

use serde_json::{Map, Value};

use formwork_core::SubmissionRecord;

/// The record flattened for transport: every set/sequence field joined into
/// one comma-and-space-delimited string, every scalar stringified (unset
/// becomes the empty string), and `to_email` injected first. Field order is
/// the record's declaration order so email bodies read the way the form
/// collects them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatSubmission {
    fields: Vec<(&'static str, String)>,
}

impl FlatSubmission {
    pub fn from_record(record: &SubmissionRecord, recipient: &str) -> Self {
        let fields = vec![
            ("to_email", recipient.to_owned()),
            ("name", record.name.clone()),
            ("industry", record.industry.clone()),
            ("website", record.website.clone()),
            ("companySize", option_label(record.company_size.map(|size| size.as_str()))),
            ("location", record.location.clone()),
            ("challenges", join_labels(&record.challenges)),
            ("customChallenge", record.custom_challenge.clone()),
            ("goals", join_labels(&record.goals)),
            ("projectType", join_labels(&record.project_type)),
            ("budget", option_label(record.budget.map(|bracket| bracket.as_str()))),
            ("currentTools", record.current_tools.join(", ")),
            ("email", record.email.clone()),
            ("phone", record.phone.clone()),
            (
                "preferredContact",
                option_label(record.preferred_contact.map(|channel| channel.as_str())),
            ),
            (
                "communicationStyle",
                option_label(record.communication_style.map(|style| style.as_str())),
            ),
            ("previousExperience", record.previous_experience.clone()),
        ];

        Self { fields }
    }

    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    /// The `template_params` object for the provider's JSON body.
    pub fn template_params(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(key, value)| ((*key).to_owned(), Value::String(value.clone())))
            .collect()
    }

    /// One `key: value` line per field, the mail-composer body format.
    pub fn body_lines(&self) -> String {
        self.fields
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn join_labels(labels: &BTreeSet<String>) -> String {
    labels.iter().cloned().collect::<Vec<_>>().join(", ")
}

fn option_label(label: Option<&'static str>) -> String {
    label.unwrap_or_default().to_owned()
}

/// Pre-filled composer URI for the no-credentials fallback. The subject
/// names the company when one was entered, `Website` otherwise.
pub fn mailto_uri(record: &SubmissionRecord, recipient: &str) -> String {
    let flat = FlatSubmission::from_record(record, recipient);
    let company = if record.name.is_empty() { "Website" } else { record.name.as_str() };
    let subject = format!("Partnership Request from {company}");

    format!(
        "mailto:{recipient}?subject={subject}&body={body}",
        subject = urlencoding::encode(&subject),
        body = urlencoding::encode(&flat.body_lines()),
    )
}

#[cfg(test)]
mod tests {
    use formwork_core::{
        BudgetBracket, CompanySize, ContactChannel, FieldName, FieldUpdate, SubmissionRecord,
    };

    use crate::payload::{mailto_uri, FlatSubmission};

    fn sample_record() -> SubmissionRecord {
        let mut record = SubmissionRecord {
            name: "Acme Robotics".to_owned(),
            industry: "Manufacturing".to_owned(),
            email: "ops@acme-robotics.test".to_owned(),
            company_size: Some(CompanySize::FiftyOneToTwoHundred),
            preferred_contact: Some(ContactChannel::Email),
            budget: Some(BudgetBracket::From2MTo5M),
            ..Default::default()
        };
        for label in ["Business Automation", "API Integration"] {
            record
                .apply(&FieldUpdate::ToggleLabel {
                    field: FieldName::ProjectType,
                    label: label.to_owned(),
                })
                .expect("toggle applies");
        }
        record.current_tools = vec!["Salesforce".to_owned(), "Sheets".to_owned()];
        record
    }

    #[test]
    fn to_email_is_injected_as_the_first_field() {
        let flat = FlatSubmission::from_record(&sample_record(), "partners@example.com");
        let (key, value) = &flat.fields()[0];
        assert_eq!(*key, "to_email");
        assert_eq!(value, "partners@example.com");
    }

    #[test]
    fn multi_valued_fields_are_joined_with_comma_and_space() {
        let flat = FlatSubmission::from_record(&sample_record(), "partners@example.com");
        let params = flat.template_params();

        assert_eq!(params["projectType"], "API Integration, Business Automation");
        assert_eq!(params["currentTools"], "Salesforce, Sheets");
    }

    #[test]
    fn unset_scalars_flatten_to_empty_strings() {
        let flat =
            FlatSubmission::from_record(&SubmissionRecord::default(), "partners@example.com");
        let params = flat.template_params();

        assert_eq!(params["companySize"], "");
        assert_eq!(params["communicationStyle"], "");
        assert_eq!(params["website"], "");
    }

    #[test]
    fn enum_fields_flatten_to_their_wire_values() {
        let flat = FlatSubmission::from_record(&sample_record(), "partners@example.com");
        let params = flat.template_params();

        assert_eq!(params["companySize"], "51-200 employees");
        assert_eq!(params["budget"], "2m-5m");
        assert_eq!(params["preferredContact"], "email");
    }

    #[test]
    fn body_lines_render_every_field_as_key_value() {
        let flat = FlatSubmission::from_record(&sample_record(), "partners@example.com");
        let body = flat.body_lines();

        assert!(body.starts_with("to_email: partners@example.com\n"));
        assert!(body.contains("name: Acme Robotics"));
        assert!(body.contains("budget: 2m-5m"));
        // Every record field appears even when empty.
        assert!(body.contains("previousExperience: "));
        assert_eq!(body.lines().count(), flat.fields().len());
    }

    #[test]
    fn mailto_uri_carries_the_company_subject_and_encoded_body() {
        let uri = mailto_uri(&sample_record(), "partners@example.com");

        assert!(uri.starts_with("mailto:partners@example.com?subject="));
        assert!(uri.contains("Partnership%20Request%20from%20Acme%20Robotics"));
        // Body newlines and separators are URL-encoded.
        assert!(uri.contains("%3A%20"));
        assert!(uri.contains("%0A"));
    }

    #[test]
    fn mailto_subject_falls_back_to_website_without_a_company_name() {
        let uri = mailto_uri(&SubmissionRecord::default(), "partners@example.com");
        assert!(uri.contains("Partnership%20Request%20from%20Website"));
    }
}
