use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Offering labels shown on the solutions step. Selections are stored by
/// label, so presentation layers and the record share one vocabulary.
pub const SOLUTION_CATALOG: [&str; 12] = [
    "Custom Web Applications",
    "E-commerce Platforms",
    "Mobile App Development",
    "Digital Marketing Solutions",
    "Business Automation",
    "Data Analytics & BI",
    "Cloud Migration",
    "API Integration",
    "UI/UX Design",
    "Performance Optimization",
    "Security Implementation",
    "Consulting & Strategy",
];

pub const CHALLENGE_CATALOG: [&str; 11] = [
    "Outdated website or digital presence",
    "Manual business processes",
    "Poor customer experience",
    "Inefficient data management",
    "Scalability limitations",
    "Security vulnerabilities",
    "Integration challenges",
    "Mobile optimization needed",
    "Performance issues",
    "Lack of automation",
    "Custom business needs",
];

pub const GOAL_CATALOG: [&str; 10] = [
    "Increase online sales/revenue",
    "Improve operational efficiency",
    "Enhance customer experience",
    "Expand market reach",
    "Launch new digital products",
    "Modernize legacy systems",
    "Reduce operational costs",
    "Improve data insights",
    "Strengthen brand presence",
    "Accelerate growth",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompanySize {
    #[serde(rename = "1-10 employees")]
    OneToTen,
    #[serde(rename = "11-50 employees")]
    ElevenToFifty,
    #[serde(rename = "51-200 employees")]
    FiftyOneToTwoHundred,
    #[serde(rename = "201-1000 employees")]
    TwoHundredOneToThousand,
    #[serde(rename = "1000+ employees")]
    OverThousand,
}

impl CompanySize {
    pub const ALL: [Self; 5] = [
        Self::OneToTen,
        Self::ElevenToFifty,
        Self::FiftyOneToTwoHundred,
        Self::TwoHundredOneToThousand,
        Self::OverThousand,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneToTen => "1-10 employees",
            Self::ElevenToFifty => "11-50 employees",
            Self::FiftyOneToTwoHundred => "51-200 employees",
            Self::TwoHundredOneToThousand => "201-1000 employees",
            Self::OverThousand => "1000+ employees",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ALL.into_iter().find(|size| size.as_str() == trimmed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactChannel {
    Email,
    Phone,
    Video,
    Chat,
}

impl ContactChannel {
    pub const ALL: [Self; 4] = [Self::Email, Self::Phone, Self::Video, Self::Chat];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Video => "video",
            Self::Chat => "chat",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ALL.into_iter().find(|channel| channel.as_str() == trimmed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommunicationStyle {
    #[serde(rename = "Daily standups")]
    DailyStandups,
    #[serde(rename = "Weekly updates")]
    WeeklyUpdates,
    #[serde(rename = "Bi-weekly reports")]
    BiWeeklyReports,
    #[serde(rename = "Milestone reviews")]
    MilestoneReviews,
    #[serde(rename = "Flexible communication")]
    Flexible,
}

impl CommunicationStyle {
    pub const ALL: [Self; 5] = [
        Self::DailyStandups,
        Self::WeeklyUpdates,
        Self::BiWeeklyReports,
        Self::MilestoneReviews,
        Self::Flexible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DailyStandups => "Daily standups",
            Self::WeeklyUpdates => "Weekly updates",
            Self::BiWeeklyReports => "Bi-weekly reports",
            Self::MilestoneReviews => "Milestone reviews",
            Self::Flexible => "Flexible communication",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ALL.into_iter().find(|style| style.as_str() == trimmed)
    }
}

/// Budget brackets keep the wire values the email template expects, not
/// display text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetBracket {
    #[serde(rename = "under-500k")]
    Under500K,
    #[serde(rename = "500k-1m")]
    From500KTo1M,
    #[serde(rename = "1m-2m")]
    From1MTo2M,
    #[serde(rename = "2m-5m")]
    From2MTo5M,
    #[serde(rename = "5m-10m")]
    From5MTo10M,
    #[serde(rename = "over-10m")]
    Over10M,
    #[serde(rename = "discuss")]
    Discuss,
}

impl BudgetBracket {
    pub const ALL: [Self; 7] = [
        Self::Under500K,
        Self::From500KTo1M,
        Self::From1MTo2M,
        Self::From2MTo5M,
        Self::From5MTo10M,
        Self::Over10M,
        Self::Discuss,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Under500K => "under-500k",
            Self::From500KTo1M => "500k-1m",
            Self::From1MTo2M => "1m-2m",
            Self::From2MTo5M => "2m-5m",
            Self::From5MTo10M => "5m-10m",
            Self::Over10M => "over-10m",
            Self::Discuss => "discuss",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ALL.into_iter().find(|bracket| bracket.as_str() == trimmed)
    }
}

/// The accumulated answer set. Every field stays unset/empty until the step
/// that owns it validates; the record keeps no edit history.
///
/// Serde names match the email template's parameter keys so an intake file
/// and the flattened payload share field names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionRecord {
    pub name: String,
    pub industry: String,
    pub website: String,
    #[serde(rename = "companySize")]
    pub company_size: Option<CompanySize>,
    pub location: String,
    #[serde(rename = "projectType")]
    pub project_type: BTreeSet<String>,
    pub challenges: BTreeSet<String>,
    #[serde(rename = "customChallenge")]
    pub custom_challenge: String,
    pub goals: BTreeSet<String>,
    #[serde(rename = "currentTools")]
    pub current_tools: Vec<String>,
    pub email: String,
    pub phone: String,
    #[serde(rename = "preferredContact")]
    pub preferred_contact: Option<ContactChannel>,
    #[serde(rename = "communicationStyle")]
    pub communication_style: Option<CommunicationStyle>,
    pub budget: Option<BudgetBracket>,
    #[serde(rename = "previousExperience")]
    pub previous_experience: String,
}

/// Closed identity for every record field. Keeps the set of legal fields
/// statically checkable instead of indexing the record by arbitrary strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldName {
    Name,
    Industry,
    Website,
    CompanySize,
    Location,
    ProjectType,
    Challenges,
    CustomChallenge,
    Goals,
    CurrentTools,
    Email,
    Phone,
    PreferredContact,
    CommunicationStyle,
    Budget,
    PreviousExperience,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, overwritten wholesale.
    Text,
    /// One value from a closed label set; empty input clears the choice.
    Choice,
    /// Unordered deduplicated label set, updated by toggling.
    LabelSet,
    /// Comma-delimited input stored as an ordered sequence of trimmed
    /// segments (empty segments included, faithful to the intake form).
    CommaList,
}

impl FieldName {
    /// Wire name, matching the record's serde keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Industry => "industry",
            Self::Website => "website",
            Self::CompanySize => "companySize",
            Self::Location => "location",
            Self::ProjectType => "projectType",
            Self::Challenges => "challenges",
            Self::CustomChallenge => "customChallenge",
            Self::Goals => "goals",
            Self::CurrentTools => "currentTools",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::PreferredContact => "preferredContact",
            Self::CommunicationStyle => "communicationStyle",
            Self::Budget => "budget",
            Self::PreviousExperience => "previousExperience",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Name
            | Self::Industry
            | Self::Website
            | Self::Location
            | Self::CustomChallenge
            | Self::Email
            | Self::Phone
            | Self::PreviousExperience => FieldKind::Text,
            Self::CompanySize
            | Self::PreferredContact
            | Self::CommunicationStyle
            | Self::Budget => FieldKind::Choice,
            Self::ProjectType | Self::Challenges | Self::Goals => FieldKind::LabelSet,
            Self::CurrentTools => FieldKind::CommaList,
        }
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tagged field-update operation dispatched through the fixed
/// `FieldName -> FieldKind` mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldUpdate {
    SetScalar { field: FieldName, value: String },
    ToggleLabel { field: FieldName, label: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FieldUpdateError {
    #[error("field `{field}` does not accept a `{operation}` update")]
    KindMismatch { field: FieldName, operation: &'static str },
    #[error("`{value}` is not a recognized option for field `{field}`")]
    UnknownOption { field: FieldName, value: String },
}

impl SubmissionRecord {
    /// Applies one field update. Scalar updates overwrite; toggle updates
    /// are a symmetric difference on the target set, so toggling the same
    /// label twice restores the original contents.
    pub fn apply(&mut self, update: &FieldUpdate) -> Result<(), FieldUpdateError> {
        match update {
            FieldUpdate::SetScalar { field, value } => self.set_scalar(*field, value),
            FieldUpdate::ToggleLabel { field, label } => self.toggle_label(*field, label),
        }
    }

    fn set_scalar(&mut self, field: FieldName, value: &str) -> Result<(), FieldUpdateError> {
        match field {
            FieldName::Name => self.name = value.to_owned(),
            FieldName::Industry => self.industry = value.to_owned(),
            FieldName::Website => self.website = value.to_owned(),
            FieldName::Location => self.location = value.to_owned(),
            FieldName::CustomChallenge => self.custom_challenge = value.to_owned(),
            FieldName::Email => self.email = value.to_owned(),
            FieldName::Phone => self.phone = value.to_owned(),
            FieldName::PreviousExperience => self.previous_experience = value.to_owned(),
            FieldName::CompanySize => {
                self.company_size = parse_choice(field, value, CompanySize::parse)?;
            }
            FieldName::PreferredContact => {
                self.preferred_contact = parse_choice(field, value, ContactChannel::parse)?;
            }
            FieldName::CommunicationStyle => {
                self.communication_style = parse_choice(field, value, CommunicationStyle::parse)?;
            }
            FieldName::Budget => {
                self.budget = parse_choice(field, value, BudgetBracket::parse)?;
            }
            FieldName::CurrentTools => {
                self.current_tools =
                    value.split(',').map(|segment| segment.trim().to_owned()).collect();
            }
            FieldName::ProjectType | FieldName::Challenges | FieldName::Goals => {
                return Err(FieldUpdateError::KindMismatch { field, operation: "set" });
            }
        }
        Ok(())
    }

    fn toggle_label(&mut self, field: FieldName, label: &str) -> Result<(), FieldUpdateError> {
        let set = match field {
            FieldName::ProjectType => &mut self.project_type,
            FieldName::Challenges => &mut self.challenges,
            FieldName::Goals => &mut self.goals,
            _ => return Err(FieldUpdateError::KindMismatch { field, operation: "toggle" }),
        };

        if !set.remove(label) {
            set.insert(label.to_owned());
        }
        Ok(())
    }
}

fn parse_choice<T>(
    field: FieldName,
    value: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, FieldUpdateError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse(value)
        .map(Some)
        .ok_or_else(|| FieldUpdateError::UnknownOption { field, value: value.to_owned() })
}
