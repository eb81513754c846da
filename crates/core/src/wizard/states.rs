use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::submission::FieldName;

/// Fixed ordered step sequence of the intake wizard. `Success` is terminal:
/// its only outgoing edge is an explicit restart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WizardStep {
    #[default]
    BusinessInfo,
    Solutions,
    Challenges,
    Goals,
    ContactBudget,
    Success,
}

impl WizardStep {
    pub const ALL: [Self; 6] = [
        Self::BusinessInfo,
        Self::Solutions,
        Self::Challenges,
        Self::Goals,
        Self::ContactBudget,
        Self::Success,
    ];

    pub fn index(&self) -> usize {
        match self {
            Self::BusinessInfo => 0,
            Self::Solutions => 1,
            Self::Challenges => 2,
            Self::Goals => 3,
            Self::ContactBudget => 4,
            Self::Success => 5,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::BusinessInfo => "Your Business",
            Self::Solutions => "Our Solutions",
            Self::Challenges => "Your Challenges",
            Self::Goals => "Project Goals",
            Self::ContactBudget => "Contact & Budget",
            Self::Success => "Success!",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(&self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }
}

/// Intent the controller emits for the presentation layer to fulfill. The
/// controller never touches the page itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiIntent {
    ScrollToSuccessRegion,
}

/// Mutable wizard state owned by the controller. Only the controller's
/// operations write it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WizardState {
    pub current_step: WizardStep,
    pub errors_by_field: BTreeMap<FieldName, String>,
    pub submission_in_flight: bool,
    pub last_submission_error: Option<String>,
}
