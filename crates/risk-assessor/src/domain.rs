//! Typed records exchanged between the wizard and the generation client.
//!
//! Everything here is plain data. Wire names follow the camelCase JSON the
//! generation backend is asked to produce, so `RiskItem` decodes directly
//! from the model's structured output.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Basic facts about the construction project under assessment.
///
/// `project_name`, `location` and `duration` are mandatory before the wizard
/// leaves the overview step; `description` may stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOverview {
    pub project_name: String,
    pub location: String,
    pub duration: String,
    #[serde(default)]
    pub description: String,
}

impl ProjectOverview {
    pub fn new(
        project_name: impl Into<String>,
        location: impl Into<String>,
        duration: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            location: location.into(),
            duration: duration.into(),
            description: description.into(),
        }
    }

    pub fn get(&self, field: OverviewField) -> &str {
        match field {
            OverviewField::ProjectName => &self.project_name,
            OverviewField::Location => &self.location,
            OverviewField::Duration => &self.duration,
            OverviewField::Description => &self.description,
        }
    }

    pub fn set(&mut self, field: OverviewField, value: impl Into<String>) {
        let value = value.into();
        match field {
            OverviewField::ProjectName => self.project_name = value,
            OverviewField::Location => self.location = value,
            OverviewField::Duration => self.duration = value,
            OverviewField::Description => self.description = value,
        }
    }

    /// Required fields that are empty or whitespace-only, in form order.
    pub fn missing_required(&self) -> Vec<OverviewField> {
        OverviewField::ALL
            .into_iter()
            .filter(|field| field.required() && self.get(*field).trim().is_empty())
            .collect()
    }
}

/// The four editable fields of the overview form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OverviewField {
    ProjectName,
    Location,
    Duration,
    Description,
}

impl OverviewField {
    pub const ALL: [OverviewField; 4] = [
        Self::ProjectName,
        Self::Location,
        Self::Duration,
        Self::Description,
    ];

    pub fn required(self) -> bool {
        !matches!(self, Self::Description)
    }

    /// Form label shown to the operator.
    pub fn label(self) -> &'static str {
        match self {
            Self::ProjectName => "공사명",
            Self::Location => "현장 위치",
            Self::Duration => "공사 기간",
            Self::Description => "주요 공법/특징",
        }
    }
}

impl fmt::Display for OverviewField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity of a single risk factor.
///
/// Closed on purpose: the response schema restricts `riskLevel` to exactly
/// these three tokens and decoding rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [Self::High, Self::Medium, Self::Low];

    /// Wire token used in the response schema.
    pub fn token(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }

    /// Label printed in the report's severity column.
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "상",
            Self::Medium => "중",
            Self::Low => "하",
        }
    }

    /// 0 is the most severe.
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One row of the generated assessment table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskItem {
    pub work_type: String,
    pub risk_factor: String,
    pub risk_level: RiskLevel,
    pub safety_measure: String,
}

/// Steps of the assessment wizard, in the order the operator sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WizardStep {
    Overview,
    WorkType,
    Analyzing,
    Result,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        Self::Overview,
        Self::WorkType,
        Self::Analyzing,
        Self::Result,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Overview => 0,
            Self::WorkType => 1,
            Self::Analyzing => 2,
            Self::Result => 3,
        }
    }

    /// Step-indicator label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Overview => "공사개요",
            Self::WorkType => "공종입력",
            Self::Analyzing => "AI 분석",
            Self::Result => "결과확인",
        }
    }

    /// Whether this step is already behind `current` in the step indicator.
    pub fn is_completed_at(self, current: WizardStep) -> bool {
        current.index() > self.index()
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overview => write!(f, "OVERVIEW"),
            Self::WorkType => write!(f, "WORK_TYPE"),
            Self::Analyzing => write!(f, "ANALYZING"),
            Self::Result => write!(f, "RESULT"),
        }
    }
}

/// A finished assessment: the overview it was generated for plus the items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub project_overview: ProjectOverview,
    pub items: Vec<RiskItem>,
    pub generated_at: DateTime<Utc>,
}

impl AssessmentResult {
    pub fn new(project_overview: ProjectOverview, items: Vec<RiskItem>) -> Self {
        Self {
            project_overview,
            items,
            generated_at: Utc::now(),
        }
    }

    /// Most severe level among the items, `None` when there are no items.
    pub fn highest_level(&self) -> Option<RiskLevel> {
        self.items
            .iter()
            .map(|item| item.risk_level)
            .min_by_key(|level| level.rank())
    }

    /// Item count per severity, most severe first.
    pub fn level_counts(&self) -> [(RiskLevel, usize); 3] {
        RiskLevel::ALL.map(|level| {
            let count = self
                .items
                .iter()
                .filter(|item| item.risk_level == level)
                .count();
            (level, count)
        })
    }
}
