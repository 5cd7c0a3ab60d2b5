//! Rendering of a finished assessment for the terminal or for export.

use std::fmt;

use crate::domain::{AssessmentResult, OverviewField};

pub const REPORT_TITLE: &str = "위험성평가표";
pub const REPORT_SYSTEM: &str = "Construction AI Safety Engine";
pub const REPORT_DISCLAIMER: &str = "본 평가표는 AI에 의해 자동 생성된 참고용 데이터입니다. \
실제 현장 상황을 반드시 반영하여 최종 확인 바랍니다.";

const RULE_WIDTH: usize = 60;

/// Plain-text view of an assessment, via `Display`.
pub struct TextReport<'a>(pub &'a AssessmentResult);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);

        writeln!(f, "{heavy}")?;
        writeln!(f, "{REPORT_TITLE}")?;
        writeln!(f, "작성일: {}", result.generated_at.format("%Y-%m-%d"))?;
        writeln!(f, "시스템: {REPORT_SYSTEM}")?;
        writeln!(f, "{heavy}")?;

        let overview = &result.project_overview;
        for field in OverviewField::ALL {
            let value = overview.get(field);
            let value = if value.trim().is_empty() { "-" } else { value };
            let label = match field {
                OverviewField::Description => "현장 특성",
                other => other.label(),
            };
            writeln!(f, "{label}: {value}")?;
        }

        for (index, item) in result.items.iter().enumerate() {
            writeln!(f, "{light}")?;
            writeln!(f, "[{}] 공종: {}", index + 1, item.work_type)?;
            writeln!(f, "    위험요인: {}", item.risk_factor)?;
            writeln!(f, "    위험등급: {}", item.risk_level.label())?;
            writeln!(f, "    안전대책: {}", item.safety_measure)?;
        }
        writeln!(f, "{light}")?;

        let counts: Vec<String> = result
            .level_counts()
            .iter()
            .map(|(level, count)| format!("{} {count}", level.label()))
            .collect();
        writeln!(f, "총 {}건 ({})", result.items.len(), counts.join(" / "))?;
        if let Some(level) = result.highest_level() {
            writeln!(f, "최고 위험등급: {}", level.label())?;
        }
        writeln!(f)?;
        write!(f, "{REPORT_DISCLAIMER}")
    }
}

pub fn render_text(result: &AssessmentResult) -> String {
    TextReport(result).to_string()
}

/// Pretty JSON with camelCase keys and upper-case severity tokens.
pub fn to_json(result: &AssessmentResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}
