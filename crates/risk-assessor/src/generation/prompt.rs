//! Instruction text sent with every risk-assessment request.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever the template changes so a
//! logged generation can be traced back to the wording that produced it.

use crate::domain::ProjectOverview;

/// Prompt version. Bump on any template change.
pub const PROMPT_VERSION: &str = "1.2.0";

const RISK_ASSESSMENT_TEMPLATE: &str = "\
다음 공사 개요와 공종을 바탕으로 한국의 산업안전보건법 및 KOSHA 가이드를 준수하는 위험성평가표를 작성해줘.

공사개요:
- 공사명: {project_name}
- 현장위치: {location}
- 공사기간: {duration}
- 상세내용: {description}

대상 공종: {work_types}

작성 지침:
1. 대상 공종에 쉼표로 나열된 각 공종마다 최소 2개 이상의 위험요인을 도출해줘.
2. 위험요인은 '어떤 상황에서 → 어떤 원인으로 → 어떤 사고가 발생하는지' 순서로 구체적으로 서술해줘.
3. 위험등급(riskLevel)은 반드시 HIGH(상), MEDIUM(중), LOW(하) 세 값 중 하나로만 분류해줘.
4. 안전대책에는 기술적 대책, 관리적 대책, 개인보호구(PPE) 착용 대책을 모두 포함해줘.
5. 모든 내용은 한국어로만 작성해줘.
6. 응답은 반드시 지정된 JSON 스키마 형식으로만 작성하고, 다른 설명은 덧붙이지 마.
";

/// Build the instruction for one assessment.
///
/// Every overview field and the work-types text are embedded verbatim.
pub fn build_risk_assessment_prompt(overview: &ProjectOverview, work_types: &str) -> String {
    render_template(
        RISK_ASSESSMENT_TEMPLATE,
        &[
            ("project_name", overview.project_name.as_str()),
            ("location", overview.location.as_str()),
            ("duration", overview.duration.as_str()),
            ("description", overview.description.as_str()),
            ("work_types", work_types),
        ],
    )
}

/// Single-pass `{name}` substitution. Substituted values are never rescanned,
/// so braces typed by the operator survive unchanged.
fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_overview() -> ProjectOverview {
        ProjectOverview::new("Sample Tower", "Seoul", "2024.01–2025.12", "RC structure")
    }

    #[test]
    fn prompt_embeds_every_input_verbatim() {
        let prompt = build_risk_assessment_prompt(&sample_overview(), "scaffolding, excavation");
        for value in [
            "Sample Tower",
            "Seoul",
            "2024.01–2025.12",
            "RC structure",
            "scaffolding, excavation",
        ] {
            assert!(prompt.contains(value), "prompt is missing {value:?}");
        }
    }

    #[test]
    fn prompt_leaves_no_placeholders() {
        let prompt = build_risk_assessment_prompt(&sample_overview(), "용접 작업");
        assert!(!prompt.contains('{'), "unreplaced placeholder in:\n{prompt}");
    }

    #[test]
    fn prompt_states_structural_guidelines() {
        let prompt = build_risk_assessment_prompt(&sample_overview(), "비계 설치");
        assert!(prompt.contains("최소 2개"));
        assert!(prompt.contains("HIGH") && prompt.contains("MEDIUM") && prompt.contains("LOW"));
        assert!(prompt.contains("기술적") && prompt.contains("관리적") && prompt.contains("개인보호구"));
        assert!(prompt.contains("JSON"));
    }

    #[test]
    fn unknown_placeholders_are_left_alone() {
        let rendered = render_template("a {x} b {y", &[("z", "1")]);
        assert_eq!(rendered, "a {x} b {y");
    }

    #[test]
    fn braces_in_user_input_are_kept() {
        let overview = ProjectOverview::new("{location}", "Busan", "6개월", "");
        let prompt = build_risk_assessment_prompt(&overview, "타설");
        assert!(prompt.contains("공사명: {location}"));
        assert!(prompt.contains("현장위치: Busan"));
    }
}
