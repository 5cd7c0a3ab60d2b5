//! Response schema for risk-assessment generation and the matching decoder.
//!
//! The schema uses the generative language API's OpenAPI subset (upper-case
//! `type` names). `decode_risk_items` is the local half of the contract: the
//! backend is asked to honour the schema, and the decoder refuses anything
//! that does not.

use serde_json::{json, Value};

use crate::domain::{RiskItem, RiskLevel};

/// MIME type that forces schema-validated structured output.
pub const STRUCTURED_RESPONSE_MIME_TYPE: &str = "application/json";

/// Property names of a risk item, in the order the model should emit them.
pub const RISK_ITEM_PROPERTIES: [&str; 4] =
    ["workType", "riskFactor", "riskLevel", "safetyMeasure"];

/// Build the response schema: an ordered array of risk-item objects with all
/// four string fields required and `riskLevel` restricted to the enum.
pub fn risk_items_schema() -> Value {
    let levels: Vec<&str> = RiskLevel::ALL.iter().map(|level| level.token()).collect();

    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "workType": {
                    "type": "STRING",
                    "description": "공종 (예: 비계 설치, 터파기 등)"
                },
                "riskFactor": {
                    "type": "STRING",
                    "description": "위험요인 (어떤 상황에서 어떤 원인으로 어떤 사고가 발생할 수 있는지)"
                },
                "riskLevel": {
                    "type": "STRING",
                    "format": "enum",
                    "enum": levels,
                    "description": "위험등급 (HIGH=상, MEDIUM=중, LOW=하 중 하나)"
                },
                "safetyMeasure": {
                    "type": "STRING",
                    "description": "안전대책 (기술적, 관리적, 개인보호구 대책)"
                }
            },
            "required": RISK_ITEM_PROPERTIES,
            "propertyOrdering": RISK_ITEM_PROPERTIES
        }
    })
}

/// Decode a structured payload into risk items.
///
/// The whole payload must conform; a single bad item rejects the batch.
/// The error string is serde_json's diagnostic (with line/column).
pub fn decode_risk_items(payload: &str) -> Result<Vec<RiskItem>, String> {
    serde_json::from_str::<Vec<RiskItem>>(payload).map_err(|e| e.to_string())
}
