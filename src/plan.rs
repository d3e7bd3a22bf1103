//! Plan record decoding.
//!
//! Stored plan records come in two legacy shapes: `{"plan": "Pro"}` and
//! `{"plan": {"name": "Pro"}}`. Both are decoded here, at the store boundary,
//! into [`PlanStatus`] so nothing downstream inspects raw record shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

const PRO: &str = "pro";

/// Raw `plan` attribute of a stored record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PlanField {
    /// `"plan": "Pro"`
    Name(String),
    /// `"plan": {"name": "Pro", ...}`
    Object(Map<String, JsonValue>),
    /// Any other shape (number, array, boolean, null).
    Other(JsonValue),
}

impl PlanField {
    #[must_use]
    pub fn is_pro(&self) -> bool {
        match self {
            Self::Name(name) => names_pro(name),
            Self::Object(fields) => fields
                .get("name")
                .and_then(JsonValue::as_str)
                .is_some_and(names_pro),
            Self::Other(_) => false,
        }
    }
}

/// Plan record keyed by user identifier. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlanRecord {
    #[serde(default)]
    pub plan: Option<PlanField>,
}

impl PlanRecord {
    /// Decode stored document data. Never fails: data that is not an object
    /// decodes to a record without a plan.
    #[must_use]
    pub fn decode(data: &JsonValue) -> Self {
        if !data.is_object() {
            return Self::default();
        }
        serde_json::from_value(data.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn status(&self) -> PlanStatus {
        PlanStatus {
            is_pro: self.plan.as_ref().is_some_and(PlanField::is_pro),
        }
    }
}

/// Normalized subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStatus {
    pub is_pro: bool,
}

impl PlanStatus {
    pub const FREE: Self = Self { is_pro: false };
    pub const PRO: Self = Self { is_pro: true };

    /// Status for an optional stored record; a missing record is Free.
    #[must_use]
    pub fn from_document(data: Option<&JsonValue>) -> Self {
        data.map_or(Self::FREE, |d| PlanRecord::decode(d).status())
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        if self.is_pro { "pro" } else { "free" }
    }
}

fn names_pro(name: &str) -> bool {
    name.eq_ignore_ascii_case(PRO)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn status(data: JsonValue) -> PlanStatus {
        PlanStatus::from_document(Some(&data))
    }

    #[test]
    fn string_plan_any_casing_is_pro() {
        for plan in ["Pro", "pro", "PRO", "pRo"] {
            assert!(status(json!({ "plan": plan })).is_pro, "{plan}");
        }
    }

    #[test]
    fn other_string_plans_are_free() {
        for plan in ["free", "Free", "", "professional", " pro"] {
            assert!(!status(json!({ "plan": plan })).is_pro, "{plan:?}");
        }
    }

    #[test]
    fn only_ascii_casing_is_folded() {
        // fullwidth and small-capital lookalikes stay Free
        for plan in ["\u{ff30}\u{ff32}\u{ff2f}", "\u{1d18}\u{280}\u{1d0f}", "pro\u{307}"] {
            assert!(!status(json!({ "plan": plan })).is_pro, "{plan:?}");
            assert!(!status(json!({ "plan": { "name": plan } })).is_pro, "{plan:?}");
        }
    }

    #[test]
    fn object_plan_uses_name() {
        assert!(status(json!({ "plan": { "name": "Pro" } })).is_pro);
        assert!(status(json!({ "plan": { "name": "PRO", "interval": "month" } })).is_pro);
        assert!(!status(json!({ "plan": { "name": "Basic" } })).is_pro);
        assert!(!status(json!({ "plan": { "tier": "pro" } })).is_pro);
        assert!(!status(json!({ "plan": { "name": 1 } })).is_pro);
        assert!(!status(json!({ "plan": { "name": null } })).is_pro);
    }

    #[test]
    fn missing_field_or_record_is_free() {
        assert!(!status(json!({})).is_pro);
        assert!(!status(json!({ "plan": null })).is_pro);
        assert!(!status(json!({ "email": "a@b.c" })).is_pro);
        assert_eq!(PlanStatus::from_document(None), PlanStatus::FREE);
    }

    #[test]
    fn unexpected_shapes_are_free() {
        assert!(!status(json!({ "plan": 1 })).is_pro);
        assert!(!status(json!({ "plan": true })).is_pro);
        assert!(!status(json!({ "plan": ["pro"] })).is_pro);
        assert!(!status(json!("pro")).is_pro);
        assert!(!status(json!(null)).is_pro);
    }

    #[test]
    fn decodes_into_tagged_variants() {
        assert_eq!(
            PlanRecord::decode(&json!({ "plan": "Pro" })).plan,
            Some(PlanField::Name("Pro".into()))
        );
        assert!(matches!(
            PlanRecord::decode(&json!({ "plan": { "name": "Pro" } })).plan,
            Some(PlanField::Object(_))
        ));
        assert!(matches!(
            PlanRecord::decode(&json!({ "plan": 7 })).plan,
            Some(PlanField::Other(_))
        ));
    }

    #[test]
    fn status_serializes_camel_case() {
        let json = serde_json::to_value(PlanStatus::PRO).unwrap();
        assert_eq!(json, json!({ "isPro": true }));
        assert_eq!(PlanStatus::FREE.name(), "free");
    }
}
