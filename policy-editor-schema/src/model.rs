//! Shared policy grammar
//!
//! The typed tree both translation directions walk. The serde representation of these
//! types *is* the editor JSON schema; the XML walkers in [`crate::xml`] map the same
//! types onto attributed elements.
//!
//! Optional attributes and child collections are modelled with `Option` so that an absent
//! key and an empty collection stay distinguishable across a round trip.

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};

pub(crate) const POLICY_SET: &str = "policy-set";
pub(crate) const POLICY: &str = "policy";
pub(crate) const TARGET: &str = "target";
pub(crate) const SUBJECT: &str = "subject";
pub(crate) const SUBJECT_MATCH: &str = "subject-match";
pub(crate) const RULE: &str = "rule";
pub(crate) const CONDITION: &str = "condition";
pub(crate) const RESOURCE_MATCH: &str = "resource-match";
pub(crate) const COMBINE: &str = "combine";
pub(crate) const DESCRIPTION: &str = "description";
pub(crate) const EFFECT: &str = "effect";

/// Flat attribute-name to attribute-value mapping of a `subject-match` or `resource-match`
pub type AttributeMatch = BTreeMap<String, String>;

/// Root of a policy document: exactly one policy set or one policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyDocument {
    PolicySet(PolicySet),
    Policy(Policy),
}

impl PolicyDocument {
    /// Tag name of the root element / key of the root JSON member
    pub fn root_name(&self) -> &'static str {
        match self {
            Self::PolicySet(_) => POLICY_SET,
            Self::Policy(_) => POLICY,
        }
    }
}

/// Root or nested container of policies and policy sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySet {
    /// Combining algorithm identifier, copied verbatim
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_empty")]
    pub combine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_empty")]
    pub description: Option<String>,
    /// Child policies; `None` when the set has none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<Vec<Policy>>,
    /// Nested policy sets; `None` when the set has none
    #[serde(
        rename = "policy-set",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub policy_set: Option<Vec<PolicySet>>,
}

/// A single policy: an optional subject target plus its rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_empty")]
    pub combine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_empty")]
    pub description: Option<String>,
    /// Subject matches of the policy target, flattened out of `target/subject`
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: Vec<AttributeMatch>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rule: Vec<Rule>,
}

/// Permit/deny rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Rule effect (e.g. "Permit" or "Deny"). Empty when the source carried none.
    #[serde(default, deserialize_with = "null_as_default")]
    pub effect: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Vec<Condition>>,
}

impl Rule {
    pub fn new(effect: impl Into<String>) -> Self {
        Self {
            effect: effect.into(),
            condition: None,
        }
    }
}

/// Resource condition: either an internal node of sub-conditions or a leaf of matches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ConditionRepr", into = "ConditionRepr")]
pub struct Condition {
    pub combine: Option<String>,
    pub children: Option<ConditionChildren>,
}

/// Children of a [`Condition`]. The two kinds never mix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionChildren {
    Nested(Vec<Condition>),
    Leaf(Vec<AttributeMatch>),
}

impl Condition {
    pub fn nested(combine: Option<String>, conditions: Vec<Condition>) -> Self {
        Self {
            combine,
            children: Some(ConditionChildren::Nested(conditions)),
        }
    }

    pub fn leaf(combine: Option<String>, matches: Vec<AttributeMatch>) -> Self {
        Self {
            combine,
            children: Some(ConditionChildren::Leaf(matches)),
        }
    }
}

/// Editor JSON shape of a condition
#[derive(Serialize, Deserialize)]
struct ConditionRepr {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_empty")]
    combine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition: Option<Vec<Condition>>,
    #[serde(
        rename = "resource-match",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    resource_match: Option<Vec<AttributeMatch>>,
}

impl From<ConditionRepr> for Condition {
    fn from(repr: ConditionRepr) -> Self {
        let children = match (repr.condition, repr.resource_match) {
            (Some(nested), resource_match) => {
                if resource_match.is_some() {
                    warn!("Condition carries both nested conditions and resource matches; ignoring resource matches");
                }
                Some(ConditionChildren::Nested(nested))
            }
            (None, Some(matches)) => Some(ConditionChildren::Leaf(matches)),
            (None, None) => None,
        };
        Self {
            combine: repr.combine,
            children,
        }
    }
}

impl From<Condition> for ConditionRepr {
    fn from(condition: Condition) -> Self {
        let (nested, matches) = match condition.children {
            Some(ConditionChildren::Nested(nested)) => (Some(nested), None),
            Some(ConditionChildren::Leaf(matches)) => (None, Some(matches)),
            None => (None, None),
        };
        Self {
            combine: condition.combine,
            condition: nested,
            resource_match: matches,
        }
    }
}

/// Empty attribute strings count as absent, in both directions
pub(crate) fn non_empty_attr(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|v| !v.is_empty()))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn resource(attr: &str, value: &str) -> AttributeMatch {
        AttributeMatch::from([
            ("attr".to_string(), attr.to_string()),
            ("match".to_string(), value.to_string()),
        ])
    }

    #[test]
    fn test_policy_document_is_keyed_by_root_name() {
        let document = PolicyDocument::PolicySet(PolicySet::default());
        assert_eq!(document.root_name(), "policy-set");
        assert_eq!(serde_json::to_value(&document).unwrap(), json!({"policy-set": {}}));

        let document = PolicyDocument::Policy(Policy::default());
        assert_eq!(document.root_name(), "policy");
        assert_eq!(
            serde_json::to_value(&document).unwrap(),
            json!({"policy": {"subject": [], "rule": []}})
        );
    }

    #[test]
    fn test_empty_and_null_attributes_are_absent() {
        let set: PolicySet =
            serde_json::from_value(json!({"combine": "", "description": null})).unwrap();
        assert_eq!(set, PolicySet::default());
    }

    #[test]
    fn test_policy_defaults_missing_collections() {
        let policy: Policy =
            serde_json::from_value(json!({"combine": "first-applicable", "subject": null}))
                .unwrap();
        assert!(policy.subject.is_empty());
        assert!(policy.rule.is_empty());
    }

    #[test]
    fn test_rule_without_effect_keeps_empty_placeholder() {
        let rule: Rule = serde_json::from_value(json!({})).unwrap();
        assert_eq!(rule.effect, "");
        assert_eq!(serde_json::to_value(&rule).unwrap(), json!({"effect": ""}));
    }

    #[test]
    fn test_condition_nested_wins_over_resource_match() {
        let condition: Condition = serde_json::from_value(json!({
            "combine": "or",
            "condition": [{"resource-match": [{"attr": "api-feature", "match": "camera"}]}],
            "resource-match": [{"attr": "api-feature", "match": "geolocation"}]
        }))
        .unwrap();

        assert_eq!(
            condition,
            Condition::nested(
                Some("or".to_string()),
                vec![Condition::leaf(None, vec![resource("api-feature", "camera")])]
            )
        );
        let value = serde_json::to_value(&condition).unwrap();
        assert!(value.get("resource-match").is_none());
    }

    #[test]
    fn test_condition_without_children_keeps_only_combine() {
        let condition: Condition = serde_json::from_value(json!({"combine": "and"})).unwrap();
        assert_eq!(condition.children, None);
        assert_eq!(serde_json::to_value(&condition).unwrap(), json!({"combine": "and"}));
    }

    #[test]
    fn test_non_empty_attr() {
        assert_eq!(non_empty_attr(Some("permit-overrides")), Some("permit-overrides".to_string()));
        assert_eq!(non_empty_attr(Some("")), None);
        assert_eq!(non_empty_attr(None), None);
    }
}
