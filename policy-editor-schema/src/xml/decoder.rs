//! XML → editor model walker

use log::{trace, warn};
use xmltree::Element;

use super::{attribute, attribute_match, child_elements};
use crate::error::{Format, Result, TranslationError};
use crate::model::{
    AttributeMatch, Condition, ConditionChildren, Policy, PolicyDocument, PolicySet, Rule,
    COMBINE, CONDITION, DESCRIPTION, EFFECT, POLICY, POLICY_SET, RESOURCE_MATCH, RULE, SUBJECT,
    SUBJECT_MATCH, TARGET,
};

/// Decode the root element of a parsed policy document
pub(crate) fn decode_document(root: &Element) -> Result<PolicyDocument> {
    match root.name.as_str() {
        POLICY_SET => decode_policy_set(root).map(PolicyDocument::PolicySet),
        POLICY => decode_policy(root).map(PolicyDocument::Policy),
        other => Err(TranslationError::UnrecognizedRoot(other.to_string())),
    }
}

fn decode_policy_set(element: &Element) -> Result<PolicySet> {
    trace!("Decoding policy-set");
    let policies = child_elements(element, POLICY)
        .map(decode_policy)
        .collect::<Result<Vec<_>>>()?;
    let policy_sets = child_elements(element, POLICY_SET)
        .map(decode_policy_set)
        .collect::<Result<Vec<_>>>()?;

    Ok(PolicySet {
        combine: attribute(element, COMBINE),
        description: attribute(element, DESCRIPTION),
        policy: present(policies),
        policy_set: present(policy_sets),
    })
}

fn decode_policy(element: &Element) -> Result<Policy> {
    trace!("Decoding policy");
    let mut targets = child_elements(element, TARGET);
    let subject = match targets.next() {
        Some(target) => {
            if targets.next().is_some() {
                warn!("Policy has more than one target; only the first is translated");
            }
            decode_target(target)?
        }
        None => Vec::new(),
    };

    let rule = child_elements(element, RULE)
        .map(decode_rule)
        .collect::<Result<Vec<_>>>()?;

    Ok(Policy {
        combine: attribute(element, COMBINE),
        description: attribute(element, DESCRIPTION),
        subject,
        rule,
    })
}

/// Flatten `target/subject/subject-match` into the editor's subject list
fn decode_target(target: &Element) -> Result<Vec<AttributeMatch>> {
    let mut subjects = child_elements(target, SUBJECT);
    let subject = subjects.next().ok_or_else(|| {
        TranslationError::parse(Format::Xml, "'target' element has no 'subject' child")
    })?;
    if subjects.next().is_some() {
        warn!("Target has more than one subject; only the first is translated");
    }
    Ok(child_elements(subject, SUBJECT_MATCH)
        .map(attribute_match)
        .collect())
}

fn decode_rule(element: &Element) -> Result<Rule> {
    let effect = match element.attributes.get(EFFECT) {
        Some(effect) => effect.clone(),
        None => {
            warn!("Rule has no effect attribute; keeping an empty effect");
            String::new()
        }
    };
    let conditions = child_elements(element, CONDITION)
        .map(decode_condition)
        .collect::<Result<Vec<_>>>()?;

    Ok(Rule {
        effect,
        condition: present(conditions),
    })
}

fn decode_condition(element: &Element) -> Result<Condition> {
    let nested = child_elements(element, CONDITION)
        .map(decode_condition)
        .collect::<Result<Vec<_>>>()?;

    let children = if nested.is_empty() {
        let matches: Vec<_> = child_elements(element, RESOURCE_MATCH)
            .map(attribute_match)
            .collect();
        present(matches).map(ConditionChildren::Leaf)
    } else {
        if child_elements(element, RESOURCE_MATCH).next().is_some() {
            warn!("Condition mixes nested conditions and resource matches; ignoring resource matches");
        }
        Some(ConditionChildren::Nested(nested))
    };

    Ok(Condition {
        combine: attribute(element, COMBINE),
        children,
    })
}

/// `None` for an empty list so the key is omitted from the editor output
fn present<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse;
    use pretty_assertions::assert_eq;

    fn decode(xml: &str) -> Result<PolicyDocument> {
        decode_document(&parse(xml.as_bytes()).unwrap())
    }

    fn attrs(pairs: &[(&str, &str)]) -> AttributeMatch {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_unrecognized_root() {
        let error = decode("<rule effect=\"Permit\"/>").unwrap_err();
        assert!(matches!(error, TranslationError::UnrecognizedRoot(ref name) if name == "rule"));
    }

    #[test]
    fn test_empty_policy_set_omits_children() {
        let document = decode(r#"<policy-set combine="first-applicable"/>"#).unwrap();
        assert_eq!(
            document,
            PolicyDocument::PolicySet(PolicySet {
                combine: Some("first-applicable".to_string()),
                ..PolicySet::default()
            })
        );
    }

    #[test]
    fn test_policy_subject_is_flattened() {
        let document = decode(
            r#"<policy combine="deny-overrides">
                 <target>
                   <subject>
                     <subject-match attr="user-id" match="alice"/>
                     <subject-match attr="requestor-id" match="http://example.org/app"/>
                   </subject>
                 </target>
                 <rule effect="Permit"/>
               </policy>"#,
        )
        .unwrap();

        let PolicyDocument::Policy(policy) = document else {
            panic!("expected a policy root");
        };
        assert_eq!(
            policy.subject,
            vec![
                attrs(&[("attr", "user-id"), ("match", "alice")]),
                attrs(&[("attr", "requestor-id"), ("match", "http://example.org/app")]),
            ]
        );
        assert_eq!(policy.rule, vec![Rule::new("Permit")]);
    }

    #[test]
    fn test_match_keys_keep_their_prefixes() {
        let document = decode(
            r#"<policy xmlns:ex="urn:ex">
                 <target>
                   <subject>
                     <subject-match ex:attr="role" attr="user-id" xml:lang="en"/>
                     <subject-match xmlns:ex="urn:ex2" ex:attr="group"/>
                   </subject>
                 </target>
               </policy>"#,
        )
        .unwrap();

        let PolicyDocument::Policy(policy) = document else {
            panic!("expected a policy root");
        };
        assert_eq!(
            policy.subject,
            vec![
                attrs(&[("attr", "user-id"), ("ex:attr", "role"), ("xml:lang", "en")]),
                attrs(&[("ex:attr", "group"), ("xmlns:ex", "urn:ex2")]),
            ]
        );
    }

    #[test]
    fn test_target_without_subject_fails() {
        let error = decode(r#"<policy><target/><rule effect="Deny"/></policy>"#).unwrap_err();
        assert!(matches!(
            error,
            TranslationError::Parse {
                format: Format::Xml,
                ..
            }
        ));
    }

    #[test]
    fn test_rule_without_effect_decodes_to_empty_effect() {
        let document = decode("<policy><rule/></policy>").unwrap();
        let PolicyDocument::Policy(policy) = document else {
            panic!("expected a policy root");
        };
        assert_eq!(policy.rule, vec![Rule::new("")]);
    }

    #[test]
    fn test_nested_conditions_win_over_resource_matches() {
        let document = decode(
            r#"<policy>
                 <rule effect="Permit">
                   <condition combine="or">
                     <resource-match attr="api-feature" match="http://webinos.org/api/file"/>
                     <condition>
                       <resource-match attr="api-feature" match="http://webinos.org/api/camera"/>
                     </condition>
                   </condition>
                 </rule>
               </policy>"#,
        )
        .unwrap();
        let PolicyDocument::Policy(policy) = document else {
            panic!("expected a policy root");
        };
        let conditions = policy.rule[0].condition.clone().unwrap();
        assert_eq!(
            conditions,
            vec![Condition::nested(
                Some("or".to_string()),
                vec![Condition::leaf(
                    None,
                    vec![attrs(&[
                        ("attr", "api-feature"),
                        ("match", "http://webinos.org/api/camera")
                    ])]
                )]
            )]
        );
    }

    #[test]
    fn test_condition_without_children_keeps_combine() {
        let document =
            decode(r#"<policy><rule effect="Deny"><condition combine="and"/></rule></policy>"#)
                .unwrap();
        let PolicyDocument::Policy(policy) = document else {
            panic!("expected a policy root");
        };
        assert_eq!(
            policy.rule[0].condition,
            Some(vec![Condition {
                combine: Some("and".to_string()),
                children: None,
            }])
        );
    }
}
