//! Editor model → XML walker

use log::{trace, warn};
use xmltree::{Element, XMLNode};

use super::{check_attribute_match, check_attribute_value};
use crate::error::Result;
use crate::model::{
    non_empty_attr, AttributeMatch, Condition, ConditionChildren, Policy, PolicyDocument,
    PolicySet, Rule, COMBINE, CONDITION, DESCRIPTION, EFFECT, POLICY, POLICY_SET,
    RESOURCE_MATCH, RULE, SUBJECT, SUBJECT_MATCH, TARGET,
};

/// Build the attributed element tree for a policy document.
///
/// Fails with a serialize error when an attribute name or value cannot be written as XML.
pub(crate) fn encode_document(document: &PolicyDocument) -> Result<Element> {
    match document {
        PolicyDocument::PolicySet(set) => encode_policy_set(set),
        PolicyDocument::Policy(policy) => encode_policy(policy),
    }
}

fn encode_policy_set(set: &PolicySet) -> Result<Element> {
    trace!("Encoding policy-set");
    let mut element = Element::new(POLICY_SET);
    set_attribute(&mut element, COMBINE, set.combine.as_deref())?;
    set_attribute(&mut element, DESCRIPTION, set.description.as_deref())?;

    for policy in set.policy.iter().flatten() {
        push_child(&mut element, encode_policy(policy)?);
    }
    for nested in set.policy_set.iter().flatten() {
        push_child(&mut element, encode_policy_set(nested)?);
    }
    Ok(element)
}

fn encode_policy(policy: &Policy) -> Result<Element> {
    trace!("Encoding policy");
    let mut element = Element::new(POLICY);
    set_attribute(&mut element, COMBINE, policy.combine.as_deref())?;
    set_attribute(&mut element, DESCRIPTION, policy.description.as_deref())?;

    if !policy.subject.is_empty() {
        let mut subject = Element::new(SUBJECT);
        for subject_match in &policy.subject {
            push_child(&mut subject, match_element(SUBJECT_MATCH, subject_match)?);
        }
        let mut target = Element::new(TARGET);
        push_child(&mut target, subject);
        push_child(&mut element, target);
    }

    for rule in &policy.rule {
        push_child(&mut element, encode_rule(rule)?);
    }
    Ok(element)
}

fn encode_rule(rule: &Rule) -> Result<Element> {
    let mut element = Element::new(RULE);
    if rule.effect.is_empty() {
        warn!("Rule has no effect; writing an empty effect attribute");
    }
    check_attribute_value(EFFECT, &rule.effect)?;
    element
        .attributes
        .insert(EFFECT.to_string(), rule.effect.clone());

    for condition in rule.condition.iter().flatten() {
        push_child(&mut element, encode_condition(condition)?);
    }
    Ok(element)
}

fn encode_condition(condition: &Condition) -> Result<Element> {
    let mut element = Element::new(CONDITION);
    set_attribute(&mut element, COMBINE, condition.combine.as_deref())?;

    match &condition.children {
        Some(ConditionChildren::Nested(nested)) => {
            for child in nested {
                push_child(&mut element, encode_condition(child)?);
            }
        }
        Some(ConditionChildren::Leaf(matches)) => {
            for resource_match in matches {
                push_child(&mut element, match_element(RESOURCE_MATCH, resource_match)?);
            }
        }
        None => {}
    }
    Ok(element)
}

/// Element whose attribute set is a verbatim copy of `attributes`
fn match_element(name: &str, attributes: &AttributeMatch) -> Result<Element> {
    check_attribute_match(attributes)?;
    let mut element = Element::new(name);
    for (key, value) in attributes {
        element.attributes.insert(key.clone(), value.clone());
    }
    Ok(element)
}

fn set_attribute(element: &mut Element, name: &str, value: Option<&str>) -> Result<()> {
    if let Some(value) = non_empty_attr(value) {
        check_attribute_value(name, &value)?;
        element.attributes.insert(name.to_string(), value);
    }
    Ok(())
}

fn push_child(parent: &mut Element, child: Element) {
    parent.children.push(XMLNode::Element(child));
}
