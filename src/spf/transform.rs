//! Parse tree to domain model.

use super::ip::Ip;
use super::macros::{Macro, MacroElement, MacroString};
use super::mechanism::{DualCidrLength, Mechanism, MechanismName};
use super::modifier::{Modifier, ModifierName};
use super::record::{Record, Rule, Version};
use super::tree::{
    DirectiveNode, DualCidrNode, ElementNode, MacroNode, ModifierNode, RecordNode, TermNode,
    ValueNode,
};
use super::types::Value;

pub(crate) fn record(node: RecordNode<'_>) -> Record {
    let rules = node.terms.into_iter().map(rule).collect();
    Record::new(Version::Spf1, rules)
}

fn rule(node: TermNode<'_>) -> Rule {
    match node {
        TermNode::Directive(directive) => Rule::Mechanism(mechanism(directive)),
        TermNode::Modifier(m) | TermNode::UnknownModifier(m) => Rule::Modifier(modifier(m)),
    }
}

fn mechanism(node: DirectiveNode<'_>) -> Mechanism {
    let mut mechanism = Mechanism::new(MechanismName::parse(node.name), node.value.map(value))
        .with_qualifier(node.qualifier);
    if let Some(DualCidrNode { ip4, ip6 }) = node.cidr {
        mechanism = mechanism.with_cidr(DualCidrLength::from_parts(ip4, ip6));
    }
    mechanism
}

fn modifier(node: ModifierNode<'_>) -> Modifier {
    Modifier::new(
        ModifierName::parse(node.name),
        node.value.map(|elements| Value::from_macro_string(macro_string(elements))),
    )
}

fn value(node: ValueNode<'_>) -> Value {
    match node {
        ValueNode::MacroString(elements) => Value::from_macro_string(macro_string(elements)),
        ValueNode::Ip(ip) => Value::Ip(Ip::from_parts(ip.address, ip.cidr_length)),
    }
}

fn macro_string(elements: Vec<ElementNode<'_>>) -> MacroString {
    elements.into_iter().map(element).collect()
}

fn element(node: ElementNode<'_>) -> MacroElement {
    match node {
        ElementNode::Literal(text) => MacroElement::Literal(text.to_string()),
        ElementNode::Macro(m) => MacroElement::Macro(expand(m)),
        ElementNode::Escape(escape) => MacroElement::Escape(escape),
    }
}

fn expand(node: MacroNode<'_>) -> Macro {
    let mut m = Macro::new(node.letter).with_delimiters(node.delimiters.chars());
    if let Some(digits) = node.digits {
        m = m.with_digit_text(digits);
    }
    if node.reverse {
        m = m.reversed();
    }
    m
}
