//! Parse tree emitted by the grammar.
//!
//! Nodes borrow from the input text. They carry exactly what was matched,
//! so the transform can rebuild the textual form without re-deriving it.

use super::macros::{Escape, MacroLetter};
use super::types::Qualifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordNode<'a> {
    pub terms: Vec<TermNode<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TermNode<'a> {
    Directive(DirectiveNode<'a>),
    /// `redirect=` or `exp=`.
    Modifier(ModifierNode<'a>),
    UnknownModifier(ModifierNode<'a>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DirectiveNode<'a> {
    pub qualifier: Option<Qualifier>,
    pub name: &'a str,
    pub value: Option<ValueNode<'a>>,
    pub cidr: Option<DualCidrNode<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ValueNode<'a> {
    MacroString(Vec<ElementNode<'a>>),
    Ip(IpNode<'a>),
}

/// `[/ip4-length][//ip6-length]`, digits as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DualCidrNode<'a> {
    pub ip4: Option<&'a str>,
    pub ip6: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IpNode<'a> {
    pub address: &'a str,
    pub cidr_length: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ModifierNode<'a> {
    pub name: &'a str,
    pub value: Option<Vec<ElementNode<'a>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ElementNode<'a> {
    Literal(&'a str),
    Macro(MacroNode<'a>),
    Escape(Escape),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MacroNode<'a> {
    pub letter: MacroLetter,
    pub digits: Option<&'a str>,
    pub reverse: bool,
    pub delimiters: &'a str,
}
