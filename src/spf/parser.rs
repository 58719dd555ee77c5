//! SPF record grammar (RFC 7208 Section 4.6, 5 and 7.1).
//!
//! A recursive-descent PEG: one method per nonterminal, ordered choice
//! commits to the first alternative that matches and repetition is greedy.
//! Failures are reported at the farthest offset reached, together with
//! everything that would have been accepted there.

use std::fmt;

use super::macros::{Escape, MacroLetter};
use super::tree::{
    DirectiveNode, DualCidrNode, ElementNode, IpNode, MacroNode, ModifierNode, RecordNode,
    TermNode, ValueNode,
};
use super::types::Qualifier;

/// Something the parser would have accepted at the failing offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expected {
    /// An exact piece of text, e.g. `"include"`.
    Literal(&'static str),
    /// A character class or a named rule, e.g. `digit` or `IPv4 address`.
    Class(&'static str),
    EndOfInput,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Literal(text) => write!(f, "{text:?}"),
            Expected::Class(name) => f.write_str(name),
            Expected::EndOfInput => f.write_str("end of input"),
        }
    }
}

/// Position-tagged parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    position: usize,
    expected: Vec<Expected>,
}

impl ParseFailure {
    pub(crate) fn new(position: usize, expected: Vec<Expected>) -> Self {
        Self { position, expected }
    }

    /// Byte offset of the farthest point the grammar reached.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Alternatives accepted at [`position`](Self::position), in the order
    /// the grammar tried them.
    pub fn expected(&self) -> &[Expected] {
        &self.expected
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at offset {}: expected ", self.position)?;
        match self.expected.split_last() {
            None => f.write_str("nothing"),
            Some((last, [])) => write!(f, "{last}"),
            Some((last, rest)) => {
                for (i, item) in rest.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, " or {last}")
            }
        }
    }
}

/// Parse a complete SPF record into its parse tree.
pub(crate) fn parse(input: &str) -> Result<RecordNode<'_>, ParseFailure> {
    let mut parser = Parser::new(input);
    if let Some(record) = parser.record() {
        if parser.at_end() {
            return Ok(record);
        }
        parser.fail(Expected::EndOfInput);
    }
    Err(parser.into_failure())
}

/// Recognize a SenderID version prefix (RFC 4406 Section 4):
/// `spf2.0/<scope>[,<scope>...]`. Returns the scopes.
pub(crate) fn sender_id_scopes(input: &str) -> Option<Vec<String>> {
    const PREFIX: &str = "spf2.0/";
    let head = input.get(..PREFIX.len())?;
    if !head.eq_ignore_ascii_case(PREFIX) {
        return None;
    }
    let version = input[PREFIX.len()..]
        .split(' ')
        .next()
        .unwrap_or_default();
    Some(
        version
            .split(',')
            .filter(|scope| !scope.is_empty())
            .map(str::to_ascii_lowercase)
            .collect(),
    )
}

type Alternative<'a, T> = fn(&mut Parser<'a>) -> Option<T>;

pub(crate) struct Parser<'a> {
    input: &'a str,
    pos: usize,
    farthest: usize,
    expected: Vec<Expected>,
    quiet: u32,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            farthest: 0,
            expected: Vec::new(),
            quiet: 0,
        }
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos == self.input.len()
    }

    pub(crate) fn into_failure(self) -> ParseFailure {
        ParseFailure::new(self.farthest, self.expected)
    }

    fn fail(&mut self, what: Expected) {
        if self.quiet > 0 {
            return;
        }
        if self.pos > self.farthest {
            self.farthest = self.pos;
            self.expected.clear();
        }
        if self.pos == self.farthest && !self.expected.contains(&what) {
            self.expected.push(what);
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    // Only ASCII is ever consumed, so `pos` always sits on a char boundary.
    fn slice(&self, start: usize) -> &'a str {
        &self.input[start..self.pos]
    }

    /// Run `rule`, rewinding to the starting offset when it does not match.
    fn attempt<T>(&mut self, rule: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let start = self.pos;
        let result = rule(self);
        if result.is_none() {
            self.pos = start;
        }
        result
    }

    /// Run `rule` as a single named unit: inner expectations are dropped and
    /// a failure is reported as `label` at the starting offset.
    fn named<T>(
        &mut self,
        label: &'static str,
        rule: impl FnOnce(&mut Self) -> Option<T>,
    ) -> Option<T> {
        self.quiet += 1;
        let result = self.attempt(rule);
        self.quiet -= 1;
        if result.is_none() {
            self.fail(Expected::Class(label));
        }
        result
    }

    fn first_of<T>(&mut self, alternatives: &[Alternative<'a, T>]) -> Option<T> {
        alternatives.iter().find_map(|alt| self.attempt(*alt))
    }

    fn literal(&mut self, text: &'static str) -> Option<()> {
        if self.input.as_bytes()[self.pos..].starts_with(text.as_bytes()) {
            self.pos += text.len();
            Some(())
        } else {
            self.fail(Expected::Literal(text));
            None
        }
    }

    fn keyword(&mut self, text: &'static str) -> Option<&'a str> {
        let start = self.pos;
        self.literal(text)?;
        Some(self.slice(start))
    }

    fn class(&mut self, name: &'static str, accept: fn(u8) -> bool) -> Option<u8> {
        match self.peek() {
            Some(byte) if accept(byte) => {
                self.pos += 1;
                Some(byte)
            }
            _ => {
                self.fail(Expected::Class(name));
                None
            }
        }
    }

    fn digit(&mut self) -> Option<u8> {
        self.class("digit", |b| b.is_ascii_digit())
    }

    /// `1*DIGIT`
    fn digits(&mut self) -> Option<&'a str> {
        let start = self.pos;
        while self.digit().is_some() {}
        if self.pos > start {
            Some(self.slice(start))
        } else {
            None
        }
    }

    /// `*SP`, returning how many spaces were consumed.
    fn spaces(&mut self) -> usize {
        let start = self.pos;
        while self.literal(" ").is_some() {}
        self.pos - start
    }

    /// `record = "v=spf1" 1*SP terms *SP`
    pub(crate) fn record(&mut self) -> Option<RecordNode<'a>> {
        self.literal("v=")?;
        self.literal("spf1")?;
        if self.spaces() == 0 {
            return None;
        }
        let terms = self.terms()?;
        self.spaces();
        Some(RecordNode { terms })
    }

    /// `terms = term *(1*SP term)`
    pub(crate) fn terms(&mut self) -> Option<Vec<TermNode<'a>>> {
        let mut terms = vec![self.term()?];
        loop {
            let mark = self.pos;
            if self.spaces() == 0 {
                break;
            }
            match self.term() {
                Some(term) => terms.push(term),
                None => {
                    self.pos = mark;
                    break;
                }
            }
        }
        Some(terms)
    }

    /// `term = directive / modifier`
    pub(crate) fn term(&mut self) -> Option<TermNode<'a>> {
        if let Some(directive) = self.attempt(Self::directive) {
            return Some(TermNode::Directive(directive));
        }
        self.modifier()
    }

    /// `directive = [qualifier] mechanism`
    pub(crate) fn directive(&mut self) -> Option<DirectiveNode<'a>> {
        let qualifier = self
            .class("qualifier", |b| matches!(b, b'+' | b'-' | b'~' | b'?'))
            .and_then(|b| Qualifier::from_char(char::from(b)));
        let mut directive = self.mechanism()?;
        directive.qualifier = qualifier;
        Some(directive)
    }

    /// Mechanism alternatives, tried in RFC order. The qualifier is filled
    /// in by [`directive`](Self::directive).
    pub(crate) fn mechanism(&mut self) -> Option<DirectiveNode<'a>> {
        self.first_of(&[
            Self::all,
            Self::include,
            Self::a,
            Self::mx,
            Self::ptr,
            Self::ip4,
            Self::ip6,
            Self::exists,
        ])
    }

    fn all(&mut self) -> Option<DirectiveNode<'a>> {
        let name = self.keyword("all")?;
        Some(bare(name))
    }

    /// `include = "include" ":" domain-spec`
    fn include(&mut self) -> Option<DirectiveNode<'a>> {
        self.required_domain("include")
    }

    /// `exists = "exists" ":" domain-spec`
    fn exists(&mut self) -> Option<DirectiveNode<'a>> {
        self.required_domain("exists")
    }

    fn required_domain(&mut self, keyword: &'static str) -> Option<DirectiveNode<'a>> {
        let name = self.keyword(keyword)?;
        self.literal(":")?;
        let spec = self.domain_spec()?;
        Some(DirectiveNode {
            value: Some(ValueNode::MacroString(spec)),
            ..bare(name)
        })
    }

    /// `a = "a" [":" domain-spec] [dual-cidr-length]`
    fn a(&mut self) -> Option<DirectiveNode<'a>> {
        self.host_lookup("a")
    }

    /// `mx = "mx" [":" domain-spec] [dual-cidr-length]`
    fn mx(&mut self) -> Option<DirectiveNode<'a>> {
        self.host_lookup("mx")
    }

    fn host_lookup(&mut self, keyword: &'static str) -> Option<DirectiveNode<'a>> {
        let name = self.keyword(keyword)?;
        let value = self.optional_domain();
        let cidr = self.dual_cidr_length();
        Some(DirectiveNode {
            value,
            cidr,
            ..bare(name)
        })
    }

    /// `ptr = "ptr" [":" domain-spec]`
    fn ptr(&mut self) -> Option<DirectiveNode<'a>> {
        let name = self.keyword("ptr")?;
        let value = self.optional_domain();
        Some(DirectiveNode {
            value,
            ..bare(name)
        })
    }

    fn optional_domain(&mut self) -> Option<ValueNode<'a>> {
        self.attempt(|p| {
            p.literal(":")?;
            p.domain_spec()
        })
        .map(ValueNode::MacroString)
    }

    /// `ip4 = "ip4" ":" ipv4-address ["/" 1*DIGIT]`
    fn ip4(&mut self) -> Option<DirectiveNode<'a>> {
        let name = self.keyword("ip4")?;
        self.literal(":")?;
        let address = self.named("IPv4 address", Self::ipv4_address)?;
        Some(self.ip_network(name, address))
    }

    /// `ip6 = "ip6" ":" ipv6-address ["/" 1*DIGIT]`
    fn ip6(&mut self) -> Option<DirectiveNode<'a>> {
        let name = self.keyword("ip6")?;
        self.literal(":")?;
        let address = self.named("IPv6 address", Self::ipv6_address)?;
        Some(self.ip_network(name, address))
    }

    fn ip_network(&mut self, name: &'a str, address: &'a str) -> DirectiveNode<'a> {
        let cidr_length = self.cidr_length();
        DirectiveNode {
            value: Some(ValueNode::Ip(IpNode {
                address,
                cidr_length,
            })),
            ..bare(name)
        }
    }

    /// `"/" 1*DIGIT`
    fn cidr_length(&mut self) -> Option<&'a str> {
        self.attempt(|p| {
            p.literal("/")?;
            p.digits()
        })
    }

    /// `dual-cidr-length = ["/" 1*DIGIT] ["/" "/" 1*DIGIT]`
    pub(crate) fn dual_cidr_length(&mut self) -> Option<DualCidrNode<'a>> {
        let ip4 = self.cidr_length();
        let ip6 = self.attempt(|p| {
            p.literal("/")?;
            p.cidr_length()
        });
        if ip4.is_none() && ip6.is_none() {
            None
        } else {
            Some(DualCidrNode { ip4, ip6 })
        }
    }

    /// `modifier = redirect / explanation / unknown-modifier`
    pub(crate) fn modifier(&mut self) -> Option<TermNode<'a>> {
        if let Some(modifier) = self.attempt(|p| p.known_modifier("redirect")) {
            return Some(TermNode::Modifier(modifier));
        }
        if let Some(modifier) = self.attempt(|p| p.known_modifier("exp")) {
            return Some(TermNode::Modifier(modifier));
        }
        self.attempt(Self::unknown_modifier)
            .map(TermNode::UnknownModifier)
    }

    fn known_modifier(&mut self, keyword: &'static str) -> Option<ModifierNode<'a>> {
        let name = self.keyword(keyword)?;
        self.literal("=")?;
        let spec = self.domain_spec()?;
        Some(ModifierNode {
            name,
            value: Some(spec),
        })
    }

    /// `unknown-modifier = name "=" [macro-string]`
    fn unknown_modifier(&mut self) -> Option<ModifierNode<'a>> {
        let name = self.name()?;
        self.literal("=")?;
        let value = self.macro_string();
        Some(ModifierNode {
            name,
            value: (!value.is_empty()).then_some(value),
        })
    }

    /// `name = ALPHA *(ALPHA / DIGIT / "-" / "_" / ".")`
    pub(crate) fn name(&mut self) -> Option<&'a str> {
        let start = self.pos;
        self.class("letter", |b| b.is_ascii_alphabetic())?;
        while self
            .class("name character", |b| {
                b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.')
            })
            .is_some()
        {}
        Some(self.slice(start))
    }

    /// `domain-spec = macro-string`, at least one element.
    pub(crate) fn domain_spec(&mut self) -> Option<Vec<ElementNode<'a>>> {
        let spec = self.macro_string();
        if spec.is_empty() {
            None
        } else {
            Some(spec)
        }
    }

    /// `macro-string = *(macro-expand / 1*macro-literal)`
    pub(crate) fn macro_string(&mut self) -> Vec<ElementNode<'a>> {
        let mut elements = Vec::new();
        loop {
            if let Some(expand) = self.named("macro expansion", Self::macro_expand) {
                elements.push(expand);
                continue;
            }
            let start = self.pos;
            while self
                .class("macro literal", |b| matches!(b, 0x21..=0x24 | 0x26..=0x7e))
                .is_some()
            {}
            if self.pos == start {
                return elements;
            }
            elements.push(ElementNode::Literal(self.slice(start)));
        }
    }

    /// `macro-expand = ("%{" macro-letter transformers *delimiter "}")
    ///               / "%%" / "%_" / "%-"`
    fn macro_expand(&mut self) -> Option<ElementNode<'a>> {
        if let Some(expand) = self.attempt(Self::braced_macro) {
            return Some(ElementNode::Macro(expand));
        }
        for escape in [Escape::Percent, Escape::Space, Escape::UrlSpace] {
            if self.literal(escape.as_str()).is_some() {
                return Some(ElementNode::Escape(escape));
            }
        }
        None
    }

    fn braced_macro(&mut self) -> Option<MacroNode<'a>> {
        self.literal("%{")?;
        let letter = self.class("macro letter", |b| b"slodiphcrtv".contains(&b))?;
        let letter = MacroLetter::from_char(char::from(letter))?;
        // transformers = *DIGIT ["r"]
        let start = self.pos;
        while self.digit().is_some() {}
        let digits = (self.pos > start).then(|| self.slice(start));
        let reverse = self.literal("r").is_some();
        let start = self.pos;
        while self
            .class("delimiter", |b| b"-.+,/_=".contains(&b))
            .is_some()
        {}
        let delimiters = self.slice(start);
        self.literal("}")?;
        Some(MacroNode {
            letter,
            digits,
            reverse,
            delimiters,
        })
    }

    /// `ipv4-address = dec-octet "." dec-octet "." dec-octet "." dec-octet`
    pub(crate) fn ipv4_address(&mut self) -> Option<&'a str> {
        let start = self.pos;
        self.dec_octet()?;
        for _ in 0..3 {
            self.literal(".")?;
            self.dec_octet()?;
        }
        Some(self.slice(start))
    }

    /// `dec-octet = "25" %x30-35 / "2" %x30-34 DIGIT / "1" 2DIGIT
    ///           / %x31-39 DIGIT / DIGIT`
    fn dec_octet(&mut self) -> Option<()> {
        self.first_of(&[
            |p: &mut Self| {
                p.literal("25")?;
                p.class("digit", |b| (b'0'..=b'5').contains(&b)).map(drop)
            },
            |p: &mut Self| {
                p.literal("2")?;
                p.class("digit", |b| (b'0'..=b'4').contains(&b))?;
                p.digit().map(drop)
            },
            |p: &mut Self| {
                p.literal("1")?;
                p.digit()?;
                p.digit().map(drop)
            },
            |p: &mut Self| {
                p.class("digit", |b| (b'1'..=b'9').contains(&b))?;
                p.digit().map(drop)
            },
            |p: &mut Self| p.digit().map(drop),
        ])
    }

    /// RFC 3986 `IPv6address`, every alternative carrying its own tail so a
    /// shorter alternative never shadows a longer one.
    pub(crate) fn ipv6_address(&mut self) -> Option<&'a str> {
        let start = self.pos;
        self.first_of(&[
            |p: &mut Self| {
                p.h16_colons(6)?;
                p.ls32()
            },
            |p: &mut Self| {
                p.literal("::")?;
                p.h16_colons(5)?;
                p.ls32()
            },
            |p: &mut Self| {
                p.h16_prefix(0);
                p.literal("::")?;
                p.h16_colons(4)?;
                p.ls32()
            },
            |p: &mut Self| {
                p.h16_prefix(1);
                p.literal("::")?;
                p.h16_colons(3)?;
                p.ls32()
            },
            |p: &mut Self| {
                p.h16_prefix(2);
                p.literal("::")?;
                p.h16_colons(2)?;
                p.ls32()
            },
            |p: &mut Self| {
                p.h16_prefix(3);
                p.literal("::")?;
                p.h16_colons(1)?;
                p.ls32()
            },
            |p: &mut Self| {
                p.h16_prefix(4);
                p.literal("::")?;
                p.ls32()
            },
            |p: &mut Self| {
                p.h16_prefix(5);
                p.literal("::")?;
                p.h16()
            },
            |p: &mut Self| {
                p.h16_prefix(6);
                p.literal("::")
            },
        ])?;
        Some(self.slice(start))
    }

    /// `h16 = 1*4HEXDIG`
    fn h16(&mut self) -> Option<()> {
        self.class("hex digit", |b| b.is_ascii_hexdigit())?;
        for _ in 0..3 {
            if self.class("hex digit", |b| b.is_ascii_hexdigit()).is_none() {
                break;
            }
        }
        Some(())
    }

    /// Exactly `count` repetitions of `h16 ":"`.
    fn h16_colons(&mut self, count: usize) -> Option<()> {
        for _ in 0..count {
            self.h16()?;
            self.literal(":")?;
        }
        Some(())
    }

    /// Optional `h16 *max(":" h16)` before a `::`.
    fn h16_prefix(&mut self, max: usize) {
        self.attempt(|p| {
            p.h16()?;
            for _ in 0..max {
                let more = p.attempt(|q| {
                    q.literal(":")?;
                    q.h16()
                });
                if more.is_none() {
                    break;
                }
            }
            Some(())
        });
    }

    /// `ls32 = (h16 ":" h16) / ipv4-address`
    fn ls32(&mut self) -> Option<()> {
        let pair = self.attempt(|p| {
            p.h16()?;
            p.literal(":")?;
            p.h16()
        });
        if pair.is_some() {
            return pair;
        }
        self.ipv4_address().map(drop)
    }
}

fn bare(name: &str) -> DirectiveNode<'_> {
    DirectiveNode {
        qualifier: None,
        name,
        value: None,
        cidr: None,
    }
}
