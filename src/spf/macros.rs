//! SPF macro syntax (RFC 7208 Section 7).
//!
//! Only the shape of a macro is modelled here. Expanding a macro against a
//! sender and client IP is evaluation work and happens elsewhere.

use std::fmt;
use std::ops::Index;
use std::slice::{self, SliceIndex};

use super::types::digit_value;

/// Macro letter (RFC 7208 Section 7.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroLetter {
    /// `s`: sender address.
    Sender,
    /// `l`: local-part of the sender.
    LocalPart,
    /// `o`: domain of the sender.
    SenderDomain,
    /// `d`: domain being checked.
    Domain,
    /// `i`: client IP.
    Ip,
    /// `p`: validated domain name of the client IP.
    ValidatedDomain,
    /// `v`: `in-addr` or `ip6`.
    IpVersion,
    /// `h`: HELO/EHLO domain.
    Helo,
    /// `c`: SMTP client IP, readable form (explanation only).
    ClientIp,
    /// `r`: receiving host (explanation only).
    Receiver,
    /// `t`: current timestamp (explanation only).
    Timestamp,
}

impl MacroLetter {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            's' => Some(MacroLetter::Sender),
            'l' => Some(MacroLetter::LocalPart),
            'o' => Some(MacroLetter::SenderDomain),
            'd' => Some(MacroLetter::Domain),
            'i' => Some(MacroLetter::Ip),
            'p' => Some(MacroLetter::ValidatedDomain),
            'v' => Some(MacroLetter::IpVersion),
            'h' => Some(MacroLetter::Helo),
            'c' => Some(MacroLetter::ClientIp),
            'r' => Some(MacroLetter::Receiver),
            't' => Some(MacroLetter::Timestamp),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            MacroLetter::Sender => 's',
            MacroLetter::LocalPart => 'l',
            MacroLetter::SenderDomain => 'o',
            MacroLetter::Domain => 'd',
            MacroLetter::Ip => 'i',
            MacroLetter::ValidatedDomain => 'p',
            MacroLetter::IpVersion => 'v',
            MacroLetter::Helo => 'h',
            MacroLetter::ClientIp => 'c',
            MacroLetter::Receiver => 'r',
            MacroLetter::Timestamp => 't',
        }
    }

    /// `c`, `r` and `t` may only appear in an `exp=` explanation string.
    pub fn is_explanation_only(self) -> bool {
        matches!(
            self,
            MacroLetter::ClientIp | MacroLetter::Receiver | MacroLetter::Timestamp
        )
    }
}

impl fmt::Display for MacroLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A `%{...}` macro: letter, transformers and delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Macro {
    letter: MacroLetter,
    digits: Option<String>,
    reverse: bool,
    delimiters: Vec<char>,
}

impl Macro {
    pub fn new(letter: MacroLetter) -> Self {
        Self {
            letter,
            digits: None,
            reverse: false,
            delimiters: Vec::new(),
        }
    }

    /// Keep only the rightmost `count` labels.
    pub fn with_digits(self, count: u32) -> Self {
        self.with_digit_text(count.to_string())
    }

    pub(crate) fn with_digit_text(mut self, digits: impl Into<String>) -> Self {
        self.digits = Some(digits.into());
        self
    }

    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn with_delimiters(mut self, delimiters: impl IntoIterator<Item = char>) -> Self {
        self.delimiters = delimiters.into_iter().collect();
        self
    }

    pub fn letter(&self) -> MacroLetter {
        self.letter
    }

    /// Repeat count as written, e.g. `"2"` for `%{d2}`.
    pub fn digits(&self) -> Option<&str> {
        self.digits.as_deref()
    }

    /// Numeric value of [`digits`](Self::digits), saturating at `u32::MAX`.
    pub fn repeat_count(&self) -> Option<u32> {
        self.digits.as_deref().map(digit_value)
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    /// Delimiters as written; empty when none were given.
    pub fn delimiters(&self) -> &[char] {
        &self.delimiters
    }

    /// Delimiters used for splitting: `.` when none were given.
    pub fn effective_delimiters(&self) -> &[char] {
        if self.delimiters.is_empty() {
            &['.']
        } else {
            &self.delimiters
        }
    }
}

impl fmt::Display for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{{{}", self.letter)?;
        if let Some(digits) = &self.digits {
            f.write_str(digits)?;
        }
        if self.reverse {
            f.write_str("r")?;
        }
        for delimiter in &self.delimiters {
            write!(f, "{delimiter}")?;
        }
        f.write_str("}")
    }
}

/// Two-character escapes that stand for literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Escape {
    /// `%%`
    Percent,
    /// `%_`
    Space,
    /// `%-`
    UrlSpace,
}

impl Escape {
    /// Text the escape expands to.
    pub fn expansion(self) -> &'static str {
        match self {
            Escape::Percent => "%",
            Escape::Space => " ",
            Escape::UrlSpace => "%20",
        }
    }

    /// The escape as written.
    pub fn as_str(self) -> &'static str {
        match self {
            Escape::Percent => "%%",
            Escape::Space => "%_",
            Escape::UrlSpace => "%-",
        }
    }
}

impl fmt::Display for Escape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MacroElement {
    Literal(String),
    Macro(Macro),
    Escape(Escape),
}

impl fmt::Display for MacroElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroElement::Literal(text) => f.write_str(text),
            MacroElement::Macro(m) => write!(f, "{m}"),
            MacroElement::Escape(e) => write!(f, "{e}"),
        }
    }
}

impl From<Macro> for MacroElement {
    fn from(m: Macro) -> Self {
        MacroElement::Macro(m)
    }
}

impl From<&str> for MacroElement {
    fn from(text: &str) -> Self {
        MacroElement::Literal(text.to_string())
    }
}

/// Ordered literals, macros and escapes making up a `domain-spec` or
/// modifier value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MacroString {
    elements: Vec<MacroElement>,
}

impl MacroString {
    pub fn new(elements: Vec<MacroElement>) -> Self {
        Self { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MacroElement> {
        self.elements.get(index)
    }

    pub fn iter(&self) -> slice::Iter<'_, MacroElement> {
        self.elements.iter()
    }

    pub fn as_slice(&self) -> &[MacroElement] {
        &self.elements
    }

    /// The text of a macro string made of exactly one literal.
    pub fn as_literal(&self) -> Option<&str> {
        match self.elements.as_slice() {
            [MacroElement::Literal(text)] => Some(text),
            _ => None,
        }
    }

    /// Whether any element needs expansion (macros or escapes).
    pub fn has_macros(&self) -> bool {
        self.elements
            .iter()
            .any(|e| !matches!(e, MacroElement::Literal(_)))
    }

    pub fn macros(&self) -> impl Iterator<Item = &Macro> {
        self.elements.iter().filter_map(|e| match e {
            MacroElement::Macro(m) => Some(m),
            _ => None,
        })
    }
}

impl<I: SliceIndex<[MacroElement]>> Index<I> for MacroString {
    type Output = I::Output;

    fn index(&self, index: I) -> &Self::Output {
        &self.elements[index]
    }
}

impl<'a> IntoIterator for &'a MacroString {
    type Item = &'a MacroElement;
    type IntoIter = slice::Iter<'a, MacroElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl FromIterator<MacroElement> for MacroString {
    fn from_iter<T: IntoIterator<Item = MacroElement>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Display for MacroString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in &self.elements {
            write!(f, "{element}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macro_defaults() {
        let m = Macro::new(MacroLetter::Domain);
        assert_eq!(m.digits(), None);
        assert_eq!(m.repeat_count(), None);
        assert!(!m.is_reverse());
        assert!(m.delimiters().is_empty());
        assert_eq!(m.effective_delimiters(), &['.']);
        assert_eq!(m.to_string(), "%{d}");
    }

    #[test]
    fn macro_display_keeps_reverse_flag() {
        let m = Macro::new(MacroLetter::Ip).reversed();
        assert_eq!(m.to_string(), "%{ir}");
    }

    #[test]
    fn macro_display_full_transformers() {
        let m = Macro::new(MacroLetter::Domain)
            .with_digits(2)
            .reversed()
            .with_delimiters(['.', '-']);
        assert_eq!(m.to_string(), "%{d2r.-}");
        assert_eq!(m.repeat_count(), Some(2));
        assert_eq!(m.effective_delimiters(), &['.', '-']);
    }

    #[test]
    fn digits_keep_written_form() {
        let m = Macro::new(MacroLetter::Domain).with_digit_text("007");
        assert_eq!(m.digits(), Some("007"));
        assert_eq!(m.repeat_count(), Some(7));
        assert_eq!(m.to_string(), "%{d007}");
    }

    #[test]
    fn letter_round_trip() {
        for c in "slodiphcrtv".chars() {
            let letter = MacroLetter::from_char(c).unwrap();
            assert_eq!(letter.as_char(), c);
        }
        assert_eq!(MacroLetter::from_char('x'), None);
        assert_eq!(MacroLetter::from_char('S'), None);
    }

    #[test]
    fn explanation_only_letters() {
        assert!(MacroLetter::Timestamp.is_explanation_only());
        assert!(MacroLetter::Receiver.is_explanation_only());
        assert!(!MacroLetter::Domain.is_explanation_only());
    }

    #[test]
    fn macro_string_indexing_and_slicing() {
        let ms = MacroString::new(vec![
            "explain.".into(),
            Macro::new(MacroLetter::Domain).into(),
            MacroElement::Escape(Escape::Percent),
        ]);
        assert_eq!(ms.len(), 3);
        assert_eq!(ms[0], MacroElement::Literal("explain.".into()));
        assert_eq!(ms[1..].len(), 2);
        assert_eq!(ms.get(3), None);
        assert_eq!(ms.macros().count(), 1);
        assert!(ms.has_macros());
        assert_eq!(ms.to_string(), "explain.%{d}%%");
    }

    #[test]
    fn single_literal_is_detected() {
        let ms: MacroString = [MacroElement::from("example.com")].into_iter().collect();
        assert_eq!(ms.as_literal(), Some("example.com"));
        assert!(!ms.has_macros());
        assert_eq!(MacroString::default().as_literal(), None);
    }

    #[test]
    fn escape_expansions() {
        assert_eq!(Escape::Percent.expansion(), "%");
        assert_eq!(Escape::Space.expansion(), " ");
        assert_eq!(Escape::UrlSpace.expansion(), "%20");
        assert_eq!(Escape::UrlSpace.to_string(), "%-");
    }
}
