use std::fmt;

use super::ip::Ip;
use super::macros::{MacroElement, MacroString};

/// Qualifier prefix on a directive (RFC 7208 Section 4.6.2).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Qualifier {
    #[default]
    Pass,     // + (default)
    Fail,     // -
    SoftFail, // ~
    Neutral,  // ?
}

impl Qualifier {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Qualifier::Pass),
            '-' => Some(Qualifier::Fail),
            '~' => Some(Qualifier::SoftFail),
            '?' => Some(Qualifier::Neutral),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Qualifier::Pass => '+',
            Qualifier::Fail => '-',
            Qualifier::SoftFail => '~',
            Qualifier::Neutral => '?',
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Argument of a mechanism or modifier. Absence is `Option::None` at the
/// use site.
#[derive(Debug, Clone, Eq)]
pub enum Value {
    /// A macro string consisting of one literal.
    Text(String),
    MacroString(MacroString),
    Ip(Ip),
}

impl Value {
    /// Wrap a macro string, collapsing a lone literal to [`Value::Text`].
    pub fn from_macro_string(ms: MacroString) -> Self {
        match ms.as_literal() {
            Some(text) => Value::Text(text.to_string()),
            None => Value::MacroString(ms),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            Value::MacroString(ms) => ms.as_literal(),
            Value::Ip(_) => None,
        }
    }

    pub fn as_macro_string(&self) -> Option<&MacroString> {
        match self {
            Value::MacroString(ms) => Some(ms),
            _ => None,
        }
    }

    pub fn as_ip(&self) -> Option<&Ip> {
        match self {
            Value::Ip(ip) => Some(ip),
            _ => None,
        }
    }

    pub(crate) fn is_empty_text(&self) -> bool {
        match self {
            Value::Text(text) => text.is_empty(),
            Value::MacroString(ms) => ms
                .iter()
                .all(|e| matches!(e, MacroElement::Literal(text) if text.is_empty())),
            Value::Ip(_) => false,
        }
    }
}

// A single-literal macro string and plain text are the same value.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Ip(a), Value::Ip(b)) => a == b,
            (Value::MacroString(a), Value::MacroString(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Text(text), Value::MacroString(ms))
            | (Value::MacroString(ms), Value::Text(text)) => ms.as_literal() == Some(text.as_str()),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => f.write_str(text),
            Value::MacroString(ms) => write!(f, "{ms}"),
            Value::Ip(ip) => write!(f, "{ip}"),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<MacroString> for Value {
    fn from(ms: MacroString) -> Self {
        Value::from_macro_string(ms)
    }
}

impl From<Ip> for Value {
    fn from(ip: Ip) -> Self {
        Value::Ip(ip)
    }
}

/// Value of a `1*DIGIT` run, saturating at `u32::MAX`.
pub(crate) fn digit_value(digits: &str) -> u32 {
    digits
        .bytes()
        .filter(u8::is_ascii_digit)
        .fold(0u32, |acc, b| {
            acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spf::macros::{Macro, MacroLetter};

    #[test]
    fn qualifier_chars() {
        for c in ['+', '-', '~', '?'] {
            assert_eq!(Qualifier::from_char(c).unwrap().as_char(), c);
        }
        assert_eq!(Qualifier::from_char('x'), None);
        assert_eq!(Qualifier::default(), Qualifier::Pass);
        assert_eq!(Qualifier::SoftFail.to_string(), "~");
    }

    #[test]
    fn lone_literal_collapses_to_text() {
        let ms = MacroString::new(vec!["example.com".into()]);
        assert_eq!(Value::from(ms), Value::Text("example.com".into()));
    }

    #[test]
    fn collapsed_and_uncollapsed_forms_are_equal() {
        let ms = MacroString::new(vec!["example.com".into()]);
        assert_eq!(Value::MacroString(ms.clone()), Value::from("example.com"));
        assert_eq!(Value::from("example.com"), Value::MacroString(ms));
    }

    #[test]
    fn macro_string_stays_macro_string() {
        let ms = MacroString::new(vec![
            MacroElement::Macro(Macro::new(MacroLetter::Ip)),
            ".example.com".into(),
        ]);
        let value = Value::from(ms.clone());
        assert_eq!(value.as_macro_string(), Some(&ms));
        assert_eq!(value.as_text(), None);
        assert_eq!(value.to_string(), "%{i}.example.com");
    }

    #[test]
    fn ip_and_text_differ() {
        assert_ne!(Value::from(Ip::new("1.2.3.4", None)), Value::from("1.2.3.4"));
    }

    #[test]
    fn digit_value_saturates() {
        assert_eq!(digit_value("0"), 0);
        assert_eq!(digit_value("024"), 24);
        assert_eq!(digit_value("99999999999999"), u32::MAX);
    }
}
