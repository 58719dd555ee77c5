//! SPF modifiers (RFC 7208 Section 6).

use std::fmt;

use super::types::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModifierName {
    /// `redirect=`
    Redirect,
    /// `exp=`
    Exp,
    /// Any other `name=`; kept for forward compatibility.
    Unknown(String),
}

impl ModifierName {
    pub fn parse(name: &str) -> Self {
        match name {
            "redirect" => ModifierName::Redirect,
            "exp" => ModifierName::Exp,
            other => ModifierName::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ModifierName::Redirect => "redirect",
            ModifierName::Exp => "exp",
            ModifierName::Unknown(name) => name,
        }
    }
}

impl fmt::Display for ModifierName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier {
    name: ModifierName,
    value: Option<Value>,
}

impl Modifier {
    /// An empty text value is treated as no value.
    pub fn new(name: ModifierName, value: Option<Value>) -> Self {
        Self {
            name,
            value: value.filter(|v| !v.is_empty_text()),
        }
    }

    pub fn name(&self) -> &ModifierName {
        &self.name
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.name, ModifierName::Unknown(_))
    }
}

// `name=` is written even without a value: a bare name is not a term.
impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=", self.name)?;
        if let Some(value) = &self.value {
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spf::macros::{MacroElement, MacroString};

    #[test]
    fn names() {
        assert_eq!(ModifierName::parse("redirect"), ModifierName::Redirect);
        assert_eq!(ModifierName::parse("exp"), ModifierName::Exp);
        assert_eq!(
            ModifierName::parse("x-custom"),
            ModifierName::Unknown("x-custom".into())
        );
    }

    #[test]
    fn redirect_display() {
        let m = Modifier::new(ModifierName::Redirect, Some("_spf.example.com".into()));
        assert_eq!(m.to_string(), "redirect=_spf.example.com");
        assert!(!m.is_unknown());
    }

    #[test]
    fn unknown_without_value_keeps_equals_sign() {
        let m = Modifier::new(ModifierName::parse("foo"), None);
        assert_eq!(m.to_string(), "foo=");
        assert!(m.is_unknown());
    }

    #[test]
    fn empty_literal_macro_string_is_absent() {
        let ms = MacroString::new(vec![MacroElement::from(""), MacroElement::from("")]);
        let m = Modifier::new(ModifierName::Exp, Some(Value::MacroString(ms)));
        assert_eq!(m.value(), None);
        assert_eq!(m.to_string(), "exp=");
    }

    #[test]
    fn empty_value_is_absent() {
        let m = Modifier::new(ModifierName::parse("foo"), Some("".into()));
        assert_eq!(m.value(), None);
    }
}
