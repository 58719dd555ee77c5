//! SPF mechanisms (RFC 7208 Section 5).

use std::fmt;

use super::types::{digit_value, Qualifier, Value};

/// Mechanism name. `Unknown` is never produced by the parser; it exists so
/// callers can build records with names this crate does not know about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MechanismName {
    All,
    Include,
    A,
    Mx,
    Ptr,
    Ip4,
    Ip6,
    Exists,
    Unknown(String),
}

impl MechanismName {
    pub fn parse(name: &str) -> Self {
        match name {
            "all" => MechanismName::All,
            "include" => MechanismName::Include,
            "a" => MechanismName::A,
            "mx" => MechanismName::Mx,
            "ptr" => MechanismName::Ptr,
            "ip4" => MechanismName::Ip4,
            "ip6" => MechanismName::Ip6,
            "exists" => MechanismName::Exists,
            other => MechanismName::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MechanismName::All => "all",
            MechanismName::Include => "include",
            MechanismName::A => "a",
            MechanismName::Mx => "mx",
            MechanismName::Ptr => "ptr",
            MechanismName::Ip4 => "ip4",
            MechanismName::Ip6 => "ip6",
            MechanismName::Exists => "exists",
            MechanismName::Unknown(name) => name,
        }
    }
}

impl fmt::Display for MechanismName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[/ip4-cidr-length][//ip6-cidr-length]` on `a` and `mx`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DualCidrLength {
    ip4: Option<String>,
    ip6: Option<String>,
}

impl DualCidrLength {
    pub fn new(ip4: Option<u32>, ip6: Option<u32>) -> Self {
        Self {
            ip4: ip4.map(|len| len.to_string()),
            ip6: ip6.map(|len| len.to_string()),
        }
    }

    pub(crate) fn from_parts(ip4: Option<&str>, ip6: Option<&str>) -> Self {
        Self {
            ip4: ip4.map(str::to_string),
            ip6: ip6.map(str::to_string),
        }
    }

    pub fn ip4(&self) -> Option<u32> {
        self.ip4.as_deref().map(digit_value)
    }

    pub fn ip6(&self) -> Option<u32> {
        self.ip6.as_deref().map(digit_value)
    }

    pub fn is_empty(&self) -> bool {
        self.ip4.is_none() && self.ip6.is_none()
    }
}

impl fmt::Display for DualCidrLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(len) = &self.ip4 {
            write!(f, "/{len}")?;
        }
        if let Some(len) = &self.ip6 {
            write!(f, "//{len}")?;
        }
        Ok(())
    }
}

/// A directive: optional qualifier, mechanism name and argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mechanism {
    name: MechanismName,
    value: Option<Value>,
    qualifier: Option<Qualifier>,
    cidr: Option<DualCidrLength>,
}

impl Mechanism {
    /// An empty text value is treated as no value.
    pub fn new(name: MechanismName, value: Option<Value>) -> Self {
        Self {
            name,
            value: value.filter(|v| !v.is_empty_text()),
            qualifier: None,
            cidr: None,
        }
    }

    /// Record the qualifier as written. `None` prints nothing and reads as
    /// [`Qualifier::Pass`].
    pub fn with_qualifier(mut self, qualifier: Option<Qualifier>) -> Self {
        self.qualifier = qualifier;
        self
    }

    pub fn with_cidr(mut self, cidr: DualCidrLength) -> Self {
        self.cidr = (!cidr.is_empty()).then_some(cidr);
        self
    }

    pub fn name(&self) -> &MechanismName {
        &self.name
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// The qualifier, defaulting to [`Qualifier::Pass`].
    pub fn qualifier(&self) -> Qualifier {
        self.qualifier.unwrap_or_default()
    }

    /// The qualifier only if one was written.
    pub fn explicit_qualifier(&self) -> Option<Qualifier> {
        self.qualifier
    }

    pub fn cidr(&self) -> Option<&DualCidrLength> {
        self.cidr.as_ref()
    }

    pub fn is_pass(&self) -> bool {
        self.qualifier() == Qualifier::Pass
    }

    pub fn is_fail(&self) -> bool {
        self.qualifier() == Qualifier::Fail
    }

    pub fn is_soft_fail(&self) -> bool {
        self.qualifier() == Qualifier::SoftFail
    }

    pub fn is_neutral(&self) -> bool {
        self.qualifier() == Qualifier::Neutral
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(qualifier) = self.qualifier {
            write!(f, "{qualifier}")?;
        }
        write!(f, "{}", self.name)?;
        if let Some(value) = &self.value {
            write!(f, ":{value}")?;
        }
        if let Some(cidr) = &self.cidr {
            write!(f, "{cidr}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spf::ip::Ip;
    use crate::spf::macros::{MacroElement, MacroString};
    use rstest::rstest;

    #[rstest]
    #[case("all", MechanismName::All)]
    #[case("include", MechanismName::Include)]
    #[case("a", MechanismName::A)]
    #[case("mx", MechanismName::Mx)]
    #[case("ptr", MechanismName::Ptr)]
    #[case("ip4", MechanismName::Ip4)]
    #[case("ip6", MechanismName::Ip6)]
    #[case("exists", MechanismName::Exists)]
    fn known_names(#[case] text: &str, #[case] name: MechanismName) {
        assert_eq!(MechanismName::parse(text), name);
        assert_eq!(name.as_str(), text);
    }

    #[test]
    fn unknown_name_kept_verbatim() {
        let name = MechanismName::parse("custom");
        assert_eq!(name, MechanismName::Unknown("custom".into()));
        assert_eq!(name.to_string(), "custom");
    }

    #[test]
    fn qualifier_defaults_to_pass() {
        let m = Mechanism::new(MechanismName::All, None);
        assert_eq!(m.qualifier(), Qualifier::Pass);
        assert_eq!(m.explicit_qualifier(), None);
        assert!(m.is_pass());
        assert!(!m.is_fail());
    }

    #[rstest]
    #[case(Qualifier::Fail, "-all")]
    #[case(Qualifier::SoftFail, "~all")]
    #[case(Qualifier::Neutral, "?all")]
    #[case(Qualifier::Pass, "+all")]
    fn explicit_qualifier_is_printed(#[case] qualifier: Qualifier, #[case] expected: &str) {
        let m = Mechanism::new(MechanismName::All, None).with_qualifier(Some(qualifier));
        assert_eq!(m.to_string(), expected);
        assert_eq!(m.qualifier(), qualifier);
    }

    #[test]
    fn qualifier_predicates() {
        let m = Mechanism::new(MechanismName::All, None).with_qualifier(Some(Qualifier::SoftFail));
        assert!(m.is_soft_fail());
        assert!(!m.is_neutral());
        let m = Mechanism::new(MechanismName::All, None).with_qualifier(Some(Qualifier::Neutral));
        assert!(m.is_neutral());
    }

    #[test]
    fn empty_text_value_is_absent() {
        let m = Mechanism::new(MechanismName::Ptr, Some(Value::from("")));
        assert_eq!(m.value(), None);
        assert_eq!(m.to_string(), "ptr");
    }

    #[test]
    fn empty_literal_macro_string_is_absent() {
        let ms = MacroString::new(vec![MacroElement::from("")]);
        let m = Mechanism::new(MechanismName::Ptr, Some(Value::MacroString(ms)));
        assert_eq!(m.value(), None);
        assert_eq!(m.to_string(), "ptr");
        assert!(crate::spf::parse(&format!("v=spf1 {m}")).is_ok());
    }

    #[test]
    fn value_is_printed_after_colon() {
        let m = Mechanism::new(MechanismName::Include, Some("_spf.google.com".into()));
        assert_eq!(m.to_string(), "include:_spf.google.com");
    }

    #[test]
    fn ip_value() {
        let m = Mechanism::new(MechanismName::Ip4, Some(Ip::new("199.16.156.0", Some(22)).into()));
        assert_eq!(m.to_string(), "ip4:199.16.156.0/22");
    }

    #[test]
    fn dual_cidr_is_printed_after_value() {
        let m = Mechanism::new(MechanismName::Mx, None).with_cidr(DualCidrLength::new(Some(24), Some(64)));
        assert_eq!(m.to_string(), "mx/24//64");
        assert_eq!(m.cidr().and_then(DualCidrLength::ip4), Some(24));
        assert_eq!(m.cidr().and_then(DualCidrLength::ip6), Some(64));

        let m = Mechanism::new(MechanismName::A, None).with_cidr(DualCidrLength::new(None, Some(0)));
        assert_eq!(m.to_string(), "a//0");
    }

    #[test]
    fn empty_dual_cidr_is_dropped() {
        let m = Mechanism::new(MechanismName::A, None).with_cidr(DualCidrLength::default());
        assert_eq!(m.cidr(), None);
        assert_eq!(m.to_string(), "a");
    }
}
