//! Parsed SPF record and its derived views.

use std::fmt;
use std::slice;
use std::str::FromStr;

use super::mechanism::{Mechanism, MechanismName};
use super::modifier::{Modifier, ModifierName};
use super::SpfError;

/// Record version tag. Only `spf1` exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Version {
    #[default]
    Spf1,
}

impl Version {
    pub fn as_str(self) -> &'static str {
        match self {
            Version::Spf1 => "spf1",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One whitespace-separated term of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Mechanism(Mechanism),
    Modifier(Modifier),
}

impl Rule {
    pub fn as_mechanism(&self) -> Option<&Mechanism> {
        match self {
            Rule::Mechanism(m) => Some(m),
            Rule::Modifier(_) => None,
        }
    }

    pub fn as_modifier(&self) -> Option<&Modifier> {
        match self {
            Rule::Modifier(m) => Some(m),
            Rule::Mechanism(_) => None,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Mechanism(m) => write!(f, "{m}"),
            Rule::Modifier(m) => write!(f, "{m}"),
        }
    }
}

impl From<Mechanism> for Rule {
    fn from(m: Mechanism) -> Self {
        Rule::Mechanism(m)
    }
}

impl From<Modifier> for Rule {
    fn from(m: Modifier) -> Self {
        Rule::Modifier(m)
    }
}

/// Positions into `rules`, filled once when the record is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Index {
    mechanisms: Vec<usize>,
    modifiers: Vec<usize>,
    include: Vec<usize>,
    a: Vec<usize>,
    mx: Vec<usize>,
    ptr: Vec<usize>,
    ip4: Vec<usize>,
    ip6: Vec<usize>,
    ips: Vec<usize>,
    exists: Vec<usize>,
    all: Option<usize>,
    redirect: Option<usize>,
    exp: Option<usize>,
}

impl Index {
    fn build(rules: &[Rule]) -> Self {
        let mut index = Index::default();
        for (i, rule) in rules.iter().enumerate() {
            match rule {
                Rule::Mechanism(m) => {
                    index.mechanisms.push(i);
                    match m.name() {
                        // Rightmost wins.
                        MechanismName::All => index.all = Some(i),
                        MechanismName::Include => index.include.push(i),
                        MechanismName::A => index.a.push(i),
                        MechanismName::Mx => index.mx.push(i),
                        MechanismName::Ptr => index.ptr.push(i),
                        MechanismName::Ip4 => index.ip4.push(i),
                        MechanismName::Ip6 => index.ip6.push(i),
                        MechanismName::Exists => index.exists.push(i),
                        MechanismName::Unknown(_) => {}
                    }
                }
                Rule::Modifier(m) => {
                    index.modifiers.push(i);
                    // First wins.
                    match m.name() {
                        ModifierName::Redirect if index.redirect.is_none() => {
                            index.redirect = Some(i)
                        }
                        ModifierName::Exp if index.exp.is_none() => index.exp = Some(i),
                        _ => {}
                    }
                }
            }
        }
        index.ips = index.ip4.iter().chain(&index.ip6).copied().collect();
        index
    }
}

/// A parsed SPF record: version plus ordered rules.
///
/// Rule order is significant and preserved. Grouped views such as
/// [`include`](Record::include) or [`all`](Record::all) are computed at
/// construction and always agree with [`rules`](Record::rules).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    version: Version,
    rules: Vec<Rule>,
    index: Index,
}

impl Record {
    pub fn new(version: Version, rules: Vec<Rule>) -> Self {
        let index = Index::build(&rules);
        Self {
            version,
            rules,
            index,
        }
    }

    /// Parse an SPF TXT record.
    pub fn parse(txt: &str) -> Result<Self, SpfError> {
        super::parse(txt)
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn iter(&self) -> slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn mechanisms(&self) -> Vec<&Mechanism> {
        self.mechanisms_at(&self.index.mechanisms)
    }

    pub fn modifiers(&self) -> Vec<&Modifier> {
        self.index
            .modifiers
            .iter()
            .filter_map(|&i| self.rules[i].as_modifier())
            .collect()
    }

    pub fn include(&self) -> Vec<&Mechanism> {
        self.mechanisms_at(&self.index.include)
    }

    pub fn a(&self) -> Vec<&Mechanism> {
        self.mechanisms_at(&self.index.a)
    }

    pub fn mx(&self) -> Vec<&Mechanism> {
        self.mechanisms_at(&self.index.mx)
    }

    pub fn ptr(&self) -> Vec<&Mechanism> {
        self.mechanisms_at(&self.index.ptr)
    }

    pub fn ip4(&self) -> Vec<&Mechanism> {
        self.mechanisms_at(&self.index.ip4)
    }

    pub fn ip6(&self) -> Vec<&Mechanism> {
        self.mechanisms_at(&self.index.ip6)
    }

    /// All `ip4` mechanisms, then all `ip6` mechanisms, each in rule order.
    pub fn ips(&self) -> Vec<&Mechanism> {
        self.mechanisms_at(&self.index.ips)
    }

    pub fn exists(&self) -> Vec<&Mechanism> {
        self.mechanisms_at(&self.index.exists)
    }

    /// The rightmost `all` mechanism.
    pub fn all(&self) -> Option<&Mechanism> {
        self.index.all.and_then(|i| self.rules[i].as_mechanism())
    }

    /// The first `redirect=` modifier.
    pub fn redirect(&self) -> Option<&Modifier> {
        self.index.redirect.and_then(|i| self.rules[i].as_modifier())
    }

    /// The first `exp=` modifier.
    pub fn exp(&self) -> Option<&Modifier> {
        self.index.exp.and_then(|i| self.rules[i].as_modifier())
    }

    fn mechanisms_at(&self, positions: &[usize]) -> Vec<&Mechanism> {
        positions
            .iter()
            .filter_map(|&i| self.rules[i].as_mechanism())
            .collect()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v={}", self.version)?;
        for rule in &self.rules {
            write!(f, " {rule}")?;
        }
        Ok(())
    }
}

impl FromStr for Record {
    type Err = SpfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Record::parse(s)
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a Rule;
    type IntoIter = slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spf::ip::Ip;
    use crate::spf::types::{Qualifier, Value};

    const TWITTER: &str = "v=spf1 ip4:199.16.156.0/22 ip4:199.59.148.0/22 ip4:8.25.194.0/23 \
        ip4:8.25.196.0/23 ip4:204.92.114.203 ip4:204.92.114.204/31 ip4:107.20.52.15 \
        ip4:23.21.83.90 include:_spf.google.com include:_thirdparty.twitter.com all";

    fn ip4(address: &str, len: Option<u32>) -> Mechanism {
        Mechanism::new(MechanismName::Ip4, Some(Ip::new(address, len).into()))
    }

    #[test]
    fn parses_twitter_record() {
        let record: Record = TWITTER.parse().unwrap();
        assert_eq!(record.version(), Version::Spf1);
        assert_eq!(record.rules().len(), 11);
        assert_eq!(record.ip4().len(), 8);
        assert_eq!(record.ip4()[0], &ip4("199.16.156.0", Some(22)));
        assert_eq!(record.ip4()[4], &ip4("204.92.114.203", None));
        assert_eq!(
            record.include()[1],
            &Mechanism::new(MechanismName::Include, Some("_thirdparty.twitter.com".into()))
        );
        assert_eq!(record.all().map(Mechanism::qualifier), Some(Qualifier::Pass));
        assert_eq!(record.to_string(), TWITTER);
    }

    #[test]
    fn built_record_matches_parsed() {
        let built = Record::new(
            Version::Spf1,
            vec![
                ip4("1.2.3.4", Some(24)).into(),
                Mechanism::new(MechanismName::All, None)
                    .with_qualifier(Some(Qualifier::Fail))
                    .into(),
            ],
        );
        let parsed = Record::parse("v=spf1 ip4:1.2.3.4/24 -all").unwrap();
        assert_eq!(built, parsed);
        assert_eq!(built.to_string(), "v=spf1 ip4:1.2.3.4/24 -all");
    }

    #[test]
    fn rightmost_all_wins() {
        let record = Record::parse("v=spf1 -all a ~all").unwrap();
        assert_eq!(record.all().map(Mechanism::qualifier), Some(Qualifier::SoftFail));
        assert_eq!(record.mechanisms().len(), 3);
    }

    #[test]
    fn first_redirect_and_exp_win() {
        let record =
            Record::parse("v=spf1 redirect=a.example exp=x.example redirect=b.example exp=y.example")
                .unwrap();
        assert_eq!(
            record.redirect().and_then(Modifier::value),
            Some(&Value::from("a.example"))
        );
        assert_eq!(
            record.exp().and_then(Modifier::value),
            Some(&Value::from("x.example"))
        );
        assert_eq!(record.modifiers().len(), 4);
        assert!(record.mechanisms().is_empty());
    }

    #[test]
    fn ips_lists_ip4_before_ip6() {
        let record = Record::parse("v=spf1 ip6:2001:db8::/32 a ip4:10.0.0.0/8 ip6:::1").unwrap();
        let ips: Vec<String> = record.ips().iter().map(|m| m.to_string()).collect();
        assert_eq!(ips, ["ip4:10.0.0.0/8", "ip6:2001:db8::/32", "ip6:::1"]);
        assert_eq!(record.ip6().len(), 2);
        assert_eq!(record.a().len(), 1);
    }

    #[test]
    fn views_by_name() {
        let record = Record::parse(
            "v=spf1 include:a.example mx mx:mail.example ptr exists:%{i}.bl.example a:b.example -all",
        )
        .unwrap();
        assert_eq!(record.include().len(), 1);
        assert_eq!(record.mx().len(), 2);
        assert_eq!(record.ptr().len(), 1);
        assert_eq!(record.exists().len(), 1);
        assert_eq!(record.a().len(), 1);
        assert!(record.redirect().is_none());
        assert!(record.exp().is_none());
    }

    #[test]
    fn iterates_rules_in_order() {
        let record = Record::parse("v=spf1 a mx -all").unwrap();
        let names: Vec<String> = (&record).into_iter().map(|r| r.to_string()).collect();
        assert_eq!(names, ["a", "mx", "-all"]);
        assert_eq!(record.iter().count(), 3);
    }

    #[test]
    fn empty_record_display() {
        let record = Record::new(Version::Spf1, Vec::new());
        assert_eq!(record.to_string(), "v=spf1");
        assert!(record.all().is_none());
    }
}
