//! Revisions, qualified names and schema node identifiers.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::parser::is_identifier;

/// A `YYYY-MM-DD` revision date.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Revision {
    year: u16,
    month: u8,
    day: u8,
}

impl Revision {
    pub fn new(year: u16, month: u8, day: u8) -> Option<Self> {
        ((1..=12).contains(&month) && (1..=31).contains(&day)).then_some(Self { year, month, day })
    }
}

impl FromStr for Revision {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid revision date '{text}', expected YYYY-MM-DD");
        let bytes = text.as_bytes();
        if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
            return Err(invalid());
        }
        let year = text[0..4].parse::<u16>().map_err(|_| invalid())?;
        let month = text[5..7].parse::<u8>().map_err(|_| invalid())?;
        let day = text[8..10].parse::<u8>().map_err(|_| invalid())?;
        Revision::new(year, month, day).ok_or_else(invalid)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl fmt::Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Revision({self})")
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Revision {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The namespace half of a qualified name: module namespace URI plus
/// the module revision.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct QNameModule {
    pub namespace: Arc<str>,
    pub revision: Option<Revision>,
}

impl QNameModule {
    pub fn new(namespace: impl Into<Arc<str>>, revision: Option<Revision>) -> Self {
        Self {
            namespace: namespace.into(),
            revision,
        }
    }
}

impl fmt::Debug for QNameModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.revision {
            Some(rev) => write!(f, "{}@{}", self.namespace, rev),
            None => write!(f, "{}", self.namespace),
        }
    }
}

/// A (namespace, local-name) pair identifying schema nodes and
/// definitions across module boundaries.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct QName {
    pub module: QNameModule,
    pub local: SmolStr,
}

impl QName {
    pub fn new(module: QNameModule, local: impl Into<SmolStr>) -> Self {
        Self {
            module,
            local: local.into(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}){}", self.module, self.local)
    }
}

impl fmt::Debug for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// An identifier reference as written: `prefix:name` or `name`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PrefixedName {
    pub prefix: Option<SmolStr>,
    pub name: SmolStr,
}

impl PrefixedName {
    pub fn parse(text: &str) -> Result<Self, String> {
        let (prefix, name) = match text.split_once(':') {
            Some((prefix, name)) => (Some(prefix), name),
            None => (None, text),
        };
        if prefix.is_some_and(|p| !is_identifier(p)) || !is_identifier(name) {
            return Err(format!("'{text}' is not a valid identifier reference"));
        }
        Ok(Self {
            prefix: prefix.map(SmolStr::new),
            name: SmolStr::new(name),
        })
    }
}

impl fmt::Display for PrefixedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{prefix}:{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl fmt::Debug for PrefixedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// An absolute (`/a:b/a:c`) or descendant (`b/c`) schema node identifier.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct SchemaNodeId {
    pub absolute: bool,
    pub steps: Vec<PrefixedName>,
}

impl SchemaNodeId {
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.trim();
        let (absolute, body) = match text.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        if body.is_empty() {
            return Err(format!("'{text}' is not a valid schema node identifier"));
        }
        let steps = body
            .split('/')
            .map(|step| PrefixedName::parse(step.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { absolute, steps })
    }
}

impl fmt::Display for SchemaNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if self.absolute || i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revision_parse_and_order() {
        let older: Revision = "2019-12-31".parse().unwrap();
        let newer: Revision = "2020-01-01".parse().unwrap();
        assert!(older < newer);
        assert_eq!(newer.to_string(), "2020-01-01");
        assert!("2020-13-01".parse::<Revision>().is_err());
        assert!("2020/01/01".parse::<Revision>().is_err());
    }

    #[test]
    fn test_prefixed_name() {
        let name = PrefixedName::parse("foo:bar").unwrap();
        assert_eq!(name.prefix.as_deref(), Some("foo"));
        assert_eq!(name.name, "bar");
        assert!(PrefixedName::parse("foo:").is_err());
        assert!(PrefixedName::parse("9x").is_err());
    }

    #[test]
    fn test_schema_node_id() {
        let path = SchemaNodeId::parse("/foo:top/foo:x").unwrap();
        assert!(path.absolute);
        assert_eq!(path.steps.len(), 2);
        assert_eq!(path.to_string(), "/foo:top/foo:x");

        let relative = SchemaNodeId::parse("a/b").unwrap();
        assert!(!relative.absolute);
        assert_eq!(relative.to_string(), "a/b");
        assert!(SchemaNodeId::parse("/").is_err());
    }

    #[test]
    fn test_qname_display() {
        let module = QNameModule::new("urn:foo", "2020-01-01".parse().ok());
        assert_eq!(QName::new(module, "top").to_string(), "(urn:foo@2020-01-01)top");
    }
}
