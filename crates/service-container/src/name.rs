//! Hierarchical service names

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Dotted, hierarchical service name such as `web.connector.http`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceName(Arc<[String]>);

impl ServiceName {
    /// Build a name from its segments
    pub fn of<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a dotted name; empty segments are dropped
    pub fn parse(name: &str) -> Self {
        Self::of(name.split('.').filter(|segment| !segment.is_empty()))
    }

    /// Name of a child of this service
    pub fn append(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.to_vec();
        segments.push(segment.into());
        Self(segments.into())
    }

    /// Parent name, if this name has more than one segment
    pub fn parent(&self) -> Option<Self> {
        match self.0.len() {
            0 | 1 => None,
            len => Some(Self(self.0[..len - 1].into())),
        }
    }

    /// Last segment
    pub fn simple_name(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    /// Whether `self` is `other` or one of its descendants
    pub fn is_child_of(&self, other: &ServiceName) -> bool {
        self.0.len() > other.0.len() && self.0.starts_with(&other.0)
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl From<&str> for ServiceName {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<String> for ServiceName {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl Serialize for ServiceName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ServiceName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::parse(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_hierarchy() {
        let web = ServiceName::parse("web");
        let http = web.append("connector").append("http");

        assert_eq!(http.to_string(), "web.connector.http");
        assert_eq!(http.simple_name(), "http");
        assert_eq!(http.parent(), Some(ServiceName::of(["web", "connector"])));
        assert!(http.is_child_of(&web));
        assert!(!web.is_child_of(&web));
        assert_eq!(web.parent(), None);
    }

    #[test]
    fn test_name_serialization() {
        let name = ServiceName::parse("db..primary");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"db.primary\"");
        let parsed: ServiceName = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, name);
    }
}
