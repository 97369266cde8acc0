use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

/// A package name, optionally scoped (`@scope/name`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ident {
    scope: Option<String>,
    name: String,
}

impl Ident {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if let Some(rest) = raw.strip_prefix('@') {
            let (scope, name) = rest
                .split_once('/')
                .ok_or_else(|| anyhow!("invalid package name `{raw}`: scoped names need a `/`"))?;
            validate_segment(raw, scope)?;
            validate_segment(raw, name)?;
            Ok(Self {
                scope: Some(scope.to_string()),
                name: name.to_string(),
            })
        } else {
            validate_segment(raw, raw)?;
            Ok(Self {
                scope: None,
                name: raw.to_string(),
            })
        }
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn validate_segment(raw: &str, segment: &str) -> Result<()> {
    if segment.is_empty() {
        bail!("invalid package name `{raw}`: empty segment");
    }
    if segment.contains('/') || segment.chars().any(char::is_whitespace) {
        bail!("invalid package name `{raw}`");
    }
    Ok(())
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "@{scope}/{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl FromStr for Ident {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Ident {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Ident> for String {
    fn from(value: Ident) -> Self {
        value.to_string()
    }
}

/// A dependency request: package identity plus the range it was declared with.
///
/// The range is kept verbatim. Nothing here interprets semver.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Descriptor {
    pub ident: Ident,
    pub range: String,
}

const WORKSPACE_PROTOCOL: &str = "workspace:";

impl Descriptor {
    pub fn new(ident: Ident, range: impl Into<String>) -> Self {
        Self {
            ident,
            range: range.into(),
        }
    }

    /// Protocol prefix of the range (`npm:`, `workspace:`, `git+ssh:`...), if any.
    pub fn protocol(&self) -> Option<&str> {
        let (head, _) = self.range.split_once(':')?;
        let valid = !head.is_empty()
            && head
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        valid.then_some(head)
    }

    pub fn is_workspace_protocol(&self) -> bool {
        self.range.starts_with(WORKSPACE_PROTOCOL)
    }

    /// Whether a workspace with the same ident may satisfy this descriptor.
    pub fn may_bind_workspace(&self) -> bool {
        self.is_workspace_protocol() || self.protocol().is_none()
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.ident, self.range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scoped_and_plain_names() {
        let scoped = Ident::parse("@acme/lib-b").unwrap();
        assert_eq!(scoped.scope(), Some("acme"));
        assert_eq!(scoped.name(), "lib-b");
        assert_eq!(scoped.to_string(), "@acme/lib-b");

        let plain = Ident::parse("left-pad").unwrap();
        assert_eq!(plain.scope(), None);
        assert_eq!(plain.to_string(), "left-pad");
    }

    #[test]
    fn rejects_malformed_names() {
        assert!(Ident::parse("").is_err());
        assert!(Ident::parse("@acme").is_err());
        assert!(Ident::parse("@/lib").is_err());
        assert!(Ident::parse("a/b").is_err());
        assert!(Ident::parse("two words").is_err());
    }

    #[test]
    fn descriptor_protocols_decide_workspace_binding() {
        let ident = Ident::parse("lib-b").unwrap();
        assert!(Descriptor::new(ident.clone(), "workspace:^").may_bind_workspace());
        assert!(Descriptor::new(ident.clone(), "^1.2.0").may_bind_workspace());
        assert!(Descriptor::new(ident.clone(), "*").may_bind_workspace());
        assert!(!Descriptor::new(ident.clone(), "npm:other@1").may_bind_workspace());
        assert!(!Descriptor::new(ident.clone(), "file:../vendor/lib-b").may_bind_workspace());
        assert!(!Descriptor::new(ident, "git+ssh://git@host/repo.git").may_bind_workspace());
    }

    #[test]
    fn comparator_ranges_have_no_protocol() {
        let ident = Ident::parse("lib-b").unwrap();
        assert_eq!(Descriptor::new(ident.clone(), ">=1.0.0 <2").protocol(), None);
        assert_eq!(Descriptor::new(ident, "npm:lib-b@2").protocol(), Some("npm"));
    }
}
