//! Namespaced resource identifiers.
//!
//! Valid identifiers:
//! - Namespace is non-empty and uses only `[a-z0-9_.-]`
//! - Path is non-empty and uses only `[a-z0-9_.-/]`
//! - Path components between slashes must be non-empty and must not be `.` or `..`
//!
//! The component rules keep every identifier mappable onto a relative file
//! path under `assets/<namespace>/` or `data/<namespace>/`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Namespace used when parsing an identifier without a `namespace:` prefix.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// A `(namespace, path)` pair identifying one client or server resource.
///
/// Ordering is namespace first, then path, so sorted listings group by
/// namespace.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId {
    namespace: String,
    path: String,
}

impl ResourceId {
    /// Create a validated identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use rrp_types::ResourceId;
    ///
    /// let id = ResourceId::new("demo", "textures/block/stone.png").unwrap();
    /// assert_eq!(id.to_string(), "demo:textures/block/stone.png");
    /// assert!(ResourceId::new("Demo", "x").is_err());
    /// assert!(ResourceId::new("demo", "../escape").is_err());
    /// ```
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Result<Self, TypeError> {
        let namespace = namespace.into();
        let path = path.into();
        validate_namespace(&namespace)?;
        validate_path(&path)?;
        Ok(Self { namespace, path })
    }

    /// Parse `namespace:path`, falling back to [`DEFAULT_NAMESPACE`] when the
    /// separator is absent. More than one separator is malformed.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        match s.split_once(':') {
            Some((_, path)) if path.contains(':') => Err(TypeError::MalformedId(s.to_string())),
            Some((namespace, path)) => Self::new(namespace, path),
            None => Self::new(DEFAULT_NAMESPACE, s),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns a copy with `suffix` appended to the path (e.g. `".json"`).
    pub fn with_suffix(&self, suffix: &str) -> Result<Self, TypeError> {
        Self::new(self.namespace.clone(), format!("{}{suffix}", self.path))
    }

    /// Returns a copy with `prefix` prepended to the path (e.g. `"models/"`).
    pub fn with_prefix(&self, prefix: &str) -> Result<Self, TypeError> {
        Self::new(self.namespace.clone(), format!("{prefix}{}", self.path))
    }
}

fn is_namespace_char(ch: char) -> bool {
    matches!(ch, 'a'..='z' | '0'..='9' | '_' | '.' | '-')
}

fn is_path_char(ch: char) -> bool {
    is_namespace_char(ch) || ch == '/'
}

/// Validate a namespace, returning `Ok(())` if valid.
pub fn validate_namespace(namespace: &str) -> Result<(), TypeError> {
    if namespace.is_empty() {
        return Err(TypeError::InvalidNamespace {
            namespace: namespace.to_string(),
            reason: "namespace must not be empty".into(),
        });
    }
    if let Some(ch) = namespace.chars().find(|c| !is_namespace_char(*c)) {
        return Err(TypeError::InvalidNamespace {
            namespace: namespace.to_string(),
            reason: format!("contains forbidden character: {ch:?}"),
        });
    }
    if namespace == "." || namespace == ".." {
        return Err(TypeError::InvalidNamespace {
            namespace: namespace.to_string(),
            reason: "must not be a relative directory name".into(),
        });
    }
    Ok(())
}

/// Validate a resource path, returning `Ok(())` if valid.
pub fn validate_path(path: &str) -> Result<(), TypeError> {
    if path.is_empty() {
        return Err(TypeError::InvalidPath {
            path: path.to_string(),
            reason: "path must not be empty".into(),
        });
    }
    if let Some(ch) = path.chars().find(|c| !is_path_char(*c)) {
        return Err(TypeError::InvalidPath {
            path: path.to_string(),
            reason: format!("contains forbidden character: {ch:?}"),
        });
    }
    for component in path.split('/') {
        if component.is_empty() {
            return Err(TypeError::InvalidPath {
                path: path.to_string(),
                reason: "path components must not be empty".into(),
            });
        }
        if component == "." || component == ".." {
            return Err(TypeError::InvalidPath {
                path: path.to_string(),
                reason: format!("component must not be {component:?}"),
            });
        }
    }
    Ok(())
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({}:{})", self.namespace, self.path)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for ResourceId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourceId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.to_string()
    }
}
