//! Partitions and fully-qualified resource keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::ResourceId;

/// A pack partition: client assets or server data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Client-consumed assets, persisted under `assets/`.
    Client,
    /// Server-consumed data, persisted under `data/`.
    Server,
}

impl Side {
    /// Both sides in partition order.
    pub const ALL: [Side; 2] = [Side::Client, Side::Server];

    /// Top-level directory for this side in a persisted pack.
    pub fn directory(self) -> &'static str {
        match self {
            Side::Client => "assets",
            Side::Server => "data",
        }
    }

    /// Inverse of [`Side::directory`].
    pub fn from_directory(name: &str) -> Option<Side> {
        match name {
            "assets" => Some(Side::Client),
            "data" => Some(Side::Server),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Client => f.write_str("client"),
            Side::Server => f.write_str("server"),
        }
    }
}

/// One of the three storage buckets of a pack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Client,
    Server,
    Root,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Root, Bucket::Client, Bucket::Server];

    /// The partition this bucket belongs to, or `None` for the root bucket.
    pub fn side(self) -> Option<Side> {
        match self {
            Bucket::Client => Some(Side::Client),
            Bucket::Server => Some(Side::Server),
            Bucket::Root => None,
        }
    }
}

impl From<Side> for Bucket {
    fn from(side: Side) -> Self {
        match side {
            Side::Client => Bucket::Client,
            Side::Server => Bucket::Server,
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::Client => f.write_str("client"),
            Bucket::Server => f.write_str("server"),
            Bucket::Root => f.write_str("root"),
        }
    }
}

/// Ordered path segments naming a top-level file outside both partitions.
///
/// Segments must be non-empty, must not contain `/` or `\`, and must not be
/// `.` or `..`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct RootPath {
    segments: Vec<String>,
}

impl RootPath {
    pub fn new<I, S>(segments: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(TypeError::InvalidRootPath("no path segments".into()));
        }
        for segment in &segments {
            if segment.is_empty() {
                return Err(TypeError::InvalidRootPath("empty path segment".into()));
            }
            if segment == "." || segment == ".." {
                return Err(TypeError::InvalidRootPath(format!(
                    "segment must not be {segment:?}"
                )));
            }
            if segment.contains(['/', '\\']) {
                return Err(TypeError::InvalidRootPath(format!(
                    "segment contains a path separator: {segment:?}"
                )));
            }
        }
        Ok(Self { segments })
    }

    /// Split a `/`-joined relative path into a root path.
    pub fn parse(joined: &str) -> Result<Self, TypeError> {
        Self::new(joined.split('/'))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Segments joined with `/`.
    pub fn joined(&self) -> String {
        self.segments.join("/")
    }
}

impl fmt::Debug for RootPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RootPath({})", self.joined())
    }
}

impl fmt::Display for RootPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl TryFrom<Vec<String>> for RootPath {
    type Error = TypeError;

    fn try_from(segments: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(segments)
    }
}

impl From<RootPath> for Vec<String> {
    fn from(path: RootPath) -> Self {
        path.segments
    }
}

/// A fully-qualified key into one of the pack's buckets.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKey {
    /// A client or server resource.
    Sided { side: Side, id: ResourceId },
    /// A top-level file.
    Root(RootPath),
}

impl ResourceKey {
    pub fn sided(side: Side, id: ResourceId) -> Self {
        Self::Sided { side, id }
    }

    pub fn client(id: ResourceId) -> Self {
        Self::Sided { side: Side::Client, id }
    }

    pub fn server(id: ResourceId) -> Self {
        Self::Sided { side: Side::Server, id }
    }

    pub fn root(path: RootPath) -> Self {
        Self::Root(path)
    }

    pub fn bucket(&self) -> Bucket {
        match self {
            ResourceKey::Sided { side, .. } => Bucket::from(*side),
            ResourceKey::Root(_) => Bucket::Root,
        }
    }

    /// Relative path of this key inside a persisted pack, `/`-separated.
    ///
    /// ```
    /// use rrp_types::{ResourceId, ResourceKey, RootPath};
    ///
    /// let key = ResourceKey::client(ResourceId::new("demo", "sprite").unwrap());
    /// assert_eq!(key.relative_path(), "assets/demo/sprite");
    /// let key = ResourceKey::root(RootPath::parse("pack.png").unwrap());
    /// assert_eq!(key.relative_path(), "pack.png");
    /// ```
    pub fn relative_path(&self) -> String {
        match self {
            ResourceKey::Sided { side, id } => {
                format!("{}/{}/{}", side.directory(), id.namespace(), id.path())
            }
            ResourceKey::Root(path) => path.joined(),
        }
    }

    pub fn id(&self) -> Option<&ResourceId> {
        match self {
            ResourceKey::Sided { id, .. } => Some(id),
            ResourceKey::Root(_) => None,
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKey::Sided { side, id } => write!(f, "{side}:{id}"),
            ResourceKey::Root(path) => write!(f, "root:{path}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_directories() {
        assert_eq!(Side::Client.directory(), "assets");
        assert_eq!(Side::Server.directory(), "data");
        assert_eq!(Side::from_directory("assets"), Some(Side::Client));
        assert_eq!(Side::from_directory("data"), Some(Side::Server));
        assert_eq!(Side::from_directory("pack.mcmeta"), None);
    }

    #[test]
    fn bucket_of_key() {
        let id = ResourceId::new("demo", "x").unwrap();
        assert_eq!(ResourceKey::client(id.clone()).bucket(), Bucket::Client);
        assert_eq!(ResourceKey::server(id).bucket(), Bucket::Server);
        let root = ResourceKey::root(RootPath::parse("pack.mcmeta").unwrap());
        assert_eq!(root.bucket(), Bucket::Root);
        assert_eq!(Bucket::Root.side(), None);
    }

    #[test]
    fn root_path_validation() {
        assert!(RootPath::new(Vec::<String>::new()).is_err());
        assert!(RootPath::new(["a", ""]).is_err());
        assert!(RootPath::new([".."]).is_err());
        assert!(RootPath::new(["a/b"]).is_err());
        let path = RootPath::new(["META-INF", "Notes.TXT"]).unwrap();
        assert_eq!(path.joined(), "META-INF/Notes.TXT");
    }

    #[test]
    fn relative_paths() {
        let id = ResourceId::new("demo", "loot/table.json").unwrap();
        assert_eq!(
            ResourceKey::server(id).relative_path(),
            "data/demo/loot/table.json"
        );
    }

    #[test]
    fn display_includes_bucket() {
        let id = ResourceId::new("demo", "sprite").unwrap();
        assert_eq!(ResourceKey::client(id).to_string(), "client:demo:sprite");
        let root = ResourceKey::root(RootPath::parse("pack.png").unwrap());
        assert_eq!(root.to_string(), "root:pack.png");
    }
}
