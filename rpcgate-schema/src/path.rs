//! Locations inside the value being validated.
use std::fmt;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Path from the root of a validated value to one of its descendants.
///
/// Renders two ways: as a JSON pointer (`/items/0/name`) via [`fmt::Display`] and serialization,
/// and as a caller-facing field path (`items[0].name`) via [`DataPath::to_field_path`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DataPath(Vec<PathSegment>);

impl DataPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// A new path one object key deeper than this one
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    /// A new path one array element deeper than this one
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// Object keys joined with `.`, array indices in brackets.  The root path is the empty
    /// string.
    pub fn to_field_path(&self) -> String {
        let mut field_path = String::new();
        for segment in &self.0 {
            match segment {
                PathSegment::Key(key) => {
                    if !field_path.is_empty() {
                        field_path.push('.');
                    }
                    field_path.push_str(key);
                }
                PathSegment::Index(index) => {
                    field_path.push('[');
                    field_path.push_str(&index.to_string());
                    field_path.push(']');
                }
            }
        }

        field_path
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            match segment {
                PathSegment::Key(key) => write!(f, "/{}", key.replace('~', "~0").replace('/', "~1"))?,
                PathSegment::Index(index) => write!(f, "/{index}")?,
            }
        }
        Ok(())
    }
}

impl Serialize for DataPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
