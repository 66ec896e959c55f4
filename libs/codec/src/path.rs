//! Value paths for run-time failures
//!
//! Paths are built while an error propagates outward: the innermost routine
//! raises the error with an empty path and every enclosing routine prepends
//! its own segment. The happy path never allocates a path.

use std::fmt;

/// One step from a container to the value inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Record field or tuple item (`Item1`, `Item2`, …)
    Field(String),
    /// Sequence element
    Index(usize),
    /// Key of the n-th mapping entry
    MapKey(usize),
    /// Value of the n-th mapping entry
    MapValue(usize),
    /// Alternative held by a union, by canonical tag
    Alternative(String),
}

impl PathSegment {
    pub fn field(name: impl Into<String>) -> Self {
        PathSegment::Field(name.into())
    }
}

/// Location of a value relative to the root of a (de)serialise call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    // innermost segment first
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Prepend the segment that leads from the enclosing container to the
    /// current path
    pub fn push_outer(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    /// Segments from the root outward-in
    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter().rev()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in self.segments() {
            match segment {
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(i) => write!(f, "[{i}]")?,
                PathSegment::MapKey(i) => write!(f, "[{i}].key")?,
                PathSegment::MapValue(i) => write!(f, "[{i}].value")?,
                PathSegment::Alternative(tag) => write!(f, "<{tag}>")?,
            }
        }
        Ok(())
    }
}
