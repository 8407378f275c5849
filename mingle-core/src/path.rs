use alloc::vec::Vec;
use core::fmt;

use crate::Identifier;

/// One step of an [`IdPath`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A field of a struct or symbol map.
    Field(Identifier),
    /// A position in a list.
    Index(usize),
}

/// Locates a value inside its enclosing structure, e.g. `f1.f2[3].f4`.
///
/// Paths are plain values: a clone is a snapshot that later changes to the
/// original never affect.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct IdPath {
    segments: Vec<PathSegment>,
}

impl IdPath {
    /// The empty path, naming the top-level value.
    pub fn root() -> Self {
        Self::default()
    }

    /// `self.field`
    pub fn descend(&self, field: Identifier) -> Self {
        let mut p = self.clone();
        p.push_field(field);
        p
    }

    /// `self[idx]`
    pub fn index(&self, idx: usize) -> Self {
        let mut p = self.clone();
        p.push_index(idx);
        p
    }

    /// The path without its last segment; `None` for the empty path.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    /// `other`'s segments appended after this path's.
    pub fn append(&self, other: &IdPath) -> Self {
        let mut p = self.clone();
        p.segments.extend_from_slice(&other.segments);
        p
    }

    /// Appends a field segment in place.
    pub fn push_field(&mut self, field: Identifier) {
        self.segments.push(PathSegment::Field(field));
    }

    /// Appends an index segment in place.
    pub fn push_index(&mut self, idx: usize) {
        self.segments.push(PathSegment::Index(idx));
    }

    /// The segments, outermost first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The last segment.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// True for the top-level path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }
}

impl FromIterator<PathSegment> for IdPath {
    fn from_iter<T: IntoIterator<Item = PathSegment>>(iter: T) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for IdPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                PathSegment::Field(id) if i == 0 => write!(f, "{id}")?,
                PathSegment::Field(id) => write!(f, ".{id}")?,
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mingle_testhelpers::test;

    #[test]
    fn paths_display_fields_and_indices() {
        let p = IdPath::root()
            .descend(Identifier::new("a")?)
            .descend(Identifier::new("b")?)
            .index(2)
            .descend(Identifier::new("c")?);
        assert_eq!(p.to_string(), "a.b[2].c");
        assert_eq!(IdPath::root().index(0).descend(Identifier::new("x")?).to_string(), "[0].x");
        assert_eq!(IdPath::root().to_string(), "");
    }

    #[test]
    fn parent_and_append() {
        let a = IdPath::root().descend(Identifier::new("a")?);
        let b = IdPath::root().index(4);
        let ab = a.append(&b);
        assert_eq!(ab.to_string(), "a[4]");
        assert_eq!(ab.parent(), Some(a.clone()));
        assert_eq!(a.parent(), Some(IdPath::root()));
        assert_eq!(IdPath::root().parent(), None);
    }

    #[test]
    fn clones_are_snapshots() {
        let mut live = IdPath::root().descend(Identifier::new("a")?);
        let snap = live.clone();
        live.push_index(1);
        assert_eq!(snap.to_string(), "a");
        assert_eq!(live.to_string(), "a[1]");
    }
}
