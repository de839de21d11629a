//! Catalog store: the ordered tutorials plus a cursor.

use crate::error::CatalogError;
use crate::tutorial::{Tutorial, TutorialId};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Ordered tutorials and the index of the active one.
///
/// Never empty: an empty list is replaced by [`Tutorial::fallback`], so
/// `cursor < len()` always holds. The list itself is shared, so cloning a
/// store (as every navigator transition does) copies only the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStore {
    tutorials: Arc<[Tutorial]>,
    cursor: usize,
}

impl CatalogStore {
    /// Build a store positioned on the first tutorial.
    pub fn new(tutorials: Vec<Tutorial>) -> Self {
        let tutorials = if tutorials.is_empty() {
            tracing::warn!("empty tutorial catalog, using the built-in tutorial");
            vec![Tutorial::fallback()]
        } else {
            tutorials
        };
        Self {
            tutorials: tutorials.into(),
            cursor: 0,
        }
    }

    /// A store holding only the built-in tutorial.
    pub fn fallback() -> Self {
        Self::new(vec![Tutorial::fallback()])
    }

    /// Like [`CatalogStore::new`], but rejects repeated ids.
    pub fn try_new(tutorials: Vec<Tutorial>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for tutorial in &tutorials {
            if !seen.insert(tutorial.id) {
                return Err(CatalogError::DuplicateId(tutorial.id));
            }
        }
        Ok(Self::new(tutorials))
    }

    pub fn len(&self) -> usize {
        self.tutorials.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.tutorials.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> &Tutorial {
        &self.tutorials[self.cursor]
    }

    pub fn get(&self, index: usize) -> Option<&Tutorial> {
        self.tutorials.get(index)
    }

    pub fn position_of(&self, id: TutorialId) -> Option<usize> {
        self.tutorials.iter().position(|t| t.id == id)
    }

    pub fn find(&self, id: TutorialId) -> Option<&Tutorial> {
        self.position_of(id).map(|i| &self.tutorials[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tutorial> {
        self.tutorials.iter()
    }

    pub fn tutorials(&self) -> &[Tutorial] {
        &self.tutorials
    }

    /// Move the cursor. Returns false (and leaves the cursor alone) when
    /// `index` is out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.tutorials.len() {
            self.cursor = index;
            true
        } else {
            false
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            position: self.cursor + 1,
            total: self.tutorials.len(),
        }
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::fallback()
    }
}

impl<'a> IntoIterator for &'a CatalogStore {
    type Item = &'a Tutorial;
    type IntoIter = std::slice::Iter<'a, Tutorial>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One-based position of the active tutorial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub position: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_last(&self) -> bool {
        self.position == self.total
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.position, self.total)
    }
}
