//! Query filters
//!
//! A query is a list of filters; an item matches the query when it matches
//! any filter. Within one filter every present constraint must hold.

use crate::item::ContentItem;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// One filter clause
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Filter {
    /// Exact id match
    pub ids: Option<Vec<String>>,
    /// Author match
    pub authors: Option<Vec<String>>,
    /// Kind match
    pub kinds: Option<Vec<u32>>,
    /// Tag-indexed constraints, e.g. `'e' -> [id]` for "items referencing id"
    pub tags: BTreeMap<char, Vec<String>>,
    /// Maximum number of results
    pub limit: Option<usize>,
}

impl Filter {
    /// Create unconstrained filter
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain by ids
    #[must_use]
    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Constrain by authors
    #[must_use]
    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = Some(authors.into_iter().map(Into::into).collect());
        self
    }

    /// Constrain by kinds
    #[must_use]
    pub fn kinds(mut self, kinds: impl IntoIterator<Item = u32>) -> Self {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    /// Constrain by single-letter tag values
    #[must_use]
    pub fn tag<I, S>(mut self, letter: char, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags
            .insert(letter, values.into_iter().map(Into::into).collect());
        self
    }

    /// Items referencing `id` through an `e` tag
    #[inline]
    #[must_use]
    pub fn referencing(self, id: impl Into<String>) -> Self {
        self.tag('e', [id.into()])
    }

    /// Cap result count
    #[inline]
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check whether an item satisfies every constraint of this filter
    #[must_use]
    pub fn matches(&self, item: &ContentItem) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.iter().any(|id| *id == item.id) {
                return false;
            }
        }
        if let Some(authors) = &self.authors {
            if !authors.iter().any(|a| *a == item.author) {
                return false;
            }
        }
        if let Some(kinds) = &self.kinds {
            if !kinds.contains(&item.kind) {
                return false;
            }
        }
        self.tags.iter().all(|(letter, values)| {
            let name = letter.to_string();
            values.iter().any(|v| item.has_tag_value(&name, v))
        })
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ids) = &self.ids {
            parts.push(format!("ids={}", ids.len()));
        }
        if let Some(authors) = &self.authors {
            parts.push(format!("authors={}", authors.len()));
        }
        if let Some(kinds) = &self.kinds {
            parts.push(format!("kinds={kinds:?}"));
        }
        for (letter, values) in &self.tags {
            parts.push(format!("#{letter}={}", values.len()));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("limit={limit}"));
        }
        write!(f, "{{{}}}", parts.join(" "))
    }
}
