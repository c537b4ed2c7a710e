//! The in-memory store of annotated documents, queryable with a [`Filter`].

use std::collections::HashMap;
use std::path::PathBuf;

use crate::annotate::DerivedFields;
use crate::document::ContentDocument;

/// A document together with the fields derived for it.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub document: ContentDocument,
    pub fields: DerivedFields,
}

/// Holds every annotated document of a build in discovery order.
#[derive(Debug, Default)]
pub struct ContentIndex {
    entries: Vec<Entry>,
    by_slug: HashMap<String, usize>,
}

impl ContentIndex {
    /// Builds an index. Two published documents resolving to the same slug
    /// would render to the same page, so that is an error.
    pub fn new(annotated: Vec<(ContentDocument, DerivedFields)>) -> Result<ContentIndex> {
        let mut index = ContentIndex::default();
        for (document, fields) in annotated {
            let i = index.entries.len();
            match index.by_slug.get(&fields.slug) {
                Some(&existing) => {
                    let existing = &index.entries[existing];
                    if existing.document.frontmatter.published && document.frontmatter.published {
                        return Err(Error::DuplicateSlug {
                            slug: fields.slug,
                            first: existing.document.relative_path.clone(),
                            second: document.relative_path,
                        });
                    }
                    if document.frontmatter.published {
                        index.by_slug.insert(fields.slug.clone(), i);
                    }
                }
                None => {
                    index.by_slug.insert(fields.slug.clone(), i);
                }
            }
            index.entries.push(Entry { document, fields });
        }
        Ok(index)
    }

    /// Returns the number of documents in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index holds no documents.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds the document whose public slug is `slug`, preferring a published
    /// document over an unpublished one.
    pub fn get(&self, slug: &str) -> Option<&Entry> {
        self.by_slug.get(slug).map(|&i| &self.entries[i])
    }

    /// Returns every document matching `filter`, ordered by `sort`.
    pub fn find(&self, filter: &Filter, sort: Sort) -> Vec<&Entry> {
        let mut matches: Vec<&Entry> = self.entries.iter().filter(|e| filter.matches(e)).collect();
        if let Sort::DateDesc = sort {
            // `sort_by` is stable, so documents with equal dates keep their
            // discovery order. Undated documents sort last.
            matches.sort_by(|a, b| {
                let (a, b) = (a.document.frontmatter.date, b.document.frontmatter.date);
                b.cmp(&a)
            });
        }
        matches
    }
}

/// The order of query results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sort {
    /// Discovery order (sorted by relative path).
    SourceOrder,

    /// Newest first; documents without a date come last.
    DateDesc,
}

/// A predicate on the `type` frontmatter field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KindFilter {
    Eq(String),

    /// Also matches documents that don't declare a type.
    Ne(String),
}

/// A conjunction of optional predicates on frontmatter fields. The default
/// filter matches every document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    pub published: Option<bool>,
    pub kind: Option<KindFilter>,
    pub title: Option<String>,
    pub lang: Option<String>,
    pub tag: Option<String>,
}

impl Filter {
    pub fn published(mut self, published: bool) -> Self {
        self.published = Some(published);
        self
    }

    pub fn kind_eq(mut self, kind: &str) -> Self {
        self.kind = Some(KindFilter::Eq(kind.to_owned()));
        self
    }

    pub fn kind_ne(mut self, kind: &str) -> Self {
        self.kind = Some(KindFilter::Ne(kind.to_owned()));
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_owned());
        self
    }

    pub fn lang(mut self, lang: &str) -> Self {
        self.lang = Some(lang.to_owned());
        self
    }

    /// Matches documents declaring exactly `tag` (case-sensitive).
    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_owned());
        self
    }

    /// Returns true if `entry` satisfies every predicate of the filter.
    pub fn matches(&self, entry: &Entry) -> bool {
        let frontmatter = &entry.document.frontmatter;
        if let Some(published) = self.published {
            if frontmatter.published != published {
                return false;
            }
        }
        match &self.kind {
            Some(KindFilter::Eq(kind)) if !frontmatter.is_kind(kind) => return false,
            Some(KindFilter::Ne(kind)) if frontmatter.is_kind(kind) => return false,
            _ => {}
        }
        if let Some(title) = &self.title {
            if frontmatter.title.as_ref() != Some(title) {
                return false;
            }
        }
        if let Some(lang) = &self.lang {
            if frontmatter.lang.as_ref() != Some(lang) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            match &frontmatter.tags {
                Some(tags) if tags.contains(tag) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Represents the result of building an index.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error building a [`ContentIndex`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when two published documents have the same public slug.
    #[error(
        "`{}` and `{}` both resolve to `{slug}`",
        first.display(),
        second.display()
    )]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
}
