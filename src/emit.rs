//! Plans the pages of the site. [`emit_pages`] queries a [`ContentSource`]
//! for the about page and for the published content, and issues one
//! [`PageRequest`] per page into a [`PageSink`]:
//!
//! 1. the blog index at [`BLOG_INDEX_PATH`],
//! 2. the about page at [`ABOUT_PATH`], if there is one,
//! 3. a post page per published, non-single-page document,
//! 4. a tag page per distinct tag, in the order tags are first seen.

use std::collections::HashSet;
use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;

use tracing::debug;

use crate::annotate::SlugTag;
use crate::frontmatter::SINGLE_PAGE;
use crate::index::{ContentIndex, Filter, Sort};

/// The language of the fixed pages.
pub const DEFAULT_LANG: &str = "en";

/// The path of the blog index page.
pub const BLOG_INDEX_PATH: &str = "/en/blog";

/// The path of the about page.
pub const ABOUT_PATH: &str = "/en/about";

/// The title identifying the about document.
pub const ABOUT_TITLE: &str = "About me";

/// Identifies the template a page is rendered with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TemplateId {
    BlogIndex,
    About,
    Post,
    Tag,
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            TemplateId::BlogIndex => "blog-index",
            TemplateId::About => "about",
            TemplateId::Post => "post",
            TemplateId::Tag => "tag",
        })
    }
}

/// The payload a template uses to look up the data for its page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageContext {
    Lang(String),
    Slug(String),
    Tag(String),
}

impl fmt::Display for PageContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PageContext::Lang(lang) => write!(f, "lang={}", lang),
            PageContext::Slug(slug) => write!(f, "slug={}", slug),
            PageContext::Tag(tag) => write!(f, "tag={}", tag),
        }
    }
}

/// An instruction to materialize one output page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// The URL path of the page, e.g. `/en/2023-01-01-hello`.
    pub path: String,
    pub template: TemplateId,
    pub context: PageContext,

    /// The source file backing the page, for pages rendered from a single
    /// document.
    pub content_file: Option<PathBuf>,
}

/// A query result: the derived fields of one matching document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hit {
    pub slug: String,
    pub slug_tag_list: Vec<SlugTag>,
    pub content_file_path: PathBuf,
}

/// A queryable store of annotated documents.
pub trait ContentSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the documents matching `filter` in source order.
    fn query(&self, filter: &Filter) -> std::result::Result<Vec<Hit>, Self::Error>;
}

impl ContentSource for ContentIndex {
    type Error = Infallible;

    fn query(&self, filter: &Filter) -> std::result::Result<Vec<Hit>, Infallible> {
        Ok(self
            .find(filter, Sort::SourceOrder)
            .into_iter()
            .map(|entry| Hit {
                slug: entry.fields.slug.clone(),
                slug_tag_list: entry.fields.slug_tag_list.clone(),
                content_file_path: entry.document.content_file_path.clone(),
            })
            .collect())
    }
}

/// Receives page requests.
pub trait PageSink {
    fn create_page(&mut self, request: PageRequest);
}

impl PageSink for Vec<PageRequest> {
    fn create_page(&mut self, request: PageRequest) {
        debug!(path = %request.path, template = %request.template, "planned page");
        self.push(request);
    }
}

/// The filter selecting the about document.
pub fn about_filter() -> Filter {
    Filter::default()
        .published(true)
        .kind_eq(SINGLE_PAGE)
        .title(ABOUT_TITLE)
}

/// The filter selecting the documents that get their own page.
pub fn content_filter() -> Filter {
    Filter::default().published(true).kind_ne(SINGLE_PAGE)
}

/// Issues the page requests for the whole site into `sink`. A failed query
/// or two pages sharing a path abort immediately; callers should discard
/// whatever `sink` received in that case.
pub fn emit_pages<S, P>(source: &S, sink: &mut P) -> Result<()>
where
    S: ContentSource,
    P: PageSink,
{
    let mut emitter = Emitter {
        sink,
        paths: HashSet::new(),
    };
    emitter.emit(PageRequest {
        path: BLOG_INDEX_PATH.to_owned(),
        template: TemplateId::BlogIndex,
        context: PageContext::Lang(DEFAULT_LANG.to_owned()),
        content_file: None,
    })?;

    let mut about = source.query(&about_filter()).map_err(|err| Error::Query {
        query: "about",
        err: Box::new(err),
    })?;
    if about.len() > 1 {
        return Err(Error::AmbiguousAboutPage {
            slugs: about.into_iter().map(|hit| hit.slug).collect(),
        });
    }
    if let Some(hit) = about.pop() {
        emitter.emit(PageRequest {
            path: ABOUT_PATH.to_owned(),
            template: TemplateId::About,
            context: PageContext::Slug(hit.slug),
            content_file: Some(hit.content_file_path),
        })?;
    }

    let hits = source.query(&content_filter()).map_err(|err| Error::Query {
        query: "content",
        err: Box::new(err),
    })?;
    let mut seen_tags: HashSet<String> = HashSet::new();
    for hit in hits {
        emitter.emit(PageRequest {
            path: hit.slug.clone(),
            template: TemplateId::Post,
            context: PageContext::Slug(hit.slug),
            content_file: Some(hit.content_file_path),
        })?;
        for SlugTag { tag, slug } in hit.slug_tag_list {
            if seen_tags.insert(tag.clone()) {
                emitter.emit(PageRequest {
                    path: slug,
                    template: TemplateId::Tag,
                    context: PageContext::Tag(tag),
                    content_file: None,
                })?;
            }
        }
    }
    Ok(())
}

/// Forwards requests to a sink, refusing a second request for a path that
/// was already planned.
struct Emitter<'a, P> {
    sink: &'a mut P,
    paths: HashSet<String>,
}

impl<P: PageSink> Emitter<'_, P> {
    fn emit(&mut self, request: PageRequest) -> Result<()> {
        if !self.paths.insert(request.path.clone()) {
            return Err(Error::DuplicatePagePath {
                path: request.path,
                template: request.template,
            });
        }
        self.sink.create_page(request);
        Ok(())
    }
}

/// Represents the result of emitting pages.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error emitting pages. Any error is fatal to the build.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the content source fails to answer a query.
    #[error("loading `{query}` query: {err}")]
    Query {
        query: &'static str,
        #[source]
        err: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Returned when more than one document qualifies as the about page.
    #[error("more than one about page: {}", slugs.join(", "))]
    AmbiguousAboutPage { slugs: Vec<String> },

    /// Returned when a page would be written where another page already is,
    /// e.g. a post whose slug is `/en/blog`.
    #[error("`{template}` page at `{path}` collides with an earlier page")]
    DuplicatePagePath { path: String, template: TemplateId },
}
