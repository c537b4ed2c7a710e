//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: loading the content documents
//! ([`crate::document`]), annotating them ([`crate::annotate`]), planning the
//! pages ([`crate::emit`]), rendering the pages ([`crate::render`]), copying
//! the static directory, and generating the Atom feed.

use crate::annotate::{annotate_all, Error as AnnotateError};
use crate::config::Config;
use crate::document::{load_documents, Error as DocumentError};
use crate::emit::{
    emit_pages, Error as EmitError, PageRequest, TemplateId, BLOG_INDEX_PATH, DEFAULT_LANG,
};
use crate::feed::{write_feed, Error as FeedError, FeedConfig};
use crate::index::{ContentIndex, Error as IndexError, Sort};
use crate::render::{blog_filter, parse_template, Error as RenderError, Renderer};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// The output file of the 404 page.
const NOT_FOUND_FILE: &str = "404.html";

/// The output file of the Atom feed.
const FEED_FILE: &str = "feed.atom";

/// The directory inside the output directory the static assets are copied
/// to.
const STATIC_OUTPUT_DIRECTORY: &str = "static";

/// The file marking a directory as folio output. An existing, non-empty
/// output directory is only cleaned if it carries this file.
const OUTPUT_MARKER: &str = ".folio";

/// The annotated content of a site and the pages planned for it.
pub struct Plan {
    pub index: ContentIndex,
    pub pages: Vec<PageRequest>,
}

/// Loads, annotates and indexes the content documents and plans the pages.
/// Nothing is written to disk.
pub fn plan_site(config: &Config) -> Result<Plan> {
    let documents = load_documents(&config.content_directory)?;
    let index = ContentIndex::new(annotate_all(documents)?)?;
    info!(documents = index.len(), "indexed content");

    let mut pages = Vec::new();
    emit_pages(&index, &mut pages)?;
    info!(pages = pages.len(), "planned pages");
    Ok(Plan { index, pages })
}

/// Builds the site from a [`Config`] object. The output directory is only
/// cleaned once the page plan is complete, so a failed plan leaves the
/// previous output in place. The build is refused if the output directory
/// overlaps the project's sources or holds files folio didn't write.
pub fn build_site(config: &Config) -> Result<()> {
    let plan = plan_site(config)?;

    let mut templates = HashMap::new();
    for (template, files) in [
        (TemplateId::Post, &config.post_template),
        (TemplateId::About, &config.about_template),
        (TemplateId::Tag, &config.tag_template),
        (TemplateId::BlogIndex, &config.blog_index_template),
    ] {
        templates.insert(template, parse_template(files.iter())?);
    }
    let not_found_template = match &config.not_found_template {
        Some(files) => Some(parse_template(files.iter())?),
        None => None,
    };

    check_output_directory(config)?;
    rmdir(&config.output_directory)?;
    std::fs::create_dir_all(&config.output_directory)?;
    File::create(config.output_directory.join(OUTPUT_MARKER))?;

    let renderer = Renderer {
        index: &plan.index,
        templates: &templates,
        site_title: &config.title,
        site_url: &config.site_url,
        output_directory: &config.output_directory,
    };
    renderer.render_pages(&plan.pages)?;
    if let Some(template) = &not_found_template {
        renderer.render_standalone(
            template,
            "/404",
            &config.output_directory.join(NOT_FOUND_FILE),
        )?;
    }

    if config.static_directory.is_dir() {
        copy_dir(
            &config.static_directory,
            &config.output_directory.join(STATIC_OUTPUT_DIRECTORY),
        )?;
    } else {
        warn!(
            directory = %config.static_directory.display(),
            "static directory not found, skipping"
        );
    }

    let blog_entries = plan.index.find(&blog_filter(DEFAULT_LANG), Sort::DateDesc);
    write_feed(
        FeedConfig {
            title: config.title.clone(),
            author: config.author.clone(),
            site_url: config.site_url.clone(),
            home_page: config
                .site_url
                .join(BLOG_INDEX_PATH.trim_start_matches('/'))
                .map_err(Error::SiteUrl)?,
        },
        &blog_entries,
        File::create(config.output_directory.join(FEED_FILE))?,
    )?;

    info!(
        pages = plan.pages.len(),
        output = %config.output_directory.display(),
        "built site"
    );
    Ok(())
}

/// Refuses output directories that are or contain a directory the site is
/// built from, that sit inside the static directory (which is copied into
/// the output), or that hold files from something other than a build.
fn check_output_directory(config: &Config) -> Result<()> {
    let output = resolve(&config.output_directory)?;
    let static_directory = resolve(&config.static_directory)?;
    if output.starts_with(&static_directory) {
        return Err(Error::UnsafeOutput {
            output,
            source_dir: static_directory,
        });
    }
    for dir in [
        &config.project_root,
        &config.content_directory,
        &config.theme_directory,
        &config.static_directory,
    ] {
        let dir = resolve(dir)?;
        if dir.starts_with(&output) {
            return Err(Error::UnsafeOutput {
                output,
                source_dir: dir,
            });
        }
    }

    if output.is_dir()
        && !output.join(OUTPUT_MARKER).is_file()
        && std::fs::read_dir(&output)?.next().is_some()
    {
        return Err(Error::ForeignOutput(output));
    }
    Ok(())
}

/// Makes `path` absolute and resolves `..` and symlinks in the part of it
/// that exists.
fn resolve(path: &Path) -> Result<PathBuf> {
    let path = if path.is_absolute() {
        path.to_owned()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut existing = path.as_path();
    let mut missing: Vec<OsString> = Vec::new();
    loop {
        match existing.canonicalize() {
            Ok(resolved) => {
                return Ok(missing.iter().rev().fold(resolved, |p, name| p.join(name)));
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                match (existing.parent(), existing.file_name()) {
                    (Some(parent), Some(name)) => {
                        missing.push(name.to_owned());
                        existing = parent;
                    }
                    _ => return Err(err.into()),
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    for result in WalkDir::new(src) {
        let entry = result?;
        // every entry is under `src`, the walk's root
        let relative = match entry.path().strip_prefix(src) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned for errors loading content documents.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Returned for errors annotating documents.
    #[error(transparent)]
    Annotate(#[from] AnnotateError),

    /// Returned for errors indexing documents.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Returned for errors planning pages.
    #[error(transparent)]
    Emit(#[from] EmitError),

    /// Returned for errors rendering pages.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Returned for errors writing the feed.
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Returned for I/O problems while cleaning the output directory.
    #[error("cleaning directory `{}`: {err}", path.display())]
    Clean {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when the output directory overlaps a directory the site is
    /// built from.
    #[error(
        "refusing to build into `{}`: it overlaps `{}`",
        output.display(),
        source_dir.display()
    )]
    UnsafeOutput { output: PathBuf, source_dir: PathBuf },

    /// Returned when the output directory holds files that weren't written
    /// by a previous build.
    #[error(
        "refusing to clean `{}`: it isn't empty and wasn't built by folio",
        .0.display()
    )]
    ForeignOutput(PathBuf),

    /// Returned when the blog index URL can't be derived from the site URL.
    #[error("building the blog index URL: {0}")]
    SiteUrl(#[source] url::ParseError),

    /// Returned for errors walking the static directory.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),

    /// Returned for other I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
