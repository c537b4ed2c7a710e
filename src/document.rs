//! Defines the [`ContentDocument`] type and the logic for discovering content
//! documents on the file system.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::frontmatter::{self, Frontmatter};

/// The file extensions recognized as content documents.
const CONTENT_EXTENSIONS: &[&str] = &["md", "mdx"];

/// An authored unit of content: a blog post, the about page, etc.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentDocument {
    /// The parsed frontmatter.
    pub frontmatter: Frontmatter,

    /// The path of the source file relative to the content directory (e.g.,
    /// `2023-01-01-hello/index.mdx`). Slugs are derived from this path.
    pub relative_path: PathBuf,

    /// The full path of the source file.
    pub content_file_path: PathBuf,

    /// The raw markdown body following the frontmatter.
    pub body: String,
}

impl ContentDocument {
    /// Parses a document from its source text. `relative_path` is relative
    /// to the content directory and `content_file_path` is where the text
    /// came from.
    pub fn parse(
        relative_path: impl Into<PathBuf>,
        content_file_path: impl Into<PathBuf>,
        input: &str,
    ) -> frontmatter::Result<ContentDocument> {
        let (frontmatter, body) = frontmatter::split(input)?;
        Ok(ContentDocument {
            frontmatter,
            relative_path: relative_path.into(),
            content_file_path: content_file_path.into(),
            body: body.to_owned(),
        })
    }
}

/// Recursively searches `content_directory` for content files (extension
/// `.md` or `.mdx`) and parses each one. Documents are returned sorted by
/// relative path so that every build sees them in the same order.
pub fn load_documents(content_directory: &Path) -> Result<Vec<ContentDocument>> {
    let mut documents = Vec::new();
    for result in WalkDir::new(content_directory).sort_by_file_name() {
        let entry = result?;
        if !entry.file_type().is_file() || !is_content_file(entry.path()) {
            continue;
        }
        let relative_path = entry
            .path()
            .strip_prefix(content_directory)
            .map_err(|_| Error::OutsideContentDirectory(entry.path().to_owned()))?;
        documents.push(load_document(relative_path, entry.path())?);
    }
    debug!(
        count = documents.len(),
        directory = %content_directory.display(),
        "discovered content documents"
    );
    Ok(documents)
}

fn load_document(relative_path: &Path, path: &Path) -> Result<ContentDocument> {
    let input = std::fs::read_to_string(path).map_err(|err| Error::Read {
        path: path.to_owned(),
        err,
    })?;
    ContentDocument::parse(relative_path, path, &input).map_err(|err| Error::Parse {
        path: path.to_owned(),
        err,
    })
}

fn is_content_file(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => CONTENT_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// Represents the result of loading documents.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading content documents.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a content file can't be read.
    #[error("reading `{}`: {err}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when a content file's frontmatter can't be parsed.
    #[error("parsing `{}`: {err}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        err: frontmatter::Error,
    },

    /// Returned when a discovered path isn't under the content directory.
    #[error("`{}` is outside of the content directory", .0.display())]
    OutsideContentDirectory(PathBuf),

    /// Returned for errors walking the content directory.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_load_documents() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let pages = dir.path();
        std::fs::create_dir_all(pages.join("2023-01-01-hello"))?;
        std::fs::write(
            pages.join("2023-01-01-hello/index.mdx"),
            "---\ntitle: Hello\nlang: en\n---\nHi!\n",
        )?;
        std::fs::write(pages.join("about.md"), "---\ntitle: About me\nlang: en\n---\n")?;
        std::fs::write(pages.join("notes.txt"), "not content")?;

        let documents = load_documents(pages)?;
        let paths: Vec<&Path> = documents.iter().map(|d| d.relative_path.as_path()).collect();
        assert_eq!(
            vec![Path::new("2023-01-01-hello/index.mdx"), Path::new("about.md")],
            paths
        );
        assert_eq!("Hi!\n", documents[0].body);
        assert_eq!(pages.join("about.md"), documents[1].content_file_path);
        Ok(())
    }

    #[test]
    fn test_load_documents_reports_path() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("broken.md"), "no frontmatter")?;
        match load_documents(dir.path()) {
            Err(Error::Parse { path, .. }) => assert_eq!(dir.path().join("broken.md"), path),
            other => panic!("unexpected result: {:?}", other),
        }
        Ok(())
    }
}
