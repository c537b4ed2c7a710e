//! Derives the URL fields of a [`ContentDocument`]: its plain slug, its
//! language-prefixed public slug, and the slugs of its tag pages.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::document::ContentDocument;

/// A tag declared by a document together with the slug of the tag's index
/// page.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SlugTag {
    pub tag: String,
    pub slug: String,
}

/// The fields derived from a document's location and frontmatter. These only
/// live for the duration of a build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedFields {
    /// The path-derived identifier without extension or trailing `/index`
    /// (e.g., `/2023-01-01-hello`).
    pub slug_plain: String,

    /// The public path: `/{lang}{slug_plain}`.
    pub slug: String,

    /// One entry per declared tag, in declaration order.
    pub slug_tag_list: Vec<SlugTag>,
}

/// Computes the [`DerivedFields`] for a document. Fails if the document
/// doesn't declare a language.
pub fn annotate(document: &ContentDocument) -> Result<DerivedFields> {
    let lang = match document.frontmatter.lang.as_deref() {
        Some(lang) if !lang.trim().is_empty() => lang,
        _ => {
            return Err(Error::MissingLanguage {
                path: document.relative_path.clone(),
            })
        }
    };

    let slug_plain = slug_plain(&file_path_slug(&document.relative_path));
    let slug = format!("/{}{}", lang, slug_plain);
    let slug_tag_list = match &document.frontmatter.tags {
        Some(tags) => tags
            .iter()
            .map(|tag| SlugTag {
                tag: tag.clone(),
                slug: tag_slug(lang, tag),
            })
            .collect(),
        None => Vec::new(),
    };

    Ok(DerivedFields {
        slug_plain,
        slug,
        slug_tag_list,
    })
}

/// Annotates every document, stopping at the first failure.
pub fn annotate_all(
    documents: Vec<ContentDocument>,
) -> Result<Vec<(ContentDocument, DerivedFields)>> {
    documents
        .into_iter()
        .map(|document| {
            let fields = annotate(&document)?;
            debug!(
                path = %document.relative_path.display(),
                slug = %fields.slug,
                tags = fields.slug_tag_list.len(),
                "annotated document"
            );
            Ok((document, fields))
        })
        .collect()
}

/// The slug of the index page for `tag` in language `lang`.
pub fn tag_slug(lang: &str, tag: &str) -> String {
    format!("/{}/tag/{}", lang, tag)
}

/// Maps a path relative to the content directory to a URL-shaped path: `/`
/// separators and a leading `/`. `2023-01-01-hello/index.mdx` becomes
/// `/2023-01-01-hello/index.mdx`.
pub fn file_path_slug(relative_path: &Path) -> String {
    let mut slug = String::new();
    for component in relative_path.components() {
        if let Component::Normal(part) = component {
            slug.push('/');
            slug.push_str(&part.to_string_lossy());
        }
    }
    if slug.is_empty() {
        slug.push('/');
    }
    slug
}

/// Strips everything from the first `.` onward and then one trailing
/// `/index` (case-insensitive).
pub fn slug_plain(file_path_slug: &str) -> String {
    const INDEX: &str = "/index";

    let stem = match file_path_slug.find('.') {
        Some(i) => &file_path_slug[..i],
        None => file_path_slug,
    };
    let split = stem.len().saturating_sub(INDEX.len());
    match stem.get(split..) {
        Some(tail) if tail.eq_ignore_ascii_case(INDEX) => stem[..split].to_owned(),
        _ => stem.to_owned(),
    }
}

/// Represents the result of an annotation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error annotating a document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a document doesn't declare a `lang` in its frontmatter.
    /// Every public slug starts with the language, so there's no valid slug
    /// for such a document.
    #[error("`{}` doesn't declare a `lang`", path.display())]
    MissingLanguage { path: PathBuf },
}

#[cfg(test)]
mod test {
    use super::*;

    fn document(relative_path: &str, input: &str) -> ContentDocument {
        ContentDocument::parse(relative_path, relative_path, input).unwrap()
    }

    #[test]
    fn test_annotate_bundle() -> Result<()> {
        let fields = annotate(&document(
            "2023-01-01-hello/index.mdx",
            "---\nlang: en\n---\n",
        ))?;
        assert_eq!("/2023-01-01-hello", fields.slug_plain);
        assert_eq!("/en/2023-01-01-hello", fields.slug);
        assert!(fields.slug_tag_list.is_empty());
        Ok(())
    }

    #[test]
    fn test_annotate_tags() -> Result<()> {
        let fields = annotate(&document(
            "posts/langs.md",
            "---\nlang: fr\ntags: [rust, go]\n---\n",
        ))?;
        assert_eq!(
            vec![
                SlugTag {
                    tag: "rust".to_owned(),
                    slug: "/fr/tag/rust".to_owned(),
                },
                SlugTag {
                    tag: "go".to_owned(),
                    slug: "/fr/tag/go".to_owned(),
                },
            ],
            fields.slug_tag_list
        );
        assert_eq!("/fr/posts/langs", fields.slug);
        Ok(())
    }

    #[test]
    fn test_annotate_keeps_tags_verbatim() -> Result<()> {
        let fields = annotate(&document(
            "a.md",
            "---\nlang: en\ntags: [Rust, rust, Rust, big data]\n---\n",
        ))?;
        let slugs: Vec<&str> = fields.slug_tag_list.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(
            vec!["/en/tag/Rust", "/en/tag/rust", "/en/tag/Rust", "/en/tag/big data"],
            slugs
        );
        Ok(())
    }

    #[test]
    fn test_annotate_empty_tags() -> Result<()> {
        let fields = annotate(&document("a.md", "---\nlang: en\ntags: []\n---\n"))?;
        assert!(fields.slug_tag_list.is_empty());
        Ok(())
    }

    #[test]
    fn test_annotate_missing_language() {
        for input in &["---\ntitle: x\n---\n", "---\nlang: ''\n---\n"] {
            match annotate(&document("nolang.md", input)) {
                Err(Error::MissingLanguage { path }) => {
                    assert_eq!(Path::new("nolang.md"), path)
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }
    }

    #[test]
    fn test_annotate_is_idempotent() -> Result<()> {
        let document = document("x/index.md", "---\nlang: de\ntags: [a, b]\n---\n");
        assert_eq!(annotate(&document)?, annotate(&document)?);
        Ok(())
    }

    #[test]
    fn test_slug_plain() {
        for (wanted, input) in &[
            ("/2023-01-01-hello", "/2023-01-01-hello/index.mdx"),
            ("/2023-01-01-hello", "/2023-01-01-hello/INDEX.md"),
            ("/post", "/post.md"),
            ("/post", "/post.draft.md"),
            ("/v1", "/v1.2/index.md"),
            ("", "/index.md"),
            ("/reindex", "/reindex.md"),
            ("/a/index/b", "/a/index/b.md"),
        ] {
            let got = slug_plain(input);
            assert_eq!(*wanted, got, "slug_plain({:?})", input);
            assert!(!got.to_lowercase().ends_with("/index"));
        }
    }

    #[test]
    fn test_file_path_slug() {
        assert_eq!(
            "/2023-01-01-hello/index.mdx",
            file_path_slug(Path::new("2023-01-01-hello/index.mdx"))
        );
        assert_eq!("/about.md", file_path_slug(Path::new("./about.md")));
        assert_eq!("/", file_path_slug(Path::new("")));
    }
}
