//! Loads the project configuration: the project file (`folio.yaml`) and the
//! theme file (`theme/theme.yaml`).

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file.
pub const PROJECT_FILE: &str = "folio.yaml";

fn default_content_directory() -> PathBuf {
    PathBuf::from("pages")
}

fn default_static_directory() -> PathBuf {
    PathBuf::from("static")
}

/// The author named in the feed.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Author {
    pub name: String,

    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Project {
    site_url: Url,
    title: String,

    #[serde(default)]
    author: Option<Author>,

    #[serde(default = "default_content_directory")]
    content_directory: PathBuf,

    #[serde(default = "default_static_directory")]
    static_directory: PathBuf,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Theme {
    post_template: Vec<PathBuf>,
    about_template: Vec<PathBuf>,
    tag_template: Vec<PathBuf>,
    blog_index_template: Vec<PathBuf>,

    #[serde(default)]
    not_found_template: Option<Vec<PathBuf>>,
}

/// The resolved configuration for a build. All paths are absolute or
/// relative to the working directory.
#[derive(Clone, Debug)]
pub struct Config {
    /// The directory holding the project file.
    pub project_root: PathBuf,

    /// The directory holding the theme file and templates.
    pub theme_directory: PathBuf,

    pub title: String,
    pub author: Option<Author>,

    /// The absolute URL the site is served from.
    pub site_url: Url,

    /// The directory containing the content documents. Slugs are derived
    /// from paths relative to this directory.
    pub content_directory: PathBuf,

    /// The directory of static assets copied into the output as-is.
    pub static_directory: PathBuf,

    pub post_template: Vec<PathBuf>,
    pub about_template: Vec<PathBuf>,
    pub tag_template: Vec<PathBuf>,
    pub blog_index_template: Vec<PathBuf>,
    pub not_found_template: Option<Vec<PathBuf>>,

    /// The directory the site is written to.
    pub output_directory: PathBuf,
}

impl Config {
    /// Searches `dir` and its ancestors for a project file and loads it. If
    /// `output_directory` is `None`, the site is written to `_site` in the
    /// project root.
    pub fn from_directory(dir: &Path, output_directory: Option<&Path>) -> Result<Config> {
        // `.` has no parent until it's made absolute
        let dir = dir
            .canonicalize()
            .with_context(|| format!("Resolving project directory `{}`", dir.display()))?;
        let mut current = Some(dir.as_path());
        while let Some(dir) = current {
            let path = dir.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path, output_directory)
                    .with_context(|| format!("Loading configuration `{}`", path.display()));
            }
            current = dir.parent();
        }
        Err(anyhow!(
            "Could not find `{}` in `{}` or any parent directory",
            PROJECT_FILE,
            dir.display()
        ))
    }

    /// Loads the project file at `path` and the theme file next to it.
    pub fn from_project_file(path: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path `{}`",
                path.display()
            )
        })?;

        let theme_dir = project_root.join("theme");
        let theme: Theme = serde_yaml::from_reader(open(&theme_dir.join("theme.yaml"), "theme")?)?;
        let in_theme =
            |relpaths: Vec<PathBuf>| relpaths.iter().map(|p| theme_dir.join(p)).collect::<Vec<_>>();

        Ok(Config {
            project_root: project_root.to_owned(),
            title: project.title,
            author: project.author,
            site_url: project.site_url,
            content_directory: project_root.join(project.content_directory),
            static_directory: project_root.join(project.static_directory),
            post_template: in_theme(theme.post_template),
            about_template: in_theme(theme.about_template),
            tag_template: in_theme(theme.tag_template),
            blog_index_template: in_theme(theme.blog_index_template),
            not_found_template: theme.not_found_template.map(in_theme),
            theme_directory: theme_dir.clone(),
            output_directory: match output_directory {
                Some(dir) => dir.to_owned(),
                None => project_root.join("_site"),
            },
        })
    }
}

fn open(path: &Path, kind: &str) -> Result<File> {
    File::open(path).with_context(|| format!("Opening {} file `{}`", kind, path.display()))
}

#[cfg(test)]
mod test {
    use super::*;

    fn write_project(root: &Path, project: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(root.join("theme"))?;
        std::fs::write(root.join(PROJECT_FILE), project)?;
        std::fs::write(
            root.join("theme/theme.yaml"),
            "post_template: [base.html, post.html]\n\
             about_template: [base.html, about.html]\n\
             tag_template: [base.html, tag.html]\n\
             blog_index_template: [base.html, blog.html]\n",
        )
    }

    #[test]
    fn test_from_directory_searches_ancestors() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let root = &dir.path().canonicalize()?;
        write_project(root, "site_url: https://example.com/\ntitle: Example\n")?;
        let nested = root.join("pages/deep");
        std::fs::create_dir_all(&nested)?;

        let config = Config::from_directory(&nested, None)?;
        assert_eq!(root, &config.project_root);
        assert_eq!(root.join("theme"), config.theme_directory);
        assert_eq!("Example", config.title);
        assert_eq!("https://example.com/", config.site_url.as_str());
        assert_eq!(root.join("pages"), config.content_directory);
        assert_eq!(root.join("static"), config.static_directory);
        assert_eq!(root.join("_site"), config.output_directory);
        assert_eq!(
            vec![root.join("theme/base.html"), root.join("theme/post.html")],
            config.post_template
        );
        assert_eq!(None, config.not_found_template);
        assert_eq!(None, config.author);
        Ok(())
    }

    #[test]
    fn test_from_directory_overrides() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let root = &dir.path().canonicalize()?;
        write_project(
            root,
            "site_url: https://example.com/blog/\ntitle: Example\n\
             author: {name: Jo, email: jo@example.com}\ncontent_directory: content\n",
        )?;
        let out = root.join("out");
        let config = Config::from_directory(root, Some(&out))?;
        assert_eq!(root.join("content"), config.content_directory);
        assert_eq!(out, config.output_directory);
        assert_eq!(Some("jo@example.com"), config.author.and_then(|a| a.email).as_deref());
        Ok(())
    }

    #[test]
    fn test_from_directory_missing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let err = match Config::from_directory(dir.path(), None) {
            Ok(_) => panic!("found a project file in an empty directory"),
            Err(err) => err,
        };
        assert!(err.to_string().contains(PROJECT_FILE));
        Ok(())
    }

    #[test]
    fn test_from_directory_rejects_unknown_fields() -> Result<()> {
        let dir = tempfile::tempdir()?;
        write_project(dir.path(), "site_url: https://example.com/\ntitle: x\nsite_root: y\n")?;
        assert!(Config::from_directory(dir.path(), None).is_err());
        Ok(())
    }
}
