//! The library code for the `folio` static site generator. The architecture
//! can be generally broken down into two distinct steps:
//!
//! 1. Annotating content documents ([`crate::annotate`]): every document
//!    found under the content directory gets a plain slug derived from its
//!    path, a public slug prefixed with its language, and the slugs of its
//!    tag pages.
//! 2. Emitting pages ([`crate::emit`]): the annotated documents are queried
//!    for the about page and for the published content, and a page request
//!    is issued for the blog index, the about page, every post, and every
//!    distinct tag.
//!
//! The page requests are only rendered ([`crate::render`]) once the whole
//! plan has been emitted, so a failed query never leaves a partial site
//! behind.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod annotate;
pub mod build;
pub mod config;
pub mod document;
pub mod emit;
pub mod feed;
pub mod frontmatter;
pub mod index;
pub mod markdown;
pub mod render;
pub mod value;
