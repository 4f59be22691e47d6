//! Discovery and normalization of APT repository declarations.
//!
//! This crate reads the one-line `deb` entries of a system's
//! `sources.list` and `sources.list.d/*.list` files and turns them into one
//! [`Repository`] record per repository URL.
//!
//! # Overview
//!
//! The same archive is often declared several times: once per component
//! group, or again by a third-party file with different options. Build
//! tooling wants a single entry for it, so declarations sharing a URL are
//! merged: their components are unioned, their options combined (later
//! declarations win) and a single untrusted declaration makes the whole
//! repository untrusted.
//!
//! # Examples
//!
//! Collect repositories from in-memory sources:
//!
//! ```
//! use apt_repofind::{collect, LineSource};
//!
//! let sources = [
//!     LineSource::from_text("sources.list", "\
//! deb http://archive.ubuntu.com/ubuntu jammy main restricted
//! deb http://archive.ubuntu.com/ubuntu jammy universe
//! ## deb http://archive.ubuntu.com/ubuntu jammy multiverse
//! "),
//!     LineSource::from_text("local.list", "deb [trusted=no] file:///srv/repo /\n"),
//! ];
//! let repos = collect(&sources).unwrap();
//! assert_eq!(repos.len(), 2);
//! assert_eq!(repos[0].components, vec!["main", "restricted", "universe"]);
//! assert_eq!(repos[1].name, "srv_repo");
//! assert!(!repos[1].trusted);
//! ```

mod collect;
mod deb;
mod error;
mod repository;
mod sources;

#[cfg(test)]
mod merge_proptest;

// Re-export public types
pub use collect::{collect, repos_document, repos_to_json, LineSource, TRUSTED_ATTR};
pub use deb::{flat_name, DEB_KIND};
pub use error::{Error, Result};
pub use repository::{RepoDocument, RepoEntry, Repository, DEFAULT_ARCH, FLAT_MARKER};
pub use sources::{read_sources, DebianRepoFinder, RepoFinder, SourcesConfig};
