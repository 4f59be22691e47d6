use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::deb::{self, DEB_PREFIX};
use crate::error::{Error, Result};

/// Architecture used by [`Repository::to_json`] when a record carries no
/// `arch` attribute.
pub const DEFAULT_ARCH: &str = "amd64";

/// Marker written in place of the component list for flat repositories.
pub const FLAT_MARKER: &str = "/";

/// One logical repository entry from a sources list.
///
/// A record comes out of [`Repository::parse`] holding exactly what one
/// declaration line said. Records describing the same URL are folded
/// together with [`Repository::merge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Backend tag of the declaration dialect (`apt-deb`). Empty when the
    /// line was not a recognized declaration.
    pub kind: String,
    /// Sub-channels of the repository (e.g. `main`, `universe`), in
    /// declaration order until merged. Empty for flat repositories.
    pub components: Vec<String>,
    /// Repository address, the merge key.
    pub url: String,
    /// `false` when signature verification must be bypassed for this
    /// repository.
    pub trusted: bool,
    /// Suite name, or a name derived from the URL for flat repositories.
    pub name: String,
    /// Bracketed `key=value` options (e.g. `arch=amd64,i386`).
    pub attrs: BTreeMap<String, String>,
    /// Whether the declaration used the flat `<url> /` form.
    pub is_flat: bool,
}

impl Default for Repository {
    fn default() -> Self {
        Repository {
            kind: String::new(),
            components: Vec::new(),
            url: String::new(),
            trusted: true,
            name: String::new(),
            attrs: BTreeMap::new(),
            is_flat: false,
        }
    }
}

/// A single repository as seen by build tooling, under one architecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoEntry {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    /// Comma-joined sorted components, or `/` for flat repositories.
    pub components: String,
}

/// Repositories keyed by architecture, then by repository name.
pub type RepoDocument = BTreeMap<String, BTreeMap<String, RepoEntry>>;

impl Repository {
    /// Parse one trimmed, non-comment sources line.
    ///
    /// Lines that are not `deb` declarations yield a record for which
    /// [`is_valid`](Repository::is_valid) is `false`. A `deb` line that
    /// lacks a suite name or components, or carries an option without `=`,
    /// is an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use apt_repofind::Repository;
    ///
    /// let repo = Repository::parse(
    ///     "deb [arch=amd64] http://archive.ubuntu.com/ubuntu jammy main universe",
    /// ).unwrap();
    /// assert!(repo.is_valid());
    /// assert_eq!(repo.name, "jammy");
    /// assert_eq!(repo.components, vec!["main", "universe"]);
    /// assert_eq!(repo.attrs["arch"], "amd64");
    ///
    /// let other = Repository::parse("deb-src http://archive.ubuntu.com/ubuntu jammy main").unwrap();
    /// assert!(!other.is_valid());
    ///
    /// assert!(Repository::parse("deb http://x/y").is_err());
    /// ```
    pub fn parse(line: &str) -> Result<Repository> {
        deb::parse_line(line)
    }

    /// A record is valid when its kind, URL and name are all set.
    pub fn is_valid(&self) -> bool {
        !(self.kind.is_empty() || self.url.is_empty() || self.name.is_empty())
    }

    /// Fold another declaration of the same repository into this one.
    ///
    /// Components become the sorted union of both sides, trust is ANDed and
    /// the other record's attributes overwrite ours on collision. Kind,
    /// URL, name and format are kept from `self`.
    ///
    /// # Examples
    ///
    /// ```
    /// use apt_repofind::Repository;
    ///
    /// let mut repo = Repository::parse("deb http://deb.example.org/ stable universe main").unwrap();
    /// let other = Repository::parse("deb http://deb.example.org/ stable main restricted").unwrap();
    /// repo.merge(&other).unwrap();
    /// assert_eq!(repo.components, vec!["main", "restricted", "universe"]);
    /// ```
    pub fn merge(&mut self, other: &Repository) -> Result<()> {
        if self.url != other.url {
            return Err(Error::MergeConflict {
                expected: self.url.clone(),
                found: other.url.clone(),
            });
        }

        let mut components: Vec<String> = self
            .components
            .iter()
            .chain(&other.components)
            .cloned()
            .collect();
        components.sort();
        components.dedup();
        self.components = components;

        self.trusted = self.trusted && other.trusted;
        self.attrs
            .extend(other.attrs.iter().map(|(k, v)| (k.clone(), v.clone())));

        Ok(())
    }

    /// Architectures this repository is served for, from the `arch`
    /// attribute, falling back to `default`.
    ///
    /// Empty items (`arch=`, `arch=amd64,,i386`) are ignored.
    pub fn architectures<'a>(&'a self, default: &'a str) -> Vec<&'a str> {
        let archs: Vec<&str> = self
            .attrs
            .get("arch")
            .map(|v| v.split(',').filter(|a| !a.is_empty()).collect())
            .unwrap_or_default();
        if archs.is_empty() {
            vec![default]
        } else {
            archs
        }
    }

    /// The entry describing this repository under any architecture.
    pub fn entry(&self) -> RepoEntry {
        let components = if self.components.is_empty() {
            FLAT_MARKER.to_string()
        } else {
            let mut sorted: Vec<&str> = self.components.iter().map(String::as_str).collect();
            sorted.sort_unstable();
            sorted.join(",")
        };
        RepoEntry {
            url: self.url.clone(),
            kind: self.kind.clone(),
            name: self.name.clone(),
            components,
        }
    }

    /// Expand into the per-architecture document consumed by build tools.
    pub fn to_document(&self, default_arch: &str) -> RepoDocument {
        let mut doc = RepoDocument::new();
        for arch in self.architectures(default_arch) {
            doc.entry(arch.to_string())
                .or_default()
                .insert(self.name.clone(), self.entry());
        }
        doc
    }

    /// JSON form of [`to_document`](Repository::to_document), using `amd64`
    /// as the default architecture.
    ///
    /// # Examples
    ///
    /// ```
    /// use apt_repofind::Repository;
    ///
    /// let repo = Repository::parse("deb [arch=arm64] http://ports.ubuntu.com/ jammy main").unwrap();
    /// let json = repo.to_json();
    /// assert_eq!(json["arm64"]["jammy"]["components"], "main");
    /// assert_eq!(json["arm64"]["jammy"]["type"], "apt-deb");
    /// ```
    pub fn to_json(&self) -> serde_json::Value {
        self.to_json_with_arch(DEFAULT_ARCH)
    }

    /// JSON form of [`to_document`](Repository::to_document).
    pub fn to_json_with_arch(&self, default_arch: &str) -> serde_json::Value {
        serde_json::json!(self.to_document(default_arch))
    }
}

/// Renders the record back as a declaration line.
impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{DEB_PREFIX}")?;
        if !self.attrs.is_empty() {
            write!(f, "[")?;
            for (i, (key, value)) in self.attrs.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "] ")?;
        }
        write!(f, "{}", self.url)?;
        if self.is_flat {
            return write!(f, " {FLAT_MARKER}");
        }
        write!(f, " {}", self.name)?;
        for component in &self.components {
            write!(f, " {component}")?;
        }
        Ok(())
    }
}
