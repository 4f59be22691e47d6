use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::repository::{RepoDocument, Repository};

/// Attribute key carrying the trust override of a declaration.
pub const TRUSTED_ATTR: &str = "trusted";

/// The raw lines of one declaration source, usually one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSource {
    /// Identifier reported in errors, usually the file path.
    pub id: String,
    /// Raw lines, comments and blanks included.
    pub lines: Vec<String>,
}

impl LineSource {
    pub fn new(id: impl Into<String>, lines: Vec<String>) -> Self {
        LineSource {
            id: id.into(),
            lines,
        }
    }

    /// Split the full text of a source into lines.
    pub fn from_text(id: impl Into<String>, text: &str) -> Self {
        LineSource::new(id, text.lines().map(|l| l.to_string()).collect())
    }
}

/// Parse every source and fold declarations of the same URL together.
///
/// Sources are read in the given order. Blank lines, `#` comments and
/// lines that are not `deb` declarations are skipped. The result holds one
/// record per distinct URL, in the order the URLs were first seen.
///
/// # Errors
///
/// [`Error::MalformedDeclaration`] for a `deb` line that cannot be parsed.
///
/// # Examples
///
/// ```
/// use apt_repofind::{collect, LineSource};
///
/// let sources = [
///     LineSource::from_text(
///         "/etc/apt/sources.list",
///         "# main archive\ndeb http://archive.ubuntu.com/ubuntu jammy main\n",
///     ),
///     LineSource::from_text(
///         "/etc/apt/sources.list.d/extra.list",
///         "deb http://archive.ubuntu.com/ubuntu jammy universe\n",
///     ),
/// ];
/// let repos = collect(&sources).unwrap();
/// assert_eq!(repos.len(), 1);
/// assert_eq!(repos[0].components, vec!["main", "universe"]);
/// ```
pub fn collect(sources: &[LineSource]) -> Result<Vec<Repository>> {
    let mut groups: IndexMap<String, Vec<Repository>> = IndexMap::new();
    for source in sources {
        for repo in parse_source(source)? {
            groups.entry(repo.url.clone()).or_default().push(repo);
        }
    }

    let mut repos = Vec::with_capacity(groups.len());
    for (url, group) in groups {
        if group.len() > 1 {
            debug!("merging {} declarations of {}", group.len(), url);
        }
        let mut members = group.into_iter();
        if let Some(first) = members.next() {
            let merged = members.try_fold(first, |mut acc, repo| {
                acc.merge(&repo)?;
                Ok::<_, Error>(acc)
            })?;
            repos.push(merged);
        }
    }
    Ok(repos)
}

/// Valid records declared by one source, in line order.
fn parse_source(source: &LineSource) -> Result<Vec<Repository>> {
    debug!("reading {} ({} lines)", source.id, source.lines.len());

    let mut repos = Vec::new();
    for raw in &source.lines {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut repo = Repository::parse(line).map_err(|e| match e {
            Error::InvalidDeclaration(reason) => Error::MalformedDeclaration {
                source_id: source.id.clone(),
                line: raw.clone(),
                reason,
            },
            other => other,
        })?;
        if !repo.is_valid() {
            trace!("{}: skipping {}", source.id, line);
            continue;
        }

        apply_trust_option(&mut repo);
        repos.push(repo);
    }
    Ok(repos)
}

/// `trusted=no` (or `false`, `0`) marks a record untrusted.
fn apply_trust_option(repo: &mut Repository) {
    if let Some(value) = repo.attrs.get(TRUSTED_ATTR) {
        if matches!(value.to_ascii_lowercase().as_str(), "no" | "false" | "0") {
            repo.trusted = false;
        }
    }
}

/// Combine the per-architecture documents of several records.
///
/// Entries are keyed by name, so a later record replaces an earlier one with
/// the same name under the same architecture. Replacing an entry for a
/// different URL is logged as a warning.
pub fn repos_document(repos: &[Repository], default_arch: &str) -> RepoDocument {
    let mut doc = RepoDocument::new();
    for repo in repos {
        for (arch, entries) in repo.to_document(default_arch) {
            let slot = doc.entry(arch).or_default();
            for (name, entry) in entries {
                let url = entry.url.clone();
                if let Some(old) = slot.insert(name, entry) {
                    if old.url != url {
                        warn!(
                            "repository {} ({}) replaces {} under the same name",
                            old.name, url, old.url
                        );
                    }
                }
            }
        }
    }
    doc
}

/// JSON form of [`repos_document`].
///
/// # Examples
///
/// ```
/// use apt_repofind::{collect, repos_to_json, LineSource};
///
/// let source = LineSource::from_text(
///     "sources.list",
///     "deb http://deb.debian.org/debian bookworm main\n\
///      deb [arch=arm64] http://deb.debian.org/debian-ports sid main\n",
/// );
/// let repos = collect(&[source]).unwrap();
/// let json = repos_to_json(&repos, "amd64");
/// assert_eq!(json["amd64"]["bookworm"]["url"], "http://deb.debian.org/debian");
/// assert_eq!(json["arm64"]["sid"]["components"], "main");
/// ```
pub fn repos_to_json(repos: &[Repository], default_arch: &str) -> serde_json::Value {
    serde_json::json!(repos_document(repos, default_arch))
}
