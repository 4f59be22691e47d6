use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::collect::{collect, LineSource};
use crate::error::{Error, Result};
use crate::repository::{Repository, DEFAULT_ARCH};

/// Where the APT sources of a system live.
///
/// Every field has a default, so a TOML document only needs to name what
/// differs from a stock Debian layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Directory the paths below are resolved in, e.g. an image chroot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// The main sources list.
    pub primary: PathBuf,
    /// Directory of additional source lists.
    pub parts_dir: PathBuf,
    /// Only files in `parts_dir` with this suffix are read.
    pub suffix: String,
    /// Architecture for records without an `arch` option.
    pub default_arch: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        SourcesConfig {
            root: None,
            primary: PathBuf::from("/etc/apt/sources.list"),
            parts_dir: PathBuf::from("/etc/apt/sources.list.d"),
            suffix: ".list".to_string(),
            default_arch: DEFAULT_ARCH.to_string(),
        }
    }
}

impl SourcesConfig {
    /// The default layout beneath `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        SourcesConfig {
            root: Some(root.into()),
            ..Default::default()
        }
    }

    /// Read a configuration from TOML.
    ///
    /// # Examples
    ///
    /// ```
    /// use apt_repofind::SourcesConfig;
    ///
    /// let config = SourcesConfig::from_toml_str(r#"
    /// root = "/var/lib/images/jammy"
    /// default_arch = "arm64"
    /// "#).unwrap();
    /// assert_eq!(config.default_arch, "arm64");
    /// assert_eq!(config.suffix, ".list");
    /// assert_eq!(
    ///     config.primary_path(),
    ///     std::path::Path::new("/var/lib/images/jammy/etc/apt/sources.list"),
    /// );
    /// ```
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| Error::Config(e.to_string()))
    }

    /// Location of the main sources list.
    pub fn primary_path(&self) -> PathBuf {
        self.resolve(&self.primary)
    }

    /// Location of the directory of additional lists.
    pub fn parts_path(&self) -> PathBuf {
        self.resolve(&self.parts_dir)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path.strip_prefix("/").unwrap_or(path)),
            None => path.to_path_buf(),
        }
    }
}

/// Read the primary list and every suffixed file of the parts directory.
///
/// The primary list comes first, followed by the parts in file name order.
/// Missing files and a missing directory are skipped.
pub fn read_sources(config: &SourcesConfig) -> Result<Vec<LineSource>> {
    let mut paths = vec![config.primary_path()];
    paths.extend(list_parts(&config.parts_path(), &config.suffix)?);

    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        if let Some(source) = read_source(&path)? {
            sources.push(source);
        }
    }
    Ok(sources)
}

fn list_parts(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("{} does not exist", dir.display());
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(Error::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut parts = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| Error::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(suffix));
        if matches && path.is_file() {
            parts.push(path);
        }
    }
    parts.sort();
    Ok(parts)
}

fn read_source(path: &Path) -> Result<Option<LineSource>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(LineSource::from_text(
            path.display().to_string(),
            &text,
        ))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("{} does not exist", path.display());
            Ok(None)
        }
        Err(source) => Err(Error::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Discovers the repositories configured on a system.
///
/// One implementation exists per package manager dialect.
pub trait RepoFinder {
    /// All configured repositories, one record per URL.
    fn get_repos(&self) -> Result<Vec<Repository>>;
}

/// [`RepoFinder`] for APT one-line `deb` sources lists.
///
/// # Examples
///
/// ```no_run
/// use apt_repofind::{DebianRepoFinder, RepoFinder};
///
/// let finder = DebianRepoFinder::default();
/// for repo in finder.get_repos().unwrap() {
///     println!("{repo}");
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct DebianRepoFinder {
    config: SourcesConfig,
}

impl DebianRepoFinder {
    pub fn new(config: SourcesConfig) -> Self {
        DebianRepoFinder { config }
    }

    pub fn config(&self) -> &SourcesConfig {
        &self.config
    }
}

impl RepoFinder for DebianRepoFinder {
    fn get_repos(&self) -> Result<Vec<Repository>> {
        collect(&read_sources(&self.config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn default_layout() {
        let config = SourcesConfig::default();
        assert_eq!(config.primary_path(), Path::new("/etc/apt/sources.list"));
        assert_eq!(config.parts_path(), Path::new("/etc/apt/sources.list.d"));
        assert_eq!(config.suffix, ".list");
        assert_eq!(config.default_arch, "amd64");
    }

    #[test]
    fn root_prefix() {
        let config = SourcesConfig::with_root("/mnt/image");
        assert_eq!(
            config.primary_path(),
            Path::new("/mnt/image/etc/apt/sources.list")
        );
        assert_eq!(
            config.parts_path(),
            Path::new("/mnt/image/etc/apt/sources.list.d")
        );
    }

    #[test]
    fn toml_overrides() {
        let config = SourcesConfig::from_toml_str(
            r#"
primary = "/srv/apt/main.list"
parts_dir = "/srv/apt/parts"
suffix = ".sources-list"
"#,
        )
        .unwrap();
        assert_eq!(config.primary, Path::new("/srv/apt/main.list"));
        assert_eq!(config.parts_dir, Path::new("/srv/apt/parts"));
        assert_eq!(config.suffix, ".sources-list");
        assert_eq!(config.root, None);
        assert_eq!(config.default_arch, "amd64");
    }

    #[test]
    fn toml_empty_is_default() {
        assert_eq!(
            SourcesConfig::from_toml_str("").unwrap(),
            SourcesConfig::default()
        );
    }

    #[test]
    fn toml_invalid() {
        let err = SourcesConfig::from_toml_str("suffix = 3").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn read_sources_order_and_suffix_filter() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "etc/apt/sources.list", "deb http://a.example.org/ stable main\n");
        write(root, "etc/apt/sources.list.d/zz.list", "deb http://z.example.org/ stable main\n");
        write(root, "etc/apt/sources.list.d/aa.list", "deb http://b.example.org/ stable main\n");
        write(root, "etc/apt/sources.list.d/aa.list.save", "deb http://junk.example.org/ x y\n");
        write(root, "etc/apt/sources.list.d/old.list~", "deb http://junk.example.org/ x y\n");
        fs::create_dir_all(root.join("etc/apt/sources.list.d/dir.list")).unwrap();

        let sources = read_sources(&SourcesConfig::with_root(root)).unwrap();
        let ids: Vec<String> = sources.iter().map(|s| s.id.clone()).collect();
        assert_eq!(
            ids,
            vec![
                root.join("etc/apt/sources.list").display().to_string(),
                root.join("etc/apt/sources.list.d/aa.list").display().to_string(),
                root.join("etc/apt/sources.list.d/zz.list").display().to_string(),
            ]
        );
    }

    #[test]
    fn read_sources_missing_everything() {
        let dir = tempfile::tempdir().unwrap();
        let sources = read_sources(&SourcesConfig::with_root(dir.path())).unwrap();
        assert!(sources.is_empty());
    }

    #[test]
    fn read_sources_only_parts() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "etc/apt/sources.list.d/only.list",
            "deb http://a.example.org/ stable main\n",
        );
        let sources = read_sources(&SourcesConfig::with_root(dir.path())).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].lines, vec!["deb http://a.example.org/ stable main"]);
    }

    #[test]
    fn finder_merges_same_url_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "etc/apt/sources.list",
            "# Ubuntu\n\
             deb [arch=amd64] http://archive.ubuntu.com/ubuntu jammy main restricted\n\
             deb-src http://archive.ubuntu.com/ubuntu jammy main\n",
        );
        write(
            root,
            "etc/apt/sources.list.d/a.list",
            "deb [arch=amd64,i386] http://archive.ubuntu.com/ubuntu jammy universe\n",
        );
        write(
            root,
            "etc/apt/sources.list.d/b.list",
            "deb [arch=arm64 trusted=no] http://archive.ubuntu.com/ubuntu jammy multiverse main\n\
             deb file:///opt/local-repo /\n",
        );

        let finder = DebianRepoFinder::new(SourcesConfig::with_root(root));
        let repos = finder.get_repos().unwrap();
        assert_eq!(repos.len(), 2);

        let ubuntu = &repos[0];
        assert_eq!(ubuntu.url, "http://archive.ubuntu.com/ubuntu");
        assert_eq!(
            ubuntu.components,
            vec!["main", "multiverse", "restricted", "universe"]
        );
        assert_eq!(ubuntu.attrs["arch"], "arm64");
        assert!(!ubuntu.trusted);

        let local = &repos[1];
        assert!(local.is_flat);
        assert_eq!(local.name, "opt_local-repo");
        assert!(local.trusted);
    }

    #[test]
    fn finder_reports_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "etc/apt/sources.list.d/broken.list",
            "deb http://x/y\n",
        );
        let finder = DebianRepoFinder::new(SourcesConfig::with_root(dir.path()));
        let err = finder.get_repos().unwrap_err();
        match err {
            Error::MalformedDeclaration { source_id, .. } => {
                assert!(source_id.ends_with("broken.list"));
            }
            other => panic!("expected MalformedDeclaration, got {other:?}"),
        }
    }
}
