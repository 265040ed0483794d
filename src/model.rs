use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Repository ID of the pseudo-repository describing the installed system.
pub const SYSTEM_REPO_ID: &str = "@System";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoSnapshot {
    pub packages: Vec<PackageRecord>,
    pub modules: Vec<ModuleInfo>,
    /// Artifact keys hidden by modular filtering of non-hotfix repositories.
    pub filtered_artifacts: BTreeSet<String>,
}

impl RepoSnapshot {
    /// Appends another snapshot, keeping load order.
    pub fn merge(&mut self, other: RepoSnapshot) {
        self.packages.extend(other.packages);
        self.modules.extend(other.modules);
        self.filtered_artifacts.extend(other.filtered_artifacts);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    pub epoch: u32,
    pub version: String,
    pub release: String,
    pub arch: String,
    /// Location of the artifact relative to the repository root.
    pub relative_path: String,
    /// File name of the source package this binary was built from.
    pub source_rpm: Option<String>,
    pub checksum: Checksum,
    pub license: String,
    pub requires: Vec<String>,
    pub provides: Vec<String>,
    pub file_provides: Vec<String>,
    pub download_url: String,
    pub repo_id: String,
}

impl PackageRecord {
    pub fn file_name(&self) -> &str {
        basename(&self.relative_path)
    }

    pub fn is_source(&self) -> bool {
        self.arch == "src" || self.arch == "nosrc"
    }

    /// Module artifact lookup key: `name-epoch:version-release.arch`.
    pub fn artifact_key(&self) -> String {
        format!(
            "{}-{}:{}-{}.{}",
            self.name, self.epoch, self.version, self.release, self.arch
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    /// `name:stream:version:context:arch`
    pub full_identifier: String,
    pub artifacts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksum {
    pub algorithm: ChecksumAlgorithm,
    pub digest: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Other(String),
}

impl ChecksumAlgorithm {
    pub fn from_name(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Self::Md5,
            // createrepo's legacy alias
            "sha" | "sha1" => Self::Sha1,
            "sha224" => Self::Sha224,
            "sha256" => Self::Sha256,
            "sha384" => Self::Sha384,
            "sha512" => Self::Sha512,
            other => Self::Other(other.to_string()),
        }
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Other(name) => name,
        };
        f.write_str(name)
    }
}

/// Where to load a repository from and how to treat its modular content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSpec {
    pub id: String,
    pub location: String,
    pub module_hotfixes: bool,
}

impl RepoSpec {
    pub fn new(location: impl Into<String>) -> Self {
        let location = location.into();
        Self {
            id: location_to_repo_id(&location),
            location,
            module_hotfixes: true,
        }
    }

    pub fn with_hotfixes(mut self, module_hotfixes: bool) -> Self {
        self.module_hotfixes = module_hotfixes;
        self
    }
}

/// Derives a repository ID from its location: every run of characters
/// outside `[a-zA-Z0-9]` becomes a single `_`, with none at either end.
pub fn location_to_repo_id(location: &str) -> String {
    let mut id = String::with_capacity(location.len());
    for c in location.chars() {
        if c.is_ascii_alphanumeric() {
            id.push(c);
        } else if !id.is_empty() && !id.ends_with('_') {
            id.push('_');
        }
    }
    while id.ends_with('_') {
        id.pop();
    }
    id
}

pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Lexical path normalization: drops empty and `.` segments and resolves
/// `..` against the preceding segment where one exists.
pub fn normalize_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Directory part of a path, empty for a bare file name.
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => "",
    }
}

pub fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("a/./b//c.rpm"), "a/b/c.rpm");
        assert_eq!(normalize_path("./pkg.rpm"), "pkg.rpm");
        assert_eq!(normalize_path("a/../b/c.rpm"), "b/c.rpm");
        assert_eq!(normalize_path("../x.rpm"), "../x.rpm");
        assert_eq!(normalize_path("/a/../../x.rpm"), "/x.rpm");
        assert_eq!(normalize_path(""), ".");
    }

    #[test]
    fn test_dirname_and_join() {
        assert_eq!(dirname("a/b/c.rpm"), "a/b");
        assert_eq!(dirname("c.rpm"), "");
        assert_eq!(dirname("/c.rpm"), "/");
        assert_eq!(join_path("", "x.src.rpm"), "x.src.rpm");
        assert_eq!(join_path("/", "x.src.rpm"), "/x.src.rpm");
        assert_eq!(join_path("a/b", "x.src.rpm"), "a/b/x.src.rpm");
    }

    #[test]
    fn test_location_to_repo_id() {
        assert_eq!(
            location_to_repo_id("https://vault.centos.org/8.2.2004/BaseOS/x86_64/os/"),
            "https_vault_centos_org_8_2_2004_BaseOS_x86_64_os"
        );
        assert_eq!(location_to_repo_id("/srv/repo"), "srv_repo");
        assert_eq!(location_to_repo_id("__"), "");
    }

    #[test]
    fn test_checksum_algorithm_parse() {
        assert_eq!("SHA256".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Sha256);
        assert_eq!("sha".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Sha1);
        assert_eq!(
            "crc32".parse::<ChecksumAlgorithm>().unwrap(),
            ChecksumAlgorithm::Other("crc32".to_string())
        );
        assert_eq!(ChecksumAlgorithm::Sha512.to_string(), "sha512");
    }

    #[test]
    fn test_artifact_key_and_source_detection() {
        let record = PackageRecord {
            name: "perl-DBI".to_string(),
            epoch: 0,
            version: "1.641".to_string(),
            release: "3.module_el8+332+132e4365".to_string(),
            arch: "x86_64".to_string(),
            relative_path: "Packages/p/perl-DBI-1.641-3.module_el8+332+132e4365.x86_64.rpm"
                .to_string(),
            source_rpm: Some("perl-DBI-1.641-3.module_el8+332+132e4365.src.rpm".to_string()),
            checksum: Checksum {
                algorithm: ChecksumAlgorithm::Sha256,
                digest: "00".to_string(),
            },
            license: "GPL+ or Artistic".to_string(),
            requires: vec![],
            provides: vec![],
            file_provides: vec![],
            download_url: String::new(),
            repo_id: "test".to_string(),
        };
        assert_eq!(
            record.artifact_key(),
            "perl-DBI-0:1.641-3.module_el8+332+132e4365.x86_64"
        );
        assert_eq!(
            record.file_name(),
            "perl-DBI-1.641-3.module_el8+332+132e4365.x86_64.rpm"
        );
        assert!(!record.is_source());
    }
}
