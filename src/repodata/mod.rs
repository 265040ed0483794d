//! Local repository metadata reader.
//!
//! [`RepodataProvider`] implements [`MetadataProvider`] over the `repodata/`
//! directory of a repository on disk:
//! - [`repomd`] locates the metadata documents
//! - [`primary`] yields one record per package
//! - [`filelists`] supplies complete file lists, when published
//! - [`modulemd`] enumerates module streams and their artifacts

pub mod filelists;
pub mod modulemd;
pub mod primary;
pub mod repomd;

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use quick_xml::events::BytesStart;
use tracing::{debug, info, instrument};

use crate::model::{PackageRecord, RepoSnapshot, RepoSpec};
use crate::traits::{LoadError, MetadataProvider};
use primary::PrimaryPackage;

/// Reads `repodata/` from a local path or `file://` URL.
#[derive(Debug, Default, Clone)]
pub struct RepodataProvider;

impl RepodataProvider {
    pub fn new() -> Self {
        Self
    }

    /// Blocking load of one repository.
    #[instrument(skip(repo), fields(repo = %repo.id))]
    pub fn load_blocking(repo: &RepoSpec) -> Result<RepoSnapshot, LoadError> {
        let root = resolve_location(&repo.location)?;
        let repomd_path = root.join("repodata").join("repomd.xml");
        if !repomd_path.is_file() {
            return Err(LoadError::MissingMetadata(repomd_path.display().to_string()));
        }
        let repomd = repomd::parse_repomd(BufReader::new(File::open(&repomd_path)?))?;

        let primary_href = repomd
            .href("primary")
            .ok_or_else(|| LoadError::MissingMetadata("primary".to_string()))?;
        let packages = primary::parse_primary(open_document(&root, primary_href)?)?;

        let mut files = match repomd.href("filelists") {
            Some(href) => Some(filelists::parse_filelists(open_document(&root, href)?)?),
            None => None,
        };

        let modules = match repomd.href("modules") {
            Some(href) => {
                let mut content = String::new();
                open_document(&root, href)?.read_to_string(&mut content)?;
                modulemd::parse_modules(&content)?
            }
            None => Vec::new(),
        };
        debug!(
            packages = packages.len(),
            modules = modules.len(),
            filelists = files.is_some(),
            "Parsed repodata"
        );

        let mut snapshot = RepoSnapshot {
            packages: packages
                .into_iter()
                .map(|pkg| into_record(pkg, repo, files.as_mut()))
                .collect::<Result<_, _>>()?,
            modules,
            filtered_artifacts: BTreeSet::new(),
        };

        if !repo.module_hotfixes {
            apply_modular_filtering(&mut snapshot);
        }
        Ok(snapshot)
    }
}

#[async_trait]
impl MetadataProvider for RepodataProvider {
    fn provider_id(&self) -> &str {
        "repodata"
    }

    async fn load(&self, repo: &RepoSpec) -> Result<RepoSnapshot, LoadError> {
        let repo = repo.clone();
        tokio::task::spawn_blocking(move || Self::load_blocking(&repo))
            .await
            .map_err(|e| LoadError::Unknown(format!("Task join error: {}", e)))?
    }
}

/// Hides every module artifact from the package list, as a package manager
/// does for a repository whose modular content is not marked as hotfixes.
fn apply_modular_filtering(snapshot: &mut RepoSnapshot) {
    let artifacts: BTreeSet<&str> = snapshot
        .modules
        .iter()
        .flat_map(|m| m.artifacts.iter().map(String::as_str))
        .collect();

    let mut filtered = BTreeSet::new();
    snapshot.packages.retain(|pkg| {
        let key = pkg.artifact_key();
        if artifacts.contains(key.as_str()) {
            filtered.insert(key);
            false
        } else {
            true
        }
    });

    if !filtered.is_empty() {
        info!(count = filtered.len(), "Hid modular packages of non-hotfix repository");
    }
    snapshot.filtered_artifacts = filtered;
}

fn into_record(
    pkg: PrimaryPackage,
    repo: &RepoSpec,
    files: Option<&mut HashMap<String, Vec<String>>>,
) -> Result<PackageRecord, LoadError> {
    let file_provides = match (files, pkg.pkgid()) {
        (Some(files), Some(pkgid)) => files.remove(pkgid).unwrap_or_default(),
        _ => pkg.files.clone(),
    };
    let base = pkg.location_base.as_deref().unwrap_or(&repo.location);
    let download_url = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        pkg.location_href.trim_start_matches('/')
    );

    let checksum = pkg.checksum.ok_or_else(|| {
        LoadError::invalid("primary.xml", format!("{} has no checksum", pkg.location_href))
    })?;

    Ok(PackageRecord {
        name: pkg.name,
        epoch: pkg.epoch,
        version: pkg.version,
        release: pkg.release,
        arch: pkg.arch,
        relative_path: pkg.location_href,
        source_rpm: pkg.source_rpm,
        checksum,
        license: pkg.license,
        requires: pkg.requires,
        provides: pkg.provides,
        file_provides,
        download_url,
        repo_id: repo.id.clone(),
    })
}

/// Maps a repository location to a directory. Network locations are refused.
fn resolve_location(location: &str) -> Result<PathBuf, LoadError> {
    if let Some(path) = location.strip_prefix("file://") {
        return Ok(PathBuf::from(path));
    }
    if location.contains("://") {
        return Err(LoadError::UnsupportedLocation(location.to_string()));
    }
    Ok(PathBuf::from(location))
}

/// Opens a metadata document, decompressing by file extension.
fn open_document(root: &Path, href: &str) -> Result<Box<dyn BufRead + Send>, LoadError> {
    let path = root.join(href);
    let file = File::open(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LoadError::MissingMetadata(path.display().to_string()),
        _ => LoadError::IoError(e),
    })?;

    let extension = path.extension().and_then(|s| s.to_str()).unwrap_or_default();
    let reader: Box<dyn BufRead + Send> = match extension {
        "gz" => Box::new(BufReader::new(flate2::read::GzDecoder::new(file))),
        "zst" => Box::new(BufReader::new(zstd::stream::read::Decoder::new(file)?)),
        "xml" | "yaml" => Box::new(BufReader::new(file)),
        _ => return Err(LoadError::UnsupportedCompression(href.to_string())),
    };
    Ok(reader)
}

/// Collects the attributes of an element, keyed by their qualified name.
pub(crate) fn attributes(e: &BytesStart<'_>) -> Result<HashMap<String, String>, LoadError> {
    let mut attrs = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const REPOMD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<repomd xmlns="http://linux.duke.edu/metadata/repo">
  <data type="primary"><location href="repodata/primary.xml.gz"/></data>
  <data type="filelists"><location href="repodata/filelists.xml.zst"/></data>
  <data type="modules"><location href="repodata/modules.yaml"/></data>
</repomd>"#;

    const PRIMARY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata xmlns="http://linux.duke.edu/metadata/common" xmlns:rpm="http://linux.duke.edu/metadata/rpm" packages="3">
<package type="rpm">
  <name>perl-DBI</name><arch>x86_64</arch>
  <version epoch="0" ver="1.641" rel="3.module_el8+332+132e4365"/>
  <checksum type="sha256" pkgid="YES">aaaa</checksum>
  <location href="Packages/perl-DBI-1.641-3.module_el8+332+132e4365.x86_64.rpm"/>
  <format>
    <rpm:license>GPL+ or Artistic</rpm:license>
    <rpm:sourcerpm>perl-DBI-1.641-3.module_el8+332+132e4365.src.rpm</rpm:sourcerpm>
  </format>
</package>
<package type="rpm">
  <name>perl-DBI</name><arch>src</arch>
  <version epoch="0" ver="1.641" rel="3.module_el8+332+132e4365"/>
  <checksum type="sha256" pkgid="YES">bbbb</checksum>
  <location href="Packages/perl-DBI-1.641-3.module_el8+332+132e4365.src.rpm"/>
  <format><rpm:license>GPL+ or Artistic</rpm:license><rpm:sourcerpm/></format>
</package>
<package type="rpm">
  <name>bash</name><arch>x86_64</arch>
  <version epoch="0" ver="4.4.19" rel="10.el8"/>
  <checksum type="sha256" pkgid="YES">cccc</checksum>
  <location href="Packages/bash-4.4.19-10.el8.x86_64.rpm"/>
  <format>
    <rpm:license>GPLv3+</rpm:license>
    <rpm:sourcerpm>bash-4.4.19-10.el8.src.rpm</rpm:sourcerpm>
    <file>/usr/bin/bash</file>
  </format>
</package>
</metadata>"#;

    const FILELISTS: &str = r#"<filelists packages="1">
<package pkgid="cccc" name="bash" arch="x86_64">
  <file>/usr/bin/bash</file><file>/usr/bin/sh</file>
</package>
</filelists>"#;

    const MODULES: &str = "---\ndocument: modulemd\nversion: 2\ndata:\n  name: perl-DBI\n  stream: \"1.641\"\n  version: 820\n  context: 16b3ab4d\n  arch: x86_64\n  artifacts:\n    rpms:\n    - perl-DBI-0:1.641-3.module_el8+332+132e4365.src\n    - perl-DBI-0:1.641-3.module_el8+332+132e4365.x86_64\n...\n";

    fn write_repo(dir: &Path) {
        let repodata = dir.join("repodata");
        std::fs::create_dir_all(&repodata).unwrap();
        std::fs::write(repodata.join("repomd.xml"), REPOMD).unwrap();

        let mut gz = flate2::write::GzEncoder::new(
            File::create(repodata.join("primary.xml.gz")).unwrap(),
            flate2::Compression::default(),
        );
        gz.write_all(PRIMARY.as_bytes()).unwrap();
        gz.finish().unwrap();

        let compressed = zstd::stream::encode_all(FILELISTS.as_bytes(), 3).unwrap();
        std::fs::write(repodata.join("filelists.xml.zst"), compressed).unwrap();

        std::fs::write(repodata.join("modules.yaml"), MODULES).unwrap();
    }

    #[test]
    fn test_load_local_repository() {
        let dir = tempfile::tempdir().unwrap();
        write_repo(dir.path());

        let location = dir.path().display().to_string();
        let snapshot = RepodataProvider::load_blocking(&RepoSpec::new(location.clone())).unwrap();

        assert_eq!(snapshot.packages.len(), 3);
        assert_eq!(snapshot.modules.len(), 1);
        assert!(snapshot.filtered_artifacts.is_empty());

        let bash = &snapshot.packages[2];
        assert_eq!(bash.file_name(), "bash-4.4.19-10.el8.x86_64.rpm");
        assert_eq!(bash.file_provides, vec!["/usr/bin/bash", "/usr/bin/sh"]);
        assert_eq!(
            bash.download_url,
            format!("{}/Packages/bash-4.4.19-10.el8.x86_64.rpm", location)
        );
        assert_eq!(bash.repo_id, crate::model::location_to_repo_id(&location));

        let srpm = &snapshot.packages[1];
        assert!(srpm.is_source());
        assert!(srpm.file_provides.is_empty());
    }

    #[test]
    fn test_file_url_location() {
        let dir = tempfile::tempdir().unwrap();
        write_repo(dir.path());

        let location = format!("file://{}", dir.path().display());
        let snapshot = RepodataProvider::load_blocking(&RepoSpec::new(location)).unwrap();
        assert_eq!(snapshot.packages.len(), 3);
    }

    #[test]
    fn test_modular_filtering_without_hotfixes() {
        let dir = tempfile::tempdir().unwrap();
        write_repo(dir.path());

        let repo = RepoSpec::new(dir.path().display().to_string()).with_hotfixes(false);
        let snapshot = RepodataProvider::load_blocking(&repo).unwrap();

        assert_eq!(snapshot.packages.len(), 1);
        assert_eq!(snapshot.packages[0].name, "bash");
        assert_eq!(snapshot.filtered_artifacts.len(), 2);
        assert!(snapshot
            .filtered_artifacts
            .contains("perl-DBI-0:1.641-3.module_el8+332+132e4365.x86_64"));
    }

    #[test]
    fn test_remote_location_is_rejected() {
        let result = RepodataProvider::load_blocking(&RepoSpec::new("https://mirror.example.org/os/"));
        assert!(matches!(result, Err(LoadError::UnsupportedLocation(_))));
    }

    #[test]
    fn test_missing_repomd() {
        let dir = tempfile::tempdir().unwrap();
        let result = RepodataProvider::load_blocking(&RepoSpec::new(dir.path().display().to_string()));
        assert!(matches!(result, Err(LoadError::MissingMetadata(_))));
    }

    #[test]
    fn test_unsupported_compression() {
        let dir = tempfile::tempdir().unwrap();
        let repodata = dir.path().join("repodata");
        std::fs::create_dir_all(&repodata).unwrap();
        std::fs::write(
            repodata.join("repomd.xml"),
            r#"<repomd><data type="primary"><location href="repodata/primary.xml.xz"/></data></repomd>"#,
        )
        .unwrap();
        std::fs::write(repodata.join("primary.xml.xz"), b"").unwrap();

        let result = RepodataProvider::load_blocking(&RepoSpec::new(dir.path().display().to_string()));
        assert!(matches!(result, Err(LoadError::UnsupportedCompression(_))));
    }

    #[tokio::test]
    async fn test_async_load() {
        let dir = tempfile::tempdir().unwrap();
        write_repo(dir.path());

        let provider = RepodataProvider::new();
        let snapshot = provider
            .load(&RepoSpec::new(dir.path().display().to_string()))
            .await
            .unwrap();
        assert_eq!(provider.provider_id(), "repodata");
        assert_eq!(snapshot.packages.len(), 3);
    }

    #[tokio::test]
    async fn test_index_over_local_repository() {
        use crate::xref::{IndexBuilder, XrefPipeline};
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        write_repo(dir.path());

        let pipeline = XrefPipeline::new(Arc::new(RepodataProvider::new()));
        let result = pipeline
            .run(
                vec![RepoSpec::new(dir.path().display().to_string())],
                &IndexBuilder::default(),
            )
            .await
            .unwrap();

        let index = &result.output.index;
        assert_eq!(index.len(), 3);
        let label = "perl-DBI:1.641:820:16b3ab4d:x86_64";
        for rpm in [
            "perl-DBI-1.641-3.module_el8+332+132e4365.x86_64.rpm",
            "perl-DBI-1.641-3.module_el8+332+132e4365.src.rpm",
        ] {
            assert_eq!(index.get(rpm).unwrap().modularitylabel.as_deref(), Some(label));
        }
        let bash = index.get("bash-4.4.19-10.el8.x86_64.rpm").unwrap();
        assert_eq!(bash.sha256, "cccc");
        assert_eq!(bash.srpm.as_deref(), Some("bash-4.4.19-10.el8.src.rpm"));
        assert_eq!(bash.modularitylabel, None);
    }
}
