//! Package record builders shared by the stage tests.

use crate::model::{basename, Checksum, ChecksumAlgorithm, PackageRecord};

/// Builds a record whose NEVRA is parsed from the file name
/// (`name-version-release.arch.rpm`).
fn record(path: &str, source_rpm: Option<&str>) -> PackageRecord {
    let stem = basename(path).trim_end_matches(".rpm");
    let (nvr, arch) = stem.rsplit_once('.').unwrap_or((stem, "noarch"));
    let mut parts = nvr.rsplitn(3, '-');
    let (release, version, name) = match (parts.next(), parts.next(), parts.next()) {
        (Some(r), Some(v), Some(n)) => (r, v, n),
        _ => ("", "", nvr),
    };

    PackageRecord {
        name: name.to_string(),
        epoch: 0,
        version: version.to_string(),
        release: release.to_string(),
        arch: arch.to_string(),
        relative_path: path.to_string(),
        source_rpm: source_rpm.map(str::to_string),
        checksum: Checksum {
            algorithm: ChecksumAlgorithm::Sha256,
            digest: format!("{:x}", path.len()),
        },
        license: "MIT".to_string(),
        requires: vec![],
        provides: vec![name.to_string()],
        file_provides: vec![],
        download_url: format!("file:///srv/repo/{path}"),
        repo_id: "srv_repo".to_string(),
    }
}

pub fn source(path: &str) -> PackageRecord {
    record(path, None)
}

pub fn binary(path: &str, source_rpm: Option<&str>) -> PackageRecord {
    record(path, source_rpm)
}

pub fn with_checksum(mut record: PackageRecord, digest: &str) -> PackageRecord {
    record.checksum.digest = digest.to_string();
    record
}
