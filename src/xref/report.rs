//! Text and JSON renderings of stage outputs.

use std::io::{self, Write};

use super::index::PackageIndex;
use super::pairing::PairingMap;
use super::traits::Warning;
use crate::model::PackageRecord;

/// Each source path, then its binaries indented by four spaces.
pub fn render_pairs<W: Write>(pairs: &PairingMap, out: &mut W) -> io::Result<()> {
    for (srpm, rpms) in pairs {
        writeln!(out, "{srpm}")?;
        for rpm in rpms {
            writeln!(out, "    {rpm}")?;
        }
    }
    Ok(())
}

/// The index as one JSON document keyed by file name.
pub fn render_index<W: Write>(index: &PackageIndex, pretty: bool, out: &mut W) -> io::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, index)?;
    } else {
        serde_json::to_writer(&mut *out, index)?;
    }
    writeln!(out)
}

/// `name version release repoid arch`, one package per line.
pub fn render_summary<W: Write>(packages: &[PackageRecord], out: &mut W) -> io::Result<()> {
    for p in packages {
        writeln!(
            out,
            "{} {} {} {} {}",
            p.name, p.version, p.release, p.repo_id, p.arch
        )?;
    }
    Ok(())
}

pub fn render_warnings<W: Write>(warnings: &[Warning], out: &mut W) -> io::Result<()> {
    for warning in warnings {
        writeln!(out, "error: {warning}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xref::index::IndexBuilder;
    use crate::xref::pairing::PairingEngine;
    use crate::xref::testing::{binary, source};

    #[test]
    fn test_render_pairs() {
        let packages = vec![
            source("a/pkg-1.0-1.src.rpm"),
            binary("a/pkg-1.0-1.x86_64.rpm", Some("pkg-1.0-1.src.rpm")),
            binary("a/pkg-libs-1.0-1.x86_64.rpm", Some("pkg-1.0-1.src.rpm")),
        ];
        let report = PairingEngine::new().pair(&packages);

        let mut out = Vec::new();
        render_pairs(&report.pairs, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "a/pkg-1.0-1.src.rpm\n    a/pkg-1.0-1.x86_64.rpm\n    a/pkg-libs-1.0-1.x86_64.rpm\n"
        );
    }

    #[test]
    fn test_render_index_round_trips() {
        let packages = vec![binary("foo-1.0-1.x86_64.rpm", Some("foo-1.0-1.src.rpm"))];
        let report = IndexBuilder::default()
            .build(&crate::model::RepoSnapshot {
                packages,
                ..Default::default()
            })
            .unwrap();

        let mut out = Vec::new();
        render_index(&report.index, false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 1);

        let parsed: PackageIndex = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, report.index);
    }

    #[test]
    fn test_render_summary_and_warnings() {
        let packages = vec![binary("bash-5.2.15-3.fc38.x86_64.rpm", Some("bash.src.rpm"))];
        let mut out = Vec::new();
        render_summary(&packages, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "bash 5.2.15 3.fc38 srv_repo x86_64\n"
        );

        let mut out = Vec::new();
        render_warnings(
            &[Warning::MissingSourceReference {
                package: "x.rpm".to_string(),
            }],
            &mut out,
        )
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "error: x.rpm has no source RPM reference\n");
    }
}
