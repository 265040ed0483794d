//! `primary.xml`: one `<package>` per artifact with its NEVRA, checksum,
//! location and dependency lists.

use std::collections::HashMap;
use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::attributes;
use crate::model::{Checksum, ChecksumAlgorithm};
use crate::traits::LoadError;

const DOCUMENT: &str = "primary.xml";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimaryPackage {
    pub name: String,
    pub arch: String,
    pub epoch: u32,
    pub version: String,
    pub release: String,
    pub checksum: Option<Checksum>,
    pub location_href: String,
    pub location_base: Option<String>,
    pub license: String,
    pub source_rpm: Option<String>,
    pub requires: Vec<String>,
    pub provides: Vec<String>,
    /// File entries listed in primary itself (a subset of filelists).
    pub files: Vec<String>,
}

impl PrimaryPackage {
    /// Checksum digest, which is also the `pkgid` filelists refer to.
    pub fn pkgid(&self) -> Option<&str> {
        self.checksum.as_ref().map(|c| c.digest.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Name,
    Arch,
    Checksum,
    License,
    SourceRpm,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DepSection {
    Requires,
    Provides,
    Ignored,
}

pub fn parse_primary<R: BufRead>(input: R) -> Result<Vec<PrimaryPackage>, LoadError> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut packages = Vec::new();
    let mut current: Option<PrimaryPackage> = None;
    let mut field: Option<TextField> = None;
    let mut section: Option<DepSection> = None;
    let mut checksum_type = String::new();
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let local = e.local_name();
                match local.as_ref() {
                    b"package" => current = Some(PrimaryPackage::default()),
                    b"name" => field = Some(TextField::Name),
                    b"arch" => field = Some(TextField::Arch),
                    b"checksum" => {
                        checksum_type = attributes(&e)?.remove("type").unwrap_or_default();
                        field = Some(TextField::Checksum);
                    }
                    b"license" => field = Some(TextField::License),
                    b"sourcerpm" => field = Some(TextField::SourceRpm),
                    b"file" => field = Some(TextField::File),
                    b"requires" => section = Some(DepSection::Requires),
                    b"provides" => section = Some(DepSection::Provides),
                    b"conflicts" | b"obsoletes" | b"recommends" | b"suggests"
                    | b"supplements" | b"enhances" => section = Some(DepSection::Ignored),
                    _ => {
                        if let Some(pkg) = current.as_mut() {
                            apply_empty(pkg, &e, section)?;
                        }
                    }
                }
                text.clear();
            }
            Event::Empty(e) => {
                if let Some(pkg) = current.as_mut() {
                    apply_empty(pkg, &e, section)?;
                }
            }
            Event::Text(e) if field.is_some() => text.push_str(&e.unescape()?),
            Event::CData(e) if field.is_some() => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()))
            }
            Event::End(e) => {
                let local = e.local_name();
                match local.as_ref() {
                    b"package" => {
                        if let Some(pkg) = current.take() {
                            packages.push(finish(pkg)?);
                        }
                    }
                    b"requires" | b"provides" | b"conflicts" | b"obsoletes" | b"recommends"
                    | b"suggests" | b"supplements" | b"enhances" => section = None,
                    _ => {
                        if let (Some(pkg), Some(f)) = (current.as_mut(), field.take()) {
                            let value = std::mem::take(&mut text);
                            match f {
                                TextField::Name => pkg.name = value,
                                TextField::Arch => pkg.arch = value,
                                TextField::Checksum => {
                                    pkg.checksum = Some(Checksum {
                                        algorithm: ChecksumAlgorithm::from_name(&checksum_type),
                                        digest: value,
                                    })
                                }
                                TextField::License => pkg.license = value,
                                TextField::SourceRpm => {
                                    pkg.source_rpm = Some(value).filter(|s| !s.is_empty())
                                }
                                TextField::File => pkg.files.push(value),
                            }
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(packages)
}

/// Handles the attribute-only elements of a package: `version`, `location`
/// and dependency `entry` elements.
fn apply_empty(
    pkg: &mut PrimaryPackage,
    e: &BytesStart<'_>,
    section: Option<DepSection>,
) -> Result<(), LoadError> {
    match e.local_name().as_ref() {
        b"version" => {
            let mut attrs = attributes(e)?;
            pkg.epoch = match attrs.remove("epoch") {
                Some(epoch) if !epoch.is_empty() => epoch
                    .parse()
                    .map_err(|_| LoadError::invalid(DOCUMENT, format!("bad epoch '{epoch}'")))?,
                _ => 0,
            };
            pkg.version = attrs.remove("ver").unwrap_or_default();
            pkg.release = attrs.remove("rel").unwrap_or_default();
        }
        b"location" => {
            let mut attrs = attributes(e)?;
            pkg.location_href = attrs
                .remove("href")
                .ok_or_else(|| LoadError::invalid(DOCUMENT, "location without href"))?;
            pkg.location_base = attrs.remove("xml:base");
        }
        b"entry" => {
            let attrs = attributes(e)?;
            let rendered = render_dependency(&attrs);
            match section {
                Some(DepSection::Requires) => pkg.requires.push(rendered),
                Some(DepSection::Provides) => pkg.provides.push(rendered),
                _ => {}
            }
        }
        _ => {}
    }
    Ok(())
}

fn finish(pkg: PrimaryPackage) -> Result<PrimaryPackage, LoadError> {
    if pkg.name.is_empty() || pkg.arch.is_empty() {
        return Err(LoadError::invalid(DOCUMENT, "package without name or arch"));
    }
    if pkg.location_href.is_empty() {
        return Err(LoadError::invalid(
            DOCUMENT,
            format!("package {} has no location", pkg.name),
        ));
    }
    if pkg.checksum.is_none() {
        return Err(LoadError::invalid(
            DOCUMENT,
            format!("package {} has no checksum", pkg.location_href),
        ));
    }
    Ok(pkg)
}

/// Renders a dependency entry as `name [op [epoch:]version[-release]]`.
pub fn render_dependency(attrs: &HashMap<String, String>) -> String {
    let name = attrs.get("name").map(String::as_str).unwrap_or_default();
    let op = match attrs.get("flags").map(String::as_str) {
        Some("EQ") => "=",
        Some("LT") => "<",
        Some("GT") => ">",
        Some("LE") => "<=",
        Some("GE") => ">=",
        _ => return name.to_string(),
    };

    let mut evr = String::new();
    if let Some(epoch) = attrs.get("epoch").filter(|e| !e.is_empty() && e.as_str() != "0") {
        evr.push_str(epoch);
        evr.push(':');
    }
    if let Some(ver) = attrs.get("ver") {
        evr.push_str(ver);
    }
    if let Some(rel) = attrs.get("rel").filter(|r| !r.is_empty()) {
        evr.push('-');
        evr.push_str(rel);
    }
    format!("{name} {op} {evr}")
}
