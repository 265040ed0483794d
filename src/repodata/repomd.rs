//! `repodata/repomd.xml`: the table of contents of a repository.

use std::collections::HashMap;
use std::io::BufRead;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::attributes;
use crate::traits::LoadError;

/// Maps each metadata type (`primary`, `filelists`, `modules`, ...) to the
/// href of its document, relative to the repository root.
#[derive(Debug, Default, Clone)]
pub struct RepoMd {
    pub documents: HashMap<String, String>,
}

impl RepoMd {
    pub fn href(&self, kind: &str) -> Option<&str> {
        self.documents.get(kind).map(String::as_str)
    }
}

pub fn parse_repomd<R: BufRead>(input: R) -> Result<RepoMd, LoadError> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut repomd = RepoMd::default();
    let mut current: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"data" => {
                current = attributes(&e)?.remove("type");
            }
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"location" => {
                if let Some(kind) = &current {
                    let href = attributes(&e)?
                        .remove("href")
                        .ok_or_else(|| LoadError::invalid("repomd.xml", "location without href"))?;
                    repomd.documents.entry(kind.clone()).or_insert(href);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"data" => current = None,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if repomd.documents.is_empty() {
        return Err(LoadError::invalid("repomd.xml", "no data entries"));
    }
    Ok(repomd)
}
