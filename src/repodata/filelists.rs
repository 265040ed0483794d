//! `filelists.xml`: the complete file list of every package, keyed by pkgid.

use std::collections::HashMap;
use std::io::BufRead;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::attributes;
use crate::traits::LoadError;

pub fn parse_filelists<R: BufRead>(input: R) -> Result<HashMap<String, Vec<String>>, LoadError> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut files: HashMap<String, Vec<String>> = HashMap::new();
    let mut pkgid: Option<String> = None;
    let mut current: Vec<String> = Vec::new();
    let mut in_file = false;
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"package" => {
                    pkgid = Some(attributes(&e)?.remove("pkgid").ok_or_else(|| {
                        LoadError::invalid("filelists.xml", "package without pkgid")
                    })?);
                    current.clear();
                }
                b"file" => {
                    in_file = true;
                    text.clear();
                }
                _ => {}
            },
            Event::Text(e) if in_file => text.push_str(&e.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"file" => {
                    in_file = false;
                    current.push(std::mem::take(&mut text));
                }
                b"package" => {
                    if let Some(id) = pkgid.take() {
                        // A repeated pkgid describes the same content; keep the first.
                        files.entry(id).or_insert_with(|| std::mem::take(&mut current));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(files)
}
