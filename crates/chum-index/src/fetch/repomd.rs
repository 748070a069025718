//! `repodata/repomd.xml`: the table of contents of a repository

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::parsers::attribute;

/// One `<data>` entry of repomd.xml
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoData {
    /// `primary`, `other`, `filelists`, ...
    pub kind: String,
    /// Location relative to the repository root
    pub href: String,
    pub checksum_type: Option<String>,
    /// Checksum of the compressed file
    pub checksum: Option<String>,
}

/// Lists the data entries of a repomd.xml document.
/// Entries without a location are left out.
pub fn parse_repomd(bytes: &[u8]) -> Result<Vec<RepoData>, String> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut entries = Vec::new();
    let mut seen_root = false;

    let mut current: Option<RepoData> = None;
    let mut in_checksum = false;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| format!("at byte {}: {}", reader.buffer_position(), e))?;

        match event {
            Event::Start(e) if e.name().as_ref() == b"checksum" => {
                if let Some(data) = current.as_mut() {
                    data.checksum_type = attribute(&e, b"type").and_then(Result::ok);
                    in_checksum = true;
                }
            }
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"repomd" => seen_root = true,
                b"data" => {
                    current = Some(RepoData {
                        kind: attribute(&e, b"type").and_then(Result::ok).unwrap_or_default(),
                        href: String::new(),
                        checksum_type: None,
                        checksum: None,
                    });
                }
                // Self-closing, so there is no text to read
                b"checksum" => {
                    if let Some(data) = current.as_mut() {
                        data.checksum_type = attribute(&e, b"type").and_then(Result::ok);
                    }
                }
                b"location" => {
                    if let Some(data) = current.as_mut() {
                        data.href = attribute(&e, b"href").and_then(Result::ok).unwrap_or_default();
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_checksum => {
                if let (Some(data), Ok(text)) = (current.as_mut(), t.unescape()) {
                    let text = text.trim();
                    if !text.is_empty() {
                        data.checksum = Some(text.to_string());
                    }
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"checksum" => in_checksum = false,
                b"data" => {
                    if let Some(data) = current.take() {
                        if data.href.is_empty() {
                            log::debug!("repomd entry '{}' has no location", data.kind);
                        } else {
                            entries.push(data);
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err("no <repomd> root element".to_string());
    }
    Ok(entries)
}
