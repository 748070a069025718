//! Reader for `other.xml.gz` (changelogs)

use chrono::{DateTime, Utc};
use chum_core::ChangelogEntry;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::io::Read;

use super::{attribute, open_gzip_xml, parse_error, XmlReader};
use crate::error::ParseError;

const ROOT: &str = "otherdata";

/// Changelog entries keyed by (name, arch)
pub type ChangelogIndex = HashMap<(String, String), Vec<ChangelogEntry>>;

/// Changelog of one package of the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageChangelog {
    pub name: String,
    pub arch: String,
    pub entries: Vec<ChangelogEntry>,
}

/// Pending `<changelog>` element
struct OpenEntry {
    author: String,
    timestamp: Option<DateTime<Utc>>,
    text: String,
}

/// Lazily yields per-package changelogs of an `other.xml.gz` document.
///
/// Same failure rules as [`PrimaryReader`](super::PrimaryReader): entries
/// with an unreadable date are skipped and counted, a broken container ends
/// the iteration with one error.
pub struct ChangelogReader<R: Read> {
    reader: XmlReader<R>,
    buf: Vec<u8>,
    started: bool,
    done: bool,
    skipped: usize,
}

impl<R: Read> ChangelogReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            reader: open_gzip_xml(input),
            buf: Vec::new(),
            started: false,
            done: false,
            skipped: 0,
        }
    }

    /// Changelog entries skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Reads the whole document into an index.
    ///
    /// Packages appearing more than once have their entries appended.
    pub fn into_index(self) -> Result<ChangelogIndex, ParseError> {
        let mut index = ChangelogIndex::new();
        for changelog in self {
            let changelog = changelog?;
            index
                .entry((changelog.name, changelog.arch))
                .or_default()
                .extend(changelog.entries);
        }
        Ok(index)
    }

    fn fail(&mut self, err: ParseError) -> Option<Result<PackageChangelog, ParseError>> {
        self.done = true;
        Some(Err(err))
    }

    fn read_package(&mut self, name: String, arch: String) -> Result<PackageChangelog, ParseError> {
        let mut buf = Vec::new();
        let mut entries = Vec::new();
        let mut open: Option<OpenEntry> = None;

        loop {
            let event = match self.reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(e) => return Err(parse_error(&self.reader, e)),
            };

            match event {
                Event::Start(e) if e.name().as_ref() == b"changelog" => {
                    let author = attribute(&e, b"author").and_then(Result::ok).unwrap_or_default();
                    let timestamp = attribute(&e, b"date")
                        .and_then(Result::ok)
                        .and_then(|date| date.trim().parse::<i64>().ok())
                        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
                    open = Some(OpenEntry {
                        author,
                        timestamp,
                        text: String::new(),
                    });
                }
                Event::Text(t) => {
                    if let Some(entry) = open.as_mut() {
                        match t.unescape() {
                            Ok(text) => entry.text.push_str(&text),
                            Err(_) => entry.timestamp = None,
                        }
                    }
                }
                Event::End(e) if e.name().as_ref() == b"changelog" => {
                    if let Some(entry) = open.take() {
                        match entry.timestamp {
                            Some(ts) => entries.push(ChangelogEntry::new(
                                &entry.author,
                                ts,
                                entry.text.trim(),
                            )),
                            None => {
                                self.skipped += 1;
                                log::debug!("Skipping changelog entry of {} without a readable date", name);
                            }
                        }
                    }
                }
                Event::End(e) if e.name().as_ref() == b"package" => break,
                Event::Eof => return Err(ParseError::Truncated(ROOT)),
                _ => {}
            }
            buf.clear();
        }

        Ok(PackageChangelog {
            name,
            arch,
            entries,
        })
    }
}

impl<R: Read> Iterator for ChangelogReader<R> {
    type Item = Result<PackageChangelog, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event.into_owned(),
                Err(e) => {
                    let err = parse_error(&self.reader, e);
                    return self.fail(err);
                }
            };

            match event {
                Event::Start(e) if !self.started => {
                    if e.name().as_ref() != ROOT.as_bytes() {
                        return self.fail(ParseError::MissingRoot(ROOT));
                    }
                    self.started = true;
                }
                Event::Empty(e) if !self.started => {
                    if e.name().as_ref() != ROOT.as_bytes() {
                        return self.fail(ParseError::MissingRoot(ROOT));
                    }
                    self.done = true;
                }
                Event::Start(e) if e.name().as_ref() == b"package" => {
                    let name = attribute(&e, b"name").and_then(Result::ok).unwrap_or_default();
                    let arch = attribute(&e, b"arch").and_then(Result::ok).unwrap_or_default();
                    match self.read_package(name, arch) {
                        Ok(changelog) => return Some(Ok(changelog)),
                        Err(err) => return self.fail(err),
                    }
                }
                Event::End(e) if e.name().as_ref() == ROOT.as_bytes() => {
                    self.done = true;
                }
                Event::Eof => {
                    let err = if self.started {
                        ParseError::Truncated(ROOT)
                    } else {
                        ParseError::MissingRoot(ROOT)
                    };
                    return self.fail(err);
                }
                _ => {}
            }
        }
    }
}
