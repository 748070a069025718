//! Reader for `primary.xml.gz`

use quick_xml::events::{BytesStart, Event};
use std::io::Read;

use super::{attribute, open_gzip_xml, parse_error, XmlReader};
use crate::error::ParseError;

const ROOT: &str = "metadata";

/// One `<package>` element as it appears in the index, before any
/// interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub name: String,
    pub epoch: String,
    pub ver: String,
    pub rel: String,
    pub arch: String,
    pub checksum_type: Option<String>,
    pub checksum_value: Option<String>,
    pub summary: Option<String>,
    pub description: String,
    pub packager: Option<String>,
    pub url: Option<String>,
    pub license: Option<String>,
    /// Seconds since the epoch the file was added to the repository
    pub file_time: Option<i64>,
    pub build_time: Option<i64>,
    pub package_size: u64,
    pub installed_size: u64,
    /// Path of the RPM relative to the repository root
    pub location: String,
}

impl RawRecord {
    /// Non-empty paragraphs of the description, separated by blank lines
    pub fn paragraphs(&self) -> Vec<String> {
        let mut paragraphs = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for line in self.description.lines() {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    paragraphs.push(current.join("\n"));
                    current.clear();
                }
            } else {
                current.push(line);
            }
        }
        if !current.is_empty() {
            paragraphs.push(current.join("\n"));
        }

        paragraphs
    }

    /// The last paragraph of the description, where packagers put the
    /// YAML extension metadata
    pub fn extension_block(&self) -> Option<String> {
        self.paragraphs().pop()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    BeforeRoot,
    InRoot,
    Done,
}

/// Elements whose text content is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Name,
    Arch,
    Checksum,
    Summary,
    Description,
    Packager,
    Url,
    License,
}

impl TextField {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"name" => Some(TextField::Name),
            b"arch" => Some(TextField::Arch),
            b"checksum" => Some(TextField::Checksum),
            b"summary" => Some(TextField::Summary),
            b"description" => Some(TextField::Description),
            b"packager" => Some(TextField::Packager),
            b"url" => Some(TextField::Url),
            b"rpm:license" => Some(TextField::License),
            _ => None,
        }
    }
}

/// Fields collected while walking one `<package>` element
#[derive(Debug, Default)]
struct RecordBuilder {
    record: RawRecord,
    arch: Option<String>,
    location: Option<String>,
    /// Something in the record did not match the schema
    invalid: Option<String>,
}

impl RecordBuilder {
    fn reject(&mut self, reason: impl Into<String>) {
        if self.invalid.is_none() {
            self.invalid = Some(reason.into());
        }
    }

    fn attr(&mut self, element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
        match attribute(element, key) {
            Some(Ok(value)) => Some(value),
            Some(Err(())) => {
                self.reject(format!(
                    "undecodable attribute '{}'",
                    String::from_utf8_lossy(key)
                ));
                None
            }
            None => None,
        }
    }

    fn number<T: std::str::FromStr>(&mut self, element: &BytesStart<'_>, key: &[u8]) -> Option<T> {
        let value = self.attr(element, key)?;
        match value.trim().parse() {
            Ok(number) => Some(number),
            Err(_) => {
                self.reject(format!(
                    "non-numeric {} '{}'",
                    String::from_utf8_lossy(key),
                    value
                ));
                None
            }
        }
    }

    fn element(&mut self, element: &BytesStart<'_>) {
        match element.name().as_ref() {
            b"version" => {
                self.record.epoch = self.attr(element, b"epoch").unwrap_or_default();
                self.record.ver = self.attr(element, b"ver").unwrap_or_default();
                self.record.rel = self.attr(element, b"rel").unwrap_or_default();
            }
            b"checksum" => {
                self.record.checksum_type = self.attr(element, b"type");
            }
            b"time" => {
                self.record.file_time = self.number(element, b"file");
                self.record.build_time = self.number(element, b"build");
            }
            b"size" => {
                self.record.package_size = self.number(element, b"package").unwrap_or(0);
                self.record.installed_size = self.number(element, b"installed").unwrap_or(0);
            }
            b"location" => {
                self.location = self.attr(element, b"href");
            }
            _ => {}
        }
    }

    fn text(&mut self, field: TextField, text: &str) {
        let target = match field {
            TextField::Name => &mut self.record.name,
            TextField::Arch => self.arch.get_or_insert_with(String::new),
            TextField::Checksum => self.record.checksum_value.get_or_insert_with(String::new),
            TextField::Summary => self.record.summary.get_or_insert_with(String::new),
            TextField::Description => &mut self.record.description,
            TextField::Packager => self.record.packager.get_or_insert_with(String::new),
            TextField::Url => self.record.url.get_or_insert_with(String::new),
            TextField::License => self.record.license.get_or_insert_with(String::new),
        };
        target.push_str(text);
    }

    fn finish(mut self) -> Result<RawRecord, String> {
        if let Some(reason) = self.invalid {
            return Err(reason);
        }

        let arch = self.arch.map(|a| a.trim().to_string()).unwrap_or_default();
        if arch.is_empty() {
            return Err("missing <arch>".to_string());
        }
        let location = self.location.unwrap_or_default();
        if location.is_empty() {
            return Err("missing <location>".to_string());
        }

        self.record.arch = arch;
        self.record.location = location;
        self.record.name = self.record.name.trim().to_string();
        for value in [
            &mut self.record.checksum_value,
            &mut self.record.summary,
            &mut self.record.packager,
            &mut self.record.url,
            &mut self.record.license,
        ] {
            *value = value
                .take()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
        }

        Ok(self.record)
    }
}

/// Lazily yields the packages of a `primary.xml.gz` document.
///
/// Records that do not fit the schema are skipped and counted in
/// [`PrimaryReader::skipped`]. A container failure is yielded once as an
/// error, after which the iterator is exhausted. The reader makes a single
/// pass; to read the same document again, build a new reader.
pub struct PrimaryReader<R: Read> {
    reader: XmlReader<R>,
    buf: Vec<u8>,
    state: State,
    declared: Option<usize>,
    records: usize,
    skipped: usize,
}

impl<R: Read> PrimaryReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            reader: open_gzip_xml(input),
            buf: Vec::new(),
            state: State::BeforeRoot,
            declared: None,
            records: 0,
            skipped: 0,
        }
    }

    /// Records skipped so far because they did not fit the schema
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Records yielded so far
    pub fn records(&self) -> usize {
        self.records
    }

    /// Package count announced by the root element, if any
    pub fn declared(&self) -> Option<usize> {
        self.declared
    }

    fn fail(&mut self, err: ParseError) -> Option<Result<RawRecord, ParseError>> {
        self.state = State::Done;
        Some(Err(err))
    }

    /// Reads the body of a `<package>` element up to its end tag
    fn read_package(&mut self, package_type: Option<String>) -> Result<Result<RawRecord, String>, ParseError> {
        let mut builder = RecordBuilder::default();
        if package_type.as_deref().is_some_and(|t| t != "rpm") {
            builder.reject(format!("package type {:?}", package_type));
        }

        let mut buf = Vec::new();
        let mut current: Option<TextField> = None;
        let mut depth = 0usize;

        loop {
            let event = match self.reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(e) => return Err(parse_error(&self.reader, e)),
            };

            match event {
                Event::Start(e) => {
                    depth += 1;
                    builder.element(&e);
                    current = if depth == 1 || e.name().as_ref() == b"rpm:license" {
                        TextField::from_name(e.name().as_ref())
                    } else {
                        None
                    };
                }
                Event::Empty(e) => {
                    builder.element(&e);
                    current = None;
                }
                Event::Text(t) => {
                    if let Some(field) = current {
                        match t.unescape() {
                            Ok(text) => builder.text(field, &text),
                            Err(_) => builder.reject("undecodable text"),
                        }
                    }
                }
                Event::CData(c) => {
                    if let Some(field) = current {
                        match std::str::from_utf8(&c) {
                            Ok(text) => builder.text(field, text),
                            Err(_) => builder.reject("undecodable CDATA"),
                        }
                    }
                }
                Event::End(e) => {
                    current = None;
                    if depth == 0 {
                        if e.name().as_ref() == b"package" {
                            break;
                        }
                    } else {
                        depth -= 1;
                    }
                }
                Event::Eof => return Err(ParseError::Truncated(ROOT)),
                _ => {}
            }
            buf.clear();
        }

        Ok(builder.finish())
    }
}

impl<R: Read> Iterator for PrimaryReader<R> {
    type Item = Result<RawRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.state == State::Done {
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

            match (self.state, event) {
                (State::BeforeRoot, Event::Start(e)) if e.name().as_ref() == ROOT.as_bytes() => {
                    self.declared = attribute(&e, b"packages")
                        .and_then(Result::ok)
                        .and_then(|n| n.parse().ok());
                    self.state = State::InRoot;
                }
                (State::BeforeRoot, Event::Empty(e)) if e.name().as_ref() == ROOT.as_bytes() => {
                    self.state = State::Done;
                    return None;
                }
                (State::BeforeRoot, Event::Start(_) | Event::Empty(_)) => {
                    return self.fail(ParseError::MissingRoot(ROOT));
                }
                (State::BeforeRoot, Event::Eof) => {
                    return self.fail(ParseError::MissingRoot(ROOT));
                }
                (State::InRoot, Event::Start(e)) if e.name().as_ref() == b"package" => {
                    let package_type = attribute(&e, b"type").and_then(Result::ok);
                    match self.read_package(package_type) {
                        Ok(Ok(record)) => {
                            self.records += 1;
                            return Some(Ok(record));
                        }
                        Ok(Err(reason)) => {
                            self.skipped += 1;
                            log::debug!("Skipping index record: {}", reason);
                        }
                        Err(err) => return self.fail(err),
                    }
                }
                (State::InRoot, Event::Empty(e)) if e.name().as_ref() == b"package" => {
                    self.skipped += 1;
                    log::debug!("Skipping empty <package/> record");
                }
                (State::InRoot, Event::End(e)) if e.name().as_ref() == ROOT.as_bytes() => {
                    self.state = State::Done;
                    return None;
                }
                (State::InRoot, Event::Eof) => {
                    return self.fail(ParseError::Truncated(ROOT));
                }
                _ => {}
            }
        }
    }
}
