//! Tests for the index readers

use chum_index::{ChangelogReader, ParseError, PrimaryReader};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;

// ── fixtures ─────────────────────────────────────────────────────────────────

fn gzip(xml: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(xml.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

fn package(name: &str, arch: &str, extra: &str) -> String {
    format!(
        r#"<package type="rpm">
  <name>{name}</name>
  <arch>{arch}</arch>
  <version epoch="0" ver="1.2.0" rel="1"/>
  <checksum type="sha256" pkgid="YES">abcdef</checksum>
  <summary>Summary of {name}</summary>
  <description>A package.

Title: Fancy &amp; Co</description>
  <packager>Jane</packager>
  <url>https://example.org/{name}</url>
  <time file="1700000000" build="1699999000"/>
  <size package="1024" installed="4096" archive="5000"/>
  <location href="{arch}/{name}-1.2.0-1.{arch}.rpm"/>
  <format>
    <rpm:license>MIT</rpm:license>
    <rpm:provides>
      <rpm:entry name="{name}" flags="EQ" epoch="0" ver="1.2.0" rel="1"/>
    </rpm:provides>
    <file>/usr/bin/{name}</file>
  </format>
  {extra}
</package>"#
    )
}

fn primary(packages: &[String]) -> Vec<u8> {
    gzip(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata xmlns="http://linux.duke.edu/metadata/common" xmlns:rpm="http://linux.duke.edu/metadata/rpm" packages="{}">
{}
</metadata>"#,
        packages.len(),
        packages.join("\n")
    ))
}

// ── primary ──────────────────────────────────────────────────────────────────

#[test]
fn test_reads_all_fields() {
    let bytes = primary(&[package("foo", "aarch64", "")]);
    let mut reader = PrimaryReader::new(bytes.as_slice());

    let record = reader.next().unwrap().unwrap();
    assert_eq!(record.name, "foo");
    assert_eq!(record.arch, "aarch64");
    assert_eq!((record.epoch.as_str(), record.ver.as_str(), record.rel.as_str()), ("0", "1.2.0", "1"));
    assert_eq!(record.checksum_type.as_deref(), Some("sha256"));
    assert_eq!(record.checksum_value.as_deref(), Some("abcdef"));
    assert_eq!(record.summary.as_deref(), Some("Summary of foo"));
    assert_eq!(record.license.as_deref(), Some("MIT"));
    assert_eq!(record.url.as_deref(), Some("https://example.org/foo"));
    assert_eq!(record.file_time, Some(1_700_000_000));
    assert_eq!(record.package_size, 1024);
    assert_eq!(record.installed_size, 4096);
    assert_eq!(record.location, "aarch64/foo-1.2.0-1.aarch64.rpm");
    assert_eq!(record.extension_block().as_deref(), Some("Title: Fancy & Co"));

    assert!(reader.next().is_none());
    assert_eq!(reader.records(), 1);
    assert_eq!(reader.declared(), Some(1));
}

#[test]
fn test_bad_records_are_skipped() {
    let no_arch = package("foo", "aarch64", "").replace("<arch>aarch64</arch>", "");
    let bad_time = package("bar", "aarch64", "").replace("file=\"1700000000\"", "file=\"soon\"");
    let srpm = package("baz", "src", "").replace("type=\"rpm\"", "type=\"srpm\"");
    let good = package("qux", "noarch", "");
    let bytes = primary(&[no_arch, bad_time, srpm, good]);

    let mut reader = PrimaryReader::new(bytes.as_slice());
    let names: Vec<String> = reader
        .by_ref()
        .map(|r| r.unwrap().name)
        .collect();

    assert_eq!(names, vec!["qux".to_string()]);
    assert_eq!(reader.skipped(), 3);
}

#[test]
fn test_empty_index_yields_nothing() {
    let bytes = gzip(r#"<?xml version="1.0"?><metadata packages="0"/>"#);
    let mut reader = PrimaryReader::new(bytes.as_slice());
    assert!(reader.next().is_none());

    let bytes = primary(&[]);
    assert_eq!(PrimaryReader::new(bytes.as_slice()).count(), 0);
}

#[test]
fn test_reader_is_restartable_from_bytes() {
    let bytes = primary(&[package("foo", "aarch64", ""), package("bar", "aarch64", "")]);
    let first: Vec<_> = PrimaryReader::new(bytes.as_slice()).map(|r| r.unwrap()).collect();
    let second: Vec<_> = PrimaryReader::new(bytes.as_slice()).map(|r| r.unwrap()).collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

// ── container errors ─────────────────────────────────────────────────────────

fn single_error(bytes: &[u8]) -> ParseError {
    let mut reader = PrimaryReader::new(bytes);
    let err = match reader.next() {
        Some(Err(err)) => err,
        other => panic!("expected an error, got {:?}", other.map(|r| r.map(|rec| rec.name))),
    };
    assert!(reader.next().is_none(), "iteration must end after a container error");
    err
}

#[test]
fn test_not_gzip() {
    assert!(matches!(single_error(b"<metadata/>"), ParseError::Decompress(_)));
}

#[test]
fn test_truncated_stream() {
    let bytes = primary(&[package("foo", "aarch64", "")]);
    let cut = &bytes[..bytes.len() / 2];
    let mut reader = PrimaryReader::new(cut);
    let results: Vec<_> = reader.by_ref().collect();
    assert!(results.iter().any(|r| r.is_err()));
    assert!(reader.next().is_none());
}

#[test]
fn test_wrong_root() {
    let bytes = gzip("<html><body>Not found</body></html>");
    assert!(matches!(single_error(&bytes), ParseError::MissingRoot("metadata")));
}

#[test]
fn test_missing_end_of_document() {
    let bytes = gzip(&format!("<metadata>{}", package("foo", "aarch64", "")));
    let mut reader = PrimaryReader::new(bytes.as_slice());
    assert!(reader.next().unwrap().is_ok());
    assert!(matches!(reader.next(), Some(Err(_))));
    assert!(reader.next().is_none());
}

#[test]
fn test_zero_bytes_is_an_error() {
    let mut reader = PrimaryReader::new(&b""[..]);
    assert!(matches!(reader.next(), Some(Err(_))));
}

// ── changelogs ───────────────────────────────────────────────────────────────

const OTHER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<otherdata xmlns="http://linux.duke.edu/metadata/other" packages="2">
<package pkgid="1" name="foo" arch="aarch64">
  <version epoch="0" ver="1.2.0" rel="1"/>
  <changelog author="Jane Doe &lt;jane@example.org&gt; - 1.1.0-1" date="1600000000">- Older</changelog>
  <changelog author="Jane Doe &lt;jane@example.org&gt; - 1.2.0-1" date="1700000000">- Newer</changelog>
  <changelog author="Broken - 0.1-1" date="yesterday">- Dropped</changelog>
</package>
<package pkgid="2" name="bar" arch="noarch">
  <version epoch="0" ver="2.0" rel="1"/>
</package>
</otherdata>"#;

#[test]
fn test_changelog_index() {
    let bytes = gzip(OTHER);
    let index = ChangelogReader::new(bytes.as_slice()).into_index().unwrap();

    let foo = &index[&("foo".to_string(), "aarch64".to_string())];
    assert_eq!(foo.len(), 2);
    assert_eq!(foo[1].author, "Jane Doe <jane@example.org>");
    assert_eq!(foo[1].version, "1.2.0-1");
    assert_eq!(foo[1].text, "- Newer");
    assert!(index[&("bar".to_string(), "noarch".to_string())].is_empty());
}

#[test]
fn test_changelog_skips_unreadable_dates() {
    let bytes = gzip(OTHER);
    let mut reader = ChangelogReader::new(bytes.as_slice());
    let total: usize = reader.by_ref().map(|c| c.unwrap().entries.len()).sum();
    assert_eq!(total, 2);
    assert_eq!(reader.skipped(), 1);
}

#[test]
fn test_changelog_wrong_root() {
    let bytes = gzip("<metadata/>");
    assert!(ChangelogReader::new(bytes.as_slice()).into_index().is_err());
}
