//! Streaming readers for repository index documents
//!
//! Both `primary.xml.gz` and `other.xml.gz` are gzip-compressed XML. The
//! readers decode them incrementally and hand out one package at a time, so
//! a whole index never has to sit in memory as a tree.
//!
//! Failures are split in two levels:
//!   * a broken container (not gzip, truncated, malformed XML, wrong root)
//!     ends the iteration with a single [`ParseError`](crate::ParseError)
//!   * a broken record is skipped and counted

mod other;
mod primary;

pub use other::{ChangelogIndex, ChangelogReader, PackageChangelog};
pub use primary::{PrimaryReader, RawRecord};

use flate2::read::GzDecoder;
use quick_xml::events::BytesStart;
use quick_xml::Reader;
use std::io::{BufReader, Read};

use crate::error::ParseError;

pub(crate) type XmlReader<R> = Reader<BufReader<GzDecoder<R>>>;

/// Wraps compressed bytes in a gzip decoder and an XML reader
pub(crate) fn open_gzip_xml<R: Read>(input: R) -> XmlReader<R> {
    Reader::from_reader(BufReader::new(GzDecoder::new(input)))
}

/// Maps a reader error, telling decompression failures apart from bad XML
pub(crate) fn parse_error<B>(reader: &Reader<B>, err: quick_xml::Error) -> ParseError {
    match err {
        quick_xml::Error::Io(e) => ParseError::Decompress(e.to_string()),
        other => ParseError::Malformed {
            position: reader.buffer_position() as u64,
            message: other.to_string(),
        },
    }
}

/// Value of attribute `key`, unescaped.
///
/// `Some(Err(()))` means the attribute is present but cannot be decoded.
pub(crate) fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Option<Result<String, ()>> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| {
            attr.unescape_value()
                .map(|value| value.into_owned())
                .map_err(|_| ())
        })
}
