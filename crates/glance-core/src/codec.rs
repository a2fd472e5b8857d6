//! Versioned binary records for documents, reading progress and settings.
//!
//! Every record is `magic (u32 LE) | version (u8) | payload | checksum (u32 LE)`
//! with an FNV-1a checksum over everything before it. Integers are little
//! endian, strings are a `u32` byte length followed by UTF-8.

use alloc::{string::String, vec::Vec};
use core::fmt;

use crate::{
    document::{Document, DocumentId},
    pages::PageRange,
    settings::{Bookmark, ReaderSettings, ReadingProgress},
    text::Token,
};

const DOCUMENT_MAGIC: u32 = u32::from_le_bytes(*b"GDOC");
const PROGRESS_MAGIC: u32 = u32::from_le_bytes(*b"GPOS");
const SETTINGS_MAGIC: u32 = u32::from_le_bytes(*b"GSET");

const DOCUMENT_VERSION: u8 = 1;
const PROGRESS_VERSION: u8 = 1;
const SETTINGS_VERSION: u8 = 1;

const TOKEN_WORD: u8 = 0;
const TOKEN_PARAGRAPH: u8 = 1;

const SETTINGS_FLAG_AUTO_PAUSE: u8 = 0x01;
const SETTINGS_FLAG_STRIP: u8 = 0x02;

const HEADER_LEN: usize = 5;
const CHECKSUM_LEN: usize = 4;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CodecError {
    Truncated,
    BadMagic,
    UnsupportedVersion(u8),
    Corrupted,
    InvalidUtf8,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated => f.write_str("record truncated"),
            Self::BadMagic => f.write_str("record magic mismatch"),
            Self::UnsupportedVersion(version) => write!(f, "unsupported record version {version}"),
            Self::Corrupted => f.write_str("record checksum mismatch"),
            Self::InvalidUtf8 => f.write_str("record holds invalid utf-8"),
        }
    }
}

impl core::error::Error for CodecError {}

pub fn encode_document(document: &Document) -> Vec<u8> {
    let mut out = RecordWriter::new(DOCUMENT_MAGIC, DOCUMENT_VERSION);
    out.str(document.id.as_str());
    out.str(&document.title);
    out.u32(document.version);

    out.len(document.tokens.len());
    for token in &document.tokens {
        match token {
            Token::Word(text) => {
                out.u8(TOKEN_WORD);
                out.str(text);
            }
            Token::ParagraphBreak => out.u8(TOKEN_PARAGRAPH),
        }
    }

    match &document.page_ranges {
        Some(ranges) => {
            out.u8(1);
            out.len(ranges.len());
            for range in ranges {
                out.u32(range.page);
                out.len(range.start_word_index);
                out.len(range.word_count);
            }
        }
        None => out.u8(0),
    }

    out.finish()
}

pub fn decode_document(bytes: &[u8]) -> Result<Document, CodecError> {
    let mut input = RecordReader::open(bytes, DOCUMENT_MAGIC, DOCUMENT_VERSION)?;
    let id = DocumentId::new(input.string()?);
    let title = input.string()?;
    let version = input.u32()?;

    let token_count = input.len()?;
    let mut tokens = Vec::with_capacity(token_count.min(input.remaining()));
    for _ in 0..token_count {
        let token = match input.u8()? {
            TOKEN_WORD => Token::Word(input.string()?),
            TOKEN_PARAGRAPH => Token::ParagraphBreak,
            _ => return Err(CodecError::Corrupted),
        };
        tokens.push(token);
    }

    let page_ranges = match input.u8()? {
        0 => None,
        1 => {
            let range_count = input.len()?;
            let mut ranges = Vec::with_capacity(range_count.min(input.remaining()));
            for _ in 0..range_count {
                let page = input.u32()?;
                let start = input.len()?;
                let word_count = input.len()?;
                ranges.push(PageRange::new(page, start, word_count));
            }
            Some(ranges)
        }
        _ => return Err(CodecError::Corrupted),
    };

    input.expect_end()?;
    Ok(Document {
        id,
        title,
        version,
        tokens,
        page_ranges,
    })
}

pub fn encode_progress(progress: &ReadingProgress) -> Vec<u8> {
    let mut out = RecordWriter::new(PROGRESS_MAGIC, PROGRESS_VERSION);
    out.len(progress.token_index);
    out.len(progress.word_index);
    out.len(progress.bookmarks.len());
    for bookmark in &progress.bookmarks {
        out.len(bookmark.word_index);
        match &bookmark.note {
            Some(note) => {
                out.u8(1);
                out.str(note);
            }
            None => out.u8(0),
        }
    }
    out.finish()
}

pub fn decode_progress(bytes: &[u8]) -> Result<ReadingProgress, CodecError> {
    let mut input = RecordReader::open(bytes, PROGRESS_MAGIC, PROGRESS_VERSION)?;
    let token_index = input.len()?;
    let word_index = input.len()?;

    let bookmark_count = input.len()?;
    let mut bookmarks = Vec::with_capacity(bookmark_count.min(input.remaining()));
    for _ in 0..bookmark_count {
        let word_index = input.len()?;
        let note = match input.u8()? {
            0 => None,
            1 => Some(input.string()?),
            _ => return Err(CodecError::Corrupted),
        };
        bookmarks.push(Bookmark { word_index, note });
    }

    input.expect_end()?;
    Ok(ReadingProgress {
        token_index,
        word_index,
        bookmarks,
    })
}

pub fn encode_settings(settings: &ReaderSettings) -> Vec<u8> {
    let mut out = RecordWriter::new(SETTINGS_MAGIC, SETTINGS_VERSION);
    out.u16(settings.wpm);
    out.u16(settings.pause_intensity);
    let mut flags = 0u8;
    if settings.auto_pause {
        flags |= SETTINGS_FLAG_AUTO_PAUSE;
    }
    if settings.strip_headers_footers {
        flags |= SETTINGS_FLAG_STRIP;
    }
    out.u8(flags);
    out.u8(settings.chunk_size);
    out.str(&settings.ignore_phrases);
    out.finish()
}

pub fn decode_settings(bytes: &[u8]) -> Result<ReaderSettings, CodecError> {
    let mut input = RecordReader::open(bytes, SETTINGS_MAGIC, SETTINGS_VERSION)?;
    let wpm = input.u16()?;
    let pause_intensity = input.u16()?;
    let flags = input.u8()?;
    let chunk_size = input.u8()?;
    let ignore_phrases = input.string()?;
    input.expect_end()?;

    Ok(ReaderSettings {
        wpm,
        pause_intensity,
        auto_pause: flags & SETTINGS_FLAG_AUTO_PAUSE != 0,
        chunk_size,
        strip_headers_footers: flags & SETTINGS_FLAG_STRIP != 0,
        ignore_phrases,
    }
    .sanitized())
}

struct RecordWriter {
    buf: Vec<u8>,
}

impl RecordWriter {
    fn new(magic: u32, version: u8) -> Self {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&magic.to_le_bytes());
        buf.push(version);
        Self { buf }
    }

    fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    fn u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn len(&mut self, value: usize) {
        self.u32(value.min(u32::MAX as usize) as u32);
    }

    fn str(&mut self, value: &str) {
        self.len(value.len());
        self.buf.extend_from_slice(value.as_bytes());
    }

    fn finish(mut self) -> Vec<u8> {
        let checksum = checksum32(&self.buf);
        self.buf.extend_from_slice(&checksum.to_le_bytes());
        self.buf
    }
}

struct RecordReader<'a> {
    payload: &'a [u8],
    cursor: usize,
}

impl<'a> RecordReader<'a> {
    fn open(bytes: &'a [u8], magic: u32, version: u8) -> Result<Self, CodecError> {
        if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
            return Err(CodecError::Truncated);
        }
        if u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) != magic {
            return Err(CodecError::BadMagic);
        }

        let checksum_start = bytes.len() - CHECKSUM_LEN;
        let expected = u32::from_le_bytes([
            bytes[checksum_start],
            bytes[checksum_start + 1],
            bytes[checksum_start + 2],
            bytes[checksum_start + 3],
        ]);
        if checksum32(&bytes[..checksum_start]) != expected {
            return Err(CodecError::Corrupted);
        }
        if bytes[4] != version {
            return Err(CodecError::UnsupportedVersion(bytes[4]));
        }

        Ok(Self {
            payload: &bytes[HEADER_LEN..checksum_start],
            cursor: 0,
        })
    }

    fn remaining(&self) -> usize {
        self.payload.len() - self.cursor
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < len {
            return Err(CodecError::Truncated);
        }
        let slice = &self.payload[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, CodecError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn len(&mut self) -> Result<usize, CodecError> {
        Ok(self.u32()? as usize)
    }

    fn string(&mut self) -> Result<String, CodecError> {
        let len = self.len()?;
        let bytes = self.take(len)?;
        core::str::from_utf8(bytes)
            .map(String::from)
            .map_err(|_| CodecError::InvalidUtf8)
    }

    fn expect_end(&self) -> Result<(), CodecError> {
        if self.remaining() == 0 {
            Ok(())
        } else {
            Err(CodecError::Corrupted)
        }
    }
}

fn checksum32(bytes: &[u8]) -> u32 {
    let mut hash = 0x811C9DC5u32;
    for b in bytes {
        hash ^= *b as u32;
        hash = hash.wrapping_mul(16777619);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::{PageLine, PageLines, SegmentOptions};
    use alloc::vec;

    fn paged_document() -> Document {
        let pages = vec![
            PageLines {
                page_index: 0,
                page_height: 100.0,
                lines: vec![PageLine::new("Señor Quijote, hidalgo.", 50.0)],
            },
            PageLines {
                page_index: 1,
                page_height: 100.0,
                lines: vec![PageLine::new("Otra página.\n\nFin", 50.0)],
            },
        ];
        Document::from_pages("quijote", "Don Quijote", &pages, &SegmentOptions::default())
    }

    #[test]
    fn document_record_restores_stream_and_ranges() {
        let document = paged_document();
        let decoded = decode_document(&encode_document(&document)).unwrap();
        assert_eq!(decoded, document);
        assert!(decoded.tokens.contains(&Token::ParagraphBreak));
    }

    #[test]
    fn flipped_byte_is_reported() {
        let mut bytes = encode_document(&paged_document());
        let middle = bytes.len() / 2;
        bytes[middle] ^= 0x40;
        assert_eq!(decode_document(&bytes), Err(CodecError::Corrupted));
    }

    #[test]
    fn wrong_record_kind_is_rejected() {
        let bytes = encode_settings(&ReaderSettings::default());
        assert_eq!(decode_document(&bytes), Err(CodecError::BadMagic));
        assert_eq!(decode_progress(&bytes[..3]), Err(CodecError::Truncated));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut bytes = encode_progress(&ReadingProgress::default());
        bytes[4] = 9;
        let checksum_start = bytes.len() - CHECKSUM_LEN;
        let checksum = checksum32(&bytes[..checksum_start]);
        bytes[checksum_start..].copy_from_slice(&checksum.to_le_bytes());
        assert_eq!(decode_progress(&bytes), Err(CodecError::UnsupportedVersion(9)));
    }

    #[test]
    fn progress_keeps_bookmarks_and_notes() {
        let progress = ReadingProgress {
            token_index: 41,
            word_index: 37,
            bookmarks: vec![
                Bookmark {
                    word_index: 3,
                    note: None,
                },
                Bookmark {
                    word_index: 30,
                    note: Some(String::from("check this claim")),
                },
            ],
        };
        assert_eq!(decode_progress(&encode_progress(&progress)), Ok(progress));
    }

    #[test]
    fn settings_are_sanitized_on_load() {
        let settings = ReaderSettings {
            wpm: 450,
            pause_intensity: 120,
            auto_pause: false,
            chunk_size: 3,
            strip_headers_footers: false,
            ignore_phrases: String::from("Confidential"),
        };
        assert_eq!(decode_settings(&encode_settings(&settings)), Ok(settings.clone()));

        let wild = ReaderSettings {
            wpm: 9_000,
            ..settings
        };
        assert_eq!(decode_settings(&encode_settings(&wild)).unwrap().wpm, 1_200);
    }
}
