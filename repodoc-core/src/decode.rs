//! Best-effort text decoding for a single file.
//!
//! Encodings are tried in a fixed order and each attempt is strict: a record's content
//! is either a faithful decode under one encoding or the file is rejected. The chain
//! narrows as it goes, so every stage is reachable:
//!
//! | encoding     | rejects input when                                   |
//! |--------------|------------------------------------------------------|
//! | `utf-8`      | invalid UTF-8, or the input starts with a BOM        |
//! | `utf-8-sig`  | invalid UTF-8 after removing an optional BOM         |
//! | `latin1`     | any byte in `0x80..=0x9F` (C1 controls, not text)    |
//! | `cp1252`     | any of the five bytes cp1252 leaves undefined        |
//! | `iso-8859-1` | never                                                |

use serde::{Deserialize, Serialize};

use crate::contract::DecodeFailure;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "utf-8-sig")]
    Utf8Sig,
    #[serde(rename = "latin1")]
    Latin1,
    #[serde(rename = "cp1252")]
    Cp1252,
    #[serde(rename = "iso-8859-1")]
    Iso8859_1,
}

/// Priority order used by [`decode`].
pub const ENCODING_PRIORITY: [TextEncoding; 5] = [
    TextEncoding::Utf8,
    TextEncoding::Utf8Sig,
    TextEncoding::Latin1,
    TextEncoding::Cp1252,
    TextEncoding::Iso8859_1,
];

// cp1252 code points for 0x80..=0x9F; None marks the undefined slots.
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

impl TextEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf8Sig => "utf-8-sig",
            TextEncoding::Latin1 => "latin1",
            TextEncoding::Cp1252 => "cp1252",
            TextEncoding::Iso8859_1 => "iso-8859-1",
        }
    }

    /// Strict decode; `None` when this encoding does not fit the bytes.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => {
                if bytes.starts_with(UTF8_BOM) {
                    return None;
                }
                std::str::from_utf8(bytes).ok().map(str::to_owned)
            }
            TextEncoding::Utf8Sig => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                std::str::from_utf8(body).ok().map(str::to_owned)
            }
            TextEncoding::Latin1 => {
                if bytes.iter().any(|b| (0x80..=0x9F).contains(b)) {
                    return None;
                }
                Some(bytes.iter().map(|&b| b as char).collect())
            }
            TextEncoding::Cp1252 => bytes
                .iter()
                .map(|&b| match b {
                    0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize],
                    _ => Some(b as char),
                })
                .collect(),
            TextEncoding::Iso8859_1 => Some(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

/// Text decoded under a specific encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub encoding: TextEncoding,
}

/// Decode with the default priority list.
pub fn decode(bytes: &[u8]) -> Result<Decoded, DecodeFailure> {
    decode_with(bytes, &ENCODING_PRIORITY)
}

/// Decode trying `encodings` in order. The first encoding that fits wins; whitespace-only
/// results report [`DecodeFailure::NoContent`] rather than trying further encodings.
pub fn decode_with(bytes: &[u8], encodings: &[TextEncoding]) -> Result<Decoded, DecodeFailure> {
    for encoding in encodings {
        let Some(text) = encoding.decode(bytes) else {
            tracing::trace!(encoding = encoding.label(), "encoding rejected input");
            continue;
        };
        if text.trim().is_empty() {
            return Err(DecodeFailure::NoContent);
        }
        return Ok(Decoded {
            text,
            encoding: *encoding,
        });
    }
    Err(DecodeFailure::Undecodable)
}
