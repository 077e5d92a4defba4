//! Byte decoding fallback chain for file contents.
//!
//! Order: byte-order mark (UTF-8, UTF-16LE, UTF-16BE) → strict UTF-8 →
//! Latin-1. Latin-1 maps every byte, so it never fails. Forced (lossy) UTF-8
//! is left for a UTF-8 byte-order mark followed by invalid UTF-8; that is the
//! only decoding that does not round-trip.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8Bom,
    Utf16Le,
    Utf16Be,
    Utf8,
    Latin1,
    Utf8Lossy,
}

impl Encoding {
    pub fn label(self) -> &'static str {
        match self {
            Encoding::Utf8Bom => "utf-8 (bom)",
            Encoding::Utf16Le => "utf-16le",
            Encoding::Utf16Be => "utf-16be",
            Encoding::Utf8 => "utf-8",
            Encoding::Latin1 => "latin1",
            Encoding::Utf8Lossy => "utf-8 (converted)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub encoding: Encoding,
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

pub fn decode(bytes: &[u8]) -> Decoded {
    let decoded = if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        match std::str::from_utf8(rest) {
            Ok(text) => Decoded {
                text: text.to_string(),
                encoding: Encoding::Utf8Bom,
            },
            Err(_) => Decoded {
                text: String::from_utf8_lossy(rest).into_owned(),
                encoding: Encoding::Utf8Lossy,
            },
        }
    } else if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        Decoded {
            text: decode_utf16(rest, u16::from_le_bytes),
            encoding: Encoding::Utf16Le,
        }
    } else if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        Decoded {
            text: decode_utf16(rest, u16::from_be_bytes),
            encoding: Encoding::Utf16Be,
        }
    } else if let Ok(text) = std::str::from_utf8(bytes) {
        Decoded {
            text: text.to_string(),
            encoding: Encoding::Utf8,
        }
    } else {
        Decoded {
            text: bytes.iter().map(|&b| b as char).collect(),
            encoding: Encoding::Latin1,
        }
    };
    debug!(target: "text.encoding", encoding = decoded.encoding.label(), bytes = bytes.len(), "decoded");
    decoded
}

/// Encode text back into `encoding`, restoring any byte-order mark.
/// Characters Latin-1 cannot hold are written as `?`.
pub fn encode(text: &str, encoding: Encoding) -> Vec<u8> {
    match encoding {
        Encoding::Utf8 => text.as_bytes().to_vec(),
        // Forced UTF-8 only comes from a file that had the mark.
        Encoding::Utf8Bom | Encoding::Utf8Lossy => {
            let mut out = UTF8_BOM.to_vec();
            out.extend_from_slice(text.as_bytes());
            out
        }
        Encoding::Utf16Le => [0xFF, 0xFE]
            .into_iter()
            .chain(text.encode_utf16().flat_map(u16::to_le_bytes))
            .collect(),
        Encoding::Utf16Be => [0xFE, 0xFF]
            .into_iter()
            .chain(text.encode_utf16().flat_map(u16::to_be_bytes))
            .collect(),
        Encoding::Latin1 => text
            .chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
            .collect(),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks_exact(2).map(|c| unit([c[0], c[1]]));
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
