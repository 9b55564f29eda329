//! Text decoding with encoding sniffing.
//!
//! Uploads come from anywhere, so text is decoded by trying a fixed list of
//! encodings in order and keeping the first one that decodes without errors.
//! `latin1` maps every byte to a character, so the chain always ends in a result.

use std::borrow::Cow;

use encoding_rs::{DecoderResult, Encoding, GBK, UTF_8, UTF_16BE, UTF_16LE};

/// Encodings attempted by [`decode`], in order.
pub const ENCODINGS: [&str; 5] = ["utf-8", "gbk", "gb2312", "utf-16", "latin1"];

/// Text decoded from raw bytes, with the name of the encoding that worked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub encoding: &'static str,
}

/// Decode `bytes` with the first of [`ENCODINGS`] that accepts them.
pub fn decode(bytes: &[u8]) -> Decoded {
    decode_with(bytes, true)
}

/// Like [`decode`], for a prefix cut from a longer input: a character split by
/// the cut at the end is dropped rather than failing the encoding.
pub fn decode_prefix(bytes: &[u8]) -> Decoded {
    decode_with(bytes, false)
}

/// Decode `bytes` as UTF-8, dropping invalid sequences instead of replacing them.
pub fn decode_lossy(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// The first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

fn decode_with(bytes: &[u8], complete: bool) -> Decoded {
    ENCODINGS
        .iter()
        .find_map(|&encoding| {
            decode_as(encoding, bytes, complete).map(|text| Decoded {
                text: text.into_owned(),
                encoding,
            })
        })
        .unwrap_or_else(|| Decoded {
            text: latin1(bytes),
            encoding: "latin1",
        })
}

fn decode_as<'a>(encoding: &str, bytes: &'a [u8], complete: bool) -> Option<Cow<'a, str>> {
    let strict = |encoding: &'static Encoding, bytes: &'a [u8]| {
        if complete {
            encoding.decode_without_bom_handling_and_without_replacement(bytes)
        } else {
            strict_prefix(encoding, bytes).map(Cow::Owned)
        }
    };

    match encoding {
        "utf-8" => strict(UTF_8, bytes),
        // The WHATWG registry maps the gb2312 label onto GBK
        "gbk" | "gb2312" => strict(GBK, bytes),
        "utf-16" => match bytes {
            [0xFF, 0xFE, rest @ ..] => strict(UTF_16LE, rest),
            [0xFE, 0xFF, rest @ ..] => strict(UTF_16BE, rest),
            _ => strict(UTF_16LE, bytes),
        },
        "latin1" => Some(Cow::Owned(latin1(bytes))),
        _ => None,
    }
}

/// Strict decode that tolerates an incomplete sequence at the end of `bytes`.
fn strict_prefix(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let mut text = String::with_capacity(decoder.max_utf8_buffer_length_without_replacement(bytes.len())?);
    // Not the last chunk: a trailing partial character stays buffered in the decoder
    let (result, _) = decoder.decode_to_string_without_replacement(bytes, &mut text, false);
    matches!(result, DecoderResult::InputEmpty).then_some(text)
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}
