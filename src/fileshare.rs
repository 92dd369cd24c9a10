//! File-sharing URI decoder (spec.md §4.4).
//!
//! Decodes the fixed-schema identifier embedded in message text or
//! gallery records: a type-class character, Base62-encoded type-specific
//! metadata, an opaque unique value, an 8-character lowercase-hex POSIX
//! timestamp, and a second opaque unique value.

use serde::Serialize;

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const BASE: u64 = 62;
const MIN_URI_LEN: usize = 30;

fn digit_value(c: u8) -> Option<u64> {
    ALPHABET.iter().position(|&a| a == c).map(|p| p as u64)
}

/// Decode a positional Base62 string (most-significant digit first).
pub fn base62_decode(s: &str) -> Option<u64> {
    let mut value: u64 = 0;
    for c in s.bytes() {
        value = value.checked_mul(BASE)?.checked_add(digit_value(c)?)?;
    }
    Some(value)
}

/// Encode `n` as Base62, left-padded with `'0'` to `width` characters.
/// Used only by tests to exercise the encode/decode round trip; the
/// decoder itself never needs to encode.
pub fn base62_encode(mut n: u64, width: usize) -> String {
    let mut digits = Vec::with_capacity(width);
    if n == 0 {
        digits.push(ALPHABET[0]);
    }
    while n > 0 {
        digits.push(ALPHABET[(n % BASE) as usize]);
        n /= BASE;
    }
    while digits.len() < width {
        digits.push(ALPHABET[0]);
    }
    digits.reverse();
    String::from_utf8(digits).unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContentClass {
    Image,
    Video,
    Audio,
    LottieSticker,
    Pdf,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContentSubtype {
    Regular,
    Snap,
    Sticker,
    GifAnimated,
    GifAnimatedSticker,
    Pts,
    PtsB,
    Ptt,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContentType {
    pub class: ContentClass,
    pub subtype: ContentSubtype,
}

impl ContentType {
    /// Canonical string form, e.g. `"image-regular"`, `"video-pts"`,
    /// `"lottie-sticker"`, `"pdf"`.
    pub fn as_str(&self) -> &'static str {
        use ContentClass::*;
        use ContentSubtype::*;
        match (self.class, self.subtype) {
            (Image, Regular) => "image-regular",
            (Image, Snap) => "image-snap",
            (Image, Sticker) => "image-sticker",
            (Image, GifAnimated) => "image-gif-animated",
            (Image, GifAnimatedSticker) => "image-gif-animated-sticker",
            (Image, Unknown) => "unknown",
            (Video, Regular) => "video-regular",
            (Video, Snap) => "video-snap",
            (Video, Pts) => "video-pts",
            (Video, PtsB) => "video-pts_b",
            (Video, Sticker) => "video-sticker",
            (Video, Unknown) => "unknown",
            (Audio, Regular) => "audio-regular",
            (Audio, Snap) => "audio-snap",
            (Audio, Ptt) => "audio-ptt",
            (Audio, Unknown) => "unknown",
            (LottieSticker, _) => "lottie-sticker",
            (Pdf, _) => "pdf",
            (Unknown, _) => "unknown",
            _ => "unknown",
        }
    }

    fn is_video(&self) -> bool {
        self.class == ContentClass::Video
    }

    fn is_pts_video(&self) -> bool {
        self.is_video() && matches!(self.subtype, ContentSubtype::Pts | ContentSubtype::PtsB)
    }
}

fn classify(c: u8) -> ContentType {
    use ContentClass::*;
    use ContentSubtype::*;
    let (class, subtype) = match c {
        b'0' => (Image, Regular),
        b'1' => (Image, Snap),
        b'2' => (Image, Sticker),
        b'3' => (Image, Unknown),
        b'4' => (Image, GifAnimated),
        b'5' => (Image, GifAnimatedSticker),
        b'6' => (Image, Unknown),
        b'7' => (Image, Unknown),
        b'8' => (Video, Regular),
        b'9' => (Video, Snap),
        b'A' => (Video, Pts),
        b'B' => (Video, PtsB),
        b'C' => (Video, Unknown),
        b'D' => (Video, Sticker),
        b'E' => (Video, Unknown),
        b'F' => (Video, Unknown),
        b'G' => (Audio, Regular),
        b'H' => (Audio, Snap),
        b'I' => (Audio, Ptt),
        b'J' => (Audio, Ptt),
        b'K' => (Audio, Unknown),
        b'M' => (Audio, Unknown),
        b'N' => (Audio, Unknown),
        b'L' => (LottieSticker, Unknown),
        b'S' => (Pdf, Unknown),
        _ => (ContentClass::Unknown, Unknown),
    };
    ContentType { class, subtype }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FileSharingMetadata {
    pub content_type: Option<&'static str>,
    pub timestamp: Option<String>,
    /// Audio/PTT duration, in whatever unit the positional Base62 field
    /// encodes (seconds, per the original client).
    pub duration: Option<u64>,
    pub width: Option<u16>,
    pub height: Option<u16>,
    /// Hex-formatted colour sample (up to 18 bits).
    pub color: Option<String>,
}

/// If `token` looks like a URL (`http...` or the sanitised `hxxp...`
/// form), return its last path segment; otherwise return it unchanged.
fn tail_segment(token: &str) -> &str {
    if token.starts_with("http") || token.starts_with("hxxp") || token.starts_with("fxx") {
        token.rsplit('/').next().unwrap_or(token)
    } else {
        token
    }
}

fn decode_pair(a: u8, b: u8) -> Option<u32> {
    let hi = digit_value(a)?;
    let lo = digit_value(b)?;
    Some((hi * BASE + lo) as u32)
}

/// Decode a file-sharing identifier per spec.md §4.4. Returns `None` if
/// the token (after stripping any URL wrapper) is shorter than the
/// minimum 30-character schema.
pub fn decode(raw: &str) -> Option<FileSharingMetadata> {
    let token = tail_segment(raw);
    if token.len() < MIN_URI_LEN {
        return None;
    }
    let bytes = token.as_bytes();
    let content_type = classify(bytes[0]);

    let timestamp = decode_timestamp(&token[22..30]);

    let mut meta = FileSharingMetadata {
        content_type: Some(content_type.as_str()),
        timestamp,
        duration: None,
        width: None,
        height: None,
        color: None,
    };

    match content_type.class {
        ContentClass::Audio => {
            meta.duration = base62_decode(&token[1..5]);
        }
        ContentClass::Image => {
            meta.width = decode_pair(bytes[1], bytes[2]);
            meta.height = decode_pair(bytes[3], bytes[4]);
            meta.color = decode_color(&token[5..8]);
        }
        ContentClass::Video => {
            meta.width = decode_pair(bytes[1], bytes[2]);
            meta.height = decode_pair(bytes[3], bytes[4]);
            if content_type.is_pts_video() {
                meta.color = decode_color(&token[5..8]);
            } else {
                meta.duration = base62_decode(&token[5..9]);
                meta.color = decode_color(&token[9..12]);
            }
        }
        _ => {}
    }

    Some(meta)
}

fn decode_color(s: &str) -> Option<String> {
    base62_decode(s).map(|v| format!("{:x}", v))
}

fn decode_timestamp(hex: &str) -> Option<String> {
    if hex.len() != 8 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let secs = u32::from_str_radix(hex, 16).ok()?;
    crate::primitives::format_epoch_seconds(secs as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base62_round_trip() {
        for n in [0u64, 1, 61, 62, 3843, 1_000_000, 62u64.pow(7) - 1] {
            let encoded = base62_encode(n, 11);
            assert_eq!(base62_decode(&encoded), Some(n));
        }
    }

    /// Builds a minimal 30-character token: `[0]` type, `[1..5)`
    /// type-specific, `[5..22)` unique-value-one (first few characters of
    /// which double as color/duration depending on type), `[22..30)` hex
    /// timestamp.
    fn make_token(class: char, type_field: &str, unique_rest: &str, hex_ts: &str) -> String {
        // `[1..22)` is 21 characters total; `type_field` covers the front
        // of it (possibly reaching into the color/duration sub-ranges),
        // the rest is opaque filler.
        let filler_len = 21 - type_field.len();
        format!(
            "{class}{type_field}{}{hex_ts}",
            &format!("{unique_rest:z<width$}", width = filler_len)[..filler_len]
        )
    }

    #[test]
    fn image_uri_decodes_width_height_timestamp() {
        // type '0' = image-regular, width=base62("AA"), height=base62("11"),
        // color=base62("bbT"), timestamp=hex("60b1d4c0").
        let uri = make_token('0', "AA11bbT", "", "60b1d4c0");
        assert_eq!(uri.len(), 30);
        let meta = decode(&uri).unwrap();
        assert_eq!(meta.content_type, Some("image-regular"));
        assert_eq!(meta.width, decode_pair(b'A', b'A'));
        assert_eq!(meta.height, decode_pair(b'1', b'1'));
        assert_eq!(meta.color, decode_color("bbT"));
        assert!(meta.timestamp.is_some());
    }

    #[test]
    fn below_minimum_length_returns_none() {
        assert!(decode("0AA11bbT60b1d4c0").is_none());
    }

    #[test]
    fn bad_hex_timestamp_is_null() {
        let uri = make_token('0', "AA11bbT", "", "zzzzzzzz");
        let meta = decode(&uri).unwrap();
        assert!(meta.timestamp.is_none());
    }

    #[test]
    fn url_wrapped_token_is_unwrapped() {
        let token = make_token('0', "AA11bbT", "", "60b1d4c0");
        let url = format!("hxxps://files.icq.net/get/{token}");
        let meta = decode(&url).unwrap();
        assert_eq!(meta.content_type, Some("image-regular"));
    }

    #[test]
    fn ptt_audio_decodes_duration() {
        let duration_field = base62_encode(42, 4);
        let uri = make_token('I', &duration_field, "", "60b1d4c0");
        let meta = decode(&uri).unwrap();
        assert_eq!(meta.content_type, Some("audio-ptt"));
        assert_eq!(meta.duration, Some(42));
    }
}
