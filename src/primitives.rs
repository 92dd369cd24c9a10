//! Typed decoders over a byte slice with a moving cursor.
//!
//! Every reader takes the field's already-parsed `(tag, length)` plus the
//! block buffer and the cursor positioned just past the 8-byte field
//! header, and returns a value together with the advanced cursor. Failure
//! (truncation, ill-formed UTF-8, an unsupported length) is reported via
//! [`PrimitiveError`] and aborts the enclosing block, never the file —
//! callers are expected to catch it at the block-loop level.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::value::Value;

pub const MESSAGE_ID_NULL: u64 = u64::MAX;

#[derive(Debug, thiserror::Error)]
pub enum PrimitiveError {
    #[error("field truncated: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },
    #[error("unsupported integer width {0}")]
    UnsupportedWidth(usize),
    #[error("invalid utf-8 in text field")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

type Result<T> = std::result::Result<T, PrimitiveError>;

fn take<'a>(buf: &'a [u8], offset: usize, len: usize) -> Result<&'a [u8]> {
    buf.get(offset..offset + len).ok_or(PrimitiveError::Truncated {
        need: offset + len,
        have: buf.len(),
    })
}

/// Little-endian unsigned integer of width 1/2/4/8/12/16. Widths 8/12/16
/// are multi-word; scalar callers that want a single 64-bit value use
/// [`message_id`] instead, which is always exactly 8 bytes wide.
pub fn integer_le(buf: &[u8], offset: usize, len: usize) -> Result<(u64, usize)> {
    let bytes = take(buf, offset, len)?;
    let value = match len {
        1 => bytes[0] as u64,
        2 => u16::from_le_bytes(bytes.try_into().unwrap()) as u64,
        4 => u32::from_le_bytes(bytes.try_into().unwrap()) as u64,
        // 8/12/16-byte fields are tuples of u32s in the source; for the
        // scalar callers in this codebase (read_value/read_lookup_value)
        // only the first u32 is semantically used, so fold to that.
        8 | 12 | 16 => u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as u64,
        other => return Err(PrimitiveError::UnsupportedWidth(other)),
    };
    Ok((value, offset + len))
}

/// Big-endian unsigned integer (used only for `IS_OFFICIAL`, tag 69, and
/// the `ui2.stg` event-times payload).
pub fn integer_be(buf: &[u8], offset: usize, len: usize) -> Result<(u64, usize)> {
    let bytes = take(buf, offset, len)?;
    let value = match len {
        1 => bytes[0] as u64,
        2 => u16::from_be_bytes(bytes.try_into().unwrap()) as u64,
        4 => u32::from_be_bytes(bytes.try_into().unwrap()) as u64,
        8 => u64::from_be_bytes(bytes.try_into().unwrap()),
        other => return Err(PrimitiveError::UnsupportedWidth(other)),
    };
    Ok((value, offset + len))
}

/// 64-bit little-endian message id. The sentinel `u64::MAX` maps to `None`.
pub fn message_id(buf: &[u8], offset: usize, len: usize) -> Result<(Option<u64>, usize)> {
    let bytes = take(buf, offset, len.max(8))?;
    let raw = u64::from_le_bytes(bytes[0..8].try_into().unwrap());
    let id = if raw == MESSAGE_ID_NULL { None } else { Some(raw) };
    Ok((id, offset + len))
}

/// POSIX timestamp (4 or 8 bytes, little-endian). `0` and `0xFFFFFFFF`
/// (and any value chrono can't represent) map to `None`. Returns both the
/// canonical formatted string and the raw epoch-seconds value, since the
/// record-stream engine shadows the latter into `TIME_RAW`.
pub fn timestamp(buf: &[u8], offset: usize, len: usize) -> Result<(Option<String>, u64, usize)> {
    let bytes = take(buf, offset, len)?;
    let raw = match len {
        4 => u32::from_le_bytes(bytes.try_into().unwrap()) as u64,
        8 => u64::from_le_bytes(bytes.try_into().unwrap()),
        other => return Err(PrimitiveError::UnsupportedWidth(other)),
    };
    let formatted = format_epoch_seconds(raw);
    Ok((formatted, raw, offset + len))
}

/// Format a raw epoch-seconds value using the same null rules as
/// [`timestamp`], for callers (quote time, task end time, drafts) that
/// already have the raw integer.
pub fn format_epoch_seconds(raw: u64) -> Option<String> {
    if raw == 0 || raw == 0xFFFF_FFFF {
        return None;
    }
    let secs = i64::try_from(raw).ok()?;
    let dt = DateTime::<Utc>::from_timestamp(secs, 0)?;
    Some(dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// UTF-8 text. Ill-formed UTF-8 is a hard parse error (not tolerated),
/// per spec.md's primitive-reader table.
pub fn text(buf: &[u8], offset: usize, len: usize) -> Result<(String, usize)> {
    let bytes = take(buf, offset, len)?;
    let s = std::str::from_utf8(bytes)?.to_string();
    Ok((s, offset + len))
}

/// First byte, non-zero is true.
pub fn boolean(buf: &[u8], offset: usize, len: usize) -> Result<(bool, usize)> {
    let bytes = take(buf, offset, len.max(1))?;
    Ok((bytes[0] != 0, offset + len))
}

/// Named 7-bit message-flags map. Bits 0 (unused), 4 (patch), and 9
/// (restored patch) are decoded then discarded, matching
/// `read_message_flags` in the original source.
pub fn message_flags(buf: &[u8], offset: usize, len: usize) -> Result<(BTreeMap<&'static str, bool>, usize)> {
    let (raw, new_offset) = integer_le(buf, offset, len)?;
    let mut flags = BTreeMap::new();
    flags.insert("UNREAD", raw & (1 << 1) != 0);
    flags.insert("OUTGOING", raw & (1 << 2) != 0);
    flags.insert("INVISIBLE", raw & (1 << 3) != 0);
    flags.insert("DELETED", raw & (1 << 5) != 0);
    flags.insert("MODIFIED", raw & (1 << 6) != 0);
    flags.insert("UPDATED", raw & (1 << 7) != 0);
    flags.insert("CLEAR", raw & (1 << 8) != 0);
    Ok((flags, new_offset))
}

const FORMAT_BIT_NAMES: [(u32, &str); 11] = [
    (0, "bold"),
    (1, "italic"),
    (2, "underline"),
    (3, "strikethrough"),
    (4, "monospace"),
    (5, "link"),
    (6, "mention"),
    (7, "quote"),
    (8, "pre"),
    (9, "ordered_list"),
    (10, "unordered_list"),
];

/// Pipe-joined set of format-flag names from bits 0..10.
pub fn format_flags(buf: &[u8], offset: usize, len: usize) -> Result<(String, usize)> {
    let (raw, new_offset) = integer_le(buf, offset, len)?;
    let raw = raw as u32;
    let joined = FORMAT_BIT_NAMES
        .iter()
        .filter(|(bit, _)| raw & (1 << bit) != 0)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join("|");
    Ok((joined, new_offset))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMember {
    pub member_id: u32,
    pub name: String,
}

pub type ChatMembersMap = BTreeMap<u32, String>;

/// Concatenation of `(member_id:u32, name_len:u32, name:utf8)` tuples
/// until `length` bytes are consumed.
pub fn chat_members(buf: &[u8], offset: usize, len: usize) -> Result<(ChatMembersMap, usize)> {
    let end = offset + len;
    let mut cursor = offset;
    let mut members = BTreeMap::new();
    while cursor + 8 <= end {
        let member_id = u32::from_le_bytes(take(buf, cursor, 4)?.try_into().unwrap());
        let name_len = u32::from_le_bytes(take(buf, cursor + 4, 4)?.try_into().unwrap()) as usize;
        cursor += 8;
        let name = std::str::from_utf8(take(buf, cursor, name_len)?)?.to_string();
        cursor += name_len;
        members.insert(member_id, name);
    }
    Ok((members, end))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Four little-endian 32-bit values: (x, y, w, h). Fixed 16-byte payload.
pub fn resolution(buf: &[u8], offset: usize, len: usize) -> Result<(Resolution, usize)> {
    let bytes = take(buf, offset, len.max(16))?;
    let word = |i: usize| u32::from_le_bytes(bytes[i * 4..i * 4 + 4].try_into().unwrap());
    Ok((
        Resolution { x: word(0), y: word(1), w: word(2), h: word(3) },
        offset + len,
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventTime {
    pub event_id: u64,
    pub epoch: u64,
}

/// List of big-endian `(event_id:u64, epoch:u64)` pairs, `ui2.stg` only.
pub fn event_times(buf: &[u8], offset: usize, len: usize) -> Result<(Vec<EventTime>, usize)> {
    let end = offset + len;
    let mut cursor = offset;
    let mut out = Vec::new();
    while cursor + 16 <= end {
        let event_id = u64::from_be_bytes(take(buf, cursor, 8)?.try_into().unwrap());
        let epoch = u64::from_be_bytes(take(buf, cursor + 8, 8)?.try_into().unwrap());
        out.push(EventTime { event_id, epoch });
        cursor += 16;
    }
    Ok((out, end))
}

/// Framing-only: announces the size of a sub-block that follows. No
/// value, cursor still advances past the (already-consumed) header.
pub fn size(offset: usize) -> (Option<()>, usize) {
    (None, offset)
}

/// Tag whose semantics aren't understood (or are known to be
/// framing-only); payload is skipped without interpretation.
pub fn unknown(offset: usize, len: usize) -> usize {
    offset + len
}

/// Project a decoded message-flags map into a [`Value::Flags`].
pub fn flags_to_value(flags: BTreeMap<&'static str, bool>) -> Value {
    Value::Flags(flags)
}
