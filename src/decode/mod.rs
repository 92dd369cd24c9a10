//! Per-family decode loops. Each submodule walks one artifact family's
//! blocks with [`crate::stream::Blocks`]/[`crate::stream::FieldIter`] and
//! routes decoded values into the [`crate::model`] records, consulting
//! [`crate::tags`] for the (reader, name, destination) triple per tag.

pub mod call_log;
pub mod dialog_state;
pub mod draft;
pub mod gallery_cache;
pub mod gallery_state;
pub mod message_history;
pub mod my_info;
pub mod ui_settings;

use std::path::Path;

use crate::error::DecodeError;
use crate::primitives::{self, PrimitiveError};
use crate::tags::Reader;
use crate::value::Value;

/// Decode a field whose reader has no caller-visible side effect — i.e.
/// everything except `Size`, `Unknown`, `MessageId`, and `Time`, which the
/// block loops special-case themselves (record boundaries, raw-time
/// shadow, framing). Returns `None` for framing-only tags.
pub fn read_generic(
    reader: Reader,
    buf: &[u8],
    len: usize,
) -> Result<Option<Value>, PrimitiveError> {
    let v = match reader {
        Reader::Size | Reader::Unknown => return Ok(None),
        Reader::Bool => Value::Bool(primitives::boolean(buf, 0, len)?.0),
        Reader::Value => Value::UInt(primitives::integer_le(buf, 0, len)?.0),
        Reader::Text => Value::Text(primitives::text(buf, 0, len)?.0),
        Reader::MessageFlags => {
            Value::Flags(primitives::message_flags(buf, 0, len)?.0)
        }
        Reader::FormatFlags => Value::FlagList(primitives::format_flags(buf, 0, len)?.0),
        Reader::ChatMembers => Value::Members(primitives::chat_members(buf, 0, len)?.0),
        Reader::ChatEvent => {
            let (raw, _) = primitives::integer_le(buf, 0, len)?;
            Value::Text(crate::tags::chat_event_name(raw).to_string())
        }
        Reader::VoipEvent => {
            let (raw, _) = primitives::integer_le(buf, 0, len)?;
            Value::Text(crate::tags::voip_event_name(raw).to_string())
        }
        Reader::VoipDirection => {
            let (raw, _) = primitives::integer_le(buf, 0, len)?;
            Value::Text(crate::tags::voip_direction_name(raw).to_string())
        }
        Reader::Official => {
            let (raw, _) = primitives::integer_be(buf, 0, len.max(2))?;
            Value::Bool(raw != 0)
        }
        Reader::Resolution => Value::Resolution(primitives::resolution(buf, 0, len)?.0),
        Reader::EventTimes => Value::EventTimes(primitives::event_times(buf, 0, len)?.0),
        Reader::MessageId | Reader::Time => {
            unreachable!("MessageId/Time are handled by the block loop, not read_generic")
        }
    };
    Ok(Some(v))
}

/// Log a primitive-layer failure as a semantic violation and move on —
/// per spec.md §7, ill-formed field payloads skip the field, not the
/// block.
pub fn log_semantic_violation(artifact: &Path, tag: u32, err: impl std::fmt::Display) {
    DecodeError::SemanticViolation { artifact: artifact.to_path_buf(), tag, detail: err.to_string() }
        .log();
}

pub fn log_structural_corruption(artifact: &Path, detail: impl Into<String>) {
    DecodeError::StructuralCorruption { artifact: artifact.to_path_buf(), detail: detail.into() }
        .log();
}
