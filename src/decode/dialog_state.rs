//! Dialog-state decode loop (`_ste*`).
//!
//! Two tags open nested sub-blocks (spec.md §9 "nested sub-blocks",
//! modelled as pushing a new handler-table scope rather than a generic
//! recursive parser, since only these two tags ever nest):
//! - Tag 20 (`HEADS`): a run of head frames, each own-length-prefixed,
//!   decoded with this same table and collected under successive
//!   ordinals.
//! - Tag 7 (`LAST_MESSAGE_CONTENT_SIZE`): its field payload is itself a
//!   message-history sub-block (spec.md §4.2 "embedded message-history
//!   fields in dialog state"); its fields are flattened directly onto the
//!   dialog-state record.

use std::path::Path;

use crate::model::{DialogStateRecord, Fields};
use crate::stream::FieldIter;
use crate::tags::{self, Dest, Reader};
use crate::value::Value;

pub fn decode_block(blk: &[u8], record: &mut DialogStateRecord, artifact: &Path) {
    let mut iter = FieldIter::new(blk);
    for field in &mut iter {
        let Some(entry) = tags::dialog_state(field.tag) else { continue };
        match field.tag {
            20 => decode_heads(field.payload, &mut record.heads, artifact),
            7 => decode_embedded_messages(field.payload, &mut record.fields, artifact),
            _ => {
                if entry.dest != Dest::DialogState {
                    continue;
                }
                // LAST_MESSAGE_ID/YOURS_LAST_READ/THEIRS_LAST_READ/
                // THEIRS_LAST_DELIVERED/HIDDEN_MESSAGE_ID/LAST_READ_MENTION
                // are all `Reader::MessageId` but carry no record-boundary
                // meaning here — decode directly, `read_generic` doesn't
                // handle this reader.
                let value = match entry.reader {
                    Reader::Size | Reader::Unknown => continue,
                    Reader::MessageId => {
                        match crate::primitives::message_id(field.payload, 0, field.payload.len()) {
                            Ok((id, _)) => Ok(Some(id.map(Value::UInt).unwrap_or(Value::Null))),
                            Err(e) => Err(e),
                        }
                    }
                    _ => super::read_generic(entry.reader, field.payload, field.payload.len()),
                };
                match value {
                    Ok(Some(value)) => {
                        record.fields.insert(entry.name, value);
                    }
                    Ok(None) => {}
                    Err(e) => super::log_semantic_violation(artifact, field.tag, e),
                }
            }
        }
    }
    if iter.truncated() {
        super::log_structural_corruption(artifact, "field length ran past block end");
    }
}

/// Each head frame is `head_size:u32-LE` followed by exactly `head_size`
/// bytes of dialog-state fields. A head frame whose fields don't consume
/// exactly `head_size` bytes (the `FieldIter::truncated` signal) is a
/// desync; per spec.md §9 that abandons the *remaining* heads, not the
/// ones already decoded.
fn decode_heads(payload: &[u8], heads: &mut std::collections::BTreeMap<u32, Fields>, artifact: &Path) {
    let mut cursor = 0usize;
    let mut ordinal = 1u32;
    while cursor + 4 <= payload.len() {
        let head_size =
            u32::from_le_bytes(payload[cursor..cursor + 4].try_into().unwrap()) as usize;
        cursor += 4;
        if cursor + head_size > payload.len() {
            super::log_structural_corruption(artifact, "head frame size exceeds HEADS payload");
            break;
        }
        let head_buf = &payload[cursor..cursor + head_size];
        cursor += head_size;

        let mut head_fields = Fields::new();
        let mut iter = FieldIter::new(head_buf);
        for field in &mut iter {
            let Some(entry) = tags::dialog_state(field.tag) else { continue };
            if matches!(entry.reader, Reader::Size | Reader::Unknown) {
                continue;
            }
            match super::read_generic(entry.reader, field.payload, field.payload.len()) {
                Ok(Some(value)) => {
                    head_fields.insert(entry.name, value);
                }
                Ok(None) => {}
                Err(e) => super::log_semantic_violation(artifact, field.tag, e),
            }
        }
        if iter.truncated() {
            super::log_structural_corruption(artifact, "head frame desynchronised, abandoning remaining heads");
            break;
        }
        heads.insert(ordinal, head_fields);
        ordinal += 1;
    }
}

/// The tag-7 payload is message-history fields, not dialog-state fields —
/// delegate to the message-history table, flattening the result directly
/// onto `fields` (no record-boundary tracking needed: there's no tag 1
/// inside this payload in practice, just a flat set of message fields).
fn decode_embedded_messages(payload: &[u8], fields: &mut Fields, artifact: &Path) {
    let mut iter = FieldIter::new(payload);
    for field in &mut iter {
        let Some(entry) = tags::message_history(field.tag) else { continue };
        if matches!(entry.reader, Reader::Size | Reader::Unknown | Reader::MessageId) {
            continue;
        }
        let value = if field.tag == 3 {
            crate::primitives::timestamp(field.payload, 0, field.payload.len())
                .map(|(formatted, _raw, _)| formatted.map(crate::value::Value::Text))
        } else {
            super::read_generic(entry.reader, field.payload, field.payload.len())
        };
        match value {
            Ok(Some(v)) => {
                fields.insert(entry.name, v);
            }
            Ok(None) => {}
            Err(e) => super::log_semantic_violation(artifact, field.tag, e),
        }
    }
    if iter.truncated() {
        super::log_structural_corruption(artifact, "embedded message block truncated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(tag: u32, payload: &[u8]) -> Vec<u8> {
        let mut v = tag.to_le_bytes().to_vec();
        v.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        v.extend_from_slice(payload);
        v
    }

    #[test]
    fn heads_get_successive_ordinals() {
        let head1 = field(21, b"aimid-one");
        let head2 = field(21, b"aimid-two");
        let mut heads_payload = (head1.len() as u32).to_le_bytes().to_vec();
        heads_payload.extend(&head1);
        heads_payload.extend((head2.len() as u32).to_le_bytes());
        heads_payload.extend(&head2);

        let blk = field(20, &heads_payload);
        let mut record = DialogStateRecord::default();
        decode_block(&blk, &mut record, Path::new("test"));
        assert_eq!(record.heads.len(), 2);
        assert_eq!(
            record.heads[&1].get("HEAD_AIMID").and_then(crate::value::Value::as_text),
            Some("aimid-one")
        );
        assert_eq!(
            record.heads[&2].get("HEAD_AIMID").and_then(crate::value::Value::as_text),
            Some("aimid-two")
        );
    }

    #[test]
    fn unread_count_routes_to_fields() {
        let blk = field(1, &5u32.to_le_bytes());
        let mut record = DialogStateRecord::default();
        decode_block(&blk, &mut record, Path::new("test"));
        assert_eq!(record.fields.get("UNREAD_COUNT").and_then(crate::value::Value::as_uint), Some(5));
    }
}
