//! Message-history decode loop (`_db*`), reused verbatim for
//! `call_log.cache` (see [`super::call_log`]) per spec.md §3.
//!
//! Shadow state — the scratch text cell and "current message id" — lives
//! on the stack of [`decode_block`], not on any persistent struct, per
//! spec.md §9 "shadow state across fields is local to one pass over one
//! block".

use std::path::Path;

use crate::model::MessageRecord;
use crate::primitives::MESSAGE_ID_NULL;
use crate::stream::FieldIter;
use crate::tags::{self, Dest, Reader};
use crate::value::Value;

use std::collections::BTreeMap;

const DELETED_MARKER: &str = "Message was deleted";

/// Decode one block's fields into `records`, keyed by message id.
/// `table` is swappable so call-log decoding can reuse this loop with the
/// same tag table but a different artifact path for error attribution.
pub fn decode_block(
    blk: &[u8],
    table: fn(u32) -> Option<tags::TagEntry>,
    records: &mut BTreeMap<u64, MessageRecord>,
    artifact: &Path,
) {
    let mut current_mid: Option<u64> = None;
    let mut text_scratch: Option<String> = None;
    let mut iter = FieldIter::new(blk);

    for field in &mut iter {
        let Some(entry) = table(field.tag) else { continue };

        match entry.reader {
            // Tag 1 is the *only* record boundary within a block
            // (spec.md §4.2). PREVIOUS_MESSAGE_ID_WITH_ (13) and
            // QUOTE_MESSAGE_ID (36) are also `Reader::MessageId` but are
            // plain referenced-id values, not boundaries — handled below.
            Reader::MessageId if field.tag == 1 => {
                let decoded = crate::primitives::message_id(field.payload, 0, field.payload.len());
                let new_mid = match decoded {
                    Ok((id, _)) => id,
                    Err(e) => {
                        super::log_semantic_violation(artifact, field.tag, e);
                        continue;
                    }
                };
                match new_mid {
                    None => {
                        // sentinel: record closes without entering the park map.
                        current_mid = None;
                    }
                    Some(mid) => {
                        current_mid = Some(mid);
                        let record = records.entry(mid).or_default();
                        if let Some(text) = text_scratch.take() {
                            apply_text(record, text);
                        }
                    }
                }
            }
            Reader::MessageId => {
                let Some(mid) = current_mid else { continue };
                match crate::primitives::message_id(field.payload, 0, field.payload.len()) {
                    Ok((id, _)) => {
                        let value = id.map(Value::UInt).unwrap_or(Value::Null);
                        let record = records.entry(mid).or_default();
                        match entry.dest {
                            Dest::Voip => {
                                record.voip.get_or_insert_with(Default::default).insert(entry.name, value);
                            }
                            Dest::Message => {
                                record.message.insert(entry.name, value);
                            }
                            _ => {}
                        }
                    }
                    Err(e) => super::log_semantic_violation(artifact, field.tag, e),
                }
            }
            Reader::Time => {
                let Some(mid) = current_mid else { continue };
                let decoded = crate::primitives::timestamp(field.payload, 0, field.payload.len());
                match decoded {
                    Ok((formatted, raw, _)) => {
                        let record = records.entry(mid).or_default();
                        record.message.insert(
                            "TIME",
                            formatted.map(Value::Text).unwrap_or(Value::Null),
                        );
                        record.message.insert("TIME_RAW", Value::UInt(raw));
                    }
                    Err(e) => super::log_semantic_violation(artifact, field.tag, e),
                }
            }
            _ if field.tag == 5 => {
                // TEXT: scratch only, never routed directly.
                match crate::primitives::text(field.payload, 0, field.payload.len()) {
                    Ok((text, _)) => text_scratch = Some(text),
                    Err(e) => super::log_semantic_violation(artifact, field.tag, e),
                }
            }
            Reader::MessageFlags => {
                let Some(mid) = current_mid else { continue };
                match crate::primitives::message_flags(field.payload, 0, field.payload.len()) {
                    Ok((flags, _)) => {
                        let outgoing = *flags.get("OUTGOING").unwrap_or(&false);
                        let record = records.entry(mid).or_default();
                        record.message.insert("FLAGS", Value::Flags(flags));
                        record.message.insert(
                            "DIRECTION",
                            Value::Text(
                                if outgoing { "OUTGOING" } else { "INCOMING" }.to_string(),
                            ),
                        );
                    }
                    Err(e) => super::log_semantic_violation(artifact, field.tag, e),
                }
            }
            Reader::Size | Reader::Unknown => {}
            _ => {
                let Some(mid) = current_mid else { continue };
                match super::read_generic(entry.reader, field.payload, field.payload.len()) {
                    Ok(Some(value)) => {
                        let record = records.entry(mid).or_default();
                        match entry.dest {
                            Dest::Voip => {
                                record.voip.get_or_insert_with(Default::default).insert(entry.name, value);
                            }
                            Dest::Message => {
                                record.message.insert(entry.name, value);
                            }
                            _ => {}
                        }
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

/// Write the scratch text into `MESSAGE.TEXT`, coalescing with a newline
/// if a different value is already present, and flag the deletion
/// marker (spec.md §4.2 "Text accumulation").
fn apply_text(record: &mut MessageRecord, text: String) {
    if text == DELETED_MARKER {
        record.message.insert("DELETED", Value::Bool(true));
    }
    match record.message.get("TEXT").and_then(Value::as_text) {
        Some(existing) if existing != text => {
            let combined = format!("{existing}\n{text}");
            record.message.insert("TEXT", Value::Text(combined));
        }
        Some(_) => {}
        None => {
            record.message.insert("TEXT", Value::Text(text));
        }
    }
}

/// Message-id sentinel (`u64::MAX`, 8 bytes of `0xFF`) closes without
/// opening a record — spec.md §8.
pub const MESSAGE_ID_SENTINEL_BYTES: [u8; 8] = (MESSAGE_ID_NULL).to_le_bytes();

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
    fn minimal_message_sets_text_and_time() {
        let mut blk = field(1, &1u64.to_le_bytes());
        blk.extend(field(5, b"hello"));
        blk.extend(field(3, &[0x00, 0x10, 0x20, 0x60]));
        let mut records = BTreeMap::new();
        decode_block(&blk, tags::message_history, &mut records, Path::new("test"));
        let rec = &records[&1];
        assert_eq!(rec.message.get("TEXT").and_then(Value::as_text), Some("hello"));
        assert!(rec.message.contains_key("TIME_RAW"));
    }

    #[test]
    fn deleted_marker_sets_flag() {
        let mut blk = field(1, &1u64.to_le_bytes());
        blk.extend(field(5, DELETED_MARKER.as_bytes()));
        let mut records = BTreeMap::new();
        decode_block(&blk, tags::message_history, &mut records, Path::new("test"));
        assert_eq!(records[&1].message.get("DELETED").and_then(Value::as_bool), Some(true));
    }

    #[test]
    fn sentinel_message_id_closes_without_record() {
        let blk = field(1, &MESSAGE_ID_SENTINEL_BYTES);
        let mut records = BTreeMap::new();
        decode_block(&blk, tags::message_history, &mut records, Path::new("test"));
        assert!(records.is_empty());
    }

    #[test]
    fn unknown_tag_does_not_disturb_siblings() {
        let mut blk = field(1, &1u64.to_le_bytes());
        blk.extend(field(9999, b"xyz"));
        blk.extend(field(5, b"hello"));
        let mut records = BTreeMap::new();
        decode_block(&blk, tags::message_history, &mut records, Path::new("test"));
        assert_eq!(records[&1].message.get("TEXT").and_then(Value::as_text), Some("hello"));
    }

    #[test]
    fn direction_propagation() {
        let mut blk = field(1, &1u64.to_le_bytes());
        blk.extend(field(2, &(1u32 << 2).to_le_bytes()));
        let mut records = BTreeMap::new();
        decode_block(&blk, tags::message_history, &mut records, Path::new("test"));
        assert_eq!(
            records[&1].message.get("DIRECTION").and_then(Value::as_text),
            Some("OUTGOING")
        );
    }

    #[test]
    fn text_coalescing_across_reopened_record() {
        let mut blk = field(5, b"a");
        blk.extend(field(1, &1u64.to_le_bytes()));
        blk.extend(field(5, b"b"));
        blk.extend(field(1, &1u64.to_le_bytes()));
        let mut records = BTreeMap::new();
        decode_block(&blk, tags::message_history, &mut records, Path::new("test"));
        assert_eq!(records[&1].message.get("TEXT").and_then(Value::as_text), Some("a\nb"));
    }

    #[test]
    fn quote_message_id_does_not_reopen_record() {
        let mut blk = field(1, &1u64.to_le_bytes());
        blk.extend(field(36, &7u64.to_le_bytes())); // QUOTE_MESSAGE_ID
        blk.extend(field(5, b"hello"));
        blk.extend(field(1, &1u64.to_le_bytes())); // reopen same record, flush scratch
        let mut records = BTreeMap::new();
        decode_block(&blk, tags::message_history, &mut records, Path::new("test"));
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[&1].message.get("QUOTE_MESSAGE_ID").and_then(Value::as_uint),
            Some(7)
        );
        assert_eq!(records[&1].message.get("TEXT").and_then(Value::as_text), Some("hello"));
    }
}
