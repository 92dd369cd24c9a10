//! Draft-storage decode loop (`_draft*`).
//!
//! Tag 2 opens a draft keyed by its own decoded timestamp (spec.md §3
//! "Draft record ... keyed by (user-id, draft-timestamp)"). Fields seen
//! before that point have nowhere to land yet, so they're held in a
//! park cell and merged in once the draft opens (spec.md §9 supplement,
//! "draft park cell"). Tag 3 announces a nested message-history sub-block
//! whose fields are flattened with a `DRAFT_` prefix.

use std::collections::BTreeMap;
use std::path::Path;

use crate::model::DraftRecord;
use crate::stream::FieldIter;
use crate::tags::{self, Reader};
use crate::value::Value;

type DraftFields = BTreeMap<String, Value>;

pub fn decode_block(blk: &[u8], drafts: &mut BTreeMap<u64, DraftRecord>, artifact: &Path) {
    let mut pending: DraftFields = Default::default();
    let mut current_ts: Option<u64> = None;
    let mut iter = FieldIter::new(blk);

    for field in &mut iter {
        let Some(entry) = tags::draft(field.tag) else { continue };

        match field.tag {
            2 => match crate::primitives::timestamp(field.payload, 0, field.payload.len()) {
                Ok((_, raw, _)) => {
                    current_ts = Some(raw);
                    drafts.entry(raw).or_default().fields.append(&mut pending);
                }
                Err(e) => super::log_semantic_violation(artifact, field.tag, e),
            },
            3 => {
                let Some(ts) = current_ts else { continue };
                let record = drafts.entry(ts).or_default();
                decode_delegated_message(field.payload, &mut record.fields, artifact);
            }
            _ => {
                if matches!(entry.reader, Reader::Size | Reader::Unknown) {
                    continue;
                }
                let value = match super::read_generic(entry.reader, field.payload, field.payload.len()) {
                    Ok(v) => v,
                    Err(e) => {
                        super::log_semantic_violation(artifact, field.tag, e);
                        continue;
                    }
                };
                let Some(value) = value else { continue };
                match current_ts {
                    Some(ts) => {
                        drafts.entry(ts).or_default().fields.insert(entry.name.to_string(), value);
                    }
                    None => {
                        pending.insert(entry.name.to_string(), value);
                    }
                }
            }
        }
    }

    if iter.truncated() {
        super::log_structural_corruption(artifact, "field length ran past block end");
    }
}

/// Delegate to the message-history table per spec.md §4.2 "Drafts", but
/// route with a `DRAFT_` prefix instead of `MESSAGE`/`VOIP`.
fn decode_delegated_message(payload: &[u8], fields: &mut DraftFields, artifact: &Path) {
    let mut iter = FieldIter::new(payload);
    for field in &mut iter {
        let Some(entry) = tags::message_history(field.tag) else { continue };
        if matches!(entry.reader, Reader::Size | Reader::Unknown) {
            continue;
        }
        let key = format!("DRAFT_{}", entry.name);
        let value = match entry.reader {
            Reader::MessageId => crate::primitives::message_id(field.payload, 0, field.payload.len())
                .map(|(id, _)| id.map(Value::UInt).unwrap_or(Value::Null)),
            Reader::Time => crate::primitives::timestamp(field.payload, 0, field.payload.len())
                .map(|(formatted, _, _)| formatted.map(Value::Text).unwrap_or(Value::Null)),
            _ => match super::read_generic(entry.reader, field.payload, field.payload.len()) {
                Ok(Some(v)) => Ok(v),
                Ok(None) => continue,
                Err(e) => Err(e),
            },
        };
        match value {
            Ok(v) => {
                fields.insert(key, v);
            }
            Err(e) => super::log_semantic_violation(artifact, field.tag, e),
        }
    }
    if iter.truncated() {
        super::log_structural_corruption(artifact, "delegated message block truncated");
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
    fn draft_opens_and_park_cell_merges() {
        let mut blk = field(1, &1u32.to_le_bytes());
        blk.extend(field(2, &[0x00, 0x10, 0x20, 0x60]));
        let mut drafts = BTreeMap::new();
        decode_block(&blk, &mut drafts, Path::new("test"));
        assert_eq!(drafts.len(), 1);
        let (_, rec) = drafts.iter().next().unwrap();
        assert_eq!(rec.fields.get("DRAFT_STATE").and_then(Value::as_uint), Some(1));
    }
}
