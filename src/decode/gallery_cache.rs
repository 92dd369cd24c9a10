//! Shared-file gallery-cache decode loop (`_gc*`).
//!
//! Simpler than message history: every field routes straight into the
//! current record once `SHARED_CONTENT_MSG_ID` (tag 2) opens it, no text
//! scratch, no direction rewrite (direction is derived later, during
//! correlation, from the message-flags map already present here).

use std::collections::BTreeMap;
use std::path::Path;

use crate::model::SharedFileRecord;
use crate::stream::FieldIter;
use crate::tags::{self, Reader};
use crate::value::Value;

pub fn decode_block(blk: &[u8], records: &mut BTreeMap<u64, SharedFileRecord>, artifact: &Path) {
    let mut current_mid: Option<u64> = None;
    let mut iter = FieldIter::new(blk);

    for field in &mut iter {
        let Some(entry) = tags::shared_files(field.tag) else { continue };

        match entry.reader {
            Reader::MessageId if field.tag == 2 => {
                match crate::primitives::message_id(field.payload, 0, field.payload.len()) {
                    Ok((id, _)) => current_mid = id,
                    Err(e) => super::log_semantic_violation(artifact, field.tag, e),
                }
            }
            // SHARED_CONTENT_NEXT_MSG_ID (tag 4) is also `Reader::MessageId`
            // but doesn't open a record — it's a plain value on the
            // currently-open one, decoded directly since `read_generic`
            // doesn't handle this reader.
            Reader::MessageId => {
                let Some(mid) = current_mid else { continue };
                if entry.dest != tags::Dest::File {
                    continue;
                }
                match crate::primitives::message_id(field.payload, 0, field.payload.len()) {
                    Ok((id, _)) => {
                        let value = id.map(Value::UInt).unwrap_or(Value::Null);
                        records.entry(mid).or_default().fields.insert(entry.name, value);
                    }
                    Err(e) => super::log_semantic_violation(artifact, field.tag, e),
                }
            }
            Reader::Size | Reader::Unknown => {}
            _ => {
                let Some(mid) = current_mid else { continue };
                if entry.dest != tags::Dest::File {
                    continue;
                }
                match super::read_generic(entry.reader, field.payload, field.payload.len()) {
                    Ok(Some(value)) => {
                        records.entry(mid).or_default().fields.insert(entry.name, value);
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
    fn content_type_routes_to_opened_record() {
        let mut blk = field(2, &7u64.to_le_bytes());
        blk.extend(field(7, b"image-regular"));
        let mut records = BTreeMap::new();
        decode_block(&blk, &mut records, Path::new("test"));
        assert_eq!(
            records[&7].fields.get("SHARED_CONTENT_TYPE").and_then(crate::value::Value::as_text),
            Some("image-regular")
        );
    }
}
