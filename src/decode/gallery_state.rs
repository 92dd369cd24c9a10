//! Gallery-state decode loop (`_gs*`). Flat record, one per file — no
//! record-boundary tag, every field routes directly into the single
//! output map for the artifact's owning user-id.

use std::path::Path;

use crate::model::Fields;
use crate::stream::FieldIter;
use crate::tags::{self, Dest, Reader};
use crate::value::Value;

pub fn decode_block(blk: &[u8], fields: &mut Fields, artifact: &Path) {
    let mut iter = FieldIter::new(blk);
    for field in &mut iter {
        let Some(entry) = tags::gallery_state(field.tag) else { continue };
        if entry.dest != Dest::State {
            continue;
        }
        // LAST_ENTRY/FIRST_ENTRY (tags 2/4) are `Reader::MessageId`, which
        // has no caller-visible boundary semantics here (no record to
        // open) — just a plain optional message id, decoded directly
        // rather than through `read_generic` (which doesn't handle it).
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
                fields.insert(entry.name, value);
            }
            Ok(None) => {}
            Err(e) => super::log_semantic_violation(artifact, field.tag, e),
        }
    }
    if iter.truncated() {
        super::log_structural_corruption(artifact, "field length ran past block end");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_count_routes_into_state() {
        let mut blk = 6u32.to_le_bytes().to_vec();
        blk.extend(4u32.to_le_bytes());
        blk.extend(3u32.to_le_bytes());
        let mut fields = Fields::new();
        decode_block(&blk, &mut fields, Path::new("test"));
        assert_eq!(fields.get("IMAGE_COUNT").and_then(crate::value::Value::as_uint), Some(3));
    }
}
