//! MyInfo decode loop (`info/cache`, binary form). Flat, no record
//! boundary — routes straight onto the [`Owner`] struct's named fields.
//! The JSON form of this same file is handled by [`crate::json_ingest`].

use std::path::Path;

use crate::model::Owner;
use crate::stream::FieldIter;
use crate::tags;
use crate::value::Value;

pub fn decode_block(blk: &[u8], owner: &mut Owner, artifact: &Path) {
    let mut iter = FieldIter::new(blk);
    for field in &mut iter {
        let Some(entry) = tags::my_info(field.tag) else { continue };
        let value = match super::read_generic(entry.reader, field.payload, field.payload.len()) {
            Ok(Some(v)) => v,
            Ok(None) => continue,
            Err(e) => {
                super::log_semantic_violation(artifact, field.tag, e);
                continue;
            }
        };
        match field.tag {
            1 => owner.aimid = value.into_text(),
            2 => owner.display_id = value.into_text(),
            3 => owner.friendly_name = value.into_text(),
            4 => owner.state = value.into_text(),
            5 => owner.user_type = value.into_text(),
            6 => owner.attached_phone_number = value.into_text(),
            8 => owner.auto_created = matches!(value, Value::Bool(true)),
            9 => owner.has_mail = matches!(value, Value::Bool(true)),
            10 => owner.read_user_agreement = matches!(value, Value::Bool(true)),
            11 => owner.account_is_official = matches!(value, Value::Bool(true)),
            12 => owner.nickname = value.into_text(),
            _ => {}
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
    fn aimid_and_official_flag_decode() {
        let mut blk = field(1, b"123456789");
        blk.extend(field(11, &[1]));
        let mut owner = Owner::default();
        decode_block(&blk, &mut owner, Path::new("test"));
        assert_eq!(owner.aimid.as_deref(), Some("123456789"));
        assert!(owner.account_is_official);
    }
}
