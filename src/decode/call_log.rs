//! Call-log decode loop (`call_log.cache`). Structurally a subset of a
//! message record (spec.md §3), so this reuses the message-history block
//! loop and table verbatim, then additionally derives `DIRECTION` from
//! `FLAGS` exactly as message history does — that already happens inside
//! [`super::message_history::decode_block`], so this module is a thin
//! naming wrapper kept separate only so call-log artifacts get their own
//! error-attribution path and output key (`CALL_LOG_*`, per spec.md's
//! routing-label note) rather than being silently merged into messages.

use std::collections::BTreeMap;
use std::path::Path;

use crate::model::MessageRecord;

pub fn decode_block(blk: &[u8], records: &mut BTreeMap<u64, MessageRecord>, artifact: &Path) {
    super::message_history::decode_block(blk, crate::tags::message_history, records, artifact);
}
