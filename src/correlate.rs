//! Cross-artifact correlation engine (spec.md §4.5): the nine-step join
//! that stitches messages, shared files, gallery/dialog state, and the
//! on-disk content cache into one graph. Runs once, after every artifact
//! family has been fully decoded and accumulated into a [`Store`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::cache::{self, FILES_HOST_PREFIX};
use crate::fileshare;
use crate::model::{ConversationType, Fields, MessageCounts, Store};
use crate::value::Value;

pub fn correlate(store: &mut Store, content_cache_dirs: &[PathBuf]) {
    step1_shared_file_tallies(store);
    step2_contact_enrichment(store);
    step3_message_counts(store);
    step4_dialog_state_attachment(store);
    step5_shared_file_to_message(store);
    step6_url_metadata_from_text(store);
    step7_through_9_content_cache(store, content_cache_dirs);
}

/// Step 1 — per-user media-type tallies over shared files, plus the
/// total shared-item count `original_source`'s `MEDIA_TYPES` accumulator
/// also carries (SPEC_FULL.md §3 "Media tallies").
fn step1_shared_file_tallies(store: &mut Store) {
    for (uid, files) in &store.shared_files {
        let mut tally = crate::model::MediaTally::default();
        for record in files.values() {
            let content_type = record.fields.get("SHARED_CONTENT_TYPE").and_then(Value::as_text);
            tally.record(content_type.unwrap_or("unknown"));
        }
        tally.number_of_shared_items = files.len() as u64;
        store.contact_entry(uid).media_tally = Some(tally);
    }
}

/// Step 2 — contact enrichment: default conversation type, gallery
/// state, and synthesise stub contacts for message-only user-ids.
fn step2_contact_enrichment(store: &mut Store) {
    let message_uids: Vec<String> = store.messages.keys().cloned().collect();
    for uid in message_uids {
        let known = store.contacts.contains_key(&uid);
        let contact = store.contact_entry(&uid);
        if !known {
            contact.message_from_non_contact = true;
        }
    }

    let gallery_uids: Vec<String> = store.gallery_states.keys().cloned().collect();
    for uid in gallery_uids {
        let state = store.gallery_states.get(&uid).cloned();
        store.contact_entry(&uid).gallery_state = state;
    }

    for (uid, contact) in store.contacts.iter_mut() {
        contact.conversation_type = ConversationType::classify(uid);
        contact.ignored = store.ignore_list.iter().any(|i| i == uid);
    }
}

/// Step 3 — per-contact and global send/receive/total message counts.
fn step3_message_counts(store: &mut Store) {
    let mut global = (0u64, 0u64, 0u64); // sent, received, total
    for (uid, messages) in &store.messages {
        let mut counts = MessageCounts::default();
        for record in messages.values() {
            match record.message.get("DIRECTION").and_then(Value::as_text) {
                Some("OUTGOING") => counts.sent += 1,
                Some("INCOMING") => counts.received += 1,
                _ => {}
            }
            counts.total += 1;
        }
        global.0 += counts.sent;
        global.1 += counts.received;
        global.2 += counts.total;
        store.contact_entry(uid).message_counts = counts;
    }
    store.owner.total_sent = global.0;
    store.owner.total_received = global.1;
    store.owner.total_all = global.2;
}

/// Step 4 — attach each dialog-state record to its contact.
fn step4_dialog_state_attachment(store: &mut Store) {
    let uids: Vec<String> = store.dialog_states.keys().cloned().collect();
    for uid in uids {
        let dialog_state = store.dialog_states.get(&uid).cloned();
        store.contact_entry(&uid).dialog_state = dialog_state;
    }
}

/// Step 5 — splice shared-file records into their matching message.
fn step5_shared_file_to_message(store: &mut Store) {
    for (uid, files) in &store.shared_files {
        let Some(messages) = store.messages.get_mut(uid) else { continue };
        for (mid, file) in files {
            if let Some(record) = messages.get_mut(mid) {
                record.shared_content_details = Some(file.fields.clone());
            }
        }
    }
}

/// Step 6 — decode a file-sharing URI found directly in message text
/// when no shared-file record already supplied one.
fn step6_url_metadata_from_text(store: &mut Store) {
    for messages in store.messages.values_mut() {
        for record in messages.values_mut() {
            let already_has_metadata = record
                .shared_content_details
                .as_ref()
                .is_some_and(|d| d.contains_key("URI_DECODED_METADATA"));
            if already_has_metadata {
                continue;
            }
            let candidate = ["TEXT", "QUOTE_TEXT", "QUOTE_URL", "URL"]
                .iter()
                .find_map(|key| record.message.get(*key).and_then(Value::as_text))
                .filter(|text| text.starts_with(FILES_HOST_PREFIX));
            let Some(text) = candidate else { continue };
            if let Some(meta) = fileshare::decode(text) {
                let dest = record.shared_content_details.get_or_insert_with(Fields::default);
                dest.insert("URI_DECODED_METADATA", value_from_metadata(&meta));
                if let Some(ct) = meta.content_type {
                    dest.insert("URI_DECODED_CONTENT_TYPE", Value::Text(ct.to_string()));
                }
            }
        }
    }
}

fn value_from_metadata(meta: &fileshare::FileSharingMetadata) -> Value {
    Value::Text(serde_json::to_string(meta).unwrap_or_default())
}

/// Steps 7-9 — content-cache MD5 matching, JSON sidecar lookup, and URL
/// metadata from sidecars.
fn step7_through_9_content_cache(store: &mut Store, content_cache_dirs: &[PathBuf]) {
    for dir in content_cache_dirs {
        let Ok(listing) = cache::enumerate(dir) else {
            tracing::warn!(dir = %dir.display(), "cannot enumerate content cache, skipping");
            continue;
        };

        // Step 7: filename vs MD5(url) partial match.
        let mut filename_owner: BTreeMap<String, (String, u64)> = BTreeMap::new();
        for messages in store.messages.values_mut() {
            for (mid, record) in messages.iter_mut() {
                let uid_url = ["TEXT", "QUOTE_TEXT", "QUOTE_URL", "URL"]
                    .iter()
                    .find_map(|key| record.message.get(*key).and_then(Value::as_text))
                    .filter(|text| text.contains(FILES_HOST_PREFIX));
                let Some(url) = uid_url else { continue };
                let digest = cache::md5_hex(url.as_bytes());
                for body in &listing.bodies {
                    let Some(name) = body.file_name().and_then(|n| n.to_str()) else { continue };
                    if cache::check_partial_match(name, &digest) {
                        let dest = record.shared_content_details.get_or_insert_with(Fields::default);
                        let mut map = match dest.remove("SHARED_CONTENT_FILE_METADATA") {
                            Some(Value::Text(existing)) => {
                                serde_json::from_str(&existing).unwrap_or_default()
                            }
                            _ => serde_json::Map::new(),
                        };
                        map.insert(
                            name.to_string(),
                            serde_json::Value::String(body.display().to_string()),
                        );
                        dest.insert(
                            "SHARED_CONTENT_FILE_METADATA",
                            Value::Text(serde_json::Value::Object(map).to_string()),
                        );
                        filename_owner.insert(name.to_string(), (String::new(), *mid));
                    }
                }
            }
        }

        // Step 8: local-body MD5s joined against sidecar descriptors. The
        // filename map built in Step 7 is keyed by the *body* filename, so
        // the join back into it must use the same body filename recovered
        // from `local_hashes` — not the sidecar's own on-disk filename,
        // which has no relation to the body it describes.
        let local_hashes = cache::hash_bodies(&listing.bodies);
        for sidecar in &listing.sidecars {
            let Some(sidecar_name) = sidecar.file_name().and_then(|n| n.to_str()) else { continue };
            let companion = cache::find_companion_dir(&listing.companion_dirs, sidecar_name);
            match cache::parse_sidecar(sidecar) {
                Some(cache::Sidecar::FileDescriptor(info)) => {
                    if let Some(local_path) = local_hashes.get(&info.md5) {
                        let body_name = local_path.file_name().and_then(|n| n.to_str());
                        if let Some((_uid, mid)) = body_name.and_then(|n| filename_owner.get(n)) {
                            attach_file_location(store, *mid, local_path, sidecar_name, dir, companion);
                        }
                    }
                }
                Some(cache::Sidecar::UrlMetadata(doc)) => {
                    // Step 9: expose sidecar URL metadata at top level.
                    let mut fields = Fields::new();
                    fields.insert("URL", Value::Text(doc.url));
                    if let Some(ts) = doc.fetch_ts {
                        if let Some(formatted) = crate::primitives::format_epoch_seconds(ts) {
                            fields.insert("FETCH_TIME", Value::Text(formatted));
                        }
                    }
                    if let Some(dir) = companion {
                        fields.insert("COMPANION_DIR_PATH", Value::Text(dir.display().to_string()));
                        fields.insert(
                            "COMPANION_DIR_LISTING",
                            Value::Text(cache::list_dir(dir).join(",")),
                        );
                    }
                    store.url_metadata.insert(sidecar_name.to_string(), fields);
                }
                _ => {}
            }
        }
    }
}

fn attach_file_location(
    store: &mut Store,
    mid: u64,
    local_path: &std::path::Path,
    sidecar_name: &str,
    content_cache_dir: &std::path::Path,
    companion_dir: Option<&std::path::PathBuf>,
) {
    for messages in store.messages.values_mut() {
        if let Some(record) = messages.get_mut(&mid) {
            let dest = record.shared_content_details.get_or_insert_with(Fields::default);
            dest.insert("SHARED_CONTENT_FILE_LOCATION_PATH", Value::Text(local_path.display().to_string()));
            dest.insert("SHARED_CONTENT_FILE_LOCATION_SIDECAR", Value::Text(sidecar_name.to_string()));
            dest.insert(
                "SHARED_CONTENT_FILE_LOCATION_DIR",
                Value::Text(content_cache_dir.display().to_string()),
            );
            if let Some(companion) = companion_dir {
                dest.insert(
                    "SHARED_CONTENT_FILE_LOCATION_COMPANION_DIR",
                    Value::Text(companion.display().to_string()),
                );
                dest.insert(
                    "SHARED_CONTENT_FILE_LOCATION_COMPANION_LISTING",
                    Value::Text(cache::list_dir(companion).join(",")),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MessageRecord, SharedFileRecord};

    #[test]
    fn step5_splices_shared_file_into_message() {
        let mut store = Store::default();
        store.messages.entry("uid1".into()).or_default().insert(1, MessageRecord::default());
        let mut file_fields = Fields::new();
        file_fields.insert("SHARED_CONTENT_TYPE", Value::Text("image-regular".into()));
        store
            .shared_files
            .entry("uid1".into())
            .or_default()
            .insert(1, SharedFileRecord { fields: file_fields });

        step5_shared_file_to_message(&mut store);

        let record = &store.messages["uid1"][&1];
        assert!(record.shared_content_details.is_some());
    }

    #[test]
    fn step3_counts_direction() {
        let mut store = Store::default();
        let mut rec = MessageRecord::default();
        rec.message.insert("DIRECTION", Value::Text("OUTGOING".into()));
        store.messages.entry("uid1".into()).or_default().insert(1, rec);

        step3_message_counts(&mut store);

        assert_eq!(store.owner.total_sent, 1);
        assert_eq!(store.contacts["uid1"].message_counts.sent, 1);
    }
}
