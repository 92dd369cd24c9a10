//! JSON-form artifact ingestion (SPEC_FULL.md §4.7): the contact list,
//! dialog index, favourites, and the JSON variant of `info/cache`.
//!
//! Malformed or unreadable JSON degrades per spec.md §7's I/O-failure
//! policy: the artifact is skipped and logged, nothing downstream fails
//! because of it.

use std::path::Path;

use eyre::Result;
use serde::Deserialize;

use crate::model::Owner;

#[derive(Debug, Deserialize, Default)]
struct ContactListJson {
    #[serde(default)]
    contacts: Vec<serde_json::Value>,
    #[serde(default)]
    ignorelist: Vec<String>,
}

fn contact_uid(entry: &serde_json::Value) -> Option<String> {
    entry
        .get("aimid")
        .or_else(|| entry.get("sn"))
        .or_else(|| entry.get("user_id"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// Returns `(uid, raw profile blob)` pairs plus the sibling ignore list.
pub fn load_contact_list(path: &Path) -> Option<(Vec<(String, serde_json::Value)>, Vec<String>)> {
    let raw = read_to_string_logged(path)?;
    let parsed: ContactListJson = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "malformed contact list JSON, skipping");
            return None;
        }
    };
    let contacts = parsed
        .contacts
        .into_iter()
        .filter_map(|entry| contact_uid(&entry).map(|uid| (uid, entry)))
        .collect();
    Some((contacts, parsed.ignorelist))
}

/// The dialog index is structurally just a list of dialog descriptors;
/// only the uid is needed by the core (it marks "this user-id has a
/// dialog"), so we keep it minimal.
pub fn load_dialog_index(path: &Path) -> Option<Vec<String>> {
    let raw = read_to_string_logged(path)?;
    let parsed: serde_json::Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "malformed dialog index JSON, skipping");
            return None;
        }
    };
    let entries = parsed.as_array().cloned().unwrap_or_default();
    Some(entries.iter().filter_map(contact_uid).collect())
}

/// `favorites/cache2` is structurally identical to the dialogs index.
pub fn load_favorites(path: &Path) -> Option<Vec<String>> {
    load_dialog_index(path)
}

#[derive(Debug, Deserialize, Default)]
struct MyInfoJson {
    aimid: Option<String>,
    display_id: Option<String>,
    friendly_name: Option<String>,
    state: Option<String>,
    user_type: Option<String>,
    nickname: Option<String>,
    attached_phone_number: Option<String>,
    #[serde(default)]
    auto_created: bool,
    #[serde(default)]
    has_mail: bool,
    #[serde(default)]
    account_is_official: bool,
    #[serde(default)]
    read_user_agreement: bool,
}

/// JSON variant of `info/cache` — `original_source` sniffs the file's
/// shape before deciding whether to binary-decode or JSON-parse it; this
/// repo uses the `infer` crate for the same sniff (see
/// [`crate::discover`] callers).
pub fn load_my_info_json(path: &Path) -> Option<Owner> {
    let raw = read_to_string_logged(path)?;
    let parsed: MyInfoJson = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "malformed MyInfo JSON, skipping");
            return None;
        }
    };
    Some(Owner {
        aimid: parsed.aimid,
        display_id: parsed.display_id,
        friendly_name: parsed.friendly_name,
        state: parsed.state,
        user_type: parsed.user_type,
        nickname: parsed.nickname,
        attached_phone_number: parsed.attached_phone_number,
        auto_created: parsed.auto_created,
        has_mail: parsed.has_mail,
        account_is_official: parsed.account_is_official,
        read_user_agreement: parsed.read_user_agreement,
        total_sent: 0,
        total_received: 0,
        total_all: 0,
    })
}

/// `true` if `path` looks like JSON rather than the binary TLV framing,
/// using `infer`'s text/binary sniff over the first bytes (the same
/// crate the teacher already depends on, reused for a different sniff).
pub fn looks_like_json(path: &Path) -> bool {
    let Ok(bytes) = std::fs::read(path) else { return false };
    if infer::is_app(&bytes) || infer::is_archive(&bytes) {
        return false;
    }
    let trimmed = bytes.iter().find(|b| !b.is_ascii_whitespace());
    matches!(trimmed, Some(b'{') | Some(b'['))
}

/// `hst` files: one search term per line, no framing at all.
pub fn load_search_history(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(raw.lines().map(str::to_string).filter(|l| !l.is_empty()).collect())
}

fn read_to_string_logged(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "cannot read file, skipping");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tempfile::NamedTempFile;

    #[test]
    fn contact_list_parses_ignorelist_and_uids() {
        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{"contacts":[{{"aimid":"111","name":"Alice"}}],"ignorelist":["222"]}}"#
        )
        .unwrap();
        let (contacts, ignore) = load_contact_list(f.path()).unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].0, "111");
        assert_eq!(ignore, vec!["222".to_string()]);
    }
}
