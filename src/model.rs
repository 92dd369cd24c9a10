//! Output record types (spec.md §3).
//!
//! Handlers are data-driven (spec.md §9 "heterogeneous value carriers"), so
//! most records are a routing-label-keyed map of [`Value`]s rather than a
//! struct with one field per tag — the tag tables decide which keys exist,
//! not this module. Only the small set of fields every record needs
//! regardless of which tags fired (keys, counters, nested collections) get
//! dedicated struct fields.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::value::Value;

/// A routed field map: routing-label key -> decoded value. This is what
/// `spec.md`'s handler tables project their output into.
pub type Fields = BTreeMap<&'static str, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConversationType {
    Private,
    GroupChat,
}

impl ConversationType {
    /// spec.md §3: group chats are recognised by `@chat.agent` in the uid.
    pub fn classify(uid: &str) -> Self {
        if uid.contains("@chat.agent") {
            ConversationType::GroupChat
        } else {
            ConversationType::Private
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageRecord {
    pub message: Fields,
    pub voip: Option<Fields>,
    pub shared_content_details: Option<Fields>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MediaTally {
    pub image: u64,
    pub video: u64,
    pub file: u64,
    pub link: u64,
    pub ptt: u64,
    pub other: u64,
    /// Total shared items for this user-id, matching `original_source`'s
    /// `MEDIA_TYPES` accumulator (SPEC_FULL.md §3 "Media tallies").
    pub number_of_shared_items: u64,
}

impl MediaTally {
    /// Step 1 of correlation: classify `SHARED_CONTENT_TYPE` into one of
    /// the five named buckets, else `OTHER`.
    pub fn record(&mut self, content_type: &str) {
        match content_type {
            t if t.starts_with("image") => self.image += 1,
            t if t.starts_with("video") => self.video += 1,
            "file" => self.file += 1,
            "link" => self.link += 1,
            "ptt" => self.ptt += 1,
            _ => self.other += 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageCounts {
    pub sent: u64,
    pub received: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactRecord {
    pub user_id: String,
    pub conversation_type: ConversationType,
    /// Raw contact-list JSON blob for this user-id, if one existed
    /// (display name, groups, etc. — spec.md leaves field naming to the
    /// JSON ingestion collaborator).
    pub profile: Option<serde_json::Value>,
    pub avatars: Vec<PathBuf>,
    pub media_tally: Option<MediaTally>,
    pub message_counts: MessageCounts,
    pub dialog_state: Option<DialogStateRecord>,
    pub gallery_state: Option<Fields>,
    pub ignored: bool,
    /// Set when the contact didn't exist in `cache.cl` but has messages
    /// (spec.md §4.5 Step 2, "stub contact").
    pub message_from_non_contact: bool,
}

impl ContactRecord {
    pub fn stub(user_id: &str) -> Self {
        ContactRecord {
            user_id: user_id.to_string(),
            conversation_type: ConversationType::classify(user_id),
            profile: None,
            avatars: Vec::new(),
            media_tally: None,
            message_counts: MessageCounts::default(),
            dialog_state: None,
            gallery_state: None,
            ignored: false,
            message_from_non_contact: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SharedFileRecord {
    pub fields: Fields,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DialogStateRecord {
    pub fields: Fields,
    /// Participant heads, keyed by the ordinal they were decoded at
    /// (spec.md §3 "one or more heads ... each indexed by ordinal").
    pub heads: BTreeMap<u32, Fields>,
}

/// Draft fields use `String` keys (not the routing label's `&'static
/// str`) because the message-history delegation needs a `DRAFT_`-prefixed
/// key built at decode time (spec.md §4.2 "Drafts").
#[derive(Debug, Clone, Default, Serialize)]
pub struct DraftRecord {
    pub fields: BTreeMap<String, Value>,
}

/// MyInfo-derived owner record plus the global accumulators written once
/// at the end of correlation Step 3 (spec.md §9 "Global accumulators").
#[derive(Debug, Clone, Default, Serialize)]
pub struct Owner {
    pub aimid: Option<String>,
    pub display_id: Option<String>,
    pub friendly_name: Option<String>,
    pub state: Option<String>,
    pub user_type: Option<String>,
    pub nickname: Option<String>,
    pub attached_phone_number: Option<String>,
    pub auto_created: bool,
    pub has_mail: bool,
    pub account_is_official: bool,
    pub read_user_agreement: bool,
    pub total_sent: u64,
    pub total_received: u64,
    pub total_all: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHistory {
    pub user_id: String,
    pub terms: Vec<String>,
}

/// Everything the correlation engine reads and writes, accumulated from
/// every decoded artifact across the whole input tree.
#[derive(Debug, Clone, Default)]
pub struct Store {
    pub owner: Owner,
    pub contacts: BTreeMap<String, ContactRecord>,
    pub messages: BTreeMap<String, BTreeMap<u64, MessageRecord>>,
    pub shared_files: BTreeMap<String, BTreeMap<u64, SharedFileRecord>>,
    pub dialog_states: BTreeMap<String, DialogStateRecord>,
    pub gallery_states: BTreeMap<String, Fields>,
    pub call_log: BTreeMap<u64, MessageRecord>,
    pub drafts: BTreeMap<String, BTreeMap<u64, DraftRecord>>,
    pub search_history: BTreeMap<String, SearchHistory>,
    pub favorites: Vec<String>,
    pub ignore_list: Vec<String>,
    pub app_settings: BTreeMap<String, Value>,
    pub favorites_pinned_on_start: BTreeMap<String, bool>,
    /// Sidecar `doc.url` records, keyed by the sidecar filename (spec.md
    /// §4.5 Step 9).
    pub url_metadata: BTreeMap<String, Fields>,
}

impl Store {
    pub fn message_entry(&mut self, uid: &str, mid: u64) -> &mut MessageRecord {
        self.messages.entry(uid.to_string()).or_default().entry(mid).or_default()
    }

    pub fn contact_entry(&mut self, uid: &str) -> &mut ContactRecord {
        self.contacts.entry(uid.to_string()).or_insert_with(|| ContactRecord::stub(uid))
    }
}
