//! Handler tables: tag -> (reader kind, field name, routing label).
//!
//! Each artifact family gets its own table. Represented as a match over a
//! dense-ish `u32` tag space rather than a `HashMap`, since the tag sets
//! are small, fixed at compile time, and mostly contiguous — a
//! hand-rolled switch is what the lookup actually compiles to either way.
//! An unknown tag yields `None`; callers skip `8 + length` bytes and
//! continue, per spec.md §4.3 ("An unknown tag is not an error").

/// Which sub-section of the output record a decoded value is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dest {
    Message,
    Voip,
    File,
    State,
    DialogState,
    Draft,
    /// Framing-only: payload consumed but not recorded unless verbose.
    None,
}

/// Which primitive reader a tag's payload is decoded with. Readers with
/// caller-visible side effects (`MessageId`'s record-boundary semantics,
/// `Time`'s raw-epoch shadow, `Text`'s scratch-cell accumulation) are
/// handled specially by the block loop; the rest go through
/// [`crate::decode::read_generic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reader {
    Size,
    Unknown,
    MessageId,
    Text,
    Time,
    Bool,
    Value,
    MessageFlags,
    FormatFlags,
    ChatMembers,
    ChatEvent,
    VoipEvent,
    VoipDirection,
    Official,
    /// Fixed 16-byte `(x, y, w, h)` quad — `ui2.stg`'s
    /// `main_window_resolution` only.
    Resolution,
    /// List of big-endian `(event_id, epoch)` pairs — `ui2.stg`'s
    /// `recent_emoji_usage_log` only.
    EventTimes,
}

#[derive(Debug, Clone, Copy)]
pub struct TagEntry {
    pub reader: Reader,
    pub name: &'static str,
    pub dest: Dest,
}

const fn e(reader: Reader, name: &'static str, dest: Dest) -> TagEntry {
    TagEntry { reader, name, dest }
}

/// `VOIP_EVENT_TYPE`'s lookup table (`im-desktop/corelib/enumerations.h`).
pub fn voip_event_name(v: u64) -> &'static str {
    match v {
        0 => "invalid",
        1 => "min",
        2 => "missed call",
        3 => "call ended",
        4 => "call accepted",
        5 => "call declined",
        6 => "max",
        _ => "unknown",
    }
}

/// `VOIP_IS_INCOMING`'s lookup table.
pub fn voip_direction_name(v: u64) -> &'static str {
    match v {
        0 => "OUTGOING",
        1 => "INCOMING",
        _ => "unknown",
    }
}

/// `CHAT_EVENT_TYPE`'s lookup table (`corelib/enumerations.h`,
/// `chat_event_type`).
pub fn chat_event_name(v: u64) -> &'static str {
    match v {
        0 => "invalid",
        1 => "min",
        2 => "added to buddy list",
        3 => "add members to chat",
        4 => "invite",
        5 => "leave",
        6 => "delete members from chat",
        7 => "kicked",
        8 => "chat name modified",
        9 => "buddy registered",
        10 => "buddy found",
        11 => "birthday",
        12 => "avatar modified",
        13 => "generic",
        14 => "chat description modified",
        15 => "message deleted",
        16 => "chat rules modified",
        17 => "chat stamp modified",
        18 => "chat join moderation modified",
        19 => "chat public modified",
        20 => "chat trust required modified",
        21 => "chat threads enabled modified",
        22 => "mchat admin granted",
        23 => "mchat admin revoked",
        24 => "mchat allowed to write",
        25 => "mchat disallowed to write",
        26 => "mchat waiting for approval",
        27 => "mchat joining approved",
        28 => "mchat joining rejected",
        29 => "mchat joining canceled",
        30 => "warn about stranger",
        31 => "no longer stranger",
        32 => "status reply",
        33 => "custom status reply",
        34 => "task changed",
        35 => "max",
        _ => "unknown",
    }
}

/// Message-history table — `icqdesktop.deprecated/core/archive/history_message.cpp`.
/// Reused verbatim for `call_log.cache` (spec.md §3 "Call-log record") and
/// delegated into from draft storage's nested message block.
pub fn message_history(tag: u32) -> Option<TagEntry> {
    use Dest::*;
    use Reader::*;
    Some(match tag {
        0 => e(Size, "CALL_LOG_CACHE_BLOCK_SIZE", None),
        1 => e(MessageId, "MESSAGE_ID", Message),
        2 => e(MessageFlags, "FLAGS", Message),
        3 => e(Time, "TIME", Message),
        4 => e(Text, "WID", Message),
        5 => e(Text, "TEXT", Dest::None),
        6 => e(Size, "CHAT_BLOCK_SIZE", None),
        7 => e(Size, "STICKER_BLOCK_SIZE", None),
        8 => e(Size, "MULT", None),
        9 => e(Size, "VOIP_BLOCK_SIZE", None),
        10 => e(Text, "STICKER_ID", Message),
        11 => e(Text, "CHAT_SENDER", Message),
        12 => e(Text, "CHAT_NAME", Message),
        13 => e(MessageId, "PREVIOUS_MESSAGE_ID_WITH_", Message),
        14 => e(Text, "INTERNAL_ID", Message),
        15 => e(Text, "CHAT_FRIENDLY_NAME", Message),
        16 => e(Size, "FILE_SHARING_BLOCK_SIZE", None),
        17 => e(Size, "FILE_SHARING_FLAGS", None),
        18 => e(Text, "FILE_SHARING_URI", Message),
        19 => e(Text, "FILE_SHARING_LOCAL_PATH", Message),
        20 => e(Unknown, "FILE_SHARING_UPLOAD_ID", None),
        21 => e(Text, "SENDER_FRIENDLY_NAME", Message),
        22 => e(Size, "CHAT_EVENT_BLOCK_SIZE", None),
        23 => e(ChatEvent, "CHAT_EVENT_TYPE", Message),
        24 => e(Text, "CHAT_EVENT_SENDER_FRIENDLY_NAME", Message),
        25 => e(ChatMembers, "CHAT_EVENT_MCHAT_MEMBERS", Message),
        26 => e(Text, "CHAT_EVENT_NEW_CHAT_NAME", Message),
        27 => e(VoipEvent, "VOIP_EVENT_TYPE", Voip),
        28 => e(Text, "VOIP_SENDER_FRIENDLY_NAME", Voip),
        29 => e(Text, "VOIP_SENDER_AIMID", Voip),
        30 => e(Value, "VOIP_DURATION", Voip),
        31 => e(VoipDirection, "VOIP_IS_INCOMING", Voip),
        32 => e(Text, "CHAT_EVENT_GENERIC_TEXT", Message),
        33 => e(Text, "CHAT_EVENT_NEW_CHAT_DESCRIPTION", Message),
        34 => e(Text, "QUOTE_TEXT", Message),
        35 => e(Text, "QUOTE_SENDER_SN", Message),
        36 => e(MessageId, "QUOTE_MESSAGE_ID", Message),
        37 => e(Time, "QUOTE_TIME", Message),
        38 => e(Text, "QUOTE_CHAT_ID", Message),
        39 => e(Size, "QUOTE", None),
        40 => e(Text, "QUOTE_SENDER_FRIENDLY_NAME", Message),
        41 => e(Bool, "QUOTE_IS_FORWARDED", Message),
        42 => e(Text, "CHAT_EVENT_NEW_CHAT_RULES", Message),
        43 => e(Text, "CHAT_EVENT_SENDER_AIMID", Message),
        44 => e(Value, "QUOTE_SET_ID", None),
        45 => e(Value, "QUOTE_STICKER_ID", None),
        46 => e(Text, "QUOTE_CHAT_STAMP", Message),
        47 => e(Text, "QUOTE_CHAT_NAME", Message),
        48 => e(Size, "MENTION_BLOCK_SIZE", None),
        49 => e(Text, "MENTIONER", Message),
        50 => e(Text, "MENTIONER_FRIENDLY_NAME", Message),
        51 => e(ChatMembers, "CHAT_EVENT_MCHAT_MEMBERS_AIMIDS", Message),
        52 => e(Text, "UPDATE_PATCH_VERSION", Message),
        53 => e(Size, "SNIPPED_BLOCK_SIZE", None),
        54 => e(Text, "SNIPPET_URL", Message),
        55 => e(Text, "SNIPPET_CONTENT_TYPE", Message),
        56 => e(Text, "SNIPPET_PREVIEW_URL", Message),
        57 => e(Value, "SNIPPET_PREVIEW_WIDTH", Message),
        58 => e(Value, "SNIPPET_PREVIEW_HEIGHT", Message),
        59 => e(Text, "SNIPPET_PREVIEW_TITLE", Message),
        60 => e(Text, "SNIPPET_DESCRIPTION", Message),
        61 => e(Text, "VOIP_CONFERENCE_MEMBERS", Voip),
        62 => e(Bool, "VOIP_IS_VIDEO", Voip),
        63 => e(Size, "IS_CAPTCHA_PRESENT", None),
        64 => e(Text, "DESCRIPTION", Message),
        65 => e(Text, "URL", Message),
        66 => e(Text, "QUOTE_URL", Message),
        67 => e(Text, "QUOTE_DESCRIPTION", Message),
        68 => e(Value, "OFFLINE_VERSION", None),
        69 => e(Official, "IS_OFFICIAL", Message),
        70 => e(Size, "SHARED_CONTACT", None),
        71 => e(Text, "SHARED_CONTACT_NAME", Message),
        72 => e(Text, "SHARED_CONTACT_PHONE_NUMBER", Message),
        73 => e(Text, "SHARED_CONTACT_SN", Message),
        74 => e(Text, "FILE_SHARING_BASE_CONTENT_TYPE", Message),
        75 => e(Value, "FILE_SHARING_DURATION", Message),
        76 => e(Size, "GEO_DATA_BLOCK_SIZE", None),
        77 => e(Text, "GEOGRAPHIC_NAME", Message),
        78 => e(Text, "LATITUDE", Message),
        79 => e(Text, "LONGITUDE", Message),
        80 => e(Bool, "CHAT_IS_CHANNEL", Message),
        81 => e(Size, "POLL_BLK_SIZE", None),
        82 => e(Value, "POLL_ID", Message),
        83 => e(Text, "POLL_ANSWER", Message),
        84 => e(Value, "POLL_TYPE", Message),
        85 => e(Text, "CHAT_EVENT_NEW_CHAT_STAMP", Message),
        86 => e(Value, "JSON_BLOCK_SIZE", None),
        87 => e(Text, "SENDER_AIMID", Message),
        88 => e(Unknown, "BUTTONS", None),
        89 => e(Bool, "HIDE_EDIT", None),
        90 => e(Text, "CHAT_REQUESTED_BY", Message),
        91 => e(Text, "CHAT_REQUESTER_FRIENDLY_NAME", Message),
        92 => e(Text, "VOIP_CALL_AIMID", Voip),
        93 => e(Text, "VOIP_SID", Voip),
        94 => e(Size, "REACTIONS_BLOCK", None),
        95 => e(Bool, "REACTIONS_EXISTS", Message),
        96 => e(Text, "CHAT_EVENT_SENDER_STATUS", Message),
        97 => e(Text, "CHAT_EVENT_OWNER_STATUS", Message),
        98 => e(Text, "CHAT_EVENT_SENDER_STATUS_DESCRIPTION", Message),
        99 => e(Text, "CHAT_EVENT_OWNER_STATUS_DESCRIPTION", Message),
        100 => e(Size, "FORMAT_BLOCK_SIZE", None),
        101 => e(Unknown, "FORMAT_OFFSET", None),
        102 => e(Unknown, "FORMAT_LENGTH", None),
        103 => e(Unknown, "FORMAT_DATA", None),
        104 => e(FormatFlags, "FORMAT_BOLD", None),
        105 => e(FormatFlags, "FORMAT_ITALIC", None),
        106 => e(FormatFlags, "FORMAT_UNDERLINE", None),
        107 => e(FormatFlags, "FORMAT_STRIKETHROUGH", None),
        108 => e(FormatFlags, "FORMAT_INLINE_CODE", None),
        109 => e(FormatFlags, "FORMAT_URL", None),
        110 => e(FormatFlags, "FORMAT_MENTION", None),
        111 => e(FormatFlags, "FORMAT_QUOTE", None),
        112 => e(FormatFlags, "FORMAT_PRE", None),
        113 => e(FormatFlags, "FORMAT_ORDERED_LIST", None),
        114 => e(FormatFlags, "FORMAT_UNORDERED_LIST", None),
        115 => e(Unknown, "DESCRIPTION_FORMAT", None),
        116 => e(Size, "TASK_BLOCK_SIZE", None),
        117 => e(Value, "TASK_ID", Message),
        118 => e(Text, "TASK_TITLE", Message),
        119 => e(Text, "TASK_ASSIGNEE", Message),
        120 => e(Time, "TASK_END_TIME", Message),
        121 => e(Value, "THREAD_ID", Message),
        122 => e(Text, "TASK_STATUS", Message),
        123 => e(Text, "CHAT_EVENT_TASK_EDITOR", Message),
        124 => e(Unknown, "FORMAT_START_INDEX", None),
        125 => e(Bool, "CHAT_EVENT_THREADS_ENABLED", Message),
        _ => return None,
    })
}

/// MyInfo table — `im-desktop/core/connections/wim/my_info.h`. Routing is
/// implicit (top-level `Owner` fields), so `dest` is unused here; kept
/// `Dest::None` to reuse `TagEntry`.
pub fn my_info(tag: u32) -> Option<TagEntry> {
    use Reader::*;
    Some(match tag {
        1 => e(Text, "AIMID", Dest::None),
        2 => e(Text, "DISPLAY_ID", Dest::None),
        3 => e(Text, "FRIENDLY_NAME", Dest::None),
        4 => e(Text, "STATE", Dest::None),
        5 => e(Text, "USER_TYPE", Dest::None),
        6 => e(Text, "ATTACHED_PHONE_NUMBER", Dest::None),
        7 => e(Value, "GLOBAL_FLAGS", Dest::None),
        8 => e(Bool, "AUTO_CREATED", Dest::None),
        9 => e(Bool, "HAS_MAIL", Dest::None),
        10 => e(Bool, "READ_USER_AGREEMENT", Dest::None),
        11 => e(Bool, "ACCOUNT_IS_OFFICIAL", Dest::None),
        12 => e(Text, "NICKNAME", Dest::None),
        _ => return None,
    })
}

/// Shared-file gallery-cache table — `core/archive/gallery_cache.cpp`.
pub fn shared_files(tag: u32) -> Option<TagEntry> {
    use Dest::File;
    use Reader::*;
    Some(match tag {
        1 => e(Size, "SHARED_CONTENT_BLOCK_SIZE", Dest::None),
        2 => e(MessageId, "SHARED_CONTENT_MSG_ID", File),
        3 => e(Value, "SHARED_SEQUENCE_NO", Dest::None),
        4 => e(MessageId, "SHARED_CONTENT_NEXT_MSG_ID", File),
        5 => e(Value, "SHARED_NEXT_SEQUENCE_NO", Dest::None),
        6 => e(Text, "SHARED_CONTENT", File),
        7 => e(Text, "SHARED_CONTENT_TYPE", File),
        8 => e(Text, "SHARED_CONTENT_SENDER", File),
        9 => e(MessageFlags, "SHARED_MESSAGE_FLAGS", File),
        10 => e(Time, "SHARED_CONTENT_TIME", File),
        11 => e(Text, "SHARED_CONTENT_CAPTION", File),
        _ => return None,
    })
}

/// Draft-storage table — `core/archive/draft_storage.h`. Tag 3 announces
/// the nested message-history sub-block (see spec.md §4.2 "Drafts").
pub fn draft(tag: u32) -> Option<TagEntry> {
    use Dest::Draft;
    use Reader::*;
    Some(match tag {
        1 => e(Value, "DRAFT_STATE", Draft),
        2 => e(Time, "DRAFT_TIME", Draft),
        3 => e(Size, "DRAFT_MESSAGE_BLOCK_SIZE", Draft),
        4 => e(Time, "DRAFT_LOCAL_TIME", Draft),
        5 => e(Text, "DRAFT_FRIENDLY_NAME", Draft),
        68 => e(Value, "OFFLINE_VERSION", Dest::None),
        89 => e(Bool, "HIDE_EDIT", Dest::None),
        _ => return None,
    })
}

/// Gallery-state table — `core/archive/gallery_cache.cpp`.
pub fn gallery_state(tag: u32) -> Option<TagEntry> {
    use Dest::State;
    use Reader::*;
    Some(match tag {
        1 => e(Text, "PATCH_VERSION", Dest::None),
        2 => e(MessageId, "LAST_ENTRY", State),
        3 => e(Value, "LAST_ENTRY_SEQUENCE_NO", Dest::None),
        4 => e(MessageId, "FIRST_ENTRY", State),
        5 => e(Value, "FIRST_ENTRY_SEQUENCE_NO", Dest::None),
        6 => e(Value, "IMAGE_COUNT", State),
        7 => e(Value, "VIDEO_COUNT", State),
        8 => e(Value, "FILE_COUNT", State),
        9 => e(Value, "LINK_COUNT", State),
        10 => e(Value, "PTT_COUNT", State),
        11 => e(Value, "AUDIO_COUNT", State),
        12 => e(Bool, "PATCH_VERSION_CHANGED", Dest::None),
        _ => return None,
    })
}

/// Dialog-state table — `im-desktop/core/archive/dlg_state.cpp`. Tag 20
/// (`HEADS`) announces the heads sub-block; tag 7 announces an embedded
/// message-history sub-block (spec.md §4.2 "Embedded message-history
/// fields in dialog state").
pub fn dialog_state(tag: u32) -> Option<TagEntry> {
    use Dest::DialogState;
    use Reader::*;
    Some(match tag {
        1 => e(Value, "UNREAD_COUNT", DialogState),
        2 => e(MessageId, "LAST_MESSAGE_ID", DialogState),
        3 => e(MessageId, "YOURS_LAST_READ", DialogState),
        4 => e(MessageId, "THEIRS_LAST_READ", DialogState),
        5 => e(MessageId, "THEIRS_LAST_DELIVERED", DialogState),
        7 => e(Size, "LAST_MESSAGE_CONTENT_SIZE", DialogState),
        8 => e(Bool, "VISIBLE", DialogState),
        9 => e(Unknown, "LAST_MESSAGE_FRIENDLY_UNUSED", Dest::None),
        10 => e(Text, "PATCH_VERSION", Dest::None),
        11 => e(MessageId, "DEL_UP_TO", Dest::None),
        12 => e(Text, "FRIENDLY_NAME", DialogState),
        13 => e(Bool, "OFFICIAL", DialogState),
        14 => e(Bool, "FAKE", DialogState),
        15 => e(MessageId, "HIDDEN_MESSAGE_ID", DialogState),
        16 => e(Value, "UNREAD_MENTIONS_COUNT", DialogState),
        17 => e(Unknown, "PINNED_MESSAGE", Dest::None),
        18 => e(Bool, "ATTENTION", Dest::None),
        19 => e(Bool, "SUSPICIOUS", Dest::None),
        20 => e(Unknown, "HEADS", Dest::None),
        21 => e(Text, "HEAD_AIMID", DialogState),
        22 => e(Size, "HEAD_FRIENDLY_BLOCK_SIZE", Dest::None),
        23 => e(MessageId, "LAST_READ_MENTION", DialogState),
        24 => e(Bool, "STRANGER", DialogState),
        25 => e(Text, "INFO_VERSION", Dest::None),
        26 => e(Value, "NO_RECENTS_UPDATE", Dest::None),
        27 => e(Text, "MEMBERS_VERSION", Dest::None),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_history_has_126_known_tags() {
        let known = (0u32..126).filter(|&t| message_history(t).is_some()).count();
        assert_eq!(known, 126);
    }

    #[test]
    fn unknown_tag_outside_catalogue_is_none() {
        assert!(message_history(9999).is_none());
    }

    #[test]
    fn tag1_is_message_id_and_opens_a_record() {
        let entry = message_history(1).unwrap();
        assert_eq!(entry.reader, Reader::MessageId);
        assert_eq!(entry.dest, Dest::Message);
    }
}
