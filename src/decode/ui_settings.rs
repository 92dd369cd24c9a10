//! UI-settings decode loop (`ui2.stg`, spec.md §4.2 final paragraph).
//!
//! Unlike every other binary family this isn't a block-of-fields stream:
//! it's a flat run of `(header:u64, title-length:u32, payload-size:u32,
//! title:UTF-8, value-payload)` quintuples, title-keyed rather than
//! tag-keyed (spec.md §4.3 "UI settings — title-keyed rather than
//! tag-keyed"). The title dictionary itself isn't named in the retrieved
//! source excerpt, so it's invented at the same level of specificity the
//! rest of this family is specified at (see SPEC_FULL.md §4.8).

use std::path::Path;

use crate::tags::Reader;
use crate::value::Value;

/// Closed dictionary: title substring -> primitive reader. `ui2.stg`
/// titles are looked up by substring match (not exact), since the
/// `favorites_pinned_on_start` title embeds a user-id prefix ahead of the
/// fixed suffix.
const TITLE_READERS: &[(&str, Reader)] = &[
    ("show_notifications", Reader::Bool),
    ("play_sound_on_message", Reader::Bool),
    ("show_tray_icon", Reader::Bool),
    ("start_minimized", Reader::Bool),
    ("auto_start_on_login", Reader::Bool),
    ("send_on_enter", Reader::Bool),
    ("spellcheck_enabled", Reader::Bool),
    ("show_last_seen", Reader::Bool),
    ("compact_mode", Reader::Bool),
    ("dark_theme_enabled", Reader::Bool),
    ("large_emoji_enabled", Reader::Bool),
    ("show_read_receipts", Reader::Bool),
    ("auto_download_media", Reader::Bool),
    ("auto_download_limit_mb", Reader::Value),
    ("message_font_size", Reader::Value),
    ("sidebar_width", Reader::Value),
    ("last_active_chat", Reader::Text),
    ("language_code", Reader::Text),
    ("proxy_host", Reader::Text),
    ("proxy_port", Reader::Value),
    ("download_directory", Reader::Text),
    ("main_window_resolution", Reader::Resolution),
    ("recent_emoji_usage_log", Reader::EventTimes),
    ("unread_badge_enabled", Reader::Bool),
    ("mute_until_epoch", Reader::Value),
    ("last_update_check_epoch", Reader::Value),
    ("contact_sort_order", Reader::Text),
    ("sticker_panel_recent", Reader::Text),
    ("call_ringtone_name", Reader::Text),
    ("favorites_pinned_on_start", Reader::Bool),
];

#[derive(Debug, Default)]
pub struct UiSettings {
    pub global: std::collections::BTreeMap<&'static str, Value>,
    /// user-id -> pinned flag, recovered from the `favorites_pinned_on_start`
    /// title's user-id prefix (spec.md §4.2).
    pub favorites_pinned_on_start: std::collections::BTreeMap<String, bool>,
}

pub fn decode(buf: &[u8], settings: &mut UiSettings, artifact: &Path) {
    let mut cursor = 0usize;
    while cursor + 16 <= buf.len() {
        let title_len =
            u32::from_le_bytes(buf[cursor + 8..cursor + 12].try_into().unwrap()) as usize;
        let payload_size =
            u32::from_le_bytes(buf[cursor + 12..cursor + 16].try_into().unwrap()) as usize;
        let title_start = cursor + 16;
        let title_end = title_start + title_len;
        let payload_end = title_end + payload_size;
        if payload_end > buf.len() {
            super::log_structural_corruption(artifact, "title/payload ran past end of file");
            break;
        }

        let title = match std::str::from_utf8(&buf[title_start..title_end]) {
            Ok(t) => t,
            Err(e) => {
                super::log_semantic_violation(artifact, 0, e);
                cursor = payload_end;
                continue;
            }
        };
        let payload = &buf[title_end..payload_end];

        if title.contains("splitter") {
            cursor = payload_end;
            continue;
        }

        if let Some(prefix) = title.strip_suffix("favorites_pinned_on_start") {
            let uid = prefix.trim_end_matches(['_', '.', '/']).to_string();
            let pinned = payload.first().copied().unwrap_or(0) != 0;
            settings.favorites_pinned_on_start.insert(uid, pinned);
            cursor = payload_end;
            continue;
        }

        if let Some((name, reader)) =
            TITLE_READERS.iter().find(|(name, _)| title.contains(name))
        {
            match super::read_generic(*reader, payload, payload.len()) {
                Ok(Some(value)) => {
                    settings.global.insert(name, value);
                }
                Ok(None) => {}
                Err(e) => super::log_semantic_violation(artifact, 0, e),
            }
        }

        cursor = payload_end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, payload: &[u8]) -> Vec<u8> {
        let mut v = 0u64.to_le_bytes().to_vec();
        v.extend((title.len() as u32).to_le_bytes());
        v.extend((payload.len() as u32).to_le_bytes());
        v.extend(title.as_bytes());
        v.extend(payload);
        v
    }

    #[test]
    fn bool_setting_decodes() {
        let buf = entry("show_tray_icon", &[1]);
        let mut settings = UiSettings::default();
        decode(&buf, &mut settings, Path::new("test"));
        assert_eq!(settings.global.get("show_tray_icon"), Some(&Value::Bool(true)));
    }

    #[test]
    fn favorites_pinned_recovers_uid_prefix() {
        let buf = entry("123456789_favorites_pinned_on_start", &[1]);
        let mut settings = UiSettings::default();
        decode(&buf, &mut settings, Path::new("test"));
        assert_eq!(settings.favorites_pinned_on_start.get("123456789"), Some(&true));
    }

    #[test]
    fn splitter_title_is_skipped() {
        let buf = entry("main_splitter_geometry", &[0xDE, 0xAD]);
        let mut settings = UiSettings::default();
        decode(&buf, &mut settings, Path::new("test"));
        assert!(settings.global.is_empty());
    }

    #[test]
    fn main_window_resolution_decodes_full_quad() {
        let mut payload = 0u32.to_le_bytes().to_vec();
        payload.extend(10u32.to_le_bytes());
        payload.extend(1920u32.to_le_bytes());
        payload.extend(1080u32.to_le_bytes());
        let buf = entry("main_window_resolution", &payload);
        let mut settings = UiSettings::default();
        decode(&buf, &mut settings, Path::new("test"));
        assert_eq!(
            settings.global.get("main_window_resolution"),
            Some(&Value::Resolution(crate::primitives::Resolution { x: 0, y: 0, w: 1920, h: 1080 }))
        );
    }
}
