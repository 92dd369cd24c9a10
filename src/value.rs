//! Heterogeneous value carrier produced by the primitive readers.
//!
//! The tag tables dispatch to readers of very different shapes (a bare
//! integer, a formatted timestamp string, a bit-flag map, a list of chat
//! members...). Rather than give every reader its own return type and the
//! routing layer a matching match-arm per reader, every reader returns a
//! [`Value`] and the routing layer projects it into the output record
//! without needing to know which reader produced it.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::primitives::{ChatMember, EventTime, Resolution};

/// A decoded field value, or the absence of one (framing-only tags).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    UInt(u64),
    Text(String),
    /// Named bit-flag set, e.g. the message-flags reader.
    Flags(BTreeMap<&'static str, bool>),
    /// Pipe-joined flag names, e.g. the format-flags reader.
    FlagList(String),
    /// member-id -> display name, from the chat-members reader.
    Members(BTreeMap<u32, String>),
    Resolution(Resolution),
    EventTimes(Vec<EventTime>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for values the source's `if not self.VERBOSE and value == "":`
    /// guard would have dropped — an empty string decoded from a
    /// zero-length text field.
    pub fn is_empty_text(&self) -> bool {
        matches!(self, Value::Text(t) if t.is_empty())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Value::Text(t) => Some(t),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}
