//! # icq-artifact-extractor
//!
//! A forensic extractor for a defunct instant-messaging client's on-disk
//! artifacts. Given a directory tree captured from a desktop
//! installation, it decodes the client's hand-rolled binary TLV record
//! streams (`_db*`, `_gc*`, `_gs*`, `_ste*`, `_draft*`, `call_log.cache`,
//! `info/cache`, `ui2.stg`), its Base62 file-sharing URI scheme, and the
//! companion JSON caches, then correlates all of it into one graph of
//! messages, shared files, dialog states, and cached URL metadata.
//!
//! The iOS/sqlite branch, the web renderer and PDF pipeline, and the CLI
//! argument surface are deliberately out of scope (see `main.rs` for the
//! thin entry point this crate actually ships).
//!
//! ## Architecture
//!
//! - [`primitives`] — typed byte-slice decoders (integer, text,
//!   timestamp, message-id, flag sets, ...)
//! - [`value`] — the heterogeneous value carrier every reader produces
//! - [`stream`] — the block/field framing engine
//! - [`tags`] — per-family tag -> (reader, name, destination) tables
//! - [`error`] — the internal decode-path error taxonomy
//! - [`decode`] — one module per artifact family's decode loop
//! - [`fileshare`] — the Base62 file-sharing URI decoder
//! - [`model`] — output record types and the accumulating [`model::Store`]
//! - [`discover`] — input-directory walk and classification
//! - [`json_ingest`] — the JSON-form artifact readers
//! - [`cache`] — content-cache MD5/sidecar bookkeeping
//! - [`correlate`] — the nine-step cross-artifact join

pub mod cache;
pub mod correlate;
pub mod decode;
pub mod discover;
pub mod error;
pub mod fileshare;
pub mod json_ingest;
pub mod model;
pub mod primitives;
pub mod stream;
pub mod tags;
pub mod value;
