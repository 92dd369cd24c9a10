//! Content-cache correlation support (spec.md §4.5 Steps 7-9).
//!
//! The content cache is an opaque directory of downloaded media bodies
//! plus `.json` sidecars describing each body by MD5. This module only
//! does the filesystem/hash bookkeeping; [`crate::correlate`] drives the
//! actual join.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use serde::Deserialize;

/// `SHARED_CONTENT_FILE_METADATA`/`SHARED_CONTENT_FILE_LOCATION`'s source
/// host prefix (spec.md §6 "the sanitised host prefix").
pub const FILES_HOST_PREFIX: &str = "hxxps://files.icq.net";

pub fn md5_hex(bytes: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Stream a file through MD5 in 64 KiB chunks (spec.md §5 resource
/// policy) rather than reading it fully into memory.
pub fn md5_of_file(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Md5::new();
    let mut buf = [0u8; 65536];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// spec.md §8 "Partial-match": the first `⌊0.5·len(filename)⌋`
/// characters of `filename` must equal the corresponding prefix of
/// `candidate`, compared left to right, stopping at the first mismatch.
pub fn check_partial_match(filename: &str, candidate: &str) -> bool {
    let required = filename.len() / 2;
    let matched = filename
        .chars()
        .zip(candidate.chars())
        .take_while(|(a, b)| a == b)
        .count();
    matched >= required
}

/// Enumerate a content-cache directory into (filename without extension
/// considerations, full path) pairs, split by whether the file is a
/// `.json` sidecar, plus any subdirectories (spec.md §4.5 Steps 8/9
/// "companion directory").
pub struct ContentCacheListing {
    pub bodies: Vec<PathBuf>,
    pub sidecars: Vec<PathBuf>,
    pub companion_dirs: Vec<PathBuf>,
}

pub fn enumerate(dir: &Path) -> std::io::Result<ContentCacheListing> {
    let mut bodies = Vec::new();
    let mut sidecars = Vec::new();
    let mut companion_dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            companion_dirs.push(path);
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            sidecars.push(path);
        } else {
            bodies.push(path);
        }
    }
    Ok(ContentCacheListing { bodies, sidecars, companion_dirs })
}

/// Find the companion directory (if any) whose name partial-matches
/// `sidecar_name` by the same 50%-prefix rule used for body filenames
/// (spec.md §4.5 Step 8).
pub fn find_companion_dir<'a>(dirs: &'a [PathBuf], sidecar_name: &str) -> Option<&'a PathBuf> {
    dirs.iter().find(|dir| {
        dir.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| check_partial_match(name, sidecar_name))
    })
}

/// Filenames directly inside a companion directory, for the "listing"
/// spec.md §4.5 Step 8 says to attach alongside its path.
pub fn list_dir(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "cannot list companion directory, skipping listing");
        return Vec::new();
    };
    entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct SidecarFileInfo {
    pub file_name: String,
    pub file_size: u64,
    pub md5: String,
    pub mime: String,
}

#[derive(Debug, Deserialize)]
struct SidecarResultShape {
    info: SidecarFileInfo,
}

#[derive(Debug, Deserialize)]
struct SidecarFileShape {
    result: SidecarResultShape,
}

#[derive(Debug, Deserialize)]
pub struct SidecarDocInfo {
    pub url: String,
    pub fetch_ts: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SidecarDocShape {
    doc: SidecarDocInfo,
}

pub enum Sidecar {
    FileDescriptor(SidecarFileInfo),
    UrlMetadata(SidecarDocInfo),
    Unrecognised,
}

/// Parse a sidecar JSON into whichever of the two known shapes it
/// matches (spec.md §4.5 Steps 8/9), or `Unrecognised` if neither fits.
pub fn parse_sidecar(path: &Path) -> Option<Sidecar> {
    let raw = match std::fs::read_to_string(path) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "cannot read sidecar, skipping");
            return None;
        }
    };
    if let Ok(shape) = serde_json::from_str::<SidecarFileShape>(&raw) {
        return Some(Sidecar::FileDescriptor(shape.result.info));
    }
    if let Ok(shape) = serde_json::from_str::<SidecarDocShape>(&raw) {
        return Some(Sidecar::UrlMetadata(shape.doc));
    }
    Some(Sidecar::Unrecognised)
}

/// Local-file MD5 -> path, built once per correlation pass and reused
/// across Steps 7-9 (spec.md §5 "content cache is enumerated once and
/// cached as an in-memory filename -> metadata map").
pub fn hash_bodies(bodies: &[PathBuf]) -> BTreeMap<String, PathBuf> {
    let mut out = BTreeMap::new();
    for path in bodies {
        match md5_of_file(path) {
            Ok(digest) => {
                out.insert(digest, path.clone());
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "cannot hash content-cache body, skipping");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_match_true_at_threshold() {
        assert!(check_partial_match("abcdef", "abcxyz"));
    }

    #[test]
    fn partial_match_false_below_threshold() {
        assert!(!check_partial_match("abcdef", "abxxxx"));
    }

    #[test]
    fn md5_hex_is_stable() {
        assert_eq!(md5_hex(b"hello"), "5d41402abc4b2a76b9719d911017c592");
    }
}
