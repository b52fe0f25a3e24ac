//! Sibling name resolution.
//!
//! Names are normalized to lowercase and made unique among siblings by a
//! deterministic suffixing rule: a colliding `trace` becomes `trace-1`, a
//! colliding `trace-1` becomes `trace-2`, and so on. Only a trailing
//! `-<single digit>` is recognized as a version suffix, so `trace-10`
//! collides into `trace-10-1`. Catalog and collection names are claimed by
//! creating their directory (the filesystem is the atomicity check); record
//! names are resolved against the in-memory sibling map only.

use crate::error::CatalogError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Normalize a catalog/collection/record name: lowercase, non-empty.
pub fn normalize(name: &str) -> Result<String, CatalogError> {
    if name.trim().is_empty() {
        return Err(CatalogError::InvalidInput(
            "name must not be empty".to_string(),
        ));
    }
    Ok(name.to_lowercase())
}

/// Normalize a metadata key. Keys are lowercased like names but may be any
/// non-empty string.
pub fn normalize_key(key: &str) -> Result<String, CatalogError> {
    if key.is_empty() {
        return Err(CatalogError::InvalidInput(
            "metadata key must not be empty".to_string(),
        ));
    }
    Ok(key.to_lowercase())
}

/// Whether the name ends in `-<single ASCII digit>`.
fn has_version_suffix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 2
        && bytes[bytes.len() - 1].is_ascii_digit()
        && bytes[bytes.len() - 2] == b'-'
}

/// Produce the next candidate in the collision chain.
pub fn bump(name: &str) -> String {
    if has_version_suffix(name) {
        // Last byte is an ASCII digit, checked above.
        let digit = (name.as_bytes()[name.len() - 1] - b'0') as u32;
        format!("{}{}", &name[..name.len() - 1], digit + 1)
    } else {
        format!("{name}-1")
    }
}

/// Resolve a unique name against an in-memory predicate.
///
/// The predicate answers "is this candidate already taken". Used for record
/// names, which are checked only against the sibling map, not the
/// filesystem.
pub fn resolve_in_memory(desired: &str, taken: impl Fn(&str) -> bool) -> String {
    let mut candidate = desired.to_string();
    while taken(&candidate) {
        candidate = bump(&candidate);
    }
    candidate
}

/// Claim a unique directory name under `parent` by attempting to create it.
///
/// `fs::create_dir` doubles as the collision check: on `AlreadyExists` the
/// candidate is bumped and the attempt repeated. On success the listed
/// subdirectories are created inside the new directory and the final name is
/// returned.
pub fn claim_directory(
    parent: &Path,
    desired: &str,
    subdirs: &[&str],
) -> Result<String, CatalogError> {
    let mut candidate = desired.to_string();
    loop {
        let dir = parent.join(&candidate);
        match fs::create_dir(&dir) {
            Ok(()) => {
                for sub in subdirs {
                    let sub_dir = dir.join(sub);
                    fs::create_dir(&sub_dir).map_err(|e| CatalogError::fs(&sub_dir, e))?;
                }
                return Ok(candidate);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                candidate = bump(&candidate);
            }
            Err(e) => return Err(CatalogError::fs(&dir, e)),
        }
    }
}

/// Resolve a unique file path `dir/<name>.<ext>` by probing the filesystem.
///
/// Used for visualization outputs. Unlike [`claim_directory`] this does not
/// create the file; the caller (an analysis collaborator) writes it.
pub fn resolve_file_path(dir: &Path, desired: &str, ext: &str) -> (String, PathBuf) {
    let mut candidate = desired.to_string();
    loop {
        let path = dir.join(format!("{candidate}.{ext}"));
        if !path.exists() {
            return (candidate, path);
        }
        candidate = bump(&candidate);
    }
}
