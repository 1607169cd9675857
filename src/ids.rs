//! Opaque workflow identifiers.
//!
//! A workflow id is the unpadded base64url encoding of its path relative to
//! the corpus root. The encoding is reversible; the decoding side is the
//! security boundary: before any decoded path touches the filesystem it must
//! pass [`resolve_under_root`], which rejects ids crafted to escape the root.

use anyhow::{bail, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::path::{Component, Path, PathBuf};

/// Encodes a corpus-relative path as an opaque, URL-safe workflow id.
pub fn encode_workflow_id(relative_path: &str) -> String {
    URL_SAFE_NO_PAD.encode(relative_path.as_bytes())
}

/// Decodes a workflow id back to the corpus-relative path it encodes.
///
/// Fails with an "invalid workflow id" error on empty input, on anything
/// that is not unpadded base64url, and on non-UTF-8 payloads. Decoding alone
/// does not authorize a filesystem read; see [`resolve_under_root`].
pub fn decode_workflow_id(id: &str) -> Result<String> {
    if id.is_empty() {
        bail!("invalid workflow id: empty");
    }
    let bytes = match URL_SAFE_NO_PAD.decode(id.as_bytes()) {
        Ok(bytes) => bytes,
        Err(_) => bail!("invalid workflow id: not base64url"),
    };
    match String::from_utf8(bytes) {
        Ok(path) => Ok(path),
        Err(_) => bail!("invalid workflow id: not valid UTF-8"),
    }
}

/// Resolves a decoded relative path against the corpus root, enforcing
/// containment.
///
/// Rejects empty paths, absolute paths, and any path containing a `..`
/// component, then verifies the joined result is still prefixed by the root.
/// Only a path that passes every check may be read from disk.
pub fn resolve_under_root(root: &Path, relative_path: &str) -> Result<PathBuf> {
    if relative_path.is_empty() {
        bail!("invalid workflow id: empty path");
    }
    let relative = Path::new(relative_path);
    for component in relative.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                bail!("invalid workflow id: path escapes the catalog root");
            }
        }
    }
    let resolved = root.join(relative);
    if !resolved.starts_with(root) {
        bail!("invalid workflow id: path escapes the catalog root");
    }
    Ok(resolved)
}
