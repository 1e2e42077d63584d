//! Filesystem helpers shared by the file-backed adapters

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use serde::Serialize;
use serde::de::DeserializeOwned;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write `content` to `path` via a temp file and rename
///
/// Readers see either the previous file or the complete new one.
pub fn write_atomic(path: &Path, content: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?;
    fs::create_dir_all(parent)?;

    let name = path.file_name().map_or_else(String::new, |n| n.to_string_lossy().to_string());
    let unique = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp = parent.join(format!(".{name}.{}.{unique}.tmp", std::process::id()));

    fs::write(&tmp, content).with_context(|| format!("Failed to write {}", tmp.display()))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
    }
    Ok(())
}

/// Serialize `value` as pretty JSON and write it atomically
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let content = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &content)
}

/// Read a JSON file, `None` if it does not exist
pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Option<T>> {
    match fs::read(path) {
        Ok(bytes) => {
            let value = serde_json::from_slice(&bytes)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            Ok(Some(value))
        },
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Reject names that could escape their parent directory
pub fn check_path_segment(kind: &str, name: &str) -> anyhow::Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        anyhow::bail!("Invalid {kind} name: '{name}'")
    }
}
