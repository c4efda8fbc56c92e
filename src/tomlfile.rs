//! Small TOML persistence helpers shared by the settings file and the
//! session file.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Who may read the written file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Shared,
    /// Owner-only on unix. Used for anything holding a credential.
    Private,
}

/// Reads `path` as TOML. A missing file is `None` without a warning; an
/// unreadable or malformed one is `None` with one.
pub fn read<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return None,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "unreadable toml file ignored");
            return None;
        }
    };
    toml::from_str(&contents)
        .inspect_err(|err| {
            warn!(path = %path.display(), error = %err, "malformed toml file ignored");
        })
        .ok()
}

/// Serializes `value` next to `path` and renames it into place, so readers
/// never observe a half-written file.
pub fn write<T: Serialize>(path: &Path, value: &T, visibility: Visibility) -> anyhow::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow!("'{}' has no parent directory", path.display()))?;
    let name = path
        .file_name()
        .ok_or_else(|| anyhow!("'{}' has no file name", path.display()))?;
    fs::create_dir_all(dir).with_context(|| format!("cannot create '{}'", dir.display()))?;

    let body = toml::to_string_pretty(value).context("cannot encode toml")?;
    let staging = dir.join(format!(".{}.tmp", name.to_string_lossy()));
    fs::write(&staging, body).with_context(|| format!("cannot write '{}'", staging.display()))?;
    if visibility == Visibility::Private {
        restrict(&staging)?;
    }
    fs::rename(&staging, path)
        .with_context(|| format!("cannot move '{}' into place", staging.display()))
}

/// Deletes `path`; a file that is already gone counts as removed.
pub fn remove(path: &Path) -> anyhow::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != ErrorKind::NotFound => {
            Err(err).with_context(|| format!("cannot delete '{}'", path.display()))
        }
        _ => Ok(()),
    }
}

#[cfg(unix)]
fn restrict(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("cannot restrict '{}'", path.display()))
}

#[cfg(not(unix))]
fn restrict(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}
