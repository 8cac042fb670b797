//! Recordings-directory handling.
//!
//! All recording I/O goes through these helpers: filenames are validated
//! before they touch the filesystem, and the directory listing only shows
//! files that carry the recording magic.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use reel_format::is_recording_file;

use crate::error::SessionError;

/// Reject filenames that could escape the recordings directory.
///
/// Path separators, drive/stream separators, and parent-directory
/// sequences are all refused; the name must be a plain file name.
pub fn validate_filename(name: &str) -> Result<(), SessionError> {
    if name.is_empty() {
        return Err(SessionError::Config {
            detail: "empty filename".to_string(),
        });
    }
    if name.contains('/') || name.contains('\\') || name.contains(':') || name.contains("..") {
        return Err(SessionError::Config {
            detail: format!("bad filename: {name}"),
        });
    }
    Ok(())
}

/// Create the recordings directory if it does not exist.
pub fn ensure_dir(dir: &Path) -> Result<(), SessionError> {
    fs::create_dir_all(dir).map_err(|e| SessionError::Config {
        detail: format!("cannot create directory {}: {e}", dir.display()),
    })
}

/// Open a recording file for writing, creating the directory if needed.
pub fn open_write(dir: &Path, name: &str) -> Result<BufWriter<File>, SessionError> {
    validate_filename(name)?;
    ensure_dir(dir)?;
    let file = File::create(dir.join(name))?;
    Ok(BufWriter::new(file))
}

/// Open a recording file for reading.
pub fn open_read(dir: &Path, name: &str) -> Result<BufReader<File>, SessionError> {
    validate_filename(name)?;
    let path = dir.join(name);
    match File::open(&path) {
        Ok(file) => Ok(BufReader::new(file)),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(SessionError::NotFound {
            detail: format!("no such recording: {name}"),
        }),
        Err(e) => Err(SessionError::Io(e)),
    }
}

/// List recording files in the directory, sorted by name.
///
/// Only files starting with the recording magic are included; anything
/// else in the directory is ignored.
pub fn list_recordings(dir: &Path) -> Result<Vec<String>, SessionError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(SessionError::Io(e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path: PathBuf = entry.path();
        if !path.is_file() || !is_recording_file(&path) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}
