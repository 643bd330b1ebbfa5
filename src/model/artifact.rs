//! Artifact persistence
//!
//! Every artifact is CBOR on disk. Writes go to a sibling `.tmp` file
//! that is renamed over the target once complete, so a reader never
//! sees a half-written artifact under the real name.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::{Result, TopicError};

/// Serialize `value` to `path` atomically
pub(crate) fn save<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize,
{
    write_atomic(path, |writer| {
        serde_cbor::to_writer(writer, value)?;
        Ok(())
    })
}

/// Deserialize an artifact written by `save`
pub(crate) fn load<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let file = open(path)?;
    let value = serde_cbor::from_reader(BufReader::new(file)).map_err(|e| TopicError::CorruptArtifact {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    debug!(path = %path.display(), "artifact loaded");
    Ok(value)
}

/// Open an artifact for reading, mapping "not found" to `MissingArtifact`
pub(crate) fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => TopicError::MissingArtifact(path.to_path_buf()),
        _ => TopicError::Io(e),
    })
}

/// Run `fill` against a buffered writer on a temporary file,
/// then move the file into place
pub(crate) fn write_atomic<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let tmp = tmp_path(path);
    let written = (|| -> Result<()> {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        fill(&mut writer)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    })();
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path)?;
    debug!(path = %path.display(), "artifact written");
    Ok(())
}

/// Remove an artifact if present
///
/// # Returns
/// * `bool` - whether a file was removed
pub(crate) fn remove(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.bin");
        save(&path, &vec![1u32, 2, 3]).unwrap();
        let back: Vec<u32> = load(&path).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.bin");
        let res = write_atomic(&path, |_| Err(TopicError::InvalidConfig("stop".into())));
        assert!(res.is_err());
        assert!(!path.exists());
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn corrupt_content_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.bin");
        fs::write(&path, [0xffu8, 0x00, 0x13]).unwrap();
        assert!(matches!(load::<Vec<u32>>(&path), Err(TopicError::CorruptArtifact { .. })));
    }

    #[test]
    fn remove_reports_presence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.bin");
        assert!(!remove(&path).unwrap());
        save(&path, &1u8).unwrap();
        assert!(remove(&path).unwrap());
        assert!(!path.exists());
    }
}
