//! Temporary on-disk copies of uploads.
//!
//! Converters work on paths, so each upload is written to a uniquely named file
//! in the staging directory for the duration of its request.

use std::{io, path::Path};

use tempfile::TempPath;
use tracing::debug;

use crate::multipart::Upload;

const PREFIX: &str = "upload-";

/// An upload written to disk. The file is deleted by [`StagedFile::remove`], or on drop.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file. A file that is already gone counts as removed.
    pub fn remove(self) -> io::Result<()> {
        match self.path.close() {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Write `upload` to a new file in `dir`, keeping its extension so external tools can sniff it.
///
/// Blocking; call from `spawn_blocking` in async contexts.
pub fn stage(dir: &Path, upload: &Upload) -> io::Result<StagedFile> {
    let suffix = staged_suffix(&upload.filename);
    let mut file = tempfile::Builder::new()
        .prefix(PREFIX)
        .suffix(&suffix)
        .tempfile_in(dir)?;

    io::Write::write_all(&mut file, &upload.bytes)?;
    let path = file.into_temp_path();
    debug!(path = %path.display(), bytes = upload.bytes.len(), "Staged upload");

    Ok(StagedFile { path })
}

/// `.ext` for plain alphanumeric extensions, nothing otherwise.
fn staged_suffix(filename: &str) -> String {
    let extension = crate::conversion::extension_of(filename);
    if !extension.is_empty() && extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        format!(".{extension}")
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn upload(filename: &str, bytes: &'static [u8]) -> Upload {
        Upload {
            filename: filename.to_string(),
            bytes: Bytes::from_static(bytes),
        }
    }

    #[test]
    fn writes_the_upload_with_its_extension() {
        let dir = tempfile::tempdir().unwrap();
        let staged = stage(dir.path(), &upload("Report.PDF", b"%PDF-1.7")).unwrap();

        let name = staged.path().file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with(PREFIX));
        assert!(name.ends_with(".pdf"));
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"%PDF-1.7");

        staged.remove().unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn odd_extensions_are_not_used_as_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let staged = stage(dir.path(), &upload("../../etc/evil.s h", b"x")).unwrap();
        assert_eq!(staged.path().parent(), Some(dir.path()));
        assert!(staged.path().extension().is_none());
    }

    #[test]
    fn concurrent_uploads_with_the_same_name_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let first = stage(dir.path(), &upload("a.txt", b"one")).unwrap();
        let second = stage(dir.path(), &upload("a.txt", b"two")).unwrap();

        assert_ne!(first.path(), second.path());
        assert_eq!(std::fs::read(first.path()).unwrap(), b"one");
        assert_eq!(std::fs::read(second.path()).unwrap(), b"two");
    }

    #[test]
    fn removing_a_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let staged = stage(dir.path(), &upload("a.txt", b"x")).unwrap();
        std::fs::remove_file(staged.path()).unwrap();

        assert!(staged.remove().is_ok());
    }

    #[test]
    fn dropping_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        drop(stage(dir.path(), &upload("a.txt", b"x")).unwrap());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(stage(&missing, &upload("a.txt", b"x")).is_err());
    }
}
