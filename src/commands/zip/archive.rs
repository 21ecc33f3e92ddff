// src/commands/zip/archive.rs

use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::commands::utils::archive::{ArchiveEntry, EntryKind};
use crate::error::ShellError;

const S_IFMT: u32 = 0o170000;
const S_IFREG: u32 = 0o100000;
const S_IFDIR: u32 = 0o040000;
const S_IFLNK: u32 = 0o120000;

fn archive_err(err: impl std::fmt::Display) -> ShellError {
    ShellError::Archive(format!("zip: {}", err))
}

/// Encode entries as a deflated zip archive.
pub fn pack_zip(entries: &[ArchiveEntry]) -> Result<Vec<u8>, ShellError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let file_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    let dir_options = SimpleFileOptions::default().unix_permissions(0o755);

    for entry in entries {
        match &entry.kind {
            EntryKind::File(content) => {
                writer
                    .start_file(entry.name.as_str(), file_options)
                    .map_err(archive_err)?;
                writer.write_all(content).map_err(archive_err)?;
            }
            EntryKind::Dir => {
                writer
                    .add_directory(entry.name.as_str(), dir_options)
                    .map_err(archive_err)?;
            }
            EntryKind::Unsupported(kind) => {
                return Err(archive_err(format!("cannot pack {} '{}'", kind, entry.name)))
            }
        }
    }

    let cursor = writer.finish().map_err(archive_err)?;
    Ok(cursor.into_inner())
}

/// Decode a zip archive. Entries whose unix mode marks them as links or
/// special files come back as `Unsupported`.
pub fn unpack_zip(bytes: &[u8]) -> Result<Vec<ArchiveEntry>, ShellError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(archive_err)?;
    let mut out = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(archive_err)?;
        let name = file.name().to_string();
        let file_type = file.unix_mode().map(|mode| mode & S_IFMT).unwrap_or(0);
        let kind = match file_type {
            S_IFLNK => EntryKind::Unsupported("symlink"),
            0 | S_IFREG | S_IFDIR => {
                if file.is_dir() || file_type == S_IFDIR {
                    EntryKind::Dir
                } else {
                    let mut content = Vec::new();
                    file.read_to_end(&mut content).map_err(archive_err)?;
                    EntryKind::File(content)
                }
            }
            _ => EntryKind::Unsupported("special file"),
        };
        out.push(ArchiveEntry { name, kind });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack() {
        let entries = vec![
            ArchiveEntry::dir("photos"),
            ArchiveEntry::file("photos/a.png", b"PNG".to_vec()),
        ];
        let bytes = pack_zip(&entries).unwrap();
        assert_eq!(&bytes[..2], b"PK");

        let back = unpack_zip(&bytes).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].kind, EntryKind::Dir);
        assert_eq!(back[1], ArchiveEntry::file("photos/a.png", b"PNG".to_vec()));
    }

    #[test]
    fn test_symlink_is_unsupported() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .add_symlink("evil", "/etc/passwd", SimpleFileOptions::default())
            .unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let entries = unpack_zip(&bytes).unwrap();
        assert_eq!(entries[0].kind, EntryKind::Unsupported("symlink"));
    }

    #[test]
    fn test_garbage_is_archive_error() {
        let err = unpack_zip(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, ShellError::Archive(_)));
    }
}
