// src/commands/tar/archive.rs

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Read;
use std::time::{SystemTime, UNIX_EPOCH};
use tar::{EntryType, Header};

use crate::commands::utils::archive::{ArchiveEntry, EntryKind};
use crate::error::ShellError;

fn archive_err(err: std::io::Error) -> ShellError {
    ShellError::Archive(format!("tar: {}", err))
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Encode entries as a gzip-compressed tar stream.
pub fn pack_tar_gz(entries: &[ArchiveEntry]) -> Result<Vec<u8>, ShellError> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let mtime = now_secs();

    for entry in entries {
        let mut header = Header::new_gnu();
        header.set_mtime(mtime);
        match &entry.kind {
            EntryKind::File(content) => {
                header.set_entry_type(EntryType::Regular);
                header.set_mode(0o644);
                header.set_size(content.len() as u64);
                builder
                    .append_data(&mut header, &entry.name, content.as_slice())
                    .map_err(archive_err)?;
            }
            EntryKind::Dir => {
                header.set_entry_type(EntryType::Directory);
                header.set_mode(0o755);
                header.set_size(0);
                builder
                    .append_data(&mut header, format!("{}/", entry.name), std::io::empty())
                    .map_err(archive_err)?;
            }
            EntryKind::Unsupported(kind) => {
                return Err(ShellError::Archive(format!(
                    "tar: cannot pack {} '{}'",
                    kind, entry.name
                )))
            }
        }
    }

    let encoder = builder.into_inner().map_err(archive_err)?;
    encoder.finish().map_err(archive_err)
}

/// Decode a gzip-compressed tar stream. Links and special files come back as
/// `Unsupported` so the caller can refuse the whole archive.
pub fn unpack_tar_gz(bytes: &[u8]) -> Result<Vec<ArchiveEntry>, ShellError> {
    let mut archive = tar::Archive::new(GzDecoder::new(bytes));
    let mut out = Vec::new();

    for entry in archive.entries().map_err(archive_err)? {
        let mut entry = entry.map_err(archive_err)?;
        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let entry_type = entry.header().entry_type();
        let kind = match entry_type {
            EntryType::Regular | EntryType::Continuous => {
                let mut content = Vec::new();
                entry.read_to_end(&mut content).map_err(archive_err)?;
                EntryKind::File(content)
            }
            EntryType::Directory => EntryKind::Dir,
            EntryType::XGlobalHeader | EntryType::XHeader => continue,
            EntryType::Symlink => EntryKind::Unsupported("symlink"),
            EntryType::Link => EntryKind::Unsupported("hard link"),
            EntryType::Char | EntryType::Block => EntryKind::Unsupported("device"),
            EntryType::Fifo => EntryKind::Unsupported("fifo"),
            _ => EntryKind::Unsupported("unknown entry type"),
        };
        out.push(ArchiveEntry { name, kind });
    }
    Ok(out)
}
