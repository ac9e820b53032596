//! Upload slots: size limit and the two ways a file gets picked.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::fields::UPLOAD_SLOTS;
use crate::api::Attachment;

pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

pub const TOO_LARGE_MESSAGE: &str = "Le fichier est trop volumineux (max 5 Mo)";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("unknown upload slot `{0}`")]
    UnknownSlot(String),

    #[error("Le fichier est trop volumineux (max 5 Mo)")]
    TooLarge { file_name: String, size: u64 },

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Browsing hands over a path; dropping hands over bytes already in memory.
/// Both go through `resolve` and the same size check.
#[derive(Debug, Clone)]
pub enum UploadSource {
    Browse(PathBuf),
    Drop(Attachment),
}

pub fn ensure_slot(slot: &str) -> Result<(), UploadError> {
    if UPLOAD_SLOTS.contains(&slot) {
        Ok(())
    } else {
        Err(UploadError::UnknownSlot(slot.to_string()))
    }
}

fn check_size(file_name: &str, size: u64) -> Result<(), UploadError> {
    if size > MAX_FILE_SIZE {
        return Err(UploadError::TooLarge {
            file_name: file_name.to_string(),
            size,
        });
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl UploadSource {
    /// Turn the source into an attachment, refusing anything over the limit.
    /// Oversized files on disk are rejected from their metadata without
    /// being read.
    pub fn resolve(self) -> Result<Attachment, UploadError> {
        match self {
            UploadSource::Drop(attachment) => {
                check_size(&attachment.file_name, attachment.size() as u64)?;
                Ok(attachment)
            }
            UploadSource::Browse(path) => {
                let read_err = |source| UploadError::Read {
                    path: path.clone(),
                    source,
                };
                let file_name = display_name(&path);
                let size = std::fs::metadata(&path).map_err(read_err)?.len();
                check_size(&file_name, size)?;
                let bytes = std::fs::read(&path).map_err(read_err)?;
                check_size(&file_name, bytes.len() as u64)?;
                Ok(Attachment::new(file_name, bytes))
            }
        }
    }
}
