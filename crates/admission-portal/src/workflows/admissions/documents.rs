use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::domain::{DocumentRef, DocumentSlot, StoredDocument};
use super::steps::AdmissionPolicy;
use crate::workflows::accounts::UserId;

/// File posted by the applicant for one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub slot: DocumentSlot,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Upload that passed slot validation and is ready for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedUpload {
    pub slot: DocumentSlot,
    pub extension: String,
    pub content_type: mime::Mime,
    pub bytes: Vec<u8>,
}

impl AcceptedUpload {
    pub fn into_stored(self, reference: DocumentRef, uploaded_at: DateTime<Utc>) -> StoredDocument {
        StoredDocument {
            reference,
            content_type: self.content_type.essence_str().to_string(),
            size_bytes: self.bytes.len() as u64,
            uploaded_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("{} is empty.", .slot.label())]
    EmptyFile { slot: DocumentSlot },
    #[error("{} must not exceed {}.", .slot.label(), human_size(.max_bytes))]
    FileTooLarge {
        slot: DocumentSlot,
        max_bytes: u64,
        found: u64,
    },
    #[error("{} must be one of: {}.", .slot.label(), .slot.allowed_extensions().join(", "))]
    UnsupportedFormat {
        slot: DocumentSlot,
        extension: String,
    },
}

impl DocumentError {
    pub fn slot(&self) -> DocumentSlot {
        match self {
            DocumentError::EmptyFile { slot }
            | DocumentError::FileTooLarge { slot, .. }
            | DocumentError::UnsupportedFormat { slot, .. } => *slot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("document storage unavailable: {0}")]
    Unavailable(String),
    #[error("stored document not found")]
    NotFound,
}

/// Byte store for applicant documents.
pub trait StorageCollaborator: Send + Sync {
    fn store(&self, bytes: &[u8], generated_name: &str) -> Result<DocumentRef, StorageError>;
    fn delete(&self, reference: &DocumentRef) -> Result<(), StorageError>;
}

/// Check extension and size for the slot. Size limits are inclusive.
pub fn validate_upload(
    upload: DocumentUpload,
    policy: &AdmissionPolicy,
) -> Result<AcceptedUpload, DocumentError> {
    let slot = upload.slot;
    let extension = extension_of(&upload.file_name);
    if !slot.allowed_extensions().contains(&extension.as_str()) {
        return Err(DocumentError::UnsupportedFormat { slot, extension });
    }

    let size = upload.bytes.len() as u64;
    if size == 0 {
        return Err(DocumentError::EmptyFile { slot });
    }
    let max_bytes = policy.max_bytes_for(slot);
    if size > max_bytes {
        return Err(DocumentError::FileTooLarge {
            slot,
            max_bytes,
            found: size,
        });
    }

    let content_type = mime_guess::from_ext(&extension).first_or_octet_stream();
    Ok(AcceptedUpload {
        slot,
        extension,
        content_type,
        bytes: upload.bytes,
    })
}

/// Lowercased text after the final dot, or empty when there is none.
pub fn extension_of(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => extension.to_ascii_lowercase(),
        _ => String::new(),
    }
}

/// Storage name `uploads/user_<id>/<random hex>.<extension>`.
pub fn generated_name(user_id: &UserId, extension: &str) -> String {
    format!(
        "uploads/user_{user_id}/{}.{extension}",
        Uuid::new_v4().simple()
    )
}

fn human_size(bytes: &u64) -> String {
    const MIB: u64 = 1024 * 1024;
    let bytes = *bytes;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{bytes} bytes")
    }
}
