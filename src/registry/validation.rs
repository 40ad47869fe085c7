//! Input validation for registry and forum calls.
//!
//! All checks run before any state is touched, so a rejected call never
//! leaves partial effects behind.

use crate::config::Limits;
use crate::error::{RegistryError, Result};
use crate::registry::types::Attachment;

/// Validates a user or forum name.
pub fn validate_name(name: &str, limits: &Limits) -> Result<()> {
    if name.is_empty() {
        return Err(RegistryError::validation("Name cannot be empty"));
    }
    if name.len() > limits.max_name_len {
        return Err(RegistryError::validation(format!(
            "Name exceeds maximum size of {} bytes",
            limits.max_name_len
        )));
    }
    Ok(())
}

/// Validates a thread subject. An empty subject is allowed and hashes to a
/// valid thread key.
pub fn validate_subject(subject: &str, limits: &Limits) -> Result<()> {
    if subject.len() > limits.max_subject_len {
        return Err(RegistryError::validation(format!(
            "Thread subject exceeds maximum size of {} bytes",
            limits.max_subject_len
        )));
    }
    Ok(())
}

/// Validates the attachment list of a post.
pub fn validate_attachments(attachments: &[Attachment], limits: &Limits) -> Result<()> {
    if attachments.len() > limits.max_attachments {
        return Err(RegistryError::validation(format!(
            "Too many attachments: {} (max {})",
            attachments.len(),
            limits.max_attachments
        )));
    }
    for attachment in attachments {
        if let Some(filename) = &attachment.filename {
            if filename.is_empty() {
                return Err(RegistryError::validation("Attachment file name cannot be empty"));
            }
            if filename.len() > limits.max_filename_len {
                return Err(RegistryError::validation(format!(
                    "Attachment file name exceeds maximum size of {} bytes",
                    limits.max_filename_len
                )));
            }
        }
    }
    Ok(())
}
