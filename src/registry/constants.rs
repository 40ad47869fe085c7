//! Default limits for registry and forum content.
//!
//! These are the defaults for [`Limits`](crate::config::Limits); deployments
//! can override them through [`RegistryConfig`](crate::config::RegistryConfig).

/// Maximum user/forum name size (256 bytes).
pub const DEFAULT_MAX_NAME_LEN: usize = 256;

/// Maximum thread subject size (512 bytes).
pub const DEFAULT_MAX_SUBJECT_LEN: usize = 512;

/// Maximum number of attachments on a single post.
pub const DEFAULT_MAX_ATTACHMENTS: usize = 32;

/// Maximum attachment file name size (256 bytes).
pub const DEFAULT_MAX_FILENAME_LEN: usize = 256;

/// Reputation every newly registered user starts with.
pub const INITIAL_REPUTATION: i64 = 0;

/// First post id assigned in a forum. Id 0 is never a post.
pub const FIRST_POST_ID: u64 = 1;
