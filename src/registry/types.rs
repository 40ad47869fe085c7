//! Identifier and value types shared by the registry, forums and posts.

use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arena index of a registered user, assigned in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(u64);

impl UserId {
    /// Creates a user id from its raw value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    pub fn value(&self) -> u64 {
        self.0
    }

    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user#{}", self.0)
    }
}

/// Arena index of a registered forum, assigned in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ForumId(u64);

impl ForumId {
    /// Creates a forum id from its raw value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    pub fn value(&self) -> u64 {
        self.0
    }

    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ForumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "forum#{}", self.0)
    }
}

/// Sequential post id within one forum.
///
/// Ids start at 1. `PostId(0)` is the null reference and never names a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PostId(u64);

impl PostId {
    /// The null post reference.
    pub const NULL: PostId = PostId(0);

    /// Creates a post id from its raw value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Returns true for the null reference.
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "post#{}", self.0)
    }
}

/// Direction of a vote on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vote {
    /// +1
    Up,
    /// -1
    Down,
}

impl Vote {
    /// Contribution of this vote to a post's score.
    pub fn weight(&self) -> i64 {
        match self {
            Vote::Up => 1,
            Vote::Down => -1,
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vote::Up => write!(f, "Up"),
            Vote::Down => write!(f, "Down"),
        }
    }
}

/// Reference to a piece of content attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Hash of the attached content.
    pub content_hash: ContentHash,
    /// Optional display file name.
    pub filename: Option<String>,
}

impl Attachment {
    /// An attachment without a file name.
    pub fn new(content_hash: ContentHash) -> Self {
        Self {
            content_hash,
            filename: None,
        }
    }

    /// An attachment with a file name.
    pub fn named(content_hash: ContentHash, filename: impl Into<String>) -> Self {
        Self {
            content_hash,
            filename: Some(filename.into()),
        }
    }
}
