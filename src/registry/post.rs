//! Posts: thread roots and replies.
//!
//! A post is a value record once created. Its content never changes; the only
//! mutable state is the one-way redaction flag and the vote tally kept for
//! readers.
//!
//! ```text
//! Created ──redact──▶ Redacted (terminal)
//! ```

use crate::hash::{ContentHash, NameHash};
use crate::identity::Identity;
use crate::registry::types::{Attachment, ForumId, PostId, Vote};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostState {
    /// Visible content.
    Created,
    /// Content withdrawn; the record remains.
    Redacted,
}

/// A node in a forum's reply tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    id: PostId,
    forum: ForumId,
    in_reply_to: Option<PostId>,
    thread_root: PostId,
    poster: NameHash,
    sender: Identity,
    subject: Option<String>,
    thread_key: NameHash,
    body_hash: ContentHash,
    attachments: Vec<Attachment>,
    redacted: bool,
    votes: BTreeMap<NameHash, Vote>,
    score: i64,
}

/// Fields of a post that the forum fills in before linking it.
pub(crate) struct PostDraft {
    pub id: PostId,
    pub forum: ForumId,
    pub in_reply_to: Option<PostId>,
    pub thread_root: PostId,
    pub poster: NameHash,
    pub sender: Identity,
    pub subject: Option<String>,
    pub thread_key: NameHash,
    pub body_hash: ContentHash,
    pub attachments: Vec<Attachment>,
}

impl From<PostDraft> for Post {
    fn from(draft: PostDraft) -> Self {
        Self {
            id: draft.id,
            forum: draft.forum,
            in_reply_to: draft.in_reply_to,
            thread_root: draft.thread_root,
            poster: draft.poster,
            sender: draft.sender,
            subject: draft.subject,
            thread_key: draft.thread_key,
            body_hash: draft.body_hash,
            attachments: draft.attachments,
            redacted: false,
            votes: BTreeMap::new(),
            score: 0,
        }
    }
}

impl Post {
    /// Id of this post within its forum.
    pub fn id(&self) -> PostId {
        self.id
    }

    /// Forum that owns this post.
    pub fn forum(&self) -> ForumId {
        self.forum
    }

    /// Parent post, or `None` for a thread root.
    pub fn in_reply_to(&self) -> Option<PostId> {
        self.in_reply_to
    }

    /// Returns true if this post starts a thread.
    pub fn is_thread(&self) -> bool {
        self.in_reply_to.is_none()
    }

    /// Root of the thread this post belongs to (itself for a thread root).
    pub fn thread_root(&self) -> PostId {
        self.thread_root
    }

    /// Name hash of the user who posted.
    pub fn poster(&self) -> &NameHash {
        &self.poster
    }

    /// Caller identity that submitted the post.
    pub fn sender(&self) -> &Identity {
        &self.sender
    }

    /// Subject; only thread roots carry one.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Hash of the thread subject, shared by every post in the thread.
    pub fn thread_key(&self) -> &NameHash {
        &self.thread_key
    }

    /// Hash of the post body.
    pub fn body_hash(&self) -> &ContentHash {
        &self.body_hash
    }

    /// Attachments in submission order.
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Attachment content hashes in submission order.
    pub fn content_hashes(&self) -> impl Iterator<Item = &ContentHash> {
        self.attachments.iter().map(|a| &a.content_hash)
    }

    /// Whether the post has been redacted.
    pub fn is_redacted(&self) -> bool {
        self.redacted
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PostState {
        if self.redacted {
            PostState::Redacted
        } else {
            PostState::Created
        }
    }

    /// Upvotes minus downvotes.
    pub fn score(&self) -> i64 {
        self.score
    }

    /// Vote cast by `voter`, if any.
    pub fn vote_of(&self, voter: &NameHash) -> Option<Vote> {
        self.votes.get(voter).copied()
    }

    /// Number of users who have voted on this post.
    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }

    /// Marks the post redacted. Returns false if it already was.
    pub(crate) fn redact(&mut self) -> bool {
        if self.redacted {
            return false;
        }
        self.redacted = true;
        true
    }

    /// Records `vote` for `voter`.
    ///
    /// Returns `None` when the voter already cast the same vote, otherwise
    /// `Some(previous)`.
    pub(crate) fn record_vote(&mut self, voter: NameHash, vote: Vote) -> Option<Option<Vote>> {
        let previous = self.votes.get(&voter).copied();
        if previous == Some(vote) {
            return None;
        }
        self.score += vote.weight() - previous.map_or(0, |v| v.weight());
        self.votes.insert(voter, vote);
        Some(previous)
    }
}
