//! Structured records emitted by state-changing operations.
//!
//! Events are the only discovery mechanism for thread keys, reply trees and
//! reputation history. Every successful state-changing call emits exactly one
//! event; failed calls and no-op calls emit nothing.

use crate::hash::{ContentHash, NameHash};
use crate::identity::Identity;
use crate::registry::types::{ForumId, PostId, UserId, Vote};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A record of one successful state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// A user name was bound.
    RegisterUser {
        /// Identity that registered the user and now owns it.
        sender: Identity,
        /// Hash of the registered name.
        name_hash: NameHash,
        /// Id assigned to the user.
        new_user: UserId,
    },
    /// A forum name was bound.
    RegisterForum {
        /// Identity that registered the forum and now owns it.
        sender: Identity,
        /// Hash of the registered name.
        name_hash: NameHash,
        /// Id assigned to the forum.
        new_forum: ForumId,
        /// Initial posting threshold.
        reputation_threshold: i64,
    },
    /// The administrator changed a user's reputation.
    ReputationAdjusted {
        /// Administrator that made the change.
        sender: Identity,
        /// User whose reputation changed.
        name_hash: NameHash,
        /// Requested change.
        delta: i64,
        /// Reputation before the change.
        old_reputation: i64,
        /// Reputation after the change.
        new_reputation: i64,
    },
    /// The administrator role moved to another identity.
    AdminTransferred {
        /// Previous administrator.
        old_admin: Identity,
        /// New administrator.
        new_admin: Identity,
    },
    /// A user's owner changed the avatar.
    SetAvatar {
        /// Owner of the user.
        sender: Identity,
        /// User whose avatar changed.
        name_hash: NameHash,
        /// Avatar hash before the change.
        old_avatar: Option<ContentHash>,
        /// Avatar hash after the change; `None` clears it.
        new_avatar: Option<ContentHash>,
    },
    /// A forum owner changed the posting threshold.
    SetReputationThreshold {
        /// Forum whose threshold changed.
        forum: ForumId,
        /// Forum owner that made the change.
        sender: Identity,
        /// Threshold before the change.
        old_reputation_threshold: i64,
        /// Threshold after the change.
        new_reputation_threshold: i64,
    },
    /// A thread or reply was created.
    Post {
        /// Forum the post was added to.
        forum: ForumId,
        /// User the post was made as.
        user_name_hash: NameHash,
        /// Hash of the thread subject.
        thread_key: NameHash,
        /// Parent post, `None` for a new thread.
        in_reply_to: Option<PostId>,
        /// Caller identity that submitted the post.
        sender: Identity,
        /// Id assigned to the post.
        new_post_id: PostId,
    },
    /// A user voted on a post.
    Vote {
        /// Forum holding the post.
        forum: ForumId,
        /// User the vote was cast as.
        user_name_hash: NameHash,
        /// Post voted on.
        post: PostId,
        /// Caller identity that cast the vote.
        sender: Identity,
        /// Vote this one replaced, if any.
        previous: Option<Vote>,
        /// Vote now in force.
        vote: Vote,
    },
    /// A post was redacted.
    Redact {
        /// Forum holding the post.
        forum: ForumId,
        /// Post that was redacted.
        post: PostId,
        /// Caller identity that redacted it.
        sender: Identity,
    },
}

impl Event {
    /// Log name of the event, as indexers know it.
    pub fn name(&self) -> &'static str {
        match self {
            Event::RegisterUser { .. } => "LogRegisterUser",
            Event::RegisterForum { .. } => "LogRegisterForum",
            Event::ReputationAdjusted { .. } => "LogReputationAdjusted",
            Event::AdminTransferred { .. } => "LogAdminTransferred",
            Event::SetAvatar { .. } => "LogSetAvatar",
            Event::SetReputationThreshold { .. } => "LogSetReputationThreshold",
            Event::Post { .. } => "LogPost",
            Event::Vote { .. } => "LogVote",
            Event::Redact { .. } => "LogRedact",
        }
    }

    /// Forum the event belongs to, for forum-scoped events.
    pub fn forum(&self) -> Option<ForumId> {
        match self {
            Event::RegisterForum { new_forum, .. } => Some(*new_forum),
            Event::SetReputationThreshold { forum, .. }
            | Event::Post { forum, .. }
            | Event::Vote { forum, .. }
            | Event::Redact { forum, .. } => Some(*forum),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Destination for emitted events.
pub trait EventSink {
    /// Records one event.
    fn emit(&mut self, event: Event);
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) {
        self.push(event);
    }
}

/// Append-only in-memory event log kept by the registry.
///
/// The position of an event in the log is its sequence number.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    records: Vec<Event>,
}

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a log holding previously persisted records.
    pub(crate) fn from_records(records: Vec<Event>) -> Self {
        Self { records }
    }

    /// All records in emission order.
    pub fn records(&self) -> &[Event] {
        &self.records
    }

    /// Records with sequence number `>= sequence`.
    pub fn since(&self, sequence: usize) -> &[Event] {
        self.records.get(sequence..).unwrap_or(&[])
    }

    /// Most recent record.
    pub fn last(&self) -> Option<&Event> {
        self.records.last()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing has been emitted.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: Event) {
        self.records.push(event);
    }
}
