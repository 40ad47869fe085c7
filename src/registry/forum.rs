//! Forums: reputation-gated, append-only reply trees.
//!
//! A forum owns an arena of [`Post`]s. Post `n` lives at index `n - 1`, and
//! parent links are stored as [`PostId`]s, so the tree has no ownership
//! cycles and serializes as a flat list.
//!
//! ## Indexing Strategy
//!
//! Two secondary indexes are maintained on insert and rebuilt after loading:
//! - `threads`: thread root ids in creation order
//! - `children`: post id → direct reply ids in creation order
//!
//! ## Authorization
//!
//! - **Owner**: the identity that registered the forum; the only caller that
//!   may change the reputation threshold
//! - **Member**: a registered user whose owner is the caller and whose
//!   reputation meets the threshold; may post, reply and vote
//! - **Redaction**: the identity that submitted the post, or the forum owner

use crate::config::Limits;
use crate::error::{RegistryError, Result};
use crate::hash::{hash_name, ContentHash, NameHash};
use crate::identity::Identity;
use crate::registry::constants::FIRST_POST_ID;
use crate::registry::events::{Event, EventSink};
use crate::registry::post::{Post, PostDraft};
use crate::registry::types::{Attachment, ForumId, PostId, Vote};
use crate::registry::user::User;
use crate::registry::validation::{validate_attachments, validate_subject};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Read access to registered users, keyed by name hash.
///
/// The registry's user table implements this; tests can substitute a fake.
pub trait UserDirectory {
    /// Resolves a name hash to a registered user.
    fn resolve(&self, name_hash: &NameHash) -> Option<&User>;
}

impl UserDirectory for HashMap<NameHash, User> {
    fn resolve(&self, name_hash: &NameHash) -> Option<&User> {
        self.get(name_hash)
    }
}

/// Collaborators a forum needs while executing a call.
pub struct ForumEnv<'a> {
    /// Where posters and voters are resolved.
    pub users: &'a dyn UserDirectory,
    /// Where successful calls record their event.
    pub events: &'a mut dyn EventSink,
    /// Content limits.
    pub limits: &'a Limits,
}

/// An access-controlled container of threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forum {
    id: ForumId,
    owner: Identity,
    name_hash: NameHash,
    name: String,
    reputation_threshold: i64,
    posts: Vec<Post>,
    #[serde(skip)]
    threads: Vec<PostId>,
    #[serde(skip)]
    children: HashMap<PostId, Vec<PostId>>,
}

impl Forum {
    pub(crate) fn new(
        id: ForumId,
        owner: Identity,
        name: String,
        reputation_threshold: i64,
    ) -> Self {
        Self {
            id,
            owner,
            name_hash: hash_name(&name),
            name,
            reputation_threshold,
            posts: Vec::new(),
            threads: Vec::new(),
            children: HashMap::new(),
        }
    }

    /// Arena id of this forum.
    pub fn id(&self) -> ForumId {
        self.id
    }

    /// Identity that registered this forum.
    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    /// Registry key of this forum.
    pub fn name_hash(&self) -> &NameHash {
        &self.name_hash
    }

    /// Registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Minimum reputation required to post, reply or vote.
    pub fn reputation_threshold(&self) -> i64 {
        self.reputation_threshold
    }

    /// Looks up a post. The null id never resolves.
    pub fn post(&self, id: PostId) -> Option<&Post> {
        if id.is_null() {
            return None;
        }
        self.posts.get((id.value() - FIRST_POST_ID) as usize)
    }

    /// O(1) membership check against this forum's post index.
    pub fn is_post(&self, id: PostId) -> bool {
        self.post(id).is_some()
    }

    /// All posts in id order.
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Thread root ids in creation order.
    pub fn threads(&self) -> &[PostId] {
        &self.threads
    }

    /// Direct replies to `id` in creation order.
    pub fn replies_to(&self, id: PostId) -> &[PostId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of posts (threads and replies).
    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    /// Id the next post will receive.
    pub fn next_post_id(&self) -> PostId {
        PostId::new(self.posts.len() as u64 + FIRST_POST_ID)
    }

    /// Vote cast by `voter` on `post`, if any.
    pub fn vote_of(&self, post: PostId, voter: &NameHash) -> Option<Vote> {
        self.post(post).and_then(|p| p.vote_of(voter))
    }

    /// Returns true if `caller` owns this forum.
    pub fn is_owned_by(&self, caller: &Identity) -> bool {
        self.owner.matches(caller)
    }

    /// Changes the posting threshold. Only the forum owner may call this.
    pub fn set_reputation_threshold(
        &mut self,
        env: &mut ForumEnv<'_>,
        caller: &Identity,
        new_threshold: i64,
    ) -> Result<()> {
        if !self.is_owned_by(caller) {
            return Err(RegistryError::unauthorized(format!(
                "Only the owner of {} can set its reputation threshold",
                self.id
            )));
        }

        let old_threshold = self.reputation_threshold;
        self.reputation_threshold = new_threshold;

        info!(
            forum = %self.id,
            old_threshold,
            new_threshold,
            "Reputation threshold changed"
        );
        env.events.emit(Event::SetReputationThreshold {
            forum: self.id,
            sender: *caller,
            old_reputation_threshold: old_threshold,
            new_reputation_threshold: new_threshold,
        });
        Ok(())
    }

    /// Starts a new thread.
    ///
    /// # Errors
    /// - `UnknownUser` if `poster` is not registered
    /// - `Unauthorized` if `caller` does not own `poster`
    /// - `BelowThreshold` if the poster's reputation is below the threshold
    /// - `Validation` if the subject or attachments exceed the limits
    pub fn create_thread(
        &mut self,
        env: &mut ForumEnv<'_>,
        caller: &Identity,
        poster: &NameHash,
        subject: &str,
        body_hash: ContentHash,
        attachments: Vec<Attachment>,
    ) -> Result<PostId> {
        self.authorize_member(env.users, caller, poster)?;
        validate_subject(subject, env.limits)?;
        validate_attachments(&attachments, env.limits)?;

        let id = self.next_post_id();
        let thread_key = hash_name(subject);
        self.insert(PostDraft {
            id,
            forum: self.id,
            in_reply_to: None,
            thread_root: id,
            poster: *poster,
            sender: *caller,
            subject: Some(subject.to_string()),
            thread_key,
            body_hash,
            attachments,
        });

        info!(
            forum = %self.id,
            post = %id,
            poster = %poster.short(),
            thread_key = %thread_key.short(),
            "Created thread"
        );
        env.events.emit(Event::Post {
            forum: self.id,
            user_name_hash: *poster,
            thread_key,
            in_reply_to: None,
            sender: *caller,
            new_post_id: id,
        });
        Ok(id)
    }

    /// Replies to an existing post in this forum.
    ///
    /// # Errors
    /// - `UnknownPost` if `parent` is null or not a post of this forum
    /// - the same identity, threshold and validation errors as
    ///   [`create_thread`](Self::create_thread)
    pub fn reply(
        &mut self,
        env: &mut ForumEnv<'_>,
        caller: &Identity,
        parent: PostId,
        poster: &NameHash,
        body_hash: ContentHash,
        attachments: Vec<Attachment>,
    ) -> Result<PostId> {
        let (thread_root, thread_key) = {
            let parent_post = self.require_post(parent)?;
            (parent_post.thread_root(), *parent_post.thread_key())
        };
        self.authorize_member(env.users, caller, poster)?;
        validate_attachments(&attachments, env.limits)?;

        let id = self.next_post_id();
        self.insert(PostDraft {
            id,
            forum: self.id,
            in_reply_to: Some(parent),
            thread_root,
            poster: *poster,
            sender: *caller,
            subject: None,
            thread_key,
            body_hash,
            attachments,
        });

        info!(
            forum = %self.id,
            post = %id,
            in_reply_to = %parent,
            poster = %poster.short(),
            "Created reply"
        );
        env.events.emit(Event::Post {
            forum: self.id,
            user_name_hash: *poster,
            thread_key,
            in_reply_to: Some(parent),
            sender: *caller,
            new_post_id: id,
        });
        Ok(id)
    }

    /// Casts or changes a vote on a post.
    ///
    /// Returns `false` when the voter already cast the same vote; nothing is
    /// emitted in that case.
    pub fn cast_vote(
        &mut self,
        env: &mut ForumEnv<'_>,
        caller: &Identity,
        post: PostId,
        voter: &NameHash,
        vote: Vote,
    ) -> Result<bool> {
        self.require_post(post)?;
        self.authorize_member(env.users, caller, voter)?;

        let index = (post.value() - FIRST_POST_ID) as usize;
        let Some(previous) = self.posts[index].record_vote(*voter, vote) else {
            return Ok(false);
        };

        info!(
            forum = %self.id,
            post = %post,
            voter = %voter.short(),
            vote = %vote,
            score = self.posts[index].score(),
            "Vote recorded"
        );
        env.events.emit(Event::Vote {
            forum: self.id,
            user_name_hash: *voter,
            post,
            sender: *caller,
            previous,
            vote,
        });
        Ok(true)
    }

    /// Redacts a post. Allowed for the identity that submitted the post and
    /// for the forum owner.
    ///
    /// Redacting an already redacted post succeeds, returns `false` and emits
    /// nothing.
    pub fn redact(
        &mut self,
        env: &mut ForumEnv<'_>,
        caller: &Identity,
        post: PostId,
    ) -> Result<bool> {
        let target = self.require_post(post)?;
        if !target.sender().matches(caller) && !self.is_owned_by(caller) {
            return Err(RegistryError::unauthorized(format!(
                "Only the author or the forum owner can redact {}",
                post
            )));
        }

        let index = (post.value() - FIRST_POST_ID) as usize;
        if !self.posts[index].redact() {
            return Ok(false);
        }

        info!(forum = %self.id, post = %post, sender = %caller.short(), "Post redacted");
        env.events.emit(Event::Redact {
            forum: self.id,
            post,
            sender: *caller,
        });
        Ok(true)
    }

    /// Rebuilds the secondary indexes from the post arena.
    ///
    /// Fails if the arena is not a well-formed tree: ids must be sequential
    /// and every parent must precede its replies.
    pub(crate) fn rebuild_indexes(&mut self) -> Result<()> {
        self.threads.clear();
        self.children.clear();
        for (index, post) in self.posts.iter().enumerate() {
            let expected = PostId::new(index as u64 + FIRST_POST_ID);
            if post.id() != expected || post.forum() != self.id {
                return Err(RegistryError::storage(format!(
                    "{} has an out-of-order post {} at slot {}",
                    self.id,
                    post.id(),
                    index
                )));
            }
            match post.in_reply_to() {
                None => self.threads.push(post.id()),
                Some(parent) if !parent.is_null() && parent < post.id() => {
                    self.children.entry(parent).or_default().push(post.id());
                }
                Some(parent) => {
                    return Err(RegistryError::storage(format!(
                        "{} replies to {} which does not precede it",
                        post.id(),
                        parent
                    )));
                }
            }
        }
        Ok(())
    }

    fn require_post(&self, id: PostId) -> Result<&Post> {
        self.post(id).ok_or_else(|| {
            RegistryError::unknown_post(format!("{} is not a post in {}", id, self.id))
        })
    }

    /// Resolves `name_hash` and checks ownership and reputation.
    fn authorize_member<'u>(
        &self,
        users: &'u dyn UserDirectory,
        caller: &Identity,
        name_hash: &NameHash,
    ) -> Result<&'u User> {
        let user = users
            .resolve(name_hash)
            .ok_or_else(|| RegistryError::unknown_user(name_hash.short()))?;
        if !user.is_owned_by(caller) {
            return Err(RegistryError::unauthorized(format!(
                "Caller {} does not own user {}",
                caller.short(),
                user.name()
            )));
        }
        if user.reputation() < self.reputation_threshold {
            return Err(RegistryError::BelowThreshold {
                reputation: user.reputation(),
                threshold: self.reputation_threshold,
            });
        }
        Ok(user)
    }

    /// Appends a post and updates the indexes. Callers have already run every
    /// check, so this cannot fail.
    fn insert(&mut self, draft: PostDraft) {
        let id = draft.id;
        match draft.in_reply_to {
            None => self.threads.push(id),
            Some(parent) => self.children.entry(parent).or_default().push(id),
        }
        self.posts.push(Post::from(draft));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::types::UserId;

    struct Fixture {
        users: HashMap<NameHash, User>,
        events: Vec<Event>,
        limits: Limits,
        forum: Forum,
    }

    impl Fixture {
        fn new() -> Self {
            let mut users = HashMap::new();
            for (i, name) in ["alice", "carol"].into_iter().enumerate() {
                let user = User::new(
                    UserId::new(i as u64),
                    Identity::derive(name),
                    name.to_string(),
                );
                users.insert(*user.name_hash(), user);
            }
            Self {
                users,
                events: Vec::new(),
                limits: Limits::default(),
                forum: Forum::new(
                    ForumId::new(0),
                    Identity::derive("bob"),
                    "general".to_string(),
                    0,
                ),
            }
        }

        fn env(&mut self) -> (&mut Forum, ForumEnv<'_>) {
            (
                &mut self.forum,
                ForumEnv {
                    users: &self.users,
                    events: &mut self.events,
                    limits: &self.limits,
                },
            )
        }

        fn thread(&mut self, who: &str, subject: &str) -> Result<PostId> {
            let (forum, mut env) = self.env();
            forum.create_thread(
                &mut env,
                &Identity::derive(who),
                &hash_name(who),
                subject,
                ContentHash::compute(b"body"),
                Vec::new(),
            )
        }

        fn reply(&mut self, who: &str, parent: PostId) -> Result<PostId> {
            let (forum, mut env) = self.env();
            forum.reply(
                &mut env,
                &Identity::derive(who),
                parent,
                &hash_name(who),
                ContentHash::compute(b"reply"),
                Vec::new(),
            )
        }

        fn set_threshold(&mut self, who: &str, threshold: i64) -> Result<()> {
            let (forum, mut env) = self.env();
            forum.set_reputation_threshold(&mut env, &Identity::derive(who), threshold)
        }
    }

    #[test]
    fn test_thread_and_replies_form_a_tree() {
        let mut fx = Fixture::new();
        let root = fx.thread("alice", "a great discussion").unwrap();
        let first = fx.reply("carol", root).unwrap();
        let nested = fx.reply("alice", first).unwrap();
        let second = fx.reply("alice", root).unwrap();

        assert_eq!(
            [root, first, nested, second].map(|p| p.value()),
            [1, 2, 3, 4]
        );
        assert_eq!(fx.forum.threads(), &[root]);
        assert_eq!(fx.forum.replies_to(root), &[first, second]);
        assert_eq!(fx.forum.replies_to(first), &[nested]);
        assert!(fx.forum.replies_to(nested).is_empty());

        let nested_post = fx.forum.post(nested).unwrap();
        assert_eq!(nested_post.in_reply_to(), Some(first));
        assert_eq!(nested_post.thread_root(), root);
        assert_eq!(nested_post.thread_key(), &hash_name("a great discussion"));
        assert!(nested_post.subject().is_none());
        assert_eq!(fx.events.len(), 4);
    }

    #[test]
    fn test_reply_to_missing_or_null_post() {
        let mut fx = Fixture::new();
        fx.thread("alice", "subject").unwrap();
        assert!(matches!(
            fx.reply("alice", PostId::new(999)),
            Err(RegistryError::UnknownPost(_))
        ));
        assert!(matches!(
            fx.reply("alice", PostId::NULL),
            Err(RegistryError::UnknownPost(_))
        ));
        assert_eq!(fx.forum.post_count(), 1);
        assert_eq!(fx.events.len(), 1);
    }

    #[test]
    fn test_identity_checks_in_order() {
        let mut fx = Fixture::new();
        // Unregistered poster
        assert!(matches!(
            fx.thread("mallory", "subject"),
            Err(RegistryError::UnknownUser(_))
        ));

        // Registered poster, wrong caller
        let (forum, mut env) = fx.env();
        let result = forum.create_thread(
            &mut env,
            &Identity::derive("mallory"),
            &hash_name("alice"),
            "subject",
            ContentHash::compute(b"body"),
            Vec::new(),
        );
        assert!(matches!(result, Err(RegistryError::Unauthorized(_))));
        assert!(fx.events.is_empty());
        assert!(fx.forum.threads().is_empty());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut fx = Fixture::new();
        fx.set_threshold("bob", 1).unwrap();
        assert!(matches!(
            fx.thread("alice", "subject"),
            Err(RegistryError::BelowThreshold {
                reputation: 0,
                threshold: 1
            })
        ));

        fx.set_threshold("bob", 0).unwrap();
        assert!(fx.thread("alice", "subject").is_ok());
    }

    #[test]
    fn test_only_owner_sets_threshold() {
        let mut fx = Fixture::new();
        assert!(matches!(
            fx.set_threshold("alice", 20),
            Err(RegistryError::Unauthorized(_))
        ));
        assert_eq!(fx.forum.reputation_threshold(), 0);
        assert!(fx.events.is_empty());

        fx.set_threshold("bob", 20).unwrap();
        assert_eq!(
            fx.events.last(),
            Some(&Event::SetReputationThreshold {
                forum: ForumId::new(0),
                sender: Identity::derive("bob"),
                old_reputation_threshold: 0,
                new_reputation_threshold: 20,
            })
        );
    }

    #[test]
    fn test_subject_validation_leaves_no_trace() {
        let mut fx = Fixture::new();
        let too_long = "s".repeat(fx.limits.max_subject_len + 1);
        assert!(matches!(
            fx.thread("alice", &too_long),
            Err(RegistryError::Validation(_))
        ));
        assert_eq!(fx.forum.next_post_id(), PostId::new(1));
        assert!(fx.events.is_empty());
    }

    #[test]
    fn test_empty_subject_is_accepted() {
        let mut fx = Fixture::new();
        let root = fx.thread("alice", "").unwrap();
        let post = fx.forum.post(root).unwrap();
        assert_eq!(post.subject(), Some(""));
        assert_eq!(post.thread_key(), &hash_name(""));
        assert_eq!(fx.events.len(), 1);
    }

    #[test]
    fn test_redaction_authority() {
        let mut fx = Fixture::new();
        let post = fx.thread("alice", "subject").unwrap();

        let (forum, mut env) = fx.env();
        assert!(matches!(
            forum.redact(&mut env, &Identity::derive("carol"), post),
            Err(RegistryError::Unauthorized(_))
        ));
        assert!(forum.redact(&mut env, &Identity::derive("bob"), post).unwrap());
        assert!(!forum.redact(&mut env, &Identity::derive("alice"), post).unwrap());
        assert!(matches!(
            forum.redact(&mut env, &Identity::derive("bob"), PostId::new(5)),
            Err(RegistryError::UnknownPost(_))
        ));

        assert!(fx.forum.post(post).unwrap().is_redacted());
        let redactions = fx
            .events
            .iter()
            .filter(|e| matches!(e, Event::Redact { .. }))
            .count();
        assert_eq!(redactions, 1);
    }

    #[test]
    fn test_votes() {
        let mut fx = Fixture::new();
        let post = fx.thread("alice", "subject").unwrap();
        let carol = hash_name("carol");

        let (forum, mut env) = fx.env();
        let caller = Identity::derive("carol");
        assert!(forum.cast_vote(&mut env, &caller, post, &carol, Vote::Up).unwrap());
        assert!(!forum.cast_vote(&mut env, &caller, post, &carol, Vote::Up).unwrap());
        assert!(forum.cast_vote(&mut env, &caller, post, &carol, Vote::Down).unwrap());
        assert!(matches!(
            forum.cast_vote(&mut env, &Identity::derive("alice"), post, &carol, Vote::Up),
            Err(RegistryError::Unauthorized(_))
        ));

        assert_eq!(fx.forum.post(post).unwrap().score(), -1);
        assert_eq!(fx.forum.vote_of(post, &carol), Some(Vote::Down));
        assert_eq!(
            fx.events.last(),
            Some(&Event::Vote {
                forum: ForumId::new(0),
                user_name_hash: carol,
                post,
                sender: caller,
                previous: Some(Vote::Up),
                vote: Vote::Down,
            })
        );
    }

    #[test]
    fn test_rebuild_indexes_after_serde() {
        let mut fx = Fixture::new();
        let root = fx.thread("alice", "subject").unwrap();
        let reply = fx.reply("carol", root).unwrap();

        let bytes = bincode::serialize(&fx.forum).unwrap();
        let mut loaded: Forum = bincode::deserialize(&bytes).unwrap();
        assert!(loaded.threads().is_empty());
        loaded.rebuild_indexes().unwrap();
        assert_eq!(loaded.threads(), &[root]);
        assert_eq!(loaded.replies_to(root), &[reply]);
        assert_eq!(loaded.next_post_id(), PostId::new(3));
    }
}
