//! Name registry for users and forums.
//!
//! The [`Registry`] is the single authority that binds hashed names to
//! [`User`]s and [`Forum`]s. Users and forums live in separate namespaces: a
//! name taken by a user can still be registered as a forum and vice versa.
//! Once bound, a name is never rebound or removed.
//!
//! ## Hierarchy
//!
//! ```text
//! Registry
//!     ├── User (name hash → owner, reputation)
//!     └── Forum (name hash → owner, threshold)
//!             └── Post (thread root)
//!                     └── Post (reply)
//! ```
//!
//! ## Atomicity
//!
//! Every operation runs all of its checks before it mutates anything and
//! emits its event last. A failing call therefore leaves no trace, and a
//! successful one emits exactly one [`Event`].

pub mod constants;
pub mod events;
mod forum;
mod post;
pub mod storage;
pub mod types;
mod user;
pub mod validation;

pub use events::{Event, EventLog, EventSink};
pub use forum::{Forum, ForumEnv, UserDirectory};
pub use post::{Post, PostState};
pub use storage::RegistryStorage;
pub use types::{Attachment, ForumId, PostId, UserId, Vote};
pub use user::User;

use crate::config::{Limits, RegistryConfig};
use crate::error::{RegistryError, Result};
use crate::hash::{hash_name, ContentHash, NameHash};
use crate::identity::Identity;
use std::collections::HashMap;
use tracing::{debug, info};
use validation::validate_name;

/// Arena of registered users with a name-hash index.
#[derive(Debug, Clone, Default)]
pub struct UserTable {
    users: Vec<User>,
    index: HashMap<NameHash, UserId>,
}

impl UserTable {
    /// Looks up a user by id.
    pub fn get(&self, id: UserId) -> Option<&User> {
        self.users.get(id.index())
    }

    /// Looks up a user id by name hash.
    pub fn lookup(&self, name_hash: &NameHash) -> Option<UserId> {
        self.index.get(name_hash).copied()
    }

    /// Number of registered users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns true if no user is registered.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// All users in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.iter()
    }

    fn get_mut(&mut self, name_hash: &NameHash) -> Option<&mut User> {
        let id = self.lookup(name_hash)?;
        self.users.get_mut(id.index())
    }

    fn insert(&mut self, user: User) {
        self.index.insert(*user.name_hash(), user.id());
        self.users.push(user);
    }
}

impl UserDirectory for UserTable {
    fn resolve(&self, name_hash: &NameHash) -> Option<&User> {
        self.lookup(name_hash).and_then(|id| self.get(id))
    }
}

/// The global directory of users and forums.
#[derive(Debug, Clone)]
pub struct Registry {
    admin: Identity,
    limits: Limits,
    users: UserTable,
    forums: Vec<Forum>,
    forum_index: HashMap<NameHash, ForumId>,
    events: EventLog,
}

impl Registry {
    /// Creates an empty registry from a configuration.
    pub fn new(config: &RegistryConfig) -> Self {
        Self {
            admin: config.admin,
            limits: config.limits.clone(),
            users: UserTable::default(),
            forums: Vec::new(),
            forum_index: HashMap::new(),
            events: EventLog::new(),
        }
    }

    /// Creates an empty registry with default limits.
    pub fn with_admin(admin: Identity) -> Self {
        Self::new(&RegistryConfig::new(admin))
    }

    /// Rebuilds a registry from persisted parts, checking that ids are
    /// contiguous and names unique.
    pub(crate) fn from_parts(
        config: &RegistryConfig,
        admin: Identity,
        users: Vec<User>,
        forums: Vec<Forum>,
        events: Vec<Event>,
    ) -> Result<Self> {
        let mut registry = Self::new(config);
        registry.admin = admin;

        for (i, user) in users.into_iter().enumerate() {
            if user.id() != UserId::new(i as u64) {
                return Err(RegistryError::storage(format!(
                    "Expected {} at slot {}, found {}",
                    UserId::new(i as u64),
                    i,
                    user.id()
                )));
            }
            if registry.users.lookup(user.name_hash()).is_some() {
                return Err(RegistryError::storage(format!(
                    "Duplicate user name hash {}",
                    user.name_hash().short()
                )));
            }
            registry.users.insert(user);
        }

        for (i, mut forum) in forums.into_iter().enumerate() {
            if forum.id() != ForumId::new(i as u64) {
                return Err(RegistryError::storage(format!(
                    "Expected {} at slot {}, found {}",
                    ForumId::new(i as u64),
                    i,
                    forum.id()
                )));
            }
            if registry.forum_index.contains_key(forum.name_hash()) {
                return Err(RegistryError::storage(format!(
                    "Duplicate forum name hash {}",
                    forum.name_hash().short()
                )));
            }
            forum.rebuild_indexes()?;
            registry.forum_index.insert(*forum.name_hash(), forum.id());
            registry.forums.push(forum);
        }

        registry.events = EventLog::from_records(events);
        Ok(registry)
    }

    /// Hashes a name into its registry key. Pure; see [`hash_name`].
    pub fn hash_name(name: &str) -> NameHash {
        hash_name(name)
    }

    /// Identity currently holding the administrator role.
    pub fn admin(&self) -> &Identity {
        &self.admin
    }

    /// Content limits in force.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Emitted events.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// The user table.
    pub fn users(&self) -> &UserTable {
        &self.users
    }

    /// All forums in registration order.
    pub fn forums(&self) -> &[Forum] {
        &self.forums
    }

    /// Number of registered users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Number of registered forums.
    pub fn forum_count(&self) -> usize {
        self.forums.len()
    }

    /// Registers a user owned by `caller` with reputation 0.
    ///
    /// # Errors
    /// - `NameTaken` if a user already holds `hash(name)`
    /// - `Validation` if the name is empty or too long
    pub fn register_user(&mut self, caller: &Identity, name: &str) -> Result<UserId> {
        validate_name(name, &self.limits).inspect_err(|e| reject("register_user", e))?;
        let name_hash = hash_name(name);
        if self.users.lookup(&name_hash).is_some() {
            let err = RegistryError::name_taken(format!("user name '{}'", name));
            reject("register_user", &err);
            return Err(err);
        }

        let id = UserId::new(self.users.len() as u64);
        self.users.insert(User::new(id, *caller, name.to_string()));

        info!(
            user = %id,
            name_hash = %name_hash.short(),
            owner = %caller.short(),
            "Registered user"
        );
        self.events.emit(Event::RegisterUser {
            sender: *caller,
            name_hash,
            new_user: id,
        });
        Ok(id)
    }

    /// Registers a forum owned by `caller` with the given threshold and no
    /// threads.
    ///
    /// # Errors
    /// - `NameTaken` if a forum already holds `hash(name)`
    /// - `Validation` if the name is empty or too long
    pub fn register_forum(
        &mut self,
        caller: &Identity,
        name: &str,
        reputation_threshold: i64,
    ) -> Result<ForumId> {
        validate_name(name, &self.limits).inspect_err(|e| reject("register_forum", e))?;
        let name_hash = hash_name(name);
        if self.forum_index.contains_key(&name_hash) {
            let err = RegistryError::name_taken(format!("forum name '{}'", name));
            reject("register_forum", &err);
            return Err(err);
        }

        let id = ForumId::new(self.forums.len() as u64);
        self.forums.push(Forum::new(
            id,
            *caller,
            name.to_string(),
            reputation_threshold,
        ));
        self.forum_index.insert(name_hash, id);

        info!(
            forum = %id,
            name_hash = %name_hash.short(),
            owner = %caller.short(),
            reputation_threshold,
            "Registered forum"
        );
        self.events.emit(Event::RegisterForum {
            sender: *caller,
            name_hash,
            new_forum: id,
            reputation_threshold,
        });
        Ok(id)
    }

    /// Resolves a user name hash. Side-effect free.
    pub fn lookup_user(&self, name_hash: &NameHash) -> Result<UserId> {
        self.users
            .lookup(name_hash)
            .ok_or_else(|| RegistryError::unknown_user(name_hash.short()))
    }

    /// Resolves a forum name hash. Side-effect free.
    pub fn lookup_forum(&self, name_hash: &NameHash) -> Result<ForumId> {
        self.forum_index
            .get(name_hash)
            .copied()
            .ok_or_else(|| RegistryError::unknown_forum(name_hash.short()))
    }

    /// Looks up a user by id.
    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(id)
    }

    /// Looks up a user by name hash.
    pub fn user_by_name(&self, name_hash: &NameHash) -> Option<&User> {
        self.users.resolve(name_hash)
    }

    /// Looks up a forum by id.
    pub fn forum(&self, id: ForumId) -> Option<&Forum> {
        self.forums.get(id.index())
    }

    /// Looks up a forum by name hash.
    pub fn forum_by_name(&self, name_hash: &NameHash) -> Option<&Forum> {
        self.forum_index
            .get(name_hash)
            .and_then(|id| self.forums.get(id.index()))
    }

    /// Adds `delta` to a user's reputation. Administrator only.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the administrator
    /// - `UnknownUser` if the name hash is unbound
    /// - `ReputationOverflow` if the result leaves the `i64` range
    pub fn adjust_reputation(
        &mut self,
        caller: &Identity,
        name_hash: &NameHash,
        delta: i64,
    ) -> Result<i64> {
        if !self.admin.matches(caller) {
            let err =
                RegistryError::unauthorized("Only the registry administrator can adjust reputation");
            reject("adjust_reputation", &err);
            return Err(err);
        }
        let user = self.users.get_mut(name_hash).ok_or_else(|| {
            let err = RegistryError::unknown_user(name_hash.short());
            reject("adjust_reputation", &err);
            err
        })?;
        let old_reputation = user.reputation();
        let new_reputation = old_reputation.checked_add(delta).ok_or_else(|| {
            let err = RegistryError::ReputationOverflow {
                current: old_reputation,
                delta,
            };
            reject("adjust_reputation", &err);
            err
        })?;
        user.set_reputation(new_reputation);

        info!(
            name_hash = %name_hash.short(),
            delta,
            old_reputation,
            new_reputation,
            "Reputation adjusted"
        );
        self.events.emit(Event::ReputationAdjusted {
            sender: *caller,
            name_hash: *name_hash,
            delta,
            old_reputation,
            new_reputation,
        });
        Ok(new_reputation)
    }

    /// Hands the administrator role to `new_admin`. Administrator only.
    pub fn transfer_admin(&mut self, caller: &Identity, new_admin: Identity) -> Result<()> {
        if !self.admin.matches(caller) {
            let err =
                RegistryError::unauthorized("Only the registry administrator can transfer the role");
            reject("transfer_admin", &err);
            return Err(err);
        }
        let old_admin = self.admin;
        self.admin = new_admin;

        info!(
            old_admin = %old_admin.short(),
            new_admin = %new_admin.short(),
            "Administrator transferred"
        );
        self.events.emit(Event::AdminTransferred {
            old_admin,
            new_admin,
        });
        Ok(())
    }

    /// Sets or clears a user's avatar. Only the user's owner may call this.
    pub fn set_avatar(
        &mut self,
        caller: &Identity,
        name_hash: &NameHash,
        avatar_hash: Option<ContentHash>,
    ) -> Result<()> {
        let user = self.users.get_mut(name_hash).ok_or_else(|| {
            let err = RegistryError::unknown_user(name_hash.short());
            reject("set_avatar", &err);
            err
        })?;
        if !user.is_owned_by(caller) {
            let err = RegistryError::unauthorized(format!(
                "Caller {} does not own user {}",
                caller.short(),
                user.name()
            ));
            reject("set_avatar", &err);
            return Err(err);
        }
        let old_avatar = user.avatar_hash().copied();
        user.set_avatar_hash(avatar_hash);

        info!(name_hash = %name_hash.short(), "Avatar updated");
        self.events.emit(Event::SetAvatar {
            sender: *caller,
            name_hash: *name_hash,
            old_avatar,
            new_avatar: avatar_hash,
        });
        Ok(())
    }

    /// Returns a handle for calling operations on a forum.
    pub fn forum_mut(&mut self, id: ForumId) -> Result<ForumHandle<'_>> {
        let forum = self
            .forums
            .get_mut(id.index())
            .ok_or_else(|| RegistryError::unknown_forum(id))?;
        Ok(ForumHandle {
            forum,
            env: ForumEnv {
                users: &self.users,
                events: &mut self.events,
                limits: &self.limits,
            },
        })
    }

    /// Returns a handle for the forum registered under `name_hash`.
    pub fn forum_mut_by_name(&mut self, name_hash: &NameHash) -> Result<ForumHandle<'_>> {
        let id = self.lookup_forum(name_hash)?;
        self.forum_mut(id)
    }
}

fn reject(operation: &'static str, err: &RegistryError) {
    debug!(operation, kind = err.kind(), error = %err, "Call rejected");
}

/// A forum bound to the registry's user directory and event log.
///
/// Obtained from [`Registry::forum_mut`]; every method takes the caller
/// identity explicitly.
pub struct ForumHandle<'a> {
    forum: &'a mut Forum,
    env: ForumEnv<'a>,
}

impl ForumHandle<'_> {
    /// Read access to the forum.
    pub fn forum(&self) -> &Forum {
        self.forum
    }

    /// See [`Forum::is_post`].
    pub fn is_post(&self, id: PostId) -> bool {
        self.forum.is_post(id)
    }

    /// See [`Forum::set_reputation_threshold`].
    pub fn set_reputation_threshold(&mut self, caller: &Identity, threshold: i64) -> Result<()> {
        self.forum
            .set_reputation_threshold(&mut self.env, caller, threshold)
            .inspect_err(|e| reject("set_reputation_threshold", e))
    }

    /// See [`Forum::create_thread`].
    pub fn create_thread(
        &mut self,
        caller: &Identity,
        poster: &NameHash,
        subject: &str,
        body_hash: ContentHash,
        attachments: Vec<Attachment>,
    ) -> Result<PostId> {
        self.forum
            .create_thread(&mut self.env, caller, poster, subject, body_hash, attachments)
            .inspect_err(|e| reject("create_thread", e))
    }

    /// See [`Forum::reply`].
    pub fn reply(
        &mut self,
        caller: &Identity,
        parent: PostId,
        poster: &NameHash,
        body_hash: ContentHash,
        attachments: Vec<Attachment>,
    ) -> Result<PostId> {
        self.forum
            .reply(&mut self.env, caller, parent, poster, body_hash, attachments)
            .inspect_err(|e| reject("reply", e))
    }

    /// See [`Forum::cast_vote`].
    pub fn cast_vote(
        &mut self,
        caller: &Identity,
        post: PostId,
        voter: &NameHash,
        vote: Vote,
    ) -> Result<bool> {
        self.forum
            .cast_vote(&mut self.env, caller, post, voter, vote)
            .inspect_err(|e| reject("cast_vote", e))
    }

    /// See [`Forum::redact`].
    pub fn redact(&mut self, caller: &Identity, post: PostId) -> Result<bool> {
        self.forum
            .redact(&mut self.env, caller, post)
            .inspect_err(|e| reject("redact", e))
    }
}
