//! User records.
//!
//! A user binds a human-readable name to the identity that registered it.
//! The owner never changes; reputation is only changed by the registry
//! administrator through [`Registry::adjust_reputation`](super::Registry::adjust_reputation).

use crate::hash::{hash_name, ContentHash, NameHash};
use crate::identity::Identity;
use crate::registry::constants::INITIAL_REPUTATION;
use crate::registry::types::UserId;
use serde::{Deserialize, Serialize};

/// A registered identity with a signed reputation score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    owner: Identity,
    name_hash: NameHash,
    name: String,
    avatar_hash: Option<ContentHash>,
    reputation: i64,
}

impl User {
    pub(crate) fn new(id: UserId, owner: Identity, name: String) -> Self {
        Self {
            id,
            owner,
            name_hash: hash_name(&name),
            name,
            avatar_hash: None,
            reputation: INITIAL_REPUTATION,
        }
    }

    /// Arena id of this user.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Identity that registered this user.
    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    /// Registry key of this user.
    pub fn name_hash(&self) -> &NameHash {
        &self.name_hash
    }

    /// Registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hash of the user's avatar, if one was set.
    pub fn avatar_hash(&self) -> Option<&ContentHash> {
        self.avatar_hash.as_ref()
    }

    /// Current reputation.
    pub fn reputation(&self) -> i64 {
        self.reputation
    }

    /// Returns true if `caller` owns this user.
    pub fn is_owned_by(&self, caller: &Identity) -> bool {
        self.owner.matches(caller)
    }

    pub(crate) fn set_reputation(&mut self, reputation: i64) {
        self.reputation = reputation;
    }

    pub(crate) fn set_avatar_hash(&mut self, avatar_hash: Option<ContentHash>) {
        self.avatar_hash = avatar_hash;
    }
}
