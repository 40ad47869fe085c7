//! Registry persistence using RocksDB.
//!
//! ## Storage Layout
//!
//! Uses column families for logical separation:
//! - `users`: `{name_hash}` -> serialized User
//! - `forums`: `{name_hash}` -> serialized Forum, including its post arena
//! - `events`: `{sequence as u64 big-endian}` -> serialized Event
//! - `meta`: `admin` -> administrator identity, `event_count` -> events stored
//!
//! A snapshot is written in a single atomic batch that first deletes every
//! stored key, so a crash mid-save leaves the previous snapshot intact and a
//! completed save leaves nothing of it behind.

use crate::config::RegistryConfig;
use crate::error::Result;
use crate::identity::Identity;
use crate::registry::{Event, Forum, Registry, User};
use crate::storage::{RocksDbConfig, RocksDbHandle};
use std::path::Path;
use tracing::info;

/// Column family names.
const CF_USERS: &str = "users";
const CF_FORUMS: &str = "forums";
const CF_EVENTS: &str = "events";
const CF_META: &str = "meta";

/// Keys in the meta column family.
const META_ADMIN: &[u8] = b"admin";
const META_EVENT_COUNT: &[u8] = b"event_count";

/// RocksDB-backed registry persistence.
#[derive(Debug)]
pub struct RegistryStorage {
    db: RocksDbHandle,
}

impl RegistryStorage {
    /// Opens (or creates) a registry database at `path`.
    pub fn open(path: impl AsRef<Path>, config: &RocksDbConfig) -> Result<Self> {
        let path = path.as_ref();
        let db = RocksDbHandle::open(path, config, &[CF_USERS, CF_FORUMS, CF_EVENTS, CF_META])?;
        info!("Opened registry RocksDB at {:?}", path);
        Ok(Self { db })
    }

    /// Number of events already persisted.
    pub fn stored_event_count(&self) -> Result<u64> {
        Ok(self.db.get::<u64>(CF_META, META_EVENT_COUNT)?.unwrap_or(0))
    }

    /// Returns true if a snapshot has been saved.
    pub fn has_snapshot(&self) -> Result<bool> {
        self.db.exists(CF_META, META_ADMIN)
    }

    /// Writes a full snapshot of `registry` atomically.
    ///
    /// Everything previously stored is replaced in the same batch, so after
    /// the commit the database holds exactly this registry.
    pub fn save(&self, registry: &Registry) -> Result<()> {
        let mut batch = self.db.batch();
        let mut replaced = 0;
        for cf in [CF_USERS, CF_FORUMS, CF_EVENTS, CF_META] {
            replaced += batch.clear(cf)?;
        }

        for user in registry.users().iter() {
            batch.put(CF_USERS, user.name_hash().as_bytes(), user)?;
        }
        for forum in registry.forums() {
            batch.put(CF_FORUMS, forum.name_hash().as_bytes(), forum)?;
        }

        let records = registry.events().records();
        for (sequence, event) in records.iter().enumerate() {
            batch.put(CF_EVENTS, &(sequence as u64).to_be_bytes(), event)?;
        }

        batch.put(CF_META, META_ADMIN, registry.admin())?;
        batch.put(CF_META, META_EVENT_COUNT, &(records.len() as u64))?;

        let written = batch.len() - replaced;
        batch.commit()?;

        info!(
            users = registry.user_count(),
            forums = registry.forum_count(),
            events = records.len(),
            records_replaced = replaced,
            records_written = written,
            "Saved registry snapshot"
        );
        Ok(())
    }

    /// Loads the stored registry.
    ///
    /// An empty database yields an empty registry administered by
    /// `config.admin`. A stored administrator takes precedence over the
    /// configured one, since the role may have been transferred.
    pub fn load(&self, config: &RegistryConfig) -> Result<Registry> {
        let admin = self
            .db
            .get::<Identity>(CF_META, META_ADMIN)?
            .unwrap_or(config.admin);

        let mut users: Vec<User> = self.db.collect_all(CF_USERS)?;
        users.sort_by_key(User::id);
        let mut forums: Vec<Forum> = self.db.collect_all(CF_FORUMS)?;
        forums.sort_by_key(Forum::id);
        let events: Vec<Event> = self.db.collect_all(CF_EVENTS)?;

        let registry = Registry::from_parts(config, admin, users, forums, events)?;

        info!(
            users = registry.user_count(),
            forums = registry.forum_count(),
            events = registry.events().len(),
            "Loaded registry snapshot"
        );
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{hash_name, ContentHash};
    use crate::registry::{PostId, Vote};
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> RegistryStorage {
        RegistryStorage::open(dir.path().join("registry_db"), &RocksDbConfig::default())
            .expect("Failed to open storage")
    }

    #[test]
    fn test_empty_database_loads_empty_registry() {
        let dir = TempDir::new().unwrap();
        let storage = open(&dir);
        let config = RegistryConfig::new(Identity::derive("admin"));

        assert!(!storage.has_snapshot().unwrap());
        let registry = storage.load(&config).unwrap();
        assert_eq!(registry.user_count(), 0);
        assert_eq!(registry.admin(), &config.admin);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let config = RegistryConfig::new(Identity::derive("admin"));
        let alice = Identity::derive("alice");
        let bob = Identity::derive("bob");

        let mut registry = Registry::new(&config);
        registry.register_user(&alice, "alice").unwrap();
        registry.register_user(&bob, "bob").unwrap();
        registry
            .adjust_reputation(&config.admin, &hash_name("bob"), 4)
            .unwrap();
        let forum_id = registry.register_forum(&bob, "general", 0).unwrap();
        let (root, reply) = {
            let mut forum = registry.forum_mut(forum_id).unwrap();
            let root = forum
                .create_thread(
                    &alice,
                    &hash_name("alice"),
                    "subject",
                    ContentHash::compute(b"body"),
                    Vec::new(),
                )
                .unwrap();
            let reply = forum
                .reply(
                    &bob,
                    root,
                    &hash_name("bob"),
                    ContentHash::compute(b"reply"),
                    Vec::new(),
                )
                .unwrap();
            forum.cast_vote(&bob, root, &hash_name("bob"), Vote::Up).unwrap();
            forum.redact(&bob, reply).unwrap();
            (root, reply)
        };

        {
            let storage = open(&dir);
            storage.save(&registry).unwrap();
            // Saving twice leaves one copy of each event.
            storage.save(&registry).unwrap();
            assert_eq!(
                storage.stored_event_count().unwrap(),
                registry.events().len() as u64
            );
        }

        let storage = open(&dir);
        let loaded = storage.load(&config).unwrap();
        assert_eq!(loaded.user_count(), 2);
        assert_eq!(loaded.events().records(), registry.events().records());
        assert_eq!(
            loaded.user_by_name(&hash_name("bob")).unwrap().reputation(),
            4
        );

        let forum = loaded.forum(forum_id).unwrap();
        assert_eq!(forum.threads(), &[root]);
        assert_eq!(forum.replies_to(root), &[reply]);
        assert!(forum.post(reply).unwrap().is_redacted());
        assert_eq!(forum.post(root).unwrap().score(), 1);
        assert_eq!(forum.next_post_id(), PostId::new(3));
    }

    #[test]
    fn test_loaded_registry_keeps_uniqueness() {
        let dir = TempDir::new().unwrap();
        let config = RegistryConfig::new(Identity::derive("admin"));
        let mut registry = Registry::new(&config);
        registry
            .register_user(&Identity::derive("alice"), "alice")
            .unwrap();
        open(&dir).save(&registry).unwrap();

        let mut loaded = open(&dir).load(&config).unwrap();
        assert!(loaded
            .register_user(&Identity::derive("mallory"), "alice")
            .is_err());
        let id = loaded
            .register_user(&Identity::derive("carol"), "carol")
            .unwrap();
        assert_eq!(id.value(), 1);
    }

    #[test]
    fn test_saving_another_registry_replaces_the_stored_one() {
        let dir = TempDir::new().unwrap();
        let config = RegistryConfig::new(Identity::derive("admin"));

        let mut first = Registry::new(&config);
        first
            .register_user(&Identity::derive("alice"), "alice")
            .unwrap();
        first.register_user(&Identity::derive("bob"), "bob").unwrap();
        first
            .register_forum(&Identity::derive("bob"), "general", 0)
            .unwrap();
        open(&dir).save(&first).unwrap();

        let mut second = Registry::new(&config);
        second
            .register_user(&Identity::derive("carol"), "carol")
            .unwrap();
        let storage = open(&dir);
        storage.save(&second).unwrap();
        assert_eq!(storage.stored_event_count().unwrap(), 1);

        let loaded = storage.load(&config).unwrap();
        assert_eq!(loaded.user_count(), 1);
        assert_eq!(loaded.forum_count(), 0);
        assert!(loaded.lookup_user(&hash_name("carol")).is_ok());
        assert!(loaded.lookup_user(&hash_name("alice")).is_err());
        assert_eq!(loaded.events().records(), second.events().records());
    }

    #[test]
    fn test_transferred_admin_survives_reload() {
        let dir = TempDir::new().unwrap();
        let config = RegistryConfig::new(Identity::derive("admin"));
        let next = Identity::derive("next-admin");
        let mut registry = Registry::new(&config);
        registry.transfer_admin(&config.admin, next).unwrap();
        open(&dir).save(&registry).unwrap();

        let loaded = open(&dir).load(&config).unwrap();
        assert_eq!(loaded.admin(), &next);
    }
}
