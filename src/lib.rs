//! # Forum Registry
//!
//! A name registry for users and forums, with reputation-gated discussion
//! trees inside each forum.
//!
//! ## Features
//!
//! - **Unique names**: user and forum names are bound once, by hash, in two
//!   separate namespaces
//! - **Ownership**: every user and forum records the identity that registered
//!   it; only that identity can act for it
//! - **Reputation gating**: forum owners set a signed threshold that posters
//!   and voters must meet; only the registry administrator changes reputation
//! - **Append-only threads**: posts form a tree of threads and replies with
//!   sequential ids and a one-way redaction flag
//! - **Events**: each successful state change emits exactly one structured
//!   record for indexers
//!
//! ## Example
//!
//! ```rust
//! use forum_registry::{ContentHash, Identity, Registry};
//! # fn main() -> forum_registry::Result<()> {
//! let admin = Identity::derive("admin");
//! let alice = Identity::derive("alice");
//! let bob = Identity::derive("bob");
//!
//! let mut registry = Registry::with_admin(admin);
//! registry.register_user(&alice, "alice")?;
//! let general = registry.register_forum(&bob, "general", 0)?;
//!
//! let mut forum = registry.forum_mut(general)?;
//! let thread = forum.create_thread(
//!     &alice,
//!     &Registry::hash_name("alice"),
//!     "a great discussion",
//!     ContentHash::compute(b"first!"),
//!     Vec::new(),
//! )?;
//! assert_eq!(thread.value(), 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod hash;
pub mod identity;
pub mod logging;
pub mod registry;
pub mod storage;

pub use config::{Limits, RegistryConfig};
pub use error::{RegistryError, Result};
pub use hash::{hash_name, ContentHash, NameHash};
pub use identity::Identity;
pub use registry::{
    Attachment, Event, EventLog, EventSink, Forum, ForumHandle, ForumId, Post, PostId, PostState,
    Registry, RegistryStorage, User, UserId, Vote,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
