//! # Ingot Core
//!
//! The core engine of the Ingot chat-bot client library.
//!
//! This crate provides the building blocks that the rest of the library is
//! assembled from:
//!
//! - **Event System**: Type-erased events with runtime downcasting
//!   ([`Event`], [`BoxedEvent`]) and a fixed category taxonomy
//!   ([`EventCategory`]) used to route events to handlers.
//! - **Message Access**: The [`MessageAccess`] capability trait that message
//!   events expose so generic filters can inspect content, channel, and
//!   author without knowing the concrete payload type.
//! - **Mention Scanning**: A single-pass, non-backtracking scanner
//!   ([`mention::MentionScanner`]) that extracts structured references
//!   (user/role/channel mentions, custom emoji, `@everyone`/`@here`) from
//!   raw message text, plus the [`mention::MentionResolver`] seam for
//!   turning scanned ids into domain objects.
//!
//! Transport, REST surface, and the concrete object model for channels,
//! users, and servers live outside this crate; they feed events in and
//! consume scanned mentions out.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ingot_core::mention::{self, Mention};
//!
//! let found: Vec<Mention> = mention::scan("ping <@123456789>!").collect();
//! assert_eq!(found, vec![Mention::User { id: 123456789 }]);
//! ```

pub mod event;
pub mod mention;
pub mod message;

pub use event::{BoxedEvent, Event, EventCategory, RawEvent};
pub use message::MessageAccess;

/// Prelude for common imports.
pub mod prelude {
    pub use super::event::{BoxedEvent, Event, EventCategory, RawEvent};
    pub use super::mention::{Mention, MentionResolver, MentionScanner, Resolved};
    pub use super::message::MessageAccess;
}
