//! Event system for the Ingot core.
//!
//! This module provides the event infrastructure shared by the whole
//! library:
//!
//! - [`EventCategory`] - Fixed classification used to route events to
//!   registered handlers
//! - [`Event`] - Base trait for all event payloads
//! - [`BoxedEvent`] - Type-erased event container with runtime downcasting
//! - [`RawEvent`] - Stock catch-all payload carrying raw JSON
//!
//! Concrete payload shapes (message objects, member objects, ...) are
//! defined by the surrounding client, not here; the dispatcher only needs
//! the category and, for generic filters, the optional [`MessageAccess`]
//! view.

use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::message::MessageAccess;

// ============================================================================
// Event Category
// ============================================================================

/// Classification of inbound events.
///
/// The category is the routing key for handler registration and dispatch.
/// The set is fixed at design time; payloads the library does not model
/// arrive as [`Raw`](EventCategory::Raw) or
/// [`Unknown`](EventCategory::Unknown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// A message was created.
    Message,
    /// A message was edited.
    MessageEdit,
    /// A message was deleted.
    MessageDelete,
    /// A reaction was added to a message.
    ReactionAdd,
    /// A reaction was removed from a message.
    ReactionRemove,
    /// All reactions were cleared from a message.
    ReactionRemoveAll,
    /// A user started typing.
    Typing,
    /// A presence update was received.
    Presence,
    /// The connection finished its handshake.
    Ready,
    /// The connection was closed.
    Disconnect,
    /// A member joined a server.
    MemberJoin,
    /// A member was updated.
    MemberUpdate,
    /// A member left a server.
    MemberLeave,
    /// A channel was created.
    ChannelCreate,
    /// A channel was updated.
    ChannelUpdate,
    /// A channel was deleted.
    ChannelDelete,
    /// Any event, delivered with its raw payload.
    Raw,
    /// An event the library does not recognize.
    Unknown,
}

impl EventCategory {
    /// Returns the canonical lowercase name of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::MessageEdit => "message_edit",
            Self::MessageDelete => "message_delete",
            Self::ReactionAdd => "reaction_add",
            Self::ReactionRemove => "reaction_remove",
            Self::ReactionRemoveAll => "reaction_remove_all",
            Self::Typing => "typing",
            Self::Presence => "presence",
            Self::Ready => "ready",
            Self::Disconnect => "disconnect",
            Self::MemberJoin => "member_join",
            Self::MemberUpdate => "member_update",
            Self::MemberLeave => "member_leave",
            Self::ChannelCreate => "channel_create",
            Self::ChannelUpdate => "channel_update",
            Self::ChannelDelete => "channel_delete",
            Self::Raw => "raw",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "message" => Self::Message,
            "message_edit" => Self::MessageEdit,
            "message_delete" => Self::MessageDelete,
            "reaction_add" => Self::ReactionAdd,
            "reaction_remove" => Self::ReactionRemove,
            "reaction_remove_all" => Self::ReactionRemoveAll,
            "typing" => Self::Typing,
            "presence" => Self::Presence,
            "ready" => Self::Ready,
            "disconnect" => Self::Disconnect,
            "member_join" => Self::MemberJoin,
            "member_update" => Self::MemberUpdate,
            "member_leave" => Self::MemberLeave,
            "channel_create" => Self::ChannelCreate,
            "channel_update" => Self::ChannelUpdate,
            "channel_delete" => Self::ChannelDelete,
            "raw" => Self::Raw,
            _ => Self::Unknown,
        })
    }
}

// ============================================================================
// Core Event Trait
// ============================================================================

/// The base trait for all event payloads.
///
/// Events are type-erased as `dyn Event` while they travel through the
/// dispatcher and downcast back to their concrete type by handlers that
/// know what they registered for.
///
/// Message-shaped events additionally expose the [`MessageAccess`] view via
/// [`as_message`](Event::as_message) so generic filters can match on
/// content, channel, and author without a downcast.
pub trait Event: Any + Send + Sync {
    /// Returns the human-readable name of this event.
    fn event_name(&self) -> &str;

    /// Returns the category this event belongs to.
    fn category(&self) -> EventCategory;

    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns the message view of this event, if it carries one.
    ///
    /// The default implementation returns `None`; message-shaped events
    /// override this to `Some(self)`.
    fn as_message(&self) -> Option<&dyn MessageAccess> {
        None
    }
}

// ============================================================================
// Boxed Event
// ============================================================================

/// A type-erased container for events that supports runtime downcasting.
///
/// `BoxedEvent` wraps any type implementing [`Event`] in an `Arc`, allowing
/// it to be handed to every registered handler without copying the payload.
///
/// # Deref to Event Trait
///
/// `BoxedEvent` implements `Deref<Target = dyn Event>`, so trait methods
/// can be called directly:
///
/// ```rust,ignore
/// let event: BoxedEvent = /* ... */;
/// let name = event.event_name();
/// let category = event.category();
/// ```
#[derive(Clone)]
pub struct BoxedEvent {
    inner: Arc<dyn Event>,
}

impl BoxedEvent {
    /// Creates a new `BoxedEvent` from any type implementing `Event`.
    pub fn new<E: Event + 'static>(event: E) -> Self {
        Self {
            inner: Arc::new(event),
        }
    }

    /// Returns the inner `Arc<dyn Event>`.
    pub fn inner(&self) -> &Arc<dyn Event> {
        &self.inner
    }

    /// Attempts to downcast to a concrete event type.
    pub fn downcast_ref<E: Event + 'static>(&self) -> Option<&E> {
        self.inner.as_any().downcast_ref()
    }
}

impl std::ops::Deref for BoxedEvent {
    type Target = dyn Event;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl fmt::Debug for BoxedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedEvent")
            .field("event_name", &self.event_name())
            .field("category", &self.category())
            .finish()
    }
}

// ============================================================================
// Raw Event
// ============================================================================

/// A stock catch-all event carrying its raw JSON payload.
///
/// The receiving loop wraps payloads it has no concrete model for in a
/// `RawEvent`, so handlers registered under [`EventCategory::Raw`] (or
/// [`EventCategory::Unknown`]) still see everything the gateway sent.
#[derive(Debug, Clone)]
pub struct RawEvent {
    category: EventCategory,
    payload: serde_json::Value,
}

impl RawEvent {
    /// Creates a raw event for the given category.
    pub fn new(category: EventCategory, payload: serde_json::Value) -> Self {
        Self { category, payload }
    }

    /// Returns the raw JSON payload.
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}

impl Event for RawEvent {
    fn event_name(&self) -> &str {
        self.category.as_str()
    }

    fn category(&self) -> EventCategory {
        self.category
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
