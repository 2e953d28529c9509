//! Message access capability.
//!
//! Generic filters need to look at message content, channel, and author
//! without depending on the client's concrete message type. Message-shaped
//! events implement [`MessageAccess`] and surface it through
//! [`Event::as_message`](crate::event::Event::as_message).

/// Read access to the fields generic message filters match against.
///
/// Accessors that are not universally available (channel names in direct
/// messages, display names before the member cache is warm) return
/// `Option` and default to `None`.
pub trait MessageAccess: Send + Sync {
    /// The message text.
    fn content(&self) -> &str;

    /// Id of the channel the message was sent in.
    fn channel_id(&self) -> u64;

    /// Name of the channel, when known.
    fn channel_name(&self) -> Option<&str> {
        None
    }

    /// Id of the message author.
    fn author_id(&self) -> u64;

    /// Name of the message author, when known.
    fn author_name(&self) -> Option<&str> {
        None
    }

    /// Whether the author is a bot account.
    fn author_is_bot(&self) -> bool {
        false
    }

    /// Creation time of the message, as unix seconds.
    fn timestamp(&self) -> i64;

    /// Whether the message was sent in a direct-message channel.
    fn is_private(&self) -> bool {
        false
    }
}
