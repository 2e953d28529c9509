//! Mention scanning and resolution.
//!
//! Message text can carry structured inline references:
//!
//! | Form                | Meaning                      |
//! |---------------------|------------------------------|
//! | `<@123>` / `<@!123>`| user mention                 |
//! | `<@&123>`           | role mention                 |
//! | `<#123>`            | channel mention              |
//! | `<:name:123>`       | custom emoji                 |
//! | `<a:name:123>`      | animated custom emoji        |
//! | `@everyone`         | broadcast to everyone        |
//! | `@here`             | broadcast to online members  |
//!
//! [`scan`] walks the text once, left to right, and yields a [`Mention`]
//! for every complete, closed reference. The scanner runs for every
//! incoming message, so it works byte-by-byte with one byte of lookahead
//! and never backtracks or evaluates patterns; malformed references are
//! skipped silently and scanning resumes wherever the cursor stopped.
//!
//! Turning scanned ids into domain objects is the caller's business:
//! implement [`MentionResolver`] over the client's caches and feed the
//! text through [`resolve_mentions`].

mod resolver;
mod scanner;

pub use resolver::{MentionResolver, Resolved, resolve_mentions};
pub use scanner::MentionScanner;

use serde::{Deserialize, Serialize};

/// A structured reference extracted from message text.
///
/// A `Mention` is only ever produced for a syntactically complete and
/// closed reference; the scanner never emits partial matches. Id fields
/// hold the raw parsed integer — a digit run that does not fit `u64`
/// produces no mention at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mention {
    /// A user mention, `<@123>` or `<@!123>`.
    User {
        /// The mentioned user's id.
        id: u64,
    },
    /// A role mention, `<@&123>`.
    Role {
        /// The mentioned role's id.
        id: u64,
    },
    /// A channel mention, `<#123>`.
    Channel {
        /// The mentioned channel's id.
        id: u64,
    },
    /// A custom emoji reference, `<:name:123>` or `<a:name:123>`.
    Emoji {
        /// Whether the emoji is animated (the `<a:` form).
        animated: bool,
        /// The emoji name as written, taken verbatim.
        name: String,
        /// The emoji's id.
        id: u64,
    },
    /// The `@everyone` broadcast target.
    Everyone,
    /// The `@here` broadcast target.
    Here,
}

/// Scans `text` for mentions.
///
/// The returned iterator is lazy and finite; it borrows `text` for the
/// duration of the scan. Scanning the same text again requires a fresh
/// call (the cursor is not restartable).
///
/// # Example
///
/// ```rust,ignore
/// use ingot_core::mention::{self, Mention};
///
/// let found: Vec<Mention> = mention::scan("see <#200> and <@100>").collect();
/// assert_eq!(
///     found,
///     vec![Mention::Channel { id: 200 }, Mention::User { id: 100 }],
/// );
/// ```
pub fn scan(text: &str) -> MentionScanner<'_> {
    MentionScanner::new(text)
}
