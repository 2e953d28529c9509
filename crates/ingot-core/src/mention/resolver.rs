//! Resolution of scanned mentions into domain objects.
//!
//! The scanner only produces ids; the surrounding client owns the caches
//! that map ids to users, roles, channels, and emoji. [`MentionResolver`]
//! is the seam between the two: the client implements it over its caches
//! (constructing one resolver per lookup scope, e.g. per server) and
//! [`resolve_mentions`] drives a scan through it.

use tracing::debug;

use super::{Mention, scan};

/// Lookup interface supplied by the surrounding client.
///
/// All lookups return `None` for unknown ids. Emoji are special: a
/// reference carries enough information (`animated`, `name`, `id`) to
/// build a usable emoji object even when no cache knows the id, so the
/// resolver must provide [`unknown_emoji`](MentionResolver::unknown_emoji)
/// as a fallback constructor.
pub trait MentionResolver {
    /// The client's user object.
    type User;
    /// The client's role object.
    type Role;
    /// The client's channel object.
    type Channel;
    /// The client's emoji object.
    type Emoji;

    /// Looks up a user by id.
    fn resolve_user(&self, id: u64) -> Option<Self::User>;

    /// Looks up a role by id.
    fn resolve_role(&self, id: u64) -> Option<Self::Role>;

    /// Looks up a channel by id.
    fn resolve_channel(&self, id: u64) -> Option<Self::Channel>;

    /// Looks up a custom emoji by id.
    fn resolve_emoji(&self, id: u64) -> Option<Self::Emoji>;

    /// Builds an emoji object for an id absent from every cache.
    fn unknown_emoji(&self, animated: bool, name: &str, id: u64) -> Self::Emoji;
}

/// A mention resolved against a [`MentionResolver`].
///
/// Broadcast targets carry no id and pass through unresolved.
pub enum Resolved<R: MentionResolver + ?Sized> {
    /// A resolved user mention.
    User(R::User),
    /// A resolved role mention.
    Role(R::Role),
    /// A resolved channel mention.
    Channel(R::Channel),
    /// A resolved (or fallback-constructed) emoji reference.
    Emoji(R::Emoji),
    /// The `@everyone` broadcast target.
    Everyone,
    /// The `@here` broadcast target.
    Here,
}

impl<R: MentionResolver + ?Sized> std::fmt::Debug for Resolved<R>
where
    R::User: std::fmt::Debug,
    R::Role: std::fmt::Debug,
    R::Channel: std::fmt::Debug,
    R::Emoji: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(user) => f.debug_tuple("User").field(user).finish(),
            Self::Role(role) => f.debug_tuple("Role").field(role).finish(),
            Self::Channel(channel) => f.debug_tuple("Channel").field(channel).finish(),
            Self::Emoji(emoji) => f.debug_tuple("Emoji").field(emoji).finish(),
            Self::Everyone => f.write_str("Everyone"),
            Self::Here => f.write_str("Here"),
        }
    }
}

impl<R: MentionResolver + ?Sized> PartialEq for Resolved<R>
where
    R::User: PartialEq,
    R::Role: PartialEq,
    R::Channel: PartialEq,
    R::Emoji: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::User(a), Self::User(b)) => a == b,
            (Self::Role(a), Self::Role(b)) => a == b,
            (Self::Channel(a), Self::Channel(b)) => a == b,
            (Self::Emoji(a), Self::Emoji(b)) => a == b,
            (Self::Everyone, Self::Everyone) | (Self::Here, Self::Here) => true,
            _ => false,
        }
    }
}

/// Scans `text` and resolves every mention in input order.
///
/// Mentions whose id the resolver does not know are skipped, except emoji,
/// which fall back to [`MentionResolver::unknown_emoji`]. Broadcast
/// targets are passed through as-is.
pub fn resolve_mentions<R: MentionResolver>(text: &str, resolver: &R) -> Vec<Resolved<R>> {
    let mut resolved = Vec::new();

    for mention in scan(text) {
        match mention {
            Mention::User { id } => {
                if let Some(user) = resolver.resolve_user(id) {
                    resolved.push(Resolved::User(user));
                }
            }
            Mention::Role { id } => {
                if let Some(role) = resolver.resolve_role(id) {
                    resolved.push(Resolved::Role(role));
                }
            }
            Mention::Channel { id } => {
                if let Some(channel) = resolver.resolve_channel(id) {
                    resolved.push(Resolved::Channel(channel));
                }
            }
            Mention::Emoji { animated, name, id } => {
                let emoji = resolver
                    .resolve_emoji(id)
                    .unwrap_or_else(|| resolver.unknown_emoji(animated, &name, id));
                resolved.push(Resolved::Emoji(emoji));
            }
            Mention::Everyone => resolved.push(Resolved::Everyone),
            Mention::Here => resolved.push(Resolved::Here),
        }
    }

    debug!(count = resolved.len(), "resolved mentions");
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Resolver that knows ids below 100 and nothing else.
    struct TestResolver;

    #[derive(Debug, PartialEq)]
    struct TestEmoji {
        animated: bool,
        name: String,
        id: u64,
        cached: bool,
    }

    impl MentionResolver for TestResolver {
        type User = u64;
        type Role = u64;
        type Channel = u64;
        type Emoji = TestEmoji;

        fn resolve_user(&self, id: u64) -> Option<u64> {
            (id < 100).then_some(id)
        }

        fn resolve_role(&self, id: u64) -> Option<u64> {
            (id < 100).then_some(id)
        }

        fn resolve_channel(&self, id: u64) -> Option<u64> {
            (id < 100).then_some(id)
        }

        fn resolve_emoji(&self, id: u64) -> Option<TestEmoji> {
            (id < 100).then(|| TestEmoji {
                animated: false,
                name: "cached".into(),
                id,
                cached: true,
            })
        }

        fn unknown_emoji(&self, animated: bool, name: &str, id: u64) -> TestEmoji {
            TestEmoji {
                animated,
                name: name.into(),
                id,
                cached: false,
            }
        }
    }

    #[test]
    fn resolves_in_input_order() {
        let resolved = resolve_mentions("<#2> then <@1> for @everyone", &TestResolver);
        assert_eq!(
            resolved,
            vec![
                Resolved::Channel(2),
                Resolved::User(1),
                Resolved::Everyone,
            ]
        );
    }

    #[test]
    fn unknown_ids_are_skipped() {
        let resolved = resolve_mentions("<@1> <@500> <@&501> <#2>", &TestResolver);
        assert_eq!(resolved, vec![Resolved::User(1), Resolved::Channel(2)]);
    }

    #[test]
    fn unknown_emoji_falls_back_to_reference_fields() {
        let resolved = resolve_mentions("<a:party:900>", &TestResolver);
        assert_eq!(
            resolved,
            vec![Resolved::Emoji(TestEmoji {
                animated: true,
                name: "party".into(),
                id: 900,
                cached: false,
            })]
        );
    }

    #[test]
    fn cached_emoji_wins_over_fallback() {
        let resolved = resolve_mentions("<:party:9>", &TestResolver);
        assert_eq!(
            resolved,
            vec![Resolved::Emoji(TestEmoji {
                animated: false,
                name: "cached".into(),
                id: 9,
                cached: true,
            })]
        );
    }
}
