//! Declarative attribute filters and their compiler.
//!
//! Handlers can be registered with a map of attributes instead of (or in
//! addition to) hand-written middleware:
//!
//! ```rust,ignore
//! dispatcher.register_with(
//!     EventCategory::Message,
//!     &Attributes::new()
//!         .with("in", "#general")
//!         .with("start_with", "!roll"),
//!     Stack::new(),
//!     |event, _ctx| { /* ... */ },
//! )?;
//! ```
//!
//! Each attribute name maps to a registered [factory](AttributeFactory)
//! that turns the attribute's value into one middleware unit. Factories
//! dispatch on the value's runtime type ([`AttributeValue`] variant): the
//! same attribute can match exactly on a string and structurally on a
//! pattern. Unknown attributes and unsupported value types are
//! configuration errors reported at registration time.
//!
//! The factory table is itself extensible via [`StockRegistry::register`],
//! so a client can add attributes for its own event payloads without
//! touching the dispatcher.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use regex::Regex;
use tracing::debug;

use ingot_core::{BoxedEvent, EventCategory};

use crate::context::DispatchContext;
use crate::error::{StockError, StockResult};
use crate::middleware::{BoxedMiddleware, Middleware, Next};

// ============================================================================
// Attribute values
// ============================================================================

/// A runtime-typed attribute value.
///
/// Factories inspect the variant to pick matching semantics; a factory
/// that has no semantics for the given variant rejects the registration
/// with [`StockError::UnsupportedValue`].
#[derive(Debug, Clone)]
pub enum AttributeValue {
    /// Exact-match string data.
    Str(String),
    /// Numeric data: ids, unix timestamps.
    Int(u64),
    /// Boolean flags.
    Bool(bool),
    /// A compiled pattern for structural matching.
    Pattern(Regex),
}

impl AttributeValue {
    /// Human-readable name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) => "integer",
            Self::Bool(_) => "boolean",
            Self::Pattern(_) => "pattern",
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Regex> for AttributeValue {
    fn from(value: Regex) -> Self {
        Self::Pattern(value)
    }
}

/// An ordered attribute map.
///
/// Order is preserved: compiled units run in the order the attributes
/// were added.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    entries: Vec<(String, AttributeValue)>,
}

impl Attributes {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an attribute (builder form).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.entries.push((name.into(), value.into()));
        self
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

// ============================================================================
// Factory registry
// ============================================================================

/// Builds one middleware unit from an attribute value.
pub type AttributeFactory = Arc<dyn Fn(&AttributeValue) -> StockResult<BoxedMiddleware> + Send + Sync>;

/// Per-category table of attribute factories.
///
/// A [`Dispatcher`](crate::Dispatcher) owns one, pre-loaded with the
/// message attributes below; clients extend it with
/// [`register`](Self::register).
pub struct StockRegistry {
    factories: RwLock<HashMap<EventCategory, HashMap<String, AttributeFactory>>>,
}

impl StockRegistry {
    /// Creates an empty registry with no factories at all.
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a registry with the stock message attributes installed:
    /// `content`, `in`, `start_with`, `end_with`, `contains`, `from`,
    /// `after`, `before`, and `private`.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(EventCategory::Message, "content", content_factory);
        registry.register(EventCategory::Message, "in", in_factory);
        registry.register(EventCategory::Message, "start_with", start_with_factory);
        registry.register(EventCategory::Message, "end_with", end_with_factory);
        registry.register(EventCategory::Message, "contains", contains_factory);
        registry.register(EventCategory::Message, "from", from_factory);
        registry.register(EventCategory::Message, "after", after_factory);
        registry.register(EventCategory::Message, "before", before_factory);
        registry.register(EventCategory::Message, "private", private_factory);
        registry
    }

    /// Registers a factory for `attribute` under `category`, replacing any
    /// previous factory for the same name.
    pub fn register<F>(&self, category: EventCategory, attribute: impl Into<String>, factory: F)
    where
        F: Fn(&AttributeValue) -> StockResult<BoxedMiddleware> + Send + Sync + 'static,
    {
        let attribute = attribute.into();
        debug!(%category, %attribute, "registered attribute factory");
        self.factories
            .write()
            .entry(category)
            .or_default()
            .insert(attribute, Arc::new(factory));
    }

    /// Compiles an attribute map into middleware units, in insertion
    /// order.
    ///
    /// Compilation is all-or-nothing: the first unknown attribute or
    /// unsupported value fails the whole map.
    pub fn compile(
        &self,
        category: EventCategory,
        attributes: &Attributes,
    ) -> StockResult<Vec<BoxedMiddleware>> {
        let factories = self.factories.read();
        let table = factories.get(&category);

        attributes
            .iter()
            .map(|(name, value)| {
                let factory =
                    table
                        .and_then(|table| table.get(name))
                        .ok_or_else(|| StockError::UnknownAttribute {
                            category,
                            attribute: name.to_owned(),
                            available: table
                                .map(|table| {
                                    let mut names: Vec<String> =
                                        table.keys().cloned().collect();
                                    names.sort();
                                    names
                                })
                                .unwrap_or_default(),
                        })?;
                (**factory)(value)
            })
            .collect()
    }
}

impl Default for StockRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for StockRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let factories = self.factories.read();
        let total: usize = factories.values().map(HashMap::len).sum();
        f.debug_struct("StockRegistry")
            .field("categories", &factories.len())
            .field("factories", &total)
            .finish()
    }
}

// ============================================================================
// Stock message filters
// ============================================================================

/// Exact or pattern text matching shared by the text filters.
#[derive(Debug, Clone)]
enum TextMatcher {
    Exact(String),
    Pattern(Regex),
}

fn text_matcher(attribute: &'static str, value: &AttributeValue) -> StockResult<TextMatcher> {
    match value {
        AttributeValue::Str(s) => Ok(TextMatcher::Exact(s.clone())),
        AttributeValue::Pattern(p) => Ok(TextMatcher::Pattern(p.clone())),
        other => Err(StockError::UnsupportedValue {
            attribute: attribute.to_owned(),
            kind: other.kind(),
        }),
    }
}

/// Proceeds when the message content equals the expected string.
pub struct ContentFilter {
    expected: String,
}

impl Middleware for ContentFilter {
    fn call(&self, event: &BoxedEvent, ctx: &mut DispatchContext, next: Next<'_>) {
        match event.as_message() {
            Some(message) if message.content() == self.expected => next.proceed(ctx),
            _ => {}
        }
    }
}

/// Proceeds when the message was sent in the expected channel.
pub struct ChannelFilter {
    target: ChannelTarget,
}

#[derive(Debug)]
enum ChannelTarget {
    Name(String),
    Id(u64),
}

impl Middleware for ChannelFilter {
    fn call(&self, event: &BoxedEvent, ctx: &mut DispatchContext, next: Next<'_>) {
        let Some(message) = event.as_message() else {
            return;
        };
        let matched = match &self.target {
            ChannelTarget::Name(name) => message.channel_name() == Some(name.as_str()),
            ChannelTarget::Id(id) => message.channel_id() == *id,
        };
        if matched {
            next.proceed(ctx);
        }
    }
}

/// Proceeds when the content starts with the expected text, or when the
/// pattern's leftmost match starts at the first byte.
pub struct StartWithFilter {
    matcher: TextMatcher,
}

impl Middleware for StartWithFilter {
    fn call(&self, event: &BoxedEvent, ctx: &mut DispatchContext, next: Next<'_>) {
        let Some(message) = event.as_message() else {
            return;
        };
        let content = message.content();
        let matched = match &self.matcher {
            TextMatcher::Exact(prefix) => content.starts_with(prefix),
            TextMatcher::Pattern(pattern) => {
                pattern.find(content).is_some_and(|m| m.start() == 0)
            }
        };
        if matched {
            next.proceed(ctx);
        }
    }
}

/// Proceeds when the content ends with the expected text, or when one of
/// the pattern's matches ends at the final byte.
pub struct EndWithFilter {
    matcher: TextMatcher,
}

impl Middleware for EndWithFilter {
    fn call(&self, event: &BoxedEvent, ctx: &mut DispatchContext, next: Next<'_>) {
        let Some(message) = event.as_message() else {
            return;
        };
        let content = message.content();
        let matched = match &self.matcher {
            TextMatcher::Exact(suffix) => content.ends_with(suffix),
            TextMatcher::Pattern(pattern) => pattern
                .find_iter(content)
                .any(|m| m.end() == content.len()),
        };
        if matched {
            next.proceed(ctx);
        }
    }
}

/// Proceeds when the content contains the expected text or matches the
/// pattern anywhere.
pub struct ContainsFilter {
    matcher: TextMatcher,
}

impl Middleware for ContainsFilter {
    fn call(&self, event: &BoxedEvent, ctx: &mut DispatchContext, next: Next<'_>) {
        let Some(message) = event.as_message() else {
            return;
        };
        let content = message.content();
        let matched = match &self.matcher {
            TextMatcher::Exact(needle) => content.contains(needle),
            TextMatcher::Pattern(pattern) => pattern.is_match(content),
        };
        if matched {
            next.proceed(ctx);
        }
    }
}

/// Proceeds when the message author matches by name or id.
pub struct AuthorFilter {
    target: AuthorTarget,
}

#[derive(Debug)]
enum AuthorTarget {
    Name(String),
    Id(u64),
}

impl Middleware for AuthorFilter {
    fn call(&self, event: &BoxedEvent, ctx: &mut DispatchContext, next: Next<'_>) {
        let Some(message) = event.as_message() else {
            return;
        };
        let matched = match &self.target {
            AuthorTarget::Name(name) => message.author_name() == Some(name.as_str()),
            AuthorTarget::Id(id) => message.author_id() == *id,
        };
        if matched {
            next.proceed(ctx);
        }
    }
}

/// Proceeds when the message is newer than the cutoff.
pub struct AfterFilter {
    cutoff: i64,
}

impl Middleware for AfterFilter {
    fn call(&self, event: &BoxedEvent, ctx: &mut DispatchContext, next: Next<'_>) {
        match event.as_message() {
            Some(message) if message.timestamp() > self.cutoff => next.proceed(ctx),
            _ => {}
        }
    }
}

/// Proceeds when the message is older than the cutoff.
pub struct BeforeFilter {
    cutoff: i64,
}

impl Middleware for BeforeFilter {
    fn call(&self, event: &BoxedEvent, ctx: &mut DispatchContext, next: Next<'_>) {
        match event.as_message() {
            Some(message) if message.timestamp() < self.cutoff => next.proceed(ctx),
            _ => {}
        }
    }
}

/// Proceeds when the message's direct-message flag equals the expected
/// value.
pub struct PrivateFilter {
    expected: bool,
}

impl Middleware for PrivateFilter {
    fn call(&self, event: &BoxedEvent, ctx: &mut DispatchContext, next: Next<'_>) {
        match event.as_message() {
            Some(message) if message.is_private() == self.expected => next.proceed(ctx),
            _ => {}
        }
    }
}

// ============================================================================
// Stock factories
// ============================================================================

fn content_factory(value: &AttributeValue) -> StockResult<BoxedMiddleware> {
    match value {
        AttributeValue::Str(s) => Ok(BoxedMiddleware::new(ContentFilter {
            expected: s.clone(),
        })),
        other => Err(StockError::UnsupportedValue {
            attribute: "content".to_owned(),
            kind: other.kind(),
        }),
    }
}

fn in_factory(value: &AttributeValue) -> StockResult<BoxedMiddleware> {
    match value {
        AttributeValue::Str(s) => {
            // A leading `#` is cosmetic: `in: "#general"` and `in: "general"`
            // name the same channel.
            let name = s.strip_prefix('#').unwrap_or(s).to_owned();
            Ok(BoxedMiddleware::new(ChannelFilter {
                target: ChannelTarget::Name(name),
            }))
        }
        AttributeValue::Int(id) => Ok(BoxedMiddleware::new(ChannelFilter {
            target: ChannelTarget::Id(*id),
        })),
        other => Err(StockError::UnsupportedValue {
            attribute: "in".to_owned(),
            kind: other.kind(),
        }),
    }
}

fn start_with_factory(value: &AttributeValue) -> StockResult<BoxedMiddleware> {
    Ok(BoxedMiddleware::new(StartWithFilter {
        matcher: text_matcher("start_with", value)?,
    }))
}

fn end_with_factory(value: &AttributeValue) -> StockResult<BoxedMiddleware> {
    Ok(BoxedMiddleware::new(EndWithFilter {
        matcher: text_matcher("end_with", value)?,
    }))
}

fn contains_factory(value: &AttributeValue) -> StockResult<BoxedMiddleware> {
    Ok(BoxedMiddleware::new(ContainsFilter {
        matcher: text_matcher("contains", value)?,
    }))
}

fn from_factory(value: &AttributeValue) -> StockResult<BoxedMiddleware> {
    match value {
        AttributeValue::Str(name) => Ok(BoxedMiddleware::new(AuthorFilter {
            target: AuthorTarget::Name(name.clone()),
        })),
        AttributeValue::Int(id) => Ok(BoxedMiddleware::new(AuthorFilter {
            target: AuthorTarget::Id(*id),
        })),
        other => Err(StockError::UnsupportedValue {
            attribute: "from".to_owned(),
            kind: other.kind(),
        }),
    }
}

fn after_factory(value: &AttributeValue) -> StockResult<BoxedMiddleware> {
    match value {
        AttributeValue::Int(cutoff) => Ok(BoxedMiddleware::new(AfterFilter {
            cutoff: *cutoff as i64,
        })),
        other => Err(StockError::UnsupportedValue {
            attribute: "after".to_owned(),
            kind: other.kind(),
        }),
    }
}

fn before_factory(value: &AttributeValue) -> StockResult<BoxedMiddleware> {
    match value {
        AttributeValue::Int(cutoff) => Ok(BoxedMiddleware::new(BeforeFilter {
            cutoff: *cutoff as i64,
        })),
        other => Err(StockError::UnsupportedValue {
            attribute: "before".to_owned(),
            kind: other.kind(),
        }),
    }
}

fn private_factory(value: &AttributeValue) -> StockResult<BoxedMiddleware> {
    match value {
        AttributeValue::Bool(expected) => Ok(BoxedMiddleware::new(PrivateFilter {
            expected: *expected,
        })),
        other => Err(StockError::UnsupportedValue {
            attribute: "private".to_owned(),
            kind: other.kind(),
        }),
    }
}
