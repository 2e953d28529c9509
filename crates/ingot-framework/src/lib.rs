//! # Ingot Framework
//!
//! The event-matching pipeline of the Ingot chat-bot client library.
//!
//! Every inbound event is routed by category to the handlers registered
//! for it. A handler is an ordered chain of [`Middleware`] units plus a
//! terminal action; each unit decides, in registration order, whether the
//! chain proceeds:
//!
//! ```text
//! event ──▶ Dispatcher ──▶ Stack ──▶ unit 1 ──▶ unit 2 ──▶ terminal
//!                 │                     │
//!                 └─ one fresh          └─ no proceed: chain stops,
//!                    DispatchContext       terminal never runs
//!                    per registration
//! ```
//!
//! - [`Middleware`] — a single predicate/transform with a
//!   `call(event, ctx, next)` contract; calling `next.proceed(ctx)`
//!   continues the chain, returning without calling it short-circuits.
//! - [`Stack`] — an ordered, immutable chain of units.
//! - [`Dispatcher`] — the registration table plus the dispatch loop.
//! - [`stock`] — compiles declarative attribute maps (`content`,
//!   `start_with`, `in`, ...) into middleware units, with an extension
//!   point for new attributes.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ingot_core::EventCategory;
//! use ingot_framework::{Dispatcher, Stack, from_fn};
//! use ingot_framework::stock::Attributes;
//!
//! let dispatcher = Dispatcher::new();
//! dispatcher.register_with(
//!     EventCategory::Message,
//!     &Attributes::new().with("start_with", "!ping"),
//!     Stack::new().with(from_fn(|_event, ctx, next| {
//!         ctx.set_state(42u32);
//!         next.proceed(ctx);
//!     })),
//!     |_event, ctx| {
//!         assert_eq!(ctx.state::<u32>(), Some(&42));
//!     },
//! )?;
//!
//! dispatcher.dispatch(EventCategory::Message, &event);
//! ```

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod middleware;
pub mod stack;
pub mod stock;

pub use context::DispatchContext;
pub use dispatcher::Dispatcher;
pub use error::{StockError, StockResult};
pub use middleware::{BoxedMiddleware, Middleware, Next, Terminal, from_fn};
pub use stack::Stack;
pub use stock::{AttributeValue, Attributes, StockRegistry};

// Core types that appear in this crate's public API.
pub use ingot_core::{BoxedEvent, Event, EventCategory};
