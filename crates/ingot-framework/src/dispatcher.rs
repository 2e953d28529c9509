//! Event dispatcher and handler registration table.
//!
//! The [`Dispatcher`] owns, per [`EventCategory`], the ordered list of
//! registered handlers. Each handler is a [`Stack`] of middleware plus a
//! terminal action. When an event is dispatched:
//!
//! 1. The category's handler list is snapshotted under a read lock.
//! 2. Handlers run in registration order, each against a fresh
//!    [`DispatchContext`] — one handler's short-circuit never affects
//!    another.
//! 3. The number of chains that ran to completion is returned.
//!
//! Registration appends only; nothing is ever removed. The table is
//! read-mostly: registration normally completes before the receive loop
//! starts, but interleaving the two is safe because dispatch works from a
//! snapshot.
//!
//! A panicking unit or terminal propagates out of
//! [`dispatch`](Dispatcher::dispatch) to the caller; the remaining units
//! and terminal of that chain do not run, and the table itself stays
//! consistent.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{Level, debug, span};

use ingot_core::{BoxedEvent, EventCategory};

use crate::context::DispatchContext;
use crate::error::StockResult;
use crate::middleware::Terminal;
use crate::stack::Stack;
use crate::stock::{Attributes, StockRegistry};

/// One registered handler: a middleware chain plus its terminal action.
struct Handler {
    stack: Stack,
    terminal: Terminal,
}

/// The registration table and dispatch loop.
///
/// Construct one per client and share it by reference; there is no
/// process-global instance.
///
/// # Example
///
/// ```rust,ignore
/// let dispatcher = Dispatcher::new();
///
/// dispatcher.register(
///     EventCategory::Message,
///     Stack::new().with(Prefix("!")),
///     |event, _ctx| println!("command: {}", event.event_name()),
/// );
///
/// dispatcher.dispatch(EventCategory::Message, &event);
/// ```
pub struct Dispatcher {
    handlers: RwLock<HashMap<EventCategory, Vec<Arc<Handler>>>>,
    stock: StockRegistry,
}

impl Dispatcher {
    /// Creates a dispatcher with the stock attribute factories installed.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            stock: StockRegistry::with_defaults(),
        }
    }

    /// Returns the attribute-factory registry, e.g. to register custom
    /// attributes.
    pub fn stock(&self) -> &StockRegistry {
        &self.stock
    }

    /// Registers a handler for `category`.
    ///
    /// Handlers accumulate: earlier registrations are never replaced and
    /// run first.
    pub fn register<F>(&self, category: EventCategory, stack: Stack, terminal: F)
    where
        F: Fn(&BoxedEvent, &mut DispatchContext) + Send + Sync + 'static,
    {
        debug!(%category, chain_len = stack.len(), "registered handler");
        self.handlers
            .write()
            .entry(category)
            .or_default()
            .push(Arc::new(Handler {
                stack,
                terminal: Box::new(terminal),
            }));
    }

    /// Registers a handler whose chain starts with compiled attribute
    /// filters.
    ///
    /// The attribute map is compiled through the stock registry and the
    /// resulting units run *before* the caller's own middleware. An
    /// unknown attribute or unsupported value type rejects the whole
    /// registration and leaves the table untouched.
    pub fn register_with<F>(
        &self,
        category: EventCategory,
        attributes: &Attributes,
        stack: Stack,
        terminal: F,
    ) -> StockResult<()>
    where
        F: Fn(&BoxedEvent, &mut DispatchContext) + Send + Sync + 'static,
    {
        let compiled = self.stock.compile(category, attributes)?;
        self.register(category, stack.with_prefix(compiled), terminal);
        Ok(())
    }

    /// Number of handlers registered for `category`.
    pub fn handler_count(&self, category: EventCategory) -> usize {
        self.handlers
            .read()
            .get(&category)
            .map_or(0, |handlers| handlers.len())
    }

    /// Dispatches `event` to every handler registered for `category`.
    ///
    /// Handlers run serially in registration order, each with a fresh
    /// context. Returns the number of chains whose terminal was invoked.
    pub fn dispatch(&self, category: EventCategory, event: &BoxedEvent) -> usize {
        let span = span!(Level::DEBUG, "dispatch", %category, event_name = %event.event_name());
        let _enter = span.enter();

        let handlers: Vec<Arc<Handler>> = self
            .handlers
            .read()
            .get(&category)
            .cloned()
            .unwrap_or_default();

        let mut completed = 0;
        for handler in &handlers {
            let mut ctx = DispatchContext::new();
            if handler.stack.run(event, &mut ctx, &handler.terminal) {
                completed += 1;
            }
        }

        debug!(
            handlers = handlers.len(),
            completed, "dispatch finished"
        );
        completed
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.read();
        let total: usize = handlers.values().map(Vec::len).sum();
        f.debug_struct("Dispatcher")
            .field("categories", &handlers.len())
            .field("handlers", &total)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ingot_core::{BoxedEvent, EventCategory, RawEvent};

    use super::*;
    use crate::middleware::from_fn;

    fn test_event(category: EventCategory) -> BoxedEvent {
        BoxedEvent::new(RawEvent::new(category, serde_json::json!({})))
    }

    #[test]
    fn dispatch_without_handlers_completes_nothing() {
        let dispatcher = Dispatcher::new();
        let ran = dispatcher.dispatch(EventCategory::Message, &test_event(EventCategory::Message));
        assert_eq!(ran, 0);
    }

    #[test]
    fn dispatch_runs_every_registration_in_order() {
        let dispatcher = Dispatcher::new();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order_in = Arc::clone(&order);
            dispatcher.register(EventCategory::Message, Stack::new(), move |_event, _ctx| {
                order_in.lock().unwrap().push(tag);
            });
        }

        let ran = dispatcher.dispatch(EventCategory::Message, &test_event(EventCategory::Message));
        assert_eq!(ran, 3);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn short_circuit_in_one_chain_leaves_others_alone() {
        let dispatcher = Dispatcher::new();
        let calls = Arc::new(AtomicUsize::new(0));

        dispatcher.register(
            EventCategory::Message,
            Stack::new().with(from_fn(|_event, _ctx, _next| {
                // never proceeds
            })),
            |_event, _ctx| unreachable!("short-circuited chain reached terminal"),
        );

        let calls_in = Arc::clone(&calls);
        dispatcher.register(EventCategory::Message, Stack::new(), move |_event, _ctx| {
            calls_in.fetch_add(1, Ordering::SeqCst);
        });

        let ran = dispatcher.dispatch(EventCategory::Message, &test_event(EventCategory::Message));
        assert_eq!(ran, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn contexts_are_not_shared_across_registrations() {
        let dispatcher = Dispatcher::new();

        dispatcher.register(
            EventCategory::Message,
            Stack::new().with(from_fn(|_event, ctx, next| {
                ctx.set_state(1u32);
                next.proceed(ctx);
            })),
            |_event, ctx| assert_eq!(ctx.state::<u32>(), Some(&1)),
        );

        dispatcher.register(EventCategory::Message, Stack::new(), |_event, ctx| {
            assert!(ctx.state::<u32>().is_none(), "context leaked between chains");
        });

        let ran = dispatcher.dispatch(EventCategory::Message, &test_event(EventCategory::Message));
        assert_eq!(ran, 2);
    }

    #[test]
    fn categories_are_routed_independently() {
        let dispatcher = Dispatcher::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_in = Arc::clone(&calls);
        dispatcher.register(EventCategory::Typing, Stack::new(), move |_event, _ctx| {
            calls_in.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.dispatch(EventCategory::Message, &test_event(EventCategory::Message));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        dispatcher.dispatch(EventCategory::Typing, &test_event(EventCategory::Typing));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn same_event_can_dispatch_to_multiple_categories() {
        let dispatcher = Dispatcher::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for category in [EventCategory::Message, EventCategory::Raw] {
            let calls_in = Arc::clone(&calls);
            dispatcher.register(category, Stack::new(), move |_event, _ctx| {
                calls_in.fetch_add(1, Ordering::SeqCst);
            });
        }

        let event = test_event(EventCategory::Message);
        dispatcher.dispatch(EventCategory::Message, &event);
        dispatcher.dispatch(EventCategory::Raw, &event);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn registration_during_dispatch_affects_only_later_events() {
        let dispatcher = Arc::new(Dispatcher::new());
        let late_calls = Arc::new(AtomicUsize::new(0));

        // The first handler's terminal registers another handler for the
        // same category. Dispatch works from a snapshot, so the new
        // handler must only see subsequent events.
        let dispatcher_in = Arc::clone(&dispatcher);
        let late_calls_in = Arc::clone(&late_calls);
        dispatcher.register(EventCategory::Message, Stack::new(), move |_event, _ctx| {
            let late_calls_for_new = Arc::clone(&late_calls_in);
            dispatcher_in.register(EventCategory::Message, Stack::new(), move |_event, _ctx| {
                late_calls_for_new.fetch_add(1, Ordering::SeqCst);
            });
        });

        let event = test_event(EventCategory::Message);
        assert_eq!(dispatcher.dispatch(EventCategory::Message, &event), 1);
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);

        assert_eq!(dispatcher.dispatch(EventCategory::Message, &event), 2);
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_terminal_propagates_and_dispatcher_survives() {
        let dispatcher = Dispatcher::new();
        dispatcher.register(EventCategory::Message, Stack::new(), |_event, _ctx| {
            panic!("handler fault");
        });

        let event = test_event(EventCategory::Message);
        let fault = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            dispatcher.dispatch(EventCategory::Message, &event);
        }));
        assert!(fault.is_err());

        // The table is still consistent and usable.
        assert_eq!(dispatcher.handler_count(EventCategory::Message), 1);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in = Arc::clone(&calls);
        dispatcher.register(EventCategory::Typing, Stack::new(), move |_event, _ctx| {
            calls_in.fetch_add(1, Ordering::SeqCst);
        });
        dispatcher.dispatch(EventCategory::Typing, &test_event(EventCategory::Typing));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
