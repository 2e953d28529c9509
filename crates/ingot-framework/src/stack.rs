//! Ordered middleware chains.
//!
//! A [`Stack`] owns the units of one registered handler in registration
//! order. Running it threads one [`DispatchContext`] through the units by
//! recursion: each unit receives a [`Next`] for the remainder of the
//! chain, so recursion depth equals chain length and no unit can run
//! twice in one attempt.

use tracing::{debug, trace};

use ingot_core::BoxedEvent;

use crate::context::DispatchContext;
use crate::middleware::{BoxedMiddleware, Middleware, Next, Terminal};

/// An ordered, immutable-after-construction chain of middleware units.
///
/// # Example
///
/// ```rust,ignore
/// let stack = Stack::new()
///     .with(Prefix("!"))
///     .with(from_fn(|_e, ctx, next| {
///         ctx.set_state(7u32);
///         next.proceed(ctx);
///     }));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Stack {
    units: Vec<BoxedMiddleware>,
}

impl Stack {
    /// Creates an empty chain.
    ///
    /// An empty chain always proceeds straight to the terminal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a unit (builder form).
    pub fn with<M: Middleware>(mut self, middleware: M) -> Self {
        self.push(middleware);
        self
    }

    /// Appends a unit.
    pub fn push<M: Middleware>(&mut self, middleware: M) {
        self.units.push(BoxedMiddleware::new(middleware));
    }

    /// Appends an already-erased unit.
    pub fn push_boxed(&mut self, unit: BoxedMiddleware) {
        self.units.push(unit);
    }

    /// Returns this chain with `prefix` units inserted ahead of the
    /// existing ones.
    pub(crate) fn with_prefix(self, prefix: Vec<BoxedMiddleware>) -> Self {
        let mut units = prefix;
        units.extend(self.units);
        Self { units }
    }

    /// Number of units in the chain.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the chain has no units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Runs the chain against `event`.
    ///
    /// Units are invoked strictly in registration order; each is recorded
    /// into `ctx` under its concrete type before it runs. The first unit
    /// that does not proceed stops the chain. Returns `true` when every
    /// unit proceeded and the terminal was invoked.
    pub fn run(&self, event: &BoxedEvent, ctx: &mut DispatchContext, terminal: &Terminal) -> bool {
        ctx.reset_completed();
        run_slice(&self.units, event, ctx, terminal);

        if !ctx.completed() {
            debug!(
                chain_len = self.units.len(),
                reached = ctx.ran_count(),
                "middleware chain stopped before terminal"
            );
        }
        ctx.completed()
    }
}

/// Recursive step shared by [`Stack::run`] and [`Next::proceed`].
pub(crate) fn run_slice(
    units: &[BoxedMiddleware],
    event: &BoxedEvent,
    ctx: &mut DispatchContext,
    terminal: &Terminal,
) {
    match units.split_first() {
        Some((unit, rest)) => {
            ctx.record(unit.id(), unit.instance());
            trace!(middleware = unit.type_name(), "running middleware unit");
            unit.call(
                event,
                ctx,
                Next {
                    rest,
                    event,
                    terminal,
                },
            );
        }
        None => {
            ctx.mark_completed();
            terminal(event, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ingot_core::{BoxedEvent, EventCategory, RawEvent};

    use super::*;
    use crate::middleware::from_fn;

    fn test_event() -> BoxedEvent {
        BoxedEvent::new(RawEvent::new(
            EventCategory::Message,
            serde_json::json!({}),
        ))
    }

    fn noop_terminal() -> Terminal {
        Box::new(|_event, _ctx| {})
    }

    /// Unit that proceeds and appends its tag to an order log in state.
    struct Tagging {
        tag: &'static str,
    }

    impl Middleware for Tagging {
        fn call(&self, _event: &BoxedEvent, ctx: &mut DispatchContext, next: Next<'_>) {
            match ctx.state_mut::<Vec<&'static str>>() {
                Some(log) => log.push(self.tag),
                None => ctx.set_state(vec![self.tag]),
            }
            next.proceed(ctx);
        }
    }

    /// Unit that never proceeds.
    struct Blocker;

    impl Middleware for Blocker {
        fn call(&self, _event: &BoxedEvent, _ctx: &mut DispatchContext, _next: Next<'_>) {}
    }

    #[test]
    fn empty_chain_invokes_terminal() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in = Arc::clone(&calls);
        let terminal: Terminal = Box::new(move |_event, _ctx| {
            calls_in.fetch_add(1, Ordering::SeqCst);
        });

        let mut ctx = DispatchContext::new();
        let completed = Stack::new().run(&test_event(), &mut ctx, &terminal);

        assert!(completed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn all_units_run_in_order_then_terminal() {
        let stack = Stack::new()
            .with(Tagging { tag: "a" })
            .with(from_fn(|_event, ctx, next| {
                ctx.state_mut::<Vec<&'static str>>()
                    .expect("upstream log")
                    .push("b");
                next.proceed(ctx);
            }));

        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let order_in = Arc::clone(&order);
        let terminal: Terminal = Box::new(move |_event, ctx| {
            let mut log = ctx.take_state::<Vec<&'static str>>().expect("log");
            log.push("terminal");
            *order_in.lock().unwrap() = log;
        });

        let mut ctx = DispatchContext::new();
        let completed = stack.run(&test_event(), &mut ctx, &terminal);

        assert!(completed);
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "terminal"]);
    }

    #[test]
    fn first_silent_unit_stops_the_chain() {
        let stack = Stack::new()
            .with(Tagging { tag: "a" })
            .with(Blocker)
            .with(Tagging { tag: "never" });

        let terminal_ran = Arc::new(AtomicUsize::new(0));
        let terminal_ran_in = Arc::clone(&terminal_ran);
        let terminal: Terminal = Box::new(move |_event, _ctx| {
            terminal_ran_in.fetch_add(1, Ordering::SeqCst);
        });

        let mut ctx = DispatchContext::new();
        let completed = stack.run(&test_event(), &mut ctx, &terminal);

        assert!(!completed);
        assert_eq!(terminal_ran.load(Ordering::SeqCst), 0);
        // Units before and including the blocker were reached, later ones not.
        assert_eq!(ctx.state::<Vec<&'static str>>(), Some(&vec!["a"]));
        assert!(ctx.has_run::<Tagging>());
        assert!(ctx.has_run::<Blocker>());
        assert_eq!(ctx.ran_count(), 2);
    }

    #[test]
    fn units_are_recorded_before_they_run() {
        struct SelfCheck;

        impl Middleware for SelfCheck {
            fn call(&self, _event: &BoxedEvent, ctx: &mut DispatchContext, next: Next<'_>) {
                assert!(ctx.has_run::<SelfCheck>());
                next.proceed(ctx);
            }
        }

        let mut ctx = DispatchContext::new();
        let completed =
            Stack::new()
                .with(SelfCheck)
                .run(&test_event(), &mut ctx, &noop_terminal());
        assert!(completed);
    }

    #[test]
    fn downstream_introspects_upstream_instance() {
        struct Dice {
            sides: u32,
        }

        impl Middleware for Dice {
            fn call(&self, _event: &BoxedEvent, ctx: &mut DispatchContext, next: Next<'_>) {
                next.proceed(ctx);
            }
        }

        let stack = Stack::new()
            .with(Dice { sides: 20 })
            .with(from_fn(|_event, ctx, next| {
                let dice = ctx.middleware::<Dice>().expect("upstream dice");
                ctx.set_state(dice.sides);
                next.proceed(ctx);
            }));

        let mut ctx = DispatchContext::new();
        assert!(stack.run(&test_event(), &mut ctx, &noop_terminal()));
        assert_eq!(ctx.state::<u32>(), Some(&20));
    }

    #[test]
    fn each_unit_runs_at_most_once_per_attempt() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let invocations_in = Arc::clone(&invocations);

        let stack = Stack::new().with(from_fn(move |_event, ctx, next| {
            invocations_in.fetch_add(1, Ordering::SeqCst);
            next.proceed(ctx);
        }));

        let mut ctx = DispatchContext::new();
        stack.run(&test_event(), &mut ctx, &noop_terminal());
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
    }
}
