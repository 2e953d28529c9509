//! The middleware capability and its type-erased form.
//!
//! A middleware unit is any type implementing [`Middleware`]: one `call`
//! that reads the event, may mutate the context, and decides whether the
//! rest of the chain runs by calling — or not calling —
//! [`Next::proceed`]. `Next` is consumed by value, so a unit can continue
//! the chain at most once per dispatch attempt; the compiler enforces it.

use std::any::{Any, TypeId};
use std::sync::Arc;

use ingot_core::BoxedEvent;

use crate::context::DispatchContext;
use crate::stack;

/// The terminal action of a handler chain, invoked only when every
/// middleware unit proceeded.
pub type Terminal = Box<dyn Fn(&BoxedEvent, &mut DispatchContext) + Send + Sync>;

/// A single composable step in a handler chain.
///
/// # Contract
///
/// - `call` may read the event and mutate the context.
/// - Calling `next.proceed(ctx)` runs the remaining units and, if all of
///   them proceed too, the terminal.
/// - Returning without calling `proceed` stops the chain; the remaining
///   units and the terminal never run.
///
/// # Example
///
/// ```rust,ignore
/// struct Prefix(&'static str);
///
/// impl Middleware for Prefix {
///     fn call(&self, event: &BoxedEvent, ctx: &mut DispatchContext, next: Next<'_>) {
///         match event.as_message() {
///             Some(msg) if msg.content().starts_with(self.0) => next.proceed(ctx),
///             _ => {}
///         }
///     }
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    /// Processes `event`, deciding whether the chain continues.
    fn call(&self, event: &BoxedEvent, ctx: &mut DispatchContext, next: Next<'_>);
}

/// Continuation handle for the rest of a chain.
///
/// Consumed by [`proceed`](Self::proceed); dropping it without calling
/// `proceed` short-circuits the chain.
pub struct Next<'a> {
    pub(crate) rest: &'a [BoxedMiddleware],
    pub(crate) event: &'a BoxedEvent,
    pub(crate) terminal: &'a Terminal,
}

impl Next<'_> {
    /// Runs the remaining units and, if they all proceed, the terminal.
    pub fn proceed(self, ctx: &mut DispatchContext) {
        stack::run_slice(self.rest, self.event, ctx, self.terminal);
    }

    /// Number of units remaining after the current one.
    pub fn remaining(&self) -> usize {
        self.rest.len()
    }
}

/// Adapts a closure into a [`Middleware`] unit.
///
/// Each closure has its own anonymous type, so closure-built units keep
/// distinct identities in the per-dispatch context.
///
/// # Example
///
/// ```rust,ignore
/// let tap = from_fn(|_event, ctx, next| {
///     ctx.set_state(Instant::now());
///     next.proceed(ctx);
/// });
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(&BoxedEvent, &mut DispatchContext, Next<'_>) + Send + Sync + 'static,
{
    FromFn(f)
}

/// Middleware built from a closure by [`from_fn`].
pub struct FromFn<F>(F);

impl<F> Middleware for FromFn<F>
where
    F: Fn(&BoxedEvent, &mut DispatchContext, Next<'_>) + Send + Sync + 'static,
{
    fn call(&self, event: &BoxedEvent, ctx: &mut DispatchContext, next: Next<'_>) {
        (self.0)(event, ctx, next)
    }
}

/// A type-erased middleware unit.
///
/// Pairs the dyn-dispatched callable with the concrete type's identity and
/// an `Any` handle to the instance, so the stack can both invoke the unit
/// and record it into the context for introspection.
#[derive(Clone)]
pub struct BoxedMiddleware {
    id: TypeId,
    type_name: &'static str,
    instance: Arc<dyn Any + Send + Sync>,
    unit: Arc<dyn Middleware>,
}

impl BoxedMiddleware {
    /// Erases a concrete middleware unit.
    pub fn new<M: Middleware>(middleware: M) -> Self {
        let instance: Arc<M> = Arc::new(middleware);
        Self {
            id: TypeId::of::<M>(),
            type_name: std::any::type_name::<M>(),
            unit: instance.clone(),
            instance,
        }
    }

    pub(crate) fn id(&self) -> TypeId {
        self.id
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn instance(&self) -> Arc<dyn Any + Send + Sync> {
        Arc::clone(&self.instance)
    }

    pub(crate) fn call(&self, event: &BoxedEvent, ctx: &mut DispatchContext, next: Next<'_>) {
        self.unit.call(event, ctx, next);
    }
}

impl std::fmt::Debug for BoxedMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxedMiddleware")
            .field("type_name", &self.type_name)
            .finish()
    }
}
