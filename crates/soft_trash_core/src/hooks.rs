//! Lifecycle hooks around trash and restore transitions.
//!
//! # Responsibility
//! - Define the extension points invoked before/after each transition.
//! - Provide a named callback registry for callers that compose many hooks.
//!
//! # Invariants
//! - `before_*` hooks run before any attribute mutation.
//! - The first `HookOutcome::Abort` cancels the enclosing transition.
//! - `after_*` hooks only run once persistence succeeded.

use log::debug;
use std::fmt::{Debug, Formatter};

/// Result of a `before_*` hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    Continue,
    Abort,
}

impl HookOutcome {
    pub fn is_abort(self) -> bool {
        matches!(self, Self::Abort)
    }
}

/// Named lifecycle extension points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    BeforeTrash,
    AfterTrash,
    BeforeRestore,
    AfterRestore,
}

impl HookEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeforeTrash => "before_trash",
            Self::AfterTrash => "after_trash",
            Self::BeforeRestore => "before_restore",
            Self::AfterRestore => "after_restore",
        }
    }
}

/// Hook dispatch contract consumed by the transition functions.
///
/// Every method has a pass-through default, so implementors only override
/// the events they care about.
pub trait TrashHooks<R> {
    fn before_trash(&self, _record: &R) -> HookOutcome {
        HookOutcome::Continue
    }

    fn after_trash(&self, _record: &R) {}

    fn before_restore(&self, _record: &R) -> HookOutcome {
        HookOutcome::Continue
    }

    fn after_restore(&self, _record: &R) {}
}

/// Hook set that never aborts and has no side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl<R> TrashHooks<R> for NoHooks {}

impl<R, H: TrashHooks<R> + ?Sized> TrashHooks<R> for &H {
    fn before_trash(&self, record: &R) -> HookOutcome {
        (**self).before_trash(record)
    }

    fn after_trash(&self, record: &R) {
        (**self).after_trash(record)
    }

    fn before_restore(&self, record: &R) -> HookOutcome {
        (**self).before_restore(record)
    }

    fn after_restore(&self, record: &R) {
        (**self).after_restore(record)
    }
}

type GuardFn<R> = Box<dyn Fn(&R) -> HookOutcome>;
type NotifyFn<R> = Box<dyn Fn(&R)>;

struct Named<F> {
    name: String,
    callback: F,
}

/// Ordered, named callback chains for each `HookEvent`.
pub struct HookRegistry<R> {
    before_trash: Vec<Named<GuardFn<R>>>,
    after_trash: Vec<Named<NotifyFn<R>>>,
    before_restore: Vec<Named<GuardFn<R>>>,
    after_restore: Vec<Named<NotifyFn<R>>>,
}

impl<R> Default for HookRegistry<R> {
    fn default() -> Self {
        Self {
            before_trash: Vec::new(),
            after_trash: Vec::new(),
            before_restore: Vec::new(),
            after_restore: Vec::new(),
        }
    }
}

impl<R> Debug for HookRegistry<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("before_trash", &self.names(HookEvent::BeforeTrash))
            .field("after_trash", &self.names(HookEvent::AfterTrash))
            .field("before_restore", &self.names(HookEvent::BeforeRestore))
            .field("after_restore", &self.names(HookEvent::AfterRestore))
            .finish()
    }
}

impl<R> HookRegistry<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_before_trash(
        &mut self,
        name: impl Into<String>,
        callback: impl Fn(&R) -> HookOutcome + 'static,
    ) -> &mut Self {
        self.before_trash.push(Named {
            name: name.into(),
            callback: Box::new(callback),
        });
        self
    }

    pub fn add_after_trash(
        &mut self,
        name: impl Into<String>,
        callback: impl Fn(&R) + 'static,
    ) -> &mut Self {
        self.after_trash.push(Named {
            name: name.into(),
            callback: Box::new(callback),
        });
        self
    }

    pub fn add_before_restore(
        &mut self,
        name: impl Into<String>,
        callback: impl Fn(&R) -> HookOutcome + 'static,
    ) -> &mut Self {
        self.before_restore.push(Named {
            name: name.into(),
            callback: Box::new(callback),
        });
        self
    }

    pub fn add_after_restore(
        &mut self,
        name: impl Into<String>,
        callback: impl Fn(&R) + 'static,
    ) -> &mut Self {
        self.after_restore.push(Named {
            name: name.into(),
            callback: Box::new(callback),
        });
        self
    }

    /// Callback names registered for `event`, in execution order.
    pub fn names(&self, event: HookEvent) -> Vec<&str> {
        match event {
            HookEvent::BeforeTrash => self.before_trash.iter().map(|h| h.name.as_str()).collect(),
            HookEvent::AfterTrash => self.after_trash.iter().map(|h| h.name.as_str()).collect(),
            HookEvent::BeforeRestore => {
                self.before_restore.iter().map(|h| h.name.as_str()).collect()
            }
            HookEvent::AfterRestore => {
                self.after_restore.iter().map(|h| h.name.as_str()).collect()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.before_trash.len()
            + self.after_trash.len()
            + self.before_restore.len()
            + self.after_restore.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn run_guards<R>(event: HookEvent, chain: &[Named<GuardFn<R>>], record: &R) -> HookOutcome {
    for hook in chain {
        if (hook.callback)(record).is_abort() {
            debug!(
                "event=hook_abort module=hooks status=aborted hook={} name={}",
                event.as_str(),
                hook.name
            );
            return HookOutcome::Abort;
        }
    }
    HookOutcome::Continue
}

impl<R> TrashHooks<R> for HookRegistry<R> {
    fn before_trash(&self, record: &R) -> HookOutcome {
        run_guards(HookEvent::BeforeTrash, &self.before_trash, record)
    }

    fn after_trash(&self, record: &R) {
        for hook in &self.after_trash {
            (hook.callback)(record);
        }
    }

    fn before_restore(&self, record: &R) -> HookOutcome {
        run_guards(HookEvent::BeforeRestore, &self.before_restore, record)
    }

    fn after_restore(&self, record: &R) {
        for hook in &self.after_restore {
            (hook.callback)(record);
        }
    }
}
