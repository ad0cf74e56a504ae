//! Trash/restore lifecycle service.
//!
//! # Responsibility
//! - Run per-record trash and restore transitions with hook dispatch.
//! - Provide strict variants and bulk variants over caller collections.
//!
//! # Invariants
//! - A record already in the target state is never mutated or re-persisted.
//! - `before_*` aborts happen before any attribute mutation.
//! - On persistence failure the in-memory attribute is rolled back.
//! - Bulk operations only visit the collection members in the source scope
//!   (`active` for trash, `deleted` for restore).
//! - Bulk operations are per-record and non-transactional: committed records
//!   stay committed when a later record fails.

use crate::error::{RecordNotRestored, RecordNotTrashed, SoftTrashError, TransitionFailure};
use crate::hooks::{NoHooks, TrashHooks};
use crate::model::record::{HasTrashState, TrashedAt};
use crate::repo::trash_store::{StoreResult, TrashStore};
use crate::scope::TrashScope;
use log::{info, log, warn};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of trash timestamps.
pub trait Clock {
    fn now(&self) -> TrashedAt;
}

/// Wall clock in Unix epoch milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TrashedAt {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| TrashedAt::try_from(elapsed.as_millis()).unwrap_or(TrashedAt::MAX))
            .unwrap_or(0)
    }
}

impl<F: Fn() -> TrashedAt> Clock for F {
    fn now(&self) -> TrashedAt {
        self()
    }
}

/// Result of a bulk trash/restore pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome<R> {
    /// Visited records in collection order, carrying their post-operation state.
    pub records: Vec<R>,
    pub succeeded: usize,
    pub failed: usize,
}

impl<R> Default for BulkOutcome<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            succeeded: 0,
            failed: 0,
        }
    }
}

/// Entry of a bulk collection: a loaded record, or the error that kept a
/// row from loading. Load errors count as per-record failures.
pub trait BulkItem<R> {
    fn into_record(self) -> StoreResult<R>;
}

impl<R: HasTrashState> BulkItem<R> for R {
    fn into_record(self) -> StoreResult<R> {
        Ok(self)
    }
}

impl<R: HasTrashState> BulkItem<R> for StoreResult<R> {
    fn into_record(self) -> StoreResult<R> {
        self
    }
}

impl<R> BulkOutcome<R> {
    fn record(&mut self, record: R, ok: bool) {
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.records.push(record);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Trash,
    Restore,
}

impl Transition {
    fn event(self) -> &'static str {
        match self {
            Self::Trash => "record_trash",
            Self::Restore => "record_restore",
        }
    }

    fn bulk_event(self) -> &'static str {
        match self {
            Self::Trash => "bulk_trash",
            Self::Restore => "bulk_restore",
        }
    }

    /// Scope whose members this transition applies to.
    fn source_scope(self) -> TrashScope {
        match self {
            Self::Trash => TrashScope::Active,
            Self::Restore => TrashScope::Deleted,
        }
    }
}

/// Use-case service wrapping a trash store, hooks and a clock.
pub struct TrashService<S, H = NoHooks, C = SystemClock> {
    store: S,
    hooks: H,
    clock: C,
}

impl<S> TrashService<S> {
    /// Creates a service with no hooks and the system clock.
    pub fn new(store: S) -> Self {
        Self {
            store,
            hooks: NoHooks,
            clock: SystemClock,
        }
    }
}

impl<S, H, C> TrashService<S, H, C> {
    pub fn with_hooks<H2>(self, hooks: H2) -> TrashService<S, H2, C> {
        TrashService {
            store: self.store,
            hooks,
            clock: self.clock,
        }
    }

    pub fn with_clock<C2>(self, clock: C2) -> TrashService<S, H, C2> {
        TrashService {
            store: self.store,
            hooks: self.hooks,
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Soft-deletes `record`.
    ///
    /// # Contract
    /// - Returns `false` without side effects when already trashed.
    /// - Returns `false` when `before_trash` aborts or persistence fails.
    /// - Never returns an error.
    pub fn trash<R>(&self, record: &mut R) -> bool
    where
        R: HasTrashState,
        S: TrashStore<R>,
        H: TrashHooks<R>,
        C: Clock,
    {
        self.transition(Transition::Trash, record).is_ok()
    }

    /// Soft-deletes `record`, failing with `RecordNotTrashed` on any refusal.
    pub fn trash_strict<R>(&self, record: &mut R) -> Result<(), RecordNotTrashed<R>>
    where
        R: HasTrashState + Clone,
        S: TrashStore<R>,
        H: TrashHooks<R>,
        C: Clock,
    {
        self.transition(Transition::Trash, record)
            .map_err(|reason| RecordNotTrashed {
                record: record.clone(),
                reason,
            })
    }

    /// Clears the trash timestamp of `record`.
    ///
    /// # Contract
    /// - Returns `false` without side effects when already active.
    /// - Returns `false` when `before_restore` aborts or persistence fails.
    /// - Never returns an error.
    pub fn restore<R>(&self, record: &mut R) -> bool
    where
        R: HasTrashState,
        S: TrashStore<R>,
        H: TrashHooks<R>,
        C: Clock,
    {
        self.transition(Transition::Restore, record).is_ok()
    }

    /// Restores `record`, failing with `RecordNotRestored` on any refusal.
    pub fn restore_strict<R>(&self, record: &mut R) -> Result<(), RecordNotRestored<R>>
    where
        R: HasTrashState + Clone,
        S: TrashStore<R>,
        H: TrashHooks<R>,
        C: Clock,
    {
        self.transition(Transition::Restore, record)
            .map_err(|reason| RecordNotRestored {
                record: record.clone(),
                reason,
            })
    }

    /// Trashes the `active` members of `records`, one record at a time.
    ///
    /// Members already trashed are not visited. Individual failures,
    /// including entries that failed to load, are counted and never raised.
    pub fn trash_all<R, I>(&self, records: I) -> BulkOutcome<R>
    where
        R: HasTrashState,
        I: IntoIterator,
        I::Item: BulkItem<R>,
        S: TrashStore<R>,
        H: TrashHooks<R>,
        C: Clock,
    {
        self.bulk(Transition::Trash, records)
    }

    /// Trashes the active members of `records`, stopping at the first failure.
    ///
    /// Records processed before the failing one stay trashed.
    pub fn trash_all_strict<R, I>(&self, records: I) -> Result<BulkOutcome<R>, SoftTrashError<R>>
    where
        R: HasTrashState + Clone,
        I: IntoIterator,
        I::Item: BulkItem<R>,
        S: TrashStore<R>,
        H: TrashHooks<R>,
        C: Clock,
    {
        self.bulk_strict(Transition::Trash, records, |record, reason| {
            RecordNotTrashed { record, reason }.into()
        })
    }

    /// Restores the `deleted` members of `records`, one record at a time.
    pub fn restore_all<R, I>(&self, records: I) -> BulkOutcome<R>
    where
        R: HasTrashState,
        I: IntoIterator,
        I::Item: BulkItem<R>,
        S: TrashStore<R>,
        H: TrashHooks<R>,
        C: Clock,
    {
        self.bulk(Transition::Restore, records)
    }

    /// Restores the deleted members of `records`, stopping at the first failure.
    pub fn restore_all_strict<R, I>(
        &self,
        records: I,
    ) -> Result<BulkOutcome<R>, SoftTrashError<R>>
    where
        R: HasTrashState + Clone,
        I: IntoIterator,
        I::Item: BulkItem<R>,
        S: TrashStore<R>,
        H: TrashHooks<R>,
        C: Clock,
    {
        self.bulk_strict(Transition::Restore, records, |record, reason| {
            RecordNotRestored { record, reason }.into()
        })
    }

    fn transition<R>(
        &self,
        transition: Transition,
        record: &mut R,
    ) -> Result<(), TransitionFailure>
    where
        R: HasTrashState,
        S: TrashStore<R>,
        H: TrashHooks<R>,
        C: Clock,
    {
        let event = transition.event();
        let in_target_state = match transition {
            Transition::Trash => record.is_trashed(),
            Transition::Restore => record.is_active(),
        };
        if in_target_state {
            let failure = TransitionFailure::AlreadyInState;
            log!(
                failure.log_level(),
                "event={event} module=trash status=skipped reason=already_in_state key={}",
                record.record_key()
            );
            return Err(failure);
        }

        let guard = match transition {
            Transition::Trash => self.hooks.before_trash(record),
            Transition::Restore => self.hooks.before_restore(record),
        };
        if guard.is_abort() {
            let failure = TransitionFailure::HookAborted;
            log!(
                failure.log_level(),
                "event={event} module=trash status=aborted key={}",
                record.record_key()
            );
            return Err(failure);
        }

        let previous = record.trashed_at();
        let next = match transition {
            Transition::Trash => Some(self.clock.now()),
            Transition::Restore => None,
        };
        record.set_trashed_at(next);

        if let Err(err) = self.store.persist_trash_state(record) {
            record.set_trashed_at(previous);
            let failure = TransitionFailure::Persistence(err.to_string());
            log!(
                failure.log_level(),
                "event={event} module=trash status=error error_code=persist_failed key={} error={}",
                record.record_key(),
                err
            );
            return Err(failure);
        }

        match transition {
            Transition::Trash => self.hooks.after_trash(record),
            Transition::Restore => self.hooks.after_restore(record),
        }
        info!(
            "event={event} module=trash status=ok key={}",
            record.record_key()
        );
        Ok(())
    }

    fn bulk<R, I>(&self, transition: Transition, records: I) -> BulkOutcome<R>
    where
        R: HasTrashState,
        I: IntoIterator,
        I::Item: BulkItem<R>,
        S: TrashStore<R>,
        H: TrashHooks<R>,
        C: Clock,
    {
        let mut outcome = BulkOutcome::default();

        for item in records {
            let mut record = match item.into_record() {
                Ok(record) => record,
                Err(err) => {
                    warn!(
                        "event={} module=trash status=error error_code=load_failed error={}",
                        transition.bulk_event(),
                        err
                    );
                    outcome.failed += 1;
                    continue;
                }
            };
            if !transition.source_scope().matches(&record) {
                continue;
            }
            let ok = self.transition(transition, &mut record).is_ok();
            outcome.record(record, ok);
        }

        info!(
            "event={} module=trash status=ok strict=false succeeded={} failed={}",
            transition.bulk_event(),
            outcome.succeeded,
            outcome.failed
        );
        outcome
    }

    fn bulk_strict<R, I>(
        &self,
        transition: Transition,
        records: I,
        raise: impl Fn(R, TransitionFailure) -> SoftTrashError<R>,
    ) -> Result<BulkOutcome<R>, SoftTrashError<R>>
    where
        R: HasTrashState + Clone,
        I: IntoIterator,
        I::Item: BulkItem<R>,
        S: TrashStore<R>,
        H: TrashHooks<R>,
        C: Clock,
    {
        let mut outcome = BulkOutcome::default();

        for item in records {
            let mut record = match item.into_record() {
                Ok(record) => record,
                Err(err) => {
                    warn!(
                        "event={} module=trash status=error strict=true error_code=load_failed succeeded={} error={}",
                        transition.bulk_event(),
                        outcome.succeeded,
                        err
                    );
                    return Err(err.into());
                }
            };
            if !transition.source_scope().matches(&record) {
                continue;
            }
            if let Err(reason) = self.transition(transition, &mut record) {
                warn!(
                    "event={} module=trash status=error strict=true succeeded={} key={}",
                    transition.bulk_event(),
                    outcome.succeeded,
                    record.record_key()
                );
                return Err(raise(record, reason));
            }
            outcome.record(record, true);
        }

        info!(
            "event={} module=trash status=ok strict=true succeeded={}",
            transition.bulk_event(),
            outcome.succeeded
        );
        Ok(outcome)
    }
}
