mod availability;
mod conflict;
mod error;
mod history;
mod mutations;
mod queries;

pub use error::LedgerError;

use std::collections::HashMap;

use crate::changelog::ChangeLog;
use crate::index::{BalancedIndex, IntervalIndex};
use crate::limits::MAX_HISTORY;
use crate::model::{Booking, BookingId, Resource, ResourceId};
use crate::notify::{AvailabilityObserver, NoopObserver};

/// The single mutation authority over resources and bookings.
///
/// Holds the two ordered catalogs, one interval index per resource, and the
/// undo/redo journal. Every successful mutation leaves the catalogs and the
/// interval indexes mutually consistent, and no failed call mutates
/// anything: conflict and validity checks run before either index is
/// touched, and the one two-step sequence (update's delete-then-reinsert)
/// restores the original interval before returning an error.
pub struct ConflictLedger {
    resources: BalancedIndex<ResourceId, Resource>,
    bookings: BalancedIndex<BookingId, Booking>,
    intervals: HashMap<ResourceId, IntervalIndex>,
    changelog: ChangeLog,
    observer: Box<dyn AvailabilityObserver>,
}

impl Default for ConflictLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ConflictLedger {
    pub fn new() -> Self {
        Self::with_observer(Box::new(NoopObserver))
    }

    /// Build a ledger with a waiting-list observer; it is notified after
    /// every successful cancellation.
    pub fn with_observer(observer: Box<dyn AvailabilityObserver>) -> Self {
        Self {
            resources: BalancedIndex::new(),
            bookings: BalancedIndex::new(),
            intervals: HashMap::new(),
            changelog: ChangeLog::new(MAX_HISTORY),
            observer,
        }
    }

    // ── Batch grouping ───────────────────────────────────────

    /// Start grouping subsequent mutations into one undo/redo unit.
    pub fn begin_batch(&mut self) {
        self.changelog.begin_batch();
    }

    /// Close the group; it undoes and redoes as a single step.
    pub fn end_batch(&mut self, description: impl Into<String>) {
        self.changelog.end_batch(description);
    }

    /// Discard an open batch's journal entries. Member mutations already
    /// applied stay applied; they just become un-undoable.
    pub fn cancel_batch(&mut self) {
        self.changelog.cancel_batch();
    }

    // ── Interval plumbing ────────────────────────────────────

    fn interval_index(&self, resource_id: &str) -> Option<&IntervalIndex> {
        self.intervals.get(resource_id)
    }

    fn interval_index_mut(&mut self, resource_id: &ResourceId) -> &mut IntervalIndex {
        self.intervals
            .get_mut(resource_id)
            .expect("interval index exists for cataloged resource")
    }

    /// Remove a booking's interval from its resource's index. The interval
    /// must be present — catalogs and indexes never drift apart.
    fn remove_interval_for(&mut self, booking: &Booking) {
        let removed = self.interval_index_mut(&booking.resource_id).remove(booking.span);
        debug_assert_eq!(removed.as_deref(), Some(booking.id.as_str()));
    }

    fn insert_interval_for(&mut self, booking: &Booking) {
        self.interval_index_mut(&booking.resource_id)
            .insert(booking.span, booking.id.clone());
    }

    // ── Bulk load (persistence collaborator) ─────────────────

    /// Restore a resource from persisted state. No journal entry.
    pub fn load_resource(&mut self, resource: Resource) -> Result<(), LedgerError> {
        if self.resources.contains_key(&resource.id) {
            return Err(LedgerError::DuplicateId(resource.id));
        }
        self.intervals.insert(resource.id.clone(), IntervalIndex::new());
        self.resources.insert(resource.id.clone(), resource);
        Ok(())
    }

    /// Restore a booking from persisted state: referential and uniqueness
    /// checks only. Historical data is trusted, so conflict validation is
    /// intentionally bypassed; cancelled/completed bookings are cataloged
    /// without an interval.
    pub fn load_booking(&mut self, booking: Booking) -> Result<(), LedgerError> {
        if !self.resources.contains_key(&booking.resource_id) {
            return Err(LedgerError::NotFound(booking.resource_id));
        }
        if self.bookings.contains_key(&booking.id) {
            return Err(LedgerError::DuplicateId(booking.id));
        }
        if booking.is_active() {
            self.insert_interval_for(&booking);
        }
        self.bookings.insert(booking.id.clone(), booking);
        Ok(())
    }
}
