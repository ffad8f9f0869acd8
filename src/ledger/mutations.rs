use metrics::counter;
use tracing::{debug, info};

use crate::changelog::{Command, Snapshot};
use crate::index::IntervalIndex;
use crate::model::{Booking, BookingPatch, BookingStatus, Resource, ResourcePatch, Span};
use crate::observability;

use super::conflict::{now_ms, validate_span};
use super::{ConflictLedger, LedgerError};

impl ConflictLedger {
    // ── Resources ────────────────────────────────────────────

    pub fn add_resource(&mut self, resource: Resource) -> Result<(), LedgerError> {
        if self.resources.contains_key(&resource.id) {
            return Err(LedgerError::DuplicateId(resource.id));
        }
        debug!(resource = %resource.id, name = %resource.name, "adding resource");
        self.intervals.insert(resource.id.clone(), IntervalIndex::new());
        self.resources.insert(resource.id.clone(), resource.clone());
        self.changelog.record(Command::Create {
            description: format!("add resource {}", resource.id),
            after: Snapshot::Resource(resource),
        });
        counter!(observability::RESOURCES_ADDED_TOTAL).increment(1);
        Ok(())
    }

    pub fn update_resource(&mut self, id: &str, patch: ResourcePatch) -> Result<Resource, LedgerError> {
        let old = self
            .resources
            .get(&id.to_string())
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;

        let mut next = old.clone();
        if let Some(name) = patch.name {
            next.name = name;
        }
        if let Some(capacity) = patch.capacity {
            next.capacity = capacity;
        }
        if let Some(kind) = patch.kind {
            next.kind = kind;
        }
        if let Some(floor) = patch.floor {
            next.floor = floor;
        }
        if let Some(amenities) = patch.amenities {
            next.amenities = amenities;
        }
        if let Some(rate) = patch.hourly_rate_cents {
            next.hourly_rate_cents = rate;
        }
        if let Some(active) = patch.active {
            // Deactivation blocks new bookings; existing ones keep their slots.
            next.active = active;
        }

        self.resources.insert(next.id.clone(), next.clone());
        self.changelog.record(Command::Update {
            description: format!("update resource {id}"),
            before: Snapshot::Resource(old),
            after: Snapshot::Resource(next.clone()),
        });
        Ok(next)
    }

    /// Remove a resource with no occupying bookings. Cancelled and completed
    /// bookings that reference it stay in the history catalog.
    pub fn remove_resource(&mut self, id: &str) -> Result<Resource, LedgerError> {
        if !self.resources.contains_key(&id.to_string()) {
            return Err(LedgerError::NotFound(id.to_string()));
        }
        if self.interval_index(id).is_some_and(|idx| !idx.is_empty()) {
            return Err(LedgerError::ResourceInUse(id.to_string()));
        }
        self.intervals.remove(id);
        let resource = self
            .resources
            .remove(&id.to_string())
            .expect("checked resource exists");
        info!(resource = %id, "removed resource");
        self.changelog.record(Command::Delete {
            description: format!("remove resource {id}"),
            before: Snapshot::Resource(resource.clone()),
        });
        counter!(observability::RESOURCES_REMOVED_TOTAL).increment(1);
        Ok(resource)
    }

    // ── Bookings ─────────────────────────────────────────────

    /// Book a span. All checks run before anything is written, so a failed
    /// call changes nothing; a conflict hands back the blocking bookings.
    pub fn create_booking(&mut self, booking: Booking) -> Result<Booking, LedgerError> {
        if self.bookings.contains_key(&booking.id) {
            return Err(LedgerError::DuplicateId(booking.id));
        }
        validate_span(booking.span)?;
        let resource = self
            .resources
            .get(&booking.resource_id)
            .ok_or_else(|| LedgerError::NotFound(booking.resource_id.clone()))?;
        if !resource.active {
            return Err(LedgerError::ResourceInactive(resource.id.clone()));
        }
        if booking.attendees > resource.capacity {
            return Err(LedgerError::CapacityExceeded {
                attendees: booking.attendees,
                capacity: resource.capacity,
            });
        }
        let conflicts = self.check_conflicts(&booking.resource_id, booking.span, None)?;
        if !conflicts.is_empty() {
            counter!(observability::BOOKING_CONFLICTS_TOTAL).increment(1);
            debug!(
                booking = %booking.id,
                resource = %booking.resource_id,
                blocked_by = conflicts.len(),
                "booking rejected on conflict"
            );
            return Err(LedgerError::Conflict(conflicts));
        }

        let mut booking = booking;
        let now = now_ms();
        if booking.created_at == 0 {
            booking.created_at = now;
        }
        booking.updated_at = now;

        if booking.is_active() {
            self.insert_interval_for(&booking);
        }
        self.bookings.insert(booking.id.clone(), booking.clone());
        info!(booking = %booking.id, resource = %booking.resource_id, "created booking");
        self.changelog.record(Command::Create {
            description: format!("create booking {}", booking.id),
            after: Snapshot::Booking(booking.clone()),
        });
        counter!(observability::BOOKINGS_CREATED_TOTAL).increment(1);
        Ok(booking)
    }

    /// Apply a partial update. Placement changes (time or resource) re-run
    /// the full conflict check with the booking's own interval pulled out
    /// first; any failure puts the original interval back untouched.
    /// Closed bookings are history: they accept metadata patches only.
    pub fn update_booking(&mut self, id: &str, patch: BookingPatch) -> Result<Booking, LedgerError> {
        let old = self
            .bookings
            .get(&id.to_string())
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;

        let touches_placement = patch.touches_placement();
        if touches_placement && !old.is_active() {
            return Err(LedgerError::AlreadyCancelled(id.to_string()));
        }
        let mut next = old.clone();
        if let Some(resource_id) = patch.resource_id {
            next.resource_id = resource_id;
        }
        let start = patch.start.unwrap_or(old.span.start);
        let end = patch.end.unwrap_or(old.span.end);
        if start >= end {
            return Err(LedgerError::InvalidInterval(Span { start, end }));
        }
        next.span = Span::new(start, end);
        if let Some(priority) = patch.priority {
            next.priority = priority;
        }
        if let Some(title) = patch.title {
            next.title = title;
        }
        if let Some(requester) = patch.requester {
            next.requester = requester;
        }
        if let Some(attendees) = patch.attendees {
            next.attendees = attendees;
        }
        next.updated_at = now_ms();

        if touches_placement {
            self.remove_interval_for(&old);
            if let Err(e) = self.validate_placement(&next, Some(id)) {
                self.insert_interval_for(&old);
                if matches!(e, LedgerError::Conflict(_)) {
                    counter!(observability::BOOKING_CONFLICTS_TOTAL).increment(1);
                }
                return Err(e);
            }
            self.insert_interval_for(&next);
        } else if let Some(resource) = self.resources.get(&next.resource_id)
            && next.attendees > resource.capacity
        {
            return Err(LedgerError::CapacityExceeded {
                attendees: next.attendees,
                capacity: resource.capacity,
            });
        }

        self.bookings.insert(next.id.clone(), next.clone());
        debug!(booking = %id, moved = touches_placement, "updated booking");
        self.changelog.record(Command::Update {
            description: format!("update booking {id}"),
            before: Snapshot::Booking(old),
            after: Snapshot::Booking(next.clone()),
        });
        Ok(next)
    }

    /// Destination checks for a placement change. The caller has already
    /// pulled the booking's own interval, so `exclude` only guards the
    /// same-span re-insert case.
    fn validate_placement(&self, booking: &Booking, exclude: Option<&str>) -> Result<(), LedgerError> {
        let resource = self
            .resources
            .get(&booking.resource_id)
            .ok_or_else(|| LedgerError::NotFound(booking.resource_id.clone()))?;
        if !resource.active {
            return Err(LedgerError::ResourceInactive(resource.id.clone()));
        }
        if booking.attendees > resource.capacity {
            return Err(LedgerError::CapacityExceeded {
                attendees: booking.attendees,
                capacity: resource.capacity,
            });
        }
        let conflicts = self.check_conflicts(&booking.resource_id, booking.span, exclude)?;
        if !conflicts.is_empty() {
            return Err(LedgerError::Conflict(conflicts));
        }
        Ok(())
    }

    /// Cancel an active booking, free its span, and notify the waiting-list
    /// observer.
    pub fn cancel_booking(&mut self, id: &str, reason: impl Into<String>) -> Result<Booking, LedgerError> {
        let old = self
            .bookings
            .get(&id.to_string())
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        if !old.is_active() {
            return Err(LedgerError::AlreadyCancelled(id.to_string()));
        }

        let mut next = old.clone();
        next.status = BookingStatus::Cancelled;
        next.cancel_reason = Some(reason.into());
        next.updated_at = now_ms();

        self.remove_interval_for(&old);
        self.bookings.insert(next.id.clone(), next.clone());
        info!(booking = %id, resource = %next.resource_id, "cancelled booking");
        self.changelog.record(Command::Update {
            description: format!("cancel booking {id}"),
            before: Snapshot::Booking(old),
            after: Snapshot::Booking(next.clone()),
        });
        counter!(observability::BOOKINGS_CANCELLED_TOTAL).increment(1);

        let resource_id = next.resource_id.clone();
        self.observer.on_resource_available(&resource_id);
        Ok(next)
    }

    /// Mark an active booking completed and free its span. No observer
    /// notification: completion happens after the span has elapsed.
    pub fn complete_booking(&mut self, id: &str) -> Result<Booking, LedgerError> {
        let old = self
            .bookings
            .get(&id.to_string())
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        if !old.is_active() {
            return Err(LedgerError::AlreadyCancelled(id.to_string()));
        }

        let mut next = old.clone();
        next.status = BookingStatus::Completed;
        next.updated_at = now_ms();

        self.remove_interval_for(&old);
        self.bookings.insert(next.id.clone(), next.clone());
        self.changelog.record(Command::Update {
            description: format!("complete booking {id}"),
            before: Snapshot::Booking(old),
            after: Snapshot::Booking(next.clone()),
        });
        Ok(next)
    }

    /// Drop a booking from the catalogs entirely. Undo restores it.
    pub fn delete_booking(&mut self, id: &str) -> Result<Booking, LedgerError> {
        let old = self
            .bookings
            .get(&id.to_string())
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        if old.is_active() {
            self.remove_interval_for(&old);
        }
        self.bookings.remove(&old.id);
        debug!(booking = %id, "deleted booking");
        self.changelog.record(Command::Delete {
            description: format!("delete booking {id}"),
            before: Snapshot::Booking(old.clone()),
        });
        Ok(old)
    }
}
