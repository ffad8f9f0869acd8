use crate::model::{
    Booking, BookingStatus, DailyReport, HOUR_MS, LedgerStats, Ms, Resource, ResourceActivity,
    ResourceFilter, Span, StatusCounts, Utilization,
};

use super::conflict::validate_span;
use super::{ConflictLedger, LedgerError};

impl ConflictLedger {
    pub fn get_resource(&self, id: &str) -> Option<&Resource> {
        self.resources.get(&id.to_string())
    }

    pub fn get_booking(&self, id: &str) -> Option<&Booking> {
        self.bookings.get(&id.to_string())
    }

    /// All resources in id order. This is the save-path traversal.
    pub fn resources(&self) -> Vec<&Resource> {
        self.resources.iter().map(|(_, r)| r).collect()
    }

    /// All bookings in id order, cancelled and completed included.
    pub fn bookings(&self) -> Vec<&Booking> {
        self.bookings.iter().map(|(_, b)| b).collect()
    }

    /// Active resources matching the filter, smallest adequate capacity
    /// first.
    pub fn search_resources(&self, filter: &ResourceFilter) -> Vec<&Resource> {
        let mut out: Vec<&Resource> = self
            .resources
            .iter()
            .map(|(_, r)| r)
            .filter(|r| r.active)
            .filter(|r| filter.min_capacity.is_none_or(|c| r.capacity >= c))
            .filter(|r| filter.kind.is_none_or(|k| r.kind == k))
            .filter(|r| filter.amenities.iter().all(|a| r.amenities.contains(a)))
            .collect();
        out.sort_by_key(|r| r.capacity);
        out
    }

    /// Bookings on one resource in start order. Pass `include_inactive` to
    /// pull cancelled/completed history from the catalog as well; those are
    /// appended after the active ones.
    pub fn resource_bookings(&self, resource_id: &str, include_inactive: bool) -> Vec<&Booking> {
        let mut out: Vec<&Booking> = match self.interval_index(resource_id) {
            Some(idx) => idx
                .in_order()
                .into_iter()
                .map(|(_, booking_id)| {
                    self.bookings
                        .get(&booking_id.to_string())
                        .expect("indexed interval has a cataloged booking")
                })
                .collect(),
            None => Vec::new(),
        };
        if include_inactive {
            let mut rest: Vec<&Booking> = self
                .bookings
                .iter()
                .map(|(_, b)| b)
                .filter(|b| b.resource_id == resource_id && !b.is_active())
                .collect();
            rest.sort_by_key(|b| b.span);
            out.extend(rest);
        }
        out
    }

    /// The next `limit` active bookings at or after `now`, ordered by start
    /// time with priority breaking ties (lower value first).
    pub fn upcoming_bookings(&self, now: Ms, limit: usize) -> Vec<&Booking> {
        let mut out: Vec<&Booking> = self
            .bookings
            .iter()
            .map(|(_, b)| b)
            .filter(|b| b.is_active() && b.span.start >= now)
            .collect();
        out.sort_by_key(|b| (b.span.start, b.priority));
        out.truncate(limit);
        out
    }

    /// Case-insensitive substring search over title and requester.
    pub fn search_bookings(&self, text: &str) -> Vec<&Booking> {
        let needle = text.to_lowercase();
        self.bookings
            .iter()
            .map(|(_, b)| b)
            .filter(|b| {
                b.title.to_lowercase().contains(&needle)
                    || b.requester.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// How much of `window` is covered by active bookings on one resource.
    /// Each booking contributes its intersection with the window, so spans
    /// straddling the edges are clamped.
    pub fn utilization(&self, resource_id: &str, window: Span) -> Result<Utilization, LedgerError> {
        validate_span(window)?;
        let idx = self
            .interval_index(resource_id)
            .ok_or_else(|| LedgerError::NotFound(resource_id.to_string()))?;
        let mut booked_ms = 0;
        let mut booking_count = 0;
        for (span, _) in idx.overlaps(window) {
            booked_ms += span.end.min(window.end) - span.start.max(window.start);
            booking_count += 1;
        }
        Ok(Utilization {
            resource_id: resource_id.to_string(),
            window,
            booked_ms,
            booking_count,
        })
    }

    /// Aggregate every booking starting inside `window`: status counts,
    /// per-resource activity, and revenue. Cancelled bookings count toward
    /// totals but earn nothing.
    pub fn daily_report(&self, window: Span) -> Result<DailyReport, LedgerError> {
        validate_span(window)?;
        let mut status_counts = StatusCounts::default();
        let mut total_bookings = 0;
        let mut revenue_cents = 0;
        let mut per_resource: Vec<ResourceActivity> = Vec::new();

        for (_, booking) in self.bookings.iter() {
            if !window.contains_instant(booking.span.start) {
                continue;
            }
            total_bookings += 1;
            status_counts.bump(booking.status);
            let earned = if booking.status == BookingStatus::Cancelled {
                0
            } else {
                let rate = self
                    .resources
                    .get(&booking.resource_id)
                    .map_or(0, |r| r.hourly_rate_cents);
                booking.duration_ms() * rate / HOUR_MS
            };
            revenue_cents += earned;

            match per_resource.iter_mut().find(|a| a.resource_id == booking.resource_id) {
                Some(activity) => {
                    activity.bookings += 1;
                    activity.booked_ms += booking.duration_ms();
                    activity.revenue_cents += earned;
                }
                None => per_resource.push(ResourceActivity {
                    resource_id: booking.resource_id.clone(),
                    bookings: 1,
                    booked_ms: booking.duration_ms(),
                    revenue_cents: earned,
                }),
            }
        }

        Ok(DailyReport {
            window,
            total_bookings,
            revenue_cents,
            status_counts,
            per_resource,
        })
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            resources: self.resources.len(),
            active_resources: self.resources.iter().filter(|(_, r)| r.active).count(),
            bookings: self.bookings.len(),
            active_bookings: self.bookings.iter().filter(|(_, b)| b.is_active()).count(),
            undo_depth: self.changelog.undo_depth(),
            redo_depth: self.changelog.redo_depth(),
        }
    }

    // ── History introspection ────────────────────────────────

    pub fn can_undo(&self) -> bool {
        self.changelog.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.changelog.can_redo()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.changelog.undo_description()
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.changelog.redo_description()
    }

    pub fn in_batch(&self) -> bool {
        self.changelog.in_batch()
    }
}
