use crate::limits::{MAX_SUGGESTIONS, SUGGEST_HORIZON_MS};
use crate::model::{Alternative, AlternativeKind, Booking, BookingPatch, Ms, Span};

use super::conflict::validate_span;
use super::{ConflictLedger, LedgerError};

impl ConflictLedger {
    /// Free sub-spans of `window` on a resource, each at least `min_duration`
    /// long. Cancelled and completed bookings never block: their intervals
    /// were pulled when they left the active set.
    pub fn find_available_slots(
        &self,
        resource_id: &str,
        window: Span,
        min_duration: Ms,
    ) -> Result<Vec<Span>, LedgerError> {
        validate_span(window)?;
        let idx = self
            .interval_index(resource_id)
            .ok_or_else(|| LedgerError::NotFound(resource_id.to_string()))?;
        Ok(idx.free_gaps(window, min_duration))
    }

    /// Alternatives for a request that could not be booked: free slots on
    /// the same resource within the next `SUGGEST_HORIZON_MS`, then the
    /// requested time on other adequate resources. Same-resource suggestions
    /// come first, each group in start order, capped at `MAX_SUGGESTIONS`.
    pub fn suggest_alternatives(
        &self,
        resource_id: &str,
        start: Ms,
        duration: Ms,
    ) -> Result<Vec<Alternative>, LedgerError> {
        if duration <= 0 {
            return Err(LedgerError::InvalidInterval(Span { start, end: start + duration }));
        }
        let reference = self
            .resources
            .get(&resource_id.to_string())
            .ok_or_else(|| LedgerError::NotFound(resource_id.to_string()))?;

        let mut out = Vec::new();

        let horizon = Span::new(start, start + SUGGEST_HORIZON_MS);
        if let Some(idx) = self.interval_index(resource_id) {
            for gap in idx.free_gaps(horizon, duration) {
                if out.len() >= MAX_SUGGESTIONS {
                    break;
                }
                out.push(Alternative {
                    resource_id: resource_id.to_string(),
                    span: Span::new(gap.start, gap.start + duration),
                    kind: AlternativeKind::SameResource,
                });
            }
        }

        let wanted = Span::new(start, start + duration);
        for (id, resource) in self.resources.iter() {
            if out.len() >= MAX_SUGGESTIONS {
                break;
            }
            if id.as_str() == resource_id || !resource.active || resource.capacity < reference.capacity {
                continue;
            }
            if self.check_conflicts(id, wanted, None)?.is_empty() {
                out.push(Alternative {
                    resource_id: id.clone(),
                    span: wanted,
                    kind: AlternativeKind::OtherResource,
                });
            }
        }

        Ok(out)
    }

    /// Move a booking to the first viable alternative: a later slot on its
    /// own resource if one exists within the horizon, otherwise its original
    /// time on another adequate resource. Goes through the normal update
    /// path, so the move is conflict-checked and journaled. `Ok(None)` means
    /// no alternative was found and nothing changed.
    pub fn auto_reschedule(&mut self, id: &str) -> Result<Option<Booking>, LedgerError> {
        let booking = self
            .bookings
            .get(&id.to_string())
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        if !booking.is_active() {
            return Err(LedgerError::AlreadyCancelled(id.to_string()));
        }

        let alternatives =
            self.suggest_alternatives(&booking.resource_id, booking.span.start, booking.duration_ms())?;
        let Some(alt) = alternatives.into_iter().next() else {
            return Ok(None);
        };

        let moved = self.update_booking(
            id,
            BookingPatch {
                resource_id: Some(alt.resource_id),
                start: Some(alt.span.start),
                end: Some(alt.span.end),
                ..Default::default()
            },
        )?;
        Ok(Some(moved))
    }
}
