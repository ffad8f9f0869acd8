use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::{Booking, Ms, Span};

use super::{ConflictLedger, LedgerError};

pub(crate) fn now_ms() -> Ms {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Ms)
        .unwrap_or(0)
}

pub(crate) fn validate_span(span: Span) -> Result<(), LedgerError> {
    if span.start >= span.end {
        return Err(LedgerError::InvalidInterval(span));
    }
    Ok(())
}

impl ConflictLedger {
    /// Active bookings on `resource_id` overlapping `span`, in start order.
    /// `exclude` skips one booking id, so a booking being moved never
    /// conflicts with itself. Unknown resources have nothing booked, so they
    /// report no conflicts; existence checks are the mutations' job.
    pub fn check_conflicts(
        &self,
        resource_id: &str,
        span: Span,
        exclude: Option<&str>,
    ) -> Result<Vec<Booking>, LedgerError> {
        validate_span(span)?;
        let Some(idx) = self.interval_index(resource_id) else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for (_, booking_id) in idx.overlaps(span) {
            if exclude == Some(booking_id) {
                continue;
            }
            let booking = self
                .bookings
                .get(&booking_id.to_string())
                .expect("indexed interval has a cataloged booking");
            if booking.is_active() {
                out.push(booking.clone());
            }
        }
        Ok(out)
    }

    /// True when `span` can be booked on `resource_id` as-is.
    pub fn is_free(&self, resource_id: &str, span: Span) -> Result<bool, LedgerError> {
        Ok(self.check_conflicts(resource_id, span, None)?.is_empty())
    }

    /// Active bookings occupying `resource_id` at instant `t`.
    pub fn occupying(&self, resource_id: &str, t: Ms) -> Vec<Booking> {
        let Some(idx) = self.interval_index(resource_id) else {
            return Vec::new();
        };
        idx.contains_point(t)
            .into_iter()
            .filter_map(|(_, booking_id)| self.bookings.get(&booking_id.to_string()).cloned())
            .filter(Booking::is_active)
            .collect()
    }
}
