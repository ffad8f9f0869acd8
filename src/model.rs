use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds — the only time type.
pub type Ms = i64;

pub const MINUTE_MS: Ms = 60_000;
pub const HOUR_MS: Ms = 3_600_000;
pub const DAY_MS: Ms = 86_400_000;

/// Resource and booking identifiers are opaque strings.
pub type ResourceId = String;
pub type BookingId = String;

/// Mint a fresh identifier for callers that don't bring their own.
pub fn generate_id() -> String {
    Ulid::new().to_string()
}

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomKind {
    Meeting,
    Conference,
    Training,
    Executive,
    Auditorium,
}

/// A bookable room. Owned by the ledger's resource catalog; deletable only
/// while its interval index is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    pub capacity: u32,
    pub kind: RoomKind,
    pub floor: i32,
    pub amenities: Vec<String>,
    /// Hourly rate in cents, so snapshots stay exactly comparable.
    pub hourly_rate_cents: i64,
    pub active: bool,
}

impl Resource {
    pub fn new(id: impl Into<ResourceId>, name: impl Into<String>, capacity: u32, kind: RoomKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capacity,
            kind,
            floor: 1,
            amenities: Vec::new(),
            hourly_rate_cents: 0,
            active: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

/// A reservation of one resource over a half-open span.
///
/// Lifecycle: create → update* → cancel | complete. Cancelled and completed
/// bookings stay in the catalog for history but never participate in
/// conflict or utilization queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub resource_id: ResourceId,
    pub span: Span,
    pub status: BookingStatus,
    /// Lower value = higher priority.
    pub priority: i32,
    pub title: String,
    pub requester: String,
    pub attendees: u32,
    pub cancel_reason: Option<String>,
    pub created_at: Ms,
    pub updated_at: Ms,
}

impl Booking {
    pub fn new(
        id: impl Into<BookingId>,
        resource_id: impl Into<ResourceId>,
        span: Span,
        title: impl Into<String>,
        requester: impl Into<String>,
        attendees: u32,
    ) -> Self {
        Self {
            id: id.into(),
            resource_id: resource_id.into(),
            span,
            status: BookingStatus::Confirmed,
            priority: 2,
            title: title.into(),
            requester: requester.into(),
            attendees,
            cancel_reason: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Active bookings are the ones that occupy their resource.
    pub fn is_active(&self) -> bool {
        !matches!(self.status, BookingStatus::Cancelled | BookingStatus::Completed)
    }

    pub fn duration_ms(&self) -> Ms {
        self.span.duration_ms()
    }
}

/// Partial booking update. `None` fields are left untouched. Status changes
/// go through `cancel_booking`/`complete_booking`, not through a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingPatch {
    pub resource_id: Option<ResourceId>,
    pub start: Option<Ms>,
    pub end: Option<Ms>,
    pub priority: Option<i32>,
    pub title: Option<String>,
    pub requester: Option<String>,
    pub attendees: Option<u32>,
}

impl BookingPatch {
    /// True when applying the patch moves the booking in time or to another
    /// resource, i.e. when interval churn is required.
    pub fn touches_placement(&self) -> bool {
        self.resource_id.is_some() || self.start.is_some() || self.end.is_some()
    }
}

/// Partial resource update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePatch {
    pub name: Option<String>,
    pub capacity: Option<u32>,
    pub kind: Option<RoomKind>,
    pub floor: Option<i32>,
    pub amenities: Option<Vec<String>>,
    pub hourly_rate_cents: Option<i64>,
    pub active: Option<bool>,
}

/// Criteria for finding a suitable room. `None`/empty fields match
/// everything; amenities must all be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFilter {
    pub min_capacity: Option<u32>,
    pub kind: Option<RoomKind>,
    pub amenities: Vec<String>,
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlternativeKind {
    /// Same resource, a later free slot.
    SameResource,
    /// Different resource, the originally requested time.
    OtherResource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    pub resource_id: ResourceId,
    pub span: Span,
    pub kind: AlternativeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utilization {
    pub resource_id: ResourceId,
    pub window: Span,
    /// Milliseconds of the window covered by active bookings.
    pub booked_ms: Ms,
    pub booking_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub confirmed: usize,
    pub cancelled: usize,
    pub completed: usize,
}

impl StatusCounts {
    pub fn bump(&mut self, status: BookingStatus) {
        match status {
            BookingStatus::Pending => self.pending += 1,
            BookingStatus::Confirmed => self.confirmed += 1,
            BookingStatus::Cancelled => self.cancelled += 1,
            BookingStatus::Completed => self.completed += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceActivity {
    pub resource_id: ResourceId,
    pub bookings: usize,
    pub booked_ms: Ms,
    pub revenue_cents: i64,
}

/// Aggregation over all bookings starting inside a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyReport {
    pub window: Span,
    pub total_bookings: usize,
    pub revenue_cents: i64,
    pub status_counts: StatusCounts,
    pub per_resource: Vec<ResourceActivity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerStats {
    pub resources: usize,
    pub active_resources: usize,
    pub bookings: usize,
    pub active_bookings: usize,
    pub undo_depth: usize,
    pub redo_depth: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_basics() {
        let s = Span::new(100, 200);
        assert_eq!(s.duration_ms(), 100);
        assert!(s.contains_instant(100));
        assert!(s.contains_instant(199));
        assert!(!s.contains_instant(200)); // half-open
    }

    #[test]
    fn span_overlap() {
        let a = Span::new(100, 200);
        let b = Span::new(150, 250);
        let c = Span::new(200, 300);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c)); // adjacent, not overlapping
    }

    #[test]
    fn span_orders_by_start_then_end() {
        let a = Span::new(100, 300);
        let b = Span::new(100, 400);
        let c = Span::new(200, 250);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn booking_active_states() {
        let mut b = Booking::new("B1", "R1", Span::new(0, 100), "standup", "ops", 4);
        assert!(b.is_active());
        b.status = BookingStatus::Pending;
        assert!(b.is_active());
        b.status = BookingStatus::Cancelled;
        assert!(!b.is_active());
        b.status = BookingStatus::Completed;
        assert!(!b.is_active());
    }

    #[test]
    fn patch_placement_detection() {
        let mut p = BookingPatch::default();
        assert!(!p.touches_placement());
        p.title = Some("renamed".into());
        assert!(!p.touches_placement());
        p.start = Some(500);
        assert!(p.touches_placement());
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
    }

    #[test]
    fn booking_serialization_roundtrip() {
        let b = Booking::new("B1", "R1", Span::new(540 * MINUTE_MS, 630 * MINUTE_MS), "review", "eng", 6);
        let json = serde_json::to_string(&b).unwrap();
        let decoded: Booking = serde_json::from_str(&json).unwrap();
        assert_eq!(b, decoded);
    }
}
