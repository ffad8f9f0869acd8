// ── Mutation counters ───────────────────────────────────────────

/// Counter: resources added to the catalog.
pub const RESOURCES_ADDED_TOTAL: &str = "roomledger_resources_added_total";

/// Counter: resources removed from the catalog.
pub const RESOURCES_REMOVED_TOTAL: &str = "roomledger_resources_removed_total";

/// Counter: bookings successfully created.
pub const BOOKINGS_CREATED_TOTAL: &str = "roomledger_bookings_created_total";

/// Counter: bookings cancelled.
pub const BOOKINGS_CANCELLED_TOTAL: &str = "roomledger_bookings_cancelled_total";

/// Counter: create/update attempts rejected with a conflict.
pub const BOOKING_CONFLICTS_TOTAL: &str = "roomledger_booking_conflicts_total";

// ── History counters ────────────────────────────────────────────

/// Counter: undo operations applied.
pub const UNDO_TOTAL: &str = "roomledger_undo_total";

/// Counter: redo operations applied.
pub const REDO_TOTAL: &str = "roomledger_redo_total";
