//! Room-reservation core: an ordered catalog pair backed by balanced
//! trees, a per-resource interval index for conflict detection, and a
//! snapshot journal for undo/redo.
//!
//! Everything is synchronous and single-writer. Callers embed
//! [`ConflictLedger`] directly; persistence, waiting lists, and any user
//! interface live outside this crate and talk to it through typed calls.

pub mod changelog;
pub mod index;
pub mod ledger;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;

pub use ledger::{ConflictLedger, LedgerError};
pub use model::{
    Alternative, AlternativeKind, Booking, BookingId, BookingPatch, BookingStatus, DailyReport,
    LedgerStats, Ms, Resource, ResourceFilter, ResourceId, ResourcePatch, RoomKind, Span,
    Utilization,
};
pub use notify::AvailabilityObserver;
