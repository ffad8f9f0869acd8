use crate::model::{Booking, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// Unknown resource or booking id.
    NotFound(String),
    /// Re-adding an id that already exists in a catalog.
    DuplicateId(String),
    /// `start >= end`.
    InvalidInterval(Span),
    CapacityExceeded { attendees: u32, capacity: u32 },
    ResourceInactive(String),
    /// Resource removal blocked by live bookings.
    ResourceInUse(String),
    /// The requested span overlaps these active bookings.
    Conflict(Vec<Booking>),
    AlreadyCancelled(String),
    NothingToUndo,
    NothingToRedo,
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::NotFound(id) => write!(f, "not found: {id}"),
            LedgerError::DuplicateId(id) => write!(f, "already exists: {id}"),
            LedgerError::InvalidInterval(span) => {
                write!(f, "invalid interval: [{}, {})", span.start, span.end)
            }
            LedgerError::CapacityExceeded { attendees, capacity } => {
                write!(f, "{attendees} attendees exceed capacity {capacity}")
            }
            LedgerError::ResourceInactive(id) => write!(f, "resource inactive: {id}"),
            LedgerError::ResourceInUse(id) => {
                write!(f, "cannot remove resource {id}: bookings exist")
            }
            LedgerError::Conflict(bookings) => {
                let ids: Vec<&str> = bookings.iter().map(|b| b.id.as_str()).collect();
                write!(f, "conflict with bookings: {}", ids.join(", "))
            }
            LedgerError::AlreadyCancelled(id) => write!(f, "booking already closed: {id}"),
            LedgerError::NothingToUndo => write!(f, "nothing to undo"),
            LedgerError::NothingToRedo => write!(f, "nothing to redo"),
        }
    }
}

impl std::error::Error for LedgerError {}
