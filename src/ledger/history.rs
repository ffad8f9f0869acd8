use metrics::counter;
use tracing::info;

use crate::changelog::{Command, Snapshot};
use crate::observability;

use super::{ConflictLedger, LedgerError};

impl ConflictLedger {
    /// Revert the newest journaled mutation, returning its description.
    /// Restores full snapshots, so derived state (intervals, catalogs) comes
    /// back exactly as it was.
    pub fn undo(&mut self) -> Result<String, LedgerError> {
        let command = self.changelog.undo().ok_or(LedgerError::NothingToUndo)?;
        self.apply_inverse(&command);
        info!(step = command.description(), "undo");
        counter!(observability::UNDO_TOTAL).increment(1);
        Ok(command.description().to_string())
    }

    /// Re-apply the newest undone mutation, returning its description.
    pub fn redo(&mut self) -> Result<String, LedgerError> {
        let command = self.changelog.redo().ok_or(LedgerError::NothingToRedo)?;
        self.apply_forward(&command);
        info!(step = command.description(), "redo");
        counter!(observability::REDO_TOTAL).increment(1);
        Ok(command.description().to_string())
    }

    /// Batches replay their members newest-first on the way back, so a
    /// member that recreates a resource runs before members that restore
    /// bookings onto it.
    fn apply_inverse(&mut self, command: &Command) {
        match command {
            Command::Create { after, .. } => self.discard_snapshot(after),
            Command::Update { before, .. } | Command::Delete { before, .. } => {
                self.restore_snapshot(before)
            }
            Command::Batch { commands, .. } => {
                for member in commands.iter().rev() {
                    self.apply_inverse(member);
                }
            }
        }
    }

    fn apply_forward(&mut self, command: &Command) {
        match command {
            Command::Create { after, .. } | Command::Update { after, .. } => {
                self.restore_snapshot(after)
            }
            Command::Delete { before, .. } => self.discard_snapshot(before),
            Command::Batch { commands, .. } => {
                for member in commands {
                    self.apply_forward(member);
                }
            }
        }
    }

    /// Put a snapshot back into the catalogs, replacing whatever is there.
    /// Bypasses validation and journaling: snapshots were valid when taken,
    /// and replays must not journal themselves.
    fn restore_snapshot(&mut self, snapshot: &Snapshot) {
        match snapshot {
            Snapshot::Resource(resource) => {
                self.intervals.entry(resource.id.clone()).or_default();
                self.resources.insert(resource.id.clone(), resource.clone());
            }
            Snapshot::Booking(booking) => {
                if let Some(current) = self.bookings.get(&booking.id).cloned()
                    && current.is_active()
                {
                    self.remove_interval_for(&current);
                }
                if booking.is_active() {
                    self.insert_interval_for(booking);
                }
                self.bookings.insert(booking.id.clone(), booking.clone());
            }
        }
    }

    /// Remove the snapshot's entity from the catalogs.
    fn discard_snapshot(&mut self, snapshot: &Snapshot) {
        match snapshot {
            Snapshot::Resource(resource) => {
                self.intervals.remove(&resource.id);
                self.resources.remove(&resource.id);
            }
            Snapshot::Booking(booking) => {
                if let Some(current) = self.bookings.remove(&booking.id)
                    && current.is_active()
                {
                    self.remove_interval_for(&current);
                }
            }
        }
    }
}
