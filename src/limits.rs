use crate::model::{DAY_MS, Ms};

/// Undo history depth; oldest entries drop silently past this.
pub const MAX_HISTORY: usize = 100;

/// How far ahead `suggest_alternatives` scans the same resource for gaps.
pub const SUGGEST_HORIZON_MS: Ms = 7 * DAY_MS;

/// Cap on the number of alternatives returned per request.
pub const MAX_SUGGESTIONS: usize = 10;
