use std::collections::HashMap;

/// Flagged message id → id of the guidance message the bot posted for it.
///
/// Entries are removed only when the user fixes their message; guidance
/// deleted by timeout or reaction leaves a stale entry behind.
#[derive(Default)]
pub struct GuidanceTracker {
    entries: HashMap<u64, u64>,
}

impl GuidanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, flagged_id: u64, guidance_id: u64) {
        self.entries.insert(flagged_id, guidance_id);
    }

    pub fn guidance_for(&self, flagged_id: u64) -> Option<u64> {
        self.entries.get(&flagged_id).copied()
    }

    pub fn remove(&mut self, flagged_id: u64) -> Option<u64> {
        self.entries.remove(&flagged_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
