pub(crate) mod debug;

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the unix epoch.
/// Used to stamp pending requests, a clock going backwards yields `0`.
pub fn current_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A wrapping id generator that never hands out `0`.
///
/// The first id is picked at random so that two sessions started at the same
/// time do not share correlation ids.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::starting_at(rand::random::<u32>())
    }

    pub fn starting_at(start: u32) -> Self {
        Self {
            next: start.max(1),
        }
    }

    pub fn next(&mut self) -> u32 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        if self.next == 0 {
            self.next = 1;
        }
        id
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
