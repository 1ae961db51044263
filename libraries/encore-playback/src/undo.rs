//! Time-bounded undo for queue removals
//!
//! At most one removal can be undone at a time. Arming a new one discards
//! the previous record. Expiry is judged against the deadline, not against
//! whether the host has polled yet, so a late `poll` can never resurrect an
//! entry that an undo already put back (or the other way round).

use crate::queue::QueueItem;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Time source
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-driven clock for tests and simulations
///
/// Clones share the same time, so a test can keep one handle and give the
/// other to the engine.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.lock().map_or_else(|poisoned| *poisoned.into_inner(), |now| *now)
    }
}

/// A removal that can still be undone
#[derive(Debug, Clone)]
pub struct PendingRemoval {
    /// The removed entry
    pub item: QueueItem,

    /// Where it was when removed
    pub absolute_index: usize,

    /// When the removal becomes permanent
    pub deadline: Instant,

    /// Distinguishes this arming from earlier ones
    pub ticket: u64,
}

/// Holder for the single live [`PendingRemoval`]
#[derive(Debug)]
pub struct UndoWindow {
    timeout: Duration,
    pending: Option<PendingRemoval>,
    next_ticket: u64,
}

impl UndoWindow {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            pending: None,
            next_ticket: 1,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start a new undo window, replacing any previous one
    ///
    /// Returns the ticket of the new record and the record it displaced.
    pub fn arm(
        &mut self,
        item: QueueItem,
        absolute_index: usize,
        now: Instant,
    ) -> (u64, Option<PendingRemoval>) {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let displaced = self.pending.replace(PendingRemoval {
            item,
            absolute_index,
            deadline: now + self.timeout,
            ticket,
        });
        (ticket, displaced)
    }

    /// Take the pending record if it has not expired
    ///
    /// An expired record is left for [`UndoWindow::expire`] to report.
    pub fn take_live(&mut self, now: Instant) -> Option<PendingRemoval> {
        match &self.pending {
            Some(pending) if now < pending.deadline => self.pending.take(),
            _ => None,
        }
    }

    /// Discard the pending record if its deadline has passed
    pub fn expire(&mut self, now: Instant) -> Option<PendingRemoval> {
        match &self.pending {
            Some(pending) if now >= pending.deadline => self.pending.take(),
            _ => None,
        }
    }

    /// Put back a record taken by [`UndoWindow::take_live`]
    ///
    /// Deadline and ticket are kept as they were. Ignored if another record
    /// was armed in the meantime.
    pub fn restore(&mut self, pending: PendingRemoval) {
        if self.pending.is_none() {
            self.pending = Some(pending);
        }
    }

    /// Drop the pending record regardless of time
    pub fn cancel(&mut self) -> Option<PendingRemoval> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<&PendingRemoval> {
        self.pending.as_ref()
    }

    /// Whether an undo is still possible at `now`
    pub fn is_live(&self, now: Instant) -> bool {
        self.pending.as_ref().is_some_and(|p| now < p.deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_core::Song;

    fn create_test_item(id: &str) -> QueueItem {
        QueueItem::new(Arc::new(Song::new(id, id, "Artist", "Album")))
    }

    #[test]
    fn undo_before_deadline() {
        let clock = ManualClock::new();
        let mut window = UndoWindow::new(Duration::from_secs(4));
        window.arm(create_test_item("a"), 2, clock.now());

        clock.advance(Duration::from_secs(3));
        let pending = window.take_live(clock.now()).unwrap();
        assert_eq!(pending.absolute_index, 2);
        assert!(window.pending().is_none());
    }

    #[test]
    fn undo_after_deadline_fails_even_without_poll() {
        let clock = ManualClock::new();
        let mut window = UndoWindow::new(Duration::from_secs(4));
        window.arm(create_test_item("a"), 0, clock.now());

        clock.advance(Duration::from_secs(4));
        assert!(window.take_live(clock.now()).is_none());
        assert!(!window.is_live(clock.now()));
        assert!(window.expire(clock.now()).is_some());
        assert!(window.pending().is_none());
    }

    #[test]
    fn expire_ignores_live_record() {
        let clock = ManualClock::new();
        let mut window = UndoWindow::new(Duration::from_secs(4));
        window.arm(create_test_item("a"), 0, clock.now());

        assert!(window.expire(clock.now()).is_none());
        assert!(window.is_live(clock.now()));
    }

    #[test]
    fn arming_displaces_previous() {
        let clock = ManualClock::new();
        let mut window = UndoWindow::new(Duration::from_secs(4));

        let (first, displaced) = window.arm(create_test_item("a"), 0, clock.now());
        assert!(displaced.is_none());

        let (second, displaced) = window.arm(create_test_item("b"), 1, clock.now());
        assert_ne!(first, second);
        assert_eq!(displaced.unwrap().item.song.id.as_str(), "a");
        assert_eq!(window.pending().unwrap().ticket, second);
    }

    #[test]
    fn restore_keeps_deadline_and_ticket() {
        let clock = ManualClock::new();
        let mut window = UndoWindow::new(Duration::from_secs(4));
        let (ticket, _) = window.arm(create_test_item("a"), 3, clock.now());

        clock.advance(Duration::from_secs(3));
        let pending = window.take_live(clock.now()).unwrap();
        let deadline = pending.deadline;
        window.restore(pending);

        let restored = window.pending().unwrap();
        assert_eq!(restored.ticket, ticket);
        assert_eq!(restored.deadline, deadline);

        clock.advance(Duration::from_secs(1));
        assert!(!window.is_live(clock.now()));
        assert!(window.expire(clock.now()).is_some());
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        let start = clock.now();

        handle.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - start, Duration::from_millis(250));
    }
}
