//! Request/response poll timing shared by the peripheral behaviours.

use crate::config::NO_DATA_DISCONNECT_COUNT;

/// What a behaviour should do on this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollAction {
    /// Next check time not reached yet.
    Wait,
    /// Send the next request.
    Poll,
    /// The last request went unanswered; the next tick polls again.
    Missed,
    /// Too many unanswered requests in a row.
    Disconnected,
}

/// Tracks the outstanding request and consecutive misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollSchedule {
    interval_us: u64,
    awaiting: bool,
    no_data_count: u8,
    next_check_us: u64,
}

impl PollSchedule {
    #[must_use]
    pub const fn new(interval_us: u64) -> Self {
        Self {
            interval_us,
            awaiting: false,
            no_data_count: 0,
            next_check_us: 0,
        }
    }

    /// A response arrived.
    pub fn data_received(&mut self) {
        self.awaiting = false;
        self.no_data_count = 0;
    }

    /// Evaluate the schedule against the current time.
    pub fn tick(&mut self, now: u64) -> PollAction {
        if now <= self.next_check_us {
            return PollAction::Wait;
        }
        if !self.awaiting {
            return PollAction::Poll;
        }

        self.awaiting = false;
        self.no_data_count += 1;
        if self.no_data_count >= NO_DATA_DISCONNECT_COUNT {
            self.no_data_count = 0;
            PollAction::Disconnected
        } else {
            PollAction::Missed
        }
    }

    /// A request was accepted by the bus.
    pub fn poll_sent(&mut self, now: u64) {
        self.awaiting = true;
        self.next_check_us = now + self.interval_us;
    }

    #[inline]
    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    #[inline]
    pub fn no_data_count(&self) -> u8 {
        self.no_data_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waits_for_next_check() {
        let mut schedule = PollSchedule::new(1_000);
        assert_eq!(schedule.tick(0), PollAction::Wait);
        assert_eq!(schedule.tick(1), PollAction::Poll);
        schedule.poll_sent(1);
        assert_eq!(schedule.tick(1_001), PollAction::Wait);
        assert_eq!(schedule.tick(1_002), PollAction::Missed);
    }

    #[test]
    fn test_data_clears_misses() {
        let mut schedule = PollSchedule::new(1_000);
        schedule.poll_sent(1);
        assert_eq!(schedule.tick(2_000), PollAction::Missed);
        assert_eq!(schedule.no_data_count(), 1);
        schedule.poll_sent(2_000);
        schedule.data_received();
        assert!(!schedule.is_awaiting());
        assert_eq!(schedule.no_data_count(), 0);
        assert_eq!(schedule.tick(3_001), PollAction::Poll);
    }

    #[test]
    fn test_disconnect_after_threshold() {
        let mut schedule = PollSchedule::new(1_000);
        let mut now = 1;
        for _ in 0..NO_DATA_DISCONNECT_COUNT - 1 {
            schedule.poll_sent(now);
            now += 1_001;
            assert_eq!(schedule.tick(now), PollAction::Missed);
        }
        schedule.poll_sent(now);
        assert_eq!(schedule.tick(now + 1_001), PollAction::Disconnected);
        assert_eq!(schedule.no_data_count(), 0);
    }
}
