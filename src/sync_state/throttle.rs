//! # Move Throttle
//!
//! Rate limiter for the local participant's `playerMove` stream. The render
//! loop may tick far faster than the server needs positions; the throttle
//! caps the outbound rate at one message per window and drops ticks where
//! the avatar has not moved since the last send.
//!
//! Cell edits are not throttled: they are discrete user actions.

use cgmath::Vector3;
use web_time::{Duration, Instant};

/// Decides, tick by tick, whether the local position should be sent.
#[derive(Debug, Clone)]
pub struct MoveThrottle {
    min_interval: Duration,
    last_sent_position: Option<Vector3<f32>>,
    last_sent_at: Option<Instant>,
}

impl MoveThrottle {
    /// Creates a throttle with no send history.
    pub fn new(min_interval: Duration) -> Self {
        MoveThrottle {
            min_interval,
            last_sent_position: None,
            last_sent_at: None,
        }
    }

    /// Checks a candidate position at time `now`.
    ///
    /// Returns `true` (and records `position`/`now` as the last send) when
    /// all of these hold:
    /// * the local identity is known,
    /// * at least `min_interval` has passed since the last send,
    /// * `position` differs from the last sent position.
    ///
    /// The very first call with an identity always passes.
    pub fn should_send(
        &mut self,
        has_identity: bool,
        position: Vector3<f32>,
        now: Instant,
    ) -> bool {
        if !has_identity {
            return false;
        }

        if let Some(last) = self.last_sent_at {
            if now.saturating_duration_since(last) < self.min_interval {
                return false;
            }
        }

        if self.last_sent_position == Some(position) {
            return false;
        }

        self.last_sent_position = Some(position);
        self.last_sent_at = Some(now);
        true
    }

    /// Forgets the send history, e.g. when a new identity is assigned.
    pub fn reset(&mut self) {
        self.last_sent_position = None;
        self.last_sent_at = None;
    }

    /// Position of the last accepted send.
    pub fn last_sent_position(&self) -> Option<Vector3<f32>> {
        self.last_sent_position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn throttle() -> MoveThrottle {
        MoveThrottle::new(ms(50))
    }

    #[test]
    fn nothing_is_sent_without_identity() {
        let mut throttle = throttle();
        let start = Instant::now();
        assert!(!throttle.should_send(false, Vector3::new(1.0, 0.0, 0.0), start));
        assert!(throttle.should_send(true, Vector3::new(1.0, 0.0, 0.0), start));
    }

    #[test]
    fn stationary_participant_is_not_resent() {
        let mut throttle = throttle();
        let start = Instant::now();
        let here = Vector3::new(0.0, 1.0, 0.0);

        assert!(throttle.should_send(true, here, start));
        assert!(!throttle.should_send(true, here, start + ms(10)));
        assert!(!throttle.should_send(true, here, start + ms(49)));
        assert!(!throttle.should_send(true, here, start + ms(500)));
    }

    #[test]
    fn movement_inside_the_window_waits() {
        let mut throttle = throttle();
        let start = Instant::now();

        assert!(throttle.should_send(true, Vector3::new(0.0, 0.0, 0.0), start));
        let moved = Vector3::new(0.5, 0.0, 0.0);
        assert!(!throttle.should_send(true, moved, start + ms(10)));
        assert!(!throttle.should_send(true, moved, start + ms(49)));
        assert!(throttle.should_send(true, moved, start + ms(50)));
    }

    #[test]
    fn movement_after_the_window_goes_out_immediately() {
        let mut throttle = throttle();
        let start = Instant::now();

        assert!(throttle.should_send(true, Vector3::new(0.0, 0.0, 0.0), start));
        assert!(throttle.should_send(true, Vector3::new(0.0, 0.0, 1.0), start + ms(60)));
        assert_eq!(throttle.last_sent_position(), Some(Vector3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn reset_allows_an_immediate_resend() {
        let mut throttle = throttle();
        let start = Instant::now();
        let here = Vector3::new(2.0, 2.0, 2.0);

        assert!(throttle.should_send(true, here, start));
        throttle.reset();
        assert!(throttle.should_send(true, here, start + ms(1)));
    }
}
