//! Debounced edge input.
//!
//! Converts raw, possibly bouncing button and joystick-tilt transitions into
//! single logical [`InputEvent`]s. A [`DebouncedButton`] accepts a press only
//! when the raw level reads active (the board's buttons are active-low) and
//! at least the configured debounce interval has elapsed since the last
//! accepted press of the same input.
//!
//! The same `poll` call serves both execution disciplines:
//!
//! - **Interrupt-style dispatch** — an edge-wait task calls `poll` right
//!   after the falling edge fires and posts the resulting event into a
//!   shared [`EventLatch`] for the main loop to take.
//! - **Cooperative polling** — the main loop samples the raw level once per
//!   iteration and calls `poll` synchronously.
//!
//! A deployment picks exactly one discipline per button; mixing both for the
//! same button would race on the last-accepted timestamp.

use core::cell::Cell;

use critical_section::Mutex;

/// A single logical input event, consumed once by the mode state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputEvent {
    /// Move the menu highlight to the previous entry (joystick tilt up).
    SelectPrev,
    /// Move the menu highlight to the next entry (joystick tilt down).
    SelectNext,
    /// Confirm the highlighted entry / trigger the reference tone (button A).
    Confirm,
    /// Leave the current mode (button B).
    Back,
}

// ── DebouncedButton ──────────────────────────────────────────────────────

/// Debounce state for one logical button.
///
/// Holds the event the button emits, the debounce interval, and the
/// timestamp of the last accepted press. Owned by exactly one execution
/// context; the shared hand-off point between contexts is [`EventLatch`],
/// never this struct.
#[derive(Debug, Clone, Copy)]
pub struct DebouncedButton {
    event: InputEvent,
    interval_ms: u64,
    last_accept_ms: Option<u64>,
}

impl DebouncedButton {
    /// Create a debouncer that emits `event` at most once per `interval_ms`.
    pub const fn new(event: InputEvent, interval_ms: u64) -> Self {
        Self {
            event,
            interval_ms,
            last_accept_ms: None,
        }
    }

    /// Feed one raw sample of the pin level.
    ///
    /// `level_low` is `true` when the pin reads low (pressed, active-low
    /// convention). Returns the button's event when the press is accepted:
    /// the level is active and `now_ms` is at least the debounce interval
    /// after the last accepted press. The first press is always accepted.
    ///
    /// Accepting a press updates the stored timestamp; everything else
    /// leaves the state untouched.
    pub fn poll(&mut self, level_low: bool, now_ms: u64) -> Option<InputEvent> {
        if !level_low {
            return None;
        }
        if let Some(last) = self.last_accept_ms {
            if now_ms.saturating_sub(last) < self.interval_ms {
                return None;
            }
        }
        self.last_accept_ms = Some(now_ms);
        Some(self.event)
    }

    /// The event this button emits when accepted.
    pub fn event(&self) -> InputEvent {
        self.event
    }
}

// ── EventLatch ───────────────────────────────────────────────────────────

/// Single-slot hand-off cell between an edge-wait context and the main loop.
///
/// One writer posts, one reader takes. Both ends run inside a critical
/// section, so a read never observes a torn value even when the writer is an
/// interrupt-driven task preempting the main loop. The slot holds at most
/// one pending event; posting over an unread event replaces it, so the
/// newest press wins.
///
/// `EventLatch::new()` is `const`, so the latch can live in a `static`:
///
/// ```
/// use pitchgrid::input::{EventLatch, InputEvent};
///
/// static EVENTS: EventLatch = EventLatch::new();
///
/// EVENTS.post(InputEvent::Confirm);
/// assert_eq!(EVENTS.take(), Some(InputEvent::Confirm));
/// assert_eq!(EVENTS.take(), None);
/// ```
pub struct EventLatch(Mutex<Cell<Option<InputEvent>>>);

impl EventLatch {
    /// Create an empty latch.
    pub const fn new() -> Self {
        Self(Mutex::new(Cell::new(None)))
    }

    /// Post an event, replacing any unread one.
    pub fn post(&self, event: InputEvent) {
        critical_section::with(|cs| self.0.borrow(cs).set(Some(event)));
    }

    /// Take the pending event, leaving the latch empty.
    pub fn take(&self) -> Option<InputEvent> {
        critical_section::with(|cs| self.0.borrow(cs).take())
    }
}

impl Default for EventLatch {
    fn default() -> Self {
        Self::new()
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Debounce behavior ────────────────────────────────────────────

    #[test]
    fn first_press_is_accepted() {
        let mut b = DebouncedButton::new(InputEvent::Confirm, 50);
        assert_eq!(b.poll(true, 0), Some(InputEvent::Confirm));
    }

    #[test]
    fn released_level_never_fires() {
        let mut b = DebouncedButton::new(InputEvent::Back, 50);
        for t in 0..10 {
            assert_eq!(b.poll(false, t * 100), None);
        }
    }

    #[test]
    fn bounce_within_interval_is_suppressed() {
        let mut b = DebouncedButton::new(InputEvent::Confirm, 50);
        assert!(b.poll(true, 1000).is_some());
        // Contact bounce: rapid re-assertions inside the interval.
        assert!(b.poll(true, 1005).is_none());
        assert!(b.poll(true, 1030).is_none());
        assert!(b.poll(true, 1049).is_none());
        // Interval elapsed — next press accepted.
        assert!(b.poll(true, 1050).is_some());
    }

    #[test]
    fn release_does_not_reset_the_interval() {
        let mut b = DebouncedButton::new(InputEvent::Confirm, 50);
        assert!(b.poll(true, 0).is_some());
        assert!(b.poll(false, 10).is_none());
        // Still inside the interval even though the level dropped.
        assert!(b.poll(true, 20).is_none());
        assert!(b.poll(true, 60).is_some());
    }

    #[test]
    fn accepted_events_are_separated_by_at_least_the_interval() {
        // Property over a synthetic sequence of (level, timestamp) pairs:
        // any two accepted events must be >= interval apart.
        const INTERVAL: u64 = 75;
        let mut b = DebouncedButton::new(InputEvent::Confirm, INTERVAL);

        // Pseudo-random-ish but deterministic level/timestamp stream.
        let mut last_accept: Option<u64> = None;
        let mut t = 0u64;
        for step in 0..1000u64 {
            t += (step * 7 + 3) % 23;
            let level_low = (step * 13) % 3 != 0;
            if b.poll(level_low, t).is_some() {
                if let Some(prev) = last_accept {
                    assert!(
                        t - prev >= INTERVAL,
                        "events at {} and {} closer than {}",
                        prev,
                        t,
                        INTERVAL
                    );
                }
                last_accept = Some(t);
            }
        }
        assert!(last_accept.is_some(), "stream never produced an event");
    }

    #[test]
    fn clock_going_backwards_is_treated_as_inside_the_interval() {
        let mut b = DebouncedButton::new(InputEvent::Confirm, 50);
        assert!(b.poll(true, 1000).is_some());
        // saturating_sub keeps a non-monotonic stamp from underflowing.
        assert!(b.poll(true, 990).is_none());
    }

    // ── EventLatch ───────────────────────────────────────────────────

    #[test]
    fn latch_starts_empty() {
        let latch = EventLatch::new();
        assert_eq!(latch.take(), None);
    }

    #[test]
    fn post_then_take_round_trips() {
        let latch = EventLatch::new();
        latch.post(InputEvent::Back);
        assert_eq!(latch.take(), Some(InputEvent::Back));
        assert_eq!(latch.take(), None);
    }

    #[test]
    fn newest_post_wins() {
        let latch = EventLatch::new();
        latch.post(InputEvent::SelectPrev);
        latch.post(InputEvent::Confirm);
        assert_eq!(latch.take(), Some(InputEvent::Confirm));
        assert_eq!(latch.take(), None);
    }
}
