//! Ticket-based debouncing.
//!
//! A [`Debouncer`] does not own a timer. Every [`push`](Debouncer::push)
//! returns a new [`Ticket`] and invalidates the previous one; the runtime waits
//! for the delay and then calls [`fire`](Debouncer::fire) with the ticket it was
//! given. Only the latest ticket yields a value, so a burst of pushes commits
//! exactly once, with the last value.

use std::time::Duration;

/// Delay between the last search keystroke and the committed search.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Identifies one scheduled commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    generation: u64,
    pending: Option<(Ticket, T)>,
}

impl<T> Debouncer<T> {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: 0,
            pending: None,
        }
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules `value`, superseding anything still pending.
    pub fn push(&mut self, value: T) -> Ticket {
        self.generation += 1;
        let ticket = Ticket(self.generation);
        self.pending = Some((ticket, value));
        ticket
    }

    /// Takes the pending value if `ticket` is still the latest one.
    pub fn fire(&mut self, ticket: Ticket) -> Option<T> {
        match &self.pending {
            Some((current, _)) if *current == ticket => self.pending.take().map(|(_, value)| value),
            _ => None,
        }
    }

    /// Drops the pending value; outstanding tickets fire nothing.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }

    #[must_use]
    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(_, value)| value)
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_last_push_fires() {
        let mut debouncer = Debouncer::default();
        let first = debouncer.push("t");
        let second = debouncer.push("to");
        let last = debouncer.push("toy");

        assert_eq!(debouncer.fire(first), None);
        assert_eq!(debouncer.fire(second), None);
        assert_eq!(debouncer.fire(last), Some("toy"));
        assert_eq!(debouncer.fire(last), None);
    }

    #[test]
    fn cancel_invalidates_outstanding_tickets() {
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        let ticket = debouncer.push(1);
        assert_eq!(debouncer.cancel(), Some(1));
        assert_eq!(debouncer.fire(ticket), None);
        assert!(debouncer.pending().is_none());
    }
}
