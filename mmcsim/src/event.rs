use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::Customer;

/// Type of a simulation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A customer enters the system.
    Arrival,
    /// A customer finishes service and leaves the system.
    Departure,
}

/// An event is a customer and what happens to them at the given time.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event's time.
    pub time: f64,
    /// Type of the event.
    pub kind: EventKind,
    /// Customer the event concerns.
    pub customer: Customer,
}

/// Who put an event in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    /// Scheduled by the simulation itself while processing another event.
    Engine,
    /// Scheduled through the public interface of the simulation.
    External,
}

/// Entry type stored in the event queue. Entries are ordered by time first and by the order of
/// insertion second, both reversed so that the max-heap pops the earliest entry first.
#[derive(Debug)]
struct EventEntry {
    time: Reverse<OrderedFloat<f64>>,
    sequence: Reverse<u64>,
    origin: Origin,
    event: Event,
}

impl PartialEq for EventEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EventEntry {}

impl PartialOrd for EventEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.time, self.sequence).cmp(&(other.time, other.sequence))
    }
}

/// Pending events ordered by their time.
///
/// Events scheduled for the same time are popped in the order they were pushed. Every push is
/// assigned a sequence number, which is used as the secondary sort key, so the order never
/// depends on the internals of the heap.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: BinaryHeap<EventEntry>,
    next_sequence: u64,
}

impl EventQueue {
    /// Pushes an event to the queue.
    pub fn push(&mut self, time: f64, kind: EventKind, customer: Customer) {
        self.push_from(Origin::Engine, time, kind, customer);
    }

    pub(crate) fn push_from(
        &mut self,
        origin: Origin,
        time: f64,
        kind: EventKind,
        customer: Customer,
    ) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.events.push(EventEntry {
            time: Reverse(OrderedFloat(time)),
            sequence: Reverse(sequence),
            origin,
            event: Event {
                time,
                kind,
                customer,
            },
        });
    }

    /// Removes and returns the earliest event or `None` if none are left.
    pub fn pop(&mut self) -> Option<Event> {
        self.pop_with_origin().map(|(event, _)| event)
    }

    pub(crate) fn pop_with_origin(&mut self) -> Option<(Event, Origin)> {
        self.events.pop().map(|entry| (entry.event, entry.origin))
    }

    /// Returns the earliest event without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&Event> {
        self.events.peek().map(|entry| &entry.event)
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Checks if there are any pending events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of pending events of the given kind.
    #[must_use]
    pub fn count(&self, kind: EventKind) -> usize {
        self.events
            .iter()
            .filter(|entry| entry.event.kind == kind)
            .count()
    }
}
