//! Overlap detection over a chronologically sorted event stream.
//!
//! The detector keeps only the events that are still running at the most
//! recent start time. This is enough because every later event starts at or
//! after that time, so anything that ended before it can never overlap again.

use crate::event::Event;

/// An earlier event that is still running when a later one starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conflict<'a> {
    pub earlier: &'a Event,
    pub later: &'a Event,
}

/// Sliding window of events that have not ended yet.
#[derive(Debug, Default)]
pub struct ConflictDetector<'a> {
    active: Vec<&'a Event>,
}

impl<'a> ConflictDetector<'a> {
    pub fn new() -> Self {
        Self { active: Vec::new() }
    }

    /// Report every active event that overlaps `event`, then slide the window.
    ///
    /// Events must be fed in non-decreasing start order. `on_conflict` sees the
    /// earlier events in the order they were added.
    pub fn show_conflicts(&mut self, event: &'a Event, mut on_conflict: impl FnMut(&'a Event)) {
        let start = event.start;
        for &active in &self.active {
            if active.end > start {
                on_conflict(active);
            }
        }
        self.active.retain(|active| active.end > start);
        self.active.push(event);
    }

    /// Same as [`show_conflicts`](Self::show_conflicts), collecting the overlaps.
    pub fn check(&mut self, event: &'a Event) -> Vec<&'a Event> {
        let mut found = Vec::new();
        self.show_conflicts(event, |earlier| found.push(earlier));
        found
    }

    /// Events currently in the window.
    pub fn active(&self) -> &[&'a Event] {
        &self.active
    }
}

/// All (earlier, later) overlaps in a sorted event list.
pub fn find_conflicts(events: &[Event]) -> Vec<Conflict<'_>> {
    let mut detector = ConflictDetector::new();
    let mut conflicts = Vec::new();
    for later in events {
        detector.show_conflicts(later, |earlier| conflicts.push(Conflict { earlier, later }));
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::fixtures::{at, event};

    #[test]
    fn test_single_overlap_reported_once() {
        let events = vec![
            event("A", at(2024, 1, 8, 0, 0), at(2024, 1, 8, 0, 10)),
            event("B", at(2024, 1, 8, 0, 5), at(2024, 1, 8, 0, 15)),
            event("C", at(2024, 1, 8, 0, 20), at(2024, 1, 8, 0, 25)),
        ];
        let mut detector = ConflictDetector::new();

        assert!(detector.check(&events[0]).is_empty());

        let on_b = detector.check(&events[1]);
        assert_eq!(on_b.len(), 1);
        assert_eq!(on_b[0].title, "A");

        assert!(detector.check(&events[2]).is_empty());
        assert_eq!(detector.active().len(), 1);
        assert_eq!(detector.active()[0].title, "C");
    }

    #[test]
    fn test_touching_events_do_not_conflict() {
        let events = vec![
            event("A", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 10, 0)),
            event("B", at(2024, 1, 8, 10, 0), at(2024, 1, 8, 11, 0)),
        ];
        assert!(find_conflicts(&events).is_empty());
    }

    #[test]
    fn test_long_event_conflicts_with_each_later_one() {
        let events = vec![
            event("All hands", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 12, 0)),
            event("One", at(2024, 1, 8, 9, 30), at(2024, 1, 8, 10, 0)),
            event("Two", at(2024, 1, 8, 11, 0), at(2024, 1, 8, 11, 30)),
        ];
        let conflicts = find_conflicts(&events);
        let pairs: Vec<(&str, &str)> = conflicts
            .iter()
            .map(|c| (c.earlier.title.as_str(), c.later.title.as_str()))
            .collect();
        assert_eq!(pairs, vec![("All hands", "One"), ("All hands", "Two")]);
    }

    #[test]
    fn test_callback_order_is_insertion_order() {
        let events = vec![
            event("A", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 12, 0)),
            event("B", at(2024, 1, 8, 9, 0), at(2024, 1, 8, 12, 0)),
            event("C", at(2024, 1, 8, 10, 0), at(2024, 1, 8, 11, 0)),
        ];
        let mut detector = ConflictDetector::new();
        let mut seen = Vec::new();
        for e in &events {
            detector.show_conflicts(e, |earlier| seen.push(earlier.title.clone()));
        }
        assert_eq!(seen, vec!["A", "A", "B"]);
    }
}
