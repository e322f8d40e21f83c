// Event log merger
//
// Keeps the events of one run deduplicated and ordered by `seq`.
// Batches from the live stream and from catch-up may overlap, arrive out of
// order, or leave gaps; merging is insert-or-replace by `seq`, so replaying
// any batch is a no-op. Gaps are kept as-is: filling them is the controller's
// job (catch-up), never the merger's.

use std::collections::BTreeMap;

use parley_schemas::RunEvent;

/// Deduplicated, `seq`-ordered events of a single run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    events: BTreeMap<u64, RunEvent>,
}

/// What a merge changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    /// Events whose `seq` was not in the log before this merge, ascending
    pub new_events: Vec<RunEvent>,
    /// Number of incoming events that replaced an existing `seq`
    pub replaced: usize,
    /// Highest `seq` in the incoming batch
    pub max_seq: Option<u64>,
}

impl MergeOutcome {
    pub fn is_empty(&self) -> bool {
        self.new_events.is_empty() && self.replaced == 0
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from an arbitrary batch of events
    pub fn from_events(events: impl IntoIterator<Item = RunEvent>) -> Self {
        let mut log = Self::new();
        log.merge(events);
        log
    }

    /// Insert or replace every incoming event by `seq`.
    ///
    /// The most recently received copy of a `seq` wins.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = RunEvent>) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        for event in incoming {
            let seq = event.seq;
            outcome.max_seq = Some(outcome.max_seq.map_or(seq, |max| max.max(seq)));

            match self.events.insert(seq, event.clone()) {
                Some(_) => outcome.replaced += 1,
                None => outcome.new_events.push(event),
            }
        }

        outcome.new_events.sort_by_key(|event| event.seq);
        outcome
    }

    /// Events ascending by `seq`
    pub fn iter(&self) -> impl Iterator<Item = &RunEvent> {
        self.events.values()
    }

    pub fn to_vec(&self) -> Vec<RunEvent> {
        self.events.values().cloned().collect()
    }

    pub fn get(&self, seq: u64) -> Option<&RunEvent> {
        self.events.get(&seq)
    }

    pub fn max_seq(&self) -> Option<u64> {
        self.events.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop every event (run or conversation changed)
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// Pure form of the merge contract: `merge(existing, incoming) -> new_log`.
pub fn merge_events(existing: &[RunEvent], incoming: &[RunEvent]) -> Vec<RunEvent> {
    let mut log = EventLog::from_events(existing.iter().cloned());
    log.merge(incoming.iter().cloned());
    log.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(seq: u64) -> RunEvent {
        RunEvent::new(seq, "user.message", json!({ "content": format!("m{}", seq) }))
    }

    fn seqs(log: &EventLog) -> Vec<u64> {
        log.iter().map(|e| e.seq).collect()
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut log = EventLog::new();
        log.merge(vec![event(1)]);
        let once = log.clone();

        let outcome = log.merge(vec![event(1)]);

        assert_eq!(log, once);
        assert!(outcome.new_events.is_empty());
        assert_eq!(outcome.replaced, 1);
    }

    #[test]
    fn test_merge_order_independent() {
        let events = vec![event(3), event(0), event(2), event(1)];
        let permutations = [
            vec![0, 1, 2, 3],
            vec![3, 2, 1, 0],
            vec![1, 3, 0, 2],
            vec![2, 0, 3, 1],
        ];

        let expected = EventLog::from_events(events.clone());
        for order in permutations {
            let mut log = EventLog::new();
            for index in order {
                log.merge(vec![events[index].clone()]);
            }
            assert_eq!(log.to_vec(), expected.to_vec());
        }
        assert_eq!(seqs(&expected), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_merge_tolerates_gaps() {
        let mut log = EventLog::new();
        log.merge(vec![event(0)]);
        log.merge(vec![event(2)]);
        assert_eq!(seqs(&log), vec![0, 2]);

        log.merge(vec![event(1)]);
        assert_eq!(seqs(&log), vec![0, 1, 2]);
    }

    #[test]
    fn test_latest_copy_wins() {
        let mut log = EventLog::new();
        log.merge(vec![RunEvent::new(4, "assistant.message", json!({"content": "old"}))]);
        log.merge(vec![RunEvent::new(4, "assistant.message", json!({"content": "new"}))]);

        assert_eq!(log.len(), 1);
        assert_eq!(log.get(4).unwrap().payload["content"], "new");
    }

    #[test]
    fn test_outcome_reports_new_events_sorted() {
        let mut log = EventLog::from_events(vec![event(2)]);
        let outcome = log.merge(vec![event(5), event(2), event(3)]);

        let new: Vec<u64> = outcome.new_events.iter().map(|e| e.seq).collect();
        assert_eq!(new, vec![3, 5]);
        assert_eq!(outcome.replaced, 1);
        assert_eq!(outcome.max_seq, Some(5));
        assert_eq!(log.max_seq(), Some(5));
    }

    #[test]
    fn test_merge_events_pure_contract() {
        let existing = vec![event(0), event(2)];
        let merged = merge_events(&existing, &[event(1), event(2)]);

        let merged_seqs: Vec<u64> = merged.iter().map(|e| e.seq).collect();
        assert_eq!(merged_seqs, vec![0, 1, 2]);
        assert_eq!(existing.len(), 2);
    }

    #[test]
    fn test_empty_batch() {
        let mut log = EventLog::new();
        let outcome = log.merge(Vec::new());

        assert!(outcome.is_empty());
        assert_eq!(outcome.max_seq, None);
        assert!(log.is_empty());
    }
}
