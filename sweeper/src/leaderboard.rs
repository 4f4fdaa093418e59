//! Bounded leaderboard of the most profitable runs (min-heap on profit)

use priority_queue::PriorityQueue;
use reentrancy_model::DistributionShape;
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::sweep::RunRecord;

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub run_id: String,
    pub victim_count: usize,
    pub distribution: DistributionShape,
    pub profit: i128,
    pub utility: f64,
    pub detection_risk: f64,
    pub total_calls: u128,
}

impl Entry {
    /// `None` for runs without an allocation
    pub fn from_record(record: &RunRecord) -> Option<Self> {
        let result = record.result()?;
        Some(Self {
            run_id: record.spec.run_id.clone(),
            victim_count: record.spec.victim_count,
            distribution: record.spec.distribution,
            profit: result.profit,
            utility: result.utility,
            detection_risk: result.detection_risk,
            total_calls: result.total_calls(),
        })
    }
}

/// Keeps the `capacity` highest-profit entries. The queue is ordered with
/// `Reverse` so the weakest entry sits on top and is evicted first.
pub struct Leaderboard {
    queue: PriorityQueue<String, Reverse<i128>>,
    map: HashMap<String, Entry>,
    capacity: usize,
}

impl Leaderboard {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: PriorityQueue::new(),
            map: HashMap::new(),
            capacity,
        }
    }

    /// Insert or replace an entry, evicting the lowest profit when over capacity
    pub fn push(&mut self, entry: Entry) {
        if self.capacity == 0 {
            return;
        }

        let run_id = entry.run_id.clone();
        self.queue.push(run_id.clone(), Reverse(entry.profit));
        self.map.insert(run_id, entry);

        while self.queue.len() > self.capacity {
            if let Some((evicted, _)) = self.queue.pop() {
                self.map.remove(&evicted);
            }
        }
    }

    /// Lowest profit still on the board
    pub fn floor(&self) -> Option<&Entry> {
        let (run_id, _priority) = self.queue.peek()?;
        self.map.get(run_id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Entries from highest to lowest profit
    pub fn ranked(&self) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self.map.values().collect();
        entries.sort_by(|a, b| b.profit.cmp(&a.profit).then_with(|| a.run_id.cmp(&b.run_id)));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_entry(id: &str, profit: i128) -> Entry {
        Entry {
            run_id: id.to_string(),
            victim_count: 2,
            distribution: DistributionShape::Pyramid,
            profit,
            utility: profit as f64,
            detection_risk: 0.1,
            total_calls: 2,
        }
    }

    #[test]
    fn test_keeps_top_profits() {
        let mut board = Leaderboard::new(2);

        board.push(make_entry("a", 10));
        board.push(make_entry("b", -5));
        board.push(make_entry("c", 30));

        assert_eq!(board.len(), 2);
        let ranked: Vec<&str> = board.ranked().iter().map(|e| e.run_id.as_str()).collect();
        assert_eq!(ranked, vec!["c", "a"]);
    }

    #[test]
    fn test_floor_is_lowest_kept() {
        let mut board = Leaderboard::new(3);

        board.push(make_entry("a", 10));
        board.push(make_entry("b", 20));

        let floor = board.floor().unwrap();
        assert_eq!(floor.profit, 10);
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn test_push_replaces_same_run() {
        let mut board = Leaderboard::new(3);

        board.push(make_entry("a", 10));
        board.push(make_entry("a", 50));

        assert_eq!(board.len(), 1);
        assert_eq!(board.floor().map(|e| e.profit), Some(50));
    }

    #[test]
    fn test_zero_capacity_stays_empty() {
        let mut board = Leaderboard::new(0);
        board.push(make_entry("a", 10));
        assert!(board.is_empty());
        assert!(board.floor().is_none());
    }
}
