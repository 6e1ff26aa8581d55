//! Bounded sliding window of recent chart points for the real-time view.

use std::collections::VecDeque;

use crate::types::{derive, ChartPoint, Sample};

/// Points the real-time chart keeps (one per second of live data).
pub const LIVE_WINDOW_CAPACITY: usize = 60;

/// Push `v`, evicting from the front until the deque holds at most `cap` items.
pub fn push_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    dq.push_back(v);
    while dq.len() > cap {
        dq.pop_front();
    }
}

#[derive(Debug, Clone)]
pub struct LiveWindow {
    points: VecDeque<ChartPoint>,
    cap: usize,
}

impl LiveWindow {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            points: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn push(&mut self, sample: &Sample) {
        push_capped(&mut self.points, derive(sample), self.cap);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Oldest first, in arrival order.
    pub fn snapshot(&self) -> Vec<ChartPoint> {
        self.points.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }
}

impl Default for LiveWindow {
    fn default() -> Self {
        Self::new(LIVE_WINDOW_CAPACITY)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{DiskUsage, RamUsage};
    use chrono::{TimeZone, Utc};

    pub(crate) fn sample_at(secs: i64, cpu: f64) -> Sample {
        Sample {
            timestamp: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            cpu_percent: cpu,
            ram: RamUsage {
                percent: 50.0,
                used_gb: 8.0,
                total_gb: 16.0,
                available_gb: 8.0,
            },
            disk: DiskUsage {
                percent: 25.0,
                used_gb: 50.0,
                total_gb: 200.0,
                free_gb: 150.0,
            },
            top_processes: Vec::new(),
        }
    }

    #[test]
    fn push_capped_evicts_oldest() {
        let mut dq = VecDeque::new();
        for i in 0..5 {
            push_capped(&mut dq, i, 3);
        }
        assert_eq!(dq, VecDeque::from(vec![2, 3, 4]));
    }

    #[test]
    fn length_tracks_min_of_pushes_and_capacity() {
        let mut w = LiveWindow::default();
        for i in 0..150 {
            w.push(&sample_at(i, i as f64));
            assert_eq!(w.len(), (i as usize + 1).min(LIVE_WINDOW_CAPACITY));
        }
        let snap = w.snapshot();
        assert_eq!(snap.first().unwrap().cpu, 90.0);
        assert_eq!(snap.last().unwrap().cpu, 149.0);
    }

    #[test]
    fn clear_and_snapshot() {
        let mut w = LiveWindow::new(4);
        w.push(&sample_at(0, 1.0));
        w.push(&sample_at(1, 2.0));
        let before = w.snapshot();
        assert_eq!(before.len(), 2);
        assert_eq!(w.len(), 2, "snapshot must not consume");
        w.clear();
        assert!(w.is_empty());
        assert_eq!(before.len(), 2);
    }

    #[test]
    fn zero_capacity_is_bumped() {
        assert_eq!(LiveWindow::new(0).capacity(), 1);
    }
}
