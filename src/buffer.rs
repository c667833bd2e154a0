//! Fixed-capacity FIFO window over the most recent readings of one mode.

use std::collections::VecDeque;

use crate::types::Reading;

/// Number of readings retained per mode unless configured otherwise.
pub const DEFAULT_WINDOW: usize = 20;

/// Rolling buffer of the last `capacity` readings.
///
/// Appending to a full buffer drops the oldest reading first (strict FIFO).
/// Callers only ever get owned copies of the contents; the backing
/// `VecDeque` never leaves this type.
#[derive(Debug, Clone)]
pub struct RollingBuffer {
    buf: VecDeque<Reading>,
    capacity: usize,
}

impl RollingBuffer {
    /// Create an empty buffer. A `capacity` of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `reading`, evicting the oldest entry when at capacity.
    pub fn append(&mut self, reading: Reading) {
        while self.buf.len() >= self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(reading);
    }

    /// Ordered copy of the contents, oldest first.
    pub fn snapshot(&self) -> Vec<Reading> {
        self.buf.iter().copied().collect()
    }

    /// Ordered copy of just the values, oldest first.
    pub fn values(&self) -> Vec<f64> {
        self.buf.iter().map(|r| r.value).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> + '_ {
        self.buf.iter()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RollingBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(seq: u64, value: f64) -> Reading {
        Reading {
            seq,
            timestamp: seq as f64,
            value,
        }
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut buf = RollingBuffer::default();
        for i in 1..=21 {
            buf.append(reading(i, i as f64));
        }
        assert_eq!(buf.len(), DEFAULT_WINDOW);
        let expected: Vec<f64> = (2..=21).map(|i| i as f64).collect();
        assert_eq!(buf.values(), expected);
    }

    #[test]
    fn snapshot_is_detached_from_the_buffer() {
        let mut buf = RollingBuffer::new(3);
        buf.append(reading(0, 1.0));
        let mut snap = buf.snapshot();
        snap[0].value = 99.0;
        snap.push(reading(1, 2.0));
        assert_eq!(buf.values(), vec![1.0]);

        buf.append(reading(2, 3.0));
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].value, 99.0);
    }

    #[test]
    fn zero_capacity_keeps_latest_reading() {
        let mut buf = RollingBuffer::new(0);
        assert_eq!(buf.capacity(), 1);
        buf.append(reading(0, 1.0));
        buf.append(reading(1, 2.0));
        assert_eq!(buf.values(), vec![2.0]);
    }

    #[test]
    fn clear_empties() {
        let mut buf = RollingBuffer::new(4);
        buf.append(reading(0, 5.0));
        buf.append(reading(1, 6.0));
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 4);
    }
}
