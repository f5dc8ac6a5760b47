//! Fixed-size window of the most recent samples.

use std::collections::VecDeque;

use crowdwatch_location_models::DataPoint;

/// Number of points the live chart keeps.
pub const WINDOW_SIZE: usize = 10;

/// Keeps the last `capacity` points, oldest first.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    points: VecDeque<DataPoint>,
    capacity: usize,
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new(WINDOW_SIZE)
    }
}

impl RollingWindow {
    /// Creates an empty window. A zero capacity is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `point`, evicting the oldest when full.
    pub fn push(&mut self, point: DataPoint) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Snapshot of the window contents.
    #[must_use]
    pub fn points(&self) -> Vec<DataPoint> {
        self.points.iter().cloned().collect()
    }

    /// The newest point.
    #[must_use]
    pub fn latest(&self) -> Option<&DataPoint> {
        self.points.back()
    }

    /// Number of points held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no points have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_last_ten() {
        let mut window = RollingWindow::default();
        for i in 0..15 {
            window.push(DataPoint::new(format!("10:{i:02}"), f64::from(i)));
        }
        let points = window.points();
        assert_eq!(points.len(), WINDOW_SIZE);
        assert_eq!(points[0].time, "10:05");
        assert_eq!(window.latest().unwrap().time, "10:14");
    }
}
