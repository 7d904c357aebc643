use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Summary of the recorded window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub samples: usize,
    pub mean: Duration,
    pub min: Duration,
    pub max: Duration,
    /// Standard deviation around `mean`
    pub jitter: Duration,
}

impl FrameStats {
    pub fn fps(&self) -> f64 {
        let mean = self.mean.as_secs_f64();
        if mean > 0.0 { 1.0 / mean } else { 0.0 }
    }
}

/// Monotonic stopwatch plus a rolling window of recorded durations
#[derive(Debug, Clone)]
pub struct FrameTimer {
    origin: Instant,
    window: VecDeque<Duration>,
    capacity: usize,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            origin: Instant::now(),
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Nanoseconds since the timer was created
    pub fn now(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    /// Time since a mark taken with [`FrameTimer::now`]
    pub fn elapsed(&self, mark: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(mark))
    }

    pub fn record_frame(&mut self, d: Duration) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(d);
    }

    pub fn frame_count(&self) -> usize {
        self.window.len()
    }

    pub fn stats(&self) -> FrameStats {
        let n = self.window.len();
        if n == 0 {
            return FrameStats::default();
        }
        let total: Duration = self.window.iter().sum();
        let mean = total / n as u32;
        let (min, max) = self
            .window
            .iter()
            .fold((Duration::MAX, Duration::ZERO), |(lo, hi), &d| {
                (lo.min(d), hi.max(d))
            });
        let m = mean.as_secs_f64();
        let variance = self
            .window
            .iter()
            .map(|d| (d.as_secs_f64() - m).powi(2))
            .sum::<f64>()
            / n as f64;
        FrameStats {
            samples: n,
            mean,
            min,
            max,
            jitter: Duration::from_secs_f64(variance.sqrt()),
        }
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}
