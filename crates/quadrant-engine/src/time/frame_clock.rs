use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds.
    pub dt: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame throughput over one reporting interval.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameReport {
    pub frames: u64,
    pub elapsed: Duration,
}

impl FrameReport {
    pub fn fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { self.frames as f64 / secs } else { 0.0 }
    }
}

/// Frame clock producing `FrameTime` snapshots and periodic `FrameReport`s.
///
/// Delta time is clamped to avoid pathological values when the loop is paused
/// by the debugger or stalls.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,

    report_interval: Duration,
    window_start: Instant,
    window_frames: u64,
    pending: Option<FrameReport>,
}

impl FrameClock {
    /// Creates a clock with default clamps reporting every two seconds.
    pub fn new() -> Self {
        Self::with_report_interval(Duration::from_secs(2))
    }

    pub fn with_report_interval(report_interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            last: now,
            frame_index: 0,
            dt_min: Duration::from_micros(100),
            dt_max: Duration::from_millis(250),
            report_interval,
            window_start: now,
            window_frames: 0,
            pending: None,
        }
    }

    /// Restarts both the delta baseline and the current reporting window.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.last = now;
        self.window_start = now;
        self.window_frames = 0;
        self.pending = None;
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Report for the most recently completed interval, if one completed
    /// since the last call.
    pub fn take_report(&mut self) -> Option<FrameReport> {
        self.pending.take()
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        self.window_frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed >= self.report_interval {
            self.pending = Some(FrameReport {
                frames: self.window_frames,
                elapsed,
            });
            self.window_start = now;
            self.window_frames = 0;
        }

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_is_clamped() {
        let mut clock = FrameClock::new();
        let start = clock.last;

        let ft = clock.tick_at(start);
        assert_eq!(ft.dt, Duration::from_micros(100).as_secs_f32());

        let ft = clock.tick_at(start + Duration::from_secs(5));
        assert_eq!(ft.dt, 0.25);
        assert_eq!(ft.frame_index, 1);
    }

    #[test]
    fn report_emitted_once_per_interval() {
        let mut clock = FrameClock::with_report_interval(Duration::from_secs(1));
        let start = clock.last;

        for ms in (100..=900).step_by(100) {
            clock.tick_at(start + Duration::from_millis(ms));
            assert!(clock.take_report().is_none());
        }

        clock.tick_at(start + Duration::from_millis(1000));
        let report = clock.take_report().unwrap();
        assert_eq!(report.frames, 10);
        assert_eq!(report.elapsed, Duration::from_secs(1));
        assert!((report.fps() - 10.0).abs() < 1e-9);

        assert!(clock.take_report().is_none());
    }

    #[test]
    fn empty_report_has_zero_fps() {
        let report = FrameReport { frames: 0, elapsed: Duration::ZERO };
        assert_eq!(report.fps(), 0.0);
    }
}
