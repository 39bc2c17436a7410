use std::time::{Duration, Instant};

/// Source of monotonic timestamps.
///
/// The render thread uses [`MonotonicSource`]; tests substitute a simulated clock.
pub trait TimeSource {
    fn now(&mut self) -> Instant;
}

/// `Instant::now()` backed time source.
#[derive(Debug, Copy, Clone, Default)]
pub struct MonotonicSource;

impl TimeSource for MonotonicSource {
    #[inline]
    fn now(&mut self) -> Instant {
        Instant::now()
    }
}

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous sample. Zero for the first sample.
    pub dt: Duration,

    /// Monotonic timestamp taken at the sample.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

impl FrameTime {
    /// Elapsed time in (fractional) milliseconds, as consumed by renderables.
    #[inline]
    pub fn dt_ms(&self) -> f32 {
        self.dt.as_secs_f32() * 1000.0
    }
}

/// Elapsed-time sampler owned by a single render loop.
///
/// The baseline is taken lazily on the first [`tick`](Self::tick), so a clock
/// constructed on one thread and moved to another does not count the hand-over
/// time as a frame.
///
/// Samples are exact by default. Clamping (see [`with_clamps`](Self::with_clamps))
/// trades that for stability after debugger pauses or long stalls.
#[derive(Debug, Clone)]
pub struct FrameClock<T: TimeSource = MonotonicSource> {
    source: T,
    last: Option<Instant>,
    frame_index: u64,
    clamps: Option<(Duration, Duration)>,
}

impl FrameClock<MonotonicSource> {
    pub fn new() -> Self {
        Self::with_source(MonotonicSource)
    }
}

impl Default for FrameClock<MonotonicSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeSource> FrameClock<T> {
    pub fn with_source(source: T) -> Self {
        Self {
            source,
            last: None,
            frame_index: 0,
            clamps: None,
        }
    }

    /// Clamps every non-initial delta into `[dt_min, dt_max]`.
    pub fn with_clamps(mut self, dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        self.clamps = Some((dt_min, dt_max));
        self
    }

    /// Forgets the baseline; the next sample reports zero elapsed time.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Samples the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        let now = self.source.now();

        let dt = match self.last {
            None => Duration::ZERO,
            Some(last) => {
                let dt = now.saturating_duration_since(last);
                match self.clamps {
                    Some((lo, hi)) => dt.clamp(lo, hi),
                    None => dt,
                }
            }
        };

        self.last = Some(now);

        let ft = FrameTime {
            dt,
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }

    /// Shorthand for `tick().dt`.
    #[inline]
    pub fn elapsed(&mut self) -> Duration {
        self.tick().dt
    }
}
