//! # Server Tick Loop
//!
//! Fixed-rate loop driving `world step → storage tick`. A tick that runs
//! past its budget is counted as late; if the loop falls more than one
//! tick behind, the missed ticks are skipped rather than replayed in a
//! burst, so a stalled store cannot snowball into a stalled world.

use std::time::{Duration, Instant};

/// Tick rate used when none is configured.
pub const DEFAULT_TICK_RATE: u32 = 20;

/// Tick timing statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Shortest tick, in microseconds.
    pub min_tick_us: u64,
    /// Longest tick, in microseconds.
    pub max_tick_us: u64,
    /// Rolling average tick duration, in microseconds.
    pub avg_tick_us: u64,
    /// Ticks that took longer than their budget.
    pub late_ticks: u64,
    /// Ticks dropped because the loop fell behind.
    pub skipped_ticks: u64,
    /// Ticks measured.
    pub total_ticks: u64,
}

/// Fixed-timestep tick controller.
pub struct TickLoop {
    tick_duration: Duration,
    next_deadline: Instant,
    tick_count: u64,
    stats: TickStats,
}

impl TickLoop {
    /// Creates a loop running `tick_rate` times per second.
    ///
    /// A rate of zero is treated as one.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        let tick_duration = Duration::from_micros(1_000_000 / u64::from(tick_rate.max(1)));
        Self {
            tick_duration,
            next_deadline: Instant::now() + tick_duration,
            tick_count: 0,
            stats: TickStats {
                min_tick_us: u64::MAX,
                ..TickStats::default()
            },
        }
    }

    /// Marks the start of a tick and returns its start time.
    #[must_use]
    pub fn begin_tick(&mut self) -> Instant {
        self.tick_count += 1;
        Instant::now()
    }

    /// Marks the end of a tick started at `start`.
    pub fn end_tick(&mut self, start: Instant) {
        let duration = start.elapsed();
        let duration_us = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        let s = &mut self.stats;
        s.total_ticks += 1;
        s.min_tick_us = s.min_tick_us.min(duration_us);
        s.max_tick_us = s.max_tick_us.max(duration_us);
        s.avg_tick_us = if s.total_ticks == 1 {
            duration_us
        } else {
            (s.avg_tick_us * 15 + duration_us) / 16
        };
        if duration > self.tick_duration {
            s.late_ticks += 1;
        }
    }

    /// Sleeps until the next tick is due.
    pub fn wait_for_next_tick(&mut self) {
        let now = Instant::now();
        if now < self.next_deadline {
            std::thread::sleep(self.next_deadline - now);
            self.next_deadline += self.tick_duration;
            return;
        }

        let behind = now.duration_since(self.next_deadline);
        let missed = behind.as_nanos() / self.tick_duration.as_nanos().max(1);
        if missed > 0 {
            self.stats.skipped_ticks += u64::try_from(missed).unwrap_or(u64::MAX);
            tracing::warn!("Tick loop {} ticks behind, skipping", missed);
            self.next_deadline = now + self.tick_duration;
        } else {
            self.next_deadline += self.tick_duration;
        }
    }

    /// Ticks started so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Timing statistics.
    #[must_use]
    pub const fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Budget of one tick.
    #[must_use]
    pub const fn tick_duration(&self) -> Duration {
        self.tick_duration
    }
}

impl Default for TickLoop {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE)
    }
}
