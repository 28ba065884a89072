use std::time::{Duration, Instant};

use super::game::GameCommand;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    pub tick_cost_ms: f32,
    pub dropped_backlog_ms: f32,
    pub resets: u32,
}

#[derive(Debug)]
pub(crate) struct LoopStats {
    window_start: Instant,
    interval: Duration,
    frames: u32,
    frame_time: Duration,
    ticks: u32,
    tick_cost: Duration,
    resets: u32,
    dropped_backlog: Duration,
}

impl LoopStats {
    pub(crate) fn new(interval: Duration) -> Self {
        Self::starting_at(Instant::now(), interval)
    }

    pub(crate) fn starting_at(start: Instant, interval: Duration) -> Self {
        Self {
            window_start: start,
            interval,
            frames: 0,
            frame_time: Duration::ZERO,
            ticks: 0,
            tick_cost: Duration::ZERO,
            resets: 0,
            dropped_backlog: Duration::ZERO,
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time = self.frame_time.saturating_add(frame_dt);
    }

    pub(crate) fn record_tick(&mut self, cost: Duration, command: GameCommand) {
        self.ticks = self.ticks.saturating_add(1);
        self.tick_cost = self.tick_cost.saturating_add(cost);
        if command == GameCommand::Reset {
            self.resets = self.resets.saturating_add(1);
        }
    }

    pub(crate) fn record_dropped(&mut self, backlog: Duration) {
        self.dropped_backlog = self.dropped_backlog.saturating_add(backlog);
    }

    pub(crate) fn take_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval {
            return None;
        }

        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / seconds,
            tps: self.ticks as f32 / seconds,
            frame_time_ms: mean_ms(self.frame_time, self.frames),
            tick_cost_ms: mean_ms(self.tick_cost, self.ticks),
            dropped_backlog_ms: self.dropped_backlog.as_secs_f32() * 1000.0,
            resets: self.resets,
        };
        *self = Self::starting_at(now, self.interval);
        Some(snapshot)
    }
}

fn mean_ms(total: Duration, count: u32) -> f32 {
    if count == 0 {
        return 0.0;
    }
    total.as_secs_f32() * 1000.0 / count as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_averages_frames_and_ticks() {
        let base = Instant::now();
        let mut stats = LoopStats::starting_at(base, Duration::from_secs(1));

        stats.record_frame(Duration::from_millis(16));
        stats.record_frame(Duration::from_millis(18));
        stats.record_tick(Duration::from_millis(2), GameCommand::Continue);
        stats.record_tick(Duration::from_millis(4), GameCommand::Reset);
        stats.record_tick(Duration::from_millis(3), GameCommand::Continue);
        stats.record_dropped(Duration::from_millis(30));

        let snapshot = stats
            .take_snapshot(base + Duration::from_secs(1))
            .expect("snapshot after a full interval");

        assert!((snapshot.fps - 2.0).abs() < 0.05);
        assert!((snapshot.tps - 3.0).abs() < 0.05);
        assert!((snapshot.frame_time_ms - 17.0).abs() < 0.001);
        assert!((snapshot.tick_cost_ms - 3.0).abs() < 0.001);
        assert!((snapshot.dropped_backlog_ms - 30.0).abs() < 0.001);
        assert_eq!(snapshot.resets, 1);
    }

    #[test]
    fn no_snapshot_mid_interval() {
        let base = Instant::now();
        let mut stats = LoopStats::starting_at(base, Duration::from_secs(1));
        stats.record_frame(Duration::from_millis(16));

        assert!(stats
            .take_snapshot(base + Duration::from_millis(500))
            .is_none());
    }

    #[test]
    fn next_interval_starts_empty() {
        let base = Instant::now();
        let mut stats = LoopStats::starting_at(base, Duration::from_secs(1));
        stats.record_tick(Duration::from_millis(1), GameCommand::Reset);
        stats
            .take_snapshot(base + Duration::from_secs(1))
            .expect("first snapshot");

        let second = stats
            .take_snapshot(base + Duration::from_secs(2))
            .expect("second snapshot");
        assert_eq!(second, LoopMetricsSnapshot::default());
    }
}
