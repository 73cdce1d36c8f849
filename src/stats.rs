//! Per-session timing for the hand-tracking tick

use std::time::{Duration, Instant};

/// Running count, total and extremes of one stage's durations
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Aggregate {
    pub count: u32,
    pub total: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl Aggregate {
    pub fn add(&mut self, sample: Duration) {
        if self.count == 0 {
            self.min = sample;
            self.max = sample;
        } else {
            self.min = self.min.min(sample);
            self.max = self.max.max(sample);
        }
        self.count = self.count.saturating_add(1);
        self.total = self.total.saturating_add(sample);
    }

    /// (avg, min, max), or `None` before the first sample
    fn calc(&self) -> Option<(Duration, Duration, Duration)> {
        if self.count == 0 {
            return None;
        }
        Some((self.total / self.count, self.min, self.max))
    }
}

/// Tick timing in constant space; a session may run for hours at camera rate
#[derive(Clone, Default)]
pub struct TickStats {
    pub capture: Aggregate,
    pub detection: Aggregate,
    pub voice_poll: Aggregate,
    pub tick: Aggregate,
}

#[derive(Debug, Clone, Copy)]
pub enum StatKind {
    Capture,
    Detection,
    VoicePoll,
    Tick,
}

impl TickStats {
    pub fn record(&mut self, kind: StatKind, duration: Duration) {
        match kind {
            StatKind::Capture => self.capture.add(duration),
            StatKind::Detection => self.detection.add(duration),
            StatKind::VoicePoll => self.voice_poll.add(duration),
            StatKind::Tick => self.tick.add(duration),
        }
    }

    pub fn summary(&self) -> String {
        let mut out = String::new();

        for (label, stage) in [
            ("Capture", &self.capture),
            ("Detection", &self.detection),
            ("Voice poll", &self.voice_poll),
        ] {
            if let Some((avg, min, max)) = stage.calc() {
                out.push_str(&format!(
                    "{} (n={}): avg={:.1}ms min={:.1}ms max={:.1}ms\n",
                    label,
                    stage.count,
                    ms(avg),
                    ms(min),
                    ms(max)
                ));
            }
        }

        if let Some((avg, min, max)) = self.tick.calc() {
            let fps = if avg.is_zero() { 0.0 } else { 1.0 / avg.as_secs_f64() };
            out.push_str(&format!(
                "Tick (n={}): avg={:.1}ms min={:.1}ms max={:.1}ms ~{:.1} fps\n",
                self.tick.count,
                ms(avg),
                ms(min),
                ms(max),
                fps
            ));
        }

        if out.is_empty() {
            out.push_str("No ticks recorded.\n");
        }
        out
    }
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Measures one stage of a tick
pub struct Timer {
    start: Instant,
    kind: StatKind,
}

impl Timer {
    pub fn new(kind: StatKind) -> Self {
        Self {
            start: Instant::now(),
            kind,
        }
    }

    pub fn finish(self, stats: &mut TickStats) {
        stats.record(self.kind, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        assert_eq!(TickStats::default().summary(), "No ticks recorded.\n");
    }

    #[test]
    fn test_summary_lists_recorded_stages() {
        let mut stats = TickStats::default();
        stats.record(StatKind::Tick, Duration::from_millis(20));
        stats.record(StatKind::Tick, Duration::from_millis(40));
        stats.record(StatKind::Capture, Duration::from_millis(5));

        let summary = stats.summary();
        assert!(summary.contains("Capture (n=1): avg=5.0ms"));
        assert!(summary.contains("Tick (n=2): avg=30.0ms min=20.0ms max=40.0ms"));
        assert!(!summary.contains("Detection"));
    }

    #[test]
    fn test_timer_records_kind() {
        let mut stats = TickStats::default();
        Timer::new(StatKind::Detection).finish(&mut stats);
        assert_eq!(stats.detection.count, 1);
        assert_eq!(stats.tick.count, 0);
    }

    #[test]
    fn test_long_session_keeps_running_totals() {
        let mut stats = TickStats::default();
        // an hour at 30 fps
        for i in 0..108_000u64 {
            stats.record(StatKind::Tick, Duration::from_millis(30 + i % 3));
        }
        assert_eq!(stats.tick.count, 108_000);
        assert_eq!(stats.tick.min, Duration::from_millis(30));
        assert_eq!(stats.tick.max, Duration::from_millis(32));
        assert_eq!(stats.tick.total, Duration::from_millis(108_000 * 31));
        assert!(stats.summary().contains("Tick (n=108000): avg=31.0ms min=30.0ms max=32.0ms"));
    }
}
