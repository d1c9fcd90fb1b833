use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Default tempo when a chart does not author one at tick 0.
pub const DEFAULT_BPM: f64 = 120.0;

/// Converts song time into musical ticks and exposes the time-signature
/// timeline. The engine only ever reads from it.
pub trait TimeBase {
    fn resolution(&self) -> u32;
    fn time_to_tick(&self, time: f64) -> u32;
    /// Time-ordered; never empty.
    fn time_signatures(&self) -> &[TimeSignature];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoChange {
    pub tick: u32,
    pub bpm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignatureChange {
    pub tick: u32,
    pub numerator: u32,
    pub denominator: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
    pub tick: u32,
    pub time: f64,
}

impl TimeSignature {
    /// Length of eight measures in ticks; the star-power drain window.
    #[inline(always)]
    pub fn ticks_every_eight_measures(&self, resolution: u32) -> u32 {
        let quarter_notes_per_beat = 4.0 / f64::from(self.denominator.max(1));
        (f64::from(resolution) * quarter_notes_per_beat * f64::from(self.numerator) * 8.0) as u32
    }
}

#[derive(Debug, Clone, Copy)]
struct TempoPoint {
    tick: u32,
    time: f64,
    bpm: f64,
}

#[derive(Debug, Clone)]
pub struct SyncTrack {
    resolution: u32,
    /// Pre-calculated tick -> time anchors, one per tempo change.
    points: Vec<TempoPoint>,
    time_signatures: Vec<TimeSignature>,
}

impl SyncTrack {
    pub fn new(
        resolution: u32,
        tempos: &[TempoChange],
        time_signatures: &[TimeSignatureChange],
    ) -> Self {
        let resolution = resolution.max(1);

        let mut tempos: Vec<TempoChange> = tempos
            .iter()
            .copied()
            .filter(|t| t.bpm.is_finite() && t.bpm > 0.0)
            .collect();
        tempos.sort_by_key(|t| t.tick);
        if tempos.first().is_none_or(|t| t.tick != 0) {
            tempos.insert(0, TempoChange { tick: 0, bpm: DEFAULT_BPM });
        }

        let mut points = Vec::with_capacity(tempos.len());
        let mut last = TempoPoint { tick: 0, time: 0.0, bpm: tempos[0].bpm };
        for tempo in &tempos {
            let time = last.time + ticks_to_seconds(tempo.tick - last.tick, last.bpm, resolution);
            last = TempoPoint { tick: tempo.tick, time, bpm: tempo.bpm };
            points.push(last);
        }

        let mut track = Self { resolution, points, time_signatures: Vec::new() };

        let mut changes = time_signatures.to_vec();
        changes.sort_by_key(|ts| ts.tick);
        if changes.first().is_none_or(|ts| ts.tick != 0) {
            changes.insert(0, TimeSignatureChange { tick: 0, numerator: 4, denominator: 4 });
        }
        track.time_signatures = changes
            .iter()
            .map(|ts| TimeSignature {
                numerator: ts.numerator.max(1),
                denominator: ts.denominator.max(1),
                tick: ts.tick,
                time: track.tick_to_time(ts.tick),
            })
            .collect();
        track
    }

    fn point_index_for_tick(&self, tick: u32) -> usize {
        match self.points.binary_search_by_key(&tick, |p| p.tick) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
    }

    fn point_index_for_time(&self, time: f64) -> usize {
        match self
            .points
            .binary_search_by(|p| p.time.partial_cmp(&time).unwrap_or(Ordering::Less))
        {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
    }

    pub fn tick_to_time(&self, tick: u32) -> f64 {
        let point = self.points[self.point_index_for_tick(tick)];
        point.time + ticks_to_seconds(tick - point.tick, point.bpm, self.resolution)
    }

    pub fn bpm_at_time(&self, time: f64) -> f64 {
        self.points[self.point_index_for_time(time)].bpm
    }
}

impl Default for SyncTrack {
    fn default() -> Self {
        Self::new(480, &[], &[])
    }
}

impl TimeBase for SyncTrack {
    fn resolution(&self) -> u32 {
        self.resolution
    }

    fn time_to_tick(&self, time: f64) -> u32 {
        let point = self.points[self.point_index_for_time(time)];
        let ticks_per_second = point.bpm / 60.0 * f64::from(self.resolution);
        let tick = f64::from(point.tick) + (time - point.time) * ticks_per_second;
        tick.max(0.0) as u32
    }

    fn time_signatures(&self) -> &[TimeSignature] {
        &self.time_signatures
    }
}

#[inline(always)]
fn ticks_to_seconds(ticks: u32, bpm: f64, resolution: u32) -> f64 {
    f64::from(ticks) / f64::from(resolution) * 60.0 / bpm
}
