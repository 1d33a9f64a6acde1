//! Deterministic expansion of a pattern/step/lock transport definition into
//! an absolute-time command stream.

#[cfg(not(feature = "std"))]
use alloc::string::String;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use libm::roundf;
use patchbay_core::{Command, NodeId, SampleTime};

/// A single per-step parameter override emitted by the transport generator.
#[derive(Debug, Clone, Copy)]
pub struct PatternLock {
    /// Step index within the pattern's resolution this lock fires on.
    pub step: u32,
    /// Target parameter id.
    pub param_id: u16,
    /// Value to set (or ramp to).
    pub value: f32,
    /// Ramp duration in milliseconds; `0.0` means an immediate `SetParam`.
    pub ramp_ms: f32,
}

/// One voice's step sequence: an `'x'`/`.`-style string plus any locks.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Resolved target node.
    pub node_id: NodeId,
    /// Step string; any non-`'x'` character is a rest. Indexed modulo its
    /// own length against `withinBar`, so patterns shorter than the
    /// transport's resolution repeat.
    pub steps: String,
    /// Per-step parameter locks for this pattern's node.
    pub locks: Vec<PatternLock>,
}

/// A scheduled tempo change taking effect at `bar` and holding until the
/// next point (or the transport's base `bpm` if `bar == 0` is absent).
#[derive(Debug, Clone, Copy)]
pub struct TempoPoint {
    /// Bar index (0-based) at which this tempo takes effect.
    pub bar: u32,
    /// Beats per minute from this bar onward.
    pub bpm: f32,
}

/// Full transport definition: everything [`expand`] needs to produce a
/// command stream.
#[derive(Debug, Clone)]
pub struct TransportSpec {
    /// Base tempo, used before any [`TempoPoint`] takes effect.
    pub bpm: f32,
    /// Number of bars to expand.
    pub length_bars: u32,
    /// Steps per bar.
    pub resolution: u32,
    /// Percentage (0-100) of a step's duration to delay odd steps by.
    pub swing_percent: f32,
    /// Shapes the effective swing percentage: `1.0` is linear, `>1.0`
    /// softer at low percentages, `<1.0` stronger.
    pub swing_exponent: f32,
    /// Stepwise tempo changes, in any order (sorted internally by `bar`).
    pub tempo_ramps: Vec<TempoPoint>,
    /// Voices to expand.
    pub patterns: Vec<Pattern>,
}

impl Default for TransportSpec {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            length_bars: 1,
            resolution: 16,
            swing_percent: 0.0,
            swing_exponent: 1.0,
            tempo_ramps: Vec::new(),
            patterns: Vec::new(),
        }
    }
}

impl TransportSpec {
    fn bpm_at_bar(&self, bar: u32) -> f32 {
        let mut current = self.bpm;
        for point in &self.tempo_ramps {
            if point.bar <= bar {
                current = point.bpm;
            }
        }
        current
    }

    /// Effective swing percentage at a given raw percentage, shaped by
    /// `swing_exponent`: identity at `1.0`, softer below `1.0` for low
    /// percentages.
    fn shaped_swing(&self) -> f32 {
        if self.swing_percent <= 0.0 {
            return 0.0;
        }
        let ratio = self.swing_percent / 100.0;
        let shaped = libm::powf(ratio, self.swing_exponent);
        shaped * 100.0
    }
}

/// Expand a transport definition into a time-ordered [`Command`] list at
/// `sample_rate`. Pure function: same inputs always produce the same
/// output, with no side effects and no reference to wall-clock time.
pub fn expand(transport: &TransportSpec, sample_rate: f32) -> Vec<Command> {
    let mut commands = Vec::new();
    let steps_per_bar = transport.resolution.max(1);
    let total_steps = transport.length_bars.max(1) * steps_per_bar;
    let swing_percent = transport.shaped_swing();

    let mut bar_start_frames: SampleTime = 0;
    let mut frames_per_bar_cache: Vec<SampleTime> = Vec::new();

    for step in 0..total_steps {
        let bar_index = step / steps_per_bar;
        let within_bar = step % steps_per_bar;

        while frames_per_bar_cache.len() <= bar_index as usize {
            let bar = frames_per_bar_cache.len() as u32;
            let bpm = transport.bpm_at_bar(bar).max(1e-6);
            let sec_per_bar = 4.0 * 60.0 / bpm as f64;
            let frames = roundf((sec_per_bar * sample_rate as f64) as f32) as SampleTime;
            frames_per_bar_cache.push(frames);
        }
        let frames_this_bar = frames_per_bar_cache[bar_index as usize];
        if within_bar == 0 {
            bar_start_frames = frames_per_bar_cache[..bar_index as usize].iter().sum();
        }
        let frames_per_step = frames_this_bar / steps_per_bar as SampleTime;

        let is_odd = within_bar % 2 == 1;
        let swing_frames = if is_odd {
            roundf(frames_per_step as f32 * swing_percent / 100.0 * 0.5) as SampleTime
        } else {
            0
        };
        let sample_time = bar_start_frames + within_bar as SampleTime * frames_per_step + swing_frames;

        for pattern in &transport.patterns {
            if pattern.steps.is_empty() {
                continue;
            }
            let chars: Vec<char> = pattern.steps.chars().collect();
            let idx = (within_bar as usize) % chars.len();
            if chars[idx] == 'x' {
                commands.push(Command::trigger(sample_time, pattern.node_id));
            }
            for lock in &pattern.locks {
                if lock.step != within_bar {
                    continue;
                }
                if lock.ramp_ms > 0.0 {
                    commands.push(Command::set_param_ramp(
                        sample_time,
                        pattern.node_id,
                        lock.param_id,
                        lock.value,
                        lock.ramp_ms,
                    ));
                } else {
                    commands.push(Command::set_param(
                        sample_time,
                        pattern.node_id,
                        lock.param_id,
                        lock.value,
                    ));
                }
            }
        }
    }

    commands.sort();
    commands
}
