//! Splits each audio block at event sample offsets and drives the graph one
//! segment at a time, so every command takes effect at its exact sample.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use patchbay_core::{AudioBuffer, Command, CommandKind, NodeEvent, ProcessContext, SampleTime};

use crate::graph::Graph;

/// Drives a [`Graph`] one audio block at a time, applying queued commands
/// at their exact sample offset within the block.
///
/// Holds no state of its own beyond the running sample counter; a fresh
/// `Scheduler` can resume a graph at any `SampleTime` by construction.
pub struct Scheduler {
    sample_counter: SampleTime,
    pending: Vec<Command>,
}

impl Scheduler {
    /// Start a scheduler at sample time zero (or wherever a render resumes).
    pub fn new(start: SampleTime) -> Self {
        Self {
            sample_counter: start,
            pending: Vec::new(),
        }
    }

    /// The absolute sample time this scheduler has advanced to.
    pub fn sample_counter(&self) -> SampleTime {
        self.sample_counter
    }

    /// Process one block of `frames` samples starting at the current sample
    /// counter. `commands` must already be drained from the command queue
    /// (commands with `sample_time >= block_start + frames` are ignored and
    /// should not have been drained in the first place).
    pub fn process_block(
        &mut self,
        graph: &mut Graph,
        sample_rate: f32,
        frames: usize,
        commands: &[Command],
        output: &mut AudioBuffer,
    ) {
        let block_start = self.sample_counter;
        let cutoff = block_start + frames as SampleTime;

        self.pending.clear();
        self.pending.extend(
            commands
                .iter()
                .copied()
                .filter(|c| c.sample_time >= block_start && c.sample_time < cutoff),
        );
        self.pending.sort();
        self.pending.dedup();

        let mut splits: Vec<usize> = self
            .pending
            .iter()
            .map(|c| (c.sample_time - block_start) as usize)
            .collect();
        splits.push(0);
        splits.push(frames);
        splits.sort_unstable();
        splits.dedup();

        output.resize(frames, output.channels().max(1));
        let mut segment = AudioBuffer::new(0, output.channels());

        for window in splits.windows(2) {
            let (a, b) = (window[0], window[1]);
            if a >= b {
                continue;
            }
            let abs_a = block_start + a as SampleTime;

            for command in self.pending.iter().filter(|c| c.sample_time == abs_a) {
                if matches!(command.kind, CommandKind::SetParam | CommandKind::SetParamRamp) {
                    apply(graph, command);
                }
            }
            for command in self.pending.iter().filter(|c| c.sample_time == abs_a) {
                if command.kind == CommandKind::Trigger {
                    apply(graph, command);
                }
            }

            let seg_frames = b - a;
            let ctx = ProcessContext::new(sample_rate, seg_frames, abs_a);
            segment.resize(seg_frames, output.channels());
            graph.process(&ctx, &mut segment);

            for f in 0..seg_frames {
                let dst = output.frame_mut(a + f);
                let src = segment.frame(f);
                dst.copy_from_slice(src);
            }
        }

        self.sample_counter = cutoff;
    }
}

fn apply(graph: &mut Graph, command: &Command) {
    let event = NodeEvent {
        kind: command.kind,
        param_id: command.param_id,
        value: command.value,
        ramp_ms: command.ramp_ms,
    };
    graph.handle_event(command.node_id, event);
}
