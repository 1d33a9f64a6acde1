//! The [`Node`] trait: the single object-safe interface every generator,
//! insert, meter, and mixer node implements.
//!
//! A closed, small vocabulary of operations (prepare/reset/process/
//! process_in_place/apply_sidechain/handle_event/latency_samples) stands in
//! for what would otherwise be a family of downcast-heavy node types —
//! `dyn Node` is enough for a [`crate`] graph to drive any of them without
//! knowing which concrete node it holds.

use crate::command::{CommandKind, ParamId};
use crate::sample_time::{AudioBuffer, ProcessContext};

/// A node's resolved position within its rack's node list.
///
/// Configuration refers to nodes by string id; a rack interns those strings
/// into `NodeId`s once at load time, so nothing on the audio thread ever
/// compares strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The raw index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for NodeId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// The four processing roles a node can play in a rack's graph.
///
/// The graph uses this to decide how a node participates in block
/// processing: generators originate audio, inserts transform it, meters
/// observe it without changing it, and mixers sum multiple inputs down to
/// one output (mixing itself is performed by the graph; a mixer node
/// configures gains/solo/mute over its declared inputs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCategory {
    /// Originates audio from internal state; ignores its input buffer.
    Generator,
    /// Transforms its input buffer in place.
    Insert,
    /// Observes audio without modifying it (levels, analysis).
    Meter,
    /// Sums multiple named inputs into one output.
    Mixer,
}

/// A non-fatal error raised while preparing or operating a node.
///
/// Nodes never fail at the audio-rate level; this is reserved for resource
/// setup failures surfaced once, at `prepare` time, to the rack/session
/// loader which decides whether that is fatal for the whole render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeError {
    /// Human-readable reason, always a static string so the type stays
    /// `no_std`-friendly.
    pub reason: &'static str,
}

impl NodeError {
    /// Build a new error with the given reason.
    pub fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A parameter change or trigger routed to a node, with the `sample_time`
/// and `node_id` already stripped off by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeEvent {
    /// What kind of event this is.
    pub kind: CommandKind,
    /// Target parameter id for `SetParam`/`SetParamRamp`.
    pub param_id: ParamId,
    /// New value for `SetParam`/`SetParamRamp`.
    pub value: f32,
    /// Ramp duration in milliseconds for `SetParamRamp`.
    pub ramp_ms: f32,
}

/// Object-safe interface implemented by every concrete rack node.
///
/// Default implementations are no-ops so a node only needs to override the
/// handful of methods its category actually uses: a [`NodeCategory::Generator`]
/// overrides `process`, an [`NodeCategory::Insert`] overrides
/// `process_in_place` (and `apply_sidechain` if it reads a sidechain port),
/// a [`NodeCategory::Meter`] overrides `process_in_place` read-only.
pub trait Node {
    /// Allocate internal buffers/filters for the given sample rate and the
    /// largest block size the caller will ever request. Called once before
    /// any other method; never called again while the rack is running.
    fn prepare(&mut self, sample_rate: f32, max_block_frames: usize) -> Result<(), NodeError> {
        let _ = (sample_rate, max_block_frames);
        Ok(())
    }

    /// Clear all internal state (filter memory, envelopes, delay lines) back
    /// to silence, without forgetting parameter values.
    fn reset(&mut self) {}

    /// Generator-style processing: write `ctx.frames` frames into `output`,
    /// ignoring any input (generators have no upstream audio).
    fn process(&mut self, ctx: &ProcessContext, output: &mut AudioBuffer) {
        let _ = ctx;
        output.clear();
    }

    /// Insert/meter-style processing: transform `buffer` in place. Meters
    /// read without mutating.
    fn process_in_place(&mut self, ctx: &ProcessContext, buffer: &mut AudioBuffer) {
        let _ = (ctx, buffer);
    }

    /// Apply a sidechain input during `process_in_place` (compressors,
    /// duckers). Called immediately before `process_in_place` when a node
    /// has a sidechain edge connected to its port 1.
    fn apply_sidechain(
        &mut self,
        ctx: &ProcessContext,
        buffer: &mut AudioBuffer,
        sidechain: &AudioBuffer,
    ) {
        let _ = (ctx, buffer, sidechain);
    }

    /// Apply a trigger or parameter change. Unknown parameter ids are
    /// silently ignored per the parameter-misuse policy: never fatal.
    fn handle_event(&mut self, event: NodeEvent) {
        let _ = event;
    }

    /// Frames of latency this node introduces (e.g. a delay line's feedback
    /// length), used for preroll/latency-compensation accounting.
    fn latency_samples(&self) -> u32 {
        0
    }

    /// Which processing role this node plays in the graph.
    fn category(&self) -> NodeCategory;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;
    impl Node for Silent {
        fn category(&self) -> NodeCategory {
            NodeCategory::Generator
        }
    }

    #[test]
    fn default_process_clears_output() {
        let mut node = Silent;
        let ctx = ProcessContext::new(48000.0, 4, 0);
        let mut buf = AudioBuffer::new(4, 1);
        buf.set_sample(0, 0, 1.0);
        node.process(&ctx, &mut buf);
        assert!(buf.as_slice().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn unhandled_event_is_a_silent_no_op() {
        let mut node = Silent;
        node.handle_event(NodeEvent {
            kind: CommandKind::SetParam,
            param_id: 999,
            value: 1.0,
            ramp_ms: 0.0,
        });
    }
}
