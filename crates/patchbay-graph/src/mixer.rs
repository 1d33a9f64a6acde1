//! Final summing stage applied once per [`crate::Graph::process`] call.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use patchbay_core::NodeId;

/// Per-node gain entry in a [`Mixer`]'s input list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixerChannel {
    /// Node whose output this channel mixes.
    pub node_id: NodeId,
    /// Linear gain (already converted from a percentage).
    pub gain: f32,
}

/// Applies master gain and optional soft clipping over a graph's summed
/// mix. Always the last stage of block processing; session-wide, not
/// per-node.
#[derive(Debug, Clone)]
pub struct Mixer {
    channels: Vec<MixerChannel>,
    /// Master linear gain applied after summing.
    pub master: f32,
    /// Whether to apply a `tanh` soft clip after the master gain.
    pub soft_clip: bool,
}

impl Mixer {
    /// Build a mixer with explicit per-node gains.
    pub fn new(channels: Vec<MixerChannel>, master: f32, soft_clip: bool) -> Self {
        Self {
            channels,
            master,
            soft_clip,
        }
    }

    /// The configured gain for `node_id`, if this mixer names it explicitly.
    /// `Some(0.0)` is a deliberate silence, distinct from "not present".
    pub fn gain_for(&self, node_id: NodeId) -> Option<f32> {
        self.channels
            .iter()
            .find(|ch| ch.node_id == node_id)
            .map(|ch| ch.gain)
    }

    /// Whether `node_id` appears in this mixer's input list at all (used to
    /// suppress a duplicate dry send from the same node).
    pub fn has_channel(&self, node_id: NodeId) -> bool {
        self.channels.iter().any(|ch| ch.node_id == node_id)
    }

    /// Apply master gain, then (if enabled) a `tanh` soft clip, to every
    /// sample in `buffer`.
    pub fn apply(&self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample *= self.master;
            if self.soft_clip {
                *sample = patchbay_core::soft_clip(*sample);
            }
        }
    }
}
