//! Typed connections between nodes in a [`crate::Graph`].

use patchbay_core::NodeId;

/// A directed, gained connection from one node's output to another's input
/// port.
///
/// Port 0 is the main audio input/output by convention; port 1 on a
/// compressor-like node is its sidechain key. Self-edges and duplicate
/// `(from, to, from_port, to_port)` tuples are configuration errors and are
/// dropped with a diagnostic when the graph rebuilds its topology, rather
/// than rejected here - this type is a plain data record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// Upstream node.
    pub from: NodeId,
    /// Downstream node.
    pub to: NodeId,
    /// Output port on `from`.
    pub from_port: u16,
    /// Input port on `to`.
    pub to_port: u16,
    /// Wet gain applied to `from`'s output before summing into `to`.
    pub gain: f32,
    /// Percentage (0-100) of `from`'s output tapped directly into the
    /// session-wide dry mix, independent of `gain`.
    pub dry_percent: f32,
}

impl Edge {
    /// A plain wet connection with no dry send.
    pub fn new(from: NodeId, to: NodeId, gain: f32) -> Self {
        Self {
            from,
            to,
            from_port: 0,
            to_port: 0,
            gain,
            dry_percent: 0.0,
        }
    }

    /// A connection targeting a specific input port (e.g. a sidechain key).
    pub fn to_port(mut self, port: u16) -> Self {
        self.to_port = port;
        self
    }

    /// Add a dry send percentage to this edge.
    pub fn with_dry(mut self, dry_percent: f32) -> Self {
        self.dry_percent = dry_percent;
        self
    }
}
