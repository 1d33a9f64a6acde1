//! The per-rack DAG: topology construction, level-scheduled block
//! processing, and final mix summation.

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;
#[cfg(not(feature = "std"))]
use alloc::string::String;
#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use patchbay_core::{AudioBuffer, Node, NodeCategory, NodeError, NodeEvent, NodeId, ProcessContext};

use crate::edge::Edge;
use crate::mixer::Mixer;

struct NodeSlot {
    id: String,
    node: Box<dyn Node>,
}

#[derive(Clone, Copy)]
struct UpEdge {
    from: NodeId,
    gain: f32,
    from_port: u16,
    to_port: u16,
}

/// An ordered set of nodes and typed edges, processed one block at a time.
///
/// Topology (the upstream/downstream adjacency and the Kahn level order) is
/// rebuilt lazily, on the first `process` call after [`Graph::add_node`] or
/// [`Graph::set_edges`] touched it. A render never mutates topology mid-block;
/// doing so is a configuration-time operation only.
pub struct Graph {
    nodes: Vec<NodeSlot>,
    edges: Vec<Edge>,
    mixer: Option<Mixer>,
    channels: usize,

    upstream: Vec<Vec<UpEdge>>,
    downstream: Vec<Vec<NodeId>>,
    topo_order: Vec<NodeId>,
    insertion_order: Vec<NodeId>,
    topo_dirty: bool,

    out_buffers: Vec<AudioBuffer>,
    main_in: AudioBuffer,
    sidechain_in: AudioBuffer,
}

impl Graph {
    /// Build an empty graph for a session with the given channel count.
    pub fn new(channels: usize) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            mixer: None,
            channels,
            upstream: Vec::new(),
            downstream: Vec::new(),
            topo_order: Vec::new(),
            insertion_order: Vec::new(),
            topo_dirty: true,
            out_buffers: Vec::new(),
            main_in: AudioBuffer::new(0, channels),
            sidechain_in: AudioBuffer::new(0, channels),
        }
    }

    /// Add a node under `id`, returning the [`NodeId`] it is addressed by
    /// for the lifetime of this graph (its position in insertion order).
    pub fn add_node(&mut self, id: impl Into<String>, node: Box<dyn Node>) -> NodeId {
        let node_id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeSlot {
            id: id.into(),
            node,
        });
        self.topo_dirty = true;
        node_id
    }

    /// Resolve a node's configuration id to its [`NodeId`], if present.
    pub fn node_id(&self, id: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|slot| slot.id == id)
            .map(|idx| NodeId(idx as u32))
    }

    /// Replace the edge set. Marks topology dirty; rebuilt on the next
    /// `process` call.
    pub fn set_edges(&mut self, edges: Vec<Edge>) {
        self.edges = edges;
        self.topo_dirty = true;
    }

    /// Install (or clear, via `None`) the final mixing stage.
    pub fn set_mixer(&mut self, mixer: Option<Mixer>) {
        self.mixer = mixer;
    }

    /// Prepare every node for the given sample rate and maximum block size.
    pub fn prepare(&mut self, sample_rate: f32, max_block_frames: usize) -> Result<(), NodeError> {
        for slot in &mut self.nodes {
            slot.node.prepare(sample_rate, max_block_frames)?;
        }
        Ok(())
    }

    /// Reset every node's runtime state to silence.
    pub fn reset(&mut self) {
        for slot in &mut self.nodes {
            slot.node.reset();
        }
    }

    /// Deliver an event to one node by its resolved [`NodeId`].
    pub fn handle_event(&mut self, node_id: NodeId, event: NodeEvent) {
        if let Some(slot) = self.nodes.get_mut(node_id.index()) {
            slot.node.handle_event(event);
        }
    }

    /// Iterate node ids and their configuration-time string ids.
    pub fn node_ids(&self) -> impl Iterator<Item = (NodeId, &str)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, slot)| (NodeId(i as u32), slot.id.as_str()))
    }

    fn rebuild_topology(&mut self) {
        let n = self.nodes.len();
        self.insertion_order = (0..n).map(|i| NodeId(i as u32)).collect();
        self.upstream = vec![Vec::new(); n];
        self.downstream = vec![Vec::new(); n];

        let mut indegree = vec![0u32; n];
        let mut seen: Vec<(NodeId, NodeId, u16, u16)> = Vec::new();

        for edge in &self.edges {
            if edge.from.index() >= n || edge.to.index() >= n {
                #[cfg(feature = "tracing")]
                tracing::warn!(from = edge.from.0, to = edge.to.0, "dangling edge dropped");
                continue;
            }
            if edge.from == edge.to {
                #[cfg(feature = "tracing")]
                tracing::warn!(node = edge.from.0, "self-edge dropped");
                continue;
            }
            let key = (edge.from, edge.to, edge.from_port, edge.to_port);
            if seen.contains(&key) {
                #[cfg(feature = "tracing")]
                tracing::warn!(?key, "duplicate edge dropped");
                continue;
            }
            seen.push(key);

            self.upstream[edge.to.index()].push(UpEdge {
                from: edge.from,
                gain: edge.gain,
                from_port: edge.from_port,
                to_port: edge.to_port,
            });
            self.downstream[edge.from.index()].push(edge.to);
            indegree[edge.to.index()] += 1;
        }

        for up in &mut self.upstream {
            up.sort_by_key(|e| (e.to_port, e.from.0, e.from_port));
        }

        let mut queue: Vec<NodeId> = (0..n)
            .filter(|&i| indegree[i] == 0)
            .map(|i| NodeId(i as u32))
            .collect();
        let mut order = Vec::with_capacity(n);
        let mut head = 0;
        while head < queue.len() {
            let u = queue[head];
            head += 1;
            order.push(u);
            for &v in &self.downstream[u.index()] {
                indegree[v.index()] -= 1;
                if indegree[v.index()] == 0 {
                    queue.push(v);
                }
            }
        }

        if order.len() != n {
            #[cfg(feature = "tracing")]
            tracing::warn!("cycle detected, falling back to insertion order");
            self.topo_order = Vec::new();
        } else {
            self.topo_order = order;
        }
        self.topo_dirty = false;
    }

    /// Process one segment. `output` is resized to `ctx.frames * channels`
    /// and holds the session-wide mix for this graph on return.
    pub fn process(&mut self, ctx: &ProcessContext, output: &mut AudioBuffer) {
        output.resize(ctx.frames, self.channels);
        if self.nodes.is_empty() {
            return;
        }
        if self.topo_dirty {
            self.rebuild_topology();
        }

        if self.out_buffers.len() != self.nodes.len() {
            self.out_buffers = (0..self.nodes.len())
                .map(|_| AudioBuffer::new(ctx.frames, self.channels))
                .collect();
        }
        for buf in &mut self.out_buffers {
            buf.resize(ctx.frames, self.channels);
        }
        self.main_in.resize(ctx.frames, self.channels);
        self.sidechain_in.resize(ctx.frames, self.channels);

        let order: &[NodeId] = if self.topo_order.is_empty() {
            &self.insertion_order
        } else {
            &self.topo_order
        };

        for &node_id in order {
            let idx = node_id.index();
            self.main_in.clear();
            self.sidechain_in.clear();
            let mut has_sidechain = false;
            for up in &self.upstream[idx] {
                let src = &self.out_buffers[up.from.index()];
                if up.to_port == 1 {
                    has_sidechain = true;
                    self.sidechain_in.accumulate(src, up.gain);
                } else {
                    self.main_in.accumulate(src, up.gain);
                }
            }

            let slot = &mut self.nodes[idx];
            match slot.node.category() {
                NodeCategory::Generator => {
                    slot.node.process(ctx, &mut self.out_buffers[idx]);
                }
                NodeCategory::Insert | NodeCategory::Mixer if has_sidechain => {
                    self.out_buffers[idx]
                        .as_mut_slice()
                        .copy_from_slice(self.main_in.as_slice());
                    slot.node
                        .apply_sidechain(ctx, &mut self.out_buffers[idx], &self.sidechain_in);
                }
                NodeCategory::Insert | NodeCategory::Mixer => {
                    self.out_buffers[idx]
                        .as_mut_slice()
                        .copy_from_slice(self.main_in.as_slice());
                    slot.node.process_in_place(ctx, &mut self.out_buffers[idx]);
                }
                NodeCategory::Meter => {
                    self.out_buffers[idx]
                        .as_mut_slice()
                        .copy_from_slice(self.main_in.as_slice());
                    slot.node.process_in_place(ctx, &mut self.out_buffers[idx]);
                }
            }
        }

        for edge in &self.edges {
            if edge.dry_percent <= 0.0 || edge.from.index() >= self.nodes.len() {
                continue;
            }
            if let Some(mixer) = &self.mixer {
                if mixer.has_channel(edge.from) {
                    continue;
                }
            }
            output.accumulate(&self.out_buffers[edge.from.index()], edge.dry_percent / 100.0);
        }

        for idx in 0..self.nodes.len() {
            let node_id = NodeId(idx as u32);
            let is_sink = self.downstream[idx].is_empty();
            let gain = match &self.mixer {
                Some(mixer) => mixer.gain_for(node_id).unwrap_or(if is_sink { 1.0 } else { 0.0 }),
                None => {
                    if is_sink {
                        1.0
                    } else {
                        0.0
                    }
                }
            };
            if gain == 0.0 {
                continue;
            }
            output.accumulate(&self.out_buffers[idx], gain);
        }

        if let Some(mixer) = &self.mixer {
            mixer.apply(output.as_mut_slice());
        }
    }
}
