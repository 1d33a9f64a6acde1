//! Graph-based audio processing engine.
//!
//! [`GraphEngine`] wraps [`ProcessingGraph`] to provide a higher-level API for
//! audio processing with DAG-based routing. It mirrors [`ProcessingEngine`]'s
//! interface for backward compatibility while enabling parallel paths, sidechains,
//! and multiband processing.
//!
//! # Migration from `ProcessingEngine`
//!
//! Use [`from_chain()`](GraphEngine::from_chain) for drop-in replacement of linear
//! chains. The output is numerically identical to `ProcessingEngine` for linear
//! topologies.
//!
//! ```rust,ignore
//! use patchbay_io::GraphEngine;
//!
//! let mut engine = GraphEngine::from_chain(
//!     vec![Box::new(Distortion::new(48000.0)), Box::new(Reverb::new(48000.0))],
//!     48000.0,
//!     256,
//! )?;
//!
//! engine.process_block_stereo(&left_in, &right_in, &mut left_out, &mut right_out);
//! ```

use crate::StereoSamples;
use patchbay_core::Effect;
use patchbay_core::graph::{GraphError, ProcessingGraph};

/// Graph-based processing engine for DAG audio routing.
///
/// Wraps [`ProcessingGraph`] with a convenient API for common operations.
/// Supports both linear chains (backward compatible) and arbitrary DAG topologies.
pub struct GraphEngine {
    graph: ProcessingGraph,
}

impl GraphEngine {
    /// Creates a `GraphEngine` from an already-configured [`ProcessingGraph`].
    ///
    /// The graph must already be compiled (via [`ProcessingGraph::compile()`]).
    pub fn new(graph: ProcessingGraph) -> Self {
        Self { graph }
    }

    /// Creates a linear effect chain: Input → E1 → E2 → ... → En → Output.
    ///
    /// This is a drop-in replacement for `ProcessingEngine` with identical output.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if graph construction or compilation fails.
    pub fn from_chain(
        effects: Vec<Box<dyn Effect + Send>>,
        sample_rate: f32,
        block_size: usize,
    ) -> Result<Self, GraphError> {
        let graph = ProcessingGraph::linear(effects, sample_rate, block_size)?;
        Ok(Self { graph })
    }

    /// Returns a mutable reference to the underlying [`ProcessingGraph`].
    ///
    /// Use this for direct graph mutations (add/remove/connect nodes, recompile).
    pub fn graph_mut(&mut self) -> &mut ProcessingGraph {
        &mut self.graph
    }

    /// Returns a reference to the underlying [`ProcessingGraph`].
    pub fn graph(&self) -> &ProcessingGraph {
        &self.graph
    }

    /// Returns the sample rate.
    pub fn sample_rate(&self) -> f32 {
        self.graph.sample_rate()
    }

    /// Sets the sample rate for all effect nodes. Requires recompilation.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.graph.set_sample_rate(sample_rate);
    }

    /// Resets all effect nodes and clears delay lines.
    pub fn reset(&mut self) {
        self.graph.reset();
    }

    /// Returns the total graph latency in samples.
    pub fn latency_samples(&self) -> usize {
        self.graph.latency_samples()
    }

    /// Processes a block of stereo audio through the graph.
    ///
    /// Output buffers must be at least as large as input buffers.
    pub fn process_block_stereo(
        &mut self,
        left_in: &[f32],
        right_in: &[f32],
        left_out: &mut [f32],
        right_out: &mut [f32],
    ) {
        self.graph
            .process_block(left_in, right_in, left_out, right_out);
    }

    /// Processes an entire stereo file through the graph.
    ///
    /// Splits the input into blocks of the graph's block size and processes each.
    pub fn process_file_stereo(
        &mut self,
        input: &StereoSamples,
        block_size: usize,
    ) -> StereoSamples {
        let len = input.len();
        let mut left_out = vec![0.0; len];
        let mut right_out = vec![0.0; len];

        for i in (0..len).step_by(block_size) {
            let chunk_len = block_size.min(len - i);
            let end = i + chunk_len;

            self.graph.process_block(
                &input.left[i..end],
                &input.right[i..end],
                &mut left_out[i..end],
                &mut right_out[i..end],
            );
        }

        StereoSamples::new(left_out, right_out)
    }
}
