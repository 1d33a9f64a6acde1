//! Patchbay Core - shared data model and DSP primitives for the rack engine
//!
//! This crate provides the foundational building blocks shared by every rack:
//! sample-accurate timing, the [`Node`] trait and its command vocabulary, the
//! [`ParameterRegistry`] and [`ModulationMatrix`], the wait-free [`CommandQueue`],
//! and a library of reusable DSP primitives, designed for real-time audio
//! processing with zero allocation in the audio path once a rack is prepared.
//!
//! # Core Abstractions
//!
//! ## Node framework
//!
//! - [`Node`] - object-safe trait implemented by every generator, insert, meter, and mixer
//! - [`NodeCategory`] - the four processing categories a [`Node`] can belong to
//! - [`Command`] / [`CommandKind`] - the event vocabulary a rack consumes
//! - [`CommandQueue`] - single-producer/single-consumer queue feeding the audio thread
//!
//! ## Parameters and modulation
//!
//! - [`ParameterRegistry`] - per-node smoothed parameter storage (step/linear/expo)
//! - [`ModulationMatrix`] - fixed-capacity LFO sources routed to parameter destinations
//!
//! ## Parameter Smoothing
//!
//! Zipper-free parameter changes for click-free automation:
//!
//! - [`SmoothedParam`] - Exponential smoothing (RC-like response)
//! - [`LinearSmoothedParam`] - Linear ramps (constant rate)
//!
//! ## Filters
//!
//! - [`Biquad`] - Second-order IIR filter with RBJ cookbook coefficients
//! - [`StateVariableFilter`] - Multi-output SVF (lowpass, highpass, bandpass simultaneously)
//! - [`CombFilter`] - Comb filter with damping for reverb algorithms
//! - [`AllpassFilter`] - Schroeder allpass for diffusion
//!
//! ## Delay Lines
//!
//! - [`InterpolatedDelay`] - Variable-length delay with interpolation
//! - [`FixedDelayLine`] - Fixed-length delay (compile-time size)
//!
//! ## Modulation & Dynamics
//!
//! - [`Lfo`] - Low-frequency oscillator (5 waveforms)
//! - [`EnvelopeFollower`] - Amplitude envelope detection
//!
//! ## Utilities
//!
//! - [`Oversampled`] - Generic wrapper for anti-aliased nonlinear processing
//! - Math functions: [`db_to_linear`], [`linear_to_db`], [`fast_tanh`], etc.
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible for embedded audio applications.
//! Disable the default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! patchbay-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use patchbay_core::{Effect, EffectExt, SmoothedParam};
//!
//! // Create effects and chain them with zero-cost static dispatch
//! let mut chain = distortion.chain(chorus).chain(delay);
//!
//! // Process audio sample-by-sample
//! for sample in audio_buffer.iter_mut() {
//!     *sample = chain.process(*sample);
//! }
//!
//! // Or process entire blocks for efficiency
//! chain.process_block(&input, &mut output);
//!
//! // For runtime flexibility, use dynamic dispatch
//! let effects: Vec<Box<dyn Effect>> = vec![
//!     Box::new(distortion),
//!     Box::new(chorus),
//! ];
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations in audio processing paths
//! - **No dependencies on std**: Pure `no_std` with `libm` for math
//! - **Object-safe traits**: Dynamic dispatch when needed
//! - **Zero-cost abstractions**: Static dispatch chains optimize away

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod allpass;
pub mod biquad;
pub mod comb;
pub mod command;
#[cfg(feature = "std")]
pub mod command_queue;
pub mod dc_blocker;
pub mod delay;
pub mod effect;
pub mod envelope;
pub mod fast_math;
pub mod gain;
pub mod lfo;
pub mod math;
pub mod mod_matrix;
pub mod modulation;
pub mod node;
pub mod one_pole;
pub mod oversample;
pub mod param;
pub mod param_info;
pub mod registry;
pub mod sample_time;
pub mod svf;
pub mod tempo;

// Re-export main types at crate root
pub use allpass::AllpassFilter;
pub use biquad::{
    Biquad, bandpass_coefficients, highpass_coefficients, lowpass_coefficients, notch_coefficients,
    peaking_eq_coefficients,
};
pub use comb::CombFilter;
pub use command::{Command, CommandKind, ParamId};
#[cfg(feature = "std")]
pub use command_queue::{CommandConsumer, CommandProducer, command_queue};
pub use dc_blocker::DcBlocker;
pub use delay::{FixedDelayLine, InterpolatedDelay, Interpolation};
pub use effect::{Chain, Effect, EffectExt};
pub use envelope::EnvelopeFollower;
pub use fast_math::{
    fast_db_to_linear, fast_exp2, fast_linear_to_db, fast_log2, fast_sin_turns, fast_tan,
};
pub use lfo::{Lfo, LfoWaveform};
pub use math::{
    asymmetric_clip, db_to_linear, fast_tanh, flush_denormal, foldback, hard_clip, linear_to_db,
    mono_sum, soft_clip, wet_dry_mix, wet_dry_mix_stereo,
};
pub use mod_matrix::{MapCurve, ModDestination, ModRoute, ModulationMatrix};
pub use modulation::{ModulationAmount, ModulationSource};
pub use node::{Node, NodeCategory, NodeError, NodeEvent, NodeId};
pub use one_pole::OnePole;
pub use oversample::{MAX_OVERSAMPLE_FACTOR, Oversampled};
pub use param::{LinearSmoothedParam, SmoothedParam};
pub use param_info::{ParamDescriptor, ParamUnit, ParameterInfo};
pub use registry::{ParamKind, ParameterRegistry};
pub use sample_time::{AudioBuffer, ProcessContext, SampleTime};
pub use svf::{StateVariableFilter, SvfOutput};
pub use tempo::{NoteDivision, TempoManager, TransportState};
