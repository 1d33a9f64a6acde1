//! Sample-accurate timing and the interleaved audio buffer shared by every
//! node, rack, and bus.

#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// A monotonically increasing sample count, counted from the start of a
/// render or real-time session. Never wraps in practice: at 192kHz a `u64`
/// overflows after roughly 3 million years.
pub type SampleTime = u64;

/// Everything a [`crate::Node`] needs to know about the block it is about
/// to process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessContext {
    /// Sample rate in Hz for this render.
    pub sample_rate: f32,
    /// Number of frames in this call to `process`.
    pub frames: usize,
    /// Absolute sample time of frame 0 of this block.
    pub block_start: SampleTime,
}

impl ProcessContext {
    /// Build a context for a block starting at `block_start`.
    pub fn new(sample_rate: f32, frames: usize, block_start: SampleTime) -> Self {
        Self {
            sample_rate,
            frames,
            block_start,
        }
    }
}

/// An interleaved, fixed-shape audio buffer: `frames * channels` samples
/// stored as `[f0c0, f0c1, .., f1c0, f1c1, ..]`.
///
/// Channel count is arbitrary (not limited to stereo) per rack and bus
/// configuration. Buffers are allocated once at prepare time and reused for
/// the lifetime of a render; no method here allocates except [`resize`].
///
/// [`resize`]: AudioBuffer::resize
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    data: Vec<f32>,
    frames: usize,
    channels: usize,
}

impl AudioBuffer {
    /// Allocate a zeroed buffer of the given shape.
    pub fn new(frames: usize, channels: usize) -> Self {
        Self {
            data: vec![0.0; frames * channels],
            frames,
            channels,
        }
    }

    /// Wrap pre-built interleaved data. Panics if the length doesn't match
    /// `frames * channels`.
    pub fn from_interleaved(data: Vec<f32>, frames: usize, channels: usize) -> Self {
        assert_eq!(data.len(), frames * channels, "interleaved length mismatch");
        Self {
            data,
            frames,
            channels,
        }
    }

    /// Frames (per-channel sample count).
    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Channel count.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Raw interleaved samples.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Raw interleaved samples, mutable.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Zero every sample without changing shape.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Re-shape the buffer, reallocating only if the new size differs.
    pub fn resize(&mut self, frames: usize, channels: usize) {
        let len = frames * channels;
        if self.data.len() != len {
            self.data.resize(len, 0.0);
        } else {
            self.data.fill(0.0);
        }
        self.frames = frames;
        self.channels = channels;
    }

    /// The channel slice for one frame.
    #[inline]
    pub fn frame(&self, index: usize) -> &[f32] {
        let start = index * self.channels;
        &self.data[start..start + self.channels]
    }

    /// The channel slice for one frame, mutable.
    #[inline]
    pub fn frame_mut(&mut self, index: usize) -> &mut [f32] {
        let start = index * self.channels;
        &mut self.data[start..start + self.channels]
    }

    /// Read one sample.
    #[inline]
    pub fn sample(&self, frame: usize, channel: usize) -> f32 {
        self.data[frame * self.channels + channel]
    }

    /// Write one sample.
    #[inline]
    pub fn set_sample(&mut self, frame: usize, channel: usize, value: f32) {
        self.data[frame * self.channels + channel] = value;
    }

    /// Accumulate `other` into `self` scaled by `gain`, upmixing mono sources
    /// and truncating extra channels. Frame counts must match.
    ///
    /// This is the channel-adaptation policy used whenever a [`crate::Node`]
    /// output is summed into a destination of a different channel count: a
    /// mono source spreads to every destination channel, and surplus source
    /// channels beyond the destination width are simply dropped.
    pub fn accumulate(&mut self, other: &AudioBuffer, gain: f32) {
        debug_assert_eq!(self.frames, other.frames, "frame count mismatch");
        for f in 0..self.frames {
            let src = other.frame(f);
            let dst = self.frame_mut(f);
            if src.len() == dst.len() {
                for (d, s) in dst.iter_mut().zip(src.iter()) {
                    *d += *s * gain;
                }
            } else if src.len() == 1 {
                let mono = src[0] * gain;
                for d in dst.iter_mut() {
                    *d += mono;
                }
            } else {
                for (d, s) in dst.iter_mut().zip(src.iter()) {
                    *d += *s * gain;
                }
            }
        }
    }
}
