//! A wait-free, single-producer/single-consumer queue carrying [`Command`]s
//! from a feeder thread to the audio thread.
//!
//! The producer side never blocks: [`CommandProducer::push`] returns `false`
//! when the queue is full and the caller is expected to retry or drop the
//! event. The consumer side drains everything whose `sample_time` is before
//! a cutoff, in FIFO order, which is exactly the order the scheduler needs
//! to apply them.
//!
//! Built on [`rtrb`], a heap-backed SPSC ring buffer, rather than a
//! hand-rolled one: this workspace denies `unsafe_code`, and a lock-free ring
//! buffer normally needs it.

use crate::command::Command;
use crate::sample_time::SampleTime;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// The producer half of a command queue. Owned by the feeder/main thread.
pub struct CommandProducer {
    inner: rtrb::Producer<Command>,
}

/// The consumer half of a command queue. Owned by the audio thread.
pub struct CommandConsumer {
    inner: rtrb::Consumer<Command>,
}

/// Build a fresh queue with room for `capacity` in-flight commands.
pub fn command_queue(capacity: usize) -> (CommandProducer, CommandConsumer) {
    let (producer, consumer) = rtrb::RingBuffer::new(capacity);
    (
        CommandProducer { inner: producer },
        CommandConsumer { inner: consumer },
    )
}

impl CommandProducer {
    /// Push one command. Returns `false` if the queue is full; the caller
    /// must never block the audio thread waiting for space; feeder threads
    /// retry after a short sleep or yield.
    pub fn push(&mut self, command: Command) -> bool {
        self.inner.push(command).is_ok()
    }

    /// Approximate number of commands currently queued. Advisory only: the
    /// consumer may drain concurrently.
    pub fn len(&self) -> usize {
        self.inner.slots()
    }

    /// Remaining free slots, approximate.
    pub fn free_slots(&self) -> usize {
        self.inner.capacity() - self.inner.slots()
    }
}

impl CommandConsumer {
    /// Pop every queued command with `sample_time < cutoff`, in FIFO order,
    /// into `out`. Commands at or after `cutoff` are left queued for the
    /// next call.
    pub fn drain_up_to(&mut self, cutoff: SampleTime, out: &mut Vec<Command>) {
        loop {
            match self.inner.peek() {
                Ok(command) if command.sample_time < cutoff => {
                    let command = *command;
                    // `peek` succeeded, so `pop` cannot fail here.
                    let _ = self.inner.pop();
                    out.push(command);
                }
                _ => break,
            }
        }
    }

    /// Approximate number of commands currently queued.
    pub fn len(&self) -> usize {
        self.inner.slots()
    }

    /// Whether the queue is currently empty. Advisory only.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
