//! Bounded block queue between the delivery callback and the consumer.
//!
//! The producer half lives inside the host's delivery callback; the consumer
//! half stays with the [`crate::audio::CaptureSession`].  The queue is a
//! lock-free SPSC ring (`ringbuf`), so the audio thread never waits on a
//! slow consumer.
//!
//! ## Overflow behaviour
//!
//! **Drop-newest.**  When the ring is full the incoming block is discarded
//! and counted in [`CaptureSummary::blocks_dropped`].  Blocks already queued
//! are never evicted by the producer.
//!
//! ## Buffer reuse
//!
//! A queued block owns its bytes.  Buffers handed back through
//! [`BlockConsumer::recycle`] travel to the producer on a second ring of the
//! same capacity and are refilled in place, so a consumer that recycles keeps
//! the callback off the allocator.  Without recycling each queued block costs
//! one allocation on the audio thread; dropped blocks cost none.
//!
//! # Example
//!
//! ```rust
//! use audio_probe::audio::block_queue;
//!
//! let (mut producer, mut consumer) = block_queue(2);
//! producer.deliver(&[1, 2]);
//! producer.deliver(&[3, 4]);
//! producer.deliver(&[5, 6]); // queue full → dropped
//!
//! let blocks = consumer.drain();
//! assert_eq!(blocks.len(), 2);
//! assert_eq!(consumer.summary().blocks_dropped, 1);
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};
use serde::{Deserialize, Serialize};

use super::session::CaptureConfig;

// ---------------------------------------------------------------------------
// AudioBlock
// ---------------------------------------------------------------------------

/// One delivered chunk of interleaved samples, in native byte order.
///
/// Interpret it with the [`CaptureConfig`] of the session that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlock {
    bytes: Vec<u8>,
}

impl AudioBlock {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of whole frames in this block under `config`.
    pub fn frames(&self, config: &CaptureConfig) -> usize {
        match config.bytes_per_frame() {
            0 => 0,
            per_frame => self.bytes.len() / per_frame,
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureSummary
// ---------------------------------------------------------------------------

/// Totals drawn from the queue's counters.
///
/// `blocks_received` and `bytes_received` count every block the callback
/// delivered while the queue was open, including dropped ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSummary {
    pub blocks_received: u64,
    pub bytes_received: u64,
    pub blocks_dropped: u64,
}

impl CaptureSummary {
    /// Blocks that made it into the queue.
    pub fn blocks_queued(&self) -> u64 {
        self.blocks_received.saturating_sub(self.blocks_dropped)
    }
}

// ---------------------------------------------------------------------------
// Shared accounting
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Shared {
    received: AtomicU64,
    bytes: AtomicU64,
    dropped: AtomicU64,
    /// Cleared by the consumer to refuse further deliveries.
    open: AtomicBool,
    /// Deliveries currently inside [`BlockProducer::deliver`].
    in_flight: AtomicUsize,
}

impl Shared {
    fn new() -> Self {
        Self {
            received: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            open: AtomicBool::new(true),
            in_flight: AtomicUsize::new(0),
        }
    }
}

/// Create a matched producer/consumer pair holding at most `capacity` blocks.
///
/// # Panics
///
/// Panics if `capacity == 0`.
pub fn block_queue(capacity: usize) -> (BlockProducer, BlockConsumer) {
    assert!(capacity > 0, "block queue capacity must be > 0");
    let (prod, cons) = HeapRb::<AudioBlock>::new(capacity).split();
    let (spare_prod, spare_cons) = HeapRb::<Vec<u8>>::new(capacity).split();
    let shared = Arc::new(Shared::new());
    (
        BlockProducer {
            inner: prod,
            spare: spare_cons,
            shared: Arc::clone(&shared),
        },
        BlockConsumer {
            inner: cons,
            spare: spare_prod,
            shared,
            capacity,
        },
    )
}

// ---------------------------------------------------------------------------
// BlockProducer
// ---------------------------------------------------------------------------

/// Producer half, owned by the delivery callback.
pub struct BlockProducer {
    inner: HeapProd<AudioBlock>,
    /// Buffers returned by the consumer.
    spare: HeapCons<Vec<u8>>,
    shared: Arc<Shared>,
}

impl BlockProducer {
    /// Copy `data` into an owned block and enqueue it.
    ///
    /// The block reuses a recycled buffer when one is available.  Never
    /// blocks.  Returns `true` when the block was queued, `false` when
    /// it was dropped (queue full) or delivery has been closed.
    pub fn deliver(&mut self, data: &[u8]) -> bool {
        self.shared.in_flight.fetch_add(1, Ordering::SeqCst);

        // `received` is bumped before `dropped`, both SeqCst, so a reader
        // loading `dropped` first never sees more drops than deliveries.
        let queued = if self.shared.open.load(Ordering::SeqCst) {
            self.shared.received.fetch_add(1, Ordering::SeqCst);
            self.shared
                .bytes
                .fetch_add(data.len() as u64, Ordering::Relaxed);

            if self.inner.is_full() {
                self.shared.dropped.fetch_add(1, Ordering::SeqCst);
                false
            } else {
                let mut bytes = self.spare.try_pop().unwrap_or_default();
                bytes.clear();
                bytes.extend_from_slice(data);
                match self.inner.try_push(AudioBlock::new(bytes)) {
                    Ok(()) => true,
                    Err(block) => {
                        let _ = self.spare.try_push(block.into_bytes());
                        self.shared.dropped.fetch_add(1, Ordering::SeqCst);
                        false
                    }
                }
            }
        } else {
            false
        };

        self.shared.in_flight.fetch_sub(1, Ordering::SeqCst);
        queued
    }
}

// ---------------------------------------------------------------------------
// BlockConsumer
// ---------------------------------------------------------------------------

/// Consumer half, owned by the capture session.
pub struct BlockConsumer {
    inner: HeapCons<AudioBlock>,
    spare: HeapProd<Vec<u8>>,
    shared: Arc<Shared>,
    capacity: usize,
}

impl BlockConsumer {
    /// Pop the oldest queued block.
    pub fn try_recv(&mut self) -> Option<AudioBlock> {
        self.inner.try_pop()
    }

    /// Pop every queued block, oldest first.
    pub fn drain(&mut self) -> Vec<AudioBlock> {
        let mut blocks = Vec::with_capacity(self.len());
        while let Some(block) = self.inner.try_pop() {
            blocks.push(block);
        }
        blocks
    }

    /// Hand a consumed block's buffer back to the producer for reuse.
    ///
    /// The buffer is simply freed when the spare ring is already full.
    pub fn recycle(&mut self, block: AudioBlock) {
        let _ = self.spare.try_push(block.into_bytes());
    }

    /// Blocks currently waiting to be read.
    pub fn len(&self) -> usize {
        self.inner.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of the counters.  Safe to call while deliveries are in
    /// progress: `blocks_dropped <= blocks_received` always holds.
    pub fn summary(&self) -> CaptureSummary {
        let blocks_dropped = self.shared.dropped.load(Ordering::SeqCst);
        let blocks_received = self.shared.received.load(Ordering::SeqCst);
        CaptureSummary {
            blocks_received,
            bytes_received: self.shared.bytes.load(Ordering::SeqCst),
            blocks_dropped,
        }
    }

    /// Whether the producer still accepts deliveries.
    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::SeqCst)
    }

    /// Refuse further deliveries and wait for any in-flight one to finish.
    ///
    /// After this returns no block is enqueued and no counter changes.
    /// Queued blocks stay readable.
    pub fn close(&self) {
        self.shared.open.store(false, Ordering::SeqCst);
        while self.shared.in_flight.load(Ordering::SeqCst) != 0 {
            std::thread::yield_now();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
