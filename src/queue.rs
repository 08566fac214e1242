//! Bounded text queue between the wireless write path and the typist.
//!
//! The wireless stack pushes whole text writes; the dispatcher pops one
//! character per pacing interval. The ring is a `heapless::spsc::Queue`:
//! the write index is only advanced by the [`TextWriter`], the read index
//! only by the [`TextReader`], and both are atomics, so the two halves
//! may live on different execution contexts.
//!
//! Ring of `N` slots, one reserved so that `head == tail` always means
//! empty: at most `N - 1` characters are pending. When the ring fills up
//! the rest of the write is dropped. No error goes back to the peer and
//! nothing is retried.

use heapless::spsc::{Consumer, Producer, Queue};
use heapless::String;

use crate::config::TEXT_PREVIEW_LEN;

/// Iterator over the relayable bytes of a text write.
///
/// Only 7-bit ASCII is relayed: printable characters, `\n` and `\t`.
/// A UTF-8 lead byte skips its whole sequence; carriage returns and
/// other control bytes are dropped.
#[derive(Clone, Debug)]
pub struct AsciiFilter<'a> {
    bytes: &'a [u8],
    pos: usize,
}

/// Filter a raw text write down to the characters that will be typed.
pub fn filter_text(bytes: &[u8]) -> AsciiFilter<'_> {
    AsciiFilter { bytes, pos: 0 }
}

/// First characters of a text write, for the status display.
pub fn text_preview(bytes: &[u8]) -> String<TEXT_PREVIEW_LEN> {
    let mut preview = String::new();
    for c in filter_text(bytes).take(TEXT_PREVIEW_LEN) {
        let _ = preview.push(c as char);
    }
    preview
}

/// Continuation bytes following a UTF-8 lead byte.
const fn utf8_continuations(lead: u8) -> usize {
    if lead & 0xE0 == 0xC0 {
        1
    } else if lead & 0xF0 == 0xE0 {
        2
    } else if lead & 0xF8 == 0xF0 {
        3
    } else {
        0
    }
}

const fn is_relayable(b: u8) -> bool {
    matches!(b, b'\n' | b'\t' | 0x20..=0x7E)
}

impl Iterator for AsciiFilter<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        while let Some(&b) = self.bytes.get(self.pos) {
            self.pos += 1;
            if b >= 0x80 {
                self.pos += utf8_continuations(b);
                continue;
            }
            if is_relayable(b) {
                return Some(b);
            }
        }
        None
    }
}

/// Backing storage for the text ring. Split once into its two halves.
pub struct TextQueue<const N: usize> {
    ring: Queue<u8, N>,
}

impl<const N: usize> TextQueue<N> {
    pub const fn new() -> Self {
        Self { ring: Queue::new() }
    }

    /// Split into the producer half (wireless writes) and the consumer
    /// half (dispatcher).
    pub fn split(&mut self) -> (TextWriter<'_, N>, TextReader<'_, N>) {
        let (producer, consumer) = self.ring.split();
        (TextWriter { producer }, TextReader { consumer })
    }
}

impl<const N: usize> Default for TextQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer half, owned by the wireless write handler.
pub struct TextWriter<'a, const N: usize> {
    producer: Producer<'a, u8, N>,
}

impl<const N: usize> TextWriter<'_, N> {
    /// Filter `raw` and append it to the ring.
    ///
    /// Returns how many characters were queued; anything past the point
    /// where the ring filled up is discarded.
    pub fn enqueue_text(&mut self, raw: &[u8]) -> usize {
        let mut filtered = filter_text(raw);
        let mut queued = 0;

        while let Some(c) = filtered.next() {
            if self.producer.enqueue(c).is_err() {
                let _dropped = 1 + filtered.by_ref().count();
                #[cfg(feature = "defmt")]
                defmt::warn!("Text queue full - dropped {} chars", _dropped);
                break;
            }
            queued += 1;
        }

        #[cfg(feature = "defmt")]
        if queued > 0 {
            defmt::info!(
                "Text queued: {} chars (queue: {}/{})",
                queued,
                self.producer.len(),
                self.producer.capacity()
            );
        }

        queued
    }
}

/// Consumer half, owned by the dispatcher.
pub struct TextReader<'a, const N: usize> {
    consumer: Consumer<'a, u8, N>,
}

impl<const N: usize> TextReader<'_, N> {
    /// Pop the oldest pending character. The caller owns the pacing gate.
    pub fn dequeue_one(&mut self) -> Option<u8> {
        self.consumer.dequeue()
    }

    /// Characters currently pending.
    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Usable capacity (`N - 1`).
    pub fn capacity(&self) -> usize {
        self.consumer.capacity()
    }
}
