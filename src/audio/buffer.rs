//! # Frame Accumulator
//!
//! The AI provider wants audio in reasonably sized frames rather than the
//! 20ms dribble the telephony leg delivers, so converted PCM16 bytes are
//! accumulated here until a full frame is available. The threshold bounds how
//! often small sends are made while capping added latency at one frame's
//! worth of audio.
//!
//! Owned exclusively by the inbound direction of one session; the outbound
//! direction forwards provider chunks as-is.

/// Default frame threshold: ~300ms of 16-bit PCM at 16kHz.
pub const DEFAULT_FRAME_THRESHOLD: usize = 9600;

/// Growable byte accumulator with a minimum-frame threshold.
#[derive(Debug)]
pub struct FrameBuffer {
    data: Vec<u8>,
    threshold: usize,
}

impl FrameBuffer {
    /// Create a buffer that emits frames of exactly `threshold` bytes.
    pub fn new(threshold: usize) -> Self {
        Self {
            data: Vec::with_capacity(threshold),
            threshold,
        }
    }

    /// Append converted audio bytes to the accumulator.
    pub fn push(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Take one full frame if enough audio has accumulated.
    ///
    /// Returns `None` below the threshold. Once the threshold is reached,
    /// exactly `threshold` bytes are removed and returned; any remainder
    /// stays buffered for the next drain.
    pub fn drain(&mut self) -> Option<Vec<u8>> {
        if self.data.len() < self.threshold {
            return None;
        }
        Some(self.data.drain(..self.threshold).collect())
    }

    /// Number of buffered bytes not yet emitted.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Discard any partial frame (used at session teardown).
    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_threshold_never_drains() {
        let mut buffer = FrameBuffer::new(100);
        buffer.push(&[0u8; 40]);
        buffer.push(&[0u8; 59]);
        assert!(buffer.drain().is_none());
        assert_eq!(buffer.len(), 99);
    }

    #[test]
    fn test_crossing_threshold_drains_once_and_keeps_remainder() {
        let mut buffer = FrameBuffer::new(100);
        buffer.push(&[1u8; 90]);
        buffer.push(&[2u8; 30]);

        let frame = buffer.drain().expect("threshold crossed");
        assert_eq!(frame.len(), 100);
        assert_eq!(&frame[..90], &[1u8; 90][..]);
        assert_eq!(&frame[90..], &[2u8; 10][..]);

        // The 20-byte remainder waits for the next threshold crossing.
        assert!(buffer.drain().is_none());
        assert_eq!(buffer.len(), 20);
    }

    #[test]
    fn test_large_push_yields_multiple_frames() {
        let mut buffer = FrameBuffer::new(100);
        buffer.push(&[3u8; 250]);

        assert_eq!(buffer.drain().map(|f| f.len()), Some(100));
        assert_eq!(buffer.drain().map(|f| f.len()), Some(100));
        assert!(buffer.drain().is_none());
        assert_eq!(buffer.len(), 50);
    }

    #[test]
    fn test_clear_discards_partial_frame() {
        let mut buffer = FrameBuffer::new(100);
        buffer.push(&[4u8; 60]);
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
