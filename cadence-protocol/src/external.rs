//! Parsers for the auxiliary external-control serial input.
//!
//! Both board variants accept motor commands on a second UART, but they
//! disagree on the wire format. The difference is kept as variant
//! configuration rather than merged:
//!
//! - **Single byte** (VestibularVrH2): every received byte is published as
//!   an analog-input sample, zero-extended to 16 bits.
//! - **Two byte little-endian** (FastStepper): bytes are paired into a
//!   signed 16-bit interval for the immediate-pulse generator. A guard
//!   timeout between the bytes of a pair restarts the pairing, so a lost
//!   byte cannot shift every following command by one.

/// Default inter-byte timeout for two-byte pairing, in milliseconds
pub const PAIR_TIMEOUT_MS: u32 = 20;

/// Single-byte parser: each byte is a complete sample
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleByteParser;

impl SingleByteParser {
    /// Feed one received byte; always yields a value
    pub fn feed(&mut self, byte: u8) -> Option<i16> {
        Some(byte as i16)
    }
}

/// Two-byte little-endian parser with an inter-byte timeout guard
#[derive(Debug, Clone)]
pub struct TwoByteLeParser {
    pending_low: Option<u8>,
    low_received_ms: u32,
    timeout_ms: u32,
}

impl TwoByteLeParser {
    /// Create a parser with the given inter-byte timeout
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            pending_low: None,
            low_received_ms: 0,
            timeout_ms,
        }
    }

    /// Feed one received byte at the given monotonic time
    ///
    /// Returns the assembled value when a pair completes. A byte arriving
    /// more than the timeout after a pending low byte restarts the pair
    /// (the stale low byte is discarded and the new byte becomes the low
    /// half).
    pub fn feed(&mut self, byte: u8, now_ms: u32) -> Option<i16> {
        if let Some(low) = self.pending_low {
            if now_ms.wrapping_sub(self.low_received_ms) <= self.timeout_ms {
                self.pending_low = None;
                return Some(i16::from_le_bytes([low, byte]));
            }
            // Stale pair; this byte starts a new one
        }

        self.pending_low = Some(byte);
        self.low_received_ms = now_ms;
        None
    }
}

impl Default for TwoByteLeParser {
    fn default() -> Self {
        Self::new(PAIR_TIMEOUT_MS)
    }
}

/// Variant-selected external-control parser
#[derive(Debug, Clone)]
pub enum ExternalParser {
    /// One byte per sample (VestibularVrH2)
    SingleByte(SingleByteParser),
    /// Little-endian pairs with timeout guard (FastStepper)
    TwoByteLe(TwoByteLeParser),
}

impl ExternalParser {
    /// Feed one received byte at the given monotonic time
    pub fn feed(&mut self, byte: u8, now_ms: u32) -> Option<i16> {
        match self {
            ExternalParser::SingleByte(p) => p.feed(byte),
            ExternalParser::TwoByteLe(p) => p.feed(byte, now_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_byte_passthrough() {
        let mut parser = SingleByteParser;
        assert_eq!(parser.feed(0x00), Some(0));
        assert_eq!(parser.feed(0x7F), Some(127));
        // Bytes are zero-extended, not sign-extended
        assert_eq!(parser.feed(0xFF), Some(255));
    }

    #[test]
    fn test_two_byte_pairing() {
        let mut parser = TwoByteLeParser::new(20);
        assert_eq!(parser.feed(0xE8, 0), None);
        assert_eq!(parser.feed(0x03, 5), Some(1000));
    }

    #[test]
    fn test_two_byte_negative_value() {
        let mut parser = TwoByteLeParser::new(20);
        assert_eq!(parser.feed(0x18, 0), None);
        assert_eq!(parser.feed(0xFC, 1), Some(-1000));
    }

    #[test]
    fn test_timeout_restarts_pair() {
        let mut parser = TwoByteLeParser::new(20);
        assert_eq!(parser.feed(0x34, 0), None);
        // Arrives too late to be the high byte; becomes a new low byte
        assert_eq!(parser.feed(0x12, 100), None);
        assert_eq!(parser.feed(0x00, 105), Some(0x12));
    }

    #[test]
    fn test_boundary_timing_accepted() {
        let mut parser = TwoByteLeParser::new(20);
        assert_eq!(parser.feed(0x01, 0), None);
        assert_eq!(parser.feed(0x00, 20), Some(1));
    }

    #[test]
    fn test_consecutive_pairs() {
        let mut parser = TwoByteLeParser::new(20);
        assert_eq!(parser.feed(0x10, 0), None);
        assert_eq!(parser.feed(0x00, 1), Some(0x10));
        assert_eq!(parser.feed(0x20, 2), None);
        assert_eq!(parser.feed(0x00, 3), Some(0x20));
    }
}
