//! Frame encoding and decoding for the host register link.
//!
//! Frame format:
//! - TYPE (1 byte): message type (read command, write command, event);
//!   replies echo the command type, with bit 3 set on rejection
//! - LENGTH (1 byte): number of bytes that follow, checksum included
//! - ADDRESS (1 byte): register address
//! - PORT (1 byte): always 0xFF for a directly attached device
//! - PAYLOAD TYPE (1 byte): element type, sign flag in bit 7
//! - PAYLOAD (0-8 bytes): little-endian element data (empty for reads)
//! - CHECKSUM (1 byte): wrapping sum of every preceding byte

use heapless::Vec;

use crate::registers::PayloadType;

/// Maximum payload size in bytes (largest register element)
pub const MAX_PAYLOAD_SIZE: usize = 8;

/// Maximum complete frame size
pub const MAX_FRAME_SIZE: usize = 1 + 1 + 1 + 1 + 1 + MAX_PAYLOAD_SIZE + 1;

/// Port byte for a directly attached device
pub const PORT_DEVICE: u8 = 0xFF;

/// Bit set in the TYPE byte of a rejection reply
pub const ERROR_FLAG: u8 = 1 << 3;

/// Message types on the host link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageType {
    /// Host requests the current value of a register
    Read = 1,
    /// Host writes a value to a register
    Write = 2,
    /// Device-originated register change
    Event = 3,
}

impl MessageType {
    /// Decode a TYPE byte, ignoring the error flag
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte & !ERROR_FLAG {
            1 => Some(MessageType::Read),
            2 => Some(MessageType::Write),
            3 => Some(MessageType::Event),
            _ => None,
        }
    }
}

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Checksum mismatch
    InvalidChecksum,
    /// Unknown TYPE byte or inconsistent length
    InvalidFrame,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message type
    pub msg_type: MessageType,
    /// Whether the error flag was set (rejection replies)
    pub is_error: bool,
    /// Register address
    pub address: u8,
    /// Payload type byte as received (see [`PayloadType::wire_byte`])
    pub payload_type: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame with the given payload
    pub fn new(
        msg_type: MessageType,
        address: u8,
        payload_type: PayloadType,
        payload: &[u8],
    ) -> Result<Self, FrameError> {
        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;

        Ok(Self {
            msg_type,
            is_error: false,
            address,
            payload_type: payload_type.wire_byte(),
            payload: payload_vec,
        })
    }

    /// Create a payload-less read request
    pub fn read_request(address: u8, payload_type: PayloadType) -> Self {
        Self {
            msg_type: MessageType::Read,
            is_error: false,
            address,
            payload_type: payload_type.wire_byte(),
            payload: Vec::new(),
        }
    }

    /// Create a rejection reply for a command frame
    ///
    /// The reply echoes the command's type and address with the error flag
    /// set and no payload.
    pub fn rejection(command: &Frame) -> Self {
        Self {
            msg_type: command.msg_type,
            is_error: true,
            address: command.address,
            payload_type: command.payload_type,
            payload: Vec::new(),
        }
    }

    fn type_byte(&self) -> u8 {
        let base = self.msg_type as u8;
        if self.is_error {
            base | ERROR_FLAG
        } else {
            base
        }
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written.
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        // TYPE + LENGTH + ADDRESS + PORT + PAYLOAD_TYPE + payload + CHECKSUM
        let frame_len = 6 + self.payload.len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        // LENGTH counts everything after itself, checksum included
        let length = (4 + self.payload.len()) as u8;

        buffer[0] = self.type_byte();
        buffer[1] = length;
        buffer[2] = self.address;
        buffer[3] = PORT_DEVICE;
        buffer[4] = self.payload_type;
        buffer[5..5 + self.payload.len()].copy_from_slice(&self.payload);

        let checksum = checksum_of(&buffer[..frame_len - 1]);
        buffer[frame_len - 1] = checksum;

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(vec)
    }
}

fn checksum_of(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

/// State machine for parsing incoming frames
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    msg_type: u8,
    remaining: u8,
    header: [u8; 3],
    header_len: u8,
    payload: Vec<u8, MAX_PAYLOAD_SIZE>,
    running_sum: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for a known TYPE byte
    WaitingForType,
    /// Got TYPE, waiting for LENGTH
    WaitingForLength,
    /// Reading ADDRESS, PORT, PAYLOAD TYPE
    ReadingHeader,
    /// Reading payload bytes
    ReadingPayload,
    /// Waiting for CHECKSUM
    WaitingForChecksum,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a new frame parser
    pub fn new() -> Self {
        Self {
            state: ParseState::WaitingForType,
            msg_type: 0,
            remaining: 0,
            header: [0; 3],
            header_len: 0,
            payload: Vec::new(),
            running_sum: 0,
        }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForType;
        self.msg_type = 0;
        self.remaining = 0;
        self.header = [0; 3];
        self.header_len = 0;
        self.payload.clear();
        self.running_sum = 0;
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on parse error.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        match self.state {
            ParseState::WaitingForType => {
                if MessageType::from_byte(byte).is_some() {
                    self.msg_type = byte;
                    self.running_sum = byte;
                    self.state = ParseState::WaitingForLength;
                }
                // Silently ignore unknown bytes while resynchronizing
                Ok(None)
            }
            ParseState::WaitingForLength => {
                // LENGTH covers address, port, payload type and checksum at
                // minimum; anything shorter or over-long cannot be a frame
                if byte < 4 || byte as usize > 4 + MAX_PAYLOAD_SIZE {
                    self.reset();
                    return Err(FrameError::InvalidFrame);
                }
                self.remaining = byte;
                self.running_sum = self.running_sum.wrapping_add(byte);
                self.state = ParseState::ReadingHeader;
                Ok(None)
            }
            ParseState::ReadingHeader => {
                self.header[self.header_len as usize] = byte;
                self.header_len += 1;
                self.remaining -= 1;
                self.running_sum = self.running_sum.wrapping_add(byte);
                if self.header_len == 3 {
                    if self.remaining == 1 {
                        self.state = ParseState::WaitingForChecksum;
                    } else {
                        self.state = ParseState::ReadingPayload;
                    }
                }
                Ok(None)
            }
            ParseState::ReadingPayload => {
                // Length was bounds-checked, push cannot fail
                let _ = self.payload.push(byte);
                self.remaining -= 1;
                self.running_sum = self.running_sum.wrapping_add(byte);
                if self.remaining == 1 {
                    self.state = ParseState::WaitingForChecksum;
                }
                Ok(None)
            }
            ParseState::WaitingForChecksum => {
                let expected = self.running_sum;

                if byte != expected {
                    self.reset();
                    return Err(FrameError::InvalidChecksum);
                }

                // TYPE byte was validated on entry
                let msg_type = match MessageType::from_byte(self.msg_type) {
                    Some(t) => t,
                    None => {
                        self.reset();
                        return Err(FrameError::InvalidFrame);
                    }
                };

                let frame = Frame {
                    msg_type,
                    is_error: self.msg_type & ERROR_FLAG != 0,
                    address: self.header[0],
                    payload_type: self.header[2],
                    payload: self.payload.clone(),
                };

                self.reset();
                Ok(Some(frame))
            }
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame found, if any.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Frame>, FrameError> {
        for &byte in bytes {
            if let Some(frame) = self.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_read_request_encode() {
        let frame = Frame::read_request(0x29, PayloadType::U8);
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = frame.encode(&mut buffer).unwrap();

        assert_eq!(len, 6);
        assert_eq!(buffer[0], 1); // read
        assert_eq!(buffer[1], 4); // address + port + payload type + checksum
        assert_eq!(buffer[2], 0x29);
        assert_eq!(buffer[3], PORT_DEVICE);
        assert_eq!(buffer[4], 0x01); // u8
    }

    #[test]
    fn test_frame_roundtrip() {
        let original = Frame::new(
            MessageType::Write,
            0x21,
            PayloadType::I32,
            &[0xE8, 0x03, 0x00, 0x00],
        )
        .unwrap();
        let encoded = original.encode_to_vec().unwrap();

        let mut parser = FrameParser::new();
        let parsed = parser.feed_bytes(&encoded).unwrap().unwrap();

        assert_eq!(parsed, original);
    }

    #[test]
    fn test_parser_invalid_checksum() {
        let frame = Frame::read_request(0x20, PayloadType::U8);
        let mut encoded = frame.encode_to_vec().unwrap();
        let last = encoded.len() - 1;
        encoded[last] ^= 0xFF;

        let mut parser = FrameParser::new();
        assert_eq!(
            parser.feed_bytes(&encoded),
            Err(FrameError::InvalidChecksum)
        );
    }

    #[test]
    fn test_parser_resync_after_garbage() {
        let frame = Frame::read_request(0x26, PayloadType::I16);
        let encoded = frame.encode_to_vec().unwrap();

        let mut data = Vec::<u8, 20>::new();
        data.extend_from_slice(&[0x00, 0x7F, 0xFE]).unwrap();
        data.extend_from_slice(&encoded).unwrap();

        let mut parser = FrameParser::new();
        let parsed = parser.feed_bytes(&data).unwrap().unwrap();
        assert_eq!(parsed.address, 0x26);
    }

    #[test]
    fn test_parser_rejects_bad_length() {
        let mut parser = FrameParser::new();
        assert_eq!(parser.feed(1), Ok(None)); // read
        assert_eq!(parser.feed(2), Err(FrameError::InvalidFrame)); // too short
    }

    #[test]
    fn test_rejection_reply() {
        let command = Frame::new(MessageType::Write, 0x22, PayloadType::U16, &[0x01, 0x00])
            .unwrap();
        let reply = Frame::rejection(&command);

        let encoded = reply.encode_to_vec().unwrap();
        assert_eq!(encoded[0], 2 | ERROR_FLAG);

        let mut parser = FrameParser::new();
        let parsed = parser.feed_bytes(&encoded).unwrap().unwrap();
        assert!(parsed.is_error);
        assert_eq!(parsed.msg_type, MessageType::Write);
        assert!(parsed.payload.is_empty());
    }

    #[test]
    fn test_parser_after_error_recovers() {
        let mut parser = FrameParser::new();
        assert_eq!(parser.feed(2), Ok(None));
        assert_eq!(parser.feed(0), Err(FrameError::InvalidFrame));

        // A valid frame right after the error parses cleanly
        let frame = Frame::read_request(0x28, PayloadType::U8);
        let encoded = frame.encode_to_vec().unwrap();
        let parsed = parser.feed_bytes(&encoded).unwrap().unwrap();
        assert_eq!(parsed.address, 0x28);
    }

    proptest! {
        /// Every well-formed frame survives the wire, whatever the address
        /// or payload bytes, even with leading line noise.
        #[test]
        fn prop_frame_survives_encode_and_parse(
            address: u8,
            type_idx in 0usize..4,
            payload in proptest::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD_SIZE),
            noise in proptest::collection::vec(12u8..=0xFF, 0..4),
        ) {
            let payload_types = [
                PayloadType::U8,
                PayloadType::U16,
                PayloadType::I16,
                PayloadType::I32,
            ];
            let frame = Frame::new(
                MessageType::Write,
                address,
                payload_types[type_idx],
                &payload,
            )
            .unwrap();
            let encoded = frame.encode_to_vec().unwrap();

            let mut parser = FrameParser::new();
            // No byte at or above 12 decodes to a TYPE, error flag included
            for &byte in &noise {
                prop_assert_eq!(parser.feed(byte), Ok(None));
            }
            let parsed = parser.feed_bytes(&encoded).unwrap().unwrap();
            prop_assert_eq!(parsed, frame);
        }
    }
}
