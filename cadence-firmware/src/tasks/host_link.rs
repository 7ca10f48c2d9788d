//! Host register link tasks
//!
//! The RX task parses command frames and dispatches register reads and
//! writes against the device; the TX task serializes replies and
//! device-originated events onto the same UART.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embedded_io_async::{Read, Write};

use cadence_core::events::Event;
use cadence_protocol::frame::{Frame, FrameParser, MessageType};
use cadence_protocol::registers::{PayloadType, RegisterAddress, Value};

use crate::channels::{with_device, SharedDevice, EVENT_CHANNEL, REPLY_CHANNEL};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Host RX task - receives and dispatches command frames
#[embassy_executor::task]
pub async fn host_rx_task(mut rx: BufferedUartRx, device: &'static SharedDevice) {
    info!("Host RX task started");

    let mut parser = FrameParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                for &byte in &buf[..n] {
                    match parser.feed(byte) {
                        Ok(Some(frame)) => {
                            let reply = dispatch(device, &frame);
                            REPLY_CHANNEL.send(reply).await;
                        }
                        Ok(None) => {
                            // Need more bytes
                        }
                        Err(e) => {
                            warn!("Host frame error: {:?}", e);
                        }
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Host UART read error: {:?}", e);
            }
        }
    }
}

/// Host TX task - sends replies and events
#[embassy_executor::task]
pub async fn host_tx_task(mut tx: BufferedUartTx) {
    info!("Host TX task started");

    loop {
        let frame = match select(REPLY_CHANNEL.receive(), EVENT_CHANNEL.receive()).await {
            Either::First(reply) => Some(reply),
            Either::Second(event) => event_frame(event),
        };

        let Some(frame) = frame else { continue };
        match frame.encode_to_vec() {
            Ok(bytes) => {
                if let Err(e) = tx.write_all(&bytes).await {
                    warn!("Host UART write error: {:?}", e);
                }
            }
            Err(e) => {
                warn!("Frame encode error: {:?}", e);
            }
        }
    }
}

/// Execute a command frame against the device, producing the reply
fn dispatch(device: &'static SharedDevice, command: &Frame) -> Frame {
    let Some(address) = RegisterAddress::from_address(command.address) else {
        warn!("Unknown register 0x{:02x}", command.address);
        return Frame::rejection(command);
    };

    match command.msg_type {
        MessageType::Read => {
            let value = with_device(device, |dev| dev.read_register(address));
            match value_frame(MessageType::Read, address, value) {
                Some(reply) => reply,
                None => Frame::rejection(command),
            }
        }
        MessageType::Write => {
            let Some(wire_type) = PayloadType::from_wire_byte(command.payload_type) else {
                return Frame::rejection(command);
            };
            if wire_type != address.payload_type() {
                warn!("Type mismatch writing {:?}", address);
                return Frame::rejection(command);
            }
            let value = match Value::decode(wire_type, &command.payload) {
                Ok(value) => value,
                Err(e) => {
                    warn!("Bad payload for {:?}: {:?}", address, e);
                    return Frame::rejection(command);
                }
            };

            match with_device(device, |dev| dev.write_register(address, value)) {
                Ok(()) => {
                    // Write acks echo the accepted value
                    match Frame::new(
                        MessageType::Write,
                        command.address,
                        address.payload_type(),
                        &command.payload,
                    ) {
                        Ok(reply) => reply,
                        Err(_) => Frame::rejection(command),
                    }
                }
                Err(e) => {
                    warn!("Write to {:?} rejected: {:?}", address, e);
                    Frame::rejection(command)
                }
            }
        }
        // Hosts never originate events
        MessageType::Event => Frame::rejection(command),
    }
}

/// Frame carrying a register value
fn value_frame(msg_type: MessageType, address: RegisterAddress, value: Value) -> Option<Frame> {
    let mut payload = [0u8; 8];
    let len = value.encode(&mut payload).ok()?;
    Frame::new(msg_type, address.address(), address.payload_type(), &payload[..len]).ok()
}

/// Frame announcing a device-originated event
fn event_frame(event: Event) -> Option<Frame> {
    value_frame(MessageType::Event, event.register(), event.value())
}
