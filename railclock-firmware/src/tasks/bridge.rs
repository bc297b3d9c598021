//! Wireless bridge UART task
//!
//! Receives requests from the bridge module, applies them through the
//! command interface and answers every one of them.

use defmt::*;
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embedded_io_async::{Read, Write};

use railclock_core::clock::{CommandInterface, CommandOutcome};
use railclock_hal_rp2040::UptimeClock;
use railclock_protocol::{BridgeRequest, ClockReply, Frame, FrameDecoder, MessageError};

use crate::channels::{Link, CLOCK_STATE, HOUR_AXIS, MINUTE_AXIS, WALL_CLOCK};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

type Interface = CommandInterface<'static, Link, Link, UptimeClock>;

/// Bridge task - decodes requests and sends replies
#[embassy_executor::task]
pub async fn bridge_task(mut rx: BufferedUartRx, mut tx: BufferedUartTx) {
    info!("Bridge task started");

    let interface = CommandInterface::new(&HOUR_AXIS, &MINUTE_AXIS, &WALL_CLOCK, &CLOCK_STATE);
    let mut decoder = FrameDecoder::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        let n = match rx.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("UART read error: {:?}", e);
                decoder.reset();
                continue;
            }
        };
        trace!("RX: {} bytes", n);

        for &byte in &buf[..n] {
            match decoder.push(byte) {
                Ok(Some(frame)) => {
                    let (reply, restart) = respond(&interface, &frame);
                    send(&mut tx, reply).await;
                    if restart {
                        warn!("Restart requested over the bridge");
                        cortex_m::peripheral::SCB::sys_reset();
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("Frame error: {:?}", e),
            }
        }
    }
}

/// Apply one request; returns the reply and whether to restart after it
fn respond(interface: &Interface, frame: &Frame) -> (ClockReply, bool) {
    let request = match BridgeRequest::from_frame(frame) {
        Ok(request) => request,
        Err(e) => {
            warn!("Bad request: {:?}", e);
            let kind = match e {
                MessageError::UnknownKind(kind) | MessageError::BadPayload { kind, .. } => kind,
            };
            return (ClockReply::Nack(kind), false);
        }
    };
    debug!("Request: {:?}", request);

    let kind = request.kind();
    match request {
        BridgeRequest::SetTime(epoch) => {
            if interface.on_time_set(epoch) {
                info!("Time set to {}", epoch);
                (ClockReply::Ack(kind), false)
            } else {
                warn!("Time set refused in {:?}", interface.state());
                (ClockReply::Nack(kind), false)
            }
        }
        BridgeRequest::Command(code) => match interface.on_command(code) {
            CommandOutcome::RestartRequested => (ClockReply::Ack(kind), true),
            CommandOutcome::Stopped => {
                error!("Emergency stop");
                (ClockReply::Ack(kind), false)
            }
            CommandOutcome::Unknown(code) => {
                warn!("Unknown command {}", code);
                (ClockReply::Nack(kind), false)
            }
        },
        BridgeRequest::ReadTime => (ClockReply::Time(interface.current_epoch().unwrap_or(0)), false),
        BridgeRequest::ReadState => (ClockReply::State(interface.state().code()), false),
    }
}

/// Write one reply frame and wait until it has left the buffer
async fn send(tx: &mut BufferedUartTx, reply: ClockReply) {
    let bytes = reply.to_frame().to_bytes();
    if let Err(e) = tx.write_all(&bytes).await {
        warn!("UART write error: {:?}", e);
        return;
    }
    if let Err(e) = tx.flush().await {
        warn!("UART flush error: {:?}", e);
    }
}
