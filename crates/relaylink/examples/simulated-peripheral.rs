//! Simulated relay peripheral on an in-memory link.
//!
//! A device thread answers `GET_STATS` and `SET_OUTPUT` messages while the
//! host toggles a few outputs and reads the resulting state back.
//!
//! Run with:
//!   cargo run --example simulated-peripheral

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use relaylink::frame::Session;
use relaylink::transport::MemoryStream;
use relaylink::{Message, MessageType};

const RESPONSE_WAIT: Duration = Duration::from_secs(2);

fn run_device(end: MemoryStream, stop: Arc<AtomicBool>) -> Result<(), relaylink::MessageError> {
    let mut device = Session::new(end);
    let mut outputs: u8 = 0;

    while !stop.load(Ordering::Relaxed) {
        let frame = match device.decode() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                thread::sleep(Duration::from_millis(1));
                continue;
            }
            Err(e) if e.is_frame_local() => {
                eprintln!("device: dropped frame: {e}");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let request = match Message::read_from(device.incoming()) {
            Ok(request) => request,
            Err(e) => {
                eprintln!("device: ignoring frame of {} pairs: {e}", frame.pair_count());
                continue;
            }
        };

        match request.kind() {
            MessageType::SetOutput => {
                if let Some((output, active)) = request.as_set_output() {
                    if output < 8 {
                        if active {
                            outputs |= 1 << output;
                        } else {
                            outputs &= !(1 << output);
                        }
                    }
                    eprintln!("device: output {output} -> {active}");
                }
            }
            MessageType::GetStats => {
                Message::new(MessageType::GetStats, vec![outputs])?.send(&mut device)?;
            }
            MessageType::Test => {
                Message::new(MessageType::Test, request.body().to_vec())?.send(&mut device)?;
            }
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (host_end, device_end) = MemoryStream::pair();
    let stop = Arc::new(AtomicBool::new(false));
    let device = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || run_device(device_end, stop))
    };

    let mut host = Session::new(host_end);
    for (output, active) in [(0, true), (3, true), (0, false), (5, true)] {
        Message::set_output(output, active).send(&mut host)?;
    }

    Message::get_stats().send(&mut host)?;
    host.wait_for_frame(RESPONSE_WAIT)?;
    let stats = Message::read_from(host.incoming())?;
    println!("outputs: {:#010b}", stats.output_mask().unwrap_or_default());

    stop.store(true, Ordering::Relaxed);
    if let Ok(result) = device.join() {
        result?;
    }
    Ok(())
}
