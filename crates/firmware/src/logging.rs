//! Application serial log
//!
//! Trace lines are formatted into [`LOG`] from any context and drained onto
//! the UART from the main loop by [`pump`]. On a fault the crash session
//! flushes and closes [`LOG`] before it reprograms the UART, so nothing
//! queued here can interleave with the transcript.

use crashdump::Tracer;
use heapless::Vec;
use platform::{BufferedLogChannel, ByteSink, LogWriter, TickCounter};

use crate::board::LOG_CAPACITY;

/// Bytes moved per UART burst while draining.
const PUMP_BURST: usize = 32;

/// Queue between trace formatting and the UART.
pub static LOG: BufferedLogChannel<LOG_CAPACITY> = BufferedLogChannel::new();

/// Milliseconds since boot, advanced by SysTick.
pub static UPTIME: TickCounter = TickCounter::new();

/// Tracer writing into [`LOG`], stamped by [`UPTIME`], reporting [`LOG`]'s
/// depth.
pub type AppTracer = Tracer<
    LogWriter<'static, LOG_CAPACITY>,
    &'static TickCounter,
    &'static BufferedLogChannel<LOG_CAPACITY>,
>;

/// A tracer onto the application log.
pub fn tracer() -> AppTracer {
    Tracer::new(LOG.writer(), &UPTIME, &LOG)
}

/// Move up to `budget` queued bytes from `channel` to `sink`.
///
/// Returns the number of bytes sent.
pub fn pump<const N: usize, S: ByteSink>(
    channel: &BufferedLogChannel<N>,
    sink: &mut S,
    budget: usize,
) -> usize {
    let mut sent = 0usize;
    while sent < budget {
        let mut burst: Vec<u8, PUMP_BURST> = Vec::new();
        while burst.len() < PUMP_BURST && sent.saturating_add(burst.len()) < budget {
            match channel.pop() {
                Some(byte) => {
                    // Bounded by the loop condition.
                    let _ = burst.push(byte);
                }
                None => break,
            }
        }
        if burst.is_empty() {
            break;
        }
        sink.put_bytes(&burst);
        sent = sent.saturating_add(burst.len());
    }
    sent
}
