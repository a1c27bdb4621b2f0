//! Simulated register file for host tests
//!
//! Stores every write and models the one behaviour the polled transmitter
//! relies on: a write to `TXD` while the transmitter is running completes
//! at once and raises `EVENTS_TXDRDY`. Transmitted bytes are captured.

use heapless::{LinearMap, Vec};

use super::nrf5;
use super::RegisterBlock;

/// Distinct register offsets remembered.
const SLOTS: usize = 48;

/// In-memory stand-in for a UART (or GPIO) register block.
///
/// `N` is the capacity of the transmit capture.
pub struct SimulatedRegisters<const N: usize> {
    regs: LinearMap<usize, u32, SLOTS>,
    tx: Vec<u8, N>,
    tx_running: bool,
    bursts: u32,
    stray_writes: u32,
    overflow: u32,
}

impl<const N: usize> SimulatedRegisters<N> {
    /// All registers zero, transmitter stopped.
    pub fn new() -> Self {
        Self {
            regs: LinearMap::new(),
            tx: Vec::new(),
            tx_running: false,
            bursts: 0,
            stray_writes: 0,
            overflow: 0,
        }
    }

    /// Bytes written to `TXD` while the UART was enabled and transmitting.
    pub fn transmitted(&self) -> &[u8] {
        &self.tx
    }

    /// Number of `TASKS_STARTTX` triggers.
    pub fn bursts(&self) -> u32 {
        self.bursts
    }

    /// `TXD` writes that real hardware would never have completed
    /// (UART disabled or transmitter stopped).
    pub fn stray_writes(&self) -> u32 {
        self.stray_writes
    }

    /// Transmitted bytes that did not fit the `N`-byte capture.
    pub fn overflow(&self) -> u32 {
        self.overflow
    }

    /// Last value written at `offset` (zero if never written).
    pub fn value(&self, offset: usize) -> u32 {
        self.regs.get(&offset).copied().unwrap_or(0)
    }

    fn store(&mut self, offset: usize, value: u32) {
        // Running out of slots means a test touched an unexpected register;
        // the write is dropped and shows up as a wrong value.
        let _ = self.regs.insert(offset, value);
    }
}

impl<const N: usize> Default for SimulatedRegisters<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RegisterBlock for SimulatedRegisters<N> {
    fn read(&self, offset: usize) -> u32 {
        self.value(offset)
    }

    fn write(&mut self, offset: usize, value: u32) {
        match offset {
            nrf5::TASKS_STARTTX if value != 0 => {
                self.tx_running = true;
                self.bursts = self.bursts.saturating_add(1);
            }
            nrf5::TASKS_STOPTX if value != 0 => self.tx_running = false,
            nrf5::TXD => {
                let enabled = self.value(nrf5::ENABLE) == nrf5::ENABLE_UART;
                if !(enabled && self.tx_running) {
                    self.stray_writes = self.stray_writes.saturating_add(1);
                }
                // Low byte only, as the hardware latches it.
                #[allow(clippy::cast_possible_truncation)]
                let byte = value as u8;
                if self.tx.push(byte).is_err() {
                    self.overflow = self.overflow.saturating_add(1);
                }
                self.store(nrf5::EVENTS_TXDRDY, 1);
            }
            _ => {}
        }
        self.store(offset, value);
    }
}
