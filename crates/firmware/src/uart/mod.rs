//! Polled UART transmitter for the crash transcript
//!
//! The application's logging driver runs the UART from interrupts and a
//! buffer. Inside the fault handler neither is available, so the dump
//! reprograms the same peripheral for plain polling:
//!
//! ```text
//! begin_burst  → TASKS_STARTTX
//! put_byte     → TXD = b; spin until EVENTS_TXDRDY; EVENTS_TXDRDY = 0
//! end_burst    → TASKS_STOPTX
//! ```
//!
//! Register access goes through [`RegisterBlock`] so the driver runs on a
//! host against [`SimulatedRegisters`].

pub mod nrf5;
mod sim;

pub use sim::SimulatedRegisters;

use platform::{ByteSink, DumpChannel, Parity, StopBits, UartConfig};

/// 32-bit registers addressed by byte offset from a peripheral base.
pub trait RegisterBlock {
    /// Read the register at `offset`.
    fn read(&self, offset: usize) -> u32;

    /// Write the register at `offset`.
    fn write(&mut self, offset: usize, value: u32);
}

/// Memory-mapped register block.
#[derive(Debug)]
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// Register block at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be the address of a peripheral whose registers are valid
    /// for 32-bit volatile access at every offset the driver uses, and the
    /// caller must own that peripheral for the lifetime of the block.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    fn address(&self, offset: usize) -> *mut u32 {
        self.base.wrapping_add(offset) as *mut u32
    }
}

impl RegisterBlock for Mmio {
    fn read(&self, offset: usize) -> u32 {
        // SAFETY: `Mmio::new` contract: valid, owned peripheral registers.
        unsafe { core::ptr::read_volatile(self.address(offset)) }
    }

    fn write(&mut self, offset: usize, value: u32) {
        // SAFETY: `Mmio::new` contract: valid, owned peripheral registers.
        unsafe { core::ptr::write_volatile(self.address(offset), value) }
    }
}

/// Pin assignment of the UART.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartPins {
    /// TXD pin on port 0.
    pub tx: u8,
    /// RXD pin on port 0.
    pub rx: u8,
}

/// Blocking UART transmitter over raw registers.
pub struct PolledUart<R, G> {
    uart: R,
    gpio: G,
    pins: UartPins,
}

impl<R: RegisterBlock, G: RegisterBlock> PolledUart<R, G> {
    /// Driver for the UART at `uart`, muxed onto `pins` of `gpio`.
    ///
    /// Nothing is touched until [`DumpChannel::configure`].
    pub fn new(uart: R, gpio: G, pins: UartPins) -> Self {
        Self { uart, gpio, pins }
    }

    /// Pin assignment.
    pub fn pins(&self) -> UartPins {
        self.pins
    }

    /// Give the register blocks back.
    pub fn into_parts(self) -> (R, G) {
        (self.uart, self.gpio)
    }

    /// Borrow the UART registers.
    pub fn uart_registers(&self) -> &R {
        &self.uart
    }

    /// `CONFIG` register value for `config`.
    ///
    /// The UART always frames 8 data bits; odd parity and 1.5 stop bits do
    /// not exist on this peripheral and fall back to none and one.
    pub fn config_register(config: &UartConfig) -> u32 {
        let parity = match config.parity {
            Parity::Even => nrf5::CONFIG_PARITY_EVEN,
            Parity::None | Parity::Odd => 0,
        };
        let stop = match config.stop_bits {
            StopBits::Two => nrf5::CONFIG_STOP_TWO,
            StopBits::One | StopBits::OnePointFive => 0,
        };
        parity | stop
    }
}

impl<R: RegisterBlock, G: RegisterBlock> ByteSink for PolledUart<R, G> {
    fn put_byte(&mut self, byte: u8) {
        self.uart.write(nrf5::TXD, u32::from(byte));
        // No timeout: a UART that never raises TXDRDY hangs the dump here.
        while self.uart.read(nrf5::EVENTS_TXDRDY) == 0 {
            core::hint::spin_loop();
        }
        self.uart.write(nrf5::EVENTS_TXDRDY, 0);
    }

    fn begin_burst(&mut self) {
        self.uart.write(nrf5::TASKS_STARTTX, 1);
    }

    fn end_burst(&mut self) {
        self.uart.write(nrf5::TASKS_STOPTX, 1);
    }
}

impl<R: RegisterBlock, G: RegisterBlock> DumpChannel for PolledUart<R, G> {
    fn configure(&mut self, config: &UartConfig) {
        let baud = nrf5::baud_register(config.baud_rate).unwrap_or(nrf5::BAUD_1M);

        // Whatever the logging driver left running goes first.
        self.uart.write(nrf5::ENABLE, nrf5::ENABLE_DISABLED);
        self.uart.write(nrf5::INTENCLR, u32::MAX);
        self.uart.write(nrf5::TASKS_STOPTX, 1);
        self.uart.write(nrf5::TASKS_STOPRX, 1);

        // TX idles high before the pin is handed to the UART.
        self.gpio.write(nrf5::GPIO_OUTSET, 1u32 << (self.pins.tx & nrf5::MAX_PIN));
        self.gpio.write(nrf5::pin_cnf(self.pins.tx), nrf5::PIN_CNF_OUTPUT);
        self.gpio.write(nrf5::pin_cnf(self.pins.rx), nrf5::PIN_CNF_INPUT);

        self.uart.write(nrf5::PSELTXD, u32::from(self.pins.tx));
        self.uart.write(nrf5::PSELRXD, u32::from(self.pins.rx));
        self.uart.write(nrf5::BAUDRATE, baud);
        self.uart.write(nrf5::CONFIG, Self::config_register(config));

        self.uart.write(nrf5::EVENTS_TXDRDY, 0);
        self.uart.write(nrf5::EVENTS_RXDRDY, 0);
        self.uart.write(nrf5::EVENTS_ERROR, 0);
        self.uart.write(nrf5::ERRORSRC, u32::MAX);

        self.uart.write(nrf5::ENABLE, nrf5::ENABLE_UART);

        #[cfg(feature = "defmt")]
        defmt::debug!("uart: polled mode, BAUDRATE={=u32:#x}", baud);
    }
}

/// The board's UART0 as a polled transmitter.
///
/// # Safety
///
/// Only one owner may drive UART0 at a time. The fault handler calls this
/// after interrupts are disabled, which stops the logging driver from
/// touching the peripheral again.
pub unsafe fn board_uart(pins: UartPins) -> PolledUart<Mmio, Mmio> {
    // SAFETY: fixed nRF52 peripheral addresses; ownership per this fn's
    // contract.
    let (uart, gpio) = unsafe { (Mmio::new(nrf5::UART0_BASE), Mmio::new(nrf5::P0_BASE)) };
    PolledUart::new(uart, gpio, pins)
}
