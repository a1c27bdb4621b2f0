//! Board configuration: what to dump and where the UART is wired
//!
//! One `board-*` feature selects the table. Each table is validated by
//! `RegionTable::new` inside a `const` item, so a malformed table (missing
//! sentinel, overlap, misalignment) stops the build.

use crashdump::{DumpConfig, RegionTable, TransportConfig};

use crate::uart::{nrf5, UartPins};

#[cfg(all(feature = "crash-dump", not(feature = "board-custom")))]
compile_error!("the `crash-dump` feature needs a board: enable `board-custom`");

/// Core clock of the nRF52832.
pub const SYSCLK_HZ: u32 = 64_000_000;

/// Capacity of the application log queue, in bytes.
pub const LOG_CAPACITY: usize = 1024;

#[cfg(feature = "board-custom")]
mod custom {
    use crashdump::{ElementWidth, MemoryRegion};

    use super::UartPins;

    /// Human-readable board name for the boot banner.
    pub const NAME: &str = "custom nRF52832";

    /// UART0 pins.
    pub const UART_PINS: UartPins = UartPins { tx: 6, rx: 8 };

    /// Application RAM above the SoftDevice reservation.
    pub const REGION_TABLE: &[MemoryRegion] = &[
        MemoryRegion::new(0x2000_2558, 0x2001_0000, ElementWidth::Byte),
        MemoryRegion::SENTINEL,
    ];
}

#[cfg(feature = "board-custom")]
pub use custom::{NAME, REGION_TABLE, UART_PINS};

/// Validated region table of the selected board.
#[cfg(feature = "board-custom")]
#[allow(clippy::panic)] // const evaluation: a panic here is a build error
pub const REGIONS: RegionTable<'static> = match RegionTable::new(REGION_TABLE) {
    Ok(table) => table,
    Err(_) => panic!("board region table is malformed"),
};

/// Without a board nothing but registers are dumped.
#[cfg(not(feature = "board-custom"))]
pub const REGIONS: RegionTable<'static> = RegionTable::empty();

/// Pins used when no board is selected.
#[cfg(not(feature = "board-custom"))]
pub const UART_PINS: UartPins = UartPins { tx: 6, rx: 8 };

/// Board name when no board is selected.
#[cfg(not(feature = "board-custom"))]
pub const NAME: &str = "generic nRF52832";

/// Everything the crash session needs from the board.
pub const DUMP_CONFIG: DumpConfig<'static> = DumpConfig {
    regions: REGIONS,
    transport: TransportConfig::DEFAULT,
};

const _: () = assert!(
    nrf5::baud_register(DUMP_CONFIG.transport.uart.baud_rate).is_some(),
    "dump baud rate is not supported by the UART"
);

const _: () = assert!(
    UART_PINS.tx <= nrf5::MAX_PIN && UART_PINS.rx <= nrf5::MAX_PIN,
    "UART pin out of range"
);
