//! nRF5 UART0 and GPIO P0 register map
//!
//! Offsets are from the UART and GPIO chapters of the nRF52832 product
//! specification. Only what the polled transmitter touches is listed.

/// UART0 base address.
pub const UART0_BASE: usize = 0x4000_2000;
/// GPIO port 0 base address.
pub const P0_BASE: usize = 0x5000_0000;

// ── UART tasks ──
/// Start the receiver.
pub const TASKS_STARTRX: usize = 0x000;
/// Stop the receiver.
pub const TASKS_STOPRX: usize = 0x004;
/// Start the transmitter.
pub const TASKS_STARTTX: usize = 0x008;
/// Stop the transmitter.
pub const TASKS_STOPTX: usize = 0x00C;

// ── UART events ──
/// A byte arrived in RXD.
pub const EVENTS_RXDRDY: usize = 0x108;
/// The byte written to TXD left the shift register.
pub const EVENTS_TXDRDY: usize = 0x11C;
/// Framing, parity or overrun error.
pub const EVENTS_ERROR: usize = 0x124;

// ── UART registers ──
/// Interrupt enable set.
pub const INTENSET: usize = 0x304;
/// Interrupt enable clear.
pub const INTENCLR: usize = 0x308;
/// Error source (write 1 to clear).
pub const ERRORSRC: usize = 0x480;
/// Peripheral enable.
pub const ENABLE: usize = 0x500;
/// TXD pin select.
pub const PSELTXD: usize = 0x50C;
/// RXD pin select.
pub const PSELRXD: usize = 0x514;
/// Transmit data.
pub const TXD: usize = 0x51C;
/// Baud rate.
pub const BAUDRATE: usize = 0x524;
/// Parity, stop bits and flow control.
pub const CONFIG: usize = 0x56C;

/// `ENABLE` value that turns the UART on.
pub const ENABLE_UART: u32 = 4;
/// `ENABLE` value that turns it off.
pub const ENABLE_DISABLED: u32 = 0;
/// `CONFIG.PARITY` field set to "included, even".
pub const CONFIG_PARITY_EVEN: u32 = 0x7 << 1;
/// `CONFIG.STOP` bit selecting two stop bits.
pub const CONFIG_STOP_TWO: u32 = 1 << 4;

// ── GPIO ──
/// Set output bits.
pub const GPIO_OUTSET: usize = 0x508;
/// `PIN_CNF[0]`; pin `n` lives at `+ 4 * n`.
pub const GPIO_PIN_CNF0: usize = 0x700;
/// `PIN_CNF`: output, input buffer disconnected.
pub const PIN_CNF_OUTPUT: u32 = 0x3;
/// `PIN_CNF`: input, buffer connected, no pull.
pub const PIN_CNF_INPUT: u32 = 0x0;
/// Highest pin number on port 0.
pub const MAX_PIN: u8 = 31;

/// `BAUDRATE` value for 1 Mbaud.
pub const BAUD_1M: u32 = 0x1000_0000;

/// `BAUDRATE` register value for `rate`, or `None` if the UART cannot
/// generate it.
pub const fn baud_register(rate: u32) -> Option<u32> {
    match rate {
        1_200 => Some(0x0004_F000),
        2_400 => Some(0x0009_D000),
        4_800 => Some(0x0013_B000),
        9_600 => Some(0x0027_5000),
        14_400 => Some(0x003B_0000),
        19_200 => Some(0x004E_A000),
        28_800 => Some(0x0075_F000),
        38_400 => Some(0x009D_5000),
        57_600 => Some(0x00EB_F000),
        76_800 => Some(0x013A_9000),
        115_200 => Some(0x01D7_E000),
        230_400 => Some(0x03AF_B000),
        250_000 => Some(0x0400_0000),
        460_800 => Some(0x075F_7000),
        921_600 => Some(0x0EBE_D000),
        1_000_000 => Some(BAUD_1M),
        _ => None,
    }
}

/// Offset of `PIN_CNF[pin]`.
pub const fn pin_cnf(pin: u8) -> usize {
    // pin <= 31, so the product stays far below usize::MAX.
    #[allow(clippy::arithmetic_side_effects)]
    let offset = GPIO_PIN_CNF0 + 4 * (pin as usize);
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_rate_is_supported() {
        assert_eq!(baud_register(1_000_000), Some(BAUD_1M));
        assert_eq!(baud_register(115_200), Some(0x01D7_E000));
        assert_eq!(baud_register(123_456), None);
    }

    #[test]
    fn test_pin_cnf_offsets() {
        assert_eq!(pin_cnf(0), 0x700);
        assert_eq!(pin_cnf(6), 0x718);
        assert_eq!(pin_cnf(MAX_PIN), 0x77C);
    }
}
