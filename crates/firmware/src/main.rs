//! Fault-dump firmware - Main Entry Point
//!
//! Hardware-only entry point for the nRF52832.

#![no_std]
#![no_main]

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m_rt::{entry, exception};
use crashdump::log_info;
use platform::{DumpChannel, UartConfig};

use firmware::board;
use firmware::logging::{self, LOG, UPTIME};

// Global logger + panic handler
use defmt_rtt as _;
use panic_probe as _;

/// SysTick reload for a 1 ms tick.
const SYSTICK_RELOAD: u32 = (board::SYSCLK_HZ / 1_000).saturating_sub(1);

/// Log bytes moved to the UART per main-loop pass.
const PUMP_BUDGET: usize = 64;

#[entry]
fn main() -> ! {
    let Some(mut core) = cortex_m::Peripherals::take() else {
        defmt::panic!("core peripherals already taken");
    };

    defmt::info!("fault-dump firmware v{=str} on {=str}", env!("CARGO_PKG_VERSION"), board::NAME);

    core.SYST.set_clock_source(SystClkSource::Core);
    core.SYST.set_reload(SYSTICK_RELOAD);
    core.SYST.clear_current();
    core.SYST.enable_counter();
    core.SYST.enable_interrupt();

    // The log shares UART0 with the crash transcript; both run 8N1 at 1 Mbaud
    // so one terminal session captures either.
    // SAFETY: sole owner until HardFault, which disables interrupts and
    // closes LOG before taking the UART back.
    let mut uart = unsafe { firmware::uart::board_uart(board::UART_PINS) };
    uart.configure(&UartConfig::DUMP_1M);

    let mut trace = logging::tracer();
    let dump = if firmware::exception_handlers::CRASH_DUMP_ON_FAULT {
        "on"
    } else {
        "off"
    };
    log_info!(trace, "boot: {} regions, crash dump {}", board::REGIONS.len(), dump);

    loop {
        logging::pump(&LOG, &mut uart, PUMP_BUDGET);
        cortex_m::asm::wfi();
    }
}

#[exception]
fn SysTick() {
    UPTIME.tick();
}
