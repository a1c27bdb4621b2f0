//! Fault-dump firmware
//!
//! nRF52832 firmware that logs over UART0 in normal operation and, on a
//! HardFault, takes that UART over to emit a crash transcript.
//!
//! # Architecture
//!
//! ```text
//! Application Layer (main.rs: SysTick uptime, log pump)
//!         ↓
//! Fault path (exception_handlers → crash → crashdump session)
//!         ↓
//! Board + drivers (board tables, polled UART, cycle delay)
//!         ↓
//! Platform HAL (ByteSink, DumpChannel, LogChannel)
//! ```
//!
//! # Features
//!
//! - `hardware` - Build for the nRF52832 target (cortex-m-rt, defmt-rtt)
//! - `crash-dump` - HardFault emits the hex transcript (default)
//! - `board-custom` - Region table and pins of the reference board (default)
//!
//! # Hardware Target
//!
//! ```bash
//! cargo build --release --target thumbv7em-none-eabihf --features hardware
//! ```

#![cfg_attr(not(test), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
// unsafe fn body is not implicitly unsafe block
// Logging discipline (allow println in tests via clippy.toml)
#![warn(clippy::print_stdout)] // prefer defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
// Pedantic lints too noisy for firmware application code:
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod board;
pub mod crash;
pub mod delay;
pub mod exception_handlers;
pub mod logging;
pub mod uart;

pub use crash::{build_session, RegisterFrame};
pub use delay::CycleDelay;
pub use uart::{Mmio, PolledUart, RegisterBlock, SimulatedRegisters, UartPins};
