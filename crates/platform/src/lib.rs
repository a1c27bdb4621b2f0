//! Hardware abstraction layer for the fault-dump firmware
//!
//! This crate provides the trait-level seams between the crash-dump core and
//! the hardware it runs on, so the core can be exercised on a host against
//! in-memory fakes.
//!
//! # Architecture Layers
//!
//! ```text
//! Firmware (board tables, HardFault handler, register drivers)
//!         ↓
//! Crash-dump core (hex encoder, transport lifecycle, session protocol)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Hardware Layer (UART registers, cycle-counted delays)
//! ```
//!
//! # Abstractions
//!
//! - [`ByteSink`] / [`DumpChannel`] - blocking, polling byte output
//! - [`LogChannel`] - the logging owner of a shared UART
//! - [`BufferedLogChannel`] - interrupt-safe queue for ordinary log output
//! - [`TimeSource`] / [`QueueDepth`] - inputs to trace-line headers
//! - [`UartConfig`] - serial framing
//!
//! # Features
//!
//! - `std`: Enable the [`mocks`] module for downstream tests
//! - `defmt`: Enable defmt derives

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer defmt over println! in lib code
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)] // accessors: callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::new_without_default)]

pub mod clock;
pub mod log_channel;
pub mod mocks;
pub mod peripheral;
pub mod sink;

pub use clock::{TickCounter, TimeSource};
pub use log_channel::{BufferedLogChannel, LogChannel, LogWriter, NoLogChannel, QueueDepth};
pub use peripheral::{DataBits, Parity, StopBits, UartConfig};
pub use sink::{ByteSink, DumpChannel, SinkWriter};
