//! Crash-dump serialization and transport
//!
//! When the device takes an unrecoverable fault, this crate turns memory
//! into an ASCII hex transcript on the serial link the application was
//! logging through. It runs inside the fault handler, so it allocates
//! nothing, never yields and never fails: a stalled UART simply hangs.
//!
//! # Layers
//!
//! ```text
//! capture engine ──▶ CrashDumpHandler (session)
//!                        │
//!                        ├─▶ DumpTransport  (takeover, banner, end marker)
//!                        └─▶ HexEncoder     (16 bytes per line)
//!                                │
//!                                ▼
//!                        platform::DumpChannel (polled UART)
//! ```
//!
//! # Wire format
//!
//! ```text
//! \r\n\r\n###CRASH###\r\n
//! <chunk hex, wrapped every 16 bytes>\r\n
//! ...
//! ###END###\r\n
//! ```
//!
//! # Features
//!
//! - `std`: host-side capture parsing ([`transcript`])
//! - `defmt`: defmt derives and fault-path events

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
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)]
#![allow(clippy::doc_markdown)] // register and marker names in doc comments
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod chunk;
pub mod engine;
pub mod hex;
pub mod region;
pub mod session;
pub mod trace;
#[cfg(any(test, feature = "std"))]
pub mod transcript;
pub mod transport;
pub mod wire;

pub use chunk::{Element, MemoryChunk};
pub use engine::run_session;
pub use hex::HexEncoder;
pub use region::{ElementWidth, MemoryRegion, RegionTable, RegionTableError};
pub use session::{CrashDumpHandler, CrashDumpSession, CrashInfo, DumpConfig};
pub use trace::{Level, Tracer};
#[cfg(any(test, feature = "std"))]
pub use transcript::{CaptureScanner, CrashDump, LogRecord, ScanEvent, TranscriptError};
pub use transport::{ChannelMode, Disposition, DumpTransport, TransportConfig};
