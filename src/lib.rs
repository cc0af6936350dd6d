#![cfg_attr(all(not(test), not(feature = "std")), no_std)]

//! # knx-hid
//!
//! KNX USB HID report framing for host and embedded targets.
//!
//! KNX USB interfaces exchange telegrams as fixed 64 byte HID reports. A
//! telegram of up to 297 bytes is split across at most five reports; the
//! first one carries an 8 byte transfer header declaring the total length.
//!
//! ## Features
//!
//! - Permissive decoding: every structure decodes to a value carrying an
//!   explicit [`DecodeFault`] instead of failing
//! - Fragmentation of telegrams into reports and reassembly with sequence
//!   checking
//! - Async [`HidTransport`](usb::HidTransport) abstraction and a telegram
//!   level [`KnxHidLink`](usb::KnxHidLink)
//! - `no_std`, fixed-capacity `heapless` buffers, no allocation
//!
//! ## Example
//!
//! ```rust
//! use knx_hid::protocol::{encode_reports, EmiId, ProtocolId, Telegram, TelegramAssembler};
//!
//! let telegram = Telegram::new(ProtocolId::KnxTunnel, EmiId::CommonEmi, &[0x29; 120]).unwrap();
//! let reports = encode_reports(&telegram).unwrap();
//! assert_eq!(reports.len(), 3);
//!
//! let mut assembler = TelegramAssembler::new();
//! let mut received = None;
//! for report in &reports {
//!     received = assembler.feed(report).unwrap();
//! }
//! assert_eq!(received, Some(telegram));
//! ```

// Macro modules (must be declared before use)
#[macro_use]
pub mod logging;

pub mod configuration;
pub mod error;
pub mod protocol;
pub mod usb;

// Re-export commonly used types
#[doc(inline)]
pub use configuration::LinkConfig;
#[doc(inline)]
pub use error::{DecodeFault, KnxHidError, Result};
#[doc(inline)]
pub use protocol::{Frame, Telegram, TelegramAssembler};
