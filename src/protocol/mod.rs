//! KNX USB HID report framing.
//!
//! This module contains the layered report structures (packet info, report
//! header, transfer protocol header and body, report body, frame) and the
//! telegram-level fragmentation and reassembly built on them.

pub mod assembler;
pub mod constants;
pub mod fragment;
pub mod frame;
pub mod packet_info;
pub mod report_body;
pub mod report_header;
pub mod transfer;

pub use assembler::*;
pub use constants::*;
pub use fragment::*;
pub use frame::*;
pub use packet_info::*;
pub use report_body::*;
pub use report_header::*;
pub use transfer::*;
