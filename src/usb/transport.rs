//! HID transport abstraction.
//!
//! A [`HidTransport`] moves whole 64 byte reports to and from a KNX USB
//! interface. The link layer only talks to the device through this trait,
//! so a hidapi handle, an embedded USB host stack or
//! [`MockHidTransport`](super::MockHidTransport) can sit underneath.
//!
//! ## Example
//!
//! ```rust,no_run
//! use knx_hid::usb::HidTransport;
//! use knx_hid::KnxHidError;
//!
//! struct InterruptPipe {
//!     // ... endpoint handles
//! }
//!
//! impl HidTransport for InterruptPipe {
//!     async fn write_report(&mut self, report: &[u8; 64]) -> knx_hid::Result<()> {
//!         // Submit an OUT transfer
//!         Ok(())
//!     }
//!
//!     async fn read_report(&mut self, buf: &mut [u8; 64]) -> knx_hid::Result<usize> {
//!         // Wait for an IN transfer
//!         Err(KnxHidError::read_failed())
//!     }
//! }
//! ```

use crate::error::Result;
use crate::protocol::constants::HID_REPORT_SIZE;

/// Asynchronous HID report transport.
#[allow(async_fn_in_trait, reason = "implementations are used with static dispatch only")]
pub trait HidTransport {
    /// Write one complete report, report id included.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the device rejects the transfer or is
    /// gone.
    async fn write_report(&mut self, report: &[u8; HID_REPORT_SIZE]) -> Result<()>;

    /// Read one report into `buf`.
    ///
    /// Returns the number of bytes the device delivered. Anything below 64
    /// is a short report; the unused tail of `buf` is zero.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the read fails, or
    /// [`KnxHidError::Timeout`](crate::KnxHidError::Timeout) if nothing
    /// arrives.
    async fn read_report(&mut self, buf: &mut [u8; HID_REPORT_SIZE]) -> Result<usize>;

    /// Whether the device is open.
    ///
    /// Default implementation returns `true`.
    fn is_ready(&self) -> bool {
        true
    }

    /// Close the device.
    ///
    /// Default implementation does nothing.
    fn close(&mut self) {}
}
