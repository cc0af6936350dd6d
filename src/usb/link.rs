//! Telegram-level link over a HID transport.
//!
//! [`KnxHidLink`] turns telegrams into reports on the way out and feeds
//! inbound reports through a [`TelegramAssembler`] on the way in.
//!
//! ## Example
//!
//! ```rust
//! use knx_hid::configuration::LinkConfig;
//! use knx_hid::usb::{KnxHidLink, MockHidTransport};
//!
//! embassy_futures::block_on(async {
//!     let mut link = KnxHidLink::new(MockHidTransport::new(), LinkConfig::default());
//!     let reports = link.send_telegram(&[0x11, 0x00, 0xBC, 0xE0]).await.unwrap();
//!     assert_eq!(reports, 1);
//!     assert_eq!(link.transport().sent_reports()[0][2], 12);
//! });
//! ```

use crate::configuration::LinkConfig;
use crate::error::{KnxHidError, Result};
use crate::protocol::assembler::{AssemblerState, Telegram, TelegramAssembler};
use crate::protocol::constants::HID_REPORT_SIZE;
use crate::protocol::fragment::encode_reports;
use crate::usb::transport::HidTransport;

/// One KNX USB interface: a transport plus the reassembly state for it.
#[derive(Debug)]
pub struct KnxHidLink<T: HidTransport> {
    transport: T,
    assembler: TelegramAssembler,
    config: LinkConfig,
}

impl<T: HidTransport> KnxHidLink<T> {
    /// Create a link over `transport`
    pub const fn new(transport: T, config: LinkConfig) -> Self {
        Self {
            transport,
            assembler: TelegramAssembler::new(),
            config,
        }
    }

    /// Active configuration
    #[inline]
    pub const fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Underlying transport
    #[inline]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Underlying transport, mutably
    #[inline]
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Reassembly progress of the inbound telegram
    #[inline]
    pub const fn receive_state(&self) -> AssemblerState {
        self.assembler.state()
    }

    /// Close the transport and drop any partial telegram
    pub fn close(&mut self) {
        self.assembler.reset();
        self.transport.close();
    }

    /// Consume the link and return the transport
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Send `data` as one telegram using the configured protocol id, EMI id
    /// and manufacturer code.
    ///
    /// Returns the number of reports written.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is not ready, `data` exceeds 297
    /// bytes, or a write fails. Reports already written stay written.
    pub async fn send_telegram(&mut self, data: &[u8]) -> Result<usize> {
        let telegram = Telegram::new(self.config.protocol_id, self.config.emi_id, data)?
            .with_manufacturer_code(self.config.manufacturer_code);
        self.send(&telegram).await
    }

    /// Send an already built telegram, returning the number of reports written.
    ///
    /// # Errors
    ///
    /// Same as [`send_telegram`](Self::send_telegram).
    pub async fn send(&mut self, telegram: &Telegram) -> Result<usize> {
        if !self.transport.is_ready() {
            return Err(KnxHidError::transport_not_ready());
        }
        let reports = encode_reports(telegram)?;
        for report in &reports {
            self.transport.write_report(report).await?;
        }
        hid_log!(
            debug,
            "sent telegram of {} bytes in {} reports",
            telegram.data().len(),
            reports.len()
        );
        Ok(reports.len())
    }

    /// Read reports until a telegram is complete.
    ///
    /// At most `max_reports_per_receive` reports are read per call; a
    /// partially assembled telegram is kept for the next call.
    ///
    /// # Errors
    ///
    /// - Decode or reassembly error: the report was invalid or the telegram
    ///   in progress was dropped (sequence gap, length mismatch). The next
    ///   call starts over.
    /// - Transport error: the read failed or claimed more than 64 bytes, or a
    ///   short report arrived while `reject_short_reports` is set (the
    ///   telegram in progress is dropped).
    /// - [`KnxHidError::Timeout`]: the report budget ran out or the transport
    ///   timed out.
    pub async fn receive_telegram(&mut self) -> Result<Telegram> {
        if !self.transport.is_ready() {
            return Err(KnxHidError::transport_not_ready());
        }

        let mut buf = [0u8; HID_REPORT_SIZE];
        for _ in 0..self.config.max_reports_per_receive {
            let len = self.transport.read_report(&mut buf).await?;
            if len > HID_REPORT_SIZE {
                hid_log!(error, "transport reported {} bytes for a 64 byte report", len);
                self.assembler.reset();
                return Err(KnxHidError::read_failed());
            }
            if len < HID_REPORT_SIZE && self.config.reject_short_reports {
                hid_log!(warn, "rejecting short report of {} bytes", len);
                self.assembler.reset();
                return Err(KnxHidError::short_report(len));
            }

            match self.assembler.feed(&buf[..len]) {
                Ok(Some(telegram)) => return Ok(telegram),
                Ok(None) => {}
                Err(e) => {
                    hid_log!(warn, "dropped telegram: {}", e);
                    return Err(e);
                }
            }
        }

        hid_log!(
            debug,
            "no telegram after {} reports",
            self.config.max_reports_per_receive
        );
        Err(KnxHidError::Timeout)
    }
}
