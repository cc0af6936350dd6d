//! Mock HID transport for testing without a USB device.
//!
//! ## Example
//!
//! ```rust
//! use knx_hid::usb::{HidTransport, MockHidTransport};
//!
//! let mut mock = MockHidTransport::new();
//! mock.add_report(vec![0x01, 0x13, 0x09]);
//!
//! let mut buf = [0u8; 64];
//! let n = embassy_futures::block_on(mock.read_report(&mut buf)).unwrap();
//! assert_eq!(n, 3);
//! assert_eq!(&buf[..3], &[0x01, 0x13, 0x09]);
//! ```

use std::collections::VecDeque;
use std::vec::Vec;

use crate::error::{KnxHidError, Result};
use crate::protocol::constants::HID_REPORT_SIZE;
use crate::usb::transport::HidTransport;

/// Mock transport that replays queued inbound reports and records every
/// outbound report.
#[derive(Debug)]
pub struct MockHidTransport {
    /// Reports returned by `read_report()`, oldest first
    inbound: VecDeque<Vec<u8>>,
    /// Every report passed to `write_report()`
    sent_reports: Vec<[u8; HID_REPORT_SIZE]>,
    ready: bool,
    /// Number of further writes that succeed before writes start failing
    writes_before_failure: Option<usize>,
}

impl Default for MockHidTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHidTransport {
    /// Create a ready mock with no queued reports
    pub fn new() -> Self {
        Self {
            inbound: VecDeque::new(),
            sent_reports: Vec::new(),
            ready: true,
            writes_before_failure: None,
        }
    }

    /// Queue a report for `read_report()`.
    ///
    /// Reports longer than 64 bytes are cut to 64 when read; shorter ones
    /// are delivered as short reads.
    pub fn add_report(&mut self, data: Vec<u8>) {
        self.inbound.push_back(data);
    }

    /// Queue several complete reports, e.g. the output of
    /// [`encode_reports`](crate::protocol::encode_reports)
    pub fn add_reports<'a>(&mut self, reports: impl IntoIterator<Item = &'a [u8; HID_REPORT_SIZE]>) {
        for report in reports {
            self.add_report(report.to_vec());
        }
    }

    /// Reports written so far
    pub fn sent_reports(&self) -> &[[u8; HID_REPORT_SIZE]] {
        &self.sent_reports
    }

    /// Last report written
    pub fn last_sent(&self) -> Option<&[u8; HID_REPORT_SIZE]> {
        self.sent_reports.last()
    }

    /// Forget written reports
    pub fn clear_sent(&mut self) {
        self.sent_reports.clear();
    }

    /// Number of queued inbound reports
    pub fn pending_reports(&self) -> usize {
        self.inbound.len()
    }

    /// Set whether the transport reports itself as ready
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    /// Let the next `successful` writes succeed, then fail every write
    pub fn fail_writes_after(&mut self, successful: usize) {
        self.writes_before_failure = Some(successful);
    }
}

impl HidTransport for MockHidTransport {
    async fn write_report(&mut self, report: &[u8; HID_REPORT_SIZE]) -> Result<()> {
        if let Some(remaining) = self.writes_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(KnxHidError::write_failed());
            }
            *remaining -= 1;
        }
        self.sent_reports.push(*report);
        Ok(())
    }

    async fn read_report(&mut self, buf: &mut [u8; HID_REPORT_SIZE]) -> Result<usize> {
        // No queued report behaves like a read timeout
        let data = self.inbound.pop_front().ok_or(KnxHidError::Timeout)?;
        let len = data.len().min(HID_REPORT_SIZE);
        buf.fill(0);
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn close(&mut self) {
        self.ready = false;
        self.inbound.clear();
    }
}
