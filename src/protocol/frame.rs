//! KNX HID report frame parsing and encoding.
//!
//! A frame is one complete 64 byte HID report: the 3 byte report header
//! followed by the 61 byte report body.
//!
//! ## Frame Structure
//!
//! ```text
//! ┌─────────────────────────────┐
//! │  Report header (3 bytes)    │
//! │  - Report ID: 0x01          │
//! │  - Sequence │ packet type   │
//! │  - Data length: 0..=61      │
//! ├─────────────────────────────┤
//! │  Report body (61 bytes)     │
//! │  - [Transfer header]        │
//! │  - Payload, zero padded     │
//! └─────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use knx_hid::protocol::{Frame, PacketInfo, PacketType, SequenceNumber};
//! use knx_hid::protocol::{EmiId, ProtocolId, ReportBodyData};
//!
//! let frame = Frame::construct(
//!     PacketInfo::new(SequenceNumber::First, PacketType::StartAndEnd),
//!     &ReportBodyData {
//!         protocol_id: ProtocolId::KnxTunnel,
//!         emi_id: EmiId::CommonEmi,
//!         emi_data: &[0x11, 0x00, 0xBC, 0xE0],
//!         partial: false,
//!     },
//! );
//! let report = frame.encode().unwrap();
//! assert_eq!(report.len(), 64);
//!
//! let decoded = Frame::decode(&report, false);
//! assert!(decoded.is_valid());
//! ```

use crate::error::{DecodeFault, KnxHidError, Result};
use crate::protocol::constants::{HID_REPORT_SIZE, REPORT_HEADER_SIZE};
use crate::protocol::packet_info::PacketInfo;
use crate::protocol::report_body::{ReportBody, ReportBodyData};
use crate::protocol::report_header::ReportHeader;
use crate::protocol::transfer::TransferBody;

/// One KNX HID report.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    header: ReportHeader,
    body: ReportBody,
    partial: bool,
    /// Number of input bytes when decoded from fewer than 64
    short_read: Option<usize>,
    fault: Option<DecodeFault>,
}

impl Frame {
    /// Size of a HID report in bytes
    pub const SIZE: usize = HID_REPORT_SIZE;

    /// Build a frame from construction data.
    ///
    /// The body is built first since the header needs its length. For a
    /// continuation packet only the body decides validity.
    pub fn construct(packet_info: PacketInfo, body_data: &ReportBodyData<'_>) -> Self {
        Self::from_parts(packet_info, ReportBody::construct(body_data))
    }

    /// Build a frame around an already constructed body
    pub fn from_parts(packet_info: PacketInfo, body: ReportBody) -> Self {
        let header = ReportHeader::for_body(packet_info, body.length());
        let partial = body.is_partial();
        let fault = if partial {
            body.fault()
        } else {
            header.fault().or_else(|| body.fault())
        };
        Self {
            header,
            body,
            partial,
            short_read: None,
            fault,
        }
    }

    /// Decode a HID report.
    ///
    /// Reports shorter than 64 bytes are still processed on a best-effort
    /// basis: a warning is logged and [`is_truncated`](Self::is_truncated)
    /// reports it. The body payload is trimmed to the header's data length.
    pub fn decode(data: &[u8], partial: bool) -> Self {
        let short_read = (data.len() < Self::SIZE).then_some(data.len());
        if short_read.is_some() {
            hid_log!(
                warn,
                "only received {} bytes, expected {}; unused bytes in the last report shall be filled with 00h",
                data.len(),
                Self::SIZE
            );
        }

        let split = data.len().min(REPORT_HEADER_SIZE);
        let (header_bytes, body_bytes) = data.split_at(split);
        let header = ReportHeader::decode(header_bytes);
        let mut body = ReportBody::decode(body_bytes, partial);

        let mut length_fault = None;
        if header.is_valid() && body.is_valid() {
            let header_len = body.transfer_header().map_or(0, |h| h.header_length());
            match header.data_length().checked_sub(header_len) {
                Some(carried) => body.truncate_payload(carried),
                None => {
                    length_fault = Some(DecodeFault::DataLengthTooShort(header.data_length()));
                }
            }
        }

        let fault = header.fault().or_else(|| body.fault()).or(length_fault);
        Self {
            header,
            body,
            partial,
            short_read,
            fault,
        }
    }

    /// Encode the complete 64 byte report.
    ///
    /// # Errors
    ///
    /// Returns a decode error carrying the fault if the frame is invalid.
    pub fn encode(&self) -> Result<[u8; HID_REPORT_SIZE]> {
        let mut buf = [0u8; HID_REPORT_SIZE];
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Encode the report into a byte buffer
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<usize> {
        if let Some(fault) = self.fault {
            return Err(KnxHidError::invalid(fault));
        }
        if buf.len() < Self::SIZE {
            return Err(KnxHidError::invalid(DecodeFault::WrongLength {
                expected: Self::SIZE,
                actual: buf.len(),
            }));
        }
        let (header_buf, body_buf) = buf.split_at_mut(REPORT_HEADER_SIZE);
        self.header.encode_into(header_buf)?;
        self.body.encode_into(body_buf)?;
        Ok(Self::SIZE)
    }

    /// Report header (report id, sequence number, packet type, data length)
    #[inline]
    pub const fn report_header(&self) -> &ReportHeader {
        &self.header
    }

    /// Report body (transfer header in start packets, payload)
    #[inline]
    pub const fn report_body(&self) -> &ReportBody {
        &self.body
    }

    /// Payload bytes of this report
    pub fn payload(&self) -> &[u8] {
        self.body.payload().map_or(&[][..], TransferBody::data)
    }

    /// Whether this is a continuation packet
    #[inline]
    pub const fn is_partial(&self) -> bool {
        self.partial
    }

    /// Whether the report was shorter than 64 bytes
    #[inline]
    pub const fn is_truncated(&self) -> bool {
        self.short_read.is_some()
    }

    /// Why the frame is invalid, if it is
    #[inline]
    pub const fn fault(&self) -> Option<DecodeFault> {
        self.fault
    }

    /// Whether all fields were parsed and are plausible
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.fault.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::{EmiId, PacketType, ProtocolId, SequenceNumber};

    /// Device feature get request (supported EMI type)
    const FEATURE_GET: [u8; 64] = [
        0x01, 0x13, 0x09, 0x00, 0x08, 0x00, 0x01, 0x0F, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00,
    ];

    fn single(payload: &[u8]) -> Frame {
        Frame::construct(
            PacketInfo::new(SequenceNumber::First, PacketType::StartAndEnd),
            &ReportBodyData {
                protocol_id: ProtocolId::KnxTunnel,
                emi_id: EmiId::CommonEmi,
                emi_data: payload,
                partial: false,
            },
        )
    }

    #[test]
    fn test_decode_feature_get() {
        let frame = Frame::decode(&FEATURE_GET, false);
        assert!(frame.is_valid());
        assert!(!frame.is_truncated());
        assert_eq!(frame.report_header().data_length(), 9);
        let header = frame.report_body().transfer_header().unwrap();
        assert_eq!(header.protocol_id(), Some(ProtocolId::BusAccessServerFeatureService));
        assert_eq!(frame.payload(), &[0x01]);
        assert_eq!(frame.encode().unwrap(), FEATURE_GET);
    }

    #[test]
    fn test_single_packet_telegram() {
        let frame = single(&[0xAA; 10]);
        assert!(frame.is_valid());
        let report = frame.encode().unwrap();
        assert_eq!(report.len(), 64);
        assert_eq!(report[0], 0x01);
        assert_eq!(report[1], 0x13);
        assert_eq!(report[2], 18);

        let decoded = Frame::decode(&report, false);
        assert!(decoded.is_valid());
        assert_eq!(decoded.payload(), &[0xAA; 10]);
        assert_eq!(decoded.encode().unwrap(), report);
    }

    #[test]
    fn test_truncated_report() {
        let report = single(&[0xAA; 10]).encode().unwrap();
        let frame = Frame::decode(&report[..63], false);
        assert!(frame.is_truncated());
        assert!(frame.report_header().is_valid());
        assert!(!frame.is_valid());
        assert_eq!(
            frame.fault(),
            Some(DecodeFault::WrongLength { expected: 61, actual: 60 })
        );
        assert!(frame.encode().is_err());
    }

    #[test]
    fn test_tiny_report() {
        let frame = Frame::decode(&[0x01], false);
        assert!(frame.is_truncated());
        assert!(!frame.is_valid());
        assert_eq!(frame.payload(), &[] as &[u8]);
    }

    #[test]
    fn test_wrong_report_id() {
        let mut report = single(&[0xAA; 10]).encode().unwrap();
        report[0] = 0x02;
        let frame = Frame::decode(&report, false);
        assert_eq!(frame.fault(), Some(DecodeFault::InvalidReportId(0x02)));
    }

    #[test]
    fn test_continuation_trimmed_to_data_length() {
        let frame = Frame::from_parts(
            PacketInfo::new(SequenceNumber::Second, PacketType::PartialAndEnd),
            ReportBody::continuation(&[0x42; 7]),
        );
        assert!(frame.is_valid());
        let report = frame.encode().unwrap();
        assert_eq!(report[1], 0x26);
        assert_eq!(report[2], 7);

        let decoded = Frame::decode(&report, true);
        assert!(decoded.is_valid());
        assert!(decoded.is_partial());
        assert_eq!(decoded.payload(), &[0x42; 7]);
    }

    #[test]
    fn test_start_data_length_below_transfer_header() {
        let mut report = FEATURE_GET;
        report[2] = 5;
        let frame = Frame::decode(&report, false);
        assert!(frame.report_header().is_valid());
        assert!(!frame.is_valid());
        assert_eq!(frame.fault(), Some(DecodeFault::DataLengthTooShort(5)));
        assert!(frame.encode().is_err());

        // Exactly the transfer header: valid, no payload
        report[2] = 8;
        let frame = Frame::decode(&report, false);
        assert!(frame.is_valid());
        assert!(frame.payload().is_empty());
    }

    #[test]
    fn test_encode_into_small_buffer() {
        let frame = single(&[0x01]);
        let mut buf = [0u8; 32];
        assert!(frame.encode_into(&mut buf).is_err());
    }
}
