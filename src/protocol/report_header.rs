//! KNX HID report header (first three octets of every HID report).
//!
//! ```text
//! ┌──────────────┬──────────────┬──────────────┐
//! │ Report ID    │ Packet Info  │ Data Length  │
//! │ (0x01)       │ (seq │ type) │ (0..=61)     │
//! └──────────────┴──────────────┴──────────────┘
//! ```
//!
//! The report ID lets the HID class host driver tell reports apart; KNX
//! uses the fixed value `01h`. The data length is the number of octets of
//! the report body that carry information.

use crate::error::{DecodeFault, KnxHidError, Result};
use crate::protocol::constants::{KNX_REPORT_ID, REPORT_BODY_SIZE, REPORT_HEADER_SIZE};
use crate::protocol::packet_info::PacketInfo;

/// Header of a KNX HID report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReportHeader {
    report_id: u8,
    packet_info: PacketInfo,
    data_length: u8,
    /// Faults fixed at construction time (input length, data length)
    fault: Option<DecodeFault>,
}

impl ReportHeader {
    /// Size of the header in bytes
    pub const SIZE: usize = REPORT_HEADER_SIZE;

    /// Maximum value of the data length field
    pub const MAX_DATA_LENGTH: usize = REPORT_BODY_SIZE;

    /// Build the header for a body of `body_length` bytes.
    ///
    /// A length above 61 yields a header that stays invalid.
    pub fn for_body(packet_info: PacketInfo, body_length: usize) -> Self {
        match u8::try_from(body_length) {
            Ok(data_length) if body_length <= Self::MAX_DATA_LENGTH => Self {
                report_id: KNX_REPORT_ID,
                packet_info,
                data_length,
                fault: None,
            },
            _ => {
                hid_log!(error, "body length {} exceeds {}", body_length, Self::MAX_DATA_LENGTH);
                Self {
                    report_id: KNX_REPORT_ID,
                    packet_info,
                    data_length: 0,
                    fault: Some(DecodeFault::DataLengthExceeded(body_length)),
                }
            }
        }
    }

    /// Decode the header from the start of a report.
    ///
    /// Reads the first three bytes; the slice must hold between 3 and 61
    /// bytes. Never fails: check [`is_valid`](Self::is_valid).
    pub fn decode(data: &[u8]) -> Self {
        if data.len() > Self::MAX_DATA_LENGTH {
            hid_log!(
                error,
                "KNX HID report header: received {} bytes, but expected not more than {}",
                data.len(),
                Self::MAX_DATA_LENGTH
            );
            return Self::invalid(DecodeFault::TooLong {
                max: Self::MAX_DATA_LENGTH,
                actual: data.len(),
            });
        }
        let &[report_id, info, data_length, ..] = data else {
            hid_log!(
                error,
                "KNX HID report header: received {} bytes, expected {}",
                data.len(),
                Self::SIZE
            );
            return Self::invalid(DecodeFault::WrongLength {
                expected: Self::SIZE,
                actual: data.len(),
            });
        };

        let fault = (usize::from(data_length) > Self::MAX_DATA_LENGTH)
            .then_some(DecodeFault::DataLengthExceeded(usize::from(data_length)));
        let header = Self {
            report_id,
            packet_info: PacketInfo::from_byte(info),
            data_length,
            fault,
        };
        if report_id != KNX_REPORT_ID {
            hid_log!(warn, "report id {} is not the KNX report id", report_id);
        }
        header
    }

    fn invalid(fault: DecodeFault) -> Self {
        Self {
            report_id: 0,
            packet_info: PacketInfo::unset(fault),
            data_length: 0,
            fault: Some(fault),
        }
    }

    /// Encode the three header bytes, or `None` if the header is invalid
    pub fn encode(&self) -> Option<[u8; REPORT_HEADER_SIZE]> {
        if !self.is_valid() {
            return None;
        }
        let info = self.packet_info.encode()?;
        Some([self.report_id, info, self.data_length])
    }

    /// Encode the header into a byte buffer
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<usize> {
        let bytes = self.encode().ok_or_else(|| self.invalid_error())?;
        let actual = buf.len();
        let out = buf.get_mut(..Self::SIZE).ok_or_else(|| {
            KnxHidError::invalid(DecodeFault::WrongLength {
                expected: Self::SIZE,
                actual,
            })
        })?;
        out.copy_from_slice(&bytes);
        Ok(Self::SIZE)
    }

    fn invalid_error(&self) -> KnxHidError {
        KnxHidError::invalid(self.fault().unwrap_or(DecodeFault::MissingPacketInfo))
    }

    /// Report ID (should be `0x01`)
    #[inline]
    pub const fn report_id(&self) -> u8 {
        self.report_id
    }

    /// Change the report ID.
    ///
    /// Any value is stored; values other than `0x01` log a warning and make
    /// the header invalid through the normal report id check.
    pub fn set_report_id(&mut self, value: u8) {
        if value != KNX_REPORT_ID {
            hid_log!(warn, "the report id shall have the fixed value 01h, got {}", value);
        }
        self.report_id = value;
    }

    /// Sequence number and packet type
    #[inline]
    pub const fn packet_info(&self) -> &PacketInfo {
        &self.packet_info
    }

    /// Number of meaningful bytes in the report body
    #[inline]
    pub const fn data_length(&self) -> usize {
        self.data_length as usize
    }

    /// Why the header is invalid, if it is
    pub fn fault(&self) -> Option<DecodeFault> {
        self.fault
            .or_else(|| {
                (self.report_id != KNX_REPORT_ID)
                    .then_some(DecodeFault::InvalidReportId(self.report_id))
            })
            .or_else(|| self.packet_info.fault())
    }

    /// Whether the report id is `0x01`, the data length fits the body and
    /// the packet info is valid
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.fault().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::{PacketType, SequenceNumber};

    fn start_info() -> PacketInfo {
        PacketInfo::new(SequenceNumber::First, PacketType::StartAndEnd)
    }

    #[test]
    fn test_header_decode() {
        let header = ReportHeader::decode(&[0x01, 0x13, 0x09]);
        assert!(header.is_valid());
        assert_eq!(header.report_id(), 0x01);
        assert_eq!(header.packet_info().packet_type(), Some(PacketType::StartAndEnd));
        assert_eq!(header.data_length(), 9);
        assert_eq!(header.encode(), Some([0x01, 0x13, 0x09]));
    }

    #[test]
    fn test_report_id_gate() {
        for id in [0x00, 0x02, 0x7F, 0xFF] {
            let header = ReportHeader::decode(&[id, 0x13, 0x09]);
            assert!(!header.is_valid());
            assert_eq!(header.fault(), Some(DecodeFault::InvalidReportId(id)));
            assert_eq!(header.encode(), None);
        }
    }

    #[test]
    fn test_decode_length_limits() {
        assert_eq!(
            ReportHeader::decode(&[0x01, 0x13]).fault(),
            Some(DecodeFault::WrongLength { expected: 3, actual: 2 })
        );
        assert_eq!(
            ReportHeader::decode(&[0x01; 62]).fault(),
            Some(DecodeFault::TooLong { max: 61, actual: 62 })
        );
        // Extra bytes up to 61 are ignored
        assert!(ReportHeader::decode(&[0x01, 0x13, 0x09, 0xAA]).is_valid());
    }

    #[test]
    fn test_decoded_data_length_ceiling() {
        let header = ReportHeader::decode(&[0x01, 0x13, 62]);
        assert_eq!(header.fault(), Some(DecodeFault::DataLengthExceeded(62)));
    }

    #[test]
    fn test_invalid_packet_info_propagates() {
        let header = ReportHeader::decode(&[0x01, 0x03, 0x09]);
        assert_eq!(header.fault(), Some(DecodeFault::UnknownSequenceNumber(0)));
    }

    #[test]
    fn test_for_body_ceiling() {
        assert!(ReportHeader::for_body(start_info(), 61).is_valid());
        let header = ReportHeader::for_body(start_info(), 62);
        assert!(!header.is_valid());
        assert_eq!(header.fault(), Some(DecodeFault::DataLengthExceeded(62)));
        assert!(!ReportHeader::for_body(start_info(), 300).is_valid());
    }

    #[test]
    fn test_set_report_id() {
        let mut header = ReportHeader::for_body(start_info(), 18);
        header.set_report_id(0x02);
        assert_eq!(header.report_id(), 0x02);
        assert!(!header.is_valid());
        header.set_report_id(0x01);
        assert!(header.is_valid());

        // Restoring the id never revives an out-of-range length
        let mut header = ReportHeader::for_body(start_info(), 62);
        header.set_report_id(0x01);
        assert!(!header.is_valid());
    }

    #[test]
    fn test_encode_into() {
        let header = ReportHeader::for_body(start_info(), 18);
        let mut buf = [0u8; 3];
        assert_eq!(header.encode_into(&mut buf).unwrap(), 3);
        assert_eq!(buf, [0x01, 0x13, 18]);

        let mut short = [0u8; 2];
        assert!(header.encode_into(&mut short).is_err());
    }
}
