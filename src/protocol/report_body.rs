//! KNX HID report body (octets 3..64 of a HID report).
//!
//! ```text
//! start packet                        continuation packet
//! ┌─────────────────────────────┐     ┌─────────────────────────────┐
//! │ Transfer header (8 bytes)   │     │ Payload (up to 61 bytes)    │
//! ├─────────────────────────────┤     │                             │
//! │ Payload (up to 53 bytes)    │     │                             │
//! └─────────────────────────────┘     └─────────────────────────────┘
//! ```
//!
//! Whether a body is a start or a continuation packet is not encoded in the
//! body itself: the caller passes `partial` based on its reassembly state.

use crate::error::{DecodeFault, KnxHidError, Result};
use crate::protocol::constants::{EmiId, ProtocolId, REPORT_BODY_SIZE, TRANSFER_HEADER_SIZE};
use crate::protocol::transfer::{TransferBody, TransferHeader};

/// Data needed to construct a [`ReportBody`].
#[derive(Debug, Clone, Copy)]
pub struct ReportBodyData<'a> {
    /// Tunnelled protocol (ignored for continuation packets)
    pub protocol_id: ProtocolId,
    /// EMI format (ignored for continuation packets)
    pub emi_id: EmiId,
    /// Payload bytes of this report
    pub emi_data: &'a [u8],
    /// `true` for a continuation packet without transfer header
    pub partial: bool,
}

/// Body of a KNX HID report.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportBody {
    /// First report of a telegram: transfer header followed by payload
    Start {
        /// Transfer protocol header
        header: TransferHeader,
        /// Payload following the header
        payload: TransferBody,
    },
    /// Following report of a telegram: payload only
    Continuation {
        /// Payload bytes
        payload: TransferBody,
    },
    /// Input could not be split into header and payload
    Malformed {
        /// Whether a continuation packet was expected
        partial: bool,
        /// Reason the input was rejected
        fault: DecodeFault,
    },
}

impl ReportBody {
    /// Size of the body region of a report
    pub const SIZE: usize = REPORT_BODY_SIZE;

    /// Build a body from construction data.
    ///
    /// The payload is built first; a start packet then gets a transfer
    /// header declaring the payload length.
    pub fn construct(data: &ReportBodyData<'_>) -> Self {
        let payload = TransferBody::new(data.emi_data, data.partial);
        if data.partial {
            return Self::Continuation { payload };
        }
        // Payload is at most 53 bytes once valid
        let header = TransferHeader::new(payload.len() as u16, data.protocol_id, data.emi_id);
        Self::Start { header, payload }
    }

    /// Build a start packet with an explicit transfer header, whose body
    /// length may exceed this report's payload
    pub fn start(header: TransferHeader, payload: &[u8]) -> Self {
        Self::Start {
            header,
            payload: TransferBody::new(payload, false),
        }
    }

    /// Build a continuation packet
    pub fn continuation(payload: &[u8]) -> Self {
        Self::Continuation {
            payload: TransferBody::new(payload, true),
        }
    }

    /// Decode the 61 byte body region.
    ///
    /// With `partial` the whole region is payload and no transfer header is
    /// parsed. Otherwise the first 8 bytes are the transfer header and the
    /// payload is trimmed to the declared body length.
    pub fn decode(data: &[u8], partial: bool) -> Self {
        if data.len() != Self::SIZE {
            hid_log!(
                error,
                "only received {} bytes, expected {}; unused bytes in the last report shall be filled with 00h",
                data.len(),
                Self::SIZE
            );
            return Self::Malformed {
                partial,
                fault: DecodeFault::WrongLength {
                    expected: Self::SIZE,
                    actual: data.len(),
                },
            };
        }

        if partial {
            return Self::Continuation {
                payload: TransferBody::decode(data),
            };
        }

        let (header_bytes, payload_bytes) = data.split_at(TRANSFER_HEADER_SIZE);
        let header = TransferHeader::decode(header_bytes);
        let mut payload = TransferBody::decode(payload_bytes);
        if header.is_valid() {
            payload.truncate(header.body_length());
        }
        Self::Start { header, payload }
    }

    /// Encode the body region, or `None` if the body is invalid.
    ///
    /// Always produces 61 bytes; unused payload bytes are zero.
    pub fn encode(&self) -> Option<[u8; REPORT_BODY_SIZE]> {
        let mut buf = [0u8; REPORT_BODY_SIZE];
        match self {
            Self::Start { header, payload } => {
                let header_bytes = header.encode()?;
                buf[..TRANSFER_HEADER_SIZE].copy_from_slice(&header_bytes);
                payload.encode_into(&mut buf[TRANSFER_HEADER_SIZE..], false)?;
            }
            Self::Continuation { payload } => {
                payload.encode_into(&mut buf, true)?;
            }
            Self::Malformed { .. } => return None,
        }
        Some(buf)
    }

    /// Encode the body region into a byte buffer
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<usize> {
        let bytes = self.encode().ok_or_else(|| {
            KnxHidError::invalid(self.fault().unwrap_or(DecodeFault::MissingPacketInfo))
        })?;
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

    /// Number of meaningful bytes: payload length, plus 8 for the transfer
    /// header in a start packet. This is the report header's data length.
    pub fn length(&self) -> usize {
        match self {
            Self::Start { header, payload } => header.header_length() + payload.len(),
            Self::Continuation { payload } => payload.len(),
            Self::Malformed { .. } => 0,
        }
    }

    /// Whether this is a continuation packet
    pub const fn is_partial(&self) -> bool {
        match self {
            Self::Start { .. } => false,
            Self::Continuation { .. } => true,
            Self::Malformed { partial, .. } => *partial,
        }
    }

    /// Transfer header, only present in start packets
    pub const fn transfer_header(&self) -> Option<&TransferHeader> {
        match self {
            Self::Start { header, .. } => Some(header),
            _ => None,
        }
    }

    /// Payload of this report
    pub const fn payload(&self) -> Option<&TransferBody> {
        match self {
            Self::Start { payload, .. } | Self::Continuation { payload } => Some(payload),
            Self::Malformed { .. } => None,
        }
    }

    pub(crate) fn truncate_payload(&mut self, len: usize) {
        match self {
            Self::Start { payload, .. } | Self::Continuation { payload } => payload.truncate(len),
            Self::Malformed { .. } => {}
        }
    }

    /// Why the body is invalid, if it is
    pub fn fault(&self) -> Option<DecodeFault> {
        match self {
            Self::Start { header, payload } => payload.fault().or(header.fault()),
            Self::Continuation { payload } => payload.fault(),
            Self::Malformed { fault, .. } => Some(*fault),
        }
    }

    /// Payload valid and, for start packets, transfer header valid
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.fault().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_bytes(prefix: &[u8]) -> [u8; REPORT_BODY_SIZE] {
        let mut buf = [0u8; REPORT_BODY_SIZE];
        buf[..prefix.len()].copy_from_slice(prefix);
        buf
    }

    #[test]
    fn test_construct_start() {
        let body = ReportBody::construct(&ReportBodyData {
            protocol_id: ProtocolId::KnxTunnel,
            emi_id: EmiId::CommonEmi,
            emi_data: &[0xAA; 10],
            partial: false,
        });
        assert!(body.is_valid());
        assert!(!body.is_partial());
        assert_eq!(body.length(), 18);
        assert_eq!(body.transfer_header().map(TransferHeader::body_length), Some(10));

        let bytes = body.encode().unwrap();
        assert_eq!(&bytes[..8], &[0x00, 0x08, 0x00, 0x0A, 0x01, 0x03, 0x00, 0x00]);
        assert_eq!(&bytes[8..18], &[0xAA; 10]);
        assert!(bytes[18..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_construct_continuation() {
        let body = ReportBody::construct(&ReportBodyData {
            protocol_id: ProtocolId::KnxTunnel,
            emi_id: EmiId::CommonEmi,
            emi_data: &[0x55; 61],
            partial: true,
        });
        assert!(body.is_valid());
        assert!(body.transfer_header().is_none());
        assert_eq!(body.length(), 61);
        assert_eq!(body.encode().unwrap(), [0x55; 61]);
    }

    #[test]
    fn test_construct_oversized_start() {
        let body = ReportBody::construct(&ReportBodyData {
            protocol_id: ProtocolId::KnxTunnel,
            emi_id: EmiId::CommonEmi,
            emi_data: &[0xAA; 54],
            partial: false,
        });
        assert!(!body.is_valid());
        assert_eq!(body.encode(), None);
    }

    #[test]
    fn test_decode_wrong_length() {
        let body = ReportBody::decode(&[0u8; 60], false);
        assert!(!body.is_valid());
        assert_eq!(body.fault(), Some(DecodeFault::WrongLength { expected: 61, actual: 60 }));
        assert_eq!(body.length(), 0);
        assert!(ReportBody::decode(&[0u8; 62], true).is_partial());
    }

    #[test]
    fn test_decode_start_trims_to_body_length() {
        let data = body_bytes(&[0x00, 0x08, 0x00, 0x03, 0x01, 0x03, 0x00, 0x00, 0x29, 0x00, 0xBC]);
        let body = ReportBody::decode(&data, false);
        assert!(body.is_valid());
        assert_eq!(body.payload().map(TransferBody::data), Some(&[0x29, 0x00, 0xBC][..]));
        assert_eq!(body.length(), 11);
        assert_eq!(body.encode(), Some(data));
    }

    #[test]
    fn test_continuation_never_parses_header() {
        // Looks exactly like a valid transfer header
        let data = body_bytes(&[0x00, 0x08, 0x00, 0x01, 0x01, 0x03, 0x00, 0x00, 0x11]);
        let body = ReportBody::decode(&data, true);
        assert!(body.is_valid());
        assert!(body.transfer_header().is_none());
        assert_eq!(body.payload().map(TransferBody::len), Some(61));
        assert_eq!(body.payload().map(|p| &p.data()[..9]), Some(&data[..9]));
    }

    #[test]
    fn test_invalid_transfer_header_invalidates_start() {
        let data = body_bytes(&[0x00, 0x08, 0x00, 0x01, 0x07, 0x03, 0x00, 0x00]);
        let body = ReportBody::decode(&data, false);
        assert_eq!(body.fault(), Some(DecodeFault::UnknownProtocolId(7)));
        assert_eq!(body.encode(), None);
    }
}
