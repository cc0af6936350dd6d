//! KNX USB Transfer Protocol header and body.
//!
//! The transfer protocol header is only located in the start packet of a
//! telegram. It identifies the tunnelled protocol and EMI format and
//! declares the length of the whole transfer protocol body, which may span
//! several HID reports.
//!
//! ```text
//! ┌──────────────┬──────────────┬─────────────────────┐
//! │ Protocol Ver │ Header Len   │  Body Length        │
//! │   (0x00)     │   (0x08)     │   (2 bytes, BE)     │
//! ├──────────────┼──────────────┼─────────────────────┤
//! │ Protocol ID  │ EMI ID       │  Manufacturer Code  │
//! │   (1 byte)   │   (1 byte)   │   (2 bytes, BE)     │
//! └──────────────┴──────────────┴─────────────────────┘
//! ```
//!
//! The body is opaque to this crate. Its first octet is the EMI message
//! code, which tells whether the frame is a request, response or
//! indication.

use heapless::Vec;

use crate::error::DecodeFault;
use crate::protocol::constants::{
    EmiId, ProtocolId, CONTINUATION_PAYLOAD_SIZE, STANDARD_MANUFACTURER_CODE, START_PAYLOAD_SIZE,
    TRANSFER_HEADER_SIZE, TRANSFER_PROTOCOL_VERSION,
};

/// KNX USB Transfer Protocol header (8 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferHeader {
    protocol_version: u8,
    header_length: u8,
    body_length: u16,
    protocol_id: Option<ProtocolId>,
    emi_id: Option<EmiId>,
    manufacturer_code: u16,
    fault: Option<DecodeFault>,
}

impl TransferHeader {
    /// Size of the header in bytes
    pub const SIZE: usize = TRANSFER_HEADER_SIZE;

    /// Create a protocol version 0 header for a body of `body_length` bytes
    pub const fn new(body_length: u16, protocol_id: ProtocolId, emi_id: EmiId) -> Self {
        Self {
            protocol_version: TRANSFER_PROTOCOL_VERSION,
            header_length: TRANSFER_HEADER_SIZE as u8,
            body_length,
            protocol_id: Some(protocol_id),
            emi_id: Some(emi_id),
            manufacturer_code: STANDARD_MANUFACTURER_CODE,
            fault: None,
        }
    }

    /// Set the manufacturer code, for frames that do not fully comply with
    /// the standard named by the protocol id
    #[must_use]
    pub const fn with_manufacturer_code(mut self, manufacturer_code: u16) -> Self {
        self.manufacturer_code = manufacturer_code;
        self
    }

    /// Decode the header from exactly 8 bytes.
    ///
    /// Never fails: check [`is_valid`](Self::is_valid). A header length
    /// other than 8 means the whole report shall be rejected.
    pub fn decode(data: &[u8]) -> Self {
        let &[protocol_version, header_length, len_hi, len_lo, protocol_raw, emi_raw, mc_hi, mc_lo] =
            data
        else {
            hid_log!(
                error,
                "transfer header: received {} bytes, expected {}",
                data.len(),
                Self::SIZE
            );
            return Self {
                protocol_version: 0,
                header_length: 0,
                body_length: 0,
                protocol_id: None,
                emi_id: None,
                manufacturer_code: 0,
                fault: Some(DecodeFault::WrongLength {
                    expected: Self::SIZE,
                    actual: data.len(),
                }),
            };
        };

        let protocol_id = ProtocolId::from_u8(protocol_raw);
        let emi_id = EmiId::from_u8(emi_raw);

        let fault = if protocol_version != TRANSFER_PROTOCOL_VERSION {
            Some(DecodeFault::UnsupportedProtocolVersion(protocol_version))
        } else if usize::from(header_length) != Self::SIZE {
            Some(DecodeFault::InvalidHeaderLength(header_length))
        } else if protocol_id.is_none() {
            Some(DecodeFault::UnknownProtocolId(protocol_raw))
        } else if emi_id.is_none() {
            Some(DecodeFault::UnknownEmiId(emi_raw))
        } else {
            None
        };
        if let Some(fault) = fault {
            hid_log!(error, "invalid transfer header: {:?}", fault);
        }

        Self {
            protocol_version,
            header_length,
            body_length: u16::from_be_bytes([len_hi, len_lo]),
            protocol_id,
            emi_id,
            manufacturer_code: u16::from_be_bytes([mc_hi, mc_lo]),
            fault,
        }
    }

    /// Encode the header, or `None` if it is invalid
    pub fn encode(&self) -> Option<[u8; TRANSFER_HEADER_SIZE]> {
        if self.fault.is_some() {
            return None;
        }
        let (protocol_id, emi_id) = (self.protocol_id?, self.emi_id?);
        let [len_hi, len_lo] = self.body_length.to_be_bytes();
        let [mc_hi, mc_lo] = self.manufacturer_code.to_be_bytes();
        Some([
            self.protocol_version,
            self.header_length,
            len_hi,
            len_lo,
            protocol_id.to_u8(),
            emi_id.to_u8(),
            mc_hi,
            mc_lo,
        ])
    }

    /// Protocol version (only `0` is defined)
    #[inline]
    pub const fn protocol_version(&self) -> u8 {
        self.protocol_version
    }

    /// Header length field (always 8 for protocol version 0)
    #[inline]
    pub const fn header_length(&self) -> usize {
        self.header_length as usize
    }

    /// Length of the whole transfer protocol body, across all reports
    #[inline]
    pub const fn body_length(&self) -> usize {
        self.body_length as usize
    }

    /// Tunnelled protocol, if known
    #[inline]
    pub const fn protocol_id(&self) -> Option<ProtocolId> {
        self.protocol_id
    }

    /// EMI format of the body, if known
    #[inline]
    pub const fn emi_id(&self) -> Option<EmiId> {
        self.emi_id
    }

    /// Manufacturer code (`0000h` for standard frames)
    #[inline]
    pub const fn manufacturer_code(&self) -> u16 {
        self.manufacturer_code
    }

    /// Why the header is invalid, if it is
    #[inline]
    pub const fn fault(&self) -> Option<DecodeFault> {
        self.fault
    }

    /// Whether all fields were parsed and mapped
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.fault.is_none()
    }
}

/// Payload carried by one HID report.
///
/// Holds at most 53 bytes in a start packet and 61 bytes in a continuation
/// packet. Encoding pads with `00h` up to that capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferBody {
    data: Vec<u8, CONTINUATION_PAYLOAD_SIZE>,
    fault: Option<DecodeFault>,
}

impl TransferBody {
    /// Capacity of the payload region of a report
    pub const fn capacity(partial: bool) -> usize {
        if partial {
            CONTINUATION_PAYLOAD_SIZE
        } else {
            START_PAYLOAD_SIZE
        }
    }

    /// Build a payload for a start (`partial = false`) or continuation
    /// packet. Data longer than the capacity yields an invalid, empty body.
    pub fn new(data: &[u8], partial: bool) -> Self {
        let max = Self::capacity(partial);
        match Vec::from_slice(data) {
            Ok(data) if data.len() <= max => Self { data, fault: None },
            _ => {
                hid_log!(error, "payload of {} bytes exceeds {}", data.len(), max);
                Self {
                    data: Vec::new(),
                    fault: Some(DecodeFault::TooLong {
                        max,
                        actual: data.len(),
                    }),
                }
            }
        }
    }

    /// Decode the payload region of a report.
    ///
    /// `data` must be exactly 53 bytes (start packet) or 61 bytes
    /// (continuation packet); the whole region is kept, padding included.
    pub fn decode(data: &[u8]) -> Self {
        if data.len() != START_PAYLOAD_SIZE && data.len() != CONTINUATION_PAYLOAD_SIZE {
            hid_log!(
                error,
                "received {} bytes, expected {} bytes for start packets, or {} bytes for partial packets",
                data.len(),
                START_PAYLOAD_SIZE,
                CONTINUATION_PAYLOAD_SIZE
            );
            return Self {
                data: Vec::new(),
                fault: Some(DecodeFault::WrongLength {
                    expected: CONTINUATION_PAYLOAD_SIZE,
                    actual: data.len(),
                }),
            };
        }
        Self::new(data, data.len() == CONTINUATION_PAYLOAD_SIZE)
    }

    /// Drop trailing bytes beyond `len` (padding of the last report)
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    /// Encode into `buf`, padding with zeros up to the packet capacity.
    ///
    /// Returns the number of bytes written, or `None` if the body is
    /// invalid or `buf` is smaller than the capacity.
    pub fn encode_into(&self, buf: &mut [u8], partial: bool) -> Option<usize> {
        if self.fault.is_some() {
            return None;
        }
        let capacity = Self::capacity(partial);
        if self.data.len() > capacity {
            return None;
        }
        let out = buf.get_mut(..capacity)?;
        out.fill(0);
        out[..self.data.len()].copy_from_slice(&self.data);
        Some(capacity)
    }

    /// Payload bytes
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// First payload octet, the EMI message code in a start packet
    #[inline]
    pub fn emi_message_code(&self) -> Option<u8> {
        self.data.first().copied()
    }

    /// Number of payload bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Why the body is invalid, if it is
    #[inline]
    pub const fn fault(&self) -> Option<DecodeFault> {
        self.fault
    }

    /// Whether the payload fits its packet
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.fault.is_none()
    }
}
