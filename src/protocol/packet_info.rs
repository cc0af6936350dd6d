//! Sequence number / packet type descriptor (one octet of the report header).
//!
//! If a KNX frame is longer than the 61 octet report body, it is transmitted
//! in multiple HID reports. The first report always has sequence number 1,
//! also when a single report is sufficient; each following report increments
//! it. Unused bytes in the last report are filled with `00h`.
//!
//! ```text
//! ┌───────────────────┬───────────────────┐
//! │ Sequence number   │ Packet type       │
//! │ (bits 7..4)       │ (bits 3..0)       │
//! └───────────────────┴───────────────────┘
//! ```

use crate::error::DecodeFault;
use crate::protocol::constants::{PacketType, SequenceNumber};

/// Sequence number and packet type of one HID report.
///
/// Both fields are optional: a descriptor decoded from malformed input has
/// neither set and carries the reason in [`PacketInfo::fault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketInfo {
    sequence_number: Option<SequenceNumber>,
    packet_type: Option<PacketType>,
    fault: Option<DecodeFault>,
}

impl PacketInfo {
    /// Size of the encoded descriptor in bytes
    pub const SIZE: usize = 1;

    /// Create a descriptor from known field values
    pub const fn new(sequence_number: SequenceNumber, packet_type: PacketType) -> Self {
        Self {
            sequence_number: Some(sequence_number),
            packet_type: Some(packet_type),
            fault: None,
        }
    }

    /// Decode the descriptor from exactly one byte.
    ///
    /// Never fails: malformed input yields a descriptor whose
    /// [`fault`](Self::fault) names the problem. An unmapped nibble leaves
    /// the corresponding field unset.
    pub fn decode(data: &[u8]) -> Self {
        let [byte] = *data else {
            hid_log!(error, "received {} bytes, expected one byte", data.len());
            return Self::unset(DecodeFault::WrongLength {
                expected: Self::SIZE,
                actual: data.len(),
            });
        };
        Self::from_byte(byte)
    }

    /// Decode the descriptor from its octet
    pub fn from_byte(byte: u8) -> Self {
        let sequence_raw = byte >> 4;
        let type_raw = byte & 0x0F;
        let sequence_number = SequenceNumber::from_u8(sequence_raw);
        let packet_type = PacketType::from_u8(type_raw);

        let fault = if sequence_number.is_none() {
            hid_log!(error, "invalid sequence number {} in packet info", sequence_raw);
            Some(DecodeFault::UnknownSequenceNumber(sequence_raw))
        } else if packet_type.is_none() {
            hid_log!(error, "invalid packet type {} in packet info", type_raw);
            Some(DecodeFault::UnknownPacketType(type_raw))
        } else {
            None
        };

        Self {
            sequence_number,
            packet_type,
            fault,
        }
    }

    pub(crate) const fn unset(fault: DecodeFault) -> Self {
        Self {
            sequence_number: None,
            packet_type: None,
            fault: Some(fault),
        }
    }

    /// Encode to one byte, or `None` if either field is unset
    pub fn encode(&self) -> Option<u8> {
        match (self.sequence_number, self.packet_type) {
            (Some(seq), Some(ty)) => Some((seq.to_u8() << 4) | ty.to_u8()),
            _ => None,
        }
    }

    /// Sequence number, if it could be decoded
    #[inline]
    pub const fn sequence_number(&self) -> Option<SequenceNumber> {
        self.sequence_number
    }

    /// Packet type, if it could be decoded
    #[inline]
    pub const fn packet_type(&self) -> Option<PacketType> {
        self.packet_type
    }

    /// Why the descriptor is invalid, if it is
    pub const fn fault(&self) -> Option<DecodeFault> {
        match (self.fault, self.sequence_number, self.packet_type) {
            (Some(fault), _, _) => Some(fault),
            (None, Some(_), Some(_)) => None,
            _ => Some(DecodeFault::MissingPacketInfo),
        }
    }

    /// Whether both fields are present and mapped
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.fault().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_start_and_end() {
        let info = PacketInfo::decode(&[0x13]);
        assert!(info.is_valid());
        assert_eq!(info.sequence_number(), Some(SequenceNumber::First));
        assert_eq!(info.packet_type(), Some(PacketType::StartAndEnd));
        assert_eq!(info.encode(), Some(0x13));
    }

    #[test]
    fn test_decode_wrong_length() {
        let info = PacketInfo::decode(&[0x13, 0x00]);
        assert!(!info.is_valid());
        assert_eq!(info.sequence_number(), None);
        assert_eq!(info.encode(), None);
        assert_eq!(
            info.fault(),
            Some(DecodeFault::WrongLength { expected: 1, actual: 2 })
        );
        assert!(!PacketInfo::decode(&[]).is_valid());
    }

    #[test]
    fn test_sequence_zero_rejected() {
        let info = PacketInfo::from_byte(0x03);
        assert_eq!(info.fault(), Some(DecodeFault::UnknownSequenceNumber(0)));
        assert_eq!(info.packet_type(), Some(PacketType::StartAndEnd));
        assert_eq!(info.encode(), None);
    }

    #[test]
    fn test_sequence_boundaries() {
        for seq in 1u8..=5 {
            assert!(PacketInfo::from_byte((seq << 4) | 0x04).is_valid());
        }
        for seq in 6u8..=15 {
            assert_eq!(
                PacketInfo::from_byte((seq << 4) | 0x04).fault(),
                Some(DecodeFault::UnknownSequenceNumber(seq))
            );
        }
    }

    #[test]
    fn test_unknown_packet_type() {
        let info = PacketInfo::from_byte(0x1F);
        assert_eq!(info.fault(), Some(DecodeFault::UnknownPacketType(0x0F)));
        assert_eq!(info.sequence_number(), Some(SequenceNumber::First));
    }

    #[test]
    fn test_new_encodes_nibbles() {
        let info = PacketInfo::new(SequenceNumber::Third, PacketType::PartialAndEnd);
        assert_eq!(info.encode(), Some(0x36));
    }
}
