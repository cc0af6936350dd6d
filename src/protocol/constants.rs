//! KNX USB HID layout constants and field enumerations.

/// Size of every KNX HID report
pub const HID_REPORT_SIZE: usize = 64;

/// Size of the KNX HID report header (report id, packet info, data length)
pub const REPORT_HEADER_SIZE: usize = 3;

/// Size of the KNX HID report body, also the maximum data length
pub const REPORT_BODY_SIZE: usize = HID_REPORT_SIZE - REPORT_HEADER_SIZE;

/// Fixed report ID of KNX HID reports
pub const KNX_REPORT_ID: u8 = 0x01;

/// Size of the KNX USB Transfer Protocol header
pub const TRANSFER_HEADER_SIZE: usize = 8;

/// Only defined KNX USB Transfer Protocol version
pub const TRANSFER_PROTOCOL_VERSION: u8 = 0x00;

/// Payload capacity of a start packet
pub const START_PAYLOAD_SIZE: usize = REPORT_BODY_SIZE - TRANSFER_HEADER_SIZE;

/// Payload capacity of a continuation packet
pub const CONTINUATION_PAYLOAD_SIZE: usize = REPORT_BODY_SIZE;

/// Highest sequence number a telegram may use
pub const MAX_PACKETS_PER_TELEGRAM: usize = 5;

/// Largest telegram that fits in five reports (53 + 4 × 61)
pub const MAX_TELEGRAM_SIZE: usize =
    START_PAYLOAD_SIZE + (MAX_PACKETS_PER_TELEGRAM - 1) * CONTINUATION_PAYLOAD_SIZE;

/// Manufacturer code for frames that fully comply with the standard
pub const STANDARD_MANUFACTURER_CODE: u16 = 0x0000;

// =============================================================================
// Sequence Number
// =============================================================================

/// Position of a report within a telegram (high nibble of packet info).
///
/// | Value | Meaning                     |
/// |:------|:----------------------------|
/// | 0h    | reserved; shall not be used |
/// | 1h–5h | 1st to 5th packet           |
/// | other | reserved; not used          |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SequenceNumber {
    /// Start packet (also used for single-packet telegrams)
    First = 1,
    /// 2nd packet
    Second = 2,
    /// 3rd packet
    Third = 3,
    /// 4th packet
    Fourth = 4,
    /// 5th packet
    Fifth = 5,
}

impl SequenceNumber {
    /// Convert a nibble value to `SequenceNumber`
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::First),
            2 => Some(Self::Second),
            3 => Some(Self::Third),
            4 => Some(Self::Fourth),
            5 => Some(Self::Fifth),
            _ => None,
        }
    }

    /// Convert `SequenceNumber` to its nibble value
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// The sequence number of the following report, if any
    pub const fn next(self) -> Option<Self> {
        Self::from_u8(self.to_u8() + 1)
    }
}

// =============================================================================
// Packet Type
// =============================================================================

/// Packet type (low nibble of packet info).
///
/// Bit 0 marks a start packet, bit 1 an end packet and bit 2 a partial
/// packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum PacketType {
    /// Single-packet telegram
    StartAndEnd = 0x03,
    /// Middle packet of a telegram
    Partial = 0x04,
    /// First packet of a multi-packet telegram
    StartAndPartial = 0x05,
    /// Last packet of a multi-packet telegram
    PartialAndEnd = 0x06,
}

impl PacketType {
    /// Convert a nibble value to `PacketType`
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x03 => Some(Self::StartAndEnd),
            0x04 => Some(Self::Partial),
            0x05 => Some(Self::StartAndPartial),
            0x06 => Some(Self::PartialAndEnd),
            _ => None,
        }
    }

    /// Convert `PacketType` to its nibble value
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Whether this packet opens a telegram (carries a transfer header)
    pub const fn is_start(self) -> bool {
        self.to_u8() & 0x01 != 0
    }

    /// Whether this packet closes a telegram
    pub const fn is_end(self) -> bool {
        self.to_u8() & 0x02 != 0
    }
}

// =============================================================================
// Protocol ID
// =============================================================================

/// Main protocol separator of the KNX USB Transfer Protocol header (octet 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ProtocolId {
    /// KNX link layer tunnel
    KnxTunnel = 0x01,
    /// M-Bus tunnel
    MBusTunnel = 0x02,
    /// BatiBus tunnel
    BatiBusTunnel = 0x03,
    /// Bus access server feature service (device feature get/set/info)
    BusAccessServerFeatureService = 0x0F,
}

impl ProtocolId {
    /// Convert a u8 to `ProtocolId`
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::KnxTunnel),
            0x02 => Some(Self::MBusTunnel),
            0x03 => Some(Self::BatiBusTunnel),
            0x0F => Some(Self::BusAccessServerFeatureService),
            _ => None,
        }
    }

    /// Convert `ProtocolId` to u8
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

// =============================================================================
// EMI ID
// =============================================================================

/// EMI format of the transfer protocol body (octet 6 of the header).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum EmiId {
    /// EMI1
    Emi1 = 0x01,
    /// EMI2
    Emi2 = 0x02,
    /// Common EMI (cEMI)
    CommonEmi = 0x03,
}

impl EmiId {
    /// Convert a u8 to `EmiId`
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Emi1),
            0x02 => Some(Self::Emi2),
            0x03 => Some(Self::CommonEmi),
            _ => None,
        }
    }

    /// Convert `EmiId` to u8
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}
