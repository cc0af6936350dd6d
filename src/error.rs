//! Error types for KNX USB HID operations.
//!
//! Two layers of errors live here:
//!
//! - [`DecodeFault`] is a small `Copy` reason code. Every decoded structure
//!   carries an `Option<DecodeFault>` instead of aborting, so a truncated or
//!   corrupted report still yields an inspectable value.
//! - [`KnxHidError`] is the error returned by fallible operations (encoding
//!   an invalid frame, reassembly, transport and configuration). It follows
//!   the same category/kind layout for every variant and captures a backtrace
//!   when the `std` feature is enabled.

use core::fmt;

#[cfg(feature = "std")]
use std::backtrace::Backtrace;

/// Result type alias for KNX USB HID operations.
pub type Result<T> = core::result::Result<T, KnxHidError>;

// =============================================================================
// Decode Faults (validity reason codes)
// =============================================================================

/// Broad class of a [`DecodeFault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultCategory {
    /// Input buffer has the wrong size for the layer
    Length,
    /// A field value does not map to any enumeration variant
    Enumeration,
    /// A field value is out of range or a nested component is invalid
    Structure,
}

/// Reason a decoded or constructed structure is not valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeFault {
    /// A fixed-size field received the wrong number of bytes
    WrongLength {
        /// Number of bytes the layer requires
        expected: usize,
        /// Number of bytes received
        actual: usize,
    },
    /// A variable-size field received more bytes than it can hold
    TooLong {
        /// Maximum number of bytes the layer accepts
        max: usize,
        /// Number of bytes received
        actual: usize,
    },
    /// High nibble of the packet info byte is not a sequence number (1..=5)
    UnknownSequenceNumber(u8),
    /// Low nibble of the packet info byte is not a packet type
    UnknownPacketType(u8),
    /// Protocol ID octet is not a known protocol
    UnknownProtocolId(u8),
    /// EMI ID octet is not a known EMI format
    UnknownEmiId(u8),
    /// Packet info has no sequence number or packet type
    MissingPacketInfo,
    /// Report ID is not `0x01`
    InvalidReportId(u8),
    /// Report data length exceeds the 61 byte body
    DataLengthExceeded(usize),
    /// Data length of a start packet is below the 8 byte transfer header
    DataLengthTooShort(usize),
    /// Transfer protocol version is not `0`
    UnsupportedProtocolVersion(u8),
    /// Transfer protocol header length is not `8`
    InvalidHeaderLength(u8),
}

impl DecodeFault {
    /// Class of this fault.
    pub const fn category(&self) -> FaultCategory {
        match self {
            Self::WrongLength { .. } | Self::TooLong { .. } => FaultCategory::Length,
            Self::UnknownSequenceNumber(_)
            | Self::UnknownPacketType(_)
            | Self::UnknownProtocolId(_)
            | Self::UnknownEmiId(_) => FaultCategory::Enumeration,
            Self::MissingPacketInfo
            | Self::InvalidReportId(_)
            | Self::DataLengthExceeded(_)
            | Self::DataLengthTooShort(_)
            | Self::UnsupportedProtocolVersion(_)
            | Self::InvalidHeaderLength(_) => FaultCategory::Structure,
        }
    }
}

impl fmt::Display for DecodeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongLength { expected, actual } => {
                write!(f, "received {actual} bytes, expected {expected}")
            }
            Self::TooLong { max, actual } => {
                write!(f, "received {actual} bytes, expected not more than {max}")
            }
            Self::UnknownSequenceNumber(v) => write!(f, "unknown sequence number {v:#x}"),
            Self::UnknownPacketType(v) => write!(f, "unknown packet type {v:#x}"),
            Self::UnknownProtocolId(v) => write!(f, "unknown protocol id {v:#04x}"),
            Self::UnknownEmiId(v) => write!(f, "unknown EMI id {v:#04x}"),
            Self::MissingPacketInfo => write!(f, "sequence number or packet type not set"),
            Self::InvalidReportId(v) => write!(f, "report id {v:#04x}, expected 0x01"),
            Self::DataLengthExceeded(v) => write!(f, "data length {v} exceeds 61"),
            Self::DataLengthTooShort(v) => {
                write!(f, "data length {v} does not cover the transfer header")
            }
            Self::UnsupportedProtocolVersion(v) => write!(f, "unsupported protocol version {v}"),
            Self::InvalidHeaderLength(v) => write!(f, "header length {v}, expected 8"),
        }
    }
}

// =============================================================================
// Error Kind Enums (Internal)
// =============================================================================

/// Reassembly error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum ReassemblyErrorKind {
    SequenceGap { expected: u8, received: u8 },
    LengthOverflow { declared: usize, accumulated: usize },
    DeclaredLengthTooLarge(usize),
    UnexpectedPacketType(u8),
    NotAStartPacket,
    InvalidFrame(DecodeFault),
    TooLarge(usize),
}

/// Transport error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum TransportErrorKind {
    WriteFailed,
    ReadFailed,
    ShortReport(usize),
    NotReady,
}

/// Configuration error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum ConfigErrorKind {
    InvalidNumber,
    InvalidBool,
    UnknownProtocolId(u8),
    UnknownEmiId(u8),
}

// =============================================================================
// Main Error Type
// =============================================================================

/// KNX USB HID error types.
///
/// This is the main error type returned by all fallible operations.
/// It contains a backtrace (when std feature is enabled) and detailed
/// error information through helper methods.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KnxHidError {
    /// A structure is invalid and cannot be encoded or consumed
    Decode(DecodeError),
    /// A multi-report telegram could not be reassembled
    Reassembly(ReassemblyError),
    /// The HID transport failed
    Transport(TransportError),
    /// Configuration text could not be parsed
    Config(ConfigError),
    /// No report arrived in time
    Timeout,
}

// =============================================================================
// Structured Error Types
// =============================================================================

/// Invalid structure error with optional backtrace
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodeError {
    fault: DecodeFault,
    #[cfg(feature = "std")]
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    backtrace: Backtrace,
}

impl DecodeError {
    pub(crate) fn new(fault: DecodeFault) -> Self {
        Self {
            fault,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Backtrace captured where the error was created
    #[cfg(feature = "std")]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// The reason code of the invalid structure
    pub fn fault(&self) -> DecodeFault {
        self.fault
    }

    /// Check if the input had the wrong size
    pub fn is_length_error(&self) -> bool {
        self.fault.category() == FaultCategory::Length
    }
}

/// Reassembly error with optional backtrace
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReassemblyError {
    kind: ReassemblyErrorKind,
    #[cfg(feature = "std")]
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    backtrace: Backtrace,
}

impl ReassemblyError {
    pub(crate) fn new(kind: ReassemblyErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Backtrace captured where the error was created
    #[cfg(feature = "std")]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Check if a sequence number was skipped or repeated
    pub fn is_sequence_gap(&self) -> bool {
        matches!(self.kind, ReassemblyErrorKind::SequenceGap { .. })
    }

    /// Check if more payload arrived than the transfer header declared
    pub fn is_length_overflow(&self) -> bool {
        matches!(self.kind, ReassemblyErrorKind::LengthOverflow { .. })
    }

    /// Check if the telegram cannot fit in five reports
    pub fn is_too_large(&self) -> bool {
        matches!(
            self.kind,
            ReassemblyErrorKind::DeclaredLengthTooLarge(_) | ReassemblyErrorKind::TooLarge(_)
        )
    }

    /// Check if an invalid frame interrupted the telegram
    pub fn is_invalid_frame(&self) -> bool {
        matches!(self.kind, ReassemblyErrorKind::InvalidFrame(_))
    }

    /// Check if a frame was not a start packet where one was required
    pub fn is_not_start_packet(&self) -> bool {
        matches!(self.kind, ReassemblyErrorKind::NotAStartPacket)
    }

    /// Check if a frame carried a packet type not allowed at its position
    pub fn is_unexpected_packet_type(&self) -> bool {
        matches!(self.kind, ReassemblyErrorKind::UnexpectedPacketType(_))
    }
}

/// Transport error with optional backtrace
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransportError {
    kind: TransportErrorKind,
    #[cfg(feature = "std")]
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    backtrace: Backtrace,
}

impl TransportError {
    pub(crate) fn new(kind: TransportErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Backtrace captured where the error was created
    #[cfg(feature = "std")]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Check if a report could not be written
    pub fn is_write_failed(&self) -> bool {
        matches!(self.kind, TransportErrorKind::WriteFailed)
    }

    /// Check if a report was shorter than 64 bytes and rejected
    pub fn is_short_report(&self) -> bool {
        matches!(self.kind, TransportErrorKind::ShortReport(_))
    }

    /// Check if the transport was not ready
    pub fn is_not_ready(&self) -> bool {
        matches!(self.kind, TransportErrorKind::NotReady)
    }
}

/// Configuration error with optional backtrace
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigError {
    kind: ConfigErrorKind,
    #[cfg(feature = "std")]
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    backtrace: Backtrace,
}

impl ConfigError {
    pub(crate) fn new(kind: ConfigErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Backtrace captured where the error was created
    #[cfg(feature = "std")]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Check if a value could not be parsed as a number
    pub fn is_invalid_number(&self) -> bool {
        matches!(self.kind, ConfigErrorKind::InvalidNumber)
    }

    /// Check if a protocol or EMI id is not a known variant
    pub fn is_unknown_id(&self) -> bool {
        matches!(
            self.kind,
            ConfigErrorKind::UnknownProtocolId(_) | ConfigErrorKind::UnknownEmiId(_)
        )
    }
}

// =============================================================================
// Convenience Constructors for KnxHidError
// =============================================================================

impl KnxHidError {
    /// Error for a structure whose validity check failed
    pub fn invalid(fault: DecodeFault) -> Self {
        Self::Decode(DecodeError::new(fault))
    }

    // Reassembly errors
    pub(crate) fn sequence_gap(expected: u8, received: u8) -> Self {
        Self::Reassembly(ReassemblyError::new(ReassemblyErrorKind::SequenceGap {
            expected,
            received,
        }))
    }

    pub(crate) fn length_overflow(declared: usize, accumulated: usize) -> Self {
        Self::Reassembly(ReassemblyError::new(ReassemblyErrorKind::LengthOverflow {
            declared,
            accumulated,
        }))
    }

    pub(crate) fn declared_length_too_large(declared: usize) -> Self {
        Self::Reassembly(ReassemblyError::new(
            ReassemblyErrorKind::DeclaredLengthTooLarge(declared),
        ))
    }

    pub(crate) fn unexpected_packet_type(raw: u8) -> Self {
        Self::Reassembly(ReassemblyError::new(
            ReassemblyErrorKind::UnexpectedPacketType(raw),
        ))
    }

    pub(crate) fn not_a_start_packet() -> Self {
        Self::Reassembly(ReassemblyError::new(ReassemblyErrorKind::NotAStartPacket))
    }

    pub(crate) fn aborted_by_invalid_frame(fault: DecodeFault) -> Self {
        Self::Reassembly(ReassemblyError::new(ReassemblyErrorKind::InvalidFrame(fault)))
    }

    pub(crate) fn telegram_too_large(len: usize) -> Self {
        Self::Reassembly(ReassemblyError::new(ReassemblyErrorKind::TooLarge(len)))
    }

    // Transport errors
    /// A report could not be written to the device
    pub fn write_failed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::WriteFailed))
    }

    /// A report could not be read from the device
    pub fn read_failed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::ReadFailed))
    }

    pub(crate) fn short_report(len: usize) -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::ShortReport(len)))
    }

    pub(crate) fn transport_not_ready() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::NotReady))
    }

    // Configuration errors
    pub(crate) fn invalid_number() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::InvalidNumber))
    }

    pub(crate) fn invalid_bool() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::InvalidBool))
    }

    pub(crate) fn unknown_protocol_id(raw: u8) -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::UnknownProtocolId(raw)))
    }

    pub(crate) fn unknown_emi_id(raw: u8) -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::UnknownEmiId(raw)))
    }

    /// Check if this error aborted a telegram during reassembly
    pub fn is_reassembly(&self) -> bool {
        matches!(self, Self::Reassembly(_))
    }
}

// =============================================================================
// Display Implementation
// =============================================================================

impl fmt::Display for ReassemblyErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SequenceGap { expected, received } => {
                write!(f, "sequence number {received}, expected {expected}")
            }
            Self::LengthOverflow {
                declared,
                accumulated,
            } => write!(f, "{accumulated} bytes received, header declared {declared}"),
            Self::DeclaredLengthTooLarge(v) => write!(f, "declared length {v} exceeds 297"),
            Self::UnexpectedPacketType(v) => write!(f, "unexpected packet type {v:#x}"),
            Self::NotAStartPacket => write!(f, "no transfer header in first report"),
            Self::InvalidFrame(fault) => write!(f, "telegram aborted by invalid report: {fault}"),
            Self::TooLarge(v) => write!(f, "telegram of {v} bytes exceeds 297"),
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteFailed => write!(f, "write failed"),
            Self::ReadFailed => write!(f, "read failed"),
            Self::ShortReport(v) => write!(f, "short report of {v} bytes"),
            Self::NotReady => write!(f, "device not open"),
        }
    }
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNumber => write!(f, "invalid number"),
            Self::InvalidBool => write!(f, "invalid boolean"),
            Self::UnknownProtocolId(v) => write!(f, "unknown protocol id {v:#04x}"),
            Self::UnknownEmiId(v) => write!(f, "unknown EMI id {v:#04x}"),
        }
    }
}

impl fmt::Display for KnxHidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnxHidError::Decode(e) => write!(f, "Invalid structure: {}", e.fault),
            KnxHidError::Reassembly(e) => write!(f, "Reassembly error: {}", e.kind),
            KnxHidError::Transport(e) => write!(f, "Transport error: {}", e.kind),
            KnxHidError::Config(e) => write!(f, "Configuration error: {}", e.kind),
            KnxHidError::Timeout => write!(f, "Operation timeout"),
        }
    }
}

// Implement std::error::Error for std-based applications
#[cfg(feature = "std")]
impl std::error::Error for KnxHidError {}
