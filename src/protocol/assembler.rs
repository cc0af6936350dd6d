//! Reassembly of KNX telegrams split across HID reports.
//!
//! ## State Machine
//!
//! ```text
//!                 start packet, fits
//!   AwaitingStart ───────────────────────────────→ (telegram complete)
//!        │  ↑
//!        │  │ complete / abort
//!        ↓  │
//!   Assembling { next } ── continuation ──→ Assembling { next + 1 }
//! ```
//!
//! The first report carries sequence number 1 and the transfer header that
//! declares the total length. Each following report must carry the next
//! sequence number; the telegram is complete once the accumulated payload
//! reaches the declared length. Any invalid report, sequence gap or excess
//! payload aborts the telegram and the assembler waits for the next start
//! packet. A start packet (sequence 1, start type) arriving mid-telegram
//! drops the old telegram and begins a new one.
//!
//! One assembler belongs to exactly one USB connection.

use heapless::Vec;

use crate::error::{DecodeFault, KnxHidError, Result};
use crate::protocol::constants::{
    EmiId, PacketType, ProtocolId, SequenceNumber, MAX_TELEGRAM_SIZE, STANDARD_MANUFACTURER_CODE,
};
use crate::protocol::frame::Frame;

/// A complete KNX USB transfer protocol body with its identification.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Telegram {
    protocol_id: ProtocolId,
    emi_id: EmiId,
    manufacturer_code: u16,
    data: Vec<u8, MAX_TELEGRAM_SIZE>,
}

impl Telegram {
    /// Wrap EMI bytes for transmission.
    ///
    /// # Errors
    ///
    /// Returns a reassembly error if `data` does not fit in five reports
    /// (more than 297 bytes).
    pub fn new(protocol_id: ProtocolId, emi_id: EmiId, data: &[u8]) -> Result<Self> {
        let data = Vec::from_slice(data).map_err(|_capacity| KnxHidError::telegram_too_large(data.len()))?;
        Ok(Self {
            protocol_id,
            emi_id,
            manufacturer_code: STANDARD_MANUFACTURER_CODE,
            data,
        })
    }

    /// Set a manufacturer code for non-standard frames
    #[must_use]
    pub fn with_manufacturer_code(mut self, manufacturer_code: u16) -> Self {
        self.manufacturer_code = manufacturer_code;
        self
    }

    /// Tunnelled protocol
    #[inline]
    pub const fn protocol_id(&self) -> ProtocolId {
        self.protocol_id
    }

    /// EMI format of the data
    #[inline]
    pub const fn emi_id(&self) -> EmiId {
        self.emi_id
    }

    /// Manufacturer code from the transfer header
    #[inline]
    pub const fn manufacturer_code(&self) -> u16 {
        self.manufacturer_code
    }

    /// EMI bytes, message code first
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// EMI message code (first data octet)
    #[inline]
    pub fn emi_message_code(&self) -> Option<u8> {
        self.data.first().copied()
    }
}

/// Reassembly progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AssemblerState {
    /// Waiting for a start packet (sequence number 1)
    AwaitingStart,
    /// Collecting continuation packets
    Assembling {
        /// Sequence number the next report must carry
        next: SequenceNumber,
        /// Total length declared by the transfer header
        declared: usize,
        /// Payload bytes collected so far
        received: usize,
    },
}

/// Telegram reassembler for one USB connection.
#[derive(Debug, Clone)]
pub struct TelegramAssembler {
    state: AssemblerState,
    /// Telegram in progress, identified from its start packet
    pending: Option<Telegram>,
}

impl Default for TelegramAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl TelegramAssembler {
    /// Create an assembler waiting for a start packet
    pub const fn new() -> Self {
        Self {
            state: AssemblerState::AwaitingStart,
            pending: None,
        }
    }

    /// Current state
    #[inline]
    pub const fn state(&self) -> AssemblerState {
        self.state
    }

    /// Whether the next report must be decoded as a continuation packet
    #[inline]
    pub const fn expects_continuation(&self) -> bool {
        matches!(self.state, AssemblerState::Assembling { .. })
    }

    /// Drop any partially assembled telegram
    pub fn reset(&mut self) {
        self.state = AssemblerState::AwaitingStart;
        self.pending = None;
    }

    /// Decode a raw HID report in the current state and process it.
    ///
    /// Returns `Ok(Some(telegram))` when the report completes a telegram and
    /// `Ok(None)` when more reports are needed.
    pub fn feed(&mut self, report: &[u8]) -> Result<Option<Telegram>> {
        let partial = self.expects_continuation() && !announces_start(report);
        let frame = Frame::decode(report, partial);
        self.push(&frame)
    }

    /// Process an already decoded frame.
    ///
    /// # Errors
    ///
    /// Any error aborts the telegram in progress; the assembler is then
    /// waiting for a start packet again.
    pub fn push(&mut self, frame: &Frame) -> Result<Option<Telegram>> {
        let result = self.process(frame);
        if result.is_err() {
            if let AssemblerState::Assembling { received, .. } = self.state {
                hid_log!(warn, "aborting telegram after {} bytes", received);
            }
            self.reset();
        }
        result
    }

    fn process(&mut self, frame: &Frame) -> Result<Option<Telegram>> {
        if let Some(fault) = frame.fault() {
            return Err(if self.expects_continuation() {
                KnxHidError::aborted_by_invalid_frame(fault)
            } else {
                KnxHidError::invalid(fault)
            });
        }

        let info = frame.report_header().packet_info();
        let (Some(sequence), Some(packet_type)) = (info.sequence_number(), info.packet_type())
        else {
            return Err(KnxHidError::invalid(DecodeFault::MissingPacketInfo));
        };

        match self.state {
            AssemblerState::AwaitingStart => self.start(frame, sequence, packet_type),
            AssemblerState::Assembling { received, .. }
                if !frame.is_partial()
                    && sequence == SequenceNumber::First
                    && packet_type.is_start() =>
            {
                hid_log!(
                    warn,
                    "start packet interrupts telegram after {} bytes",
                    received
                );
                self.reset();
                self.start(frame, sequence, packet_type)
            }
            AssemblerState::Assembling { next, declared, .. } => {
                self.continue_with(frame, next, declared, sequence, packet_type)
            }
        }
    }

    fn start(
        &mut self,
        frame: &Frame,
        sequence: SequenceNumber,
        packet_type: PacketType,
    ) -> Result<Option<Telegram>> {
        let Some(header) = frame.report_body().transfer_header() else {
            return Err(KnxHidError::not_a_start_packet());
        };
        if !packet_type.is_start() {
            return Err(KnxHidError::unexpected_packet_type(packet_type.to_u8()));
        }
        if sequence != SequenceNumber::First {
            return Err(KnxHidError::sequence_gap(
                SequenceNumber::First.to_u8(),
                sequence.to_u8(),
            ));
        }
        let declared = header.body_length();
        if declared > MAX_TELEGRAM_SIZE {
            return Err(KnxHidError::declared_length_too_large(declared));
        }
        let (Some(protocol_id), Some(emi_id)) = (header.protocol_id(), header.emi_id()) else {
            return Err(KnxHidError::not_a_start_packet());
        };

        let mut telegram = Telegram {
            protocol_id,
            emi_id,
            manufacturer_code: header.manufacturer_code(),
            data: Vec::new(),
        };
        append(&mut telegram.data, frame.payload(), declared)?;
        hid_log!(
            debug,
            "start packet: {} of {} bytes",
            telegram.data.len(),
            declared
        );

        if telegram.data.len() == declared {
            return Ok(Some(self.complete(telegram, packet_type)));
        }
        if packet_type.is_end() {
            return Err(KnxHidError::unexpected_packet_type(packet_type.to_u8()));
        }
        self.state = AssemblerState::Assembling {
            next: SequenceNumber::Second,
            declared,
            received: telegram.data.len(),
        };
        self.pending = Some(telegram);
        Ok(None)
    }

    fn continue_with(
        &mut self,
        frame: &Frame,
        expected: SequenceNumber,
        declared: usize,
        sequence: SequenceNumber,
        packet_type: PacketType,
    ) -> Result<Option<Telegram>> {
        if !frame.is_partial() {
            return Err(KnxHidError::unexpected_packet_type(packet_type.to_u8()));
        }
        if sequence != expected {
            return Err(KnxHidError::sequence_gap(expected.to_u8(), sequence.to_u8()));
        }
        if packet_type.is_start() {
            return Err(KnxHidError::unexpected_packet_type(packet_type.to_u8()));
        }
        let Some(mut telegram) = self.pending.take() else {
            return Err(KnxHidError::not_a_start_packet());
        };

        append(&mut telegram.data, frame.payload(), declared)?;
        hid_log!(
            trace,
            "continuation {}: {} of {} bytes",
            sequence.to_u8(),
            telegram.data.len(),
            declared
        );

        if telegram.data.len() == declared {
            return Ok(Some(self.complete(telegram, packet_type)));
        }
        if packet_type.is_end() {
            return Err(KnxHidError::unexpected_packet_type(packet_type.to_u8()));
        }
        let Some(next) = sequence.next() else {
            return Err(KnxHidError::telegram_too_large(declared));
        };
        self.state = AssemblerState::Assembling {
            next,
            declared,
            received: telegram.data.len(),
        };
        self.pending = Some(telegram);
        Ok(None)
    }

    fn complete(&mut self, telegram: Telegram, packet_type: PacketType) -> Telegram {
        if !packet_type.is_end() {
            hid_log!(
                warn,
                "telegram complete but packet type {} is not an end packet",
                packet_type.to_u8()
            );
        }
        hid_log!(debug, "telegram complete ({} bytes)", telegram.data.len());
        self.reset();
        telegram
    }
}

fn append(buffer: &mut Vec<u8, MAX_TELEGRAM_SIZE>, payload: &[u8], declared: usize) -> Result<()> {
    let accumulated = buffer.len() + payload.len();
    if accumulated > declared {
        return Err(KnxHidError::length_overflow(declared, accumulated));
    }
    buffer
        .extend_from_slice(payload)
        .map_err(|_capacity| KnxHidError::telegram_too_large(accumulated))
}

/// Whether the packet info byte of a raw report marks a start packet
fn announces_start(report: &[u8]) -> bool {
    report.get(1).is_some_and(|&info| {
        SequenceNumber::from_u8(info >> 4) == Some(SequenceNumber::First)
            && PacketType::from_u8(info & 0x0F).is_some_and(PacketType::is_start)
    })
}
