//! Splitting a telegram into HID report frames.
//!
//! The first frame carries sequence number 1 and a transfer header that
//! declares the full telegram length; up to 53 bytes of data follow it.
//! Remaining data goes into continuation frames of up to 61 bytes each.
//!
//! | Frames | Packet types                                        |
//! |:-------|:----------------------------------------------------|
//! | 1      | `StartAndEnd`                                       |
//! | 2..=5  | `StartAndPartial`, `Partial`…, `PartialAndEnd`      |

use heapless::Vec;

use crate::error::{KnxHidError, Result};
use crate::protocol::assembler::Telegram;
use crate::protocol::constants::{
    PacketType, SequenceNumber, CONTINUATION_PAYLOAD_SIZE, MAX_PACKETS_PER_TELEGRAM,
    START_PAYLOAD_SIZE,
};
use crate::protocol::frame::Frame;
use crate::protocol::packet_info::PacketInfo;
use crate::protocol::report_body::ReportBody;
use crate::protocol::transfer::TransferHeader;

/// Frames of one telegram, in transmission order
pub type Fragments = Vec<Frame, MAX_PACKETS_PER_TELEGRAM>;

/// Split `telegram` into 1..=5 frames ready to encode.
///
/// # Errors
///
/// Returns an error if a frame cannot be built, which only happens when
/// the telegram exceeds five reports.
pub fn fragment(telegram: &Telegram) -> Result<Fragments> {
    let data = telegram.data();
    // Telegram data is capped at 297 bytes
    let header = TransferHeader::new(data.len() as u16, telegram.protocol_id(), telegram.emi_id())
        .with_manufacturer_code(telegram.manufacturer_code());

    let (first, rest) = data.split_at(data.len().min(START_PAYLOAD_SIZE));
    let continuations = rest.chunks(CONTINUATION_PAYLOAD_SIZE);
    let last_index = continuations.len();

    let mut frames = Fragments::new();
    let first_type = if last_index == 0 {
        PacketType::StartAndEnd
    } else {
        PacketType::StartAndPartial
    };
    push_frame(
        &mut frames,
        PacketInfo::new(SequenceNumber::First, first_type),
        ReportBody::start(header, first),
    )?;

    let mut sequence = SequenceNumber::First;
    for (index, chunk) in continuations.enumerate() {
        sequence = sequence
            .next()
            .ok_or_else(|| KnxHidError::telegram_too_large(data.len()))?;
        let packet_type = if index + 1 == last_index {
            PacketType::PartialAndEnd
        } else {
            PacketType::Partial
        };
        push_frame(
            &mut frames,
            PacketInfo::new(sequence, packet_type),
            ReportBody::continuation(chunk),
        )?;
    }

    hid_log!(
        debug,
        "telegram of {} bytes split into {} reports",
        data.len(),
        frames.len()
    );
    Ok(frames)
}

fn push_frame(frames: &mut Fragments, info: PacketInfo, body: ReportBody) -> Result<()> {
    let frame = Frame::from_parts(info, body);
    if let Some(fault) = frame.fault() {
        return Err(KnxHidError::invalid(fault));
    }
    frames
        .push(frame)
        .map_err(|frame| KnxHidError::telegram_too_large(frame.payload().len()))
}

/// Encode every frame of `telegram` into 64 byte reports
pub fn encode_reports(telegram: &Telegram) -> Result<Vec<[u8; Frame::SIZE], MAX_PACKETS_PER_TELEGRAM>> {
    let mut reports = Vec::new();
    for frame in &fragment(telegram)? {
        reports
            .push(frame.encode()?)
            .map_err(|_report| KnxHidError::telegram_too_large(telegram.data().len()))?;
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::{EmiId, ProtocolId};

    fn telegram(len: usize) -> Telegram {
        let data: std::vec::Vec<u8> = (0..len).map(|i| i as u8).collect();
        Telegram::new(ProtocolId::KnxTunnel, EmiId::CommonEmi, &data).unwrap()
    }

    fn packet_types(frames: &Fragments) -> std::vec::Vec<Option<PacketType>> {
        frames
            .iter()
            .map(|f| f.report_header().packet_info().packet_type())
            .collect()
    }

    #[test]
    fn test_single_frame() {
        let frames = fragment(&telegram(10)).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(packet_types(&frames), [Some(PacketType::StartAndEnd)]);
        assert_eq!(frames[0].report_header().data_length(), 18);
    }

    #[test]
    fn test_exact_start_capacity() {
        let frames = fragment(&telegram(53)).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].report_header().data_length(), 61);
    }

    #[test]
    fn test_three_frames() {
        let frames = fragment(&telegram(53 + 61 + 1)).unwrap();
        assert_eq!(
            packet_types(&frames),
            [
                Some(PacketType::StartAndPartial),
                Some(PacketType::Partial),
                Some(PacketType::PartialAndEnd)
            ]
        );
        let sequences: std::vec::Vec<u8> = frames
            .iter()
            .filter_map(|f| f.report_header().packet_info().sequence_number())
            .map(SequenceNumber::to_u8)
            .collect();
        assert_eq!(sequences, [1, 2, 3]);
        assert_eq!(frames[2].payload(), &[(53 + 61) as u8]);
        assert_eq!(
            frames[0].report_body().transfer_header().map(TransferHeader::body_length),
            Some(115)
        );
    }

    #[test]
    fn test_maximum_telegram() {
        let frames = fragment(&telegram(297)).unwrap();
        assert_eq!(frames.len(), 5);
        assert!(frames.iter().all(Frame::is_valid));
        let reports = encode_reports(&telegram(297)).unwrap();
        assert_eq!(reports.len(), 5);
        assert_eq!(reports[4][1], 0x56);
    }

    #[test]
    fn test_empty_telegram() {
        let frames = fragment(&telegram(0)).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].report_header().data_length(), 8);
    }
}
