//! Property-based tests for KNX HID report framing.
//!
//! Covers the single-report round trip, fragmentation followed by
//! reassembly for every telegram size, the sequence number range of the
//! packet info byte, and decoding of arbitrary input.

use knx_hid::protocol::{
    encode_reports, EmiId, Frame, PacketInfo, PacketType, ProtocolId, ReportBodyData,
    ReportHeader, SequenceNumber, Telegram, TelegramAssembler,
};
use proptest::prelude::*;

fn arb_sequence() -> impl Strategy<Value = SequenceNumber> {
    prop_oneof![
        Just(SequenceNumber::First),
        Just(SequenceNumber::Second),
        Just(SequenceNumber::Third),
        Just(SequenceNumber::Fourth),
        Just(SequenceNumber::Fifth),
    ]
}

fn arb_packet_type() -> impl Strategy<Value = PacketType> {
    prop_oneof![
        Just(PacketType::StartAndEnd),
        Just(PacketType::Partial),
        Just(PacketType::StartAndPartial),
        Just(PacketType::PartialAndEnd),
    ]
}

fn arb_protocol_id() -> impl Strategy<Value = ProtocolId> {
    prop_oneof![
        Just(ProtocolId::KnxTunnel),
        Just(ProtocolId::MBusTunnel),
        Just(ProtocolId::BatiBusTunnel),
        Just(ProtocolId::BusAccessServerFeatureService),
    ]
}

fn arb_emi_id() -> impl Strategy<Value = EmiId> {
    prop_oneof![Just(EmiId::Emi1), Just(EmiId::Emi2), Just(EmiId::CommonEmi)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A constructed start frame decodes back to the same 64 bytes.
    #[test]
    fn prop_start_frame_round_trip(
        sequence in arb_sequence(),
        packet_type in arb_packet_type(),
        protocol_id in arb_protocol_id(),
        emi_id in arb_emi_id(),
        payload in proptest::collection::vec(any::<u8>(), 0..=53),
    ) {
        let frame = Frame::construct(
            PacketInfo::new(sequence, packet_type),
            &ReportBodyData { protocol_id, emi_id, emi_data: &payload, partial: false },
        );
        prop_assert!(frame.is_valid());
        let report = frame.encode().map_err(|e| TestCaseError::fail(format!("{e}")))?;
        prop_assert_eq!(usize::from(report[2]), payload.len() + 8);

        let decoded = Frame::decode(&report, false);
        prop_assert!(decoded.is_valid());
        prop_assert_eq!(decoded.payload(), payload.as_slice());
        let again = decoded.encode().map_err(|e| TestCaseError::fail(format!("{e}")))?;
        prop_assert_eq!(again, report);
    }

    /// Any telegram of 0..=297 bytes survives fragmentation and reassembly.
    #[test]
    fn prop_fragment_then_assemble(
        protocol_id in arb_protocol_id(),
        emi_id in arb_emi_id(),
        manufacturer_code in any::<u16>(),
        data in proptest::collection::vec(any::<u8>(), 0..=297),
    ) {
        let telegram = Telegram::new(protocol_id, emi_id, &data)
            .map_err(|e| TestCaseError::fail(format!("{e}")))?
            .with_manufacturer_code(manufacturer_code);
        let reports = encode_reports(&telegram).map_err(|e| TestCaseError::fail(format!("{e}")))?;
        prop_assert!((1..=5).contains(&reports.len()));

        let mut assembler = TelegramAssembler::new();
        let mut result = None;
        for report in &reports {
            result = assembler.feed(report).map_err(|e| TestCaseError::fail(format!("{e}")))?;
        }
        prop_assert_eq!(result, Some(telegram));
    }

    /// Only sequence numbers 1 to 5 are accepted in the packet info byte.
    #[test]
    fn prop_sequence_number_boundary(sequence in 0u8..16, packet_type in arb_packet_type()) {
        let info = PacketInfo::from_byte((sequence << 4) | packet_type.to_u8());
        prop_assert_eq!(info.is_valid(), (1..=5).contains(&sequence));
    }

    /// Any report id other than 0x01 makes the header invalid.
    #[test]
    fn prop_report_id_gate(report_id in any::<u8>(), length in 0u8..=61) {
        let header = ReportHeader::decode(&[report_id, 0x13, length]);
        prop_assert_eq!(header.is_valid(), report_id == 0x01);
    }

    /// Decoding never panics, and a valid frame always re-encodes with
    /// the same report header.
    #[test]
    fn prop_decode_arbitrary_input(
        data in proptest::collection::vec(any::<u8>(), 0..=80),
        partial in any::<bool>(),
    ) {
        let frame = Frame::decode(&data, partial);
        prop_assert_eq!(frame.is_truncated(), data.len() < 64);
        if frame.is_valid() {
            let report = frame.encode().map_err(|e| TestCaseError::fail(format!("{e}")))?;
            prop_assert_eq!(&report[..3], &data[..3]);
        } else {
            prop_assert!(frame.encode().is_err());
        }
    }
}
