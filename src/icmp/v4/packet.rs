use crate::probe::SequenceNumber;
use pnet_packet::icmp::echo_reply::EchoReplyPacket;
use pnet_packet::icmp::echo_request::{
    EchoRequestPacket, MutableEchoRequestPacket as MutableEchoRequestPacketV4,
};
use pnet_packet::icmp::{IcmpCode, IcmpType};
use pnet_packet::Packet;
use std::time::{SystemTime, UNIX_EPOCH};

/// Fixed IPv4 header length assumed when decoding a raw reply. IP options
/// are not handled; replies carrying them fail to correlate and count as
/// lost probes.
pub(crate) const IPV4_HEADER_SIZE: usize = 20;
pub(crate) const ICMP_HEADER_SIZE: usize = 8;

/// Fields of the ICMP header of an incoming reply. The identifier and
/// sequence fields are decoded at the echo positions for every message type;
/// a Time-Exceeded outer header is read with the same layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct IcmpReply {
    pub(crate) icmp_type: IcmpType,
    pub(crate) icmp_code: IcmpCode,
    pub(crate) identifier: u16,
    pub(crate) sequence_number: SequenceNumber,
}

/// Builds a complete Echo Request: type=8, code=0, checksum, identifier,
/// sequence number, then the payload.
pub(crate) fn build_echo_request(
    identifier: u16,
    sequence_number: SequenceNumber,
    payload: &[u8],
) -> Option<Vec<u8>> {
    let buf = vec![0u8; EchoRequestPacket::minimum_packet_size() + payload.len()];
    let mut package = MutableEchoRequestPacketV4::owned(buf)?;
    package.set_icmp_type(pnet_packet::icmp::IcmpTypes::EchoRequest);
    package.set_icmp_code(IcmpCode::new(0));
    package.set_identifier(identifier);
    package.set_sequence_number(sequence_number.into());
    package.set_payload(payload);

    package.set_checksum(0_u16);
    let checksum = internet_checksum(package.packet());
    package.set_checksum(checksum);
    Some(package.packet().to_vec())
}

/// Decodes the ICMP header out of a raw IP packet. Returns `None` when the
/// packet is too short to hold an IPv4 header plus an ICMP header.
pub(crate) fn parse_reply(raw_ip_packet: &[u8]) -> Option<IcmpReply> {
    if raw_ip_packet.len() < IPV4_HEADER_SIZE + ICMP_HEADER_SIZE {
        return None;
    }
    let icmp = EchoReplyPacket::new(&raw_ip_packet[IPV4_HEADER_SIZE..])?;
    Some(IcmpReply {
        icmp_type: icmp.get_icmp_type(),
        icmp_code: icmp.get_icmp_code(),
        identifier: icmp.get_identifier(),
        sequence_number: icmp.get_sequence_number().into(),
    })
}

/// RFC 1071 internet checksum: sum the data as big-endian 16-bit words
/// (odd length padded with one zero byte), fold the carries back into the
/// low 16 bits until none remain, complement the result.
///
/// Computed over a packet whose checksum field already holds the correct
/// value, the result is 0.
pub(crate) fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut words = data.chunks_exact(2);
    for word in words.by_ref() {
        sum += u32::from(u16::from_be_bytes([word[0], word[1]]));
    }
    if let [last] = words.remainder() {
        sum += u32::from(u16::from_be_bytes([*last, 0]));
    }
    while sum >> 16 != 0 {
        sum = (sum >> 16) + (sum & 0xFFFF);
    }
    !(sum as u16)
}

/// Probe payload: the send time as a big-endian f64 of seconds since the
/// Unix epoch, 8 bytes.
pub(crate) fn timestamp_payload() -> [u8; 8] {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |elapsed| elapsed.as_secs_f64());
    seconds.to_be_bytes()
}
