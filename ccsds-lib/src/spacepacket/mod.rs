mod decoder;
mod summary;

use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use decoder::{decode_packets, PacketDecoder};
pub use summary::{ApidSummary, Summary};

pub type Apid = u16;

/// Packet is a part of a packet group, but not first and not last
pub const SEQ_CONTINUATION: u8 = 0;
/// Packet is the first packet in a packet group
pub const SEQ_FIRST: u8 = 1;
/// Packet is the last packet in a packet group
pub const SEQ_LAST: u8 = 2;
/// Packet is not part of a packet group, i.e., standalone.
pub const SEQ_UNSEGMENTED: u8 = 3;

/// Value of the packet type flag.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PacketType {
    Telemetry,
    Telecommand,
}

/// CCSDS Primary Header
///
/// The primary header format is common to all CCSDS space packets. All fields
/// are masked to their bit widths when decoded, so values are always in range.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrimaryHeader {
    /// 3-bit packet version number
    pub version: u8,
    /// 0 for telemetry, 1 for telecommand. See [PrimaryHeader::packet_type].
    pub type_flag: u8,
    pub has_secondary_header: bool,
    /// 11-bit application process identifier
    pub apid: Apid,
    /// Defines a packets grouping. See the `SEQ_*` values.
    pub sequence_flags: u8,
    /// 14-bit packet sequence count
    pub sequence_count: u16,
    /// Number of bytes in the packet data field.
    ///
    /// The wire field holds the length minus one, so this is always in `1..=65536`.
    pub data_length: u32,
}

impl PrimaryHeader {
    /// Size of a ``PrimaryHeader``
    pub const LEN: usize = 6;
    pub const SEQ_MAX: u16 = 16383;
    pub const APID_MAX: Apid = 2047;
    /// APID reserved for idle (fill) packets
    pub const APID_IDLE: Apid = Self::APID_MAX;

    /// Decode from bytes. Returns `None` if there are not enough bytes to construct the
    /// header.
    #[must_use]
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::LEN {
            return None;
        }
        let d1 = u16::from_be_bytes([buf[0], buf[1]]);
        let d2 = u16::from_be_bytes([buf[2], buf[3]]);
        let d3 = u16::from_be_bytes([buf[4], buf[5]]);

        Some(PrimaryHeader {
            version: (d1 >> 13 & 0x7) as u8,
            type_flag: (d1 >> 12 & 0x1) as u8,
            has_secondary_header: (d1 >> 11 & 0x1) == 1,
            apid: d1 & 0x7ff,
            sequence_flags: (d2 >> 14 & 0x3) as u8,
            sequence_count: d2 & 0x3fff,
            // widened before adding so 0xffff does not wrap
            data_length: u32::from(d3) + 1,
        })
    }

    #[must_use]
    pub fn packet_type(&self) -> PacketType {
        if self.type_flag == 0 {
            PacketType::Telemetry
        } else {
            PacketType::Telecommand
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.apid == Self::APID_IDLE
    }
}

/// Packet represents a single CCSDS space packet.
///
/// `data` holds only the packet data field, i.e., the bytes following the primary
/// header, which may or may not start with a secondary header. See the header's
/// `has_secondary_header` flag.
///
/// # Example
/// Decode a packet from the minimum number of bytes.
/// ```
/// use ccsds_decoder::Packet;
///
/// let dat: &[u8] = &[
///     // primary header bytes
///     0x08, 0x01, 0x3f, 0xff, 0x00, 0x02,
///     // 3 bytes of user data
///     0xde, 0xad, 0xbe,
/// ];
/// let packet = Packet::decode(dat).unwrap();
/// assert_eq!(packet.header.apid, 1);
/// assert_eq!(packet.data, vec![0xde, 0xad, 0xbe]);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: PrimaryHeader,
    /// Packet data field bytes, exactly `header.data_length` long
    #[cfg_attr(feature = "serde", serde(with = "serde_bytes"))]
    pub data: Vec<u8>,
}

impl Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Packet{{header: {:?}, data:[len={}]}}",
            self.header,
            self.data.len()
        )
    }
}

impl Packet {
    #[must_use]
    pub fn is_first(&self) -> bool {
        self.header.sequence_flags == SEQ_FIRST
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.header.sequence_flags == SEQ_LAST
    }

    #[must_use]
    pub fn is_cont(&self) -> bool {
        self.header.sequence_flags == SEQ_CONTINUATION
    }

    #[must_use]
    pub fn is_standalone(&self) -> bool {
        self.header.sequence_flags == SEQ_UNSEGMENTED
    }

    /// Total number of encoded bytes, header included.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        PrimaryHeader::LEN + self.data.len()
    }

    /// Decode the packet at the front of `dat`. Returns `None` if there are not enough
    /// bytes to construct the header or the data field of the length indicated by the
    /// header. Bytes beyond the packet are ignored.
    #[must_use]
    pub fn decode(dat: &[u8]) -> Option<Packet> {
        let header = PrimaryHeader::decode(dat)?;
        let end = PrimaryHeader::LEN + header.data_length as usize;
        if dat.len() < end {
            return None;
        }
        Some(Packet {
            header,
            data: dat[PrimaryHeader::LEN..end].to_vec(),
        })
    }
}

/// Calculate the number of missing sequence counts.
///
/// `cur` is the current sequence count. `last` is the sequence count seen before `cur`
/// for the same APID. Counts roll over after [PrimaryHeader::SEQ_MAX].
#[must_use]
pub fn missing_packets(cur: u16, last: u16) -> u16 {
    cur.wrapping_sub(last).wrapping_sub(1) & PrimaryHeader::SEQ_MAX
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_decode_header() {
        let dat: [u8; 6] = [
            // bytes from a SNPP CrIS packet
            0xd, 0x59, 0xd2, 0xab, 0xa, 0x8f,
        ];
        let ph = PrimaryHeader::decode(&dat).unwrap();

        assert_eq!(ph.version, 0);
        assert_eq!(ph.type_flag, 0);
        assert_eq!(ph.packet_type(), PacketType::Telemetry);
        assert!(ph.has_secondary_header);
        assert_eq!(ph.apid, 1369);
        assert_eq!(ph.sequence_flags, 3);
        assert_eq!(ph.sequence_count, 4779);
        assert_eq!(ph.data_length, 2704);
    }

    #[test]
    fn test_decode_header_canonical() {
        let ph = PrimaryHeader::decode(&[0x08, 0x01, 0x3f, 0xff, 0x00, 0x02]).unwrap();

        assert_eq!(ph.version, 0);
        assert_eq!(ph.type_flag, 0);
        assert!(ph.has_secondary_header);
        assert_eq!(ph.apid, 1);
        assert_eq!(ph.sequence_flags, 0);
        assert_eq!(ph.sequence_count, 0x3fff);
        assert_eq!(ph.data_length, 3);
    }

    #[test]
    fn test_decode_header_all_bits_set() {
        let ph = PrimaryHeader::decode(&[0xff; 6]).unwrap();

        assert_eq!(ph.version, 7);
        assert_eq!(ph.type_flag, 1);
        assert_eq!(ph.packet_type(), PacketType::Telecommand);
        assert!(ph.has_secondary_header);
        assert_eq!(ph.apid, PrimaryHeader::APID_MAX);
        assert!(ph.is_idle());
        assert_eq!(ph.sequence_flags, 3);
        assert_eq!(ph.sequence_count, PrimaryHeader::SEQ_MAX);
        assert_eq!(ph.data_length, 65536, "max wire length must not wrap");
    }

    #[test]
    fn test_decode_header_zero_length_field() {
        let ph = PrimaryHeader::decode(&[0x00; 6]).unwrap();
        assert_eq!(ph.data_length, 1);
        assert!(!ph.has_secondary_header);
    }

    #[test]
    fn test_decode_header_not_enough_bytes() {
        assert!(PrimaryHeader::decode(&[0x08, 0x01, 0x3f, 0xff, 0x00]).is_none());
        assert!(PrimaryHeader::decode(&[]).is_none());
    }

    #[test]
    fn test_decode_header_fields_in_range() {
        for b0 in 0..=u8::MAX {
            for b2 in [0x00, 0x3f, 0x40, 0x80, 0xc0, 0xff] {
                let ph = PrimaryHeader::decode(&[b0, 0xff, b2, 0xff, 0xff, 0xff]).unwrap();
                assert!(ph.version <= 7);
                assert!(ph.type_flag <= 1);
                assert!(ph.apid <= PrimaryHeader::APID_MAX);
                assert!(ph.sequence_flags <= 3);
                assert!(ph.sequence_count <= PrimaryHeader::SEQ_MAX);
            }
        }
    }

    #[test_case(0x00, SEQ_CONTINUATION; "continuation")]
    #[test_case(0x40, SEQ_FIRST; "first")]
    #[test_case(0x80, SEQ_LAST; "last")]
    #[test_case(0xc0, SEQ_UNSEGMENTED; "unsegmented")]
    fn test_sequence_flags(b2: u8, expected: u8) {
        let packet = Packet::decode(&[0x08, 0x01, b2, 0x00, 0x00, 0x00, 0xaa]).unwrap();
        assert_eq!(packet.header.sequence_flags, expected);
        assert_eq!(packet.is_cont(), expected == SEQ_CONTINUATION);
        assert_eq!(packet.is_first(), expected == SEQ_FIRST);
        assert_eq!(packet.is_last(), expected == SEQ_LAST);
        assert_eq!(packet.is_standalone(), expected == SEQ_UNSEGMENTED);
    }

    #[test]
    fn test_decode_packet() {
        let dat: &[u8] = &[
            0x08, 0x01, 0x3f, 0xff, 0x00, 0x02, 0xde, 0xad, 0xbe, // trailing byte
            0x99,
        ];
        let packet = Packet::decode(dat).unwrap();

        assert_eq!(packet.data, vec![0xde, 0xad, 0xbe]);
        assert_eq!(packet.encoded_len(), 9);
        assert_eq!(
            format!("{packet}"),
            format!("Packet{{header: {:?}, data:[len=3]}}", packet.header)
        );
    }

    #[test]
    fn test_decode_packet_incomplete() {
        let dat: &[u8] = &[0x08, 0x01, 0x3f, 0xff, 0x00, 0x02, 0xde, 0xad];
        assert!(Packet::decode(dat).is_none());
    }

    #[test]
    fn test_missing_packets() {
        assert_eq!(missing_packets(5, 4), 0);
        assert_eq!(missing_packets(5, 3), 1);
        assert_eq!(missing_packets(0, PrimaryHeader::SEQ_MAX), 0);
        assert_eq!(missing_packets(0, PrimaryHeader::SEQ_MAX - 1), 1);
        assert_eq!(missing_packets(0, 0), PrimaryHeader::SEQ_MAX);
    }
}
