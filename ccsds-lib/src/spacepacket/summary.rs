use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{missing_packets, Apid, Packet};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone)]
pub struct ApidSummary {
    pub count: usize,
    pub bytes: usize,
    pub missing: usize,
}

/// Tracks stats on packet iteration.
///
/// `bytes` counts encoded packet bytes, primary header included.
///
/// # Example
/// ```
/// use ccsds_decoder::{decode_packets, Packet};
/// use ccsds_decoder::spacepacket::Summary;
/// let dat: &[u8] = &[0xd, 0x59, 0xc0, 0x01, 0x0, 0x8, 0x52, 0xc0, 0x0, 0x0, 0x0, 0xa7, 0x0, 0xdb, 0xff];
///
/// let mut summary = Summary::default();
/// let packets: Vec<Packet> = decode_packets(dat)
///     .filter_map(Result::ok)
///     .inspect(|p| {
///         summary.add(p);
///     })
///     .collect();
/// assert_eq!(summary.count, 1);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone)]
pub struct Summary {
    pub count: usize,
    pub bytes: usize,
    pub missing: usize,
    pub apids: HashMap<Apid, ApidSummary>,

    #[cfg_attr(feature = "serde", serde(skip))]
    last_seen: HashMap<Apid, u16>,
}

impl Summary {
    pub fn add(&mut self, packet: &Packet) {
        let hdr = &packet.header;
        let len = packet.encoded_len();
        self.count += 1;
        self.bytes += len;

        let apid = self.apids.entry(hdr.apid).or_default();
        apid.count += 1;
        apid.bytes += len;

        if let Some(last) = self.last_seen.insert(hdr.apid, hdr.sequence_count) {
            let missing = missing_packets(hdr.sequence_count, last) as usize;
            apid.missing += missing;
            self.missing += missing;
        }
    }
}
