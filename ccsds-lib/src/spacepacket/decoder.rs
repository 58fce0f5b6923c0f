use std::io::{ErrorKind, Read};

use tracing::{debug, trace};

use super::{Packet, PrimaryHeader};
use crate::{Error, Result};

/// Decodes back-to-back space packets from a sequential byte source.
///
/// The decoder holds no packet state between reads, only the source and the number
/// of bytes consumed from it. Short reads from the source are retried until the
/// requested number of bytes is available or the source is exhausted.
///
/// Packets carry no sync marker, so there is no attempt to recover after a decode
/// error. Once a read fails the position of the source is wherever the failed read
/// stopped.
///
/// # Example
/// ```
/// use ccsds_decoder::PacketDecoder;
///
/// let dat: &[u8] = &[0x08, 0x01, 0x3f, 0xff, 0x00, 0x02, 0xde, 0xad, 0xbe];
/// let mut decoder = PacketDecoder::new(dat);
///
/// let packet = decoder.read_packet().unwrap().expect("a packet");
/// assert_eq!(packet.header.sequence_count, 0x3fff);
/// assert!(decoder.read_packet().unwrap().is_none());
/// ```
pub struct PacketDecoder<R> {
    reader: R,
    offset: u64,
    // set once iteration has hit end-of-stream or an error
    done: bool,
}

impl<R> PacketDecoder<R>
where
    R: Read,
{
    pub fn new(reader: R) -> Self {
        PacketDecoder {
            reader,
            offset: 0,
            done: false,
        }
    }

    /// Number of bytes consumed from the source so far.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Read until `buf` is full or the source is exhausted, returning the number of
    /// bytes read.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.offset += filled as u64;
                    return Err(err.into());
                }
            }
        }
        self.offset += filled as u64;
        Ok(filled)
    }

    /// Read the next [Packet].
    ///
    /// Returns `Ok(None)` if the source is exhausted before the first byte of a header,
    /// which is the normal end of a stream. Calling again after that keeps returning
    /// `Ok(None)` as long as the source stays exhausted.
    ///
    /// # Errors
    /// [Error::TruncatedHeader] if the source ends within the primary header,
    /// [Error::TruncatedPayload] if it ends within the packet data field, and
    /// [Error::Io] for any other error reported by the source.
    pub fn read_packet(&mut self) -> Result<Option<Packet>> {
        let start = self.offset;
        let mut buf = [0u8; PrimaryHeader::LEN];
        let actual = self.fill(&mut buf)?;
        if actual == 0 {
            trace!(offset = start, "end of stream");
            return Ok(None);
        }
        let Some(header) = PrimaryHeader::decode(&buf[..actual]) else {
            return Err(Error::TruncatedHeader {
                actual,
                minimum: PrimaryHeader::LEN,
            });
        };

        let expected = header.data_length as usize;
        let mut data = vec![0u8; expected];
        let actual = self.fill(&mut data)?;
        if actual < expected {
            return Err(Error::TruncatedPayload { actual, expected });
        }

        trace!(
            offset = start,
            apid = header.apid,
            seq = header.sequence_count,
            len = expected,
            "packet"
        );
        Ok(Some(Packet { header, data }))
    }

    /// Read packets until the source is exhausted.
    ///
    /// Packets are returned in stream order. Decoding stops at the first error, in
    /// which case the packets decoded before it are returned along with the error.
    pub fn read_all_packets(&mut self) -> (Vec<Packet>, Option<Error>) {
        let mut packets = Vec::default();
        loop {
            match self.read_packet() {
                Ok(Some(packet)) => packets.push(packet),
                Ok(None) => return (packets, None),
                Err(err) => {
                    debug!(
                        offset = self.offset,
                        decoded = packets.len(),
                        "packet decoding aborted: {err}"
                    );
                    return (packets, Some(err));
                }
            }
        }
    }
}

impl<R> Iterator for PacketDecoder<R>
where
    R: Read,
{
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_packet() {
            Ok(Some(packet)) => Some(Ok(packet)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Return an iterator providing [Packet]s decoded from a stream of back-to-back
/// packets.
///
/// The iterator ends at the end of the stream. A decode error is provided once, after
/// which the iterator ends.
///
/// # Examples
/// ```
/// use ccsds_decoder::decode_packets;
///
/// let dat: &[u8] = &[
///     // primary header bytes
///     0xd, 0x59, 0xd2, 0xab, 0x0, 07,
///     // CDS timecode bytes in secondary header
///     0x52, 0xc0, 0x0, 0x0, 0x0, 0xa7, 0x0, 0xdb,
/// ];
///
/// decode_packets(dat).for_each(|zult| {
///     let packet = zult.unwrap();
///     assert_eq!(packet.header.apid, 1369);
/// });
/// ```
pub fn decode_packets<R>(reader: R) -> impl Iterator<Item = Result<Packet>>
where
    R: Read,
{
    PacketDecoder::new(reader)
}
