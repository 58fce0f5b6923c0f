#![doc = include_str!("../README.md")]

mod error;

pub mod spacepacket;

pub use error::{Error, Result};
pub use spacepacket::{decode_packets, Packet, PacketDecoder, PrimaryHeader};
