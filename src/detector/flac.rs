//! First packet of a FLAC-in-Ogg stream: `0x7F` then `FLAC`, followed by the
//! mapping version and the native `fLaC` STREAMINFO block.

const PACKET_TYPE: u8 = 0x7F;
const MAGIC: &[u8; 4] = b"FLAC";

pub fn is_flac_stream(packet: &[u8]) -> bool {
    match packet.split_first() {
        Some((&PACKET_TYPE, rest)) => rest.starts_with(MAGIC),
        _ => false,
    }
}
