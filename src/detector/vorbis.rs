//! Vorbis identification header: packet type 1 followed by `vorbis`.

const PACKET_TYPE_IDENTIFICATION: u8 = 0x01;
const MAGIC: &[u8; 6] = b"vorbis";

pub fn is_vorbis_stream(packet: &[u8]) -> bool {
    match packet.split_first() {
        Some((&PACKET_TYPE_IDENTIFICATION, rest)) => rest.starts_with(MAGIC),
        _ => false,
    }
}
