//! Opus identification header (`OpusHead`).

const MAGIC: &[u8; 8] = b"OpusHead";

pub fn is_opus_stream(packet: &[u8]) -> bool {
    packet.starts_with(MAGIC)
}
