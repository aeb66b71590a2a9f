//! Speex header: `Speex` padded with spaces to eight bytes.

const MAGIC: &[u8; 8] = b"Speex   ";

pub fn is_speex_stream(packet: &[u8]) -> bool {
    packet.starts_with(MAGIC)
}
