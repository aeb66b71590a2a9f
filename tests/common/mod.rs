//! In-memory Ogg writer for building test containers.

#![allow(dead_code)]

pub const VORBIS_ID: &[u8] = b"\x01vorbis\x00\x00\x00\x00\x02\x44\xac\x00\x00\x00\x00\x00\x00\xee\x02\x00\x00\x00\x00\x00\xb8\x01";
pub const OPUS_HEAD: &[u8] = b"OpusHead\x01\x02\x38\x01\x80\xbb\x00\x00\x00\x00\x00";
pub const SPEEX_HEADER: &[u8] = b"Speex   1.2.0\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00";
pub const FLAC_FIRST: &[u8] = b"\x7fFLAC\x01\x00\x00\x01fLaC\x00\x00\x00\x22\x10\x00\x10\x00";
pub const THEORA_ID: &[u8] = b"\x80theora\x03\x02\x01\x00\x14\x00\x0f\x00\x01\x40";
pub const SKELETON_HEAD: &[u8] = b"fishead\x00\x03\x00\x00\x00\x00\x00\x00\x00";

const FLAG_CONTINUED: u8 = 0x01;
const FLAG_BOS: u8 = 0x02;
const FLAG_EOS: u8 = 0x04;

/// Writes pages one packet at a time, splitting packets over 255 lacing
/// values across pages the way a muxer would.
#[derive(Default)]
pub struct OggWriter {
    out: Vec<u8>,
    sequence: std::collections::HashMap<u32, u32>,
}

impl OggWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, serial: u32, header: &[u8]) -> &mut Self {
        self.packet(serial, header, FLAG_BOS)
    }

    pub fn data(&mut self, serial: u32, payload: &[u8]) -> &mut Self {
        self.packet(serial, payload, 0)
    }

    pub fn end(&mut self, serial: u32, payload: &[u8]) -> &mut Self {
        self.packet(serial, payload, FLAG_EOS)
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.out.extend_from_slice(bytes);
        self
    }

    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.out)
    }

    fn packet(&mut self, serial: u32, payload: &[u8], flags: u8) -> &mut Self {
        let mut lacing = Vec::new();
        let mut len = payload.len();
        while len >= 255 {
            lacing.push(255u8);
            len -= 255;
        }
        lacing.push(len as u8);

        let pages = lacing.chunks(255).count();
        let mut body = payload;
        let mut first = true;
        for (idx, chunk) in lacing.chunks(255).enumerate() {
            let take: usize = chunk.iter().map(|&l| l as usize).sum();
            let last = idx + 1 == pages;

            let mut page_flags = 0;
            if first {
                page_flags |= flags & FLAG_BOS;
            } else {
                page_flags |= FLAG_CONTINUED;
            }
            if last {
                page_flags |= flags & FLAG_EOS;
            }

            self.page(page_flags, serial, chunk, &body[..take]);
            body = &body[take..];
            first = false;
        }
        self
    }

    fn page(&mut self, flags: u8, serial: u32, lacing: &[u8], body: &[u8]) {
        let seq = self.sequence.entry(serial).or_default();

        self.out.extend_from_slice(b"OggS");
        self.out.push(0);
        self.out.push(flags);
        self.out.extend_from_slice(&0i64.to_le_bytes());
        self.out.extend_from_slice(&serial.to_le_bytes());
        self.out.extend_from_slice(&seq.to_le_bytes());
        self.out.extend_from_slice(&0u32.to_le_bytes());
        self.out.push(lacing.len() as u8);
        self.out.extend_from_slice(lacing);
        self.out.extend_from_slice(body);

        *seq += 1;
    }
}

/// A single-stream container: header, one audio packet, end of stream.
pub fn single(serial: u32, header: &[u8]) -> Vec<u8> {
    OggWriter::new()
        .begin(serial, header)
        .data(serial, &[0x55; 64])
        .end(serial, &[0x66; 16])
        .finish()
}
