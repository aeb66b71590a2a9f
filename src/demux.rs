//! Ogg page reader and packet demultiplexer.
//!
//! ```text
//! capture      "OggS"        4 bytes
//! version      0             1 byte
//! header type  flags         1 byte   continued=0x01 bos=0x02 eos=0x04
//! granule pos  i64 LE        8 bytes
//! serial       u32 LE        4 bytes
//! sequence     u32 LE        4 bytes
//! checksum     u32 LE        4 bytes
//! segments     n             1 byte
//! lacing       n bytes
//! body         sum(lacing) bytes
//! ```
//!
//! A lacing value below 255 ends a packet; a packet whose last lacing value
//! is 255 continues on the next page of the same serial.

use std::collections::{HashMap, VecDeque};
use std::io::{self, Read};

use bytes::{Buf, Bytes, BytesMut};
use memchr::memmem;

use crate::error::Result;

pub const CAPTURE: &[u8; 4] = b"OggS";
pub const HEADER_LEN: usize = 27;

const FLAG_CONTINUED: u8 = 0x01;
const FLAG_BOS: u8 = 0x02;
const FLAG_EOS: u8 = 0x04;

const READ_CHUNK: usize = 8 * 1024;

/// One logical-stream packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OggPacket {
    pub serial: u32,
    /// First packet of its logical stream
    pub bos: bool,
    /// Completed on a page flagged end-of-stream
    pub eos: bool,
    pub granule_position: i64,
    pub data: Bytes,
}

/// Anything that hands out packets one at a time, tagged with their stream.
pub trait PacketSource {
    /// The next packet, or `None` once the input is exhausted.
    fn next_packet(&mut self) -> Result<Option<OggPacket>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub header_type: u8,
    pub granule_position: i64,
    pub serial: u32,
    pub sequence: u32,
    pub checksum: u32,
    pub segments: u8,
}

impl PageHeader {
    /// Parse the fixed 27-byte header. `None` if it is not an Ogg page.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_LEN || &buf[..4] != CAPTURE || buf[4] != 0 {
            return None;
        }

        let mut hdr = &buf[5..HEADER_LEN];
        Some(Self {
            header_type: hdr.get_u8(),
            granule_position: hdr.get_i64_le(),
            serial: hdr.get_u32_le(),
            sequence: hdr.get_u32_le(),
            checksum: hdr.get_u32_le(),
            segments: hdr.get_u8(),
        })
    }

    pub fn is_continued(&self) -> bool {
        self.header_type & FLAG_CONTINUED != 0
    }

    pub fn is_bos(&self) -> bool {
        self.header_type & FLAG_BOS != 0
    }

    pub fn is_eos(&self) -> bool {
        self.header_type & FLAG_EOS != 0
    }
}

#[derive(Debug)]
struct Page {
    header: PageHeader,
    lacing: Bytes,
    body: Bytes,
}

#[derive(Debug)]
struct Partial {
    data: BytesMut,
    bos: bool,
}

/// Demultiplexes packets out of a physical Ogg stream.
pub struct OggPacketReader<R> {
    inner: R,
    buf: BytesMut,
    eof: bool,
    resync: bool,
    consumed: u64,
    partial: HashMap<u32, Partial>,
    ready: VecDeque<OggPacket>,
}

impl<R: Read> OggPacketReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::new(),
            eof: false,
            resync: true,
            consumed: 0,
            partial: HashMap::new(),
            ready: VecDeque::new(),
        }
    }

    /// Skip junk between pages by searching for the next capture pattern
    /// (the default). With resync off the reader stops at the first byte that
    /// does not start a page.
    pub fn resync(mut self, resync: bool) -> Self {
        self.resync = resync;
        self
    }

    /// Bytes taken from the input so far: complete pages plus skipped junk.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Make sure at least `n` bytes are buffered. `false` on end of input.
    fn fill(&mut self, n: usize) -> io::Result<bool> {
        while self.buf.len() < n {
            if self.eof {
                return Ok(false);
            }

            let start = self.buf.len();
            self.buf.resize(start + READ_CHUNK, 0);

            let read = loop {
                match self.inner.read(&mut self.buf[start..]) {
                    Ok(read) => break read,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        self.buf.truncate(start);
                        return Err(e);
                    }
                }
            };

            self.buf.truncate(start + read);
            if read == 0 {
                self.eof = true;
            }
        }

        Ok(true)
    }

    fn skip(&mut self, n: usize) {
        self.buf.advance(n);
        self.consumed += n as u64;
    }

    fn next_page(&mut self) -> Result<Option<Page>> {
        loop {
            if !self.fill(HEADER_LEN)? {
                return Ok(None);
            }

            let Some(header) = PageHeader::parse(&self.buf) else {
                if !self.resync {
                    tracing::debug!(offset = self.consumed, "no Ogg page, stopping");
                    return Ok(None);
                }

                match memmem::find(&self.buf[1..], CAPTURE) {
                    Some(pos) => self.skip(pos + 1),
                    None => self.skip(self.buf.len() - (CAPTURE.len() - 1)),
                }
                continue;
            };

            let segments = header.segments as usize;
            if !self.fill(HEADER_LEN + segments)? {
                tracing::debug!(offset = self.consumed, "truncated Ogg page header");
                return Ok(None);
            }

            let body_len: usize = self.buf[HEADER_LEN..HEADER_LEN + segments]
                .iter()
                .map(|&lace| lace as usize)
                .sum();
            let page_len = HEADER_LEN + segments + body_len;

            if !self.fill(page_len)? {
                tracing::debug!(offset = self.consumed, "truncated Ogg page body");
                return Ok(None);
            }

            let page = self.buf.split_to(page_len).freeze();
            self.consumed += page_len as u64;

            return Ok(Some(Page {
                header,
                lacing: page.slice(HEADER_LEN..HEADER_LEN + segments),
                body: page.slice(HEADER_LEN + segments..),
            }));
        }
    }

    fn demux_page(&mut self, page: Page) {
        let Page {
            header,
            lacing,
            body,
        } = page;
        let serial = header.serial;

        let mut carried = self.partial.remove(&serial);
        if carried.is_some() && !header.is_continued() {
            tracing::debug!(serial, "dropping packet left unfinished by previous page");
            carried = None;
        }

        let mut start = 0;
        let mut len = 0;
        let mut first_piece = true;
        let mut bos = header.is_bos();

        for (idx, &lace) in lacing.iter().enumerate() {
            len += lace as usize;
            let complete = lace < 255;
            if !complete && idx + 1 < lacing.len() {
                continue;
            }

            let piece = body.slice(start..start + len);
            start += len;
            len = 0;

            let continues_previous = first_piece && header.is_continued();
            first_piece = false;

            let (data, packet_bos) = if continues_previous {
                // Continuation of a packet we never saw the start of
                let Some(mut partial) = carried.take() else {
                    continue;
                };
                partial.data.extend_from_slice(&piece);
                (partial.data, partial.bos)
            } else {
                let packet_bos = bos;
                bos = false;
                (BytesMut::from(&piece[..]), packet_bos)
            };

            if complete {
                self.ready.push_back(OggPacket {
                    serial,
                    bos: packet_bos,
                    eos: header.is_eos(),
                    granule_position: header.granule_position,
                    data: data.freeze(),
                });
            } else if !header.is_eos() {
                self.partial.insert(
                    serial,
                    Partial {
                        data,
                        bos: packet_bos,
                    },
                );
            }
        }

        // A continued page without any lacing leaves the packet open
        if let Some(partial) = carried {
            self.partial.insert(serial, partial);
        }
    }
}

impl<R: Read> PacketSource for OggPacketReader<R> {
    fn next_packet(&mut self) -> Result<Option<OggPacket>> {
        loop {
            if let Some(packet) = self.ready.pop_front() {
                return Ok(Some(packet));
            }

            match self.next_page()? {
                Some(page) => self.demux_page(page),
                None => return Ok(None),
            }
        }
    }
}
