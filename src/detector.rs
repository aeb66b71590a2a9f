//! Ogg content-type detection.
//!
//! The detector checks the physical `OggS` signature, drives a
//! [`PacketSource`] over the whole container, classifies the first packet of
//! every logical stream and folds the tallies into one [`Verdict`]. The input
//! is always handed back at the position it was received at.

pub mod flac;
pub mod opus;
pub mod speex;
pub mod vorbis;

use std::collections::BTreeMap;
use std::io::{self, Read};

use serde::Serialize;

use crate::decision::{self, Accumulator, OpusMultiTrack};
use crate::demux::{OggPacketReader, PacketSource, CAPTURE};
use crate::error::Result;
use crate::signature::{Codec, Signature, SIGNATURES};
use crate::source::{ByteSource, Rewind};
use crate::verdict::Verdict;

#[derive(Debug, Clone)]
pub struct DetectOptions {
    /// First packets no longer than this are counted but never classified
    pub min_first_packet_len: usize,
    pub opus_multitrack: OpusMultiTrack,
    /// Skip junk between pages instead of stopping at it
    pub resync: bool,
    pub signatures: &'static [Signature],
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            min_first_packet_len: 10,
            opus_multitrack: OpusMultiTrack::default(),
            resync: true,
            signatures: SIGNATURES,
        }
    }
}

/// Outcome of one detection call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub verdict: Verdict,
    pub total_streams: usize,
    pub counts: BTreeMap<Codec, usize>,
    /// Container bytes the demultiplexer went through; zero without a full scan
    pub scanned_bytes: u64,
}

impl Detection {
    fn without_scan(verdict: Verdict) -> Self {
        Self {
            verdict,
            total_streams: 0,
            counts: BTreeMap::new(),
            scanned_bytes: 0,
        }
    }

    fn from_tally(acc: &Accumulator, verdict: Verdict, scanned_bytes: u64) -> Self {
        Self {
            verdict,
            total_streams: acc.total_streams(),
            counts: acc.counts().clone(),
            scanned_bytes,
        }
    }
}

/// Whether `source` starts with `OggS`.
///
/// The first four bytes are read under a mark and the position is restored
/// afterwards, also when the read fails. Inputs shorter than the signature
/// simply do not match. Sources without mark support are declined unread.
pub fn has_ogg_magic<S: ByteSource + ?Sized>(source: &mut S) -> io::Result<bool> {
    if !source.supports_mark() {
        return Ok(false);
    }

    let mut guard = Rewind::new(source, CAPTURE.len() as u64)?;
    let mut magic = [0u8; 4];
    let read = guard.read_exact(&mut magic);
    guard.finish()?;

    match read {
        Ok(()) => Ok(&magic == CAPTURE),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Tally every logical stream `packets` yields.
///
/// Only beginning-of-stream packets matter; the source is still drained to
/// the end so streams starting late in the container are counted too.
pub fn tally<P: PacketSource + ?Sized>(
    packets: &mut P,
    opts: &DetectOptions,
) -> Result<Accumulator> {
    let mut acc = Accumulator::new();

    while let Some(packet) = packets.next_packet()? {
        if packet.bos {
            acc.observe(
                packet.serial,
                packet.data,
                opts.signatures,
                opts.min_first_packet_len,
            );
        }
    }

    Ok(acc)
}

#[derive(Debug, Clone, Default)]
pub struct Detector {
    opts: DetectOptions,
}

impl Detector {
    pub fn new(opts: DetectOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &DetectOptions {
        &self.opts
    }

    /// Classify the container `packets` yields, skipping the physical checks.
    pub fn detect_packets<P: PacketSource + ?Sized>(
        &self,
        packets: &mut P,
    ) -> Result<Detection> {
        let acc = tally(packets, &self.opts)?;
        let verdict = decision::decide(&acc, self.opts.opus_multitrack);
        Ok(Detection::from_tally(&acc, verdict, 0))
    }

    /// Detect what `source` contains, leaving its position untouched.
    pub fn detect<S: ByteSource + ?Sized>(&self, source: &mut S) -> Result<Detection> {
        if !source.supports_mark() {
            tracing::debug!("input cannot be rewound, not scanning it");
            return Ok(Detection::without_scan(Verdict::OctetStream));
        }

        if !has_ogg_magic(source)? {
            return Ok(Detection::without_scan(Verdict::OctetStream));
        }

        // A full scan may read to the very end, so it needs a mark that spans
        // the whole input.
        let Some(len) = source.total_len() else {
            tracing::debug!("input length unknown, skipping stream scan");
            return Ok(Detection::without_scan(Verdict::OggGeneral));
        };

        let mut guard = Rewind::new(source, len.saturating_add(1))?;
        let scanned = self.scan(&mut guard);
        let restored = guard.finish();

        let detection = scanned?;
        restored?;

        tracing::debug!(
            verdict = %detection.verdict,
            streams = detection.total_streams,
            "detected Ogg content"
        );
        Ok(detection)
    }

    /// Like [`Detector::detect`], with a missing input treated as unknown data.
    pub fn detect_input<S: ByteSource + ?Sized>(
        &self,
        source: Option<&mut S>,
    ) -> Result<Detection> {
        match source {
            Some(source) => self.detect(source),
            None => Ok(Detection::without_scan(Verdict::OctetStream)),
        }
    }

    fn scan<R: Read>(&self, input: R) -> Result<Detection> {
        let mut reader = OggPacketReader::new(input).resync(self.opts.resync);
        let acc = tally(&mut reader, &self.opts)?;
        let verdict = decision::decide(&acc, self.opts.opus_multitrack);

        Ok(Detection::from_tally(&acc, verdict, reader.consumed()))
    }
}

/// Detect with default options.
pub fn detect<S: ByteSource + ?Sized>(source: &mut S) -> Result<Verdict> {
    Ok(Detector::default().detect(source)?.verdict)
}
