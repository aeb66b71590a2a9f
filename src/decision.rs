//! Per-stream tallies and the rules that turn them into one verdict.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use bytes::Bytes;
use serde::Serialize;

use crate::signature::{self, Codec, Signature};
use crate::verdict::Verdict;

/// How the multi-track Opus rule decides that every stream is Opus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpusMultiTrack {
    /// Every stream must be Opus, like the other codecs
    #[default]
    TotalStreams,
    /// More than one Opus stream and every stream Vorbis. A stream cannot be
    /// both and the Vorbis rules run first, so this never fires and
    /// multi-Opus files stay generic.
    VorbisCount,
}

/// One logical stream seen during a scan.
#[derive(Debug, Clone)]
pub struct LogicalStream {
    pub id: u32,
    pub first_packet: Bytes,
    pub matches: Vec<Codec>,
}

impl LogicalStream {
    pub fn classification(&self) -> Option<Codec> {
        self.matches.first().copied()
    }
}

#[derive(Debug, Default, Clone)]
pub struct Accumulator {
    streams: BTreeMap<u32, LogicalStream>,
    counts: BTreeMap<Codec, usize>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the first packet of stream `id`, classifying it against `table`.
    ///
    /// Returns `false` and changes nothing when `id` has already been seen.
    pub fn observe(
        &mut self,
        id: u32,
        first_packet: Bytes,
        table: &[Signature],
        min_len: usize,
    ) -> bool {
        let slot = match self.streams.entry(id) {
            Entry::Occupied(_) => return false,
            Entry::Vacant(slot) => slot,
        };

        let matches = signature::classify(&first_packet, table, min_len);
        for codec in &matches {
            *self.counts.entry(*codec).or_default() += 1;
        }

        tracing::debug!(
            serial = id,
            len = first_packet.len(),
            matches = ?matches,
            "classified logical stream"
        );

        slot.insert(LogicalStream {
            id,
            first_packet,
            matches,
        });
        true
    }

    /// Add `count` streams of `codec` without packets. Only useful for
    /// exercising the decision rules directly.
    pub fn with_streams(mut self, codec: Option<Codec>, count: usize) -> Self {
        for _ in 0..count {
            let id = self.streams.keys().next_back().map_or(0, |last| last + 1);
            let matches: Vec<Codec> = codec.into_iter().collect();
            if let Some(codec) = codec {
                *self.counts.entry(codec).or_default() += 1;
            }
            self.streams.insert(
                id,
                LogicalStream {
                    id,
                    first_packet: Bytes::new(),
                    matches,
                },
            );
        }
        self
    }

    pub fn total_streams(&self) -> usize {
        self.streams.len()
    }

    pub fn count(&self, codec: Codec) -> usize {
        self.counts.get(&codec).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &BTreeMap<Codec, usize> {
        &self.counts
    }

    pub fn streams(&self) -> impl Iterator<Item = &LogicalStream> {
        self.streams.values()
    }
}

/// Fold the tallies into a single verdict. First matching rule wins.
pub fn decide(acc: &Accumulator, opus_rule: OpusMultiTrack) -> Verdict {
    let total = acc.total_streams();

    // Empty container body
    if total == 0 {
        return Verdict::OggGeneral;
    }

    // Single-stream audio file
    for codec in Codec::ACTIVE {
        if total == 1 && acc.count(codec) == 1 {
            return single_verdict(codec);
        }
    }

    // Multi-track file made of one codec only
    for codec in Codec::ACTIVE {
        let covering = match (codec, opus_rule) {
            (Codec::Opus, OpusMultiTrack::VorbisCount) => acc.count(Codec::Vorbis),
            _ => acc.count(codec),
        };
        if acc.count(codec) > 1 && covering == total {
            return single_verdict(codec);
        }
    }

    // TODO: classify video-only and mixed audio/video containers once the
    // theora/dirac/ogm rows get rules of their own.
    Verdict::OggGeneral
}

fn single_verdict(codec: Codec) -> Verdict {
    codec.verdict().unwrap_or(Verdict::OggGeneral)
}
