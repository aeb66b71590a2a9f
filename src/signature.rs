//! First-packet signatures of the codecs that can live inside Ogg.
//!
//! The table is data: adding a codec means adding a row, not a branch. Order
//! only matters for the order matches are reported in; the decision rules
//! have their own priority order.

use serde::Serialize;

use crate::detector::{flac, opus, speex, vorbis};
use crate::verdict::Verdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Codec {
    Vorbis,
    Opus,
    Speex,
    Flac,
    Pcm,
    Theora,
    Dirac,
    Ogm,
    Uvs,
    Yuv,
    Rgb,
    Cmml,
    Kate,
    Annodex,
    Skeleton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    Audio,
    Video,
    Metadata,
}

impl Codec {
    /// Codecs the decision rules act on, in rule priority order.
    pub const ACTIVE: [Codec; 4] = [Codec::Vorbis, Codec::Speex, Codec::Opus, Codec::Flac];

    pub fn name(&self) -> &'static str {
        match self {
            Codec::Vorbis => "vorbis",
            Codec::Opus => "opus",
            Codec::Speex => "speex",
            Codec::Flac => "flac",
            Codec::Pcm => "pcm",
            Codec::Theora => "theora",
            Codec::Dirac => "dirac",
            Codec::Ogm => "ogm",
            Codec::Uvs => "uvs",
            Codec::Yuv => "yuv",
            Codec::Rgb => "rgb",
            Codec::Cmml => "cmml",
            Codec::Kate => "kate",
            Codec::Annodex => "annodex",
            Codec::Skeleton => "skeleton",
        }
    }

    pub fn kind(&self) -> CodecKind {
        match self {
            Codec::Vorbis | Codec::Opus | Codec::Speex | Codec::Flac | Codec::Pcm => {
                CodecKind::Audio
            }
            Codec::Theora | Codec::Dirac | Codec::Ogm | Codec::Uvs | Codec::Yuv | Codec::Rgb => {
                CodecKind::Video
            }
            Codec::Cmml | Codec::Kate | Codec::Annodex | Codec::Skeleton => CodecKind::Metadata,
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    /// The verdict a container made only of this codec would get, if any.
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            Codec::Vorbis => Some(Verdict::Vorbis),
            Codec::Opus => Some(Verdict::Opus),
            Codec::Speex => Some(Verdict::Speex),
            Codec::Flac => Some(Verdict::Flac),
            Codec::Pcm => Some(Verdict::Pcm),
            Codec::Theora => Some(Verdict::Theora),
            Codec::Dirac => Some(Verdict::Dirac),
            Codec::Ogm => Some(Verdict::Ogm),
            Codec::Uvs => Some(Verdict::Uvs),
            Codec::Yuv => Some(Verdict::Yuv),
            Codec::Rgb => Some(Verdict::Rgb),
            Codec::Cmml | Codec::Kate | Codec::Annodex | Codec::Skeleton => None,
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy)]
pub enum Matcher {
    /// `pattern` must appear byte for byte at `offset` in the first packet
    Magic {
        pattern: &'static [u8],
        offset: usize,
    },
    /// Codec-specific recognizer over the whole first packet
    Recognizer(fn(&[u8]) -> bool),
}

impl Matcher {
    pub fn matches(&self, packet: &[u8]) -> bool {
        match *self {
            Matcher::Magic { pattern, offset } => packet
                .get(offset..)
                .is_some_and(|tail| tail.starts_with(pattern)),
            Matcher::Recognizer(recognize) => recognize(packet),
        }
    }
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Matcher::Magic { pattern, offset } => f
                .debug_struct("Magic")
                .field("pattern", &pattern.escape_ascii().to_string())
                .field("offset", offset)
                .finish(),
            Matcher::Recognizer(_) => f.write_str("Recognizer"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub codec: Codec,
    pub matcher: Matcher,
}

const fn magic(codec: Codec, pattern: &'static [u8]) -> Signature {
    Signature {
        codec,
        matcher: Matcher::Magic { pattern, offset: 0 },
    }
}

const fn recognizer(codec: Codec, recognize: fn(&[u8]) -> bool) -> Signature {
    Signature {
        codec,
        matcher: Matcher::Recognizer(recognize),
    }
}

pub static SIGNATURES: &[Signature] = &[
    recognizer(Codec::Vorbis, vorbis::is_vorbis_stream),
    recognizer(Codec::Opus, opus::is_opus_stream),
    recognizer(Codec::Speex, speex::is_speex_stream),
    recognizer(Codec::Flac, flac::is_flac_stream),
    magic(Codec::Pcm, b"PCM     "),
    magic(Codec::Theora, b"\x80theora"),
    magic(Codec::Dirac, b"BBCD"),
    magic(Codec::Ogm, b"video"),
    magic(Codec::Uvs, b"UVS "),
    magic(Codec::Yuv, b"\x01YUV"),
    magic(Codec::Rgb, b"\x01GBP"),
    magic(Codec::Cmml, b"CMML\0\0\0\0"),
    magic(Codec::Kate, b"kate\0\0\0"),
    magic(Codec::Annodex, b"Annodex\0"),
    magic(Codec::Skeleton, b"fishead\0"),
];

/// Every codec in `table` whose signature matches `packet`.
///
/// Packets no longer than `min_len` are not tested at all.
pub fn classify(packet: &[u8], table: &[Signature], min_len: usize) -> Vec<Codec> {
    if packet.len() <= min_len {
        return Vec::new();
    }

    table
        .iter()
        .filter(|sig| sig.matcher.matches(packet))
        .map(|sig| sig.codec)
        .collect()
}
