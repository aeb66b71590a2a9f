//! # oggsniff
//!
//! Works out what an Ogg container actually holds without decoding it.
//!
//! The physical stream is checked for the `OggS` signature, demultiplexed
//! into logical streams, and the first packet of every logical stream is
//! matched against a table of codec signatures. The per-codec tallies are
//! then folded into a single [`Verdict`]: a specific audio type for
//! single-codec files, `application/ogg` for anything mixed or unknown, and
//! `application/octet-stream` for input that is not Ogg at all.
//!
//! ## Example
//!
//! ```no_run
//! use std::fs::File;
//! use oggsniff::{Detector, SeekSource};
//!
//! let mut source = SeekSource::new(File::open("song.ogg")?)?;
//! let detection = Detector::default().detect(&mut source)?;
//!
//! println!("{} ({} streams)", detection.verdict, detection.total_streams);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod decision;
pub mod demux;
pub mod detector;
pub mod error;
pub mod scan;
pub mod signature;
pub mod source;
pub mod verdict;

pub use decision::{Accumulator, OpusMultiTrack};
pub use demux::{OggPacket, OggPacketReader, PacketSource};
pub use detector::{detect, has_ogg_magic, DetectOptions, Detection, Detector};
pub use error::DetectError;
pub use scan::{EmbeddedMatch, Scanner};
pub use signature::{Codec, CodecKind};
pub use source::{BufferedSource, ByteSource, OneShot, SeekSource};
pub use verdict::Verdict;
