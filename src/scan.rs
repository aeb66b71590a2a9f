//! Locate Ogg containers embedded in arbitrary data.
//!
//! Every `OggS` hit that starts a beginning-of-stream page is a candidate.
//! Candidates are classified with resync off, so each container ends at the
//! first byte that is not a page, and hits inside an already reported
//! container are skipped.

use std::io::Cursor;

use memchr::memmem;
use serde::Serialize;

use crate::demux::{PageHeader, CAPTURE};
use crate::detector::{DetectOptions, Detection, Detector};
use crate::error::Result;
use crate::source::SeekSource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddedMatch {
    pub offset: usize,
    pub size: usize,
    #[serde(flatten)]
    pub detection: Detection,
}

pub struct Scanner {
    detector: Detector,
}

impl Scanner {
    pub fn new(opts: DetectOptions) -> Self {
        Self {
            detector: Detector::new(DetectOptions {
                resync: false,
                ..opts
            }),
        }
    }

    pub fn scan(&self, buffer: &[u8]) -> Result<Vec<EmbeddedMatch>> {
        let mut found = Vec::new();
        let mut covered = 0;

        for offset in memmem::find_iter(buffer, CAPTURE) {
            if offset < covered {
                continue;
            }

            let starts_stream =
                PageHeader::parse(&buffer[offset..]).is_some_and(|header| header.is_bos());
            if !starts_stream {
                continue;
            }

            let mut source = SeekSource::new(Cursor::new(&buffer[offset..]))?;
            let detection = self.detector.detect(&mut source)?;
            let size = detection.scanned_bytes as usize;

            if detection.total_streams == 0 || size == 0 {
                continue;
            }

            tracing::debug!(offset, size, verdict = %detection.verdict, "embedded Ogg container");

            covered = offset + size;
            found.push(EmbeddedMatch {
                offset,
                size,
                detection,
            });
        }

        Ok(found)
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(DetectOptions::default())
    }
}
