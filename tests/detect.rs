//! End-to-end detection over in-memory and on-disk containers.

mod common;

use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use common::*;
use oggsniff::{
    detect, BufferedSource, Codec, DetectError, DetectOptions, Detector, OneShot,
    OpusMultiTrack, SeekSource, Verdict,
};

fn source(bytes: Vec<u8>) -> SeekSource<Cursor<Vec<u8>>> {
    SeekSource::new(Cursor::new(bytes)).unwrap()
}

fn verdict_of(bytes: Vec<u8>) -> Verdict {
    detect(&mut source(bytes)).unwrap()
}

#[test]
fn non_ogg_input_is_octet_stream() {
    for bytes in [
        b"RIFF\x24\x00\x00\x00WAVEfmt ".to_vec(),
        b"fLaC\x00\x00\x00\x22".to_vec(),
        b"Ogg".to_vec(),
        Vec::new(),
    ] {
        let mut src = source(bytes);
        assert_eq!(detect(&mut src).unwrap(), Verdict::OctetStream);
        assert_eq!(src.position().unwrap(), 0);
    }
}

#[test]
fn single_stream_audio() {
    assert_eq!(verdict_of(single(1, VORBIS_ID)), Verdict::Vorbis);
    assert_eq!(verdict_of(single(2, OPUS_HEAD)), Verdict::Opus);
    assert_eq!(verdict_of(single(3, SPEEX_HEADER)), Verdict::Speex);
    assert_eq!(verdict_of(single(4, FLAC_FIRST)), Verdict::Flac);
}

#[test]
fn multi_track_audio() {
    for (header, expected) in [
        (VORBIS_ID, Verdict::Vorbis),
        (SPEEX_HEADER, Verdict::Speex),
        (FLAC_FIRST, Verdict::Flac),
    ] {
        let bytes = OggWriter::new()
            .begin(10, header)
            .begin(11, header)
            .begin(12, header)
            .data(10, &[1; 40])
            .data(12, &[2; 40])
            .data(11, &[3; 40])
            .end(10, &[0; 4])
            .end(11, &[0; 4])
            .end(12, &[0; 4])
            .finish();

        assert_eq!(verdict_of(bytes), expected);
    }
}

#[test]
fn multi_track_opus_follows_configured_rule() {
    let bytes = OggWriter::new()
        .begin(1, OPUS_HEAD)
        .begin(2, OPUS_HEAD)
        .data(1, &[9; 20])
        .data(2, &[9; 20])
        .finish();

    let total = Detector::default().detect(&mut source(bytes.clone())).unwrap();
    assert_eq!(total.verdict, Verdict::Opus);

    let legacy = Detector::new(DetectOptions {
        opus_multitrack: OpusMultiTrack::VorbisCount,
        ..DetectOptions::default()
    })
    .detect(&mut source(bytes))
    .unwrap();
    assert_eq!(legacy.verdict, Verdict::OggGeneral);
}

#[test]
fn zero_streams_is_generic() {
    // A capture pattern followed by nothing resembling a page
    let bytes = b"OggS and nothing else worth reading here".to_vec();
    let detection = Detector::default().detect(&mut source(bytes)).unwrap();

    assert_eq!(detection.verdict, Verdict::OggGeneral);
    assert_eq!(detection.total_streams, 0);
}

#[test]
fn mixed_codecs_are_generic() {
    let bytes = OggWriter::new()
        .begin(1, VORBIS_ID)
        .begin(2, SPEEX_HEADER)
        .data(1, &[0; 30])
        .data(2, &[0; 30])
        .finish();

    let detection = Detector::default().detect(&mut source(bytes)).unwrap();
    assert_eq!(detection.verdict, Verdict::OggGeneral);
    assert_eq!(detection.total_streams, 2);
    assert_eq!(detection.counts.get(&Codec::Vorbis), Some(&1));
    assert_eq!(detection.counts.get(&Codec::Speex), Some(&1));
}

#[test]
fn video_is_not_classified_yet() {
    let bytes = OggWriter::new()
        .begin(1, THEORA_ID)
        .begin(2, VORBIS_ID)
        .data(1, &[0; 100])
        .data(2, &[0; 30])
        .finish();

    let detection = Detector::default().detect(&mut source(bytes)).unwrap();
    assert_eq!(detection.verdict, Verdict::OggGeneral);
    assert_eq!(detection.counts.get(&Codec::Theora), Some(&1));
}

#[test]
fn skeleton_stream_is_counted_but_breaks_single_stream_rule() {
    let bytes = OggWriter::new()
        .begin(1, SKELETON_HEAD)
        .begin(2, VORBIS_ID)
        .end(1, &[])
        .data(2, &[0; 30])
        .finish();

    let detection = Detector::default().detect(&mut source(bytes)).unwrap();
    assert_eq!(detection.verdict, Verdict::OggGeneral);
    assert_eq!(detection.counts.get(&Codec::Skeleton), Some(&1));
}

#[test]
fn short_first_packet_is_not_classified() {
    let bytes = single(1, b"OpusHead\x01\x02");
    let detection = Detector::default().detect(&mut source(bytes)).unwrap();

    assert_eq!(detection.verdict, Verdict::OggGeneral);
    assert_eq!(detection.total_streams, 1);
    assert!(detection.counts.is_empty());
}

#[test]
fn header_spanning_pages_is_classified() {
    let mut header = VORBIS_ID.to_vec();
    // More than 255 lacing values, so the packet continues on a second page
    header.resize(70_000, 0);

    assert_eq!(verdict_of(single(5, &header)), Verdict::Vorbis);
}

#[test]
fn stream_starting_late_is_counted() {
    let bytes = OggWriter::new()
        .begin(1, VORBIS_ID)
        .data(1, &[0; 30])
        .end(1, &[0; 4])
        .begin(2, VORBIS_ID)
        .end(2, &[0; 4])
        .finish();

    let detection = Detector::default().detect(&mut source(bytes)).unwrap();
    assert_eq!(detection.total_streams, 2);
    assert_eq!(detection.verdict, Verdict::Vorbis);
}

#[test]
fn detection_is_idempotent_and_position_preserving() {
    let mut prefixed = b"head".to_vec();
    prefixed.extend(single(1, FLAC_FIRST));

    let mut cursor = Cursor::new(prefixed);
    cursor.set_position(4);
    let mut src = SeekSource::new(cursor).unwrap();

    let detector = Detector::default();
    let first = detector.detect(&mut src).unwrap();
    assert_eq!(src.position().unwrap(), 4);

    let second = detector.detect(&mut src).unwrap();
    assert_eq!(src.position().unwrap(), 4);

    assert_eq!(first, second);
    assert_eq!(first.verdict, Verdict::Flac);
}

#[test]
fn scanned_bytes_cover_the_container() {
    let bytes = single(1, VORBIS_ID);
    let len = bytes.len() as u64;

    let detection = Detector::default().detect(&mut source(bytes)).unwrap();
    assert_eq!(detection.scanned_bytes, len);
}

/// Reads succeed up to `fail_at`, then fail.
struct FailingReader {
    inner: Cursor<Vec<u8>>,
    fail_at: u64,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let pos = self.inner.position();
        if pos >= self.fail_at {
            return Err(io::Error::other("device went away"));
        }
        let allowed = (self.fail_at - pos) as usize;
        let n = buf.len().min(allowed);
        self.inner.read(&mut buf[..n])
    }
}

impl Seek for FailingReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

#[test]
fn io_failure_propagates_after_rewinding() {
    let bytes = OggWriter::new()
        .begin(1, VORBIS_ID)
        .data(1, &[0; 4000])
        .finish();

    let reader = FailingReader {
        inner: Cursor::new(bytes),
        fail_at: 100,
    };
    let mut src = SeekSource::new(reader).unwrap();

    let result = Detector::default().detect(&mut src);
    assert!(matches!(result, Err(DetectError::Io(_))));
    assert_eq!(src.position().unwrap(), 0);
}

#[test]
fn io_failure_during_magic_check_rewinds() {
    let reader = FailingReader {
        inner: Cursor::new(b"OggS\x00\x02".to_vec()),
        fail_at: 2,
    };
    let mut src = SeekSource::new(reader).unwrap();

    assert!(Detector::default().detect(&mut src).is_err());
    assert_eq!(src.position().unwrap(), 0);
}

#[test]
fn unrewindable_input_is_left_alone() {
    let bytes = single(1, VORBIS_ID);
    let mut src = OneShot(&bytes[..]);

    assert_eq!(detect(&mut src).unwrap(), Verdict::OctetStream);

    let mut rest = Vec::new();
    src.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, bytes);
}

#[test]
fn buffered_input_gets_generic_verdict() {
    let bytes = single(1, VORBIS_ID);
    let mut src = BufferedSource::new(&bytes[..]);

    assert_eq!(detect(&mut src).unwrap(), Verdict::OggGeneral);

    let mut rest = Vec::new();
    src.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, bytes);
}

#[test]
fn missing_input_is_octet_stream() {
    let detection = Detector::default()
        .detect_input::<OneShot<&[u8]>>(None)
        .unwrap();
    assert_eq!(detection.verdict, Verdict::OctetStream);
}

#[test]
fn detects_from_file() {
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(&single(7, OPUS_HEAD)).unwrap();
    file.rewind().unwrap();

    let mut src = SeekSource::new(file).unwrap();
    assert_eq!(detect(&mut src).unwrap(), Verdict::Opus);
    assert_eq!(src.position().unwrap(), 0);
}

#[test]
fn detection_serializes_to_json() {
    let detection = Detector::default()
        .detect(&mut source(single(1, SPEEX_HEADER)))
        .unwrap();
    let json = serde_json::to_value(&detection).unwrap();

    assert_eq!(json["verdict"], "audio/speex");
    assert_eq!(json["total_streams"], 1);
    assert_eq!(json["counts"]["speex"], 1);
}
