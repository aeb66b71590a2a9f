use serde::{Serialize, Serializer};

/// The content type a detection call settles on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Not an Ogg container, or no input at all
    OctetStream,
    /// Ogg container with unknown or mixed contents
    OggGeneral,
    OggAudio,
    OggVideo,
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
}

impl Verdict {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Verdict::OctetStream => "application/octet-stream",
            Verdict::OggGeneral => "application/ogg",
            Verdict::OggAudio => "audio/ogg",
            Verdict::OggVideo => "video/ogg",
            Verdict::Vorbis => "audio/vorbis",
            Verdict::Opus => "audio/opus",
            Verdict::Speex => "audio/speex",
            Verdict::Flac => "audio/x-oggflac",
            Verdict::Pcm => "audio/x-oggpcm",
            Verdict::Theora => "video/theora",
            Verdict::Dirac => "video/x-dirac",
            Verdict::Ogm => "video/x-ogm",
            Verdict::Uvs => "video/x-ogguvs",
            Verdict::Yuv => "video/x-oggyuv",
            Verdict::Rgb => "video/x-oggrgb",
        }
    }

    /// The `audio/ogg; codecs=...` spelling some consumers expect instead.
    pub fn alternate_mime_type(&self) -> Option<&'static str> {
        match self {
            Verdict::Opus => Some("audio/ogg; codecs=opus"),
            Verdict::Speex => Some("audio/ogg; codecs=speex"),
            _ => None,
        }
    }

    /// Whether the input was recognised as Ogg at all.
    pub fn is_ogg(&self) -> bool {
        *self != Verdict::OctetStream
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.mime_type())
    }
}
