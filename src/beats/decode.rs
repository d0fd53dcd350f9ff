//! Track decoding
//!
//! Songs ship as Ogg Vorbis; analysis only needs a mono signal at the
//! track's native rate, so no resampling happens here.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use lewton::inside_ogg::OggStreamReader;

use crate::error::DecodeError;

/// Mono PCM ready for analysis
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    /// Samples in [-1, 1], channels averaged
    pub samples: Vec<f32>,
}

impl DecodedAudio {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Turns a track on disk into PCM
pub trait TrackDecoder {
    fn decode(&self, track: &Path) -> Result<DecodedAudio, DecodeError>;
}

/// Ogg Vorbis decoder backed by lewton
#[derive(Debug, Default, Clone, Copy)]
pub struct OggDecoder;

impl TrackDecoder for OggDecoder {
    fn decode(&self, track: &Path) -> Result<DecodedAudio, DecodeError> {
        let file = File::open(track).map_err(|source| DecodeError::Io {
            path: track.to_path_buf(),
            source,
        })?;
        let format_err = |e: lewton::VorbisError| DecodeError::Format {
            path: track.to_path_buf(),
            message: e.to_string(),
        };

        let mut ogg = OggStreamReader::new(BufReader::new(file)).map_err(format_err)?;
        let channels = ogg.ident_hdr.audio_channels as usize;
        let sample_rate = ogg.ident_hdr.audio_sample_rate;
        if channels == 0 || sample_rate == 0 {
            return Err(DecodeError::Format {
                path: track.to_path_buf(),
                message: format!("{channels} channels at {sample_rate} Hz"),
            });
        }

        let mut samples = Vec::new();
        while let Some(packet) = ogg.read_dec_packet_itl().map_err(format_err)? {
            samples.extend(downmix(&packet, channels));
        }

        if samples.is_empty() {
            return Err(DecodeError::Empty {
                path: track.to_path_buf(),
            });
        }

        log::debug!(
            "Decoded {} ({} Hz, {} ch, {:.1}s)",
            track.display(),
            sample_rate,
            channels,
            samples.len() as f64 / sample_rate as f64
        );
        Ok(DecodedAudio {
            sample_rate,
            samples,
        })
    }
}

/// Average interleaved i16 frames into mono f32
fn downmix(interleaved: &[i16], channels: usize) -> impl Iterator<Item = f32> + '_ {
    interleaved.chunks_exact(channels).map(move |frame| {
        let sum: f32 = frame.iter().map(|&s| s as f32 / 32768.0).sum();
        sum / channels as f32
    })
}
