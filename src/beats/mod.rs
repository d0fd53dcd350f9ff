//! Beat timeline extraction
//!
//! Decoding and onset analysis are expensive, so results are cached per
//! track. The engine only sees the [`BeatSource`] seam.

pub mod cache;
pub mod decode;
pub mod onset;
pub mod timeline;

pub use cache::BeatCache;
pub use decode::{DecodedAudio, OggDecoder, TrackDecoder};
pub use onset::{OnsetDetector, OnsetParams};
pub use timeline::BeatTimeline;

use std::path::Path;

use crate::error::DecodeError;

/// Anything that can provide the beat timeline for a track
pub trait BeatSource {
    fn beats_for(&self, track: &Path) -> Result<BeatTimeline, DecodeError>;
}

/// A fixed timeline serves every track (scripted levels, tests)
impl BeatSource for BeatTimeline {
    fn beats_for(&self, _track: &Path) -> Result<BeatTimeline, DecodeError> {
        Ok(self.clone())
    }
}

/// Decode → detect onsets → cache
#[derive(Debug)]
pub struct BeatExtractor<D: TrackDecoder = OggDecoder> {
    decoder: D,
    detector: OnsetDetector,
    cache: Option<BeatCache>,
}

impl BeatExtractor<OggDecoder> {
    /// Ogg extractor with a cache directory
    pub fn ogg(cache_dir: impl Into<std::path::PathBuf>) -> Self {
        Self::new(OggDecoder).with_cache(BeatCache::new(cache_dir))
    }
}

impl<D: TrackDecoder> BeatExtractor<D> {
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            detector: OnsetDetector::default(),
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: BeatCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_detector(mut self, detector: OnsetDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Beat timeline for `track`, from cache when possible
    pub fn extract(&self, track: &Path) -> Result<BeatTimeline, DecodeError> {
        if let Some(timeline) = self.cache.as_ref().and_then(|c| c.load(track)) {
            return Ok(timeline);
        }

        let audio = self.decoder.decode(track)?;
        let beats = self.detector.detect(&audio)?;
        let timeline = BeatTimeline::new(beats).map_err(|e| DecodeError::Analysis(e.to_string()))?;
        log::info!(
            "Extracted {} beats from {} ({:.1}s)",
            timeline.len(),
            track.display(),
            audio.duration_seconds()
        );

        if let Some(cache) = &self.cache {
            cache.store(track, &timeline);
        }
        Ok(timeline)
    }
}

impl<D: TrackDecoder> BeatSource for BeatExtractor<D> {
    fn beats_for(&self, track: &Path) -> Result<BeatTimeline, DecodeError> {
        self.extract(track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::f32::consts::PI;

    /// Synthesises a click track and counts decode calls
    struct ClickDecoder {
        calls: Cell<usize>,
    }

    impl TrackDecoder for ClickDecoder {
        fn decode(&self, track: &Path) -> Result<DecodedAudio, DecodeError> {
            self.calls.set(self.calls.get() + 1);
            if track.extension().is_some_and(|e| e == "bad") {
                return Err(DecodeError::Format {
                    path: track.to_path_buf(),
                    message: "not audio".to_string(),
                });
            }
            let rate = 22_050u32;
            let mut samples = vec![0.0f32; rate as usize * 3];
            for beat in 1..6 {
                let start = beat * rate as usize / 2;
                for i in 0..200 {
                    samples[start + i] = (2.0 * PI * 800.0 * i as f32 / rate as f32).sin();
                }
            }
            Ok(DecodedAudio {
                sample_rate: rate,
                samples,
            })
        }
    }

    fn extractor(cache: Option<&Path>) -> BeatExtractor<ClickDecoder> {
        let e = BeatExtractor::new(ClickDecoder { calls: Cell::new(0) });
        match cache {
            Some(dir) => e.with_cache(BeatCache::new(dir)),
            None => e,
        }
    }

    #[test]
    fn test_extract_is_monotonic() {
        let timeline = extractor(None).extract(Path::new("clicks.ogg")).unwrap();
        assert!(!timeline.is_empty());
        let s = timeline.as_slice();
        assert!(s.iter().all(|&t| t >= 0.0));
        assert!(s.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_second_extract_hits_cache_bit_identical() {
        let dir = tempfile::tempdir().unwrap();
        let e = extractor(Some(dir.path()));
        let track = Path::new("clicks.ogg");

        let first = e.extract(track).unwrap();
        let second = e.extract(track).unwrap();
        assert_eq!(e.decoder().calls.get(), 1);

        let bits = |t: &BeatTimeline| t.as_slice().iter().map(|b| b.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&second));
    }

    #[test]
    fn test_no_cache_decodes_every_time() {
        let e = extractor(None);
        let a = e.extract(Path::new("clicks.ogg")).unwrap();
        let b = e.extract(Path::new("clicks.ogg")).unwrap();
        assert_eq!(e.decoder().calls.get(), 2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_corrupt_cache_recomputes() {
        let dir = tempfile::tempdir().unwrap();
        let e = extractor(Some(dir.path()));
        std::fs::write(dir.path().join("clicks.ogg.json"), "garbage").unwrap();

        let timeline = e.extract(Path::new("clicks.ogg")).unwrap();
        assert_eq!(e.decoder().calls.get(), 1);
        assert!(!timeline.is_empty());
        // Entry was rewritten with the fresh result
        let again = e.extract(Path::new("clicks.ogg")).unwrap();
        assert_eq!(e.decoder().calls.get(), 1);
        assert_eq!(timeline, again);
    }

    #[test]
    fn test_decode_error_propagates_and_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let e = extractor(Some(dir.path()));
        let err = e.beats_for(Path::new("song.bad")).unwrap_err();
        assert!(matches!(err, DecodeError::Format { .. }));
        assert!(!dir.path().join("song.bad.json").exists());
    }

    #[test]
    fn test_fixed_timeline_source() {
        let fixed = BeatTimeline::new(vec![0.5, 1.0]).unwrap();
        assert_eq!(fixed.beats_for(Path::new("anything")).unwrap(), fixed);
    }
}
