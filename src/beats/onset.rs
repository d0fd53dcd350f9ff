//! Onset detection
//!
//! Spectral flux over a Hann-windowed STFT, followed by adaptive-threshold
//! peak picking. The picked onsets are then locked to a tempo: the beat
//! period is estimated from the autocorrelation of the flux envelope and only
//! onsets that follow that grid are kept, so busy passages do not turn every
//! drum hit into a jar. Fully deterministic: the same samples always produce
//! the same beats.

use std::f32::consts::PI;

use realfft::RealFftPlanner;

use super::decode::DecodedAudio;
use crate::error::DecodeError;

/// Tunables for [`OnsetDetector`]
#[derive(Debug, Clone, PartialEq)]
pub struct OnsetParams {
    /// STFT frame length in samples
    pub frame_size: usize,
    /// Samples between successive frames
    pub hop_size: usize,
    /// Half-width (frames) of the local-maximum window
    pub peak_radius: usize,
    /// Half-width (frames) of the moving-average threshold window
    pub mean_radius: usize,
    /// Threshold offset as a fraction of the strongest flux value
    pub delta: f32,
    /// Minimum seconds between two detected beats
    pub min_interval: f64,
    /// Keep only onsets that follow the estimated beat period
    pub tempo_lock: bool,
    /// Slowest tempo considered when estimating the period
    pub min_bpm: f64,
    /// Fastest tempo considered when estimating the period
    pub max_bpm: f64,
    /// How far (in periods) a beat may stray from the grid
    pub tempo_tolerance: f32,
}

impl Default for OnsetParams {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            hop_size: 512,
            peak_radius: 3,
            mean_radius: 16,
            delta: 0.07,
            min_interval: 0.2,
            tempo_lock: true,
            min_bpm: 60.0,
            max_bpm: 180.0,
            tempo_tolerance: 0.25,
        }
    }
}

/// Finds rhythmic onsets in decoded audio
#[derive(Debug, Clone, Default)]
pub struct OnsetDetector {
    params: OnsetParams,
}

impl OnsetDetector {
    pub fn new(params: OnsetParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &OnsetParams {
        &self.params
    }

    /// Onset times in seconds (frame centres), ascending
    pub fn detect(&self, audio: &DecodedAudio) -> Result<Vec<f64>, DecodeError> {
        let envelope = self.onset_strength(&audio.samples)?;
        let mut peaks = self.pick_peaks(&envelope);

        let p = &self.params;
        let rate = audio.sample_rate.max(1) as f64;
        if p.tempo_lock && peaks.len() >= 3 {
            if let Some(period) = self.beat_period(&envelope, rate) {
                let bpm = 60.0 * rate / (period * p.hop_size) as f64;
                log::debug!("Estimated tempo {:.1} BPM ({} frames)", bpm, period);
                peaks = self.lock_to_tempo(&envelope, &peaks, period as f32);
            }
        }
        let mut beats: Vec<f64> = Vec::with_capacity(peaks.len());
        for frame in peaks {
            let t = (frame * p.hop_size + p.frame_size / 2) as f64 / rate;
            if beats.last().is_none_or(|&last| t - last >= p.min_interval) {
                beats.push(t);
            }
        }
        Ok(beats)
    }

    /// Positive spectral flux per frame (first frame is always 0)
    pub fn onset_strength(&self, samples: &[f32]) -> Result<Vec<f32>, DecodeError> {
        let p = &self.params;
        if samples.len() < p.frame_size || p.hop_size == 0 {
            return Ok(Vec::new());
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(p.frame_size);
        let mut input = fft.make_input_vec();
        let mut spectrum = fft.make_output_vec();
        let mut scratch = fft.make_scratch_vec();
        let window: Vec<f32> = (0..p.frame_size).map(|i| hann_value(i, p.frame_size)).collect();

        let frames = (samples.len() - p.frame_size) / p.hop_size + 1;
        let mut previous = vec![0.0f32; spectrum.len()];
        let mut envelope = Vec::with_capacity(frames);

        for frame in 0..frames {
            let start = frame * p.hop_size;
            let block = &samples[start..start + p.frame_size];
            for ((dst, &s), &w) in input.iter_mut().zip(block).zip(&window) {
                *dst = s * w;
            }

            fft.process_with_scratch(&mut input, &mut spectrum, &mut scratch)
                .map_err(|e| DecodeError::Analysis(e.to_string()))?;

            let mut flux = 0.0;
            for (bin, prev) in spectrum.iter().zip(previous.iter_mut()) {
                // Log compression keeps quiet passages from vanishing
                let magnitude = (1.0 + 100.0 * bin.norm()).ln();
                if frame > 0 {
                    flux += (magnitude - *prev).max(0.0);
                }
                *prev = magnitude;
            }
            envelope.push(flux);
        }

        Ok(envelope)
    }

    /// Beat period in frames within the configured tempo range
    fn beat_period(&self, envelope: &[f32], rate: f64) -> Option<usize> {
        let p = &self.params;
        if p.hop_size == 0 || p.min_bpm <= 0.0 || p.max_bpm < p.min_bpm {
            return None;
        }
        let frames_per_second = rate / p.hop_size as f64;
        let min_lag = (60.0 / p.max_bpm * frames_per_second).floor().max(1.0) as usize;
        let max_lag = (60.0 / p.min_bpm * frames_per_second).ceil() as usize;
        estimate_period(envelope, min_lag, max_lag)
    }

    /// Follow the beat grid through `peaks`
    ///
    /// From each kept beat the next one is the strongest peak within
    /// `tempo_tolerance` periods of one period later; earlier peaks are
    /// dropped. When that window is empty the grid restarts at the next peak.
    fn lock_to_tempo(&self, envelope: &[f32], peaks: &[usize], period: f32) -> Vec<usize> {
        let tolerance = self.params.tempo_tolerance.max(0.0);
        let mut kept: Vec<usize> = Vec::with_capacity(peaks.len());
        let mut rest = peaks;

        while let Some(&first) = rest.first() {
            let Some(&last) = kept.last() else {
                kept.push(first);
                rest = &rest[1..];
                continue;
            };

            let lo = last as f32 + (1.0 - tolerance) * period;
            let hi = last as f32 + (1.0 + tolerance) * period;
            let early = rest.iter().take_while(|&&f| (f as f32) < lo).count();
            rest = &rest[early..];
            let window = rest.iter().take_while(|&&f| f as f32 <= hi).count();

            // Strongest in the window, earliest on ties
            let pick = (0..window.max(1).min(rest.len()))
                .reduce(|best, i| if envelope[rest[i]] > envelope[rest[best]] { i } else { best });
            let Some(pick) = pick else {
                break;
            };
            kept.push(rest[pick]);
            rest = &rest[pick + 1..];
        }
        kept
    }

    /// Indices of frames that stand out from their neighbourhood
    fn pick_peaks(&self, envelope: &[f32]) -> Vec<usize> {
        let p = &self.params;
        let max = envelope.iter().copied().fold(0.0f32, f32::max);
        if max <= f32::EPSILON {
            return Vec::new();
        }
        let offset = p.delta * max;

        let mut peaks = Vec::new();
        for (i, &value) in envelope.iter().enumerate() {
            if value <= 0.0 {
                continue;
            }

            let lo = i.saturating_sub(p.peak_radius);
            let hi = (i + p.peak_radius + 1).min(envelope.len());
            // Ties go to the earliest frame
            let is_max = envelope[lo..hi]
                .iter()
                .enumerate()
                .all(|(j, &v)| v < value || (v == value && lo + j >= i));
            if !is_max {
                continue;
            }

            let lo = i.saturating_sub(p.mean_radius);
            let hi = (i + p.mean_radius + 1).min(envelope.len());
            let mean = envelope[lo..hi].iter().sum::<f32>() / (hi - lo) as f32;
            if value >= mean + offset {
                peaks.push(i);
            }
        }
        peaks
    }
}

/// Lag in `min_lag..=max_lag` where the envelope best matches itself
///
/// Halves the winner while half the lag scores at least half as well, so a
/// period of two beats collapses to one.
fn estimate_period(envelope: &[f32], min_lag: usize, max_lag: usize) -> Option<usize> {
    let n = envelope.len();
    let max_lag = max_lag.min(n.saturating_sub(1));
    if min_lag == 0 || min_lag > max_lag {
        return None;
    }

    // One frame of jitter between beats still lines up
    let widened: Vec<f32> = (0..n)
        .map(|i| {
            let hi = (i + 2).min(n);
            envelope[i.saturating_sub(1)..hi].iter().copied().fold(0.0, f32::max)
        })
        .collect();
    let scores: Vec<f32> = (min_lag..=max_lag)
        .map(|lag| widened.iter().zip(&widened[lag..]).map(|(a, b)| a * b).sum())
        .collect();
    let score = |lag: usize| scores[lag - min_lag];

    let mut best = (min_lag..=max_lag).reduce(|best, lag| if score(lag) > score(best) { lag } else { best })?;
    if score(best) <= 0.0 {
        return None;
    }

    loop {
        let lo = (best.saturating_sub(1) / 2).max(min_lag);
        let hi = (best + 2) / 2;
        let half = (lo..=hi).reduce(|a, lag| if score(lag) > score(a) { lag } else { a });
        match half {
            Some(half) if half < best && score(half) >= 0.5 * score(best) => best = half,
            _ => break,
        }
    }
    Some(best)
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 22_050;

    /// Silence with short tone bursts starting at each of `times`
    fn clicks(times: &[f64], total: f64) -> DecodedAudio {
        let mut samples = vec![0.0f32; (total * RATE as f64) as usize];
        let burst = (0.01 * RATE as f64) as usize;
        for &t in times {
            let start = (t * RATE as f64) as usize;
            for i in 0..burst {
                let phase = 2.0 * PI * 1000.0 * i as f32 / RATE as f32;
                samples[start + i] = 0.8 * phase.sin();
            }
        }
        DecodedAudio {
            sample_rate: RATE,
            samples,
        }
    }

    #[test]
    fn test_silence_has_no_beats() {
        let audio = DecodedAudio {
            sample_rate: RATE,
            samples: vec![0.0; RATE as usize * 2],
        };
        assert!(OnsetDetector::default().detect(&audio).unwrap().is_empty());
    }

    #[test]
    fn test_too_short_has_no_beats() {
        let audio = DecodedAudio {
            sample_rate: RATE,
            samples: vec![0.5; 100],
        };
        assert!(OnsetDetector::default().detect(&audio).unwrap().is_empty());
    }

    #[test]
    fn test_finds_clicks() {
        let times = [0.5, 1.0, 1.5, 2.0];
        let beats = OnsetDetector::default().detect(&clicks(&times, 3.0)).unwrap();

        assert_eq!(beats.len(), times.len(), "{beats:?}");
        for (found, expected) in beats.iter().zip(times) {
            assert!((found - expected).abs() < 0.1, "{found} vs {expected}");
        }
    }

    #[test]
    fn test_off_grid_onset_dropped() {
        let times = [0.5, 1.0, 1.5, 1.75, 2.0, 2.5, 3.0];
        let audio = clicks(&times, 3.6);

        let free = OnsetDetector::new(OnsetParams {
            tempo_lock: false,
            ..OnsetParams::default()
        });
        assert_eq!(free.detect(&audio).unwrap().len(), times.len());

        let beats = OnsetDetector::default().detect(&audio).unwrap();
        assert_eq!(beats.len(), times.len() - 1, "{beats:?}");
        assert!(beats.iter().all(|t| (t - 1.75).abs() > 0.1), "{beats:?}");
        assert!(beats.windows(2).all(|w| (w[1] - w[0] - 0.5).abs() < 0.1), "{beats:?}");
    }

    #[test]
    fn test_period_from_regular_envelope() {
        let mut envelope = vec![0.0f32; 200];
        for i in (5..200).step_by(20) {
            envelope[i] = 1.0;
        }
        assert_eq!(estimate_period(&envelope, 8, 60), Some(20));
        assert_eq!(estimate_period(&[0.0; 200], 8, 60), None);
        assert_eq!(estimate_period(&envelope[..10], 8, 60), None);
    }

    #[test]
    fn test_period_tolerates_frame_jitter() {
        let mut envelope = vec![0.0f32; 130];
        for i in [5, 26, 48, 69, 91, 112] {
            envelope[i] = 1.0;
        }
        let period = estimate_period(&envelope, 10, 65).unwrap();
        assert!((21..=22).contains(&period), "{period}");
    }

    #[test]
    fn test_lock_follows_grid() {
        let peaks = [5, 25, 31, 45, 52, 62, 65, 120, 140];
        let mut envelope = vec![0.0f32; 150];
        for &p in &peaks {
            envelope[p] = 1.0;
        }
        envelope[62] = 0.2;

        let kept = OnsetDetector::default().lock_to_tempo(&envelope, &peaks, 20.0);
        // 31 and 52 are too early, 65 beats the weaker 62, 120 restarts the grid
        assert_eq!(kept, vec![5, 25, 45, 65, 120, 140]);
    }

    #[test]
    fn test_output_is_monotonic_and_deterministic() {
        let audio = clicks(&[0.3, 0.45, 0.9, 1.7, 2.2], 3.0);
        let detector = OnsetDetector::default();
        let a = detector.detect(&audio).unwrap();
        let b = detector.detect(&audio).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|&t| t >= 0.0));
        assert!(a.windows(2).all(|w| w[1] - w[0] >= 0.2));
    }
}
