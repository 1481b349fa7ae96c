use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
#[cfg(feature = "playback")]
use std::time::Duration;

use super::tone::{Tone, ToneSpec, SAMPLE_RATE};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum AmbientSound {
    None,
    #[default]
    Rain,
    Ocean,
    Forest,
    Bells,
}

impl AmbientSound {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "none" => Some(AmbientSound::None),
            "rain" => Some(AmbientSound::Rain),
            "ocean" => Some(AmbientSound::Ocean),
            "forest" => Some(AmbientSound::Forest),
            "bells" => Some(AmbientSound::Bells),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AmbientSound::None => "Silent",
            AmbientSound::Rain => "Rain",
            AmbientSound::Ocean => "Ocean Waves",
            AmbientSound::Forest => "Forest",
            AmbientSound::Bells => "Tibetan Bells",
        }
    }

    /// Low-pass cutoff for the noise sounds, bell pitch for bells.
    pub fn frequency(&self) -> f32 {
        match self {
            AmbientSound::None => 0.0,
            AmbientSound::Rain => 200.0,
            AmbientSound::Ocean => 150.0,
            AmbientSound::Forest => 300.0,
            AmbientSound::Bells => 440.0,
        }
    }

    /// The looping sample stream for this sound, or `None` for silence.
    pub fn source(&self) -> Option<AmbientSource> {
        match self {
            AmbientSound::None => None,
            AmbientSound::Rain | AmbientSound::Ocean | AmbientSound::Forest => Some(
                AmbientSource::Noise(FilteredNoise::new(self.frequency())),
            ),
            AmbientSound::Bells => Some(AmbientSource::Bells(BellLoop::new(self.frequency()))),
        }
    }
}

/// White noise through a second-order low-pass filter.
pub struct FilteredNoise {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
    rng: StdRng,
}

impl FilteredNoise {
    pub fn new(cutoff: f32) -> Self {
        Self::with_rng(cutoff, StdRng::from_entropy())
    }

    pub fn with_rng(cutoff: f32, rng: StdRng) -> Self {
        // Butterworth low-pass, Q = 1/sqrt(2)
        let w0 = 2.0 * PI * cutoff / SAMPLE_RATE as f32;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * std::f32::consts::FRAC_1_SQRT_2);
        let a0 = 1.0 + alpha;

        Self {
            b0: (1.0 - cos) / 2.0 / a0,
            b1: (1.0 - cos) / a0,
            b2: (1.0 - cos) / 2.0 / a0,
            a1: -2.0 * cos / a0,
            a2: (1.0 - alpha) / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
            rng,
        }
    }
}

impl Iterator for FilteredNoise {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let input: f32 = self.rng.gen_range(-1.0..1.0);
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        Some(output)
    }
}

const BELL_GAP_MIN_SECS: f32 = 8.0;
const BELL_GAP_MAX_SECS: f32 = 12.0;

/// Bell strikes separated by a random 8-12 second gap. The first strike is
/// immediate.
pub struct BellLoop {
    frequency: f32,
    sample_rate: u32,
    ringing: Option<Tone>,
    until_strike: usize,
    rng: StdRng,
}

impl BellLoop {
    pub fn new(frequency: f32) -> Self {
        Self::with_rng(frequency, StdRng::from_entropy())
    }

    pub fn with_rng(frequency: f32, rng: StdRng) -> Self {
        Self {
            frequency,
            sample_rate: SAMPLE_RATE,
            ringing: None,
            until_strike: 0,
            rng,
        }
    }

    fn next_gap(&mut self) -> usize {
        let secs = self.rng.gen_range(BELL_GAP_MIN_SECS..BELL_GAP_MAX_SECS);
        (secs * self.sample_rate as f32) as usize
    }
}

impl Iterator for BellLoop {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.until_strike == 0 {
            self.ringing = Some(Tone::new(ToneSpec::bell(self.frequency)));
            self.until_strike = self.next_gap();
        }
        self.until_strike -= 1;

        let sample = match self.ringing.as_mut().and_then(Iterator::next) {
            Some(sample) => sample,
            None => {
                self.ringing = None;
                0.0
            }
        };
        Some(sample)
    }
}

/// Either ambience kind as one infinite mono stream.
pub enum AmbientSource {
    Noise(FilteredNoise),
    Bells(BellLoop),
}

impl Iterator for AmbientSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            AmbientSource::Noise(noise) => noise.next(),
            AmbientSource::Bells(bells) => bells.next(),
        }
    }
}

#[cfg(feature = "playback")]
impl rodio::Source for AmbientSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: usize = SAMPLE_RATE as usize;

    #[test]
    fn keys_round_trip_to_sounds() {
        for key in ["none", "rain", "ocean", "forest", "bells"] {
            assert!(AmbientSound::from_key(key).is_some(), "{key}");
        }
        assert_eq!(AmbientSound::from_key("whale"), None);
        assert!(AmbientSound::None.source().is_none());
    }

    #[test]
    fn filtered_noise_stays_bounded() {
        let noise = FilteredNoise::with_rng(200.0, StdRng::seed_from_u64(7));
        let samples: Vec<f32> = noise.take(SECOND * 2).collect();
        assert!(samples.iter().all(|s| s.is_finite() && s.abs() < 2.0));
        assert!(samples.iter().any(|s| *s != 0.0));
    }

    #[test]
    fn low_pass_removes_most_energy() {
        let energy = |cutoff: f32| -> f32 {
            FilteredNoise::with_rng(cutoff, StdRng::seed_from_u64(11))
                .take(SECOND)
                .map(|s| s * s)
                .sum()
        };
        assert!(energy(150.0) < energy(300.0));
        assert!(energy(300.0) < energy(5000.0));
    }

    #[test]
    fn bells_ring_then_fall_silent_until_next_strike() {
        let samples: Vec<f32> = BellLoop::with_rng(440.0, StdRng::seed_from_u64(3))
            .take(SECOND * 8)
            .collect();
        let ringing = samples[..SECOND * 2].iter().any(|s| s.abs() > 0.1);
        let quiet = samples[SECOND * 3 + 10..].iter().all(|s| *s == 0.0);
        assert!(ringing);
        assert!(quiet);
    }

    #[test]
    fn bells_strike_again_within_twelve_seconds() {
        let samples: Vec<f32> = BellLoop::with_rng(440.0, StdRng::seed_from_u64(5))
            .skip(SECOND * 8)
            .take(SECOND * 5)
            .collect();
        assert!(samples.iter().any(|s| s.abs() > 0.1));
    }
}
