use std::f32::consts::PI;
use std::time::Duration;

pub const SAMPLE_RATE: u32 = 44100;

/// Level an exponential decay ends at.
const DECAY_FLOOR: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Envelope {
    /// Linear rise to `peak` over `attack`, then a linear fall to silence at
    /// the end of the tone.
    Linear { peak: f32, attack: Duration },
    /// Linear rise to `peak` over `attack`, then an exponential decay that
    /// reaches the floor at the end of the tone.
    Exponential { peak: f32, attack: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency: f32,
    pub duration: Duration,
    pub envelope: Envelope,
    /// Offset from the moment the tone is requested.
    pub delay: Duration,
}

impl ToneSpec {
    /// Short blip marking a phase change.
    pub fn cue(frequency: f32) -> Self {
        Self {
            frequency,
            duration: Duration::from_millis(200),
            envelope: Envelope::Linear {
                peak: 0.1,
                attack: Duration::from_millis(10),
            },
            delay: Duration::ZERO,
        }
    }

    /// One note of the end-of-session chime.
    pub fn chime(frequency: f32, delay: Duration) -> Self {
        Self {
            frequency,
            duration: Duration::from_secs(2),
            envelope: Envelope::Exponential {
                peak: 0.2,
                attack: Duration::from_millis(100),
            },
            delay,
        }
    }

    /// A ringing bell strike used by the bells ambience.
    pub fn bell(frequency: f32) -> Self {
        Self {
            frequency,
            duration: Duration::from_secs(3),
            envelope: Envelope::Exponential {
                peak: 0.3,
                attack: Duration::from_millis(100),
            },
            delay: Duration::ZERO,
        }
    }

    pub fn gain_at(&self, t: f32) -> f32 {
        let total = self.duration.as_secs_f32();
        if t < 0.0 || t >= total {
            return 0.0;
        }

        let (peak, attack) = match self.envelope {
            Envelope::Linear { peak, attack } | Envelope::Exponential { peak, attack } => {
                (peak, attack.as_secs_f32().min(total))
            }
        };
        if t < attack {
            return peak * t / attack;
        }

        let tail = (total - attack).max(f32::EPSILON);
        let progress = (t - attack) / tail;
        match self.envelope {
            Envelope::Linear { .. } => peak * (1.0 - progress),
            Envelope::Exponential { .. } if peak > DECAY_FLOOR => {
                peak * (DECAY_FLOOR / peak).powf(progress)
            }
            Envelope::Exponential { .. } => peak * (1.0 - progress),
        }
    }
}

/// Sine oscillator shaped by a [`ToneSpec`] envelope. Finite.
pub struct Tone {
    spec: ToneSpec,
    sample_rate: u32,
    num_sample: usize,
    total_samples: usize,
}

impl Tone {
    pub fn new(spec: ToneSpec) -> Self {
        let total_samples = (spec.duration.as_secs_f64() * f64::from(SAMPLE_RATE)).round() as usize;
        Self {
            spec,
            sample_rate: SAMPLE_RATE,
            num_sample: 0,
            total_samples,
        }
    }
}

impl Iterator for Tone {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples {
            return None;
        }

        let t = self.num_sample as f32 / self.sample_rate as f32;
        self.num_sample += 1;

        Some((2.0 * PI * self.spec.frequency * t).sin() * self.spec.gain_at(t))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total_samples - self.num_sample;
        (left, Some(left))
    }
}

#[cfg(feature = "playback")]
impl rodio::Source for Tone {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.total_samples - self.num_sample)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(self.spec.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cue_lasts_its_duration() {
        let samples: Vec<f32> = Tone::new(ToneSpec::cue(440.0)).collect();
        assert_eq!(samples.len(), 8820);
        assert_eq!(samples[0], 0.0);
        assert!(samples.iter().all(|s| s.abs() <= 0.1 + 1e-6));
    }

    #[test]
    fn linear_envelope_peaks_after_attack_and_fades_out() {
        let spec = ToneSpec::cue(523.0);
        assert!((spec.gain_at(0.01) - 0.1).abs() < 1e-4);
        assert!((spec.gain_at(0.005) - 0.05).abs() < 1e-4);
        assert!(spec.gain_at(0.199) < 0.001);
        assert_eq!(spec.gain_at(0.2), 0.0);
    }

    #[test]
    fn exponential_envelope_decays_to_floor() {
        let spec = ToneSpec::chime(659.0, Duration::ZERO);
        assert!((spec.gain_at(0.1) - 0.2).abs() < 1e-4);
        let late = spec.gain_at(1.999);
        assert!(late > 0.0 && late < 0.0011);
        assert!(spec.gain_at(1.0) < spec.gain_at(0.5));
    }

    #[test]
    fn bell_is_quieter_than_unity() {
        let peak = Tone::new(ToneSpec::bell(440.0))
            .map(f32::abs)
            .fold(0.0f32, f32::max);
        assert!(peak > 0.25 && peak <= 0.3);
    }
}
