pub mod ambient;
pub mod cues;
#[cfg(feature = "playback")]
pub mod engine;
pub mod tone;

pub use ambient::{AmbientSound, AmbientSource};
pub use cues::{completion_chime, CueTable};
#[cfg(feature = "playback")]
pub use engine::AudioEngineHandle;
pub use tone::{Tone, ToneSpec};

use log::{debug, warn};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::timer::Phase;

/// Sound capability of the host. Implementations must be cheap to call from
/// the session clock and must not block it.
pub trait AudioOutput: Send + Sync {
    fn play_tone(&self, tone: ToneSpec) -> Result<(), String>;
    fn start_ambient(&self, sound: AmbientSound, volume: f32) -> Result<(), String>;
    fn stop_ambient(&self) -> Result<(), String>;
    fn set_volume(&self, volume: f32) -> Result<(), String>;
}

/// A host with no audio device.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl AudioOutput for NullOutput {
    fn play_tone(&self, _tone: ToneSpec) -> Result<(), String> {
        Ok(())
    }

    fn start_ambient(&self, _sound: AmbientSound, _volume: f32) -> Result<(), String> {
        Ok(())
    }

    fn stop_ambient(&self) -> Result<(), String> {
        Ok(())
    }

    fn set_volume(&self, _volume: f32) -> Result<(), String> {
        Ok(())
    }
}

/// The best output this build supports.
pub fn default_output() -> Arc<dyn AudioOutput> {
    #[cfg(feature = "playback")]
    {
        Arc::new(AudioEngineHandle::new())
    }

    #[cfg(not(feature = "playback"))]
    {
        Arc::new(NullOutput)
    }
}

/// A running ambient loop. Dropping it stops the sound.
pub struct AmbientLoop {
    output: Arc<dyn AudioOutput>,
    sound: AmbientSound,
}

impl AmbientLoop {
    pub fn sound(&self) -> AmbientSound {
        self.sound
    }
}

impl Drop for AmbientLoop {
    fn drop(&mut self) {
        if let Err(e) = self.output.stop_ambient() {
            warn!("Failed to stop ambient {:?}: {}", self.sound, e);
        }
    }
}

/// Fire-and-forget cue playback gated by a mute flag. Output errors are
/// logged and swallowed.
pub struct CueEmitter {
    output: Arc<dyn AudioOutput>,
    table: CueTable,
    muted: AtomicBool,
}

impl CueEmitter {
    pub fn new(output: Arc<dyn AudioOutput>, table: CueTable, muted: bool) -> Self {
        Self {
            output,
            table,
            muted: AtomicBool::new(muted),
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    /// Returns the previous value.
    pub fn set_muted(&self, muted: bool) -> bool {
        self.muted.swap(muted, Ordering::SeqCst)
    }

    pub fn phase_cue(&self, phase: Phase) {
        self.play(self.table.cue(phase));
    }

    pub fn completion_chime(&self) {
        for tone in completion_chime() {
            self.play(tone);
        }
    }

    pub fn start_ambient(&self, sound: AmbientSound, volume: f32) -> Option<AmbientLoop> {
        if self.is_muted() || sound == AmbientSound::None {
            return None;
        }
        match self.output.start_ambient(sound, volume) {
            Ok(()) => {
                debug!("Ambient {:?} started at volume {}", sound, volume);
                Some(AmbientLoop {
                    output: Arc::clone(&self.output),
                    sound,
                })
            }
            Err(e) => {
                warn!("Failed to start ambient {:?}: {}", sound, e);
                None
            }
        }
    }

    pub fn set_volume(&self, volume: f32) {
        if let Err(e) = self.output.set_volume(volume) {
            warn!("Failed to set volume: {}", e);
        }
    }

    fn play(&self, tone: ToneSpec) {
        if self.is_muted() {
            return;
        }
        if let Err(e) = self.output.play_tone(tone) {
            warn!("Failed to play {} Hz cue: {}", tone.frequency, e);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{AudioCall, RecordingOutput};
    use super::*;

    fn emitter(output: &Arc<RecordingOutput>) -> CueEmitter {
        CueEmitter::new(output.clone(), CueTable::default(), false)
    }

    #[test]
    fn cues_follow_the_table() {
        let output = Arc::new(RecordingOutput::default());
        let cues = emitter(&output);
        cues.phase_cue(Phase::Inhale);
        cues.phase_cue(Phase::Exhale);
        assert_eq!(output.tones(), vec![523.0, 330.0]);
    }

    #[test]
    fn muted_emitter_is_silent() {
        let output = Arc::new(RecordingOutput::default());
        let cues = emitter(&output);
        cues.set_muted(true);
        cues.phase_cue(Phase::Hold);
        cues.completion_chime();
        assert!(cues.start_ambient(AmbientSound::Rain, 0.3).is_none());
        assert!(output.calls().is_empty());
    }

    #[test]
    fn dropping_the_loop_stops_ambient() {
        let output = Arc::new(RecordingOutput::default());
        let cues = emitter(&output);
        let ambient = cues.start_ambient(AmbientSound::Ocean, 0.3).unwrap();
        assert_eq!(ambient.sound(), AmbientSound::Ocean);
        drop(ambient);
        assert_eq!(
            output.calls(),
            vec![
                AudioCall::StartAmbient(AmbientSound::Ocean),
                AudioCall::StopAmbient
            ]
        );
    }

    #[test]
    fn silent_ambience_never_touches_the_device() {
        let output = Arc::new(RecordingOutput::default());
        assert!(emitter(&output).start_ambient(AmbientSound::None, 0.3).is_none());
        assert!(output.calls().is_empty());
    }

    #[test]
    fn broken_output_degrades_to_nothing() {
        let output = Arc::new(RecordingOutput::broken());
        let cues = emitter(&output);
        cues.phase_cue(Phase::Inhale);
        cues.completion_chime();
        assert!(cues.start_ambient(AmbientSound::Bells, 0.3).is_none());
        assert_eq!(output.tones().len(), 4);
    }

    #[test]
    fn null_output_accepts_everything() {
        let cues = CueEmitter::new(Arc::new(NullOutput), CueTable::default(), false);
        cues.phase_cue(Phase::Relax);
        assert!(cues.start_ambient(AmbientSound::Forest, 0.5).is_some());
    }
}
