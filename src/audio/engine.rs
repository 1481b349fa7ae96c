use log::warn;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};
use std::thread;

use super::{AmbientSound, AudioOutput, Tone, ToneSpec};

enum AudioCommand {
    PlayTone(ToneSpec),
    StartAmbient { sound: AmbientSound, volume: f32 },
    StopAmbient,
    SetVolume(f32),
}

/// Plays cues and ambience on the default output device.
///
/// rodio's stream objects are not `Send`, so they live on a dedicated thread
/// fed through a channel. When no device can be opened every command becomes
/// a no-op.
pub struct AudioEngineHandle {
    tx: Arc<Mutex<Option<Sender<AudioCommand>>>>,
}

impl Default for AudioEngineHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngineHandle {
    pub fn new() -> Self {
        Self {
            tx: Arc::new(Mutex::new(None)),
        }
    }

    fn ensure_thread(&self) -> Result<Sender<AudioCommand>, String> {
        if let Some(tx) = self.tx.lock().map_err(|e| e.to_string())?.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<AudioCommand>();

        thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || {
                let device = match OutputStream::try_default() {
                    Ok(device) => Some(device),
                    Err(e) => {
                        warn!("No audio output available, cues disabled: {}", e);
                        None
                    }
                };
                let handle: Option<&OutputStreamHandle> = device.as_ref().map(|(_, h)| h);
                let mut ambient: Option<Sink> = None;

                while let Ok(cmd) = rx.recv() {
                    let Some(handle) = handle else {
                        continue;
                    };
                    match cmd {
                        AudioCommand::PlayTone(spec) => {
                            let source = Tone::new(spec).delay(spec.delay);
                            if let Err(e) = handle.play_raw(source) {
                                warn!("Failed to play tone: {}", e);
                            }
                        }
                        AudioCommand::StartAmbient { sound, volume } => {
                            if let Some(old) = ambient.take() {
                                old.stop();
                            }
                            let Some(source) = sound.source() else {
                                continue;
                            };
                            match Sink::try_new(handle) {
                                Ok(sink) => {
                                    sink.set_volume(volume.clamp(0.0, 1.0));
                                    sink.append(source);
                                    sink.play();
                                    ambient = Some(sink);
                                }
                                Err(e) => warn!("Failed to create ambient sink: {}", e),
                            }
                        }
                        AudioCommand::StopAmbient => {
                            if let Some(old) = ambient.take() {
                                old.stop();
                            }
                        }
                        AudioCommand::SetVolume(v) => {
                            if let Some(ref s) = ambient {
                                s.set_volume(v.clamp(0.0, 1.0));
                            }
                        }
                    }
                }
            })
            .map_err(|e| e.to_string())?;

        let tx_clone = tx.clone();
        *self.tx.lock().map_err(|e| e.to_string())? = Some(tx);
        Ok(tx_clone)
    }

    fn send(&self, cmd: AudioCommand) -> Result<(), String> {
        let tx = self.ensure_thread()?;
        tx.send(cmd).map_err(|e| e.to_string())
    }
}

impl AudioOutput for AudioEngineHandle {
    fn play_tone(&self, tone: ToneSpec) -> Result<(), String> {
        self.send(AudioCommand::PlayTone(tone))
    }

    fn start_ambient(&self, sound: AmbientSound, volume: f32) -> Result<(), String> {
        self.send(AudioCommand::StartAmbient { sound, volume })
    }

    fn stop_ambient(&self) -> Result<(), String> {
        // Never spawn the thread just to stop.
        if let Ok(Some(tx)) = self.tx.lock().map(|g| g.clone()) {
            let _ = tx.send(AudioCommand::StopAmbient);
        }
        Ok(())
    }

    fn set_volume(&self, volume: f32) -> Result<(), String> {
        self.send(AudioCommand::SetVolume(volume))
    }
}
