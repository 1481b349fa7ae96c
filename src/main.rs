use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use tokio::sync::broadcast::error::RecvError;

use mindwell::{
    audio::{self, AmbientSound},
    models::ExerciseKind,
    settings::SettingsStore,
    timer::{pattern::relaxation_instruction, Phase, SessionEvent, SessionSelection},
    utils::logging,
    AppState,
};

#[derive(Parser)]
#[command(name = "mindwell", version, about = "Guided wellness sessions")]
struct Cli {
    /// Settings file
    #[arg(long, env = "MINDWELL_CONFIG", default_value = "mindwell.json")]
    config: PathBuf,

    /// Silence cues and ambient sound
    #[arg(long)]
    mute: bool,

    /// Reset the session after this many seconds
    #[arg(long)]
    stop_after: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Paced breathing
    Breathe {
        /// 4-4-4, 4-7-8, 6-2-6 or 4-4-4-4
        #[arg(long)]
        pattern: Option<String>,
    },
    /// Timed meditation
    Meditate {
        #[arg(long)]
        minutes: Option<u32>,
        /// none, rain, ocean, forest or bells
        #[arg(long)]
        ambient: Option<String>,
    },
    /// Progressive muscle relaxation
    Relax,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let store = SettingsStore::new(cli.config.clone())?;
    let app = AppState::new(store, audio::default_output())?;
    if cli.mute {
        app.timer.set_muted(true).await;
    }
    let selection = selection_for(&app, &cli.command)?;

    let mut events = app.timer.subscribe();
    app.timer.start(selection).await?;

    let deadline = async {
        match cli.stop_after {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(SessionEvent::Completed { elapsed_secs, .. }) => {
                    println!("Session complete after {}", clock(elapsed_secs));
                    break;
                }
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!("Skipped {} timer events", skipped),
                Err(RecvError::Closed) => break,
            },
            _ = &mut deadline => {
                stop(&app).await?;
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                stop(&app).await?;
                break;
            }
        }
    }

    // Give an in-flight report a moment to land before the runtime goes away.
    tokio::time::sleep(Duration::from_millis(500)).await;
    Ok(())
}

fn selection_for(app: &AppState, command: &Command) -> Result<SessionSelection> {
    let selection = match command {
        Command::Breathe { pattern } => {
            let mut selection = app.selection(ExerciseKind::Breathing);
            if let Some(key) = pattern {
                selection.pattern_key = Some(key.clone());
            }
            selection
        }
        Command::Meditate { minutes, ambient } => {
            let mut selection = app.selection(ExerciseKind::Meditation);
            if let Some(minutes) = minutes {
                selection.minutes = Some(*minutes);
            }
            if let Some(key) = ambient {
                match AmbientSound::from_key(key) {
                    Some(sound) => selection.ambient = sound,
                    None => bail!("unknown ambient sound '{key}'"),
                }
            }
            selection
        }
        Command::Relax => app.selection(ExerciseKind::Relaxation),
    };
    Ok(selection)
}

async fn stop(app: &AppState) -> Result<()> {
    match app.timer.reset().await? {
        Some(record) => info!(
            "Recorded {} min of {}",
            record.duration,
            record.exercise_type.as_str()
        ),
        None => info!("Session too short to record"),
    }
    Ok(())
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::Started { kind, .. } => println!("Starting {}", kind.as_str()),
        SessionEvent::PhaseChanged { index, phase, seconds } => match phase {
            Phase::Tense | Phase::Relax => {
                if let Some((part, text)) = relaxation_instruction(*index) {
                    println!("[{}] {} ({}s)", part, text, seconds);
                }
            }
            _ => println!("{} ({}s)", phase.instruction(), seconds),
        },
        SessionEvent::Tick { remaining_secs, .. } => {
            if remaining_secs % 60 == 0 && *remaining_secs > 0 {
                println!("{} left", clock(*remaining_secs));
            }
        }
        SessionEvent::ReportFailed { message, unauthorized, .. } => {
            if *unauthorized {
                println!("Not signed in, session was not saved");
            } else {
                println!("Could not save session: {}", message);
            }
        }
        SessionEvent::Paused
        | SessionEvent::Resumed
        | SessionEvent::Completed { .. }
        | SessionEvent::Reset { .. } => {}
    }
}

fn clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
