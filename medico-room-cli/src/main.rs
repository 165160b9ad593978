mod input;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use medico_room_client::{
    PeerConnectionState, RoomConfig, RoomCoordinator, RoomDeps, RoomError, RoomEvent,
    RoomHandle, RtcPeerFactory, SyntheticDevices, WsConnector,
};
use medico_room_core::{ChatKind, RoomAddress};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::input::{HELP, Input};

#[derive(Parser)]
#[command(name = "medico-room")]
#[command(about = "Join a consultation room from the terminal")]
struct Cli {
    /// Six-digit join code of the room.
    join_code: String,

    /// Room password; prompted for when omitted.
    #[arg(long, env = "MEDICO_ROOM_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Signaling server base url.
    #[arg(long, env = "MEDICO_SIGNALING_URL")]
    server: Option<String>,

    #[arg(short, long)]
    name: Option<String>,

    #[arg(long)]
    no_audio: bool,

    #[arg(long)]
    no_video: bool,

    /// Where /record puts its files.
    #[arg(long, env = "MEDICO_RECORDING_DIR")]
    recordings: Option<PathBuf>,

    /// JSON file with room settings; flags override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let password = match cli.password {
        Some(password) => password,
        None => dialoguer::Password::new()
            .with_prompt("Room password")
            .interact()?,
    };
    let address = RoomAddress::parse(&cli.join_code, &password)?;

    let deps = RoomDeps {
        connector: Arc::new(WsConnector),
        peers: Arc::new(RtcPeerFactory::new()?),
        devices: Arc::new(SyntheticDevices::new().with_silence()),
    };

    println!(
        "{}",
        format!("Joining room {} ...", address.join_code()).green().bold()
    );
    let (handle, mut events) = RoomCoordinator::join(address, config, deps).await?;
    println!("{}", "Type /help for commands.".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let left = matches!(event, RoomEvent::Left);
                print_event(event);
                if left {
                    break;
                }
            }

            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => run_input(&handle, &line).await?,
                    None => {
                        stdin_open = false;
                        leave_room(&handle).await?;
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, leaving room");
                leave_room(&handle).await?;
            }
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<RoomConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Invalid room settings in {}", path.display()))?
        }
        None => RoomConfig::default(),
    };

    if let Some(server) = &cli.server {
        config.signaling_url = server.clone();
    }
    if let Some(name) = &cli.name {
        config.display_name = Some(name.clone());
    }
    if cli.no_audio {
        config.audio_enabled = false;
    }
    if cli.no_video {
        config.video_enabled = false;
    }
    if let Some(dir) = &cli.recordings {
        config.recording_dir = dir.clone();
    }
    Ok(config)
}

async fn run_input(handle: &RoomHandle, line: &str) -> Result<()> {
    let input = match input::parse(line) {
        Ok(Some(input)) => input,
        Ok(None) => return Ok(()),
        Err(msg) => {
            println!("{}", msg.yellow());
            return Ok(());
        }
    };

    let media = match input {
        Input::Chat(text) => {
            handle.send_chat(text).await?;
            return Ok(());
        }
        Input::Audio(on) => handle.set_audio_enabled(on).await,
        Input::Video(on) => handle.set_video_enabled(on).await,
        Input::Share(true) => handle.start_screen_share().await,
        Input::Share(false) => handle.stop_screen_share().await,
        Input::Device { kind, device_id } => handle.set_device(kind, device_id).await,
        Input::Devices => {
            for device in handle.devices().await? {
                println!("  {:<6} {:<20} {}", device.kind, device.device_id, device.label);
            }
            return Ok(());
        }
        Input::Who => {
            let snapshot = handle.snapshot().await?;
            println!("  {} (you)", snapshot.local_id.as_str().bold());
            for p in snapshot.participants {
                println!("  {} {} {:?}", p.id.as_str().bold(), p.name, p.connection);
            }
            return Ok(());
        }
        Input::Record => {
            toggle_recording(handle).await?;
            return Ok(());
        }
        Input::Help => {
            println!("{}", HELP.dimmed());
            return Ok(());
        }
        Input::Leave => {
            leave_room(handle).await?;
            return Ok(());
        }
    };

    // Media failures are reported, the room stays up.
    if let Err(e) = media {
        error!("{}", e);
        println!("{}", e.to_string().red());
    }
    Ok(())
}

async fn toggle_recording(handle: &RoomHandle) -> Result<()> {
    let result = if handle.snapshot().await?.recording {
        handle.stop_recording().await.map(|recording| {
            format!(
                "Saved {} track(s) to {}",
                recording.tracks.len(),
                recording.dir.display()
            )
        })
    } else {
        handle
            .start_recording()
            .await
            .map(|dir| format!("Recording to {}", dir.display()))
    };

    match result {
        Ok(line) => println!("{}", line.green()),
        Err(RoomError::Closed) => return Err(RoomError::Closed.into()),
        Err(e) => {
            error!("{}", e);
            println!("{}", e.to_string().red());
        }
    }
    Ok(())
}

async fn leave_room(handle: &RoomHandle) -> Result<()> {
    already_left_is_ok(handle.leave().await)
}

/// A room that is already gone counts as left.
fn already_left_is_ok(result: Result<(), RoomError>) -> Result<()> {
    match result {
        Err(RoomError::Closed) => Ok(()),
        other => Ok(other?),
    }
}

fn on_off(on: bool) -> ColoredString {
    if on { "on".green() } else { "off".red() }
}

fn print_event(event: RoomEvent) {
    match event {
        RoomEvent::SignalingConnected(true) => {
            println!("{}", "● connected to signaling".green());
        }
        RoomEvent::SignalingConnected(false) => {
            println!("{}", "○ signaling lost, reconnecting".yellow());
        }
        RoomEvent::ParticipantJoined(p) => {
            println!("{} {} ({})", "→".cyan(), p.name.cyan().bold(), p.id.as_str());
        }
        RoomEvent::ParticipantLeft { name, .. } => {
            println!("{} {}", "←".cyan(), name.cyan());
        }
        RoomEvent::ParticipantMediaChanged { id, media } => {
            println!(
                "  {} mic {} camera {}{}",
                id.as_str().dimmed(),
                on_off(media.audio_enabled),
                on_off(media.video_enabled),
                if media.screen_sharing { " (sharing screen)" } else { "" }
            );
        }
        RoomEvent::PeerConnectionChanged { id, state } => {
            let label = format!("{state:?}");
            let label = match state {
                PeerConnectionState::Connected => label.green(),
                PeerConnectionState::Failed => label.red(),
                _ => label.normal(),
            };
            println!("  {} link {}", id.as_str().dimmed(), label);
        }
        RoomEvent::RemoteTrack { id, track } => {
            println!("  {} sends {}", id.as_str().dimmed(), track.kind);
        }
        RoomEvent::LocalMediaChanged(media) => {
            println!(
                "  you: mic {} camera {}{}",
                on_off(media.audio_enabled),
                on_off(media.video_enabled),
                if media.screen_sharing { " (sharing screen)" } else { "" }
            );
        }
        RoomEvent::MediaError(e) => println!("{} {}", "media:".red().bold(), e),
        RoomEvent::Chat(m) => {
            let time = m.timestamp.format("%H:%M").to_string().dimmed();
            match m.kind {
                ChatKind::System => println!("{} {}", time, m.content.italic()),
                ChatKind::User => println!("{} {}: {}", time, m.sender.bold(), m.content),
            }
        }
        RoomEvent::Left => println!("{}", "Left the room.".green().bold()),
    }
}
