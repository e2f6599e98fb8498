use anyhow::Result;
use sahayak::backend::HttpChatBackend;
use sahayak::capture::{DisabledMicrophone, MicrophoneDevice};
use sahayak::config::SahayakConfig;
use sahayak::controller::{ChatController, ControllerEvent};
use sahayak::lang::Language;
use sahayak::playback::{NullRemoteAudio, NullSynthesizer, RemoteAudioPlayer, SpeechSynthesizer};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sahayak=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config_from_env();
    config.validate().map_err(anyhow::Error::msg)?;
    info!(
        "Starting Sahayak assistant (backend: {}, language: {})",
        config.base_url,
        config.language.code()
    );

    let backend = Arc::new(HttpChatBackend::new(&config)?);
    let (controller, handle, mut events) = ChatController::new(
        &config,
        backend,
        microphone(&config),
        remote_player(&config),
        synthesizer(&config),
    );
    tokio::spawn(controller.run());

    // Print session activity on its own task
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ControllerEvent::MessageAppended(msg) => {
                    let who = if msg.is_assistant() { "assistant" } else { "you" };
                    println!("[{}] {}", who, msg.text);
                }
                ControllerEvent::PermissionDenied(notice) => println!("[mic] {}", notice),
                ControllerEvent::RecordingStarted => println!("[mic] recording..."),
                ControllerEvent::RecordingStopped => println!("[mic] sending clip"),
                ControllerEvent::Shutdown => break,
                _ => {}
            }
        }
    });

    handle.open().await?;

    println!("Type a message, or: /rec  /aloud on|off  /reset  /quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/rec" => handle.toggle_recording().await?,
            "/reset" => handle.open().await?,
            "/aloud on" => handle.set_read_aloud(true).await?,
            "/aloud off" => handle.set_read_aloud(false).await?,
            text => {
                handle.set_input(text).await?;
                handle.submit_text().await?;
            }
        }
    }

    handle.shutdown().await?;
    Ok(())
}

fn config_from_env() -> SahayakConfig {
    let mut config = match std::env::var("SAHAYAK_BACKEND_URL") {
        Ok(url) => SahayakConfig::new(url),
        Err(_) => SahayakConfig::default(),
    };
    if let Ok(code) = std::env::var("SAHAYAK_LANG") {
        config.language = Language::from_code(&code);
    }
    config
}

fn microphone(config: &SahayakConfig) -> Arc<dyn MicrophoneDevice> {
    if config.enable_audio_input {
        #[cfg(feature = "audio-io")]
        return Arc::new(sahayak::capture::CpalMicrophone::new());
        #[cfg(not(feature = "audio-io"))]
        warn!("Built without the audio-io feature, microphone disabled");
    }
    Arc::new(DisabledMicrophone)
}

fn remote_player(config: &SahayakConfig) -> Arc<dyn RemoteAudioPlayer> {
    if config.enable_audio_output {
        #[cfg(feature = "audio-io")]
        return Arc::new(sahayak::playback::RodioPlayer::new());
        #[cfg(not(feature = "audio-io"))]
        warn!("Built without the audio-io feature, remote audio disabled");
    }
    Arc::new(NullRemoteAudio)
}

fn synthesizer(config: &SahayakConfig) -> Arc<dyn SpeechSynthesizer> {
    if config.enable_audio_output {
        #[cfg(feature = "system-tts")]
        match sahayak::playback::SystemTtsSynthesizer::new() {
            Ok(synth) => return Arc::new(synth),
            Err(e) => warn!("Speech engine unavailable: {}", e),
        }
        #[cfg(not(feature = "system-tts"))]
        warn!("Built without the system-tts feature, speech synthesis disabled");
    }
    Arc::new(NullSynthesizer)
}
