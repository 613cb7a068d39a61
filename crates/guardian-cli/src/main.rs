use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use guardian_core::{Frame, Mode, Responder};
use guardian_remote::GeminiChat;
use std::io::{BufRead, Read};
use std::path::PathBuf;
use tokio::sync::mpsc;

mod config;
mod session;

use config::Config;
use session::{Session, Step};

#[derive(Parser)]
#[command(name = "guardian", about = "Guardian X situational-awareness assistant", version)]
struct Cli {
    /// TOML config file (default: $GUARDIAN_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print expression labels for every face in a frame
    Classify {
        /// Frame JSON file, or "-" for stdin
        frame: String,
    },
    /// Answer one question about a frame
    Ask {
        /// Frame JSON file, or "-" for stdin (default: no detections)
        #[arg(short, long)]
        frame: Option<String>,
        /// Mission mode: medical, defense or policing
        #[arg(short, long)]
        mode: Option<Mode>,
        /// Never call the remote model
        #[arg(long)]
        offline: bool,
        /// The question
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Read frames and questions from stdin, one per line
    Session {
        /// Starting mission mode
        #[arg(short, long)]
        mode: Option<Mode>,
        /// Never call the remote model
        #[arg(long)]
        offline: bool,
    },
    /// Show effective configuration
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Classify { frame } => {
            let frame = read_frame(&frame)?;
            let scene = frame.scene();
            if scene.faces.is_empty() {
                println!("no faces in frame");
            }
            for (i, face) in scene.faces.iter().enumerate() {
                println!("face {}: {}", i + 1, face.describe());
            }
        }
        Commands::Ask {
            frame,
            mode,
            offline,
            text,
        } => {
            let scene = match frame {
                Some(path) => read_frame(&path)?.scene(),
                None => Default::default(),
            };
            let responder = build_responder(&config, offline);
            let mode = mode.unwrap_or(config.mode);
            println!("{}", responder.respond(&text.join(" "), &scene, mode).await);
        }
        Commands::Session { mode, offline } => {
            let responder = build_responder(&config, offline);
            run_session(Session::new(responder, mode.unwrap_or(config.mode))).await?;
        }
        Commands::Status => {
            println!("version:      {}", env!("CARGO_PKG_VERSION"));
            println!("mode:         {}", config.mode);
            println!("model:        {}", config.model);
            println!("api base:     {}", config.api_base);
            println!("chat timeout: {}s", config.chat_timeout.as_secs());
            let delegation = match config.chat_config().map(|c| GeminiChat::new(&c)) {
                None => "off (no credential)".to_string(),
                Some(Ok(_)) => "on".to_string(),
                Some(Err(e)) => format!("off ({e})"),
            };
            println!("delegation:   {delegation}");
        }
    }

    Ok(())
}

/// Remote delegation when a valid credential is configured, local otherwise.
fn build_responder(config: &Config, offline: bool) -> Responder<GeminiChat> {
    let chat = if offline {
        tracing::info!("offline: remote delegation disabled");
        None
    } else {
        match config.chat_config().map(|c| GeminiChat::new(&c)) {
            None => None,
            Some(Ok(chat)) => Some(chat),
            Some(Err(err)) => {
                tracing::warn!(error = %err, "remote chat unavailable; using local responses");
                eprintln!("guardian: {err}; answering locally");
                None
            }
        }
    };
    Responder::new(chat).with_timeout(config.chat_timeout)
}

fn read_frame(source: &str) -> Result<Frame> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading frame from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading frame {source}"))?
    };
    serde_json::from_str(&text).with_context(|| format!("parsing frame {source}"))
}

/// Forward stdin lines from a dedicated thread. A blocking read there never
/// holds up shutdown; the thread ends with the process.
fn spawn_stdin_reader() -> Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::Builder::new()
        .name("guardian-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        tracing::warn!(error = %err, "stdin read failed");
                        break;
                    }
                };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        })
        .context("spawning stdin reader")?;
    Ok(rx)
}

async fn run_session(mut session: Session<GeminiChat>) -> Result<()> {
    tracing::info!(mode = %session.mode(), "session started");
    let mut lines = spawn_stdin_reader()?;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let line = tokio::select! {
            line = lines.recv() => line,
            _ = &mut ctrl_c => {
                tracing::info!("interrupted");
                None
            }
        };
        let Some(line) = line else { break };

        match session.handle_line(&line).await {
            Step::Reply(reply) => println!("{reply}"),
            Step::Note(note) => eprintln!("{note}"),
            Step::Quit => break,
            Step::Idle => {}
        }
    }

    tracing::info!(frames_objects = session.scene().objects.len(), "session ended");
    Ok(())
}
