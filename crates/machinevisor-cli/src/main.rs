//! MachineVisor host binary — entry point.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use machinevisor::endpoint::{effective_base_url, FALLBACK_BASE_URL};
use machinevisor::voice::VOICE_TEST_PHRASE;
use machinevisor::{interpret, PreferenceStore, SpeechOutput, Uploader, VisorConfig};
use machinevisor_cli::devices::ConsoleSpeech;
use machinevisor_cli::{resolve_prefs_path, run_pipeline, RunOptions};

#[derive(Parser)]
#[command(
    name = "machinevisor",
    about = "MachineVisor — capture, annotate and upload frames for remote analysis",
    version
)]
struct Cli {
    /// Path to the preferences file.
    #[arg(long, global = true)]
    prefs: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the capture pipeline.
    ///
    /// Stdin lines are treated as recognized speech; `:server <url>`,
    /// `:voice-test` and `:quit` are commands.
    Run {
        /// Directory of JPEG files used as camera frames.
        #[arg(long)]
        images: Option<PathBuf>,

        /// JSON-lines motion sensor recording.
        #[arg(long)]
        sensors: Option<PathBuf>,

        /// Delay between replayed sensor records, in milliseconds.
        #[arg(long, default_value_t = 100)]
        sensor_rate_ms: u64,

        /// Replay the sensor recording in a loop.
        #[arg(long)]
        loop_sensors: bool,

        /// Stop after this many capture ticks.
        #[arg(long)]
        ticks: Option<u64>,

        /// Capture interval in milliseconds (default 2000).
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Ask the server for detailed analysis.
        #[arg(long)]
        details: bool,

        /// Write the latest frame to this file.
        #[arg(long)]
        frame_out: Option<PathBuf>,

        /// Do not read utterances from stdin.
        #[arg(long)]
        no_stdin: bool,

        /// Print the run summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show or change the analysis server address.
    Server {
        #[command(subcommand)]
        action: ServerAction,
    },

    /// Speech output settings.
    Tts {
        #[command(subcommand)]
        action: TtsAction,
    },

    /// Check preferences, server address and server health.
    Doctor,

    /// Interpret a saved upload response and print the result.
    Interpret {
        /// JSON file holding a full upload response or its `analysis` object.
        file: PathBuf,

        /// Print the interpreted result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   machinevisor completions bash > ~/.local/share/bash-completion/completions/machinevisor
    ///   machinevisor completions zsh > ~/.zfunc/_machinevisor
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ServerAction {
    /// Save a server address (e.g. `192.168.1.5:8000`).
    Set { url: String },
    /// Print the saved and effective server address.
    Show,
}

#[derive(Subcommand)]
enum TtsAction {
    /// Save the speech rate (clamped to 0.2–1.5).
    SetSpeed { rate: f32 },
    /// Save the voice name; omit to use the engine default.
    SetVoice { voice: Option<String> },
    /// Speak the test phrase at the saved rate.
    Test,
    /// Print the saved speech settings.
    Show,
}

fn init_logging(cli: &Cli) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match cli.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn open_prefs(cli: &Cli) -> anyhow::Result<Arc<PreferenceStore>> {
    let path = resolve_prefs_path(cli.prefs.as_deref());
    let store = PreferenceStore::open(&path)
        .with_context(|| format!("Failed to open preferences at {}", path.display()))?;
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    match &cli.command {
        Commands::Run {
            images,
            sensors,
            sensor_rate_ms,
            loop_sensors,
            ticks,
            interval_ms,
            details,
            frame_out,
            no_stdin,
            json,
        } => {
            let prefs = open_prefs(&cli)?;
            let options = RunOptions {
                images: images.clone(),
                sensors: sensors.clone(),
                sensor_period: Duration::from_millis((*sensor_rate_ms).max(1)),
                loop_sensors: *loop_sensors,
                ticks: *ticks,
                interval: interval_ms.map(|ms| Duration::from_millis(ms.max(1))),
                details: *details,
                frame_out: frame_out.clone(),
                stdin: !*no_stdin,
            };
            let summary = run_pipeline(options, prefs).await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "Ticks: {}  Uploads: {} ok / {} failed  Placeholders: {}  Stale: {}",
                    summary.ticks,
                    summary.uploads_succeeded,
                    summary.uploads_failed,
                    summary.placeholders,
                    summary.stale_dropped
                );
            }
        }

        Commands::Server { action } => {
            let prefs = open_prefs(&cli)?;
            match action {
                ServerAction::Set { url } => match prefs.save_server_base_url(url) {
                    Ok(saved) => println!("Сервер сохранён: {saved}"),
                    Err(machinevisor::VisorError::InvalidEndpoint(_)) => {
                        eprintln!("Некорректный адрес сервера");
                        std::process::exit(1);
                    }
                    Err(e) => return Err(e.into()),
                },
                ServerAction::Show => {
                    let saved = prefs.server_base_url();
                    println!("Saved:     {}", saved.as_deref().unwrap_or("(none)"));
                    println!("Fallback:  {FALLBACK_BASE_URL}");
                    println!("Effective: {}", effective_base_url(saved.as_deref()));
                }
            }
        }

        Commands::Tts { action } => {
            let prefs = open_prefs(&cli)?;
            match action {
                TtsAction::SetSpeed { rate } => {
                    let saved = prefs.set_tts_speed(*rate)?;
                    println!("Speech rate: {saved:.2}");
                }
                TtsAction::SetVoice { voice } => {
                    prefs.set_tts_voice(voice.clone())?;
                    println!("Voice: {}", voice.as_deref().unwrap_or("(default)"));
                }
                TtsAction::Test => {
                    ConsoleSpeech::new(prefs.tts_voice()).speak(VOICE_TEST_PHRASE, prefs.tts_speed());
                }
                TtsAction::Show => {
                    println!("Speech rate: {:.2}", prefs.tts_speed());
                    println!("Voice: {}", prefs.tts_voice().as_deref().unwrap_or("(default)"));
                }
            }
        }

        Commands::Doctor => {
            let prefs = open_prefs(&cli)?;
            let config = VisorConfig::from_env();
            println!(
                "Preferences: {}",
                prefs.path().map_or("(in memory)".to_string(), |p| p.display().to_string())
            );
            println!("Capture interval: {}ms", config.capture_interval.as_millis());
            println!("Request timeout: {}ms", config.request_timeout.as_millis());

            let uploader = Uploader::new(Arc::clone(&prefs), config.request_timeout);
            match uploader.base_url() {
                Ok(base) => {
                    println!("Server: {base}");
                    match uploader.health().await {
                        Ok(true) => println!("Health: ok"),
                        _ => {
                            println!("Health: unreachable");
                            std::process::exit(1);
                        }
                    }
                }
                Err(e) => {
                    println!("Server: {e}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Interpret { file, json } => {
            let text = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let value: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("{} is not JSON", file.display()))?;
            let analysis = value.get("analysis").unwrap_or(&value);
            let result = interpret(analysis);
            if *json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.display_text());
            }
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "machinevisor", &mut std::io::stdout());
        }
    }

    Ok(())
}
