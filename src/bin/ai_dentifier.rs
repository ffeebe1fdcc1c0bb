//! ai_dentifier - identify objects in a photo via a remote detection backend.
//!
//! One-shot mode:
//! 1. Acquires an image (--file, or --camera with --facing)
//! 2. Uploads it to the inference endpoint
//! 3. Prints labels with confidence and the most likely label
//! 4. Optionally toggles a mask (--show) and writes the preview (--overlay-out)
//!
//! With --interactive, commands are read from stdin instead (see `help`).

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use ai_dentifier::capture::{open_media_devices, Camera, Facing};
use ai_dentifier::present::ResultView;
use ai_dentifier::ui::{Ui, UiMode};
use ai_dentifier::{AppConfig, HttpInferenceClient, IdentifyOutcome, Session};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Identify objects in a photo and inspect their segmentation masks"
)]
struct Args {
    /// Image file to identify.
    #[arg(long, value_name = "PATH", conflicts_with = "camera")]
    file: Option<PathBuf>,

    /// Capture the image from a camera instead of a file.
    #[arg(long)]
    camera: bool,

    /// Camera facing preference (front|back).
    #[arg(long, value_name = "FACING")]
    facing: Option<Facing>,

    /// Label whose mask is overlaid on the preview.
    #[arg(long, value_name = "LABEL")]
    show: Option<String>,

    /// Write the preview (image plus selected mask) as PNG.
    #[arg(long, value_name = "PATH")]
    overlay_out: Option<PathBuf>,

    /// Read commands from stdin.
    #[arg(long, conflicts_with_all = ["file", "camera"])]
    interactive: bool,

    /// Inference endpoint (overrides config).
    #[arg(long, env = "DENTIFIER_ENDPOINT")]
    endpoint: Option<String>,

    /// Request timeout in seconds (overrides config).
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// UI mode for stderr progress (auto|plain|pretty|quiet).
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: UiMode,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = AppConfig::load()?;
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(seconds) = args.timeout_secs {
        config.timeout = Duration::from_secs(seconds);
    }
    if let Some(facing) = args.facing {
        config.camera.facing = facing;
    }
    config.validate()?;

    let backend = HttpInferenceClient::new(config.http_backend())?;
    log::info!("inference endpoint: {}", backend.endpoint());
    let camera = Camera::new(open_media_devices(&config.camera.backend)?);
    let mut session = Session::new(backend, camera, config.camera.facing, Ui::for_stderr(args.ui));

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.interactive {
        writeln!(out, "AI-Dentifier. Type 'help' for commands.")?;
        let stdin = io::stdin();
        return session.run(stdin.lock(), &mut out);
    }

    if let Some(path) = &args.file {
        session.select_file(path)?;
    } else if args.camera {
        if let Err(err) = session.start_camera() {
            log::error!("{:#}", err);
        }
        session.capture_frame()?;
    } else {
        return Err(anyhow!("nothing to identify; pass --file, --camera or --interactive"));
    }

    match session.identify() {
        Some(IdentifyOutcome::Applied) => {}
        Some(_) => return Err(anyhow!("identification failed; see log for details")),
        None => return Err(anyhow!("no image uploaded")),
    }

    if let Some(label) = &args.show {
        session.toggle_selection(label);
        if session.state().selection().is_none() {
            log::warn!("no detection labelled '{}'", label);
        }
    }
    write!(out, "{}", ResultView::from_state(session.state()).render())?;

    if let Some(path) = &args.overlay_out {
        session.render_preview(path)?;
        log::info!("preview written to {}", path.display());
    }

    Ok(())
}
