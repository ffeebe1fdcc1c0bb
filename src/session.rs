//! Interactive session.
//!
//! A `Session` owns the application state, the camera and the inference
//! backend, and exposes one method per user action. `run` drives it from a
//! line-oriented command stream:
//!
//! ```text
//! file <path>     choose an image file
//! camera          start the camera with the current facing
//! switch          flip front/back and restart the camera
//! capture         take the current camera frame as the image
//! go              identify objects in the image
//! show <label>    toggle the mask overlay for a label
//! render <path>   write the preview (image + selected mask) as PNG
//! status          print the current state
//! help            list commands
//! quit            leave the session
//! ```
//!
//! Failures of individual commands are logged and the session carries on;
//! nothing short of end of input or `quit` stops it.

use anyhow::{anyhow, Context, Result};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::capture::{Camera, Facing};
use crate::detect::InferenceBackend;
use crate::image_source::ImageSource;
use crate::present::{compose_preview, write_png, ResultView};
use crate::state::{AppState, IdentifyOutcome};
use crate::ui::Ui;

const HELP: &str = "\
commands:
  file <path>     choose an image file
  camera          start the camera
  switch          switch between front and rear camera
  capture         capture the current camera frame
  go              identify objects in the image
  show <label>    toggle the mask overlay for a label
  render <path>   write the preview image as PNG
  status          print the current state
  quit            leave";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    File(PathBuf),
    Camera,
    Switch,
    Capture,
    Go,
    Show(String),
    Render(PathBuf),
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let argument = |name: &str| -> Result<String> {
            if rest.is_empty() {
                Err(anyhow!("'{}' needs a {}", verb, name))
            } else {
                Ok(rest.to_string())
            }
        };
        match verb.to_ascii_lowercase().as_str() {
            "file" | "open" => Ok(Command::File(PathBuf::from(argument("path")?))),
            "camera" => Ok(Command::Camera),
            "switch" | "flip" => Ok(Command::Switch),
            "capture" | "snap" => Ok(Command::Capture),
            "go" | "identify" => Ok(Command::Go),
            "show" => Ok(Command::Show(argument("label")?)),
            "render" => Ok(Command::Render(PathBuf::from(argument("path")?))),
            "status" => Ok(Command::Status),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(anyhow!("unknown command '{}'; try 'help'", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session<B> {
    state: AppState,
    camera: Camera,
    backend: B,
    ui: Ui,
}

impl<B: InferenceBackend> Session<B> {
    pub fn new(backend: B, camera: Camera, facing: Facing, ui: Ui) -> Self {
        let mut state = AppState::new();
        state.camera.facing = facing;
        Self {
            state,
            camera,
            backend,
            ui,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn select_file(&mut self, path: &Path) -> Result<()> {
        let image = ImageSource::from_path(path)?;
        log::info!("selected {} as image {}", path.display(), image.digest());
        self.state.set_image(image);
        Ok(())
    }

    /// Start the camera. On failure the camera stays marked as requested.
    pub fn start_camera(&mut self) -> Result<()> {
        let _stage = self.ui.stage("Starting camera");
        self.camera
            .start(&mut self.state.camera)
            .context("Error accessing camera")
    }

    pub fn toggle_facing(&mut self) -> Result<()> {
        let _stage = self.ui.stage("Switching camera");
        self.camera
            .toggle_facing(&mut self.state.camera)
            .context("Error accessing camera")
    }

    pub fn capture_frame(&mut self) -> Result<()> {
        let image = self.camera.capture_frame(&mut self.state.camera)?;
        self.state.set_image(image);
        Ok(())
    }

    /// Identify objects in the current image. `None` when there is no image.
    pub fn identify(&mut self) -> Option<IdentifyOutcome> {
        if self.state.image().is_none() {
            return None;
        }
        let _stage = self.ui.stage("Analyzing");
        self.state.identify(&self.backend)
    }

    pub fn toggle_selection(&mut self, label: &str) {
        self.state.toggle_selection(label);
    }

    pub fn render_preview(&self, path: &Path) -> Result<()> {
        let image = self
            .state
            .image()
            .ok_or_else(|| anyhow!("no image uploaded"))?;
        let preview = compose_preview(image, self.state.selection())?;
        write_png(&preview, path)
    }

    pub fn status(&self) -> String {
        let mut out = String::new();
        match self.state.image() {
            Some(image) => out.push_str(&format!(
                "image: {} ({}, {} bytes) at {}\n",
                image.file_name(),
                image.content_type(),
                image.len(),
                image.display_url()
            )),
            None => out.push_str("image: none\n"),
        }
        let camera = &self.state.camera;
        out.push_str(&format!(
            "camera: {} ({} facing, device {})\n",
            if camera.requested { "on" } else { "off" },
            camera.facing,
            camera.device_id.as_deref().unwrap_or("default")
        ));
        if self.state.is_busy() {
            out.push_str("Analyzing...\n");
        }
        out.push_str(&ResultView::from_state(&self.state).render());
        out
    }

    /// Apply one command. Command failures are logged, not returned; only
    /// output errors end the session.
    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<Flow> {
        let result = match command {
            Command::File(path) => self.select_file(&path),
            Command::Camera => self.start_camera(),
            Command::Switch => self.toggle_facing(),
            Command::Capture => self.capture_frame(),
            Command::Go => {
                if self.identify() == Some(IdentifyOutcome::Applied) {
                    write!(out, "{}", ResultView::from_state(&self.state).render())?;
                }
                Ok(())
            }
            Command::Show(label) => {
                self.toggle_selection(&label);
                write!(out, "{}", ResultView::from_state(&self.state).render())?;
                Ok(())
            }
            Command::Render(path) => self.render_preview(&path).map(|()| {
                log::info!("preview written to {}", path.display());
            }),
            Command::Status => {
                write!(out, "{}", self.status())?;
                Ok(())
            }
            Command::Help => {
                writeln!(out, "{}", HELP)?;
                Ok(())
            }
            Command::Quit => return Ok(Flow::Quit),
        };
        if let Err(err) = result {
            log::error!("{:#}", err);
        }
        Ok(Flow::Continue)
    }

    /// Read commands until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        for line in input.lines() {
            let line = line.context("read command")?;
            if line.trim().is_empty() {
                continue;
            }
            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(err) => {
                    writeln!(out, "{}", err)?;
                    continue;
                }
            };
            if self.execute(command, out)? == Flow::Quit {
                break;
            }
            out.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_arguments() -> Result<()> {
        assert_eq!(
            "file  /tmp/My Photo.jpg".parse::<Command>()?,
            Command::File(PathBuf::from("/tmp/My Photo.jpg"))
        );
        assert_eq!(
            "show traffic light".parse::<Command>()?,
            Command::Show("traffic light".to_string())
        );
        assert_eq!("GO".parse::<Command>()?, Command::Go);
        assert_eq!("flip".parse::<Command>()?, Command::Switch);
        Ok(())
    }

    #[test]
    fn rejects_missing_arguments_and_unknown_verbs() {
        assert!("show".parse::<Command>().is_err());
        assert!("render".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().is_err());
    }
}
