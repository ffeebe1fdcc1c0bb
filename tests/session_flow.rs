//! End-to-end session flows over synthetic cameras and a stub backend.

use anyhow::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{GrayImage, Luma, Rgb};
use std::io::{Cursor, Write};

use ai_dentifier::capture::{Camera, Facing, SyntheticDevices};
use ai_dentifier::detect::{DetectedObject, IdentifyError, StubBackend};
use ai_dentifier::ui::Ui;
use ai_dentifier::{IdentifyOutcome, Session};

fn black_mask(width: u32, height: u32) -> String {
    let mask = GrayImage::from_pixel(width, height, Luma([0]));
    let mut png = Vec::new();
    mask.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .expect("encode mask");
    STANDARD.encode(png)
}

fn obj(label: &str, score: f64) -> DetectedObject {
    DetectedObject {
        label: label.to_string(),
        mask: black_mask(4, 3),
        score,
    }
}

fn session_with(devices: SyntheticDevices, backend: StubBackend) -> Session<StubBackend> {
    Session::new(
        backend,
        Camera::new(Box::new(devices)),
        Facing::Front,
        Ui::quiet(),
    )
}

fn run_script(session: &mut Session<StubBackend>, script: &str) -> Result<String> {
    let mut out = Vec::new();
    session.run(script.as_bytes(), &mut out)?;
    Ok(String::from_utf8(out)?)
}

#[test]
fn camera_capture_then_identify() -> Result<()> {
    let backend = StubBackend::with_fallback(vec![obj("cat", 0.92), obj("dog", 0.91)]);
    let mut session = session_with(SyntheticDevices::default().with_resolution(8, 6), backend);

    session.start_camera()?;
    assert!(session.state().camera.requested);
    assert_eq!(session.state().camera.device_id.as_deref(), Some("stub://front"));

    session.capture_frame()?;
    assert!(!session.state().camera.requested);
    let image = session.state().image().expect("captured image");
    assert_eq!(image.file_name(), "captured_image.png");
    assert_eq!(image.content_type(), "image/png");
    let digest = image.digest().to_string();

    assert_eq!(session.identify(), Some(IdentifyOutcome::Applied));
    assert_eq!(session.backend().calls(), 1);
    assert_eq!(session.backend().last_digest(), Some(digest));
    assert_eq!(session.state().most_likely_label(), Some("cat"));
    Ok(())
}

#[test]
fn switch_restarts_with_back_camera() -> Result<()> {
    let mut session = session_with(SyntheticDevices::default(), StubBackend::new());
    session.start_camera()?;
    session.toggle_facing()?;
    let camera = &session.state().camera;
    assert_eq!(camera.facing, Facing::Back);
    assert_eq!(camera.device_id.as_deref(), Some("stub://back"));
    assert!(camera.requested);
    Ok(())
}

#[test]
fn denied_camera_stays_requested_without_image() {
    let mut session = session_with(
        SyntheticDevices::default().deny_permission(),
        StubBackend::new(),
    );
    let err = session.start_camera().unwrap_err();
    assert!(format!("{:#}", err).contains("Error accessing camera"));
    assert!(session.state().camera.requested);
    assert!(session.capture_frame().is_err());
    assert!(session.state().image().is_none());
}

#[test]
fn go_without_image_sends_nothing() -> Result<()> {
    let mut session = session_with(SyntheticDevices::default(), StubBackend::new());
    let out = run_script(&mut session, "go\nstatus\n")?;
    assert_eq!(session.backend().calls(), 0);
    assert!(!session.state().is_busy());
    assert!(out.contains("image: none"));
    Ok(())
}

#[test]
fn scripted_session_lists_results_and_toggles_mask() -> Result<()> {
    let backend = StubBackend::with_fallback(vec![obj("cat", 0.92), obj("dog", 0.91)]);
    let mut session = session_with(SyntheticDevices::default().with_resolution(8, 6), backend);

    let out = run_script(&mut session, "camera\ncapture\ngo\nshow dog\n")?;
    assert!(out.contains("Identified objects:"));
    assert!(out.contains("cat - 92%"));
    assert!(out.contains(" * dog - 91%"));
    assert!(out.contains("The object detected is likely a cat."));
    assert_eq!(
        session.state().selection().map(|o| o.label.as_str()),
        Some("dog")
    );

    run_script(&mut session, "show dog\n")?;
    assert!(session.state().selection().is_none());
    Ok(())
}

#[test]
fn unknown_commands_do_not_end_the_session() -> Result<()> {
    let mut session = session_with(SyntheticDevices::default(), StubBackend::new());
    let out = run_script(&mut session, "dance\nhelp\nquit\nstatus\n")?;
    assert!(out.contains("unknown command 'dance'"));
    assert!(out.contains("commands:"));
    // Nothing after quit runs.
    assert!(!out.contains("camera: off"));
    Ok(())
}

#[test]
fn failed_identify_keeps_previous_results() -> Result<()> {
    let backend = StubBackend::new();
    backend.push_reply(Ok(vec![obj("cat", 0.92)]));
    backend.push_reply(Err(IdentifyError::Status(500)));
    let mut session = session_with(SyntheticDevices::default().with_resolution(8, 6), backend);

    run_script(&mut session, "camera\ncapture\ngo\n")?;
    assert_eq!(session.identify(), Some(IdentifyOutcome::Failed));
    assert_eq!(session.backend().calls(), 2);
    assert_eq!(session.state().most_likely_label(), Some("cat"));
    Ok(())
}

#[test]
fn file_selection_accepts_any_file() -> Result<()> {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile()?;
    file.write_all(b"not an image")?;
    let mut session = session_with(SyntheticDevices::default(), StubBackend::new());

    session.select_file(file.path())?;
    let image = session.state().image().expect("image");
    assert_eq!(image.len(), 12);
    assert!(image.preview_path().exists());
    assert_eq!(session.identify(), Some(IdentifyOutcome::Applied));
    Ok(())
}

#[test]
fn render_writes_preview_with_selected_mask() -> Result<()> {
    let backend = StubBackend::with_fallback(vec![obj("cat", 0.92)]);
    let mut session = session_with(SyntheticDevices::default().with_resolution(8, 6), backend);
    let dir = tempfile::tempdir()?;
    let plain = dir.path().join("plain.png");
    let masked = dir.path().join("masked.png");

    session.start_camera()?;
    session.capture_frame()?;
    session.identify();
    session.render_preview(&plain)?;
    session.toggle_selection("cat");
    session.render_preview(&masked)?;

    let plain = image::open(&plain)?.into_rgb8();
    let masked = image::open(&masked)?.into_rgb8();
    assert_eq!(masked.dimensions(), (8, 6));
    assert_ne!(plain, masked);
    // A black opaque mask washes every pixel out to white.
    assert!(masked.pixels().all(|p| p == &Rgb([255, 255, 255])));
    Ok(())
}
