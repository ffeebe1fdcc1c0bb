use std::sync::Mutex;

use tempfile::NamedTempFile;

use ai_dentifier::capture::Facing;
use ai_dentifier::config::AppConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "DENTIFIER_CONFIG",
        "DENTIFIER_ENDPOINT",
        "DENTIFIER_TIMEOUT_SECS",
        "DENTIFIER_FACING",
        "DENTIFIER_CAMERA_DEVICE",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "endpoint": "https://vision.example.com/api",
        "timeout_secs": 15,
        "camera": {
            "backend": "stub://lab",
            "facing": "front"
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("DENTIFIER_CONFIG", file.path());
    std::env::set_var("DENTIFIER_FACING", "rear");
    std::env::set_var("DENTIFIER_TIMEOUT_SECS", "90");

    let cfg = AppConfig::load().expect("load config");

    assert_eq!(cfg.endpoint, "https://vision.example.com/api");
    assert_eq!(cfg.timeout.as_secs(), 90);
    assert_eq!(cfg.camera.backend, "stub://lab");
    assert_eq!(cfg.camera.facing, Facing::Back);

    clear_env();
}

#[test]
fn defaults_apply_without_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = AppConfig::load().expect("load config");
    assert_eq!(cfg.endpoint, "http://127.0.0.1:3000/api");
    assert_eq!(cfg.timeout.as_secs(), 60);
    assert_eq!(cfg.camera.backend, "stub://");
    assert_eq!(cfg.camera.facing, Facing::Front);

    clear_env();
}

#[test]
fn invalid_env_values_are_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("DENTIFIER_TIMEOUT_SECS", "soon");
    assert!(AppConfig::load().is_err());
    clear_env();

    std::env::set_var("DENTIFIER_ENDPOINT", "ftp://vision.example.com/api");
    assert!(AppConfig::load().is_err());
    clear_env();

    std::env::set_var("DENTIFIER_TIMEOUT_SECS", "0");
    assert!(AppConfig::load().is_err());
    clear_env();
}

#[test]
fn missing_config_file_is_an_error() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("DENTIFIER_CONFIG", "/nonexistent/ai-dentifier.json");
    assert!(AppConfig::load().is_err());

    clear_env();
}
