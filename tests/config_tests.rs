// Tests for service configuration loading

use tempfile::TempDir;
use viva::Config;

const SAMPLE: &str = r#"
[service]
name = "viva"

[service.http]
bind = "127.0.0.1"
port = 8787

[nats]
url = "nats://localhost:4222"

[audio]
capture_sample_rate = 16000
capture_block_samples = 4096
playback_sample_rate = 24000

[agent]
voice = "Puck"
open_timeout_secs = 10
completion_timeout_secs = 30
grace_period_ms = 800
"#;

#[test]
fn test_config_loads_from_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("viva.toml");
    std::fs::write(&path, SAMPLE).unwrap();

    let name = dir.path().join("viva");
    let cfg = Config::load(name.to_str().unwrap()).expect("config should load");

    assert_eq!(cfg.service.name, "viva");
    assert_eq!(cfg.service.http.port, 8787);
    assert_eq!(cfg.nats.url, "nats://localhost:4222");
    assert_eq!(cfg.audio.capture_sample_rate, 16000);
    assert_eq!(cfg.audio.playback_sample_rate, 24000);
    assert_eq!(cfg.agent.voice, "Puck");
    assert_eq!(cfg.agent.open_timeout().as_secs(), 10);
    assert_eq!(cfg.agent.completion_timeout().as_secs(), 30);
    assert_eq!(cfg.agent.grace_period().as_millis(), 800);
}

#[test]
fn test_missing_config_fails() {
    assert!(Config::load("/nonexistent/viva").is_err());
}

#[test]
fn test_incomplete_config_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("viva.toml");
    std::fs::write(&path, "[service]\nname = \"viva\"\n").unwrap();

    let name = dir.path().join("viva");
    assert!(Config::load(name.to_str().unwrap()).is_err());
}
