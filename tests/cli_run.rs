use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn dualsync() -> Command {
    Command::cargo_bin("dualsync").expect("binary built")
}

fn report(stdout: &[u8]) -> Value {
    serde_json::from_slice(stdout).expect("stdout is a json report")
}

#[test]
fn two_tones_produce_a_stereo_wav() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tones.wav");

    let assert = dualsync()
        .args(["--left", "tone:440", "--right", "tone:660"])
        .args(["--sample-rate", "16000", "--duration", "0.5"])
        .arg("--output")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sample_pairs\""));

    let report = report(&assert.get_output().stdout);
    assert_eq!(report["mixer_running"], Value::Bool(true));
    assert!(report["stats"]["frames"].as_u64().unwrap() > 0);
    assert_eq!(report["stats"]["gaps"].as_u64(), Some(0));

    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.spec().channels, 2);
    assert_eq!(reader.spec().sample_rate, 16_000);
    assert!(reader.len() > 0);
}

#[test]
fn silent_right_source_is_filled_with_silence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("one_sided.wav");

    let assert = dualsync()
        .args(["--left", "tone:440", "--right", "silence"])
        .args(["--sample-rate", "8000", "--duration", "0.6"])
        .arg("--output")
        .arg(&path)
        .assert()
        .success();

    let report = report(&assert.get_output().stdout);
    assert!(report["stats"]["silence_fills"].as_u64().unwrap() > 0);

    let mut reader = hound::WavReader::open(&path).unwrap();
    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert!(!samples.is_empty());
    assert!(samples.iter().skip(1).step_by(2).all(|s| *s == 0));
    assert!(samples.iter().step_by(2).any(|s| *s != 0));
}

#[test]
fn periodic_gaps_reach_the_output() {
    let assert = dualsync()
        .args(["--left", "tone:440", "--right", "tone:441"])
        .args(["--duration", "0.6", "--gap-every-ms", "100"])
        .assert()
        .success();

    let report = report(&assert.get_output().stdout);
    assert!(report["stats"]["gaps"].as_u64().unwrap() > 0);
    // Both counters are read after the mixer has been joined.
    assert_eq!(report["output"]["gaps"], report["stats"]["gaps"]);
    assert_eq!(report["output"]["frames"], report["stats"]["frames"]);
    assert_eq!(report["output"]["sample_pairs"], report["stats"]["sample_pairs"]);
}

#[test]
fn config_file_supplies_settings() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("settings.json");
    std::fs::write(
        &config,
        r#"{"left_source":"tone:300","right_source":"tone:500:100","sample_rate":22050,"wake_on_data":true}"#,
    )
    .unwrap();

    let assert = dualsync()
        .arg("--config")
        .arg(&config)
        .args(["--duration", "0.3"])
        .assert()
        .success();

    let report = report(&assert.get_output().stdout);
    assert_eq!(report["settings"]["sample_rate"].as_u64(), Some(22_050));
    assert_eq!(report["settings"]["right_source"], "tone:500:100");
    assert_eq!(report["settings"]["wake_on_data"], Value::Bool(true));
}

#[test]
fn unknown_source_fails_construction() {
    dualsync()
        .args(["--left", "tone:440", "--right", "speaker:monitor"])
        .args(["--duration", "0.1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not open source 'speaker:monitor'"));
}

#[test]
fn zero_duration_is_rejected() {
    dualsync()
        .args(["--duration", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("duration"));
}
