use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

const MANIFEST: &str = r#"{
  "entries": [
    { "cuuid": "0000000000000001", "class": "event", "name": "Play_Door", "link": "0000000000000002" },
    { "cuuid": "0000000000000002", "class": "wave", "default": "0000000000000003",
      "links": [ { "link": "0000000000000009", "language": "fr" } ] },
    { "cuuid": "0000000000000003", "class": "file", "offset": 4660,
      "info": { "format": "pcm", "sample_rate": 8000, "channels": 1 },
      "source": { "external": { "filename": "Door.hst", "offset": 32, "size": 8000 } } },
    { "cuuid": "0000000000000004", "class": "event", "name": "Play_Broken", "link": "00000000000000AA" },
    { "cuuid": "0000000000000005", "class": "other", "name": "SoundResData" }
  ]
}"#;

fn write_graph(dir: &Path) -> PathBuf {
    std::fs::write(dir.join("Door.hst"), vec![0u8; 8032]).unwrap();
    let path = dir.join("graph.json");
    std::fs::write(&path, MANIFEST).unwrap();
    path
}

fn hxplay() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("hxplay"))
}

#[test]
fn list_prints_events_only() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_graph(dir.path());
    hxplay()
        .arg("list")
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("0000000000000001  Play_Door"))
        .stdout(predicate::str::contains("Play_Broken"))
        .stdout(predicate::str::contains("WavResData").not());
}

#[test]
fn list_all_includes_classes() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_graph(dir.path());
    hxplay()
        .args(["list", "--all"])
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("WaveFileIdObj"))
        .stdout(predicate::str::contains("SoundResData"));
}

#[test]
fn tree_marks_missing_links() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_graph(dir.path());
    hxplay()
        .arg("tree")
        .arg(&manifest)
        .arg("0x1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Play_Door  EventResData"))
        .stdout(predicate::str::contains("    0000000000000003  WaveFileIdObj  --"))
        .stdout(predicate::str::contains("0000000000000009  <missing>  FR"));
}

#[test]
fn resolve_lists_streams() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_graph(dir.path());
    hxplay()
        .arg("resolve")
        .arg(&manifest)
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "0000000000000003  PCM  8000 Hz  1 ch  8000 bytes  Door.hst@32",
        ));
}

#[test]
fn info_prints_file_object_fields() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_graph(dir.path());
    hxplay()
        .arg("info")
        .arg(&manifest)
        .arg("3")
        .assert()
        .success()
        .stdout(predicate::str::contains("cuuid     0000000000000003"))
        .stdout(predicate::str::contains("class     WaveFileIdObj @ 1234"))
        .stdout(predicate::str::contains("storage   external"))
        .stdout(predicate::str::contains("channels  1"))
        .stdout(predicate::str::contains("format    PCM"))
        .stdout(predicate::str::contains("size      8000 bytes"))
        .stdout(predicate::str::contains("rate      8000 Hz"))
        .stdout(predicate::str::contains("file      Door.hst"))
        .stdout(predicate::str::contains("offset    20"));
}

#[test]
fn info_reports_missing_entries() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_graph(dir.path());
    hxplay()
        .arg("info")
        .arg(&manifest)
        .arg("0x77")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no entry 0000000000000077"));
}

#[test]
fn resolve_fails_for_broken_events() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_graph(dir.path());
    hxplay()
        .arg("resolve")
        .arg(&manifest)
        .arg("4")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no playable stream found"));
}

#[test]
fn bad_manifest_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("graph.json");
    std::fs::write(&manifest, "{ not json").unwrap();
    hxplay()
        .arg("list")
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot load"));
}

#[test]
fn invalid_id_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_graph(dir.path());
    hxplay()
        .arg("tree")
        .arg(&manifest)
        .arg("xyz")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid entry id: xyz"));
}

#[test]
fn quiet_play_runs_to_the_end_without_a_sound_device() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = write_graph(dir.path());
    hxplay()
        .args(["play", "--quiet", "--null-output", "--period", "80"])
        .arg(&manifest)
        .arg("1")
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .success()
        .stdout(predicate::str::contains("[status] playing"))
        .stdout(predicate::str::contains("/8000 Q:1/1"))
        .stdout(predicate::str::contains("[status] finished"));
}
