//! End-to-end tests for the `iamf-encode` binary: WAV → encode → inspect →
//! extract, with the extracted PCM compared byte for byte.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use iamf_encoder_core::sources::pcm::f32_to_pcm;
use iamf_encoder_core::{write_wav, PcmSource, WavSource};

/// Interleaved sine tones, one frequency per channel.
fn tone_pcm(sample_rate: u32, channels: u32, samples: usize) -> Vec<u8> {
    let mut interleaved = Vec::with_capacity(samples * channels as usize);
    for i in 0..samples {
        let t = i as f32 / sample_rate as f32;
        for ch in 0..channels {
            let freq = 220.0 * (ch + 1) as f32;
            interleaved.push(0.5 * (2.0 * std::f32::consts::PI * freq * t).sin());
        }
    }
    f32_to_pcm(&interleaved, 16).unwrap()
}

fn write_input(path: &Path, channels: u32, samples: usize) -> Vec<u8> {
    let pcm = tone_pcm(48000, channels, samples);
    write_wav(path, 48000, channels, 16, &pcm).unwrap();
    pcm
}

#[allow(deprecated)]
fn iamf_cmd() -> Command {
    Command::cargo_bin("iamf-encode").expect("Failed to find `iamf-encode` binary")
}

#[test]
fn test_encode_inspect_extract_round_trip() {
    let tmp = TempDir::new().unwrap();
    let wav = tmp.path().join("stereo.wav");
    let iamf = tmp.path().join("stereo.iamf");
    let decoded = tmp.path().join("decoded.wav");
    let pcm = write_input(&wav, 2, 4800);

    iamf_cmd()
        .args(["encode", "--in-file"])
        .arg(&wav)
        .args(["--out-fmt", "stereo", "--out-file"])
        .arg(&iamf)
        .assert()
        .success()
        .stdout(predicate::str::contains("Frames:   10"));

    iamf_cmd()
        .arg("inspect")
        .arg(&iamf)
        .assert()
        .success()
        .stdout(predicate::str::contains("ipcm"))
        .stdout(predicate::str::contains("Samples:           4800"));

    iamf_cmd()
        .arg("extract")
        .arg(&iamf)
        .arg("-o")
        .arg(&decoded)
        .assert()
        .success();

    let mut source = WavSource::open(&decoded).unwrap();
    assert_eq!(source.channel_count(), 2);
    assert_eq!(source.bit_depth(), 16);
    let mut decoded_pcm = Vec::new();
    assert_eq!(source.read_samples(4800, &mut decoded_pcm).unwrap(), 4800);
    assert_eq!(decoded_pcm, pcm);
}

#[test]
fn test_encode_with_loudness_and_metadata() {
    let tmp = TempDir::new().unwrap();
    let wav = tmp.path().join("surround.wav");
    let iamf = tmp.path().join("surround.iamf");
    write_input(&wav, 6, 960);

    iamf_cmd()
        .args(["encode", "-i"])
        .arg(&wav)
        .args(["-f", "5.1", "-o"])
        .arg(&iamf)
        .args(["--loudness", "-16", "--peak", "-2", "--metadata"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SHA-256"));

    assert!(tmp.path().join("surround.metadata.json").exists());

    let output = iamf_cmd().arg("inspect").arg(&iamf).arg("--json").output().unwrap();
    assert!(output.status.success());
    let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["channel_count"], 6);
    assert_eq!(info["integrated_loudness_db"], -16.0);
    assert_eq!(info["digital_peak_db"], -2.0);
    assert_eq!(info["sound_system"], 1);
}

#[test]
fn test_channel_mismatch_fails() {
    let tmp = TempDir::new().unwrap();
    let wav = tmp.path().join("stereo.wav");
    let iamf = tmp.path().join("out.iamf");
    write_input(&wav, 2, 480);

    iamf_cmd()
        .args(["encode", "-i"])
        .arg(&wav)
        .args(["-f", "7.1.4", "-o"])
        .arg(&iamf)
        .assert()
        .failure()
        .stderr(predicate::str::contains("expects 12"));

    assert!(!iamf.exists());
}

#[test]
fn test_unknown_format_fails() {
    let tmp = TempDir::new().unwrap();
    let wav = tmp.path().join("mono.wav");
    write_input(&wav, 1, 480);

    iamf_cmd()
        .args(["encode", "-i"])
        .arg(&wav)
        .args(["-f", "unknown-format", "-o"])
        .arg(tmp.path().join("out.iamf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported format"));
}

#[test]
fn test_inspect_rejects_garbage() {
    let tmp = TempDir::new().unwrap();
    let bogus = tmp.path().join("bogus.iamf");
    fs::write(&bogus, b"not an iamf stream").unwrap();

    iamf_cmd()
        .arg("inspect")
        .arg(&bogus)
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed stream"));
}

#[test]
fn test_formats_lists_table() {
    iamf_cmd()
        .arg("formats")
        .assert()
        .success()
        .stdout(predicate::str::contains("ACNSN3DO3A"))
        .stdout(predicate::str::contains("M1Spatial-14"))
        .stdout(predicate::str::contains("7.1.4"));
}
