use std::path::Path;

use drift_core::{
    Signal,
    assets::{decode_audio_file_mono, load_signal, scan_audio_assets},
    export::{export_wav, wav_bytes},
    fixtures::sine,
};
use tempfile::tempdir;

fn write_stereo_wav(path: &Path, sample_rate: u32, seconds: f32) {
    let frame_count = (seconds * sample_rate as f32).round() as usize;
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).expect("test wav should be creatable");
    for frame in 0..frame_count {
        let phase = frame as f32 / sample_rate as f32 * 220.0 * std::f32::consts::TAU;
        let left = (phase.sin() * 0.5 * f32::from(i16::MAX)).round() as i16;
        writer
            .write_sample(left)
            .expect("left sample write should succeed");
        writer
            .write_sample(0_i16)
            .expect("right sample write should succeed");
    }
    writer.finalize().expect("test wav finalize should succeed");
}

#[test]
fn stereo_input_is_downmixed_and_resampled() {
    let temp = tempdir().expect("tempdir should be creatable");
    let path = temp.path().join("phone_take.wav");
    write_stereo_wav(&path, 44_100, 0.5);

    let decoded = decode_audio_file_mono(&path).expect("decode should succeed");
    assert_eq!(decoded.sample_rate, 44_100);
    assert_eq!(decoded.channels, 2);
    assert_eq!(decoded.samples.len(), 22_050);
    // Right channel is silent, so the downmix halves the level.
    let peak = decoded
        .samples
        .iter()
        .map(|sample| sample.abs())
        .fold(0.0_f32, f32::max);
    assert!((peak - 0.25).abs() < 0.01, "downmix peak {peak}");

    let signal = load_signal(&path, 48_000).expect("load should succeed");
    assert_eq!(signal.sample_rate, 48_000);
    assert_eq!(signal.len(), 24_000);
}

#[test]
fn export_writes_24_bit_mono_wav() {
    let temp = tempdir().expect("tempdir should be creatable");
    let path = temp.path().join("renders").join("texture.wav");
    let signal = sine(440.0, 0.25, 48_000, 0.9);

    export_wav(&path, &signal, 24).expect("export should succeed");

    let mut reader = hound::WavReader::open(&path).expect("exported wav should open");
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 48_000);
    assert_eq!(spec.bits_per_sample, 24);
    assert_eq!(reader.len() as usize, signal.len());

    let full_scale = 8_388_607.0_f32;
    for (written, original) in reader.samples::<i32>().zip(&signal.samples).take(500) {
        let written = written.expect("sample should decode") as f32 / full_scale;
        assert!((written - original).abs() < 1e-5);
    }
}

#[test]
fn exported_file_round_trips_through_the_decoder() {
    let temp = tempdir().expect("tempdir should be creatable");
    let path = temp.path().join("texture.wav");
    let signal = sine(330.0, 0.2, 48_000, 0.7);
    export_wav(&path, &signal, 24).expect("export should succeed");

    let loaded = load_signal(&path, 48_000).expect("load should succeed");
    assert_eq!(loaded.len(), signal.len());
    for (a, b) in loaded.samples.iter().zip(&signal.samples) {
        assert!((a - b).abs() < 1e-4);
    }
}

#[test]
fn in_memory_encoding_matches_file_export() {
    let temp = tempdir().expect("tempdir should be creatable");
    let path = temp.path().join("texture.wav");
    let signal = Signal::new(vec![0.0, 0.25, -0.5, 0.75], 48_000);

    export_wav(&path, &signal, 16).expect("export should succeed");
    let bytes = wav_bytes(&signal.samples, 48_000, 16).expect("encode should succeed");
    assert_eq!(std::fs::read(&path).expect("export should be readable"), bytes);
}

#[test]
fn scan_finds_supported_assets_only() {
    let temp = tempdir().expect("tempdir should be creatable");
    let nested = temp.path().join("field").join("rivers");
    std::fs::create_dir_all(&nested).expect("nested dir should be creatable");

    write_stereo_wav(&nested.join("creek.wav"), 48_000, 0.1);
    write_stereo_wav(&temp.path().join("rain.WAV"), 48_000, 0.1);
    std::fs::write(temp.path().join("notes.txt"), "not audio")
        .expect("text file should be writable");

    let assets = scan_audio_assets(temp.path()).expect("scan should succeed");
    assert_eq!(assets.len(), 2);
    assert!(assets.iter().any(|asset| asset.path.ends_with("creek.wav")));
    assert!(assets.iter().all(|asset| asset.extension == "wav"));
    assert!(assets.iter().all(|asset| asset.size_bytes > 44));

    assert!(scan_audio_assets(&temp.path().join("missing")).is_err());
}

#[test]
fn garbage_files_fail_to_decode() {
    let temp = tempdir().expect("tempdir should be creatable");
    let path = temp.path().join("broken.wav");
    std::fs::write(&path, b"definitely not a riff header").expect("file should be writable");
    assert!(decode_audio_file_mono(&path).is_err());
    assert!(load_signal(&path, 48_000).is_err());
}
