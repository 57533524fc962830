use std::{
    fs,
    io::{Cursor, Seek, Write},
    path::Path,
};

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::signal::Signal;

pub const DEFAULT_BITS_PER_SAMPLE: u16 = 24;

fn wav_spec(sample_rate: u32, bits_per_sample: u16) -> Result<hound::WavSpec> {
    let sample_format = match bits_per_sample {
        16 | 24 => hound::SampleFormat::Int,
        32 => hound::SampleFormat::Float,
        other => {
            return Err(anyhow::anyhow!(
                "unsupported wav bit depth {other}; expected 16, 24 or 32"
            ));
        }
    };

    Ok(hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample,
        sample_format,
    })
}

fn write_samples<W: Write + Seek>(
    writer: W,
    samples: &[f32],
    spec: hound::WavSpec,
) -> Result<()> {
    let mut writer = hound::WavWriter::new(writer, spec).context("failed to start wav stream")?;

    match spec.sample_format {
        hound::SampleFormat::Float => {
            for &sample in samples {
                writer
                    .write_sample(sample)
                    .context("failed to write float sample")?;
            }
        }
        hound::SampleFormat::Int => {
            let full_scale = ((1_i64 << (spec.bits_per_sample - 1)) - 1) as f32;
            for &sample in samples {
                let quantized = (sample.clamp(-1.0, 1.0) * full_scale).round() as i32;
                writer
                    .write_sample(quantized)
                    .context("failed to write pcm sample")?;
            }
        }
    }

    writer.finalize().context("failed to finalize wav stream")?;
    Ok(())
}

pub fn wav_bytes(samples: &[f32], sample_rate: u32, bits_per_sample: u16) -> Result<Vec<u8>> {
    let spec = wav_spec(sample_rate, bits_per_sample)?;
    let mut cursor = Cursor::new(Vec::new());
    write_samples(&mut cursor, samples, spec)?;
    Ok(cursor.into_inner())
}

#[instrument(skip(path, signal), fields(path = %path.display(), len = signal.len()))]
pub fn export_wav(path: &Path, signal: &Signal, bits_per_sample: u16) -> Result<()> {
    let spec = wav_spec(signal.sample_rate, bits_per_sample)?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create wav output directory: {}",
            parent.display()
        )
    })?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)
        .context("failed to create temporary wav file")?;
    write_samples(temp_file.as_file_mut(), &signal.samples, spec)?;
    temp_file
        .persist(path)
        .map_err(|error| anyhow::anyhow!(error.error))
        .with_context(|| format!("failed to persist wav file: {}", path.display()))?;

    info!(seconds = signal.duration_seconds(), "wav export completed");
    Ok(())
}
