use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use drift_core::{
    AppConfig, Signal, TextureConfig, TexturePipeline,
    assets::{load_signal, scan_audio_assets},
    diagnostics::init_tracing_from_config,
    export::export_wav,
    fixtures::field_recording,
    report::{build_render_report, write_render_report},
};
use rand::{SeedableRng, rngs::StdRng};

#[derive(Debug, Parser)]
#[command(name = "drift-cli")]
#[command(about = "Render ambient textures from short recordings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Overrides the configured log directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// TOML config file; defaults to drift.config.toml discovery.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Render {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,

        /// Writes a JSON render report next to the audio.
        #[arg(long)]
        report: Option<PathBuf>,

        #[command(flatten)]
        options: RenderOptions,
    },
    Batch {
        #[arg(long)]
        input_dir: PathBuf,

        #[arg(long)]
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        options: RenderOptions,
    },
    Demo {
        #[arg(long, default_value = "data/demo")]
        output_dir: PathBuf,

        #[arg(long, default_value_t = 8.0)]
        source_seconds: f32,

        #[command(flatten)]
        options: RenderOptions,
    },
}

#[derive(Debug, Clone, Args)]
struct RenderOptions {
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    granular: bool,

    #[arg(long)]
    target_seconds: Option<f32>,

    #[arg(long)]
    reverb: bool,

    #[arg(long = "loop")]
    looping: bool,

    #[arg(long)]
    no_limiter: bool,
}

impl RenderOptions {
    fn apply(&self, config: &AppConfig, sample_rate: u32, source_seconds: f32) -> TextureConfig {
        let mut texture = config.texture.clone();
        texture.granular.enabled |= self.granular;
        texture.reverb.enabled |= self.reverb;
        texture.looping.enabled |= self.looping;
        if self.no_limiter {
            texture.limiter.enabled = false;
        }
        if let Some(target) = self.target_seconds {
            texture.granular.target_duration_s = Some(target);
        }

        if texture.granular.enabled {
            let requested = texture
                .granular
                .target_duration_s
                .unwrap_or(source_seconds);
            texture.granular.target_duration_s = Some(
                config
                    .limits
                    .bounded_target_seconds(requested, sample_rate),
            );
        }
        texture
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

fn render_one(
    pipeline: &TexturePipeline,
    config: &AppConfig,
    options: &RenderOptions,
    input: &Signal,
    output: &Path,
    report: Option<&Path>,
) -> anyhow::Result<()> {
    let texture = options.apply(config, input.sample_rate, input.duration_seconds() as f32);
    let mut rng = options.rng();
    let rendered = pipeline
        .render(input, &texture, &mut rng)
        .with_context(|| format!("failed to render {}", output.display()))?;
    export_wav(output, &rendered, config.output.bits_per_sample)?;

    if let Some(report_path) = report {
        let report = build_render_report(input, &rendered, &texture, options.seed);
        write_render_report(report_path, &report)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::load_or_default()?,
    };
    if let Some(log_dir) = &cli.log_dir {
        config.diagnostics.log_dir.clone_from(log_dir);
    }
    let _telemetry = init_tracing_from_config(&config.diagnostics)?;

    let pipeline = TexturePipeline::new();
    let sample_rate = config.output.sample_rate;

    match cli.command {
        Commands::Render {
            input,
            output,
            report,
            options,
        } => {
            let signal = load_signal(&input, sample_rate)?;
            render_one(&pipeline, &config, &options, &signal, &output, report.as_deref())?;
            tracing::info!(path = %output.display(), "texture written");
        }
        Commands::Batch {
            input_dir,
            output_dir,
            options,
        } => {
            let output_dir = output_dir.unwrap_or_else(|| config.output.directory.clone());
            let assets = scan_audio_assets(&input_dir)?;
            for asset in &assets {
                let input = PathBuf::from(&asset.path);
                let stem = input
                    .file_stem()
                    .and_then(|value| value.to_str())
                    .unwrap_or("texture");
                let output = output_dir.join(format!("{stem}.texture.wav"));

                let result = load_signal(&input, sample_rate).and_then(|signal| {
                    render_one(&pipeline, &config, &options, &signal, &output, None)
                });
                if let Err(error) = result {
                    tracing::warn!(
                        ?error,
                        path = %asset.path,
                        "skipping asset that failed to render"
                    );
                }
            }
            tracing::info!(count = assets.len(), "batch render finished");
        }
        Commands::Demo {
            output_dir,
            source_seconds,
            options,
        } => {
            let source = field_recording(source_seconds, sample_rate, options.seed.unwrap_or(0));
            export_wav(
                &output_dir.join("demo.source.wav"),
                &source,
                config.output.bits_per_sample,
            )?;
            render_one(
                &pipeline,
                &config,
                &options,
                &source,
                &output_dir.join("demo.texture.wav"),
                Some(&output_dir.join("demo.report.json")),
            )?;
            tracing::info!(path = %output_dir.display(), "demo render written");
        }
    }

    Ok(())
}
