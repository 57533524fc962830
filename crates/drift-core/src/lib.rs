//! Turns short field recordings into long, seamless ambient textures.
//!
//! The chain is: zero-phase high/low-pass cleanup, optional granular
//! overlap-add extension, optional reverb, a static peak limiter and a final
//! peak normalisation, optionally followed by seamless-loop construction.

pub mod assets;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod filter;
pub mod fixtures;
pub mod granular;
pub mod looping;
pub mod mastering;
pub mod pipeline;
pub mod pitch;
pub mod report;
pub mod resample;
pub mod reverb;
pub mod signal;
pub mod time;

pub use assets::{
    AudioAssetEntry, DecodedAudio, decode_audio_file_mono, load_signal, scan_audio_assets,
};
pub use config::{AppConfig, DiagnosticsConfig, LimitsConfig, OutputConfig};
pub use diagnostics::{TelemetryGuard, init_tracing_from_config, init_tracing_with_options};
pub use error::TextureError;
pub use export::{export_wav, wav_bytes};
pub use filter::{FilterCoefficients, FilterKind, highpass, lowpass};
pub use granular::{ExtendParams, GranularConfig, extend, extend_with_rng};
pub use looping::{LoopConfig, make_seamless_loop};
pub use mastering::{LimiterConfig, limit, normalize};
pub use pipeline::{
    FilterConfig, TextureConfig, TexturePipeline, process_texture, render_texture,
};
pub use pitch::{NoPitchShift, PitchShifter, ResamplingPitchShifter};
pub use report::{RenderReport, build_render_report};
pub use reverb::{Freeverb, NoReverb, ReverbConfig, ReverbParams, ReverbUnit, apply_ambience};
pub use signal::{DEFAULT_SAMPLE_RATE, DEFAULT_TARGET_PEAK, Signal};
