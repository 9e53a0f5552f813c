//! `iamf-encode`: command-line front end for iamf-encoder-core.
//!
//! # Usage
//!
//! ```bash
//! iamf-encode encode --in-file mix_51.wav --out-fmt 5.1 --out-file mix.iamf
//! iamf-encode encode -i ambi.wav -f ACNSN3DO2A -o ambi.iamf --loudness -16 --metadata
//! iamf-encode inspect mix.iamf --json
//! iamf-encode extract mix.iamf -o decoded.wav
//! iamf-encode formats
//! ```

mod progress;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use iamf_encoder_core::layout::format_table;
use iamf_encoder_core::{
    encode_source, inspect_file, read_file, write_wav, MixConfig, ObuReader, PcmSource, WavSource, WorkflowOptions,
};

use progress::ProgressDelegate;

#[derive(Parser)]
#[command(name = "iamf-encode", about = "Wrap multichannel PCM into an IAMF container", version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a WAV file into an .iamf stream.
    Encode {
        /// Input WAV file (integer PCM, channel layout of the output format).
        #[arg(short, long)]
        in_file: PathBuf,

        /// Output format name (see `formats`).
        #[arg(short = 'f', long)]
        out_fmt: String,

        /// Output .iamf path.
        #[arg(short, long)]
        out_file: PathBuf,

        /// Integrated loudness written to the mix presentation, in dB.
        #[arg(long, allow_hyphen_values = true)]
        loudness: Option<f32>,

        /// Digital peak written to the mix presentation, in dB.
        #[arg(long, allow_hyphen_values = true)]
        peak: Option<f32>,

        /// Frame duration in milliseconds.
        #[arg(long)]
        frame_ms: Option<u32>,

        /// Write a JSON metadata sidecar next to the output.
        #[arg(long)]
        metadata: bool,

        /// Write the output path directly instead of renaming a finished temp file.
        #[arg(long)]
        no_atomic: bool,
    },

    /// Describe an .iamf stream.
    Inspect {
        input: PathBuf,

        /// Print the description as JSON.
        #[arg(long)]
        json: bool,

        /// List every OBU with its offset and size.
        #[arg(long)]
        obus: bool,
    },

    /// Decode the PCM of an .iamf stream into a WAV file.
    Extract {
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// List supported output formats.
    Formats {
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match cli.command {
        Commands::Encode {
            in_file,
            out_fmt,
            out_file,
            loudness,
            peak,
            frame_ms,
            metadata,
            no_atomic,
        } => cmd_encode(&in_file, &out_fmt, &out_file, loudness, peak, frame_ms, metadata, !no_atomic),

        Commands::Inspect { input, json, obus } => cmd_inspect(&input, json, obus),

        Commands::Extract { input, output } => cmd_extract(&input, &output),

        Commands::Formats { json } => cmd_formats(json),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_encode(
    in_file: &Path,
    out_fmt: &str,
    out_file: &Path,
    loudness: Option<f32>,
    peak: Option<f32>,
    frame_ms: Option<u32>,
    metadata: bool,
    atomic: bool,
) -> Result<()> {
    let mut source = WavSource::open(in_file).with_context(|| format!("Failed to open {}", in_file.display()))?;

    let mix = if loudness.is_some() || peak.is_some() {
        let defaults = MixConfig::default();
        Some(MixConfig {
            integrated_loudness_db: loudness.unwrap_or(defaults.integrated_loudness_db),
            peak_threshold_db: peak.unwrap_or(defaults.peak_threshold_db),
            ..defaults
        })
    } else {
        None
    };
    let options = WorkflowOptions {
        atomic,
        write_metadata: metadata,
        mix,
        frame_duration_ms: frame_ms,
    };

    let delegate = Arc::new(ProgressDelegate::new(source.total_samples()));
    let result = encode_source(&mut source, out_fmt, out_file, &options, Some(delegate))
        .with_context(|| format!("Failed to encode {} as {}", in_file.display(), out_fmt))?;

    let summary = &result.summary;
    println!("Encoded {} -> {}", in_file.display(), out_file.display());
    println!("  Format:   {}", out_fmt);
    println!("  Frames:   {}", summary.frames_encoded);
    println!("  Samples:  {}", summary.samples_encoded);
    println!("  Duration: {:.3} s", summary.duration_secs);
    println!("  Size:     {} bytes", summary.bytes_written);
    if let Some(ref checksum) = summary.checksum {
        println!("  SHA-256:  {}", checksum);
    }
    if let Some(ref path) = result.metadata_path {
        println!("  Metadata: {}", path.display());
    }
    Ok(())
}

fn cmd_inspect(input: &Path, json: bool, list_obus: bool) -> Result<()> {
    let info = inspect_file(input).with_context(|| format!("Failed to read {}", input.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("File: {}", input.display());
        println!("  Profiles:          {} / {}", info.primary_profile, info.additional_profile);
        println!("  Codec:             {} ({}-bit, {} Hz)", info.codec_fourcc, info.sample_size, info.sample_rate);
        println!(
            "  Audio element:     {} ({}, {} channels)",
            info.element_id,
            if info.is_scene_based { "scene-based" } else { "channel-based" },
            info.channel_count
        );
        if let Some(layout) = info.loudspeaker_layout {
            println!("  Loudspeaker code:  {}", layout);
        }
        if let Some(mode) = info.ambisonics_mode {
            println!("  Ambisonics mode:   {}", mode);
        }
        println!("  Mix presentation:  {} (layout type {})", info.presentation_id, info.layout_type);
        println!("  Loudness:          {:.2} dB", info.integrated_loudness_db);
        println!("  Digital peak:      {:.2} dB", info.digital_peak_db);
        println!("  OBUs:              {}", info.obu_count);
        println!("  Frames:            {}", info.frame_count);
        println!("  Samples:           {}", info.total_samples);
        println!("  Duration:          {:.3} s", info.duration_secs);
    }

    if list_obus {
        let bytes = std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
        for obu in ObuReader::new(&bytes) {
            let obu = obu?;
            println!(
                "  @{:<10} type {:>2} {:<17} {} bytes",
                obu.offset,
                obu.obu_type.code(),
                obu.obu_type.name(),
                obu.payload.len()
            );
        }
    }
    Ok(())
}

fn cmd_extract(input: &Path, output: &Path) -> Result<()> {
    let parsed = read_file(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let info = &parsed.info;
    write_wav(output, info.sample_rate, info.channel_count, info.sample_size, &parsed.pcm)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Extracted {} samples ({} channels, {}-bit) to {}",
        info.total_samples,
        info.channel_count,
        info.sample_size,
        output.display()
    );
    Ok(())
}

fn cmd_formats(json: bool) -> Result<()> {
    let descriptors = format_table::descriptors();
    if json {
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
        return Ok(());
    }

    println!("{:<14} {:>7} {:>9}  {}", "FORMAT", "ELEMENT", "CHANNELS", "TYPE");
    for desc in descriptors {
        println!(
            "{:<14} {:>7} {:>9}  {}",
            desc.name,
            desc.element_id,
            desc.channel_count,
            if desc.is_scene_based { "scene-based" } else { "channel-based" }
        );
    }
    Ok(())
}
