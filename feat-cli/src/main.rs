//! audiofeat — extract raw / MFCC / spectrogram features from an audio file.

use anyhow::{Context, Result};
use audiofeat::{
    AudioLoader, FeatureError, FeatureExtractor, FeatureParams, FeatureRequest, Features,
};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit status for files that could not be found or decoded.
const EXIT_DECODE: u8 = 2;

#[derive(Parser)]
#[command(name = "audiofeat")]
#[command(about = "Extract audio features from WAV/MP3/FLAC files")]
struct Cli {
    /// Audio file to load
    path: PathBuf,

    /// Feature type: raw, mfcc or spec
    #[arg(short, long, default_value = "spec")]
    feature: String,

    /// Number of MFCC coefficients (mfcc only)
    #[arg(long)]
    features: Option<usize>,

    /// Low frequency cutoff in Hz
    #[arg(long)]
    low_freq: Option<f64>,

    /// High frequency cutoff in Hz
    #[arg(long)]
    high_freq: Option<f64>,

    /// Print the full feature array as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

fn summarize(values: &[f64]) -> (f64, f64, f64) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len().max(1) as f64;
    (min, max, mean)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let decode = e
                .downcast_ref::<FeatureError>()
                .is_some_and(FeatureError::is_decode_error);
            if decode {
                ExitCode::from(EXIT_DECODE)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let params = FeatureParams {
        features: cli.features,
        low_freq: cli.low_freq,
        high_freq: cli.high_freq,
    };
    let request = FeatureRequest::parse(&cli.feature, &params)?;

    let audio = AudioLoader::new()
        .load(&cli.path)
        .with_context(|| format!("loading {}", cli.path.display()))?;
    log::info!(
        "{}: {:.2}s at {} Hz, {} bits",
        cli.path.display(),
        audio.duration_secs(),
        audio.sample_rate,
        audio.sample_width
    );

    let features = FeatureExtractor::new().extract(audio, &request)?;

    if cli.json {
        println!("{}", serde_json::to_string(&features)?);
        return Ok(());
    }

    let (rows, cols) = features.shape();
    let values = match &features {
        Features::Raw(signal) => signal.as_slice(),
        Features::Mfcc(m) | Features::Spectrogram(m) => m.as_slice(),
    };
    let (min, max, mean) = summarize(values);
    println!("feature: {}", request.kind());
    println!("shape:   {rows} x {cols}");
    println!("min:     {min:.4}");
    println!("max:     {max:.4}");
    println!("mean:    {mean:.4}");

    Ok(())
}
