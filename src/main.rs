use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tickstream::align::{self, AlignError, DEFAULT_AMBIGUITY_RATIO};
use tickstream::config::StreamConfig;

/// Recovers sample alignment from a raw serial capture and writes a WAV.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Raw capture recorded straight off the serial link.
    input: PathBuf,

    /// Where to write the aligned audio.
    #[arg(short, long, default_value = "aligned.wav")]
    output: PathBuf,

    /// Write the minimum-energy offset even when the candidates are too
    /// close to call.
    #[arg(long)]
    allow_ambiguous: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = StreamConfig::restore().unwrap_or_default();

    let raw = match std::fs::read(&args.input) {
        Ok(raw) => raw,
        Err(err) => {
            log::error!("could not read {}: {}", args.input.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let (offset, samples) = match align::recover(&raw, DEFAULT_AMBIGUITY_RATIO) {
        Ok(recovered) => (recovered.offset, recovered.samples),
        Err(AlignError::Ambiguous { energies }) if args.allow_ambiguous => {
            let offset = energies
                .iter()
                .enumerate()
                .min_by_key(|&(_, &e)| e)
                .map(|(o, _)| o)
                .unwrap_or(0);

            log::warn!("alignment is ambiguous, forcing offset {}", offset);
            (offset, align::decode_at(&raw, offset))
        }
        Err(err) => {
            log::error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    log::info!("optimal alignment at offset {}", offset);

    if let Err(err) = align::write_wav(&args.output, &samples, config.sample_rate, config.channels)
    {
        log::error!("{}", err);
        return ExitCode::FAILURE;
    }

    println!(
        "Wrote {} samples at {} Hz to {}",
        samples.len(),
        config.sample_rate,
        args.output.display()
    );

    ExitCode::SUCCESS
}
