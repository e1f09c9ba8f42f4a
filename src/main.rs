// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{crate_version, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mixdown::config::{presets, MixSource, Pattern};
use mixdown::pitch::RenderSession;
use mixdown::render::{get_backend, BitDepth, OutputFormat, Renderer};
use mixdown::samples::{SampleResolver, VariantPolicy};
use mixdown::timeline::Timeline;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Renders step-sequenced patterns into mixed audio files."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Renders a pattern to an audio file and/or per-track stems.
    Render {
        /// The path to the pattern document.
        pattern: PathBuf,
        /// The samples directory.
        #[arg(short, long)]
        samples: PathBuf,
        /// The file to write the full mix to.
        #[arg(short, long, required_unless_present = "stems")]
        out: Option<PathBuf>,
        /// A built-in mix preset name or the path to a mix file.
        #[arg(short, long)]
        mix: Option<String>,
        /// A directory to write one file per track to.
        #[arg(long)]
        stems: Option<PathBuf>,
        /// The output sample rate.
        #[arg(long, default_value_t = 44100)]
        sample_rate: u32,
        /// The output bit depth (16 or 24).
        #[arg(long, default_value = "16")]
        bit_depth: BitDepth,
        /// The ffmpeg binary to render with. Names starting with "mock" render nothing.
        #[arg(long, default_value = "ffmpeg")]
        ffmpeg: String,
        /// Always use this variant number for pitched instruments.
        #[arg(long, conflicts_with = "seed")]
        variant: Option<u32>,
        /// Pick pitched instrument variants pseudo-randomly from this seed.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Lists the built-in mix presets.
    Presets {},
    /// Lists and classifies the samples in the given directory.
    Samples {
        /// The samples directory.
        path: PathBuf,
    },
    /// Prints the playback events of a pattern as JSON.
    Timeline {
        /// The path to the pattern document.
        pattern: PathBuf,
        /// The samples directory.
        #[arg(short, long)]
        samples: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            pattern,
            samples,
            out,
            mix,
            stems,
            sample_rate,
            bit_depth,
            ffmpeg,
            variant,
            seed,
        } => {
            let variant_policy = match (variant, seed) {
                (Some(variant), _) => VariantPolicy::Fixed(variant),
                (None, Some(seed)) => VariantPolicy::Seeded(seed),
                (None, None) => VariantPolicy::First,
            };
            let mix = mix.map(|mix| MixSource::parse(&mix).load()).transpose()?;
            let pattern = Pattern::from_file(&pattern)?;
            let resolver = SampleResolver::new(&samples)?.with_variant_policy(variant_policy);

            let renderer = Renderer::new(
                get_backend(&ffmpeg),
                OutputFormat::new(sample_rate, bit_depth)?,
            );
            let session = RenderSession::new();
            let result = render(
                &renderer,
                &session,
                &pattern,
                &resolver,
                mix.as_ref(),
                out.as_deref(),
                stems.as_deref(),
            )
            .await;
            session.cleanup();
            result?;
        }
        Commands::Presets {} => {
            println!("Presets:");
            for name in presets::names() {
                println!("- {}", name);
            }
        }
        Commands::Samples { path } => {
            let resolver = SampleResolver::new(&path)?;
            let scanned = resolver.scan();
            if scanned.is_empty() {
                println!("No samples found in {}.", path.display());
                return Ok(());
            }

            println!("Samples (count: {}):", scanned.len());
            for sample in scanned {
                println!("- {}", sample);
            }
        }
        Commands::Timeline { pattern, samples } => {
            let pattern = Pattern::from_file(&pattern)?;
            let resolver = SampleResolver::new(&samples)?;
            let timeline = Timeline::build(&pattern, &resolver)?;
            println!("{}", serde_json::to_string_pretty(&timeline)?);
        }
    }

    Ok(())
}

/// Renders the mix and the stems that were asked for, printing each report as JSON.
async fn render(
    renderer: &Renderer,
    session: &RenderSession,
    pattern: &Pattern,
    resolver: &SampleResolver,
    mix: Option<&mixdown::config::MixConfig>,
    out: Option<&Path>,
    stems: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    if let Some(out) = out {
        let report = renderer
            .render(session, pattern, resolver, mix, out)
            .await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    if let Some(dir) = stems {
        let reports = renderer
            .render_stems(session, pattern, resolver, mix, dir)
            .await?;
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(())
}
