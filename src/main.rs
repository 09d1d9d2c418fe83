use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facematch::{config, matcher, records, Cluster, MatchPolicy, Verifier};
use log::{info, warn};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "facematch")]
#[command(
    version,
    about = "Face descriptor verification, recognition and grouping"
)]
struct Cli {
    /// Config file (defaults to the system-wide location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a live face against an enrolled reference
    Verify {
        /// Record file whose first face is the reference
        reference: PathBuf,
        /// Record file whose first face is the probe
        probe: PathBuf,
        /// Maximum distance for a match
        #[arg(short, long)]
        threshold: Option<f32>,
    },
    /// Label every probe face with its closest gallery entry
    Match {
        /// Record file of labeled faces (source = label)
        gallery: PathBuf,
        /// Record file of faces to recognize
        probes: PathBuf,
        #[arg(short, long)]
        threshold: Option<f32>,
        /// Score each label by its mean distance instead of its closest exemplar
        #[arg(long)]
        mean: bool,
    },
    /// Group faces of the same person
    Group {
        /// Record file of faces to group
        items: PathBuf,
        #[arg(short, long)]
        threshold: Option<f32>,
    },
    /// Open config file in editor
    Config,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Verify {
            reference,
            probe,
            threshold,
        } => verify(
            &reference,
            &probe,
            threshold.unwrap_or(cfg.verify_threshold),
            cli.json,
        ),
        Commands::Match {
            gallery,
            probes,
            threshold,
            mean,
        } => {
            let policy = if mean {
                MatchPolicy::MeanDistance
            } else {
                cfg.match_policy
            };
            recognize(
                &gallery,
                &probes,
                threshold.unwrap_or(cfg.match_threshold),
                policy,
                cli.json,
            )
        }
        Commands::Group { items, threshold } => {
            group(&items, threshold.unwrap_or(cfg.group_threshold), cli.json)
        }
        Commands::Config => open_config(cli.config.as_deref()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn verify(reference: &Path, probe: &Path, threshold: f32, json: bool) -> Result<()> {
    let reference = records::load_first(reference).context("Failed to load reference face")?;
    let probe = records::load_first(probe).context("Failed to load probe face")?;
    info!(
        "Verifying {} against reference {}",
        probe.source, reference.source
    );

    let verifier = Verifier::new(reference.descriptor, threshold);
    let result = verifier
        .check(&probe.descriptor)
        .context("Failed to compare faces")?;

    if json {
        print_json(&result)?;
    } else {
        println!(
            "Distance: {:.4} (threshold: {:.3})",
            result.distance, threshold
        );
        println!("Similarity score: {:.2}%", result.score);
        println!("Match: {}%", result.percent());
    }

    if result.is_match {
        info!("✓ Face verified");
        Ok(())
    } else {
        anyhow::bail!("Verification failed: faces do not match")
    }
}

#[derive(Serialize)]
struct Recognized<'a> {
    source: &'a str,
    result: &'a facematch::MatchResult,
}

fn recognize(
    gallery: &Path,
    probes: &Path,
    threshold: f32,
    policy: MatchPolicy,
    json: bool,
) -> Result<()> {
    let enrolled = records::load_records(gallery).context("Failed to load gallery")?;
    let gallery = matcher::build_gallery(&enrolled, policy)?;
    if gallery.is_empty() {
        warn!("Gallery is empty; every face will be unknown");
    }
    info!("Gallery has {} known face(s)", gallery.len());

    let probes = records::load_records(probes).context("Failed to load probe faces")?;
    let descriptors: Vec<_> = probes.iter().map(|r| r.descriptor.clone()).collect();
    let results = gallery
        .recognize_all(&descriptors, threshold)
        .context("Failed to match faces")?;

    if json {
        let out: Vec<_> = probes
            .iter()
            .zip(&results)
            .map(|(probe, result)| Recognized {
                source: &probe.source,
                result,
            })
            .collect();
        return print_json(&out);
    }

    for (probe, result) in probes.iter().zip(&results) {
        println!("{}: {}", probe.source, result);
    }
    let known = results.iter().filter(|r| r.is_match()).count();
    info!("Recognized {}/{} face(s)", known, results.len());
    Ok(())
}

#[derive(Serialize)]
struct Group<'a> {
    representative: &'a str,
    members: Vec<&'a str>,
}

fn group(items: &Path, threshold: f32, json: bool) -> Result<()> {
    let faces = records::load_records(items).context("Failed to load faces")?;
    let total = faces.len();
    let clusters: Vec<Cluster<String>> =
        matcher::group_records(faces, threshold).context("Failed to group faces")?;

    if json {
        let out: Vec<_> = clusters
            .iter()
            .map(|c| Group {
                representative: &c.representative().source,
                members: c.sources().map(String::as_str).collect(),
            })
            .collect();
        return print_json(&out);
    }

    for (index, cluster) in clusters.iter().enumerate() {
        println!("Group {} ({} faces)", index + 1, cluster.len());
        for source in cluster.sources() {
            println!("  {}", source);
        }
    }
    info!("Grouped {} face(s) into {} group(s)", total, clusters.len());
    Ok(())
}

fn open_config(path: Option<&Path>) -> Result<()> {
    let config_path = path.unwrap_or(&config::CONFIG_PATH).as_os_str();
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("Opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}
