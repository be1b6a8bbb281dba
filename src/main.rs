use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use linkalign::genomics::{
    AlignmentStatus, ReadPair, ReferenceIndex, SeedPairEngine, SeedSingleAligner,
};
use linkalign::{resolve_barcode, ClusterAligner, ClusterConfig, GrowthPolicy, ProgressTracker};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "linkalign", about = "Barcode-aware cluster aligner for linked reads")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Align barcoded read pairs against a reference.
    Align {
        /// Reference genome (plain FASTA or raw sequence file).
        reference: PathBuf,
        /// Read pairs (`<barcode>\t<pair id>\t<mate 1>\t<mate 2>` per line),
        /// grouped by barcode.
        pairs: PathBuf,
        /// Mates shorter than this are reported NotFound without searching.
        #[arg(long, default_value_t = 50)]
        min_read_length: usize,
        /// Report pairs only as the paired search found them.
        #[arg(long)]
        force_spacing: bool,
        /// Maximum pairs per barcode batch.
        #[arg(long, default_value_t = 1024)]
        max_barcode_size: usize,
        /// Anchors needed before biasing the barcode search.
        #[arg(long, default_value_t = 2)]
        min_pairs_per_cluster: usize,
        /// Widest span treated as one molecule neighbourhood.
        #[arg(long, default_value_t = 100_000)]
        max_cluster_span: u64,
        /// Edit distance above the best hit for secondary alignments.
        #[arg(long, default_value_t = 2)]
        max_edit_distance_for_secondary: u32,
        /// Cap on secondary alignments per read or pair.
        #[arg(long)]
        max_secondary_alignments: Option<usize>,
        /// Seed length for the reference index.
        #[arg(long, default_value_t = 20)]
        seed_len: usize,
        /// Largest distance between mates of a consistent pair.
        #[arg(long, default_value_t = 1_000)]
        max_spacing: u64,
        /// Mismatches allowed per mate.
        #[arg(long, default_value_t = 4)]
        max_k: u32,
        /// Initial secondary buffer capacity per tracker.
        #[arg(long, default_value_t = 4)]
        initial_capacity: usize,
    },
}

/// Index and engine settings for one `align` run.
#[derive(Debug)]
struct AlignRun {
    config: ClusterConfig,
    seed_len: usize,
    max_spacing: u64,
    max_k: u32,
    initial_capacity: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Align {
            reference,
            pairs,
            min_read_length,
            force_spacing,
            max_barcode_size,
            min_pairs_per_cluster,
            max_cluster_span,
            max_edit_distance_for_secondary,
            max_secondary_alignments,
            seed_len,
            max_spacing,
            max_k,
            initial_capacity,
        } => {
            let config = ClusterConfig::default()
                .with_min_read_length(min_read_length)
                .with_force_spacing(force_spacing)
                .with_max_barcode_size(max_barcode_size)
                .with_cluster_shape(min_pairs_per_cluster, max_cluster_span)
                .with_secondary_limits(max_edit_distance_for_secondary, max_secondary_alignments);
            let run = AlignRun {
                config,
                seed_len,
                max_spacing,
                max_k,
                initial_capacity,
            };
            run_align(&reference, &pairs, &run)?
        }
    }

    Ok(())
}

fn run_align(reference_path: &Path, pairs_path: &Path, run: &AlignRun) -> Result<()> {
    let reference = read_sequence_file(reference_path)
        .with_context(|| format!("failed to read reference from {}", reference_path.display()))?;
    let index = Arc::new(
        ReferenceIndex::build(&reference, run.seed_len)
            .context("failed to build reference index")?,
    );
    info!(bases = index.len(), seed_len = run.seed_len, "reference indexed");

    let mut aligner: ClusterAligner<SeedPairEngine, SeedSingleAligner> = ClusterAligner::new(
        run.config.clone(),
        SeedSingleAligner::new(Arc::clone(&index), run.max_k),
    )
    .context("failed to initialize cluster aligner")?;
    let growth = GrowthPolicy::default();

    let barcodes = read_barcoded_pairs(pairs_path)
        .with_context(|| format!("failed to read pairs from {}", pairs_path.display()))?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for (barcode, pairs) in &barcodes {
        for batch in pairs.chunks(run.config.max_barcode_size) {
            let mut trackers: Vec<ProgressTracker<SeedPairEngine>> = batch
                .iter()
                .cloned()
                .map(|pair| {
                    let engine =
                        SeedPairEngine::new(Arc::clone(&index), run.max_spacing, run.max_k);
                    ProgressTracker::new(pair, engine, run.initial_capacity, run.initial_capacity)
                })
                .collect();

            aligner.cache_mut().clear();
            let summary = resolve_barcode(&mut aligner, &mut trackers, &growth)
                .with_context(|| format!("barcode {barcode} did not resolve"))?;
            info!(
                barcode = barcode.as_str(),
                pairs = trackers.len(),
                invocations = summary.invocations,
                buffer_growths = summary.buffer_growths,
                "barcode aligned"
            );

            for tracker in &trackers {
                write_result(&mut out, barcode, tracker)?;
            }
        }
    }
    out.flush()?;

    Ok(())
}

fn write_result<W: Write>(
    out: &mut W,
    barcode: &str,
    tracker: &ProgressTracker<SeedPairEngine>,
) -> Result<()> {
    let result = tracker.result();
    write!(out, "{}\t{}", barcode, tracker.pair().id)?;
    for mate in 0..2 {
        let status = match result.status[mate] {
            AlignmentStatus::Found => "found",
            AlignmentStatus::NotFound => "unmapped",
        };
        write!(
            out,
            "\t{}\t{}\t{}\t{}\t{}",
            status,
            result.location[mate],
            result.direction[mate].symbol(),
            result.score[mate],
            result.mapq[mate]
        )?;
    }
    writeln!(
        out,
        "\tpaired={}\tsecondary={}",
        result.aligned_as_pair,
        tracker.paired_secondary().results().len()
    )?;
    Ok(())
}

fn read_sequence_file(path: &Path) -> Result<Vec<u8>> {
    let contents = std::fs::read_to_string(path)?;
    let sequence: String = contents
        .lines()
        .filter(|line| !line.starts_with('>') && !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("");
    Ok(sequence.trim().to_ascii_uppercase().into_bytes())
}

/// Consecutive lines sharing a barcode form one group.
fn read_barcoded_pairs(path: &Path) -> Result<Vec<(String, Vec<ReadPair>)>> {
    let reader = BufReader::new(File::open(path)?);
    let mut groups: Vec<(String, Vec<ReadPair>)> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line.split('\t');
        let mut next_field = |name: &str| {
            fields
                .next()
                .map(str::trim)
                .ok_or_else(|| anyhow::anyhow!("missing {} on line {}", name, line_no + 1))
        };
        let barcode = next_field("barcode")?;
        let pair_id = next_field("pair id")?;
        let mate1 = next_field("mate 1")?.to_ascii_uppercase().into_bytes();
        let mate2 = next_field("mate 2")?.to_ascii_uppercase().into_bytes();
        let pair = ReadPair::new(pair_id, mate1, mate2);

        match groups.last_mut() {
            Some((current, pairs)) if current.as_str() == barcode => pairs.push(pair),
            _ => groups.push((barcode.to_string(), vec![pair])),
        }
    }

    Ok(groups)
}
