//! mvprep - prepare multi-view labeled datasets
//!
//! Generates synthetic datasets, filters them down to frequent classes and
//! applies the label-stratified shuffle.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use multiview_prep::{
    frequency_table, prepare, ClassId, Float, FrequencyFilter, Labels, MultiView,
    MultiViewDataset, PrepareConfig,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

#[derive(Parser)]
#[command(name = "mvprep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a synthetic labeled dataset with Gaussian features
    Generate {
        /// Output path (.json for JSON, bincode otherwise)
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, default_value = "2")]
        views: usize,

        #[arg(long, default_value = "100")]
        entities: usize,

        /// Shape of one feature record, e.g. `--features 4 --features 4`
        #[arg(long, default_values_t = vec![8usize])]
        features: Vec<usize>,

        #[arg(long, default_value = "5")]
        classes: ClassId,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Filter a dataset to its frequent classes and shuffle it
    Prepare {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// JSON configuration, flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        min_count: Option<usize>,

        /// Class ids to drop regardless of their frequency
        #[arg(long)]
        exclude: Vec<ClassId>,

        /// Keep every class
        #[arg(long)]
        no_filter: bool,

        #[arg(long)]
        no_shuffle: bool,

        /// Shuffle views on all cores
        #[arg(long)]
        parallel: bool,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print class frequencies and the classes passing a threshold
    Frequent {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long, default_value = "40")]
        min_count: usize,

        #[arg(long)]
        exclude: Vec<ClassId>,
    },
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn cmd_generate(
    output: &Path,
    views: usize,
    entities: usize,
    features: &[usize],
    classes: ClassId,
    seed: Option<u64>,
) -> Result<()> {
    anyhow::ensure!(classes > 0, "--classes must be positive");

    let mut rng = rng_from(seed);
    let labels: Vec<ClassId> = (0..entities).map(|_| rng.gen_range(0..classes)).collect();

    // shift every class by its id so the views carry some signal
    let mut x = MultiView::random_normal(views, entities, features, &mut rng);
    for v in 0..views {
        for (e, &label) in labels.iter().enumerate() {
            for w in x.row_mut(v, e) {
                *w += label as Float;
            }
        }
    }

    let dataset = MultiViewDataset::new(x, Labels::from(labels))?;
    dataset
        .save(output)
        .with_context(|| format!("writing {}", output.display()))?;
    info!(
        "wrote {entities} entities of {views} views to {}",
        output.display()
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_prepare(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    min_count: Option<usize>,
    exclude: &[ClassId],
    no_filter: bool,
    no_shuffle: bool,
    parallel: bool,
    seed: Option<u64>,
) -> Result<()> {
    let mut config = match config {
        Some(path) => PrepareConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => PrepareConfig::default(),
    };

    if no_filter {
        anyhow::ensure!(
            min_count.is_none() && exclude.is_empty(),
            "--no-filter cannot be combined with --min-count or --exclude"
        );
        config.filter = None;
    } else {
        config.override_filter(min_count, exclude);
    }
    if no_shuffle {
        config.shuffle = false;
    }
    config.parallel |= parallel;
    if seed.is_some() {
        config.seed = seed;
    }

    let mut dataset = MultiViewDataset::load(input)
        .with_context(|| format!("loading {}", input.display()))?;
    let mut rng = rng_from(config.seed);

    if let Some(frequent) = prepare(&mut dataset, &config, &mut rng)? {
        println!("frequent classes: {:?}", frequent.classes);
    }
    println!("entities: {}", dataset.len());

    dataset
        .save(output)
        .with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

fn cmd_frequent(input: &Path, min_count: usize, exclude: &[ClassId]) -> Result<()> {
    let dataset = MultiViewDataset::load(input)
        .with_context(|| format!("loading {}", input.display()))?;

    for (class, count) in frequency_table(dataset.y()) {
        println!("{class}\t{count}");
    }

    let mut filter = FrequencyFilter::new(min_count);
    for &class in exclude {
        filter = filter.exclude(class);
    }
    let frequent = filter.apply(dataset.y());
    println!(
        "{} classes with at least {min_count} entities: {:?}",
        frequent.classes.len(),
        frequent.classes
    );
    println!("{} of {} entities kept", frequent.indices.len(), dataset.len());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate {
            output,
            views,
            entities,
            features,
            classes,
            seed,
        } => cmd_generate(&output, views, entities, &features, classes, seed),

        Commands::Prepare {
            input,
            output,
            config,
            min_count,
            exclude,
            no_filter,
            no_shuffle,
            parallel,
            seed,
        } => cmd_prepare(
            &input,
            &output,
            config.as_deref(),
            min_count,
            &exclude,
            no_filter,
            no_shuffle,
            parallel,
            seed,
        ),

        Commands::Frequent {
            input,
            min_count,
            exclude,
        } => cmd_frequent(&input, min_count, &exclude),
    }
}
