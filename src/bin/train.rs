#![recursion_limit = "256"]

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use burn::optim::AdamConfig;
use burn::tensor::backend::AutodiffBackend;
use clap::{Parser, ValueEnum};

use ml_othello::ai::{ModelVariant, MoveModel};
use ml_othello::checkpoint::CheckpointManager;
use ml_othello::config::AppConfig;
use ml_othello::data::{jsonl, DataLoader, Sample};
use ml_othello::training::{Trainer, TrainingOutcome};

/// Train a next-move predictor on recorded board games.
#[derive(Parser)]
#[command(name = "train", about = "Train an Othello next-move network")]
struct Cli {
    /// Network family to train
    #[arg(long, value_enum, default_value_t = ModelArg::Mlp)]
    model: ModelArg,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Training samples (JSON lines)
    #[arg(long, required_unless_present = "print_default_config")]
    train: Option<PathBuf>,

    /// Dev samples used for model selection (JSON lines)
    #[arg(long, required_unless_present = "print_default_config")]
    dev: Option<PathBuf>,

    /// Override number of epochs
    #[arg(long)]
    epochs: Option<usize>,

    /// Override learning rate
    #[arg(long)]
    lr: Option<f64>,

    /// Override batch size
    #[arg(long)]
    batch_size: Option<usize>,

    /// Override early-stopping patience
    #[arg(long)]
    early_stopping: Option<usize>,

    /// Override checkpoint base path
    #[arg(long)]
    save_path: Option<PathBuf>,

    /// Compute backend
    #[arg(long, value_enum, default_value_t = BackendArg::Cpu)]
    backend: BackendArg,

    /// Hide progress bars
    #[arg(long)]
    quiet: bool,

    /// Log per-batch detail
    #[arg(long)]
    debug: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_default_config: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ModelArg {
    Mlp,
    Lstm,
    Cnn,
}

impl From<ModelArg> for ModelVariant {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Mlp => ModelVariant::Mlp,
            ModelArg::Lstm => ModelVariant::Lstm,
            ModelArg::Cnn => ModelVariant::Cnn,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum BackendArg {
    Cpu,
    Gpu,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_default_config {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let log_level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Load configuration
    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Apply CLI overrides
    if let Some(epochs) = cli.epochs {
        app_config.training.num_epochs = epochs;
    }
    if let Some(lr) = cli.lr {
        app_config.training.learning_rate = lr;
    }
    if let Some(batch_size) = cli.batch_size {
        app_config.data.batch_size = batch_size;
    }
    if let Some(patience) = cli.early_stopping {
        app_config.training.early_stopping = patience;
    }
    if let Some(path) = &cli.save_path {
        app_config.path_save = path.clone();
    }
    if cli.quiet {
        app_config.training.show_progress = false;
    }
    app_config.validate().context("invalid configuration")?;

    let (Some(train_path), Some(dev_path)) = (&cli.train, &cli.dev) else {
        bail!("--train and --dev are required");
    };
    let train = load_split(train_path, app_config.board_size)?;
    let dev = load_split(dev_path, app_config.board_size)?;

    match cli.backend {
        BackendArg::Cpu => {
            let device = Default::default();
            run::<Autodiff<NdArray>>(cli.model.into(), &app_config, train, dev, device)
        }
        BackendArg::Gpu => run_gpu(cli.model.into(), &app_config, train, dev),
    }
}

#[cfg(feature = "wgpu")]
fn run_gpu(
    variant: ModelVariant,
    config: &AppConfig,
    train: Vec<Sample>,
    dev: Vec<Sample>,
) -> Result<()> {
    use burn::backend::wgpu::{Wgpu, WgpuDevice};
    run::<Autodiff<Wgpu>>(variant, config, train, dev, WgpuDevice::default())
}

#[cfg(not(feature = "wgpu"))]
fn run_gpu(_: ModelVariant, _: &AppConfig, _: Vec<Sample>, _: Vec<Sample>) -> Result<()> {
    bail!("this binary was built without GPU support; rebuild with `--features wgpu`")
}

fn load_split(path: &Path, board_size: usize) -> Result<Vec<Sample>> {
    let samples = jsonl::read_samples(path, board_size)
        .with_context(|| format!("loading samples from {}", path.display()))?;
    log::info!("loaded {} samples from {}", samples.len(), path.display());
    Ok(samples)
}

/// Build the requested network on backend `B` and train it.
fn run<B: AutodiffBackend>(
    variant: ModelVariant,
    config: &AppConfig,
    train: Vec<Sample>,
    dev: Vec<Sample>,
    device: B::Device,
) -> Result<()> {
    match variant {
        ModelVariant::Mlp => {
            let model = config.mlp_network().init::<B>(&device);
            train_model(variant, model, config, train, dev, &device)
        }
        ModelVariant::Lstm => {
            let model = config.lstm_network().init::<B>(&device);
            train_model(variant, model, config, train, dev, &device)
        }
        ModelVariant::Cnn => {
            let model = config.cnn_network()?.init::<B>(&device);
            train_model(variant, model, config, train, dev, &device)
        }
    }
}

fn train_model<B, M>(
    variant: ModelVariant,
    model: M,
    config: &AppConfig,
    train: Vec<Sample>,
    dev: Vec<Sample>,
    device: &B::Device,
) -> Result<()>
where
    B: AutodiffBackend,
    M: MoveModel<B> + AutodiffModule<B>,
    M::InnerModule: MoveModel<B::InnerBackend>,
{
    let batch_size = config.data.batch_size;
    let seq_len = config.len_input_seq;
    let mut train = DataLoader::new(train, batch_size, config.board_size, seq_len)?;
    if config.data.shuffle {
        train = train.with_shuffle(config.data.seed);
    }
    let mut dev = DataLoader::new(dev, batch_size, config.board_size, seq_len)?;

    let checkpoints = CheckpointManager::for_variant(&config.path_save, variant);
    let trainer = Trainer::new(config.training.clone(), checkpoints);
    let mut optimizer = AdamConfig::new().init::<B, M>();

    let outcome: TrainingOutcome<M> = trainer
        .run::<B, M, _>(model, &mut optimizer, &mut train, &mut dev, device)
        .with_context(|| format!("training {variant} model"))?;

    let history_path = trainer
        .checkpoints()
        .write_history(&outcome.history)
        .context("writing training history")?;
    log::info!("history written to {}", history_path.display());

    println!("{}", outcome.final_report);
    println!(
        "Best epoch: {} (dev weighted recall {:.3}%, recomputed {:.3}%)",
        outcome.best_epoch,
        100.0 * outcome.best_dev_score,
        100.0 * outcome.final_report.weighted_recall()
    );
    println!(
        "Checkpoint: {}",
        trainer.checkpoints().checkpoint_path(outcome.best_epoch).display()
    );
    Ok(())
}
