use {
    crate::{
        agents::DDPG,
        components::ReplayBuffer,
        configs::{
            DdpgConfig,
            TrainConfig,
        },
        engines::{
            EpisodeController,
            FileCheckpointStore,
            MetricSink,
            ParquetSink,
            Phase,
            TracingSink,
        },
        envs::{
            DiffDriveConfig,
            DiffDriveEnv,
        },
        logging::setup_logging,
        util::{
            read_config,
            write_config,
        },
        RunMode,
    },
    anyhow::Result,
    candle_core::Device,
    clap::{
        Parser,
        ValueEnum,
    },
    rand::{
        rngs::StdRng,
        SeedableRng,
    },
    serde::{
        de::DeserializeOwned,
        Serialize,
    },
    std::path::{
        Path,
        PathBuf,
    },
    tracing::{
        warn,
        Level,
    },
};


#[derive(ValueEnum, Debug, Clone)]
pub enum DeviceArg {
    Cpu,
    Cuda,
}
impl DeviceArg {
    pub fn device(&self) -> Result<Device> {
        Ok(match self {
            DeviceArg::Cpu => Device::Cpu,
            DeviceArg::Cuda => Device::new_cuda(0)?,
        })
    }
}

#[derive(ValueEnum, Debug, Clone)]
pub enum Loglevel {
    Error, // put these only during active debugging and then downgrade later
    Warn,  // main events in the program
    Info,  // all the little details
    None,  // don't log anything
}
impl Loglevel {
    pub fn level(&self) -> Option<Level> {
        match self {
            Loglevel::Error => Some(Level::ERROR),
            Loglevel::Warn => Some(Level::WARN),
            Loglevel::Info => Some(Level::INFO),
            Loglevel::None => None,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The device to run the networks on.
    #[arg(long, value_enum, default_value_t=DeviceArg::Cpu)]
    pub device: DeviceArg,

    /// Setup logging
    #[arg(long, value_enum, default_value_t=Loglevel::None)]
    pub log: Loglevel,

    /// RON file with the learner configuration.
    #[arg(long)]
    pub alg_config: Option<PathBuf>,

    /// RON file with the episode loop configuration.
    #[arg(long)]
    pub train_config: Option<PathBuf>,

    /// RON file with the simulated robot configuration.
    #[arg(long)]
    pub env_config: Option<PathBuf>,

    /// Name of the experiment; configs and logs go to `data/<name>/`.
    #[arg(long, default_value = "stage_1")]
    pub name: String,

    /// Load the checkpoint of this episode before running.
    #[arg(long)]
    pub resume: Option<usize>,

    /// Only evaluate: no storing, no training, no checkpoints.
    #[arg(long)]
    pub test: bool,

    /// Directory to write every emitted scalar to, as Parquet part files.
    #[arg(long)]
    pub metrics: Option<PathBuf>,

    /// Scalars buffered before a part file is written.
    #[arg(long, default_value_t = 100_000)]
    pub metrics_chunk: usize,
}

fn config_or_default<C: DeserializeOwned + Default>(path: &Option<PathBuf>) -> Result<C> {
    Ok(match path {
        Some(path) => read_config(path)?,
        None => C::default(),
    })
}

fn record_config<C: Serialize>(
    config: &C,
    path: PathBuf,
    reuse: bool,
) -> Result<()> {
    if reuse && path.try_exists()? {
        warn!("Keeping existing {path:?}");
        return Ok(());
    }
    write_config(config, path)?;
    Ok(())
}

/// Set up logging, read the configs, record them next to the logs and run
/// the episode loop on the simulated robot.
pub fn run(args: Args) -> Result<()> {
    let dir = Path::new("data/").join(&args.name);

    let alg_config: DdpgConfig = config_or_default(&args.alg_config)?;
    let env_config: DiffDriveConfig = config_or_default(&args.env_config)?;
    let mut train_config: TrainConfig = config_or_default(&args.train_config)?;
    if args.resume.is_some() {
        train_config.resume_episode = args.resume;
    }
    if args.test {
        train_config.run_mode = RunMode::Test;
    }

    // a resumed or evaluation run reuses the directory of the run it continues
    let reuse = train_config.resume_episode.is_some() || train_config.run_mode == RunMode::Test;
    setup_logging(
        &dir.join("debug.log"),
        args.log.level(),
        args.log.level(),
        reuse,
    )?;
    let device = args.device.device()?;

    std::fs::create_dir_all(&dir)?;
    record_config(&alg_config, dir.join("config_algorithm.ron"), reuse)?;
    record_config(&env_config, dir.join("config_environment.ron"), reuse)?;
    record_config(&train_config, dir.join("config_training.ron"), reuse)?;

    let env = DiffDriveEnv::new(env_config)?;
    match &args.metrics {
        Some(path) => {
            let sink = ParquetSink::new(path, args.metrics_chunk)?;
            let mut metrics = run_with(env, alg_config, train_config, sink, &device)?;
            metrics.flush()?;
            warn!("Metrics written to {path:?}");
        }
        None => {
            run_with(env, alg_config, train_config, TracingSink, &device)?;
        }
    }
    Ok(())
}

fn run_with<M: MetricSink>(
    mut env: DiffDriveEnv,
    alg_config: DdpgConfig,
    train_config: TrainConfig,
    metrics: M,
    device: &Device,
) -> Result<M> {
    let rng = match train_config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let buffer = ReplayBuffer::new(alg_config.replay_buffer_capacity)?;
    let store = FileCheckpointStore::new(&train_config.checkpoint_dir);
    let trainer = DDPG::new(alg_config, metrics, device)?;

    let mut controller = EpisodeController::new(train_config, trainer, buffer, store, rng)?;
    let summaries = controller.run(&mut env)?;

    let evaluations: Vec<f64> = summaries
        .iter()
        .filter(|s| s.phase == Phase::Evaluate)
        .map(|s| s.total_reward)
        .collect();
    if let Some(last) = evaluations.last() {
        warn!("{} evaluation episodes, last reward {last}", evaluations.len());
    }

    let (trainer, _, _) = controller.into_parts();
    Ok(trainer.into_metrics())
}
