use anyhow::{Context as _, bail};
use clap::{Args, Parser, Subcommand};
use cubefield_packer::{PackConfig, generate, validate};
use cubefield_render::{
    CubeScene, DebugTextRenderer, RenderView, Renderer, RotationAnimator, format_count,
};
use cubefield_stream::{PackingWorker, WorkerEvent};
use std::io::Write as _;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cubefield-cli", about = "Headless cube field packing")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PackArgs {
    /// Number of placements
    #[arg(short = 'n', long, default_value_t = cubefield_common::N)]
    count: usize,
    /// Smallest radius, also the minimum gap
    #[arg(long, default_value_t = cubefield_common::MIN_R)]
    min_radius: f32,
    /// Largest radius
    #[arg(long, default_value_t = cubefield_common::MAX_R)]
    max_radius: f32,
    /// Placements per batch
    #[arg(long, default_value_t = cubefield_common::N_PER_CHUNK)]
    batch_size: usize,
    /// RNG seed for a reproducible run
    #[arg(short, long)]
    seed: Option<u64>,
    /// Consecutive rejected samples before giving up (0 = never)
    #[arg(long, default_value_t = cubefield_packer::DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u64,
}

impl PackArgs {
    fn config(&self) -> PackConfig {
        PackConfig {
            target_count: self.count,
            min_radius: self.min_radius,
            max_radius: self.max_radius,
            batch_size: self.batch_size,
            max_attempts: (self.max_attempts > 0).then_some(self.max_attempts),
            seed: self.seed,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and default configuration
    Info,
    /// Run the packer on a worker thread and verify the result
    Pack {
        #[command(flatten)]
        args: PackArgs,
        /// Print every batch message as a JSON line on stdout
        #[arg(long)]
        json: bool,
    },
    /// Pack, build the cube scene, and print it as text
    Preview {
        #[command(flatten)]
        args: PackArgs,
        /// Cubes listed individually
        #[arg(long, default_value = "16")]
        max_instances: usize,
        /// Animation time in milliseconds at which to sample the field rotation
        #[arg(long, default_value = "0")]
        at_ms: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            let config = PackConfig::default();
            println!("cubefield-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "defaults: count={} radius=[{}, {}] batch_size={} batches={}",
                config.target_count,
                config.min_radius,
                config.max_radius,
                config.batch_size,
                config.batch_count()
            );
            if let Some(cap) = config.max_attempts {
                println!("attempt cap: {}", format_count(cap));
            }
        }
        Commands::Pack { args, json } => pack(&args, json)?,
        Commands::Preview {
            args,
            max_instances,
            at_ms,
        } => preview(&args, max_instances, at_ms)?,
    }

    Ok(())
}

fn pack(args: &PackArgs, json: bool) -> anyhow::Result<()> {
    let config = args.config();
    let (min_radius, max_radius) = (config.min_radius, config.max_radius);
    let mut worker = PackingWorker::spawn(config).context("invalid pack configuration")?;
    worker.start()?;

    let started = Instant::now();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut placements = Vec::with_capacity(args.count);
    let mut batches = 0usize;

    let outcome = loop {
        match worker.recv()? {
            WorkerEvent::Batch(msg) => {
                if json {
                    serde_json::to_writer(&mut out, &msg)?;
                    writeln!(out)?;
                }
                placements.extend(msg.placements()?);
                batches += 1;
            }
            WorkerEvent::Done { n, tests_n } => break Ok((n, tests_n)),
            WorkerEvent::Failed(e) => break Err(e),
        }
    };
    worker.join()?;
    let elapsed = started.elapsed();

    let report = validate(&placements, min_radius, max_radius);
    eprintln!("{report}");

    let (n, tests_n) = match outcome {
        Ok(totals) => totals,
        Err(e) => bail!("packing stopped after {} placements: {e}", placements.len()),
    };
    eprintln!(
        "{} cubes, {} tests, {batches} batches in {:.2?}",
        format_count(n as u64),
        format_count(tests_n),
        elapsed
    );

    if !report.is_valid() {
        bail!("packing invariants violated");
    }
    Ok(())
}

fn preview(args: &PackArgs, max_instances: usize, at_ms: u64) -> anyhow::Result<()> {
    let config = args.config();
    let capacity = config.target_count;
    let seed = config.seed;

    let mut scene = match seed {
        Some(seed) => CubeScene::with_seed(capacity, seed),
        None => CubeScene::new(capacity),
    };
    for batch in generate(config)? {
        let batch = batch?;
        scene.ingest(&batch.placements);
        scene.set_totals(batch.n, batch.tests_n);
    }

    let mut animator = match seed {
        Some(seed) => RotationAnimator::with_seed(seed),
        None => RotationAnimator::new(),
    };
    // Sample in 100 ms steps, the way a frame loop would.
    let end = Duration::from_millis(at_ms);
    let mut t = Duration::ZERO;
    while t < end {
        animator.update(t);
        t += Duration::from_millis(100);
    }
    scene.set_rotation(animator.update(end));

    let renderer = DebugTextRenderer { max_instances };
    print!("{}", renderer.render(&scene, &RenderView::default()));
    println!("{}", scene.status_text());
    Ok(())
}
