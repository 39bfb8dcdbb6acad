use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use xxhash_rust::xxh3::xxh3_64;

use bp128_cli::{init_logging, verbosity_level};
use bp128_codecs::packer_for;
use bp128_core::batch::{decode_blocks, encode_blocks, payload_bytes, split_blocks};
use bp128_core::format::MAX_PACKED_BYTES;
use bp128_core::{Backend, Block, PackConfig, PackMode, WidthPolicy, BLOCK_LEN, MAX_BIT_WIDTH};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "bp128",
    about = "Bit-plane packing of 128-integer blocks: analyze, verify and benchmark",
    version
)]
struct Cli {
    /// JSON file with a PackConfig; flags override its fields
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Plain,
    Delta,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Auto,
    Scalar,
    Simd,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Verify,
    Trust,
}

#[derive(clap::Args)]
struct PackArgs {
    /// Transform applied before packing
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,
    /// Predecessor of the first value in delta mode
    #[arg(long)]
    offset: Option<u32>,
    /// Packer implementation
    #[arg(short, long, value_enum)]
    backend: Option<BackendArg>,
    /// Pack every block at this bit width instead of the analyzed one
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=32))]
    width: Option<u8>,
    /// How --width is checked against each block
    #[arg(long, value_enum)]
    width_policy: Option<PolicyArg>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report bit widths and packed size for a file of little-endian u32 values
    Analyze {
        /// Source file ("-" reads stdin)
        input: PathBuf,
        #[command(flatten)]
        pack: PackArgs,
        /// Print how many blocks need each bit width
        #[arg(long)]
        histogram: bool,
    },
    /// Pack and unpack every full block of a file and check the result
    Verify {
        /// Source file ("-" reads stdin)
        input: PathBuf,
        #[command(flatten)]
        pack: PackArgs,
    },
    /// Measure pack / unpack throughput on synthetic sorted data
    Bench {
        /// Number of 128-value blocks to generate
        #[arg(short = 'n', long, default_value_t = 100_000)]
        blocks: usize,
        /// Fixed random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Packer implementation
        #[arg(short, long, value_enum)]
        backend: Option<BackendArg>,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> anyhow::Result<PackConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {:?}", path))?;
            let config: PackConfig = serde_json::from_str(&text)
                .with_context(|| format!("parsing config file {:?}", path))?;
            log::info!("loaded config from {:?}", path);
            Ok(config)
        }
        None => Ok(PackConfig::default()),
    }
}

fn backend_of(arg: BackendArg) -> Backend {
    match arg {
        BackendArg::Auto => Backend::Auto,
        BackendArg::Scalar => Backend::Scalar,
        BackendArg::Simd => Backend::Simd,
    }
}

impl PackArgs {
    fn apply(&self, config: &mut PackConfig) {
        if let Some(mode) = self.mode {
            config.mode = match mode {
                ModeArg::Plain => PackMode::Plain,
                ModeArg::Delta => PackMode::Delta,
            };
        }
        if let Some(offset) = self.offset {
            config.initial_offset = offset;
        }
        if let Some(backend) = self.backend {
            config.backend = backend_of(backend);
        }
        if let Some(width) = self.width {
            config.bit_width = Some(width);
        }
        if let Some(policy) = self.width_policy {
            config.width_policy = match policy {
                PolicyArg::Verify => WidthPolicy::Verify,
                PolicyArg::Trust => WidthPolicy::Trust,
            };
        }
    }
}

fn read_values(input: &Path) -> anyhow::Result<Vec<u32>> {
    let bytes = if input.to_str() == Some("-") {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf)?;
        buf
    } else {
        let mut file =
            File::open(input).with_context(|| format!("opening input file {:?}", input))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        buf
    };
    if bytes.len() % 4 != 0 {
        anyhow::bail!(
            "input is {} bytes, not a whole number of u32 values",
            bytes.len()
        );
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn blocks_to_bytes(blocks: &[Block]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(blocks.len() * BLOCK_LEN * 4);
    for v in blocks.iter().flatten() {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn mode_name(mode: PackMode) -> &'static str {
    match mode {
        PackMode::Plain => "plain",
        PackMode::Delta => "delta",
    }
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_analyze(input: PathBuf, config: PackConfig, histogram: bool) -> anyhow::Result<()> {
    let packer = packer_for(config.backend)?;
    let values = read_values(&input)?;
    let (blocks, rest) = split_blocks(&values);

    let packed = encode_blocks(packer.as_ref(), &blocks, &config)
        .context("packing at the configured width")?;
    let raw_size = (blocks.len() * BLOCK_LEN * 4) as u64;
    let packed_size = payload_bytes(&packed) as u64;

    let mut counts = [0u64; MAX_BIT_WIDTH as usize + 1];
    for block in &packed {
        counts[block.bit_width() as usize] += 1;
    }
    let mean_width = if packed.is_empty() {
        0.0
    } else {
        packed.iter().map(|b| b.bit_width() as f64).sum::<f64>() / packed.len() as f64
    };

    println!("=== bp128 analysis: {:?} ===", input);
    println!();
    println!("  mode           : {}", mode_name(config.mode));
    println!("  values         : {}", values.len());
    println!("  full blocks    : {}", blocks.len());
    println!("  remainder      : {} values (not packed)", rest.len());
    println!("  raw size       : {}", human_bytes(raw_size));
    println!("  packed size    : {}", human_bytes(packed_size));
    if packed_size > 0 {
        println!("  ratio          : {:.2}x", raw_size as f64 / packed_size as f64);
    } else {
        println!("  ratio          : n/a (every block packs to zero planes)");
    }
    println!("  mean width     : {:.2} bits", mean_width);

    if histogram {
        println!();
        println!("  {:>6}  {:>12}  {:>12}", "width", "blocks", "bytes/block");
        println!("  {}", "-".repeat(34));
        for (width, &count) in counts.iter().enumerate().filter(|&(_, &c)| c > 0) {
            println!("  {:>6}  {:>12}  {:>12}", width, count, width * 16);
        }
    }
    Ok(())
}

fn run_verify(input: PathBuf, config: PackConfig) -> anyhow::Result<()> {
    let packer = packer_for(config.backend)?;
    let values = read_values(&input)?;
    let (blocks, rest) = split_blocks(&values);
    if !rest.is_empty() {
        log::warn!("{} trailing values do not fill a block and are skipped", rest.len());
    }

    let t0 = Instant::now();
    let packed = encode_blocks(packer.as_ref(), &blocks, &config)
        .context("packing at the configured width")?;
    let pack_elapsed = t0.elapsed();

    let t1 = Instant::now();
    let decoded = decode_blocks(packer.as_ref(), &packed);
    let unpack_elapsed = t1.elapsed();

    let original_digest = xxh3_64(&blocks_to_bytes(&blocks));
    let decoded_digest = xxh3_64(&blocks_to_bytes(&decoded));

    eprintln!("  packer      : {}", packer.name());
    eprintln!("  mode        : {}", mode_name(config.mode));
    if let Some(width) = config.bit_width {
        eprintln!("  width       : {} ({:?})", width, config.width_policy);
    }
    eprintln!("  blocks      : {}", blocks.len());
    eprintln!("  packed size : {}", human_bytes(payload_bytes(&packed) as u64));
    eprintln!("  pack        : {:.3}ms", pack_elapsed.as_secs_f64() * 1000.0);
    eprintln!("  unpack      : {:.3}ms", unpack_elapsed.as_secs_f64() * 1000.0);
    eprintln!("  original    : {:016x}", original_digest);
    eprintln!("  decoded     : {:016x}", decoded_digest);

    if let Some(idx) = blocks.iter().zip(&decoded).position(|(a, b)| a != b) {
        anyhow::bail!(
            "block {} did not round-trip (width {}, offset {:?})",
            idx,
            packed[idx].bit_width(),
            packed[idx].meta().offset
        );
    }
    if original_digest != decoded_digest {
        anyhow::bail!("digest mismatch after round-trip");
    }
    println!("ok: {} blocks round-tripped", blocks.len());
    Ok(())
}

/// Sorted ids with gaps below 64, generated with a fixed LCG.
fn synthetic_blocks(count: usize, seed: u64) -> Vec<Block> {
    let mut rng = seed;
    let mut acc = 0u32;
    (0..count)
        .map(|_| {
            let mut block = [0u32; BLOCK_LEN];
            for v in block.iter_mut() {
                rng = rng
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                acc = acc.wrapping_add((rng >> 58) as u32);
                *v = acc;
            }
            block
        })
        .collect()
}

fn run_bench(blocks: usize, seed: u64, mut config: PackConfig) -> anyhow::Result<()> {
    if blocks == 0 {
        anyhow::bail!("--blocks must be at least 1");
    }
    let packer = packer_for(config.backend)?;
    let input = synthetic_blocks(blocks, seed);
    let ints = (blocks * BLOCK_LEN) as f64;

    eprintln!(
        "benchmarking {} blocks ({} values) with the {} packer...",
        blocks,
        blocks * BLOCK_LEN,
        packer.name()
    );

    println!();
    println!("=== bp128 throughput ===");
    println!(
        "  {:>6}  {:>12}  {:>14}  {:>14}",
        "mode", "packed", "pack Mint/s", "unpack Mint/s"
    );
    for mode in [PackMode::Plain, PackMode::Delta] {
        config.mode = mode;
        let t0 = Instant::now();
        let packed = encode_blocks(packer.as_ref(), &input, &config)?;
        let pack_secs = t0.elapsed().as_secs_f64();

        let t1 = Instant::now();
        let decoded = decode_blocks(packer.as_ref(), &packed);
        let unpack_secs = t1.elapsed().as_secs_f64();

        if decoded != input {
            anyhow::bail!("{} round-trip failed during benchmark", mode_name(mode));
        }
        println!(
            "  {:>6}  {:>12}  {:>14.1}  {:>14.1}",
            mode_name(mode),
            human_bytes(payload_bytes(&packed) as u64),
            ints / pack_secs / 1e6,
            ints / unpack_secs / 1e6
        );
    }
    println!(
        "  raw size: {} (at most {} per block)",
        human_bytes((blocks * BLOCK_LEN * 4) as u64),
        human_bytes(MAX_PACKED_BYTES as u64)
    );
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(verbosity_level(cli.verbose));
    let mut config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Analyze {
            input,
            pack,
            histogram,
        } => {
            pack.apply(&mut config);
            run_analyze(input, config, histogram)
        }
        Commands::Verify { input, pack } => {
            pack.apply(&mut config);
            run_verify(input, config)
        }
        Commands::Bench {
            blocks,
            seed,
            backend,
        } => {
            if let Some(backend) = backend {
                config.backend = backend_of(backend);
            }
            run_bench(blocks, seed, config)
        }
    }
}
