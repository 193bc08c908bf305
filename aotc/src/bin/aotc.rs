//! CLI entry point (§10.3 "threaded from a CLI/library entry point"):
//! mirrors `wasmtime-cli`'s own `clap`-derive style, widening the
//! library's precise `thiserror` errors to `anyhow::Error` at this
//! boundary (§10.2).

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use aotc::{CompilerConfig, OptLevel, StubBackend, TargetCpu};

#[derive(Parser)]
#[command(name = "aotc", version, about = "Ahead-of-time compiler for WebAssembly modules")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a wasm module into a native AOT artifact.
    Compile(CompileArgs),
}

#[derive(clap::Args)]
struct CompileArgs {
    /// Path to the input `.wasm` module.
    input: PathBuf,

    /// Directory the linked object (and universal binary, unless
    /// `--standalone`) are written into.
    #[arg(short, long, default_value = "aotc-out")]
    output_dir: PathBuf,

    /// Emit a standalone native object instead of a universal-binary
    /// wasm module (§3.5, §6.2).
    #[arg(long)]
    standalone: bool,

    #[arg(long, value_enum, default_value_t = OptLevelArg::Speed)]
    opt_level: OptLevelArg,

    #[arg(long, value_enum, default_value_t = TargetCpuArg::Host)]
    target_cpu: TargetCpuArg,

    /// Enables gas metering with the given limit (§4.2.4).
    #[arg(long)]
    gas_limit: Option<i64>,

    /// Disables the interrupt checks injected at block/loop entry (§4.2.1, §5).
    #[arg(long)]
    no_interrupt_checks: bool,
}

#[derive(Copy, Clone, ValueEnum)]
enum OptLevelArg {
    None,
    Speed,
    SpeedAndSize,
}

impl From<OptLevelArg> for OptLevel {
    fn from(v: OptLevelArg) -> Self {
        match v {
            OptLevelArg::None => OptLevel::None,
            OptLevelArg::Speed => OptLevel::Speed,
            OptLevelArg::SpeedAndSize => OptLevel::SpeedAndSize,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum TargetCpuArg {
    Host,
    Generic,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Compile(args) => run_compile(args),
    }
}

fn run_compile(args: CompileArgs) -> anyhow::Result<()> {
    let wasm = std::fs::read(&args.input).with_context(|| format!("reading {}", args.input.display()))?;

    let config = CompilerConfig {
        opt_level: args.opt_level.into(),
        target_cpu: match args.target_cpu {
            TargetCpuArg::Host => TargetCpu::Host,
            TargetCpuArg::Generic => TargetCpu::Generic,
        },
        gas_metering: args.gas_limit.is_some(),
        cost_table: Vec::new(),
        gas_limit: args.gas_limit.unwrap_or(i64::MAX),
        interrupt_checks: !args.no_interrupt_checks,
        standalone_object: args.standalone,
    };

    let compiled = aotc::compile_module(&wasm, config.clone()).context("compiling module")?;
    tracing::info!(functions = compiled.functions.len(), imports = compiled.import_count, "compiled module");

    let output = aotc::package_module(&compiled, &wasm, &StubBackend, &config, &args.output_dir).context("packaging module")?;
    println!("wrote shared object to {}", output.shared_object_path.display());

    if let Some(universal) = output.universal_wasm {
        let path = args.output_dir.join("module.aot.wasm");
        std::fs::write(&path, universal).with_context(|| format!("writing {}", path.display()))?;
        println!("wrote universal binary to {}", path.display());
    }

    Ok(())
}
