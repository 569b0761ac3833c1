//! Build automation for kbcli
//!
//! Usage: cargo xtask <command>
//!
//! - build: build the CLI
//! - test: run unit and/or integration tests
//! - dist: package a release archive for one target
//! - ci: format check, clippy and tests

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use xshell::{cmd, Shell};

const BIN: &str = "kbcli";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation for kbcli")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the CLI
    Build {
        #[arg(long)]
        release: bool,
    },
    /// Run tests
    Test {
        /// Only the tests/ integration suites
        #[arg(long, conflicts_with = "unit")]
        integration: bool,
        /// Only the library unit tests
        #[arg(long)]
        unit: bool,
    },
    /// Package `kbcli-<target>.tar.gz` for cargo-binstall
    Dist {
        /// Target triple (e.g., x86_64-unknown-linux-gnu)
        #[arg(long)]
        target: Option<String>,
    },
    /// Run CI checks (format, clippy, test)
    Ci,
    /// Format code
    Format {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy
    Clippy,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;
    sh.change_dir(project_root()?);

    match cli.command {
        Commands::Build { release } => build(&sh, release),
        Commands::Test { integration, unit } => test(&sh, integration, unit),
        Commands::Dist { target } => dist(&sh, target.as_deref()),
        Commands::Ci => ci(&sh),
        Commands::Format { check } => format(&sh, check),
        Commands::Clippy => clippy(&sh),
    }
}

fn build(sh: &Shell, release: bool) -> Result<()> {
    println!("🔨 Building {}...", BIN);
    if release {
        cmd!(sh, "cargo build --release --bin {BIN}").run()?;
    } else {
        cmd!(sh, "cargo build --bin {BIN}").run()?;
    }
    Ok(())
}

fn test(sh: &Shell, integration: bool, unit: bool) -> Result<()> {
    println!("🧪 Running tests...");
    match (integration, unit) {
        (true, _) => cmd!(sh, "cargo test -p {BIN} --test '*'").run()?,
        (_, true) => cmd!(sh, "cargo test -p {BIN} --lib").run()?,
        _ => cmd!(sh, "cargo test --workspace").run()?,
    }
    println!("✅ All tests passed");
    Ok(())
}

fn release_binary(target: Option<&str>) -> Result<PathBuf> {
    let root = project_root()?;
    Ok(match target {
        Some(triple) => root.join("target").join(triple).join("release").join(BIN),
        None => root.join("target/release").join(BIN),
    })
}

fn dist(sh: &Shell, target: Option<&str>) -> Result<()> {
    let triple = match target {
        Some(t) => t.to_string(),
        None => host_triple(sh)?,
    };
    println!("📦 Packaging {} for {}...", BIN, triple);

    match target {
        Some(t) => cmd!(sh, "cargo build --release --bin {BIN} --target {t}").run()?,
        None => cmd!(sh, "cargo build --release --bin {BIN}").run()?,
    }

    let dist_dir = project_root()?.join("dist");
    sh.create_dir(&dist_dir)?;
    sh.copy_file(release_binary(target)?, dist_dir.join(BIN))?;

    // name matches package.metadata.binstall.pkg-url
    let archive = format!("{}-{}.tar.gz", BIN, triple);
    cmd!(sh, "tar -czf {archive} -C dist {BIN}")
        .run()
        .context("Failed to create tarball")?;
    println!("✅ {}", archive);
    Ok(())
}

fn host_triple(sh: &Shell) -> Result<String> {
    let info = cmd!(sh, "rustc -vV").read()?;
    match info.lines().find_map(|l| l.strip_prefix("host: ")) {
        Some(host) => Ok(host.trim().to_string()),
        None => bail!("could not read host triple from `rustc -vV`"),
    }
}

fn ci(sh: &Shell) -> Result<()> {
    println!("📝 Checking formatting...");
    format(sh, true)?;

    println!("\n🔧 Running clippy...");
    clippy(sh)?;

    println!("\n🧪 Running tests...");
    test(sh, false, false)?;

    println!("\n✅ All CI checks passed!");
    Ok(())
}

fn format(sh: &Shell, check: bool) -> Result<()> {
    if check {
        cmd!(sh, "cargo fmt --all -- --check").run()?;
    } else {
        cmd!(sh, "cargo fmt --all").run()?;
    }
    Ok(())
}

fn clippy(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo clippy --workspace --all-targets -- -D warnings").run()?;
    Ok(())
}

fn project_root() -> Result<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .context("xtask must live inside the workspace")
}
