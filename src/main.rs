//! mkinitramfs - build a newc initramfs for booting Linux.
//!
//! Every command name becomes a symlink in `/bbin` to the multi-call
//! executable installed at `/bbin/bb`.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use mkinitramfs::artifact::write_initramfs;
use mkinitramfs::config::Config;
use mkinitramfs::initramfs::{FileSpec, Plan};
use mkinitramfs::logger;

#[derive(Parser)]
#[command(name = "mkinitramfs")]
#[command(about = "Create a newc CPIO initramfs for booting Linux")]
#[command(
    after_help = "EXAMPLE:\n  mkinitramfs --bb ./bb --cmd_name ls --cmd_name init --file ./motd:/etc/motd -o initramfs.cpio"
)]
struct Cli {
    /// Multi-call executable to install at bbin/bb (empty: no executable, no symlinks)
    #[arg(long = "bb", value_name = "PATH")]
    bb: Option<String>,

    /// Output CPIO filename
    #[arg(short, long, value_name = "PATH", required_unless_present = "show_config")]
    out: Option<PathBuf>,

    /// Target of the init symlink [default: bbin/init, or $MKINITRAMFS_INIT]
    #[arg(long, value_name = "PATH")]
    init: Option<String>,

    /// Default shell linked from bin/defaultsh; empty disables [default: elvish, or $MKINITRAMFS_DEFAULTSH]
    #[arg(long, value_name = "NAME")]
    defaultsh: Option<String>,

    /// Command name to symlink to the executable (repeatable, required with --bb)
    #[arg(long = "cmd_name", value_name = "NAME")]
    cmd_names: Vec<String>,

    /// File to include, as sourcePath:pathInCPIO (repeatable; missing parent directories are added)
    #[arg(long = "file", value_name = "SRC:DEST")]
    files: Vec<FileSpec>,

    /// Also write a JSON listing of the archive contents
    #[arg(long, value_name = "PATH")]
    manifest: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    show_config: bool,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env if present
    dotenvy::dotenv().ok();
    let config = Config::load();
    logger::init(logger::level_for_verbosity(config.log_level, cli.verbose));

    if cli.show_config {
        config.print();
        return Ok(());
    }

    let out = cli.out.clone().context("--out is required")?;
    let plan = plan(&cli, &config);

    write_initramfs(&plan, &out, cli.manifest.as_deref())
        .with_context(|| format!("Failed to build {}", out.display()))?;

    Ok(())
}

/// Flags win over `config`; an empty `--bb` means no executable.
fn plan(cli: &Cli, config: &Config) -> Plan {
    Plan {
        executable: cli
            .bb
            .as_deref()
            .filter(|bb| !bb.is_empty())
            .map(PathBuf::from),
        aliases: cli.cmd_names.clone(),
        init_target: cli
            .init
            .clone()
            .unwrap_or_else(|| config.init_target.clone()),
        default_shell: cli
            .defaultsh
            .clone()
            .unwrap_or_else(|| config.default_shell.clone()),
        files: cli.files.clone(),
        ..Plan::default()
    }
}
