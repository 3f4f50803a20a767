use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use sitewright::build;
use sitewright::config::SiteConfig;

/// Build a static site from the content, layout, and static trees under a
/// project root.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Project root containing the `content`, `layout`, and `static`
    /// directories
    #[arg(default_value = ".")]
    root: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    match run(&args.root) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(root: &Path) -> anyhow::Result<()> {
    let config = SiteConfig::load(root)?;
    build::build_site(root, &config)?;
    Ok(())
}
