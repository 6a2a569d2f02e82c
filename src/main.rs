use anyhow::Context;
use clap::Parser;
use library_catalog::cli::Args;
use library_catalog::configs;
use library_catalog::console::{local_today, Console};
use library_catalog::item::repo::TextFileRepository;
use std::io;
use tracing::info;

fn main() -> anyhow::Result<()> {
    configs::load_dotenv();
    let args = Args::parse();

    let config = configs::load_config(&args.overrides())
        .context("Cannot load config")?;

    let _guard = match config.logger() {
        Some(logger) => Some(configs::logging::set_global_logging_config(logger)?),
        None => {
            configs::logging::set_default_logging_config()?;
            None
        }
    };

    let repository = TextFileRepository::new(config.data_file(), config.load_policy());
    info!("카탈로그를 시작 합니다. (파일: {}, 정책: {:?})", repository.path().display(), repository.policy());

    let mut stdout = io::stdout().lock();
    let mut console = Console::open(repository, local_today, &mut stdout)?;
    console.run(io::stdin().lock(), stdout)?;

    Ok(())
}
