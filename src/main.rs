use clap::Parser;
use semcache::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Validate => cli::validate::run(cli.config).await,
        Command::Replay(args) => cli::replay::run(cli.config, args).await,
    }
}
