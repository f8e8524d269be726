use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use certo::cli;
use certo::infrastructure::paths::ProjectPaths;
use certo::infrastructure::tracing::init_tracing;

#[derive(Parser)]
#[command(name = "certo")]
#[command(about = "Interactive configurator for an Nginx + Certbot Docker Compose stack")]
#[command(version)]
struct Cli {
    /// Directory containing docker-compose.yml
    #[arg(long, default_value = ".")]
    project_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let paths = ProjectPaths::new(cli.project_dir);
    cli::run(&paths)
}
