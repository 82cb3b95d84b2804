use std::process::ExitCode;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use ideals_conf::Settings;

use crate::args::Args;
use crate::args::GlobalArgs;
use crate::commands::IdealsCommand;
use crate::logging;

/// Browse entries of nested jar/zip archives and convert doc-comment markup.
#[derive(Parser, Debug)]
#[command(name = "ideals")]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: IdealsCommand,

    #[command(flatten)]
    pub args: Args,
}

/// Parse CLI arguments and execute the chosen command
pub async fn run(args: Vec<String>) -> Result<ExitCode> {
    let cli = Cli::try_parse_from(args).unwrap_or_else(|e| {
        e.exit();
    });

    let settings = load_settings(&cli.args.global)?;
    let _guard = logging::init_tracing(&cli.args.global, settings.debug);

    cli.command.execute(&cli.args, &settings).await
}

fn load_settings(global: &GlobalArgs) -> Result<Settings> {
    let project_root = match &global.project {
        Some(dir) => dir.as_std_path().to_path_buf(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    Settings::new(&project_root).context("Failed to load settings")
}
