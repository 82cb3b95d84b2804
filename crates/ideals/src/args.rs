use camino::Utf8PathBuf;
use clap::Parser;

#[derive(Parser, Debug, Clone)]
pub struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct GlobalArgs {
    /// Only log errors.
    #[arg(global = true, long, short, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Use verbose output. Repeat for more detail.
    #[arg(global = true, action = clap::ArgAction::Count, long, short, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Directory searched for `ideals.toml` and `.ideals.toml`. Defaults to
    /// the current directory.
    #[arg(global = true, long, value_name = "DIR")]
    pub project: Option<Utf8PathBuf>,
}

impl GlobalArgs {
    /// Log directive for the terminal.
    #[must_use]
    pub fn log_directive(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
