use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use ideals_archive::VirtualPath;
use ideals_conf::Settings;
use ideals_content::scheme;

use crate::args::Args;
use crate::commands::archive_store;
use crate::commands::Command;

#[derive(Debug, Parser)]
pub struct Ls {
    /// Archive to list; nested archives use `!`, as in
    /// `/libs/outer.jar!lib.jar`.
    pub archive: String,

    /// Print each entry as a URI under this scheme instead of its name.
    #[arg(long, value_name = "SCHEME", value_parser = scheme::SCHEMES)]
    pub uri: Option<String>,
}

impl Command for Ls {
    async fn execute(&self, _args: &Args, settings: &Settings) -> Result<ExitCode> {
        let store = archive_store(settings);
        let base = VirtualPath::from(self.archive.as_str());
        let key = base.canonical();

        let handle = tokio::task::spawn_blocking(move || store.get_or_open(&base))
            .await
            .context("Archive task failed")?
            .with_context(|| format!("Cannot open {}", self.archive))?;

        let mut stdout = std::io::stdout().lock();
        for entry in handle.entries() {
            match &self.uri {
                Some(scheme) => {
                    let path = VirtualPath::from(format!("{key}!{entry}"));
                    let uri = scheme::path_to_uri(scheme, &path)
                        .with_context(|| format!("Cannot build a {scheme} URI for {path}"))?;
                    writeln!(stdout, "{uri}")
                }
                None => writeln!(stdout, "{entry}"),
            }
            .context("Failed to write to stdout")?;
        }
        Ok(ExitCode::SUCCESS)
    }
}
