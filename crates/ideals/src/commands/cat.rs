use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use ideals_conf::Settings;
use ideals_content::scheme;
use tracing::debug;
use url::Url;

use crate::args::Args;
use crate::commands::content_provider;
use crate::commands::Command;

#[derive(Debug, Parser)]
pub struct Cat {
    /// Virtual path (`/libs/outer.jar!lib.jar!pkg/Class.java`) or a `jar:`
    /// or `zip:` URI.
    pub target: String,
}

impl Command for Cat {
    async fn execute(&self, _args: &Args, settings: &Settings) -> Result<ExitCode> {
        let provider = content_provider(settings);

        let text = match Url::parse(&self.target) {
            Ok(uri) if scheme::is_archive_scheme(uri.scheme()) => {
                debug!(%uri, "Reading archive URI");
                provider.provide_content(&uri).await
            }
            _ => provider.provide_path(&self.target).await,
        };

        let Some(text) = text else {
            eprintln!("Cannot read {}", self.target);
            return Ok(ExitCode::FAILURE);
        };

        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
        Ok(ExitCode::SUCCESS)
    }
}
