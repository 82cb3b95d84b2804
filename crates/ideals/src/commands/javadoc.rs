use std::io::Read;
use std::process::ExitCode;

use anyhow::Context;
use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use ideals_conf::Settings;

use crate::args::Args;
use crate::commands::Command;

#[derive(Debug, Parser)]
pub struct Javadoc {
    /// HTML file to convert. Reads stdin when omitted.
    pub file: Option<Utf8PathBuf>,
}

impl Command for Javadoc {
    async fn execute(&self, _args: &Args, _settings: &Settings) -> Result<ExitCode> {
        let source = match &self.file {
            Some(path) => {
                std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?
            }
            None => {
                let mut source = String::new();
                std::io::stdin()
                    .read_to_string(&mut source)
                    .context("Failed to read stdin")?;
                source
            }
        };

        println!("{}", ideals_markup::html_to_comment(&source));
        Ok(ExitCode::SUCCESS)
    }
}
