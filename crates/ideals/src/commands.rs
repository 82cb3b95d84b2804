mod cat;
mod javadoc;
mod ls;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Subcommand;
use ideals_archive::ArchiveStore;
use ideals_archive::OsFileSystem;
use ideals_conf::Settings;
use ideals_content::ContentProvider;
use ideals_worker::Worker;

use crate::args::Args;

pub trait Command {
    async fn execute(&self, args: &Args, settings: &Settings) -> Result<ExitCode>;
}

#[derive(Debug, Subcommand)]
pub enum IdealsCommand {
    /// Print a document from inside a (possibly nested) archive
    Cat(self::cat::Cat),
    /// List the entries of a (possibly nested) archive
    Ls(self::ls::Ls),
    /// Convert HTML doc-comment markup into a comment block
    Javadoc(self::javadoc::Javadoc),
}

impl IdealsCommand {
    pub async fn execute(&self, args: &Args, settings: &Settings) -> Result<ExitCode> {
        match self {
            IdealsCommand::Cat(cmd) => cmd.execute(args, settings).await,
            IdealsCommand::Ls(cmd) => cmd.execute(args, settings).await,
            IdealsCommand::Javadoc(cmd) => cmd.execute(args, settings).await,
        }
    }
}

/// Archive store over the local file system, configured from `settings`.
fn archive_store(settings: &Settings) -> Arc<ArchiveStore> {
    Arc::new(
        ArchiveStore::new(Arc::new(OsFileSystem))
            .with_max_nesting_depth(settings.cache.max_nesting_depth),
    )
}

fn content_provider(settings: &Settings) -> ContentProvider {
    ContentProvider::new(
        archive_store(settings),
        Worker::with_capacity(settings.worker.queue_capacity),
    )
    .with_evict_on_close(settings.cache.evict_on_close)
}
