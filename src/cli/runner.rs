//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::PagerConfig;
use crate::cursor::CursorToken;
use crate::error::{Error, Result, ResultExt};
use crate::executor::{DirectRunner, LoggingRunner};
use crate::loader::{load_documents, load_request};
use crate::pager::{PageRequest, Pager};
use crate::pipeline::PipelineBuilder;
use crate::store::MemoryStore;
use serde_json::{json, Value};
use std::path::Path;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Explain {
                cursor,
                stash_suffix,
            } => self.explain(cursor.as_deref(), stash_suffix.as_deref()),
            Commands::Run {
                data,
                cursor,
                default_limit,
                max_limit,
                pages,
            } => {
                let config = Self::build_config(*default_limit, *max_limit);
                self.run_pages(data, cursor.as_deref(), config, *pages).await
            }
            Commands::Validate => self.validate(),
        }
    }

    /// Load the request, optionally continuing from a cursor
    fn load_request(&self, cursor: Option<&str>) -> Result<PageRequest> {
        let path = self
            .cli
            .request
            .as_ref()
            .ok_or_else(|| Error::config("Request file not specified (use -r flag)"))?;
        let request = load_request(path)?;

        Ok(match cursor {
            Some(token) => request.with_cursor(CursorToken::from(token)),
            None => request,
        })
    }

    /// Environment config with command-line overrides
    fn build_config(default_limit: Option<u32>, max_limit: Option<u32>) -> PagerConfig {
        let mut config = PagerConfig::from_env();
        if let Some(limit) = default_limit {
            config = config.with_default_limit(limit);
        }
        if max_limit.is_some() {
            config = config.with_max_limit(max_limit);
        }
        config
    }

    /// Print the planned pipeline
    fn explain(&self, cursor: Option<&str>, stash_suffix: Option<&str>) -> Result<()> {
        let request = self.load_request(cursor)?;
        let config = PagerConfig::from_env();

        let mut builder = PipelineBuilder::new(&request, &config);
        if let Some(suffix) = stash_suffix {
            builder = builder.with_stash_suffix(suffix);
        }
        let plan = builder.build()?;

        self.output_message(&json!({
            "type": "PLAN",
            "collection": self.cli.collection,
            "plan": serde_json::to_value(&plan)?,
        }));

        Ok(())
    }

    /// Run the request against a memory store seeded from `data`
    async fn run_pages(
        &self,
        data: &Path,
        cursor: Option<&str>,
        config: PagerConfig,
        pages: usize,
    ) -> Result<()> {
        let mut request = self.load_request(cursor)?;
        let collections = load_documents(data, &self.cli.collection)
            .context("Failed to load seed documents")?;
        let store = MemoryStore::with_collections(collections);
        let collection = store.collection(self.cli.collection.as_str());

        let pager = Pager::new()
            .with_config(config)
            .with_runner(LoggingRunner::new(DirectRunner));

        for number in 1..=pages.max(1) {
            let page = pager.page(&collection, &request).await?;
            let next = page.from.as_ref().map(|cursor| cursor.encode());

            tracing::info!(
                "Page {number}: {} items, can_load_more={}",
                page.size,
                page.can_load_more
            );

            self.output_message(&json!({
                "type": "PAGE",
                "page": number,
                "collection": self.cli.collection,
                "result": serde_json::to_value(&page)?,
                "next": next,
            }));

            match page.next_request(&request) {
                Some(next_request) => request = next_request,
                None => break,
            }
        }

        Ok(())
    }

    /// Validate the request file
    fn validate(&self) -> Result<()> {
        let request = self.load_request(None)?;
        let plan = Pager::new().plan(&request)?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Request paging on '{}' is valid: {} stages, {} populators",
                    request.pager.field,
                    plan.stages.len(),
                    request.populators.len()
                )
            }
        }));

        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}
