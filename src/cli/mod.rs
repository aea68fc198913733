use crate::config::Config;
use crate::core::{Dispatcher, HttpFetcher, PageLocation, Registry, ResolveError};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

#[derive(Parser)]
#[command(name = "embed-resolver")]
#[command(about = "Resolve direct media URLs from video hoster embed pages")]
#[command(version)]
pub struct Cli {
    /// TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve the media URL of an embed page
    Resolve {
        /// Embed page URL
        #[arg(value_name = "URL")]
        url: String,

        /// Read page content from a file instead of downloading it
        #[arg(long, value_name = "FILE")]
        content: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List known providers
    Providers {
        /// Only show providers claiming this host
        #[arg(long)]
        host: Option<String>,
    },
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let registry = Registry::builtin();
        let unknown = registry.apply_overrides(&config.providers);
        if !unknown.is_empty() {
            eprintln!("Unknown providers in config: {}", unknown.join(", "));
        }

        match &self.command {
            Command::Resolve { url, content, json } => {
                self.resolve(&config, registry, url, content.as_deref(), *json).await
            }
            Command::Providers { host } => {
                list_providers(registry, host.as_deref());
                Ok(())
            }
        }
    }

    async fn resolve(
        &self,
        config: &Config,
        registry: &Registry,
        url: &str,
        content: Option<&std::path::Path>,
        json: bool,
    ) -> Result<()> {
        let parsed = Url::parse(url).with_context(|| format!("invalid URL: {}", url))?;
        let page = PageLocation::from_url(&parsed);
        let fetcher = Arc::new(HttpFetcher::new(config)?);

        let content = match content {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?,
            None => {
                if self.verbose {
                    eprintln!("Downloading page: {}", url);
                }
                fetcher.page(url).await?
            }
        };

        let dispatcher = Dispatcher::new(registry, fetcher);
        let resolved = match dispatcher.resolve(&page, &content).await {
            Ok(resolved) => resolved,
            Err(ResolveError::NoProviderMatched { host }) => {
                return Err(registry.explain_miss(&host).into())
            }
            Err(err) => return Err(err.into()),
        };

        if json {
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        } else {
            if let Some(notice) = &resolved.notice {
                eprintln!("Notice ({}): {}", resolved.provider, notice);
            }
            println!("{}", resolved.url);
        }

        Ok(())
    }
}

fn list_providers(registry: &Registry, host: Option<&str>) {
    let providers: Vec<_> = match host {
        Some(host) => registry.claimants(host).collect(),
        None => registry.providers().iter().collect(),
    };

    for provider in providers {
        let status = provider.status();
        println!(
            "{:<12} {:<12} {:<7} {:<12} {}{}",
            provider.id(),
            provider.name(),
            provider.reliability(),
            provider.extractor().shape(),
            provider.domains().join(", "),
            if status.locked { " [locked]" } else { "" }
        );
        if let Some(notice) = status.notice {
            println!("{:<12} note: {}", "", notice);
        }
    }
}
