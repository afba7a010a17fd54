//! Command-line options and rendering for the `pkgconfig` binary.

use anyhow::Context;
use clap::Parser;
use log::{debug, info};
use pkgconfig_rs_core::{ConfigResolver, EnvironmentLayout, ResolverOptions, SchemaSource};
use serde_json::{Value, json};
use std::path::PathBuf;

/// Print the resolved configuration of the package containing a directory.
#[derive(Debug, Parser)]
#[command(name = "pkgconfig", version)]
pub struct Cli {
    /// Base config name (defaults to the package name, then `default`)
    pub name: Option<String>,
    /// Directory where the upward package search starts
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
    /// Environment override to merge (defaults to $CONFIG_ENV)
    #[arg(long)]
    pub env: Option<String>,
    /// Config directory, relative to the package root (defaults to $CONFIG_DIR, then `config`)
    #[arg(long)]
    pub config_dir: Option<PathBuf>,
    /// Look up environment overrides in `<config dir>/<env>/` instead of `<config dir>/<env>.*`
    #[arg(long)]
    pub env_subdir: bool,
    /// Schema file to validate against, relative to the package root
    #[arg(long, conflicts_with = "no_schema")]
    pub schema: Option<PathBuf>,
    /// Skip schema validation
    #[arg(long)]
    pub no_schema: bool,
    /// Include the package and the files that were read in the output
    #[arg(long)]
    pub sources: bool,
    /// Print JSON on a single line
    #[arg(long)]
    pub compact: bool,
}

impl Cli {
    /// Build resolver options: environment variables first, then flags.
    pub fn resolver_options<F>(&self, lookup: F) -> ResolverOptions
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = ResolverOptions::from_lookup(&self.dir, lookup);
        if let Some(env) = &self.env {
            options.environment = Some(env.clone());
        }
        if let Some(dir) = &self.config_dir {
            options.config_dir = Some(dir.clone());
        }
        if self.env_subdir {
            options.environment_layout = EnvironmentLayout::Subdirectory;
        }
        if self.no_schema {
            options.schema = SchemaSource::Disabled;
        } else if let Some(schema) = &self.schema {
            options.schema = SchemaSource::Path(schema.clone());
        }
        options
    }
}

/// Resolve the configuration described by `cli` and render it as JSON text.
pub fn run<F>(cli: &Cli, lookup: F) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let options = cli.resolver_options(lookup);
    info!(
        "resolving config (dir={}, env={:?})",
        options.start_dir.display(),
        options.environment
    );
    let resolved = ConfigResolver::new(options)
        .resolve_detailed(cli.name.as_deref())
        .context("failed to resolve configuration")?;
    debug!("resolved config from {} file(s)", resolved.sources.len());

    let output: Value = if cli.sources {
        json!({
            "package": resolved.package,
            "sources": resolved.sources,
            "config": resolved.value,
        })
    } else {
        resolved.value
    };
    let text = if cli.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    Ok(text)
}
