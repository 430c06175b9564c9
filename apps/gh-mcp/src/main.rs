//! GitHub MCP server binary.
//!
//! Builds the default catalog, configures the registry from CLI flags and
//! serves it over stdio.

use anyhow::Context;
use clap::Parser;
use gh_tools_core::{Registry, scopes};
use gh_tools_github::deps::DEFAULT_API_HOST;
use gh_tools_github::lockdown::{LockdownCache, LockdownOptions};
use gh_tools_github::{Deps, fetch_token_scopes, resolve_github_token};
use gh_tools_mcp::{GitHubMcpServer, ServiceExt, stdio};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "gh-mcp")]
#[command(about = "GitHub MCP server exposing the gh-tools catalog", version)]
struct Args {
    /// Drop every tool that can write to GitHub
    #[arg(long)]
    read_only: bool,

    /// Comma-separated toolsets to enable; keywords: all, default.
    /// Unset means the default toolsets.
    #[arg(long, value_name = "NAMES")]
    toolsets: Option<String>,

    /// Comma-separated tool names enabled regardless of their toolset
    #[arg(long, value_name = "NAMES")]
    tools: Option<String>,

    /// GitHub API base URL
    #[arg(long, value_name = "URL", default_value = DEFAULT_API_HOST)]
    host: String,

    /// OAuth/PAT bearer token; falls back to GITHUB_TOKEN, GH_TOKEN, then gh
    #[arg(long, value_name = "TOKEN")]
    token: Option<String>,

    /// Redact author content unless the author has push access
    #[arg(long)]
    lockdown: bool,

    /// List available tools and exit
    #[arg(long)]
    list_tools: bool,

    /// Print the token's OAuth scopes and exit
    #[arg(long)]
    list_scopes: bool,

    /// Output format for --list-scopes
    #[arg(long, value_parser = ["text", "json", "summary"], default_value = "text")]
    list_scopes_output: String,
}

fn split_csv(input: Option<&str>) -> Option<Vec<String>> {
    input.map(|raw| {
        raw.split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect()
    })
}

fn print_scopes(raw: &[String], format: &str) {
    match format {
        "json" => {
            let expanded = scopes::expand_scopes(raw);
            println!(
                "{}",
                serde_json::json!({ "scopes": raw, "effective": expanded })
            );
        }
        "summary" => {
            println!("{} scopes granted", raw.len());
        }
        _ => {
            for scope in raw {
                println!("{scope}");
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Install the rustls CryptoProvider before any HTTP clients are created.
    // rustls 0.23+ panics if it can't auto-select a single provider and
    // Cargo's additive features pull in both ring and aws-lc-rs.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let args = Args::parse();

    let token = match args.token.clone() {
        Some(token) => Some(token),
        None => match resolve_github_token() {
            Ok(token) => Some(token),
            Err(err) => {
                tracing::warn!(error = %err, "no GitHub token; serving unauthenticated");
                None
            }
        },
    };

    // Classic tokens advertise their scopes; use them to hide tools the
    // caller could never invoke. A failed probe (or fine-grained PAT) means
    // no scope filtering.
    let granted_scopes: Option<Vec<String>> = match &token {
        Some(token) => {
            let probe = reqwest::Client::new();
            match fetch_token_scopes(&probe, &args.host, token).await {
                Ok(scopes) => Some(scopes),
                Err(err) => {
                    tracing::warn!(error = %err, "scope probe failed; skipping scope filter");
                    None
                }
            }
        }
        None => None,
    };

    if args.list_scopes {
        let raw = granted_scopes.clone().unwrap_or_default();
        print_scopes(&raw, &args.list_scopes_output);
        return Ok(());
    }

    let lockdown = args
        .lockdown
        .then(|| Arc::new(LockdownCache::new(LockdownOptions::default())));
    let deps = Arc::new(
        Deps::new(args.host.clone(), token, lockdown).context("building GitHub clients")?,
    );

    let catalog = gh_toolsets::default_catalog(&deps);
    let mut builder = Registry::builder()
        .tools(catalog.tools)
        .resource_templates(catalog.resource_templates)
        .prompts(catalog.prompts)
        .aliases(gh_toolsets::deprecated_aliases())
        .read_only(args.read_only)
        .toolsets(split_csv(args.toolsets.as_deref()))
        .additional_tools(split_csv(args.tools.as_deref()).unwrap_or_default());

    if let Some(granted) = granted_scopes {
        builder = builder.custom_filter(move |_ctx, tool| {
            Ok(scopes::has_required_scopes(&granted, &tool.required_scopes))
        });
    }

    let registry = builder.build();
    for name in registry.unrecognized_toolsets() {
        eprintln!("Warning: unrecognized toolset: {name}");
    }

    if args.list_tools {
        let ctx = gh_tools_core::RequestContext::new();
        let tools = registry.available_tools(&ctx);
        eprintln!("Available tools ({}):", tools.len());
        for tool in tools {
            eprintln!("  - {} [{}]", tool.name(), tool.toolset.id);
        }
        return Ok(());
    }

    eprintln!(
        "Starting gh-mcp ({} tools, read_only={})",
        registry.tools().len(),
        registry.read_only()
    );

    let server = GitHubMcpServer::new(registry).with_info("gh-mcp", env!("CARGO_PKG_VERSION"));
    let transport = stdio();
    let service = server.serve(transport).await?;
    service.waiting().await?;

    Ok(())
}
