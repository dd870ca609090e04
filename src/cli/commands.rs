//! Command handlers. Each returns whether the run was clean, which the
//! binary turns into the exit status.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use super::{CheckArgs, ConfigArgs, OutputFormat, UploadArgs};
use crate::config::Config;
use crate::decision::{self, RiskLevel, Verdict};
use crate::extension;
use crate::policy::PolicySnapshot;
use crate::signature::SIGNATURES;
use crate::store::{CustomerId, MemoryStore, PolicyFixture};
use crate::upload::{allowed_file_types, BatchResponse, FileUpload, UploadGuard, UploadResponse};

#[derive(Debug, Serialize)]
struct CheckReport {
    file: String,
    #[serde(flatten)]
    verdict: Verdict,
}

/// `extguard check`
pub async fn run_check(args: &CheckArgs, config: &Config, output: OutputFormat) -> Result<bool> {
    let policy = PolicySnapshot::new(CustomerId(0), &args.block);
    let header_limit = config.limits.header_inspect_bytes;

    let mut reports = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let header = &bytes[..bytes.len().min(header_limit)];

        let verdict = decision::decide(header, &extension::extension_of(&filename), &policy);
        reports.push(CheckReport {
            file: path.display().to_string(),
            verdict,
        });
    }

    let clean = reports.iter().all(|r| r.verdict.is_allowed());
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Human => {
            let blocked: Vec<_> = policy.blocked().collect();
            println!(
                "Blacklist: {}\n",
                if blocked.is_empty() {
                    "(empty)".dimmed().to_string()
                } else {
                    blocked.join(", ")
                }
            );
            for report in &reports {
                print_verdict(&report.file, &report.verdict);
            }
        }
    }
    Ok(clean)
}

fn risk_label(risk: RiskLevel) -> colored::ColoredString {
    match risk {
        RiskLevel::None => "NONE".green(),
        RiskLevel::Low => "LOW".cyan(),
        RiskLevel::Medium => "MEDIUM".yellow(),
        RiskLevel::High => "HIGH".red().bold(),
    }
}

fn print_verdict(file: &str, verdict: &Verdict) {
    match verdict {
        Verdict::Allowed(allowed) => {
            println!("  {} {}", "ALLOWED".green().bold(), file);
            println!(
                "    detected: {}  layer: {}  risk: {}",
                allowed.detected,
                allowed.layer,
                risk_label(allowed.risk)
            );
            if let Some(warning) = &allowed.warning {
                println!("    {} {}", "warning:".yellow(), warning);
            }
        }
        Verdict::Blocked(blocked) => {
            println!(
                "  {} {} [{}]",
                "BLOCKED".red().bold(),
                file,
                blocked.reason.reason_code()
            );
            println!(
                "    detected: {}  layer: {}  risk: {}",
                blocked.detected,
                blocked.layer,
                risk_label(blocked.risk)
            );
            println!("    {}", blocked.message);
            if let Some(instruction) = &blocked.instruction {
                println!("    {} {}", "hint:".cyan(), instruction);
            }
        }
    }
}

/// `extguard upload`
pub async fn run_upload(args: &UploadArgs, config: &Config, output: OutputFormat) -> Result<bool> {
    let fixture = PolicyFixture::load_from(&args.policy)?;
    let store = MemoryStore::from_fixture(&fixture)
        .with_context(|| format!("Invalid policy fixture: {}", args.policy.display()))?;
    let guard = UploadGuard::new(Arc::new(store), config)?;

    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        files.push(FileUpload::from_path(path).await?);
    }

    let response = guard.validate_and_maybe_store_batch(&args.user, files).await;
    let clean = response.success
        && response
            .summary
            .map(|summary| summary.failed == 0)
            .unwrap_or(false);

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Human => print_batch(&args.user, &response),
    }
    Ok(clean)
}

fn print_batch(user: &str, response: &BatchResponse) {
    println!("extguard upload as {}\n", user.bold());

    if !response.success {
        let reason = response
            .reason
            .map(|r| r.to_string())
            .unwrap_or_default();
        println!("  {} {} [{}]", "REJECTED".red().bold(), response.message, reason);
        return;
    }

    for result in &response.results {
        print_upload(result);
    }
    println!("\n{}", response.message);
}

fn print_upload(result: &UploadResponse) {
    let name = result.filename.as_deref().unwrap_or("<unnamed>");
    if let Some(data) = &result.data {
        println!(
            "  {} {} ({}, {})",
            "STORED".green().bold(),
            name,
            humansize::format_size(data.record.size, humansize::BINARY),
            data.validation.detected
        );
        let hash = &data.record.content_hash;
        println!("    id: {}  blake3: {}", data.record.id, hash.get(..16).unwrap_or(hash));
        if let Some(warning) = &data.validation.warning {
            println!("    {} {}", "warning:".yellow(), warning);
        }
        return;
    }

    let reason = result.reason.map(|r| r.to_string()).unwrap_or_default();
    let layer = result.layer.map(|l| l.to_string()).unwrap_or_default();
    let label = if result.is_retryable() {
        "FAILED".yellow().bold()
    } else {
        "BLOCKED".red().bold()
    };
    println!("  {} {} [{} at {}]", label, name, reason, layer);
    if let Some(error) = &result.error {
        println!("    {}", error);
    }
    if let Some(Verdict::Blocked(blocked)) = &result.details {
        if let Some(instruction) = &blocked.instruction {
            println!("    {} {}", "hint:".cyan(), instruction);
        }
    }
}

#[derive(Debug, Serialize)]
struct SignatureRow {
    description: &'static str,
    offset: usize,
    pattern: String,
    candidates: &'static [&'static str],
    category: &'static str,
}

/// `extguard signatures`
pub fn print_signatures(output: OutputFormat) -> Result<bool> {
    let rows: Vec<SignatureRow> = SIGNATURES
        .iter()
        .map(|rule| SignatureRow {
            description: rule.description,
            offset: rule.offset,
            pattern: hex::encode_upper(rule.pattern),
            candidates: rule.candidates,
            category: rule.category.as_str(),
        })
        .collect();

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Human => {
            println!("{} signature rules, first match wins\n", rows.len());
            for (i, row) in rows.iter().enumerate() {
                println!(
                    "  {:>2}. {:<28} {:<18} @{:<3} {:<11} {}",
                    i + 1,
                    row.description,
                    row.pattern,
                    row.offset,
                    row.category,
                    row.candidates.join(", ").dimmed()
                );
            }
        }
    }
    Ok(true)
}

/// `extguard allowed-types`
pub fn print_allowed_types(config: &Config, output: OutputFormat) -> Result<bool> {
    let types = allowed_file_types(config.limits.max_file_size);

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&types)?),
        OutputFormat::Human => {
            println!("Max file size: {}\n", types.max_file_size.bold());
            for t in &types.allowed_extensions {
                println!("  .{:<6} {}", t.extension, t.mime.dimmed());
            }
            println!("\n{}", types.note);
        }
    }
    Ok(true)
}

/// `extguard config`
pub fn run_config(
    args: &ConfigArgs,
    path: &Path,
    config: &Config,
    output: OutputFormat,
) -> Result<bool> {
    if args.init {
        if Config::init_at(path)? {
            println!("Created config at {}", path.display());
        } else {
            println!("Config already exists at {}", path.display());
        }
        return Ok(true);
    }

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Human => {
            println!("# {}\n", path.display());
            print!(
                "{}",
                toml::to_string_pretty(config).context("Failed to serialize config")?
            );
        }
    }
    Ok(true)
}
