//! Pod Security Readiness - command line entry point.
//!
//! Runs readiness passes against an offline cluster snapshot:
//! - `evaluate`: one full pass, printing the eight conditions
//! - `resolve`: the level and category each namespace would be evaluated at
//! - `check`: configuration validation

use clap::{Args, Parser, Subcommand};
use psr_common::OutputFormat;
use psr_config::{load_config, LoadedConfig};
use psr_core::classify::classify;
use psr_core::cluster::ClusterClient;
use psr_core::conditions::ConditionStatus;
use psr_core::controller::{PassReport, ReadinessController};
use psr_core::exit_codes::ExitCode;
use psr_core::log_event;
use psr_core::logging::{
    event_names, generate_run_id, get_host_id, init_logging, LogConfig, LogContext, LogFormat,
    LogLevel, Stage,
};
use psr_core::resolve::resolve;
use psr_core::snapshot::SnapshotCluster;
use psr_core::status::{FileStatusPublisher, OperatorStatus};
use psr_core::DefaultChecks;
use std::path::PathBuf;

/// Pod Security Readiness - simulate Pod Security enforcement before rollout
#[derive(Parser)]
#[command(name = "psr-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to the controller config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Log format on stderr
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one readiness pass over a cluster snapshot
    Evaluate(EvaluateArgs),

    /// Show the level and category each namespace resolves to
    Resolve(ResolveArgs),

    /// Validate configuration
    Check,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// Cluster snapshot (JSON)
    #[arg(long)]
    snapshot: PathBuf,

    /// Existing operator status to merge the conditions into
    #[arg(long)]
    status: Option<PathBuf>,

    /// Write the merged operator status to this file. Merges into `--status`
    /// when given, otherwise into the file's current content
    #[arg(long)]
    write_status: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ResolveArgs {
    /// Cluster snapshot (JSON)
    #[arg(long)]
    snapshot: PathBuf,

    /// Only show this namespace
    #[arg(long)]
    namespace: Option<String>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    init_logging(&LogConfig::from_env(cli_level, cli.global.log_format));

    let ctx = LogContext::new(generate_run_id(), get_host_id());
    let exit_code = match &cli.command {
        Commands::Evaluate(args) => run_evaluate(&cli.global, args, ctx),
        Commands::Resolve(args) => run_resolve(&cli.global, args),
        Commands::Check => run_check(&cli.global),
    };
    std::process::exit(exit_code.as_i32());
}

fn load(global: &GlobalOpts) -> Result<LoadedConfig, ExitCode> {
    load_config(global.config.as_deref()).map_err(|err| {
        let err = psr_common::Error::Config(err.to_string());
        report_error(global, &err)
    })
}

fn load_snapshot(
    global: &GlobalOpts,
    path: &std::path::Path,
    version: &str,
) -> Result<SnapshotCluster, ExitCode> {
    SnapshotCluster::from_path(path)
        .map(|cluster| cluster.with_version(version))
        .map_err(|err| report_error(global, &err))
}

/// Print an error in the requested format and pick its exit code.
fn report_error(global: &GlobalOpts, err: &psr_common::Error) -> ExitCode {
    let code = ExitCode::from(err);
    match global.format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "status": "error",
                "error": {
                    "code": err.code(),
                    "category": err.category(),
                    "message": err.to_string(),
                    "remediation": err.remediation(),
                },
                "exit_code": code.code_name(),
            });
            println!("{}", body);
        }
        OutputFormat::Human | OutputFormat::Summary => eprintln!("{}", err.format_human()),
    }
    code
}

fn run_evaluate(global: &GlobalOpts, args: &EvaluateArgs, ctx: LogContext) -> ExitCode {
    let loaded = match load(global) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    log_event!(
        ctx,
        DEBUG,
        event_names::CONFIG_LOADED,
        Stage::Init,
        "configuration loaded",
        source = tracing::field::display(&loaded.resolved.source)
    );

    let cluster = match load_snapshot(global, &args.snapshot, &loaded.config.pod_security_version) {
        Ok(cluster) => cluster,
        Err(code) => return code,
    };
    log_event!(
        ctx,
        DEBUG,
        event_names::SNAPSHOT_LOADED,
        Stage::Init,
        "cluster snapshot loaded",
        namespaces = cluster.snapshot().namespaces.len()
    );

    let checks = DefaultChecks::new();
    let controller = ReadinessController::new(&cluster, &checks, &loaded.config, ctx);
    let base = match &args.status {
        Some(path) => match OperatorStatus::load(path) {
            Ok(status) => Some(status),
            Err(err) => return report_error(global, &err),
        },
        None => None,
    };

    // The written file and the printed status come from the same merge.
    let (result, status) = match &args.write_status {
        Some(path) => {
            let publisher = FileStatusPublisher::new(path);
            let publisher = match base {
                Some(base) => publisher.with_base(base),
                None => publisher,
            };
            let result = controller.sync(&publisher);
            (result, publisher.written())
        }
        None => {
            let result = controller.evaluate();
            let status = match (&result, base) {
                (Ok(report), Some(mut status)) => {
                    status.apply(&report.conditions, chrono::Utc::now());
                    Some(status)
                }
                _ => None,
            };
            (result, status)
        }
    };
    let report = match result {
        Ok(report) => report,
        Err(err) => {
            let err = psr_common::Error::Cluster(err.to_string());
            return report_error(global, &err);
        }
    };

    let code = ExitCode::for_report(&report);
    print_report(global.format, &report, status.as_ref(), code);
    code
}

fn print_report(format: OutputFormat, report: &PassReport, status: Option<&OperatorStatus>, code: ExitCode) {
    match format {
        OutputFormat::Json => {
            let mut body = serde_json::json!({
                "run_id": report.run_id,
                "exit_code": code.code_name(),
                "summary": {
                    "listed": report.listed,
                    "skipped_enforcing": report.skipped_enforcing,
                    "evaluated": report.evaluated,
                    "violating": report.violating,
                    "inconclusive": report.inconclusive,
                    "failed": report.failures.len(),
                },
                "conditions": report.conditions,
                "namespaces": report.detections,
                "failures": report.failures,
            });
            if let Some(status) = status {
                body["status"] = serde_json::to_value(status).unwrap_or_default();
            }
            match serde_json::to_string_pretty(&body) {
                Ok(text) => println!("{}", text),
                Err(err) => eprintln!("failed to serialize report: {}", err),
            }
        }
        OutputFormat::Human => {
            println!("Pod Security readiness ({})", report.run_id);
            println!(
                "  evaluated {} of {} namespaces ({} already enforcing)",
                report.evaluated, report.listed, report.skipped_enforcing
            );
            println!();
            for condition in &report.conditions {
                let marker = match condition.status {
                    ConditionStatus::True => "✗",
                    ConditionStatus::False => "✓",
                };
                println!("{} {} [{}]", marker, condition.condition_type, condition.reason);
                if let Some(message) = &condition.message {
                    println!("    {}", message);
                }
            }
            for failure in &report.failures {
                println!("! {}: {}", failure.namespace, failure.error);
            }
        }
        OutputFormat::Summary => {
            println!(
                "{}: evaluated={} violating={} inconclusive={} failed={} skipped={}",
                code.code_name(),
                report.evaluated,
                report.violating,
                report.inconclusive,
                report.failures.len(),
                report.skipped_enforcing
            );
        }
    }
}

fn run_resolve(global: &GlobalOpts, args: &ResolveArgs) -> ExitCode {
    let loaded = match load(global) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let cluster = match load_snapshot(global, &args.snapshot, &loaded.config.pod_security_version) {
        Ok(cluster) => cluster,
        Err(code) => return code,
    };
    let namespaces = match cluster.list_namespaces() {
        Ok(namespaces) => namespaces,
        Err(err) => return report_error(global, &psr_common::Error::Cluster(err.to_string())),
    };

    let selected: Vec<_> = namespaces
        .iter()
        .filter(|ns| args.namespace.as_deref().is_none_or(|name| ns.name() == name))
        .collect();
    if selected.is_empty() {
        if let Some(name) = &args.namespace {
            eprintln!("namespace {:?} not found in snapshot", name);
            return ExitCode::ArgsError;
        }
    }

    let rows: Vec<serde_json::Value> = selected
        .iter()
        .map(|ns| {
            let category = classify(ns);
            match resolve(ns) {
                Ok(resolved) => serde_json::json!({
                    "namespace": ns.name(),
                    "category": category,
                    "enforcing": ns.is_enforcing(),
                    "level": resolved.value,
                    "source": resolved.source,
                }),
                Err(err) => serde_json::json!({
                    "namespace": ns.name(),
                    "category": category,
                    "enforcing": ns.is_enforcing(),
                    "level": null,
                    "error": err.to_string(),
                }),
            }
        })
        .collect();

    match global.format {
        OutputFormat::Json => match serde_json::to_string_pretty(&rows) {
            Ok(text) => println!("{}", text),
            Err(err) => return report_error(global, &psr_common::Error::Json(err)),
        },
        OutputFormat::Human | OutputFormat::Summary => {
            for row in &rows {
                println!(
                    "{:<40} {:<18} {}",
                    row["namespace"].as_str().unwrap_or_default(),
                    row["category"].as_str().unwrap_or_default(),
                    row["level"].as_str().unwrap_or("-"),
                );
            }
        }
    }
    ExitCode::Clean
}

fn run_check(global: &GlobalOpts) -> ExitCode {
    let loaded = match load(global) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    match global.format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "status": "ok",
                "config": loaded.snapshot,
            });
            println!("{}", body);
        }
        OutputFormat::Human | OutputFormat::Summary => {
            println!(
                "✓ configuration ok ({}, schema {})",
                loaded.resolved.source, loaded.snapshot.schema_version
            );
        }
    }
    ExitCode::Clean
}
