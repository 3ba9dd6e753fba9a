//! ktnh: keep Aurora clusters and RDS instances stopped
//!
//! Freezing a database creates a CloudFormation stack that stops it again
//! every time RDS restarts it after the maximum stopped period.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ktnh::aws::{AwsContext, CloudFormationClient, FromAwsContext, RdsClient, find_aws_error};
use ktnh::config::LifecycleConfig;
use ktnh::lifecycle::LifecycleController;
use ktnh::output::{format_as_json, format_as_table};
use ktnh_common::defaults::{DEFAULT_STACK_PREFIX, DEFAULT_WAIT_TIMEOUT_SECS};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ktnh")]
#[command(about = "Keep Aurora clusters or RDS instances stopped permanently")]
#[command(version)]
struct Args {
    /// Prefix for CloudFormation stack names (1-10 alphanumeric characters)
    #[arg(short, long, global = true, env = "KTNH_PREFIX", default_value = DEFAULT_STACK_PREFIX)]
    prefix: String,

    /// Don't wait for the CloudFormation stack operation to complete
    #[arg(long, global = true)]
    no_wait: bool,

    /// Timeout in seconds when waiting for a stack operation
    #[arg(long, global = true, default_value_t = DEFAULT_WAIT_TIMEOUT_SECS)]
    wait_timeout: u64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs (and list/template output) as JSON
    #[arg(short, long, global = true)]
    json_log: bool,

    /// AWS region
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long, global = true)]
    aws_profile: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Keep an Aurora cluster or RDS instance permanently stopped
    Freeze {
        /// DB cluster or DB instance identifier
        db_identifier: String,

        /// Print the CloudFormation template instead of creating the stack
        #[arg(short, long)]
        template: bool,
    },

    /// Stop keeping an Aurora cluster or RDS instance stopped
    Defrost {
        /// DB cluster or DB instance identifier
        db_identifier: String,
    },

    /// List databases kept stopped by ktnh
    List,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if let Some(suggestion) = find_aws_error(e).and_then(|aws| aws.suggestion()) {
        let _ = writeln!(stderr, "\n\x1b[36mHint:\x1b[0m {suggestion}");
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

fn init_tracing(verbose: bool, json: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };

    // Reduce noise from AWS SDK (show only warnings and errors)
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    for directive in ["aws_config=warn", "aws_sdk=warn", "aws_smithy=warn", "hyper=warn"] {
        filter = filter.add_directive(
            directive
                .parse()
                .with_context(|| format!("invalid log directive '{directive}'"))?,
        );
    }

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let config = LifecycleConfig::new(&args.prefix, args.no_wait, args.wait_timeout)?;
    init_tracing(args.verbose, args.json_log)?;

    if let Command::Version = args.command {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            commit = option_env!("KTNH_COMMIT").unwrap_or("(unknown)"),
            "ktnh"
        );
        return Ok(());
    }

    if let Some(profile) = &args.aws_profile {
        info!(profile = %profile, "Using AWS profile");
    }

    let aws = AwsContext::new(args.region.as_deref(), args.aws_profile.as_deref()).await;
    let controller = LifecycleController::new(
        CloudFormationClient::from_context(&aws),
        RdsClient::from_context(&aws),
        config.prefix.clone(),
    );

    match args.command {
        Command::Freeze {
            db_identifier,
            template,
        } => {
            let generated = controller
                .template(&db_identifier)
                .await
                .context("failed to generate CloudFormation template")?;

            if template {
                let output = if args.json_log {
                    format_as_json(&["content".to_string()], &[vec![generated.body]])
                        .context("failed to format template as JSON")?
                } else {
                    generated.body
                };
                println!("{output}");
                return Ok(());
            }

            let stack_name = controller
                .freeze(
                    &db_identifier,
                    &generated.body,
                    &generated.qualifier,
                    config.wait_timeout,
                )
                .await
                .context("failed to freeze database")?;

            info!(
                db_identifier = %db_identifier,
                db_type = %generated.kind,
                stack_name = %stack_name,
                "Database frozen"
            );
        }

        Command::Defrost { db_identifier } => {
            let stack_name = controller
                .defrost(&db_identifier, config.wait_timeout)
                .await
                .context("failed to defrost database")?;

            info!(db_identifier = %db_identifier, stack_name = %stack_name, "Database defrosted");
        }

        Command::List => {
            let databases = controller
                .list()
                .await
                .context("failed to list managed databases")?;

            if databases.is_empty() {
                info!("No databases are currently being managed by ktnh");
                return Ok(());
            }

            let output = if args.json_log {
                format_as_json(&databases.headers(), &databases.rows())
                    .context("failed to format list as JSON")?
            } else {
                format_as_table(&databases.headers(), &databases.rows())
            };
            println!("{output}");
        }

        Command::Version => {}
    }

    Ok(())
}
