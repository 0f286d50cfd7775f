//! asgtag: find Auto Scaling groups by name and tags, and reconcile resource tags
//!
//! Prints one JSON document on stdout per invocation. Logs go to stderr.

use anyhow::Result;
use asgtag::aws::classify_anyhow_error;
use asgtag::commands;
use asgtag::config::{
    AwsConfig, FindConfig, OutputFormat, TagConfig, TargetKind, collect_tags, load_tags_file,
    parse_tag_pair,
};
use asgtag::output::{FailureReport, QueryReport, print_json, render_table};
use asgtag_core::{ApplyMode, EmptyResultPolicy, QueryOptions, TagState};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, error};

#[derive(Parser, Debug)]
#[command(name = "asgtag")]
#[command(about = "Find Auto Scaling groups and reconcile resource tags")]
#[command(version)]
struct Args {
    #[command(flatten)]
    aws: AwsArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct AwsArgs {
    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1", global = true)]
    region: String,

    /// AWS profile to use (overrides default credential resolution)
    #[arg(long, env = "AWS_PROFILE", global = true)]
    aws_profile: Option<String>,
}

impl From<AwsArgs> for AwsConfig {
    fn from(args: AwsArgs) -> Self {
        Self {
            region: args.region,
            aws_profile: args.aws_profile,
        }
    }
}

#[derive(clap::Args, Debug)]
struct FindArgs {
    /// Group name prefix (a regular expression anchored at the start)
    #[arg(long)]
    name: Option<String>,

    /// Required tag as KEY=VALUE; repeat to require several
    #[arg(long = "tag", value_name = "KEY=VALUE", value_parser = parse_tag_pair)]
    tags: Vec<(String, String)>,

    /// Fail when more groups than this match (0 = unbounded)
    #[arg(long, default_value_t = 0)]
    limit_results: usize,

    /// What to do when nothing matches (success, fail)
    #[arg(long, default_value = "success")]
    no_result_action: EmptyResultPolicy,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,
}

impl FindArgs {
    fn into_config(self, aws: AwsConfig) -> Result<FindConfig> {
        Ok(FindConfig {
            aws,
            query: QueryOptions {
                name: self.name,
                tags: collect_tags(self.tags)?,
                limit_results: self.limit_results,
                empty_result: self.no_result_action,
            },
            format: self.format,
        })
    }
}

#[derive(clap::Args, Debug)]
struct TagArgs {
    /// Kind of resource to tag
    #[arg(long, value_enum, default_value = "asg")]
    kind: TargetKind,

    /// Group or cache cluster name
    #[arg(long)]
    name: String,

    /// Desired tag as KEY=VALUE; repeat for several
    #[arg(long = "tag", value_name = "KEY=VALUE", value_parser = parse_tag_pair)]
    tags: Vec<(String, String)>,

    /// JSON file with desired tags, e.g. {"env": "prod"}
    #[arg(long, conflicts_with = "tags")]
    tags_file: Option<PathBuf>,

    /// Whether the tags should be present or absent (present, absent)
    #[arg(long, default_value = "present")]
    state: TagState,

    /// Report what would change without applying it
    #[arg(long)]
    dry_run: bool,
}

impl TagArgs {
    fn into_config(self, aws: AwsConfig) -> Result<TagConfig> {
        let desired = match &self.tags_file {
            Some(path) => load_tags_file(path)?,
            None => collect_tags(self.tags)?,
        };

        Ok(TagConfig {
            aws,
            kind: self.kind,
            name: self.name,
            desired,
            state: self.state,
            mode: if self.dry_run {
                ApplyMode::DryRun
            } else {
                ApplyMode::Apply
            },
        })
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find Auto Scaling groups by name prefix and tags
    Find(FindArgs),

    /// Make a resource's tags match the desired set
    Tag(TagArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        if let Err(write_err) = print_json(&FailureReport::from_error(&e)) {
            error!(error = %write_err, "Failed to write failure report to stdout");
        }
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

    if let Some(hint) = classify_anyhow_error(e).suggestion() {
        let _ = writeln!(stderr, "\n\x1b[36mHint:\x1b[0m {hint}");
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

async fn run() -> Result<()> {
    let args = Args::parse();

    // stdout carries the JSON result, so logs go to stderr.
    // AWS SDK targets only show warnings and errors.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
                .add_directive("aws_config=warn".parse()?)
                .add_directive("aws_smithy_runtime=warn".parse()?)
                .add_directive("aws_sdk_autoscaling=warn".parse()?)
                .add_directive("aws_sdk_elasticache=warn".parse()?)
                .add_directive("aws_sdk_sts=warn".parse()?),
        )
        .init();

    let aws: AwsConfig = args.aws.into();
    debug!(region = %aws.region, profile = ?aws.aws_profile, "AWS settings");

    match args.command {
        Command::Find(find_args) => {
            let config = find_args.into_config(aws)?;
            let outcome = commands::run_find(&config).await?;
            match config.format {
                OutputFormat::Json => print_json(&QueryReport::from(&outcome))?,
                OutputFormat::Table => println!("{}", render_table(&outcome.results)),
            }
        }

        Command::Tag(tag_args) => {
            let config = tag_args.into_config(aws)?;
            let report = commands::run_tag(&config).await?;
            print_json(&report)?;
        }
    }

    Ok(())
}
