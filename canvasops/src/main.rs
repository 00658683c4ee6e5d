use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use canvasops::config::{Config, ConfigOverrides};
use canvasops::core::output::{OutputFormat as WriterFormat, OutputWriter};

mod commands;

#[derive(Parser)]
#[command(name = "canvasops")]
#[command(author, version)]
#[command(
    about = "Bulk URL find & replace across Canvas LMS course content",
    long_about = "Scans syllabi, pages, assignments, quizzes, discussions and announcements \
                  in one or more Canvas courses for URLs, previews the replacements, and \
                  optionally writes them back through the Canvas REST API."
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (json, text, markdown)
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Config file (defaults to ./canvasops.toml over ~/.config/canvasops/config.toml)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Canvas instance, e.g. school.instructure.com
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Canvas API token (prefer CANVAS_API_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Target the beta instance
    #[arg(long, global = true)]
    beta: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

impl From<OutputFormat> for WriterFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => WriterFormat::Text,
            OutputFormat::Json => WriterFormat::Json,
            OutputFormat::Markdown => WriterFormat::Markdown,
        }
    }
}

#[derive(Args)]
#[group(id = "target", required = true, multiple = false)]
struct TargetArgs {
    /// Single course id
    #[arg(long)]
    course: Option<String>,

    /// Comma-separated course ids
    #[arg(long, value_delimiter = ',')]
    courses: Option<Vec<String>>,

    /// Subaccount whose courses are scanned
    #[arg(long)]
    subaccount: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Find and replace URLs in course content (preview unless --live)
    FindReplace {
        #[command(flatten)]
        target: TargetArgs,

        /// Enrollment term filter (subaccount scope only)
        #[arg(long, requires = "subaccount", conflicts_with_all = ["course", "courses"])]
        term: Option<String>,

        /// Workflow state filter, repeatable (subaccount scope only)
        #[arg(long = "state", requires = "subaccount", conflicts_with_all = ["course", "courses"])]
        states: Vec<String>,

        /// Content types to scan
        #[arg(
            short,
            long,
            value_delimiter = ',',
            default_value = "syllabus,pages,assignments,quizzes,discussions,announcements"
        )]
        types: Vec<String>,

        /// Mapping as OLD=NEW, repeatable
        #[arg(short, long = "map")]
        maps: Vec<String>,

        /// TOML file of [[mapping]] tables
        #[arg(long)]
        mappings_file: Option<PathBuf>,

        /// Write changes back to Canvas
        #[arg(long)]
        live: bool,

        /// Also write the report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List courses in a subaccount
    Courses {
        #[arg(long)]
        subaccount: String,

        #[arg(long)]
        term: Option<String>,

        #[arg(long = "state")]
        states: Vec<String>,
    },

    /// List enrollment terms of an account
    Terms {
        #[arg(long, default_value = "1")]
        account: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default config file
    Init {
        /// Destination (defaults to ./canvasops.toml)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so reports on stdout stay parseable
    let default_filter = if cli.verbose { "canvasops=debug" } else { "canvasops=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let format: WriterFormat = cli.format.into();

    if let Err(e) = run(cli, format).await {
        OutputWriter::new(format).write_error(&format!("{:#}", e))?;
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli, format: WriterFormat) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_env();
    config.apply_overrides(&ConfigOverrides {
        base_url: cli.base_url,
        api_token: cli.token,
        beta: cli.beta,
    });

    match cli.command {
        Commands::FindReplace {
            target,
            term,
            states,
            types,
            maps,
            mappings_file,
            live,
            output,
        } => {
            let options = commands::find_replace::FindReplaceOptions {
                course: target.course,
                courses: target.courses,
                subaccount: target.subaccount,
                term,
                states,
                types,
                maps,
                mappings_file,
                live,
                output,
            };
            commands::find_replace::run(options, &config, format).await
        }
        Commands::Courses {
            subaccount,
            term,
            states,
        } => commands::courses::run(subaccount, term, states, &config, format).await,
        Commands::Terms { account } => commands::terms::run(account, &config, format).await,
        Commands::Config { action } => match action {
            ConfigAction::Init { path } => commands::config_init::run(path),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_term_filter_rejected_outside_subaccount() {
        for args in [
            vec!["canvasops", "find-replace", "--course", "1", "--term", "5", "-m", "a=b"],
            vec!["canvasops", "find-replace", "--courses", "1,2", "--state", "available", "-m", "a=b"],
        ] {
            assert!(Cli::try_parse_from(args.iter().copied()).is_err(), "accepted {:?}", args);
        }
    }

    #[test]
    fn test_term_filter_accepted_with_subaccount() {
        let cli = Cli::try_parse_from([
            "canvasops",
            "find-replace",
            "--subaccount",
            "12",
            "--term",
            "5",
            "--state",
            "available",
            "-m",
            "a=b",
        ])
        .unwrap();
        match cli.command {
            Commands::FindReplace { target, term, states, .. } => {
                assert_eq!(target.subaccount.as_deref(), Some("12"));
                assert_eq!(term.as_deref(), Some("5"));
                assert_eq!(states, vec!["available"]);
            }
            _ => panic!("expected find-replace"),
        }
    }
}
