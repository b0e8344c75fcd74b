mod edits;

use anyhow::Context;
use clap::{Parser, Subcommand};
use form_tree::{Questionnaire, QuestionnaireTree};
use formbuilder_validation::{BatchReport, BatchValidator, ValidationConfig, ValidationContext};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "FORMBUILDER_CONFIG";

#[derive(Parser)]
#[command(name = "formbuilder-playground")]
#[command(about = "Validate FHIR Questionnaire forms the way the form builder does")]
struct Cli {
    /// YAML validation config. Falls back to $FORMBUILDER_CONFIG, then to defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a Questionnaire, run a batch validation pass and print the errors
    Validate {
        file: PathBuf,
        /// JSON edit script replayed after the batch pass
        #[arg(long)]
        edits: Option<PathBuf>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a new, empty form
    New,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorLine<'a> {
    link_id: Option<&'a str>,
    code: &'static str,
    path: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct Output<'a> {
    report: &'a BatchReport,
    errors: Vec<ErrorLine<'a>>,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ValidationConfig> {
    let path = match path {
        Some(path) => Some(path.to_path_buf()),
        None => std::env::var_os(CONFIG_ENV).map(PathBuf::from),
    };
    match path {
        Some(path) => Ok(ValidationConfig::load(&path)?),
        None => Ok(ValidationConfig::default()),
    }
}

/// Errors in tree order, fields in validator order.
fn collect_errors<'a>(ctx: &'a ValidationContext, tree: &'a QuestionnaireTree) -> Vec<ErrorLine<'a>> {
    tree.validation_nodes()
        .into_iter()
        .filter_map(|id| ctx.status(id).map(|status| (id, status)))
        .flat_map(|(id, status)| {
            let link_id = tree.item(id).and_then(|item| item.link_id());
            status.errors.values().flatten().map(move |error| ErrorLine {
                link_id,
                code: error.code.as_str(),
                path: &error.path,
                message: &error.message,
            })
        })
        .collect()
}

async fn validate(
    config: ValidationConfig,
    file: &Path,
    script: Option<&Path>,
    json: bool,
) -> anyhow::Result<bool> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let mut form = Questionnaire::parse(&content)
        .with_context(|| format!("failed to load {}", file.display()))?;
    tracing::info!(path = %file.display(), items = form.tree.len(), "Questionnaire loaded");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let mut ctx = ValidationContext::new(config);
    let mut run = BatchValidator::schedule_all(&form.tree);
    let report = run.drive(&mut ctx, &form.tree, &cancel).await?;

    if let Some(path) = script {
        for edit in edits::load(path)? {
            edits::apply(&mut ctx, &mut form.tree, &edit)?;
        }
    }

    let errors = collect_errors(&ctx, &form.tree);
    if json {
        let output = Output {
            report: &report,
            errors,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "{} unit(s) validated, {} skipped, {} error(s) found by the batch pass",
            report.validated, report.skipped, report.error_count
        );
        for line in &errors {
            println!(
                "{:<24} {:<28} {:<32} {}",
                line.link_id.unwrap_or("<no linkId>"),
                line.code,
                line.path,
                line.message
            );
        }
    }
    Ok(ctx.is_clean())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate { file, edits, json } => {
            let clean = validate(config, &file, edits.as_deref(), json).await?;
            if !clean {
                std::process::exit(1);
            }
        }
        Commands::New => {
            let form = Questionnaire::default_form();
            println!("{}", serde_json::to_string_pretty(&form.to_json())?);
        }
    }
    Ok(())
}
