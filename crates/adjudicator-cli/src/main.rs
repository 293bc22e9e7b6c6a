//! Adjudicator CLI

use adjudicator_core::{
    Address, AddressId, CaseStatus, Decision, DecisionRequest, QualificationInput, Subject,
};
use adjudicator_runtime::{
    CasePipeline, InMemoryStore, LegalQualifier, OracleClient, OracleRegistry, QualificationMode,
    RuntimeConfig, SubjectRepository, Upload, CONFIG_ENV,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "adjudicator")]
#[command(about = "Workplace-accident claim adjudication")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Runtime configuration file (YAML)
    #[arg(short, long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Qualify an accident description (QualificationInput JSON)
    Qualify {
        /// Path to the request body
        #[arg(short, long)]
        input: PathBuf,

        /// Use the rule tables only, without calling the oracle
        #[arg(long)]
        rules: bool,
    },

    /// Extract accident facts from documents
    Extract {
        /// Documents to extract
        #[arg(short, long = "file", required = true)]
        files: Vec<PathBuf>,
    },

    /// Open a case, process it and optionally decide it
    Process {
        /// Subject JSON (with optional `addresses`)
        #[arg(short, long)]
        subject: PathBuf,

        /// Case documents
        #[arg(short, long = "file", required = true)]
        files: Vec<PathBuf>,

        /// Reviewer decision to apply after processing
        #[arg(short, long, value_enum)]
        decision: Option<DecisionArg>,

        /// Reviewer comment
        #[arg(long)]
        comment: Option<String>,

        /// Print the accident card of the decided case
        #[arg(long)]
        card: bool,
    },

    /// Validate the configuration and print the effective values
    CheckConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum DecisionArg {
    Accepted,
    Failed,
    NeedMoreInfo,
}

impl From<DecisionArg> for Decision {
    fn from(arg: DecisionArg) -> Self {
        match arg {
            DecisionArg::Accepted => Decision::Accepted,
            DecisionArg::Failed => Decision::Failed,
            DecisionArg::NeedMoreInfo => Decision::NeedMoreInfo,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubjectFile {
    #[serde(flatten)]
    subject: Subject,
    #[serde(default)]
    addresses: Vec<AddressEntry>,
}

#[derive(Deserialize)]
struct AddressEntry {
    id: AddressId,
    #[serde(flatten)]
    address: Address,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Qualify { input, rules } => cmd_qualify(&config, &input, rules).await,
        Commands::Extract { files } => cmd_extract(&config, &files).await,
        Commands::Process {
            subject,
            files,
            decision,
            comment,
            card,
        } => cmd_process(&config, &subject, &files, decision, comment, card).await,
        Commands::CheckConfig => cmd_check_config(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            RuntimeConfig::from_yaml_file(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))
        }
        None => Ok(RuntimeConfig::default()),
    }
}

fn build_oracle(config: &RuntimeConfig) -> Result<Arc<dyn OracleClient>> {
    let registry = OracleRegistry::with_defaults();
    registry
        .create(&config.oracle.provider, &config.oracle.provider_config())
        .with_context(|| format!("Failed to create oracle provider '{}'", config.oracle.provider))
}

fn build_pipeline(config: &RuntimeConfig) -> Result<(CasePipeline, Arc<InMemoryStore>)> {
    let oracle = build_oracle(config)?;
    let store = Arc::new(InMemoryStore::new());
    let pipeline = CasePipeline::new(oracle, store.clone(), config);
    Ok((pipeline, store))
}

async fn cmd_qualify(config: &RuntimeConfig, input: &Path, rules: bool) -> Result<()> {
    let request: QualificationInput = read_json(input)?;

    let result = if rules || config.qualification.mode == QualificationMode::Rules {
        LegalQualifier::rules_only(config.qualification.policy())
            .qualify(&request)
            .await?
    } else {
        let (pipeline, _) = build_pipeline(config)?;
        pipeline.qualify(&request).await?
    };

    info!(
        should_accept = result.should_accept,
        pkd_probability = result.pkd_probability,
        "Qualification finished"
    );
    print_json(&result)
}

async fn cmd_extract(config: &RuntimeConfig, files: &[PathBuf]) -> Result<()> {
    let (pipeline, _) = build_pipeline(config)?;
    let uploads = files.iter().map(|f| read_upload(f)).collect::<Result<Vec<_>>>()?;

    let response = pipeline.extract_documents(uploads).await?;
    print_json(&response)
}

async fn cmd_process(
    config: &RuntimeConfig,
    subject: &Path,
    files: &[PathBuf],
    decision: Option<DecisionArg>,
    comment: Option<String>,
    card: bool,
) -> Result<()> {
    let (pipeline, store) = build_pipeline(config)?;

    let SubjectFile { subject, addresses } = read_json(subject)?;
    let subject_id = subject.id;
    for entry in addresses {
        store.insert_address(entry.id, entry.address).await?;
    }
    store.insert_subject(subject).await?;

    let uploads = files.iter().map(|f| read_upload(f)).collect::<Result<Vec<_>>>()?;
    let case = pipeline.create_case(Some(subject_id), uploads).await?;
    info!(case_id = %case.id, "Case created");

    let outcome = pipeline
        .dispatch_processing(case.id)
        .await
        .context("Processing failed")?;
    for warning in &outcome.integrity_warnings {
        tracing::warn!("{}", warning);
    }
    print_json(&outcome)?;

    let Some(processed) = outcome.case else {
        bail!("Case {} was discarded", case.id);
    };

    let Some(decision) = decision else {
        return Ok(());
    };
    if processed.status != CaseStatus::Processing {
        bail!("Case {} is {} and cannot be decided", processed.id, processed.status);
    }

    let request = DecisionRequest {
        decision: decision.into(),
        comment,
    };
    let decided = pipeline
        .decide(processed.id, request, processed.revision)
        .await
        .context("Decision rejected")?;
    print_json(&decided)?;

    if card {
        let card = pipeline
            .accident_card(decided.id)
            .await
            .context("Accident card unavailable")?;
        print_json(&card)?;
    }
    Ok(())
}

fn cmd_check_config(config: &RuntimeConfig) -> Result<()> {
    config.validate()?;

    let registry = OracleRegistry::with_defaults();
    if config.qualification.mode == QualificationMode::Oracle {
        registry
            .validate(&config.oracle.provider, &config.oracle.provider_config())
            .with_context(|| format!("Oracle provider '{}' is misconfigured", config.oracle.provider))?;
    }

    println!("{}", serde_yaml::to_string(config)?);
    println!("# available oracle providers: {}", registry.available_types().join(", "));
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn read_upload(path: &Path) -> Result<Upload> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Upload::new(bytes, media_type(path), name))
}

fn media_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
