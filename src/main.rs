use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use claimcheck::llm::HttpLlmClient;
use claimcheck::ocr::HttpOcrClient;
use claimcheck::pipeline::{Pipeline, RunRequest};
use claimcheck::{config, init_tracing};

/// Verify one claim document: OCR, model extraction, validation, verdict.
///
/// Prints the final result as JSON on stdout; the full audit trail is
/// written under the runs directory.
#[derive(Parser, Debug)]
#[command(name = "claimcheck-run", version, about)]
struct Cli {
    /// Path to the document file (PDF or scanned image)
    file: PathBuf,

    /// Applicant full name, as entered in the claim
    #[arg(long)]
    fio: Option<String>,

    /// Claim reason, free text
    #[arg(long)]
    reason: Option<String>,

    /// Expected document type
    #[arg(long)]
    doc_type: String,

    /// OCR service endpoint
    #[arg(long, default_value = "http://localhost:8000/ocr")]
    ocr_url: String,

    /// OCR engine name passed to the service
    #[arg(long, default_value = "tesseract")]
    ocr_engine: String,

    /// LLM chat-completions endpoint
    #[arg(long, default_value = "http://localhost:11434/v1/chat/completions")]
    llm_url: String,

    /// LLM model name
    #[arg(long, default_value = "gpt-4o-mini")]
    llm_model: String,

    /// LLM API key, read from the environment when not given
    #[arg(long, env = "CLAIMCHECK_LLM_API_KEY", hide_env_values = true)]
    llm_api_key: Option<String>,

    /// Root directory for per-run artifact trees
    #[arg(long)]
    runs_root: Option<PathBuf>,

    /// HTTP timeout in seconds for OCR and LLM calls
    #[arg(long, default_value_t = 120)]
    timeout: u64,
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        tracing::error!(error = %err, "Run failed");
        for cause in err.chain().skip(1) {
            tracing::error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let ocr = HttpOcrClient::new(&cli.ocr_url, &cli.ocr_engine, cli.timeout)
        .context("building OCR client")?;
    let llm = HttpLlmClient::new(&cli.llm_url, &cli.llm_model, cli.llm_api_key, cli.timeout)
        .context("building LLM client")?;
    let runs_root = cli.runs_root.unwrap_or_else(config::default_runs_root);

    let original_filename = cli
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .context("file path has no usable filename")?;

    let request = RunRequest {
        fio: cli.fio,
        reason: cli.reason,
        doc_type: cli.doc_type,
        source_path: cli.file,
        original_filename,
        content_type: None,
    };

    let result = Pipeline::new(&ocr, &llm, &runs_root).run(&request);
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.verdict {
        std::process::exit(2);
    }
    Ok(())
}
