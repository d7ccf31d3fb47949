use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::error;

use proofread_overlay::correction::service::{CorrectionService, FnService, ProofreadResult};
use proofread_overlay::engine::pipeline::{ElementOutcome, ProgressObserver, Session};
use proofread_overlay::{Document, Error, NodeId, ProofreadConfig, Result};

/// Proofread the readable text of a page and print it with inline annotations.
#[derive(Parser)]
#[command(name = "proofread", version, about)]
struct Cli {
    /// Page URL or local HTML file
    source: String,

    /// Correction service endpoint (overrides the config file)
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Offline corrections: one corrected text per candidate, in order
    #[arg(long = "corrected-text", value_name = "TEXT")]
    corrected_text: Vec<String>,

    /// Only list the candidate elements
    #[arg(long)]
    list: bool,

    /// Restore the page after the run and print the restored HTML
    #[arg(long)]
    restore: bool,
}

/// Prints one line per element to stderr
#[derive(Default)]
struct ConsoleProgress {
    pending: Option<String>,
}

impl ProgressObserver for ConsoleProgress {
    fn on_element_done(&mut self, _index: usize, element: NodeId, outcome: &ElementOutcome) {
        let status = match outcome {
            ElementOutcome::Changed {
                annotations,
                truncated,
                fallback: false,
            } => format!("{} annotations (+{truncated} folded)", annotations.len()),
            ElementOutcome::Changed { fallback: true, .. } => "rewritten as plain text".to_string(),
            ElementOutcome::Unchanged => "no changes".to_string(),
            ElementOutcome::Failed(reason) => format!("failed: {reason}"),
            ElementOutcome::Skipped => "skipped".to_string(),
        };
        self.pending = Some(format!("element #{}: {status}", element.index()));
    }

    fn on_progress(&mut self, done: usize, total: usize) {
        if let Some(line) = self.pending.take() {
            eprintln!("[{done}/{total}] {line}");
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ProofreadConfig::load(path)?,
        None => ProofreadConfig::default(),
    };
    if let Some(endpoint) = &cli.endpoint {
        config.service.endpoint = Some(endpoint.clone());
    }

    let mut session = Session::new(config);
    let mut doc = load(&session, &cli.source)?;
    let root = doc.root();

    if cli.list {
        for (i, candidate) in session.select(&mut doc, root).iter().enumerate() {
            let text = doc.text_content(candidate.element);
            println!(
                "{:>2}. [{}] <{}> {}",
                i + 1,
                candidate.kind.as_str(),
                doc.tag(candidate.element),
                text.split_whitespace().collect::<Vec<_>>().join(" ")
            );
        }
        return Ok(());
    }

    let mut service = build_service(&session, cli.corrected_text)?;
    let mut progress = ConsoleProgress::default();
    let summary = session.run(&mut doc, root, service.as_mut(), &mut progress);
    eprintln!(
        "{} candidates, {} changed, {} unchanged, {} failed",
        summary.candidates, summary.changed, summary.unchanged, summary.failed
    );

    if cli.restore {
        session.restore_all(&mut doc);
    }
    println!("{}", doc.outer_html(root));
    Ok(())
}

fn load(session: &Session, source: &str) -> Result<Document> {
    let path = Path::new(source);
    if path.exists() {
        let html = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        return Ok(session.process_html(&html, ""));
    }
    load_remote(session, source)
}

#[cfg(feature = "http")]
fn load_remote(session: &Session, url: &str) -> Result<Document> {
    Ok(session.load_page(url)?)
}

#[cfg(not(feature = "http"))]
fn load_remote(_session: &Session, url: &str) -> Result<Document> {
    Err(Error::Io {
        path: url.to_string(),
        source: std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file, and HTTP support is disabled",
        ),
    })
}

fn build_service(
    session: &Session,
    corrected: Vec<String>,
) -> Result<Box<dyn CorrectionService>> {
    if !corrected.is_empty() {
        let mut queue = VecDeque::from(corrected);
        return Ok(Box::new(FnService::new(move |_text: &str| {
            Ok(queue
                .pop_front()
                .map(ProofreadResult::corrected)
                .unwrap_or_default())
        })));
    }
    http_service(session)
}

#[cfg(feature = "http")]
fn http_service(session: &Session) -> Result<Box<dyn CorrectionService>> {
    use proofread_overlay::correction::service::HttpCorrectionService;
    use proofread_overlay::ServiceError;

    let service = &session.config().service;
    let endpoint = service.endpoint.as_deref().ok_or_else(|| {
        ServiceError::Rejected("no correction service: pass --endpoint or --corrected-text".into())
    })?;
    Ok(Box::new(HttpCorrectionService::new(endpoint, service)?))
}

#[cfg(not(feature = "http"))]
fn http_service(_session: &Session) -> Result<Box<dyn CorrectionService>> {
    Err(proofread_overlay::ServiceError::Rejected(
        "HTTP support is disabled; pass --corrected-text".into(),
    )
    .into())
}
