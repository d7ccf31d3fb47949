use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::ProofreadConfig;
use crate::correction::service::{CorrectionService, ProofreadResult};
use crate::correction::span::{apply_spans, to_byte_offsets, validate_spans, SpanIndex};
use crate::dom::{Document, NodeId};
use crate::ledger::Ledger;
use crate::render::annotate::{Annotation, AnnotationRenderer, RenderInput};
use crate::render::layout::{compute_layout, ensure_layout};
use crate::select::{ContentCandidate, ContentSelector};
use crate::text::align::{align, has_changes};
use crate::text::tokenizer::tokenize;

/// What happened to one candidate element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementOutcome {
    /// The service found nothing to fix
    Unchanged,
    /// Annotations were applied; `fallback` means plain corrected text was
    /// written because the markup could not be applied
    Changed {
        annotations: Vec<Annotation>,
        truncated: usize,
        fallback: bool,
    },
    /// The service failed for this element
    Failed(String),
    /// The element was gone or empty by the time its turn came
    Skipped,
}

/// Receives progress callbacks, in processing order, from [`Session::run`].
///
/// Every method has a no-op default.
pub trait ProgressObserver {
    fn on_element_start(&mut self, _index: usize, _element: NodeId) {}

    /// Bring the element on screen before it is proofread.
    fn scroll_into_view(&mut self, _element: NodeId) {}

    fn on_element_done(&mut self, _index: usize, _element: NodeId, _outcome: &ElementOutcome) {}

    fn on_progress(&mut self, _done: usize, _total: usize) {}
}

pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

/// Cancels a running session, possibly from another thread.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub candidates: usize,
    pub processed: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: bool,
}

/// The proofreading pipeline: Select → Proofread → Align → Render → Apply
///
/// A session owns everything one page needs between runs: the config, the
/// mutation ledger and the cancellation flag. Elements are processed one at
/// a time.
pub struct Session {
    config: ProofreadConfig,
    renderer: AnnotationRenderer,
    ledger: Ledger,
    cancel: Arc<AtomicBool>,
}

impl Session {
    pub fn new(config: ProofreadConfig) -> Self {
        Self {
            renderer: AnnotationRenderer::new(&config.render),
            config,
            ledger: Ledger::new(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &ProofreadConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.cancel))
    }

    /// Ask a running [`Session::run`] to stop after the current step.
    pub fn stop(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Fetch a URL and prepare it for a run.
    #[cfg(feature = "http")]
    pub fn load_page(&self, url: &str) -> Result<Document, crate::net::fetch::FetchError> {
        let fetched = crate::net::fetch::fetch_url(url, &self.config.service)?;
        Ok(self.process_html(&fetched.html, &fetched.url))
    }

    /// Parse raw HTML and lay it out.
    pub fn process_html(&self, html: &str, url: &str) -> Document {
        // Phase 1: Parse
        let mut doc = Document::parse(html, url);

        // Phase 2: Layout
        compute_layout(&mut doc, self.config.viewport_width);
        doc
    }

    /// Candidate elements under `root`, in reading order.
    pub fn select(&self, doc: &mut Document, root: NodeId) -> Vec<ContentCandidate> {
        doc.refresh_source();
        ensure_layout(doc, self.config.viewport_width);
        ContentSelector::new(&self.config).select_candidates(doc, root)
    }

    /// Proofread every candidate under `root` and annotate the changes.
    ///
    /// Clears any earlier stop request first. Cancellation is honoured before
    /// each element, after the scroll pause and after the service answers;
    /// annotations already applied stay in place.
    pub fn run(
        &mut self,
        doc: &mut Document,
        root: NodeId,
        service: &mut dyn CorrectionService,
        observer: &mut dyn ProgressObserver,
    ) -> RunSummary {
        self.cancel.store(false, Ordering::SeqCst);

        // Phase 1: Select
        let candidates = self.select(doc, root);
        let total = candidates.len().min(self.config.max_elements_per_run);
        let mut summary = RunSummary {
            candidates: candidates.len(),
            ..RunSummary::default()
        };
        info!("{} candidate elements, processing {}", candidates.len(), total);

        for (index, candidate) in candidates.iter().take(total).enumerate() {
            if self.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            let id = candidate.element;
            observer.on_element_start(index, id);

            let outcome = match self.prepare(doc, id) {
                None => ElementOutcome::Skipped,
                Some(original) => {
                    // Phase 2: Bring into view
                    observer.scroll_into_view(id);
                    let settle = self.config.scroll_settle();
                    if !settle.is_zero() {
                        std::thread::sleep(settle);
                    }
                    if self.is_cancelled() {
                        summary.cancelled = true;
                        break;
                    }

                    // Phase 3: Proofread
                    let response = service.proofread(&original);
                    if self.is_cancelled() {
                        debug!("discarding result for element #{} after stop", id.index());
                        summary.cancelled = true;
                        break;
                    }

                    match response {
                        Ok(result) => self.apply_result(doc, id, &original, result),
                        Err(e) => {
                            warn!("proofreading element #{} failed: {e}", id.index());
                            ElementOutcome::Failed(e.to_string())
                        }
                    }
                }
            };

            match &outcome {
                ElementOutcome::Changed { .. } => summary.changed += 1,
                ElementOutcome::Unchanged => summary.unchanged += 1,
                ElementOutcome::Failed(_) => summary.failed += 1,
                ElementOutcome::Skipped => summary.skipped += 1,
            }
            summary.processed += 1;
            observer.on_element_done(index, id, &outcome);
            observer.on_progress(summary.processed, total);
        }

        info!(
            "run finished: {} processed, {} changed, {} unchanged, {} failed{}",
            summary.processed,
            summary.changed,
            summary.unchanged,
            summary.failed,
            if summary.cancelled { " (cancelled)" } else { "" }
        );
        summary
    }

    /// Text to send for `id`: the pre-session text when the element was
    /// already annotated, its current text otherwise.
    fn prepare(&self, doc: &Document, id: NodeId) -> Option<String> {
        if !doc.is_attached(id) {
            debug!("element #{} left the page before its turn", id.index());
            return None;
        }
        let text = match self.ledger.snapshot(id) {
            Some(snapshot) => snapshot.original_text.clone(),
            None => doc.text_content(id),
        };
        (!text.trim().is_empty()).then_some(text)
    }

    fn apply_result(
        &mut self,
        doc: &mut Document,
        id: NodeId,
        original: &str,
        result: ProofreadResult,
    ) -> ElementOutcome {
        let unit = self.config.service.offsets;
        let spans = result
            .corrections
            .map(|spans| validate_spans(original, to_byte_offsets(original, spans, unit)))
            .unwrap_or_default();

        // Phase 4: Align or splice, then render
        let (fragment, corrected) = match result.corrected_text {
            Some(corrected) => {
                if corrected == original {
                    return ElementOutcome::Unchanged;
                }
                let ops = align(&tokenize(original), &tokenize(&corrected));
                if !has_changes(&ops) {
                    return ElementOutcome::Unchanged;
                }
                let index = SpanIndex::new(&spans);
                let input = RenderInput::Diff {
                    ops: &ops,
                    spans: &index,
                };
                (self.renderer.render(original, input), corrected)
            }
            None if !spans.is_empty() => {
                let corrected = apply_spans(original, &spans);
                if corrected == original {
                    return ElementOutcome::Unchanged;
                }
                (
                    self.renderer.render(original, RenderInput::Spans(&spans)),
                    corrected,
                )
            }
            None => return ElementOutcome::Unchanged,
        };

        if fragment.annotations.is_empty() && fragment.truncated == 0 {
            debug!("element #{} has whitespace-only changes", id.index());
            return ElementOutcome::Unchanged;
        }

        // Phase 5: Apply
        match self.ledger.apply(doc, id, &fragment.markup) {
            Ok(()) => ElementOutcome::Changed {
                annotations: fragment.annotations,
                truncated: fragment.truncated,
                fallback: false,
            },
            Err(e) => {
                warn!(
                    "annotation markup rejected for element #{}, writing plain text: {e}",
                    id.index()
                );
                self.ledger.apply_plain(doc, id, &corrected);
                ElementOutcome::Changed {
                    annotations: Vec::new(),
                    truncated: 0,
                    fallback: true,
                }
            }
        }
    }

    /// Undo every annotation applied by this session.
    pub fn restore_all(&mut self, doc: &mut Document) {
        self.ledger.restore_all(doc);
    }
}
