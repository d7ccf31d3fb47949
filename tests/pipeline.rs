use proofread_overlay::correction::span::{CorrectionSpan, CorrectionType};
use proofread_overlay::engine::pipeline::ElementOutcome;
use proofread_overlay::ledger::Ledger;
use proofread_overlay::render::annotate::{AnnotationRenderer, RenderInput};
use proofread_overlay::select::ContentSelector;
use proofread_overlay::text::align::{align, EditOp};
use proofread_overlay::text::tokenizer::tokenize;
use proofread_overlay::{
    FnService, NodeId, NoopObserver, ProgressObserver, ProofreadConfig, ProofreadResult, Session,
};

const BLOG: &str = r#"<!doctype html>
<html>
<head><title>Field notes</title><style>.x { color: red }</style></head>
<body>
  <header class="site-header"><nav class="nav-menu"><a href="/">Home</a> <a href="/about">About</a></nav></header>
  <div class="cookie-banner"><p>We use cookies to make this site work better for you.</p></div>
  <article class="post">
    <h1>Notes from the field trip</h1>
    <p id="first">Their are two erors in this opening sentence of the post.</p>
    <p id="second">The second paragraph is <em>already</em> correct and should stay as it is.</p>
    <p id="third">We goes to the lake every summer when the weather is warm.</p>
  </article>
  <footer><p>Copyright notice for the whole site and its many pages.</p></footer>
</body>
</html>"#;

fn corrector(text: &str) -> Result<ProofreadResult, proofread_overlay::ServiceError> {
    Ok(ProofreadResult::corrected(
        text.replace("Their are", "There are")
            .replace("erors", "errors")
            .replace("We goes", "We go"),
    ))
}

#[test]
fn end_to_end_diff_is_two_replacements() {
    let ops = align(&tokenize("Their are two erors"), &tokenize("There are two errors"));
    let replaces: Vec<&EditOp> = ops
        .iter()
        .filter(|op| matches!(op, EditOp::Replace { .. }))
        .collect();
    assert_eq!(replaces.len(), 2);
    assert!(ops.iter().all(|op| !matches!(op, EditOp::Insert(_) | EditOp::Delete(_))));
    assert!(ops.contains(&EditOp::Equal(" are two ".into())));

    let config = ProofreadConfig::default();
    let fragment = AnnotationRenderer::new(&config.render).render(
        "Their are two erors",
        RenderInput::Diff {
            ops: &ops,
            spans: &Default::default(),
        },
    );
    assert_eq!(fragment.annotations.len(), 2);
    assert_eq!(fragment.annotations[1].original, "erors");
    assert_eq!(fragment.annotations[1].corrected, "errors");
}

#[test]
fn blog_page_is_annotated_and_restored() {
    let config = ProofreadConfig::default();
    let mut session = Session::new(config);
    let mut doc = session.process_html(BLOG, "https://blog.example/field-trip");
    let root = doc.root();
    let before = doc.outer_html(root);
    assert_eq!(doc.title, "Field notes");

    let selected: Vec<String> = session
        .select(&mut doc, root)
        .iter()
        .map(|c| doc.text_content(c.element))
        .collect();
    assert_eq!(selected.len(), 4);
    assert_eq!(selected[0], "Notes from the field trip");
    assert!(selected.iter().all(|t| !t.contains("cookies") && !t.contains("Copyright")));

    let summary = session.run(&mut doc, root, &mut FnService::new(corrector), &mut NoopObserver);
    assert_eq!(summary.candidates, 4);
    assert_eq!(summary.changed, 2);
    assert_eq!(summary.unchanged, 2);
    assert!(!summary.cancelled);

    let first = doc.select("#first").unwrap()[0];
    let html = doc.inner_html(first);
    assert!(html.contains(r#"data-po-original="Their""#));
    assert!(html.contains(r#"data-po-corrected="errors""#));
    assert_eq!(
        doc.text_content(first),
        "There are two errors in this opening sentence of the post."
    );

    let second = doc.select("#second").unwrap()[0];
    assert!(doc.inner_html(second).contains("<em>already</em>"));

    session.restore_all(&mut doc);
    assert_eq!(doc.outer_html(root), before);

    session.restore_all(&mut doc);
    assert_eq!(doc.outer_html(root), before);
}

#[test]
fn nav_menu_with_long_text_is_excluded() {
    let menu = "Products Pricing Documentation Community Support Careers ".repeat(4);
    let page = format!(
        r#"<html><body><main>
            <div class="nav-menu"><p>{menu}and more links.</p></div>
            <p>A real paragraph of body text that is worth proofreading today.</p>
            <p>Another real paragraph so that the container has enough text.</p>
        </main></body></html>"#
    );
    let session = Session::new(ProofreadConfig::default());
    let mut doc = session.process_html(&page, "");
    let root = doc.root();
    let candidates = session.select(&mut doc, root);
    assert_eq!(candidates.len(), 2);
    for c in &candidates {
        assert!(!doc.text_content(c.element).starts_with("Products"));
    }
}

#[test]
fn two_hundred_paragraphs_are_capped_in_reading_order() {
    let body: String = (0..200)
        .map(|i| format!("<p>Sentence {i} is a perfectly ordinary line of prose.</p>"))
        .collect();
    let config = ProofreadConfig::default();
    let mut doc = Session::new(config.clone())
        .process_html(&format!("<html><body><article>{body}</article></body></html>"), "");
    let root = doc.root();
    let candidates = ContentSelector::new(&config).select_candidates(&doc, root);
    assert_eq!(candidates.len(), 20);
    let tops: Vec<f32> = candidates.iter().map(|c| c.position.top).collect();
    assert!(tops.windows(2).all(|w| w[0] <= w[1]));
    assert!(doc.text_content(candidates[19].element).starts_with("Sentence 19 "));

    let mut session = Session::new(config);
    let summary = session.run(
        &mut doc,
        root,
        &mut FnService::new(|t: &str| Ok(ProofreadResult::corrected(t))),
        &mut NoopObserver,
    );
    assert_eq!(summary.processed, 20);
    assert_eq!(summary.unchanged, 20);
}

#[test]
fn span_corrections_render_and_restore() {
    let mut session = Session::new(ProofreadConfig::default());
    let mut doc = session.process_html(BLOG, "");
    let root = doc.root();
    let before = doc.outer_html(root);

    let mut service = FnService::new(|text: &str| {
        let Some(start) = text.find("goes") else {
            return Ok(ProofreadResult::default());
        };
        Ok(ProofreadResult::spans(vec![
            CorrectionSpan::new(start, start + 4, "go")
                .with_kind(CorrectionType::Grammar)
                .with_explanation("Subject-verb agreement"),
            // Out of range offsets are dropped
            CorrectionSpan::new(start, text.len() + 10, "x"),
        ]))
    });

    #[derive(Default)]
    struct Outcomes(Vec<(NodeId, ElementOutcome)>);
    impl ProgressObserver for Outcomes {
        fn on_element_done(&mut self, _: usize, id: NodeId, outcome: &ElementOutcome) {
            self.0.push((id, outcome.clone()));
        }
    }
    let mut outcomes = Outcomes::default();
    let summary = session.run(&mut doc, root, &mut service, &mut outcomes);
    assert_eq!(summary.changed, 1);

    let third = doc.select("#third").unwrap()[0];
    let html = doc.inner_html(third);
    assert!(html.contains(r#"data-po-tooltip="Grammar: Subject-verb agreement""#));
    assert!(html.starts_with("We "));

    let changed = outcomes
        .0
        .iter()
        .find(|(id, _)| *id == third)
        .map(|(_, o)| o.clone());
    assert!(matches!(changed, Some(ElementOutcome::Changed { fallback: false, .. })));

    session.restore_all(&mut doc);
    assert_eq!(doc.outer_html(root), before);
}

#[test]
fn ledger_sweeps_annotations_from_other_sessions() {
    let mut doc = Session::new(ProofreadConfig::default()).process_html(BLOG, "");
    let root = doc.root();
    let first = doc.select("#first").unwrap()[0];
    let before = doc.inner_html(first);

    let mut other = Ledger::new();
    other
        .apply(
            &mut doc,
            first,
            r#"<span class="po-annotation po-replace" data-po-original="Their are two erors in this opening sentence of the post.">fixed</span>"#,
        )
        .unwrap();

    // A fresh ledger knows nothing about the element but still cleans it up
    Ledger::new().restore_all(&mut doc);
    assert_eq!(doc.inner_html(first), before);
    assert_eq!(doc.attr(first, "data-po-state"), None);
    assert!(doc.outer_html(root).find("po-annotation").is_none());
}
