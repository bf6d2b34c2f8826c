use htmlconverter::application::render::{ConvertError, ConvertService, converter};

fn render_fixture() -> String {
    converter()
        .convert_notebook(include_str!("fixtures/analysis.ipynb"))
        .expect("notebook renders")
}

#[test]
fn markdown_cells_use_markdown_pipeline() {
    let html = render_fixture();
    assert!(html.starts_with("<div class=\"notebook\">"));
    assert!(html.contains("<h1>Analysis</h1>"));
    assert!(html.contains("<strong>matter</strong>"));
}

#[test]
fn code_cells_are_highlighted_in_notebook_language() {
    let html = render_fixture();
    assert!(html.contains("In [3]:"));
    assert!(html.contains("In [ ]:"));
    assert!(html.contains("data-language=\"python\""));
    assert!(html.contains("Out[3]:"));
    assert!(!html.contains("Out [3]:"));
}

#[test]
fn outputs_follow_mime_preference_and_are_sanitized() {
    let html = render_fixture();

    assert!(html.contains("<b>[1, 2, 3]</b>"));
    assert!(!html.contains("<script"));
    assert!(html.contains("src=\"data:image/png;base64,iVBORw0KGgo=\""));
    assert!(!html.contains("&lt;Figure&gt;"));
    assert!(html.contains("output-stdout"));
}

#[test]
fn error_tracebacks_lose_ansi_sequences() {
    let html = render_fixture();
    assert!(html.contains("ZeroDivisionError:&#32;division&#32;by&#32;zero"));
    assert!(!html.contains('\u{1b}'));
}

#[test]
fn raw_cells_are_escaped() {
    let html = render_fixture();
    assert!(html.contains("<pre>&lt;raw&#32;&amp;&#32;unrendered&gt;</pre>"));
}

#[test]
fn invalid_documents_are_notebook_errors() {
    for source in ["{not valid json", "", "[]", "{\"nbformat\": 3, \"nbformat_minor\": 0, \"cells\": []}"] {
        let err = converter()
            .convert_notebook(source)
            .expect_err("invalid notebook");
        assert!(
            matches!(err, ConvertError::Notebook { .. }),
            "source {source:?}: {err:?}"
        );
    }
}

#[test]
fn invalid_image_payload_falls_back_to_next_representation() {
    let source = r#"{
        "nbformat": 4, "nbformat_minor": 2, "metadata": {},
        "cells": [{
            "cell_type": "code", "execution_count": 1, "metadata": {}, "source": "plot()",
            "outputs": [{
                "output_type": "display_data", "metadata": {},
                "data": {"image/png": "not base64!", "text/plain": "<Axes>"}
            }]
        }]
    }"#;

    let html = converter().convert_notebook(source).expect("notebook renders");
    assert!(!html.contains("data:image/png"));
    assert!(html.contains("<pre class=\"output-text\">&lt;Axes&gt;</pre>"));
}
