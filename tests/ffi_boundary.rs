use std::{
    ffi::{CStr, CString},
    os::raw::c_char,
    ptr, thread,
};

use htmlconverter::ffi::{
    ERROR_PREFIX, convertCodeToHTML, convertMarkdownToHTML, convertNotebookToHTML,
    convertThemeToCSS, htmlconverter_free_string,
};

fn take(ptr: *mut c_char) -> String {
    assert!(!ptr.is_null(), "exports never return null");
    let text = unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .expect("exports return UTF-8")
        .to_string();
    unsafe { htmlconverter_free_string(ptr) };
    text
}

fn c(text: &str) -> CString {
    CString::new(text).expect("no interior NUL")
}

fn code(source: &str, lexer: &str) -> String {
    let source = c(source);
    let lexer = c(lexer);
    take(unsafe { convertCodeToHTML(source.as_ptr(), lexer.as_ptr()) })
}

fn markdown(source: &str) -> String {
    let source = c(source);
    take(unsafe { convertMarkdownToHTML(source.as_ptr()) })
}

fn notebook(source: &str) -> String {
    let source = c(source);
    take(unsafe { convertNotebookToHTML(source.as_ptr()) })
}

#[test]
fn explicit_lexer_is_used() {
    let html = code("def f():\n    return 1\n", "python");
    assert!(!html.starts_with(ERROR_PREFIX));
    assert!(html.contains("data-language=\"python\""));
}

#[test]
fn unknown_or_missing_lexer_never_fails() {
    for lexer in ["", "definitely-not-a-language"] {
        let html = code("some words & <symbols>", lexer);
        assert!(!html.starts_with(ERROR_PREFIX), "lexer {lexer:?}: {html}");
        assert!(html.contains("some words &amp; &lt;symbols&gt;"));
    }
}

#[test]
fn code_markup_is_escaped() {
    let html = code("<img src=x onerror=\"alert('x')\">", "html");
    assert!(!html.contains("<img"));
    assert!(html.contains("&lt;"));
    assert!(!html.contains("\"alert("));
}

#[test]
fn front_matter_is_removed() {
    assert_eq!(markdown("---\ntitle: x\n---\n# Hello"), "<h1>Hello</h1>\n");
}

#[test]
fn malformed_notebook_reports_error() {
    let output = notebook("{not valid json");
    assert!(output.starts_with(ERROR_PREFIX), "{output}");
    assert!(output.contains("Could not convert Notebook to HTML"));
}

#[test]
fn empty_inputs_have_defined_results() {
    let html = code("", "");
    assert!(html.contains("syntax-code"));
    assert!(!html.starts_with(ERROR_PREFIX));

    assert_eq!(markdown(""), "");

    let output = notebook("");
    assert!(output.starts_with(ERROR_PREFIX));
}

#[test]
fn null_pointers_read_as_empty_input() {
    let html = take(unsafe { convertCodeToHTML(ptr::null(), ptr::null()) });
    assert!(!html.starts_with(ERROR_PREFIX));

    assert_eq!(take(unsafe { convertMarkdownToHTML(ptr::null()) }), "");
    assert!(take(unsafe { convertNotebookToHTML(ptr::null()) }).starts_with(ERROR_PREFIX));

    unsafe { htmlconverter_free_string(ptr::null_mut()) };
}

#[test]
fn theme_stylesheet_is_exported() {
    let css = take(convertThemeToCSS());
    assert!(!css.starts_with(ERROR_PREFIX));
    assert!(css.contains(".syntax-"));
}

#[test]
fn concurrent_calls_are_isolated() {
    let handles: Vec<_> = (0..16)
        .map(|index| {
            thread::spawn(move || {
                let marker = format!("marker_{index}");
                let code_html = code(&format!("let {marker} = {index};"), "rust");
                let markdown_html = markdown(&format!("# {marker}"));
                let notebook_html = notebook(&format!(
                    r#"{{"nbformat": 4, "nbformat_minor": 5, "metadata": {{}}, "cells": [
                        {{"cell_type": "markdown", "metadata": {{}}, "source": "{marker}"}}
                    ]}}"#
                ));
                (marker, code_html, markdown_html, notebook_html)
            })
        })
        .collect();

    for handle in handles {
        let (marker, code_html, markdown_html, notebook_html) =
            handle.join().expect("thread completes");
        assert!(code_html.contains(&marker));
        assert_eq!(markdown_html, format!("<h1>{marker}</h1>\n"));
        assert!(!notebook_html.starts_with(ERROR_PREFIX), "{notebook_html}");
        assert!(notebook_html.contains(&format!("<p>{marker}</p>")));
        assert_eq!(notebook_html.matches("<p>").count(), 1);
    }
}
