use std::path::Path;

use syntect::parsing::{SyntaxReference, SyntaxSet};

/// Strategies tried, in order, when picking a syntax for source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolver {
    /// Caller-supplied identifier.
    Hint,
    /// Shebangs, modelines and other first-line markers known to the syntax set.
    FirstLine,
    /// Cheap whole-document signatures (JSON, HTML documents, diffs).
    Signature,
}

/// Strategy that produced the syntax; `None` means the plain-text fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolution {
    Resolved(Resolver),
    Fallback,
}

pub(crate) const CODE_CHAIN: &[Resolver] = &[Resolver::Hint, Resolver::FirstLine, Resolver::Signature];

/// Fenced code blocks only honour their info string.
pub(crate) const FENCE_CHAIN: &[Resolver] = &[Resolver::Hint];

const HINT_ALIASES: [(&str, &str); 14] = [
    ("golang", "go"),
    ("shell", "sh"),
    ("console", "sh"),
    ("zsh", "sh"),
    ("py3", "py"),
    ("python3", "py"),
    ("c++", "cpp"),
    ("csharp", "cs"),
    ("c#", "cs"),
    ("jsonc", "json"),
    ("text", "txt"),
    ("plaintext", "txt"),
    ("plain", "txt"),
    ("objective-c", "m"),
];

pub(crate) struct LexerQuery<'q> {
    pub(crate) hint: Option<&'q str>,
    pub(crate) source: &'q str,
}

impl Resolver {
    fn resolve<'s>(self, query: &LexerQuery<'_>, syntax_set: &'s SyntaxSet) -> Option<&'s SyntaxReference> {
        match self {
            Resolver::Hint => query.hint.and_then(|hint| find_by_hint(syntax_set, hint)),
            Resolver::FirstLine => query
                .source
                .lines()
                .next()
                .and_then(|line| syntax_set.find_syntax_by_first_line(line)),
            Resolver::Signature => find_by_signature(syntax_set, query.source),
        }
    }
}

/// Walk `chain` and return the first syntax found, falling back to plain text.
pub(crate) fn resolve_syntax<'s>(
    chain: &[Resolver],
    query: &LexerQuery<'_>,
    syntax_set: &'s SyntaxSet,
) -> (&'s SyntaxReference, Resolution) {
    chain
        .iter()
        .find_map(|resolver| {
            resolver
                .resolve(query, syntax_set)
                .map(|syntax| (syntax, Resolution::Resolved(*resolver)))
        })
        .unwrap_or_else(|| (syntax_set.find_syntax_plain_text(), Resolution::Fallback))
}

fn find_by_hint<'s>(syntax_set: &'s SyntaxSet, hint: &str) -> Option<&'s SyntaxReference> {
    let trimmed = hint.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lowercase = trimmed.to_ascii_lowercase();
    let token = HINT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowercase)
        .map(|(_, target)| *target)
        .unwrap_or(lowercase.as_str());

    syntax_set
        .find_syntax_by_token(token)
        .or_else(|| syntax_set.find_syntax_by_name(trimmed))
        .or_else(|| syntax_set.find_syntax_by_extension(trimmed))
        .or_else(|| {
            Path::new(trimmed)
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(|ext| syntax_set.find_syntax_by_token(&ext.to_ascii_lowercase()))
        })
}

fn find_by_signature<'s>(syntax_set: &'s SyntaxSet, source: &str) -> Option<&'s SyntaxReference> {
    let trimmed = source.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return None;
    }

    let head: String = trimmed
        .chars()
        .take(64)
        .collect::<String>()
        .to_ascii_lowercase();

    let extension = if head.starts_with("<!doctype html") || head.starts_with("<html") {
        Some("html")
    } else if head.starts_with("<?xml") || head.starts_with("<svg") {
        Some("xml")
    } else if head.starts_with("diff --git ") || (head.starts_with("--- ") && trimmed.contains("\n+++ ")) {
        Some("diff")
    } else if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
    {
        Some("json")
    } else {
        None
    };

    extension.and_then(|ext| syntax_set.find_syntax_by_extension(ext))
}
