use syntect::{
    html::{ClassStyle, line_tokens_to_classed_spans},
    parsing::{ParseState, ScopeStack, ScopeStackOp, SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};

use crate::application::render::types::ConvertError;

/// Token stream for a single line: byte offsets paired with scope operations.
type LineOps = Vec<(usize, ScopeStackOp)>;

/// Tokenize `code` with `syntax` and render it as class-annotated HTML wrapped in
/// `<pre><code>`. Text content is escaped by the formatter.
pub(crate) fn highlight_code(
    syntax: &SyntaxReference,
    meta: Option<&str>,
    code: &str,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
) -> Result<String, ConvertError> {
    let body = highlight_lines(syntax, code, syntax_set, class_style)?;
    let lang_token = language_token(syntax);

    let meta_attr = meta
        .filter(|m| !m.is_empty())
        .map(|m| format!(" data-meta=\"{}\"", ammonia::clean_text(m)))
        .unwrap_or_default();

    Ok(format!(
        "<pre class=\"syntax-highlight syntax-lang-{lang_token}\" data-language=\"{lang_token}\"><code class=\"language-{lang_token} syntax-code\"{meta_attr}>{body}</code></pre>"
    ))
}

fn highlight_lines(
    syntax: &SyntaxReference,
    code: &str,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
) -> Result<String, ConvertError> {
    let mut code_with_newline = code.to_string();
    if !code_with_newline.is_empty() && !code_with_newline.ends_with('\n') {
        code_with_newline.push('\n');
    }

    let mut parse_state = ParseState::new(syntax);
    let mut scope_stack = ScopeStack::new();
    let mut open_spans: isize = 0;
    let mut html = String::with_capacity(code_with_newline.len() * 2);

    for line in LinesWithEndings::from(code_with_newline.as_str()) {
        let ops = parse_state
            .parse_line(line, syntax_set)
            .map_err(|err| ConvertError::tokenization(syntax.name.as_str(), err))?;
        let ops = coalesce_ops(ops, &scope_stack)
            .map_err(|err| ConvertError::tokenization(syntax.name.as_str(), format!("{err:?}")))?;

        let (formatted, delta) =
            line_tokens_to_classed_spans(line, ops.as_slice(), *class_style, &mut scope_stack)
                .map_err(|err| ConvertError::formatting(syntax.name.as_str(), err))?;
        open_spans += delta;
        html.push_str(&formatted);
    }

    for _ in 0..open_spans.max(0) {
        html.push_str("</span>");
    }

    Ok(html)
}

/// Merge adjacent tokens of the same kind: a pop immediately followed, at the same
/// offset, by a push of the scope that was just popped is a no-op and would only
/// close and reopen an identical span.
fn coalesce_ops(
    ops: LineOps,
    scope_stack: &ScopeStack,
) -> Result<LineOps, syntect::parsing::ScopeError> {
    let mut shadow = scope_stack.clone();
    let mut merged = Vec::with_capacity(ops.len());
    let mut iter = ops.into_iter().peekable();

    while let Some((index, op)) = iter.next() {
        if op == ScopeStackOp::Pop(1) {
            let popped = shadow.as_slice().last().copied();
            if let Some((next_index, ScopeStackOp::Push(next_scope))) = iter.peek()
                && *next_index == index
                && popped == Some(*next_scope)
            {
                iter.next();
                continue;
            }
        }

        shadow.apply(&op)?;
        merged.push((index, op));
    }

    Ok(merged)
}

/// Lowercase, attribute-safe token derived from the resolved syntax rather than
/// from caller input.
pub(crate) fn language_token(syntax: &SyntaxReference) -> String {
    let token: String = syntax
        .name
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .map(|c| if c.is_ascii_whitespace() { '-' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#' | '.'))
        .collect();

    if token.is_empty() {
        "text".to_string()
    } else {
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syntect::parsing::Scope;

    fn syntax_and_style() -> (SyntaxSet, ClassStyle) {
        (
            SyntaxSet::load_defaults_newlines(),
            ClassStyle::SpacedPrefixed { prefix: "syntax-" },
        )
    }

    #[test]
    fn highlights_with_prefixed_classes() {
        let (set, style) = syntax_and_style();
        let syntax = set.find_syntax_by_token("rs").expect("rust syntax");
        let html = highlight_code(syntax, None, "fn main() {}", &set, &style).expect("highlight");

        assert!(html.starts_with("<pre class=\"syntax-highlight syntax-lang-rust\""));
        assert!(html.contains("class=\"language-rust syntax-code\""));
        assert!(html.contains("syntax-storage"));
        assert!(!html.contains("style="));
        assert!(html.ends_with("</code></pre>"));
    }

    #[test]
    fn escapes_markup_in_source() {
        let (set, style) = syntax_and_style();
        let syntax = set.find_syntax_plain_text();
        let html = highlight_code(
            syntax,
            None,
            "<script>alert(\"x\") && 'y'</script>",
            &set,
            &style,
        )
        .expect("highlight");

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&amp;&amp;"));
        assert!(html.contains("&quot;x&quot;"));
    }

    #[test]
    fn meta_attribute_is_escaped() {
        let (set, style) = syntax_and_style();
        let syntax = set.find_syntax_plain_text();
        let html = highlight_code(syntax, Some("title=\"a\"><b>"), "x", &set, &style)
            .expect("highlight");
        assert!(html.contains("data-meta=\"title&#61;&quot;a&quot;&gt;&lt;b&gt;\""));
    }

    #[test]
    fn empty_source_renders_empty_block() {
        let (set, style) = syntax_and_style();
        let syntax = set.find_syntax_plain_text();
        let html = highlight_code(syntax, None, "", &set, &style).expect("highlight");
        assert_eq!(
            html,
            "<pre class=\"syntax-highlight syntax-lang-plain-text\" data-language=\"plain-text\"><code class=\"language-plain-text syntax-code\"></code></pre>"
        );
    }

    #[test]
    fn coalesce_drops_pop_push_of_same_scope() {
        let scope = Scope::new("string.quoted.double").expect("scope");
        let mut stack = ScopeStack::new();
        stack.push(scope);

        let ops = vec![
            (3, ScopeStackOp::Pop(1)),
            (3, ScopeStackOp::Push(scope)),
            (7, ScopeStackOp::Pop(1)),
        ];
        let merged = coalesce_ops(ops, &stack).expect("coalesce");
        assert_eq!(merged, vec![(7, ScopeStackOp::Pop(1))]);
    }

    #[test]
    fn coalesce_keeps_distinct_scopes() {
        let first = Scope::new("keyword.control").expect("scope");
        let second = Scope::new("keyword.operator").expect("scope");
        let mut stack = ScopeStack::new();
        stack.push(first);

        let ops = vec![(2, ScopeStackOp::Pop(1)), (2, ScopeStackOp::Push(second))];
        let merged = coalesce_ops(ops.clone(), &stack).expect("coalesce");
        assert_eq!(merged, ops);
    }

    #[test]
    fn coalesced_output_keeps_text() {
        let (set, style) = syntax_and_style();
        let syntax = set.find_syntax_by_token("py").expect("python syntax");
        let source = "x = \"a\" + \"b\"\nprint(x)\n";
        let html = highlight_code(syntax, None, source, &set, &style).expect("highlight");
        assert!(html.contains("print"));
        assert_eq!(html.matches("<span").count(), html.matches("</span>").count());
    }

    #[test]
    fn language_token_is_attribute_safe() {
        let set = SyntaxSet::load_defaults_newlines();
        let syntax = set.find_syntax_by_token("cpp").expect("c++ syntax");
        assert_eq!(language_token(syntax), "c++");
        assert_eq!(language_token(set.find_syntax_plain_text()), "plain-text");
    }
}
