use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use syntect::{html::ClassStyle, parsing::SyntaxSet};

use crate::application::render::types::ConvertError;

use super::{
    highlight,
    lexer::{FENCE_CHAIN, LexerQuery, resolve_syntax},
};

#[derive(Debug, Default)]
pub(crate) struct RewriteOutcome {
    pub(crate) code_blocks: usize,
    pub(crate) raw_html_dropped: usize,
}

/// Replace fenced and indented code blocks with highlighted HTML and drop every
/// raw HTML node written by the author.
pub(crate) fn rewrite_ast<'a>(
    root: &'a AstNode<'a>,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
) -> Result<RewriteOutcome, ConvertError> {
    let mut walker = RewriteWalker::new(syntax_set, class_style);
    walker.visit_nodes(root)?;
    Ok(walker.outcome)
}

enum NodeAction {
    Highlight { info: String, literal: String },
    DropRaw,
    Descend,
}

struct RewriteWalker<'a> {
    syntax_set: &'a SyntaxSet,
    class_style: &'a ClassStyle,
    outcome: RewriteOutcome,
}

impl<'a> RewriteWalker<'a> {
    fn new(syntax_set: &'a SyntaxSet, class_style: &'a ClassStyle) -> Self {
        Self {
            syntax_set,
            class_style,
            outcome: RewriteOutcome::default(),
        }
    }

    /// Pre-order walk over an explicit stack, so nesting depth is bounded by
    /// the heap rather than the thread stack.
    fn visit_nodes<'n>(&mut self, root: &'n AstNode<'n>) -> Result<(), ConvertError> {
        let mut pending = vec![root];

        while let Some(node) = pending.pop() {
            match classify(node) {
                NodeAction::Highlight { info, literal } => {
                    let html = self.highlight_block(&info, &literal)?;
                    self.outcome.code_blocks += 1;
                    let mut data = node.data.borrow_mut();
                    data.value = NodeValue::HtmlBlock(NodeHtmlBlock {
                        block_type: 0,
                        literal: html,
                    });
                }
                NodeAction::DropRaw => {
                    self.outcome.raw_html_dropped += 1;
                    node.detach();
                }
                // Reversed so children pop in document order.
                NodeAction::Descend => pending.extend(node.reverse_children()),
            }
        }

        Ok(())
    }

    fn highlight_block(&self, info: &str, literal: &str) -> Result<String, ConvertError> {
        let mut segments = info.split_whitespace();
        let language = segments.next();
        let meta = segments.collect::<Vec<_>>().join(" ");

        let query = LexerQuery {
            hint: language,
            source: literal,
        };
        let (syntax, _) = resolve_syntax(FENCE_CHAIN, &query, self.syntax_set);
        let meta_ref = (!meta.is_empty()).then_some(meta.as_str());

        highlight::highlight_code(syntax, meta_ref, literal, self.syntax_set, self.class_style)
    }
}

fn classify(node: &AstNode<'_>) -> NodeAction {
    let data = node.data.borrow();
    match &data.value {
        NodeValue::CodeBlock(block) => NodeAction::Highlight {
            info: block.info.trim().to_string(),
            literal: block.literal.clone(),
        },
        NodeValue::HtmlBlock(_) | NodeValue::HtmlInline(_) => NodeAction::DropRaw,
        _ => NodeAction::Descend,
    }
}
