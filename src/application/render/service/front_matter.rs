use once_cell::sync::Lazy;
use regex::Regex;

/// Leading `---` block. The body is matched lazily so the first closing `---`
/// line ends the block; an empty block (`---` directly followed by `---`) counts.
static FRONT_MATTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A---[ \t]*\r?\n(?:[\s\S]*?\r?\n)?---[ \t]*(?:\r?\n|\z)")
        .expect("front matter pattern must compile")
});

/// Remove front matter anchored at the start of `source`. Consecutive blocks at
/// the start are all removed, so the result never begins with another block.
/// Blocks that appear anywhere else are left untouched.
pub fn strip_front_matter(source: &str) -> &str {
    let mut rest = source;
    while let Some(found) = FRONT_MATTER.find(rest) {
        rest = &rest[found.end()..];
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_block() {
        assert_eq!(strip_front_matter("---\ntitle: x\n---\n# Hello"), "# Hello");
    }

    #[test]
    fn stops_at_first_closing_line() {
        let source = "---\na: 1\n---\nbody\n---\nmore\n";
        assert_eq!(strip_front_matter(source), "body\n---\nmore\n");
    }

    #[test]
    fn handles_crlf_and_empty_blocks() {
        assert_eq!(strip_front_matter("---\r\nk: v\r\n---\r\ntext"), "text");
        assert_eq!(strip_front_matter("---\n---\ntext"), "text");
        assert_eq!(strip_front_matter("---\nk: v\n---"), "");
    }

    #[test]
    fn ignores_blocks_not_at_start() {
        let source = "intro\n---\nk: v\n---\n";
        assert_eq!(strip_front_matter(source), source);

        let indented = " ---\nk: v\n---\n";
        assert_eq!(strip_front_matter(indented), indented);
    }

    #[test]
    fn requires_closing_delimiter() {
        let source = "---\nnot closed\n";
        assert_eq!(strip_front_matter(source), source);
    }

    #[test]
    fn longer_rules_are_not_delimiters() {
        let source = "----\nk: v\n----\n";
        assert_eq!(strip_front_matter(source), source);
    }

    #[test]
    fn stripping_stripped_text_is_a_no_op() {
        for source in [
            "---\ntitle: x\n---\n# Hello",
            "# Plain\n\ntext\n",
            "",
            "intro\n---\nk: v\n---\n",
            "---\na: 1\n---\n---\nb: 2\n---\nbody",
            "---\n---\n---\n---\n",
        ] {
            let once = strip_front_matter(source);
            assert_eq!(strip_front_matter(once), once, "source {source:?}");
        }
    }

    #[test]
    fn stacked_leading_blocks_are_all_removed() {
        let source = "---\na: 1\n---\n---\nb: 2\n---\nbody";
        assert_eq!(strip_front_matter(source), "body");

        let separated = "---\na: 1\n---\n\n---\nb: 2\n---\nbody";
        assert_eq!(strip_front_matter(separated), "\n---\nb: 2\n---\nbody");
    }
}
