use std::collections::HashSet;

use ammonia::Builder as AmmoniaBuilder;
use comrak::options::Options;

pub(crate) fn default_options() -> Options<'static> {
    let mut options = Options::default();
    configure_extensions(&mut options);
    options
}

/// Sanitizer applied to rendered Markdown documents.
pub(crate) fn build_markdown_sanitizer() -> AmmoniaBuilder<'static> {
    base_builder()
}

/// Sanitizer for rich notebook outputs (`text/html`, `image/svg+xml`), which
/// routinely carry inline SVG.
pub(crate) fn build_output_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = base_builder();

    builder.add_tags(&[
        "svg",
        "g",
        "path",
        "rect",
        "circle",
        "ellipse",
        "polygon",
        "polyline",
        "line",
        "defs",
        "lineargradient",
        "linearGradient",
        "stop",
        "title",
        "desc",
        "text",
        "tspan",
        "caption",
        "tfoot",
        "colgroup",
        "col",
    ]);
    builder.add_tag_attributes(
        "svg",
        &[
            "viewBox",
            "xmlns",
            "width",
            "height",
            "preserveAspectRatio",
            "version",
        ],
    );
    builder.add_tag_attributes("g", &["transform", "fill", "stroke"]);
    builder.add_tag_attributes(
        "path",
        &[
            "d",
            "fill",
            "stroke",
            "stroke-width",
            "stroke-linecap",
            "stroke-linejoin",
            "opacity",
            "transform",
        ],
    );
    builder.add_tag_attributes(
        "rect",
        &[
            "x",
            "y",
            "width",
            "height",
            "rx",
            "ry",
            "fill",
            "stroke",
            "stroke-width",
            "opacity",
        ],
    );
    builder.add_tag_attributes(
        "circle",
        &["cx", "cy", "r", "fill", "stroke", "stroke-width", "opacity"],
    );
    builder.add_tag_attributes(
        "ellipse",
        &["cx", "cy", "rx", "ry", "fill", "stroke", "stroke-width", "opacity"],
    );
    builder.add_tag_attributes(
        "polygon",
        &["points", "fill", "stroke", "stroke-width", "opacity"],
    );
    builder.add_tag_attributes(
        "polyline",
        &["points", "fill", "stroke", "stroke-width", "opacity"],
    );
    builder.add_tag_attributes(
        "line",
        &["x1", "x2", "y1", "y2", "stroke", "stroke-width", "opacity"],
    );
    builder.add_tag_attributes(
        "text",
        &[
            "x",
            "y",
            "dx",
            "dy",
            "fill",
            "text-anchor",
            "dominant-baseline",
            "font-size",
            "transform",
        ],
    );
    builder.add_tag_attributes("tspan", &["x", "y", "dx", "dy", "font-size", "fill"]);
    builder.add_tag_attributes(
        "lineargradient",
        &["gradientUnits", "x1", "x2", "y1", "y2"],
    );
    builder.add_tag_attributes(
        "linearGradient",
        &["gradientUnits", "x1", "x2", "y1", "y2"],
    );
    builder.add_tag_attributes("stop", &["offset", "stop-color", "stop-opacity"]);
    builder.add_tag_attributes("col", &["span"]);
    builder.add_tag_attributes("colgroup", &["span"]);

    builder
}

fn base_builder() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    let tags: HashSet<&'static str> = HashSet::from([
        "a",
        "abbr",
        "blockquote",
        "br",
        "code",
        "div",
        "em",
        "h1",
        "h2",
        "h3",
        "h4",
        "h5",
        "h6",
        "hr",
        "i",
        "b",
        "img",
        "input",
        "ins",
        "kbd",
        "li",
        "ol",
        "p",
        "pre",
        "s",
        "section",
        "span",
        "strong",
        "sub",
        "sup",
        "table",
        "tbody",
        "td",
        "th",
        "thead",
        "tr",
        "ul",
        "dl",
        "dt",
        "dd",
        "del",
        "mark",
    ]);
    builder.tags(tags);

    let generic: HashSet<&'static str> = HashSet::from([
        "class",
        "id",
        "title",
        "lang",
        "dir",
        "aria-hidden",
        "aria-label",
        "role",
        "data-footnote-ref",
        "data-footnotes",
        "data-footnote-backref",
        "data-footnote-backref-idx",
    ]);
    builder.generic_attributes(generic);

    builder.add_tag_attributes("img", &["title", "width", "height", "alt", "loading"]);
    builder.add_tag_attributes("code", &["data-meta", "data-language"]);
    builder.add_tag_attributes("pre", &["data-language"]);
    builder.add_tag_attributes("th", &["align", "colspan", "rowspan", "scope"]);
    builder.add_tag_attributes("td", &["align", "colspan", "rowspan"]);
    builder.add_tag_attributes("input", &["type", "checked", "disabled"]);

    // Only these schemes survive; `javascript:`, `vbscript:` and `data:` links
    // and images lose the attribute. Relative URLs pass through.
    builder.url_schemes(HashSet::from(["http", "https", "mailto", "tel"]));

    builder
}

fn configure_extensions(options: &mut Options<'static>) {
    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.tagfilter = true;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;
    // Front matter is removed before parsing; comrak must not see a delimiter.
    ext.front_matter_delimiter = None;

    let render = &mut options.render;
    render.github_pre_lang = true;
    render.tasklist_classes = true;
    // Raw HTML nodes are dropped from the AST before formatting, and the output is
    // sanitised afterwards. The formatter must still emit the highlighted code
    // blocks injected as HTML nodes.
    render.r#unsafe = true;
    render.sourcepos = false;
}
