//! Serializer: Document tree back to Quayfile text
//!
//! Walks the tree depth-first. A directive that still carries its verbatim
//! source span is emitted exactly as it was written, so spacing, quoting,
//! and inline comments survive; only edited or constructed directives get
//! re-derived text. Indentation is one tab per nesting level, site blocks
//! are separated by one blank line, and a block tag is always the first
//! line of its body.

use quay_core::document::{Directive, Document, SiteBlock, TAG_MARKER};

/// Serialize a `Document` to Quayfile text.
pub fn serialize(doc: &Document) -> String {
    let mut out = String::new();

    if !doc.global_options.is_empty() {
        out.push_str("{\n");
        for directive in &doc.global_options {
            write_directive(&mut out, directive, 1);
        }
        out.push_str("}\n");
    }

    for (i, block) in doc.site_blocks.iter().enumerate() {
        if i > 0 || !doc.global_options.is_empty() {
            out.push('\n');
        }
        write_site_block(&mut out, block);
    }

    out
}

fn write_site_block(out: &mut String, block: &SiteBlock) {
    out.push_str(&block.addresses.join(", "));
    out.push_str(" {\n");

    if let Some(tag) = &block.tag {
        out.push('\t');
        out.push_str(TAG_MARKER);
        out.push(' ');
        write_arg(out, tag);
        out.push('\n');
    }

    for directive in &block.directives {
        write_directive(out, directive, 1);
    }

    out.push_str("}\n");
}

fn write_directive(out: &mut String, directive: &Directive, depth: usize) {
    // Unedited directives keep their exact source text. The first line is
    // re-indented to the current depth; continuation lines of a nested body
    // already carry their own indentation.
    if let Some(raw) = &directive.raw_text {
        let mut lines = raw.lines();
        if let Some(first) = lines.next() {
            push_indent(out, depth);
            out.push_str(first);
            out.push('\n');
        }
        for line in lines {
            out.push_str(line);
            out.push('\n');
        }
        return;
    }

    push_indent(out, depth);
    write_arg(out, &directive.name);
    for arg in &directive.args {
        out.push(' ');
        write_arg(out, arg);
    }

    if let Some(block) = &directive.block {
        out.push_str(" {\n");
        for child in block {
            write_directive(out, child, depth + 1);
        }
        push_indent(out, depth);
        out.push_str("}\n");
    } else {
        out.push('\n');
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

/// True for a `{...}` substitution token, which must stay unquoted to lex
/// back as a placeholder.
fn is_placeholder(arg: &str) -> bool {
    arg.len() > 2
        && arg.starts_with('{')
        && arg.ends_with('}')
        && !arg[1..arg.len() - 1]
            .contains([' ', '\t', '{', '}'])
}

/// Write one argument, quoting it when the bare form would not lex back to
/// the same token.
fn write_arg(out: &mut String, arg: &str) {
    let needs_quotes = arg.is_empty()
        || arg
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '#'))
        || (arg.contains(['{', '}']) && !is_placeholder(arg));

    if !needs_quotes {
        out.push_str(arg);
        return;
    }

    out.push('"');
    for c in arg.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}
