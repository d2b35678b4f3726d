//! Renderer for the Mustache-like subset used by Anki note templates.
//!
//! # Supported forms
//! ```text
//! {{Field}}            substitute a field value (missing fields render empty)
//! {{#Field}}...{{/Field}}   keep the block when the field is non-blank
//! {{^Field}}...{{/Field}}   keep the block when the field is blank
//! {{!comment}}         dropped
//! ```
//!
//! Field-modifier prefixes (`cloze:Text`, `type:Front`) are normalized to
//! their last colon-separated segment; the modifiers themselves are not
//! implemented. `FrontSide` is an ordinary field that the caller injects
//! before rendering an answer format.

use std::collections::HashMap;

/// Render `template` against a field-name to value map.
///
/// Never fails: malformed syntax degrades to literal text and unresolvable
/// tokens render as the empty string.
pub fn render(template: &str, fields: &HashMap<String, String>) -> String {
    let tokens = tokenize(template);
    let mut out = String::with_capacity(template.len());
    eval_range(&tokens, 0, tokens.len(), fields, &mut out);
    out
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    Variable { name: String, raw: String },
    SectionOpen { name: String, raw: String },
    InvertedOpen { name: String, raw: String },
    SectionClose { name: String, raw: String },
    Comment,
}

impl Token {
    /// The verbatim source of this token, used when a broken section forces
    /// the remainder of the template to be emitted literally.
    fn literal(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Variable { raw, .. }
            | Self::SectionOpen { raw, .. }
            | Self::InvertedOpen { raw, .. }
            | Self::SectionClose { raw, .. } => raw,
            Self::Comment => "",
        }
    }
}

fn tokenize(template: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(open_rel) = template[pos..].find("{{") {
        let open = pos + open_rel;
        if open > pos {
            tokens.push(Token::Text(template[pos..open].to_string()));
        }
        match template[open + 2..].find("}}") {
            Some(close_rel) => {
                let close = open + 2 + close_rel;
                let inner = &template[open + 2..close];
                let raw = &template[open..close + 2];
                tokens.push(parse_tag(inner, raw));
                pos = close + 2;
            }
            None => {
                // No closing delimiter: the rest is literal text.
                tokens.push(Token::Text(template[open..].to_string()));
                return tokens;
            }
        }
    }

    if pos < template.len() {
        tokens.push(Token::Text(template[pos..].to_string()));
    }
    tokens
}

fn parse_tag(inner: &str, raw: &str) -> Token {
    let trimmed = inner.trim();
    let raw = raw.to_string();

    if let Some(rest) = trimmed.strip_prefix('#') {
        Token::SectionOpen {
            name: normalize_key(rest),
            raw,
        }
    } else if let Some(rest) = trimmed.strip_prefix('^') {
        Token::InvertedOpen {
            name: normalize_key(rest),
            raw,
        }
    } else if let Some(rest) = trimmed.strip_prefix('/') {
        Token::SectionClose {
            name: normalize_key(rest),
            raw,
        }
    } else if trimmed.starts_with('!') {
        Token::Comment
    } else {
        Token::Variable {
            name: normalize_key(trimmed),
            raw,
        }
    }
}

/// Reduce a tag key to its last colon-separated segment, so modifier syntax
/// like `cloze:Text` matches the `Text` field.
fn normalize_key(key: &str) -> String {
    let trimmed = key.trim();
    trimmed
        .rsplit(':')
        .next()
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

fn is_truthy(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

fn eval_range(
    tokens: &[Token],
    start: usize,
    end: usize,
    fields: &HashMap<String, String>,
    out: &mut String,
) {
    let mut i = start;
    while i < end {
        match &tokens[i] {
            Token::Text(text) => out.push_str(text),
            Token::Comment => {}
            // A close without a matching open is ignored.
            Token::SectionClose { .. } => {}
            Token::Variable { name, .. } => {
                if let Some(value) = fields.get(name) {
                    out.push_str(value);
                }
            }
            Token::SectionOpen { name, raw } | Token::InvertedOpen { name, raw } => {
                let inverted = matches!(tokens[i], Token::InvertedOpen { .. });
                match find_section_close(tokens, i + 1, end, name) {
                    Some(close) => {
                        if is_truthy(fields.get(name)) != inverted {
                            eval_range(tokens, i + 1, close, fields, out);
                        }
                        i = close;
                    }
                    None => {
                        // Unterminated section: emit the rest verbatim.
                        out.push_str(raw);
                        for token in &tokens[i + 1..end] {
                            out.push_str(token.literal());
                        }
                        return;
                    }
                }
            }
        }
        i += 1;
    }
}

/// Find the close tag matching `name`, tracking nesting depth for sections
/// that reuse the same name.
fn find_section_close(tokens: &[Token], start: usize, end: usize, name: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().take(end).skip(start) {
        match token {
            Token::SectionOpen { name: n, .. } | Token::InvertedOpen { name: n, .. }
                if n == name =>
            {
                depth += 1;
            }
            Token::SectionClose { name: n, .. } if n == name => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_fields() {
        let out = render("Q: {{Front}}", &fields(&[("Front", "What is Rust?")]));
        assert_eq!(out, "Q: What is Rust?");
    }

    #[test]
    fn missing_field_renders_empty() {
        assert_eq!(render("[{{Missing}}]", &fields(&[])), "[]");
    }

    #[test]
    fn comments_are_dropped() {
        assert_eq!(render("a{{! ignore me }}b", &fields(&[])), "ab");
    }

    #[test]
    fn section_renders_when_truthy() {
        let tmpl = "{{#Extra}}<hr>{{Extra}}{{/Extra}}";
        assert_eq!(render(tmpl, &fields(&[("Extra", "note")])), "<hr>note");
        assert_eq!(render(tmpl, &fields(&[("Extra", "   ")])), "");
        assert_eq!(render(tmpl, &fields(&[])), "");
    }

    #[test]
    fn inverted_section_renders_when_falsy() {
        let tmpl = "{{^Extra}}nothing here{{/Extra}}";
        assert_eq!(render(tmpl, &fields(&[])), "nothing here");
        assert_eq!(render(tmpl, &fields(&[("Extra", "x")])), "");
    }

    #[test]
    fn nested_same_name_sections_track_depth() {
        let tmpl = "{{#A}}outer[{{#A}}inner{{/A}}]{{/A}}after";
        assert_eq!(render(tmpl, &fields(&[("A", "y")])), "outer[inner]after");
    }

    #[test]
    fn unterminated_section_degrades_to_literal() {
        let tmpl = "before {{#A}}inside {{Front}}";
        let out = render(tmpl, &fields(&[("Front", "x"), ("A", "y")]));
        assert_eq!(out, "before {{#A}}inside {{Front}}");
    }

    #[test]
    fn stray_close_is_ignored() {
        assert_eq!(render("a{{/A}}b", &fields(&[("A", "x")])), "ab");
    }

    #[test]
    fn modifier_prefix_is_normalized_to_field_name() {
        let out = render("{{cloze:Text}}", &fields(&[("Text", "{{c1::x}} stays")]));
        assert_eq!(out, "{{c1::x}} stays");

        let tmpl = "{{#cloze:Text}}has text{{/cloze:Text}}";
        assert_eq!(render(tmpl, &fields(&[("Text", "x")])), "has text");
    }

    #[test]
    fn front_side_is_a_plain_field() {
        let out = render(
            "{{FrontSide}}<hr id=answer>{{Back}}",
            &fields(&[("FrontSide", "<b>Q</b>"), ("Back", "A")]),
        );
        assert_eq!(out, "<b>Q</b><hr id=answer>A");
    }

    #[test]
    fn unclosed_delimiter_is_literal() {
        assert_eq!(render("oops {{Front", &fields(&[("Front", "x")])), "oops {{Front");
    }
}
