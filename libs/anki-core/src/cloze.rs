//! Cloze deletion rendering.
//!
//! Converts Anki's `{{cN::text::hint}}` markers into semantic HTML spans.
//! The hidden side shows a blank (or the hint when one is given); the
//! revealed side shows the deleted text. Multi-cloze notes produce one card
//! per distinct `N`, so only the marker matching the card's active index is
//! masked; the others stay visible as context.

use crate::card_type::CLOZE_RE;

/// Render cloze markers in `html` for presentation.
///
/// With `active_index` unset every deletion is treated as active. Marker
/// content is source HTML and passes through unescaped. The function is
/// pure; callers invoke it once per side with the same `active_index`.
pub fn render_cloze(html: &str, reveal: bool, active_index: Option<u32>) -> String {
    CLOZE_RE
        .replace_all(html, |caps: &regex::Captures<'_>| {
            let num = caps
                .get(1)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .unwrap_or(0);
            let content = caps.get(2).map_or("", |m| m.as_str());
            let hint = caps.get(3).map(|m| m.as_str()).filter(|h| !h.is_empty());

            let active = active_index.map_or(true, |index| index == num);
            if !active {
                // Inactive deletions are plain visible context on both sides.
                return content.to_string();
            }

            if reveal {
                let hint_html = hint
                    .map(|h| format!(r#"<span class="cloze-hint">({h})</span>"#))
                    .unwrap_or_default();
                format!(
                    r#"<span class="cloze cloze-revealed" data-cloze="{num}">{content}{hint_html}</span>"#
                )
            } else {
                let placeholder = match hint {
                    Some(h) => format!(r#"<span class="cloze-hint">{h}</span>"#),
                    None => "&hellip;".to_string(),
                };
                format!(r#"<span class="cloze cloze-hidden" data-cloze="{num}">{placeholder}</span>"#)
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hides_active_deletion_with_ellipsis() {
        let out = render_cloze("{{c1::Heart}} pumps blood", false, None);
        assert_eq!(
            out,
            r#"<span class="cloze cloze-hidden" data-cloze="1">&hellip;</span> pumps blood"#
        );
    }

    #[test]
    fn hides_active_deletion_with_hint() {
        let out = render_cloze("{{c1::Heart::organ}} pumps blood", false, None);
        assert_eq!(
            out,
            r#"<span class="cloze cloze-hidden" data-cloze="1"><span class="cloze-hint">organ</span></span> pumps blood"#
        );
    }

    #[test]
    fn reveals_active_deletion() {
        let out = render_cloze("{{c1::Heart}} pumps blood", true, None);
        assert_eq!(
            out,
            r#"<span class="cloze cloze-revealed" data-cloze="1">Heart</span> pumps blood"#
        );
    }

    #[test]
    fn revealed_hint_is_appended_in_parens() {
        let out = render_cloze("{{c1::Heart::organ}}", true, None);
        assert_eq!(
            out,
            r#"<span class="cloze cloze-revealed" data-cloze="1">Heart<span class="cloze-hint">(organ)</span></span>"#
        );
    }

    #[test]
    fn inactive_deletions_stay_visible() {
        let html = "{{c1::Alpha::HintA}} {{c2::Beta::HintB}}";

        let hidden = render_cloze(html, false, Some(1));
        assert!(hidden.contains("cloze-hidden"));
        assert!(hidden.contains("Beta"));
        assert!(!hidden.contains("Alpha"));

        let revealed = render_cloze(html, true, Some(1));
        assert!(revealed.contains(r#"data-cloze="1">Alpha"#));
        assert!(revealed.contains("Beta"));
        assert!(!revealed.contains(r#"data-cloze="2""#));
    }

    #[test]
    fn active_index_two_is_the_mirror_image() {
        let html = "{{c1::Alpha::HintA}} {{c2::Beta::HintB}}";

        let hidden = render_cloze(html, false, Some(2));
        assert!(hidden.contains("Alpha"));
        assert!(!hidden.contains("Beta"));

        let revealed = render_cloze(html, true, Some(2));
        assert!(revealed.contains("Alpha"));
        assert!(revealed.contains(r#"data-cloze="2">Beta"#));
    }

    #[test]
    fn no_active_index_masks_every_deletion() {
        let out = render_cloze("{{c1::First}} {{c2::Second}}", false, None);
        assert!(!out.contains("First"));
        assert!(!out.contains("Second"));
        assert_eq!(out.matches("cloze-hidden").count(), 2);
    }

    #[test]
    fn markup_in_content_passes_through() {
        let out = render_cloze("{{c1::<strong>bold</strong>}}", true, None);
        assert!(out.contains("<strong>bold</strong>"));
    }

    #[test]
    fn text_without_markers_is_unchanged() {
        assert_eq!(render_cloze("plain text", true, Some(1)), "plain text");
    }
}
