use scraper::{Html, Selector};

pub const MIDDLE_SELECTOR: &str = ".content-middle";
pub const RIGHT_SELECTOR: &str = ".content-right";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub middle: Option<String>,
    pub right: Option<String>,
}

/// Parse `raw` into a detached tree and pull out the two panel sections.
/// The first match in document order wins; a missing section is `None`.
pub fn extract(raw: &str) -> Extracted {
    let doc = Html::parse_fragment(raw);
    Extracted {
        middle: inner_html_of(&doc, MIDDLE_SELECTOR),
        right: inner_html_of(&doc, RIGHT_SELECTOR),
    }
}

fn inner_html_of(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel).next().map(|el| el.inner_html())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_both_sections_verbatim() {
        let raw = r#"<div class="content-middle"><h1>Intro</h1><p>Hello <em>there</em></p></div>
<aside class="content-right"><ul><li>Tip</li></ul></aside>"#;
        let ex = extract(raw);
        assert_eq!(
            ex.middle.as_deref(),
            Some("<h1>Intro</h1><p>Hello <em>there</em></p>")
        );
        assert_eq!(ex.right.as_deref(), Some("<ul><li>Tip</li></ul>"));
    }

    #[test]
    fn middle_only_leaves_right_absent() {
        let ex = extract(r#"<div class="content-middle">Setup steps</div>"#);
        assert_eq!(ex.middle.as_deref(), Some("Setup steps"));
        assert!(ex.right.is_none());
    }

    #[test]
    fn neither_section_is_not_an_error() {
        let ex = extract("<html><body><p>stray</p></body></html>");
        assert_eq!(ex, Extracted::default());
        assert_eq!(extract(""), Extracted::default());
    }

    #[test]
    fn first_match_wins_and_extra_classes_are_fine() {
        let raw = r#"<section class="page content-middle wide">first</section>
<div class="content-middle">second</div>"#;
        assert_eq!(extract(raw).middle.as_deref(), Some("first"));
    }

    #[test]
    fn nested_sections_are_found_inside_full_documents() {
        let raw = r#"<!DOCTYPE html><html><head><title>t</title></head><body>
<main><div class="wrap"><div class="content-right">side</div></div></main></body></html>"#;
        assert_eq!(extract(raw).right.as_deref(), Some("side"));
    }
}
