//! Paragraph extraction from musicalifeiten.nl pages.
//!
//! The collector walks the markup once, tracking whether it is inside an
//! `<article>` and whether it is inside `<script>` or `<style>`. Only article
//! text outside script and style is kept. Every `<p>` and `<div>` tag, opening
//! or closing, ends the paragraph being collected. Broken markup never fails;
//! it yields whatever paragraphs were recognized.

use std::sync::LazyLock;

use regex::Regex;

/// Paragraphs this short or shorter are navigation noise and are dropped.
pub const MIN_PARAGRAPH_CHARS: usize = 10;

/// Comment, tag, or run of text.
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?(?:-->|\z)|<(/?)([A-Za-z][A-Za-z0-9]*)[^>]*>|[^<]+|<")
        .unwrap_or_else(|e| unreachable!("token pattern is valid: {e}"))
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap_or_else(|e| unreachable!("{e}")));

#[derive(Debug, Default)]
struct Collector {
    paragraphs: Vec<String>,
    current: Vec<String>,
    in_article: bool,
    in_script: bool,
    in_style: bool,
}

impl Collector {
    fn start_tag(&mut self, tag: &str) {
        match tag {
            "script" => self.in_script = true,
            "style" => self.in_style = true,
            "article" => self.in_article = true,
            "p" | "div" => self.flush(),
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: &str) {
        match tag {
            "script" | "style" => {
                self.in_script = false;
                self.in_style = false;
            }
            "article" => self.in_article = false,
            "p" | "div" => self.flush(),
            _ => {}
        }
    }

    fn text(&mut self, data: &str) {
        if self.in_article && !self.in_script && !self.in_style {
            let decoded = decode_entities(data);
            let trimmed = decoded.trim();
            if !trimmed.is_empty() {
                self.current.push(trimmed.to_string());
            }
        }
    }

    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let paragraph = self.current.join(" ");
        let paragraph = paragraph.trim();
        if !paragraph.is_empty() {
            self.paragraphs.push(paragraph.to_string());
        }
        self.current.clear();
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.paragraphs
            .into_iter()
            .filter(|p| p.chars().count() > MIN_PARAGRAPH_CHARS)
            .collect()
    }
}

/// Extract the text paragraphs of an article from raw HTML.
pub fn extract_paragraphs(html: &str) -> Vec<String> {
    let mut collector = Collector::default();

    for token in TOKEN.captures_iter(html) {
        let Some(whole) = token.get(0) else { continue };
        match token.get(2) {
            Some(name) => {
                let tag = name.as_str().to_ascii_lowercase();
                let closing = token.get(1).is_some_and(|m| !m.as_str().is_empty());
                if closing {
                    collector.end_tag(&tag);
                } else {
                    collector.start_tag(&tag);
                }
            }
            None if whole.as_str().starts_with("<!--") => {}
            None => collector.text(whole.as_str()),
        }
    }

    collector.finish()
}

/// Collapse whitespace runs, decode `&nbsp;`, `&quot;` and `&amp;`, and trim.
pub fn clean_text(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text, " ");
    collapsed
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Decode named (HTML5) and numeric character references. Unknown
/// references are left as written.
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_article_paragraphs_only() {
        let html = r#"
            <html><body>
            <nav><p>Home | Composers | Discographies</p></nav>
            <article>
              <h1>Bach</h1>
              <p>Johann Sebastian Bach was born in Eisenach in 1685.</p>
              <p>He spent his last 27 years in Leipzig as Thomaskantor.</p>
            </article>
            <footer><p>Copyright musicalifeiten.nl</p></footer>
            </body></html>
        "#;

        let paragraphs = extract_paragraphs(html);
        assert_eq!(
            paragraphs,
            [
                "Johann Sebastian Bach was born in Eisenach in 1685.",
                "He spent his last 27 years in Leipzig as Thomaskantor.",
            ]
        );
    }

    #[test]
    fn test_skips_script_and_style() {
        let html = "<article><script>var tracking = 'some long script text';</script>\
                    <style>.article { color: red; margin: 0 }</style>\
                    <p>Only this sentence should survive.</p></article>";
        assert_eq!(extract_paragraphs(html), ["Only this sentence should survive."]);
    }

    #[test]
    fn test_short_paragraphs_dropped() {
        let html = "<article><p>Too short</p><p>0123456789</p><p>01234567890</p></article>";
        assert_eq!(extract_paragraphs(html), ["01234567890"]);
    }

    #[test]
    fn test_inline_tags_join_with_spaces() {
        let html = "<article><p>Recorded by <b>Glenn Gould</b> in <i>1981</i>.</p></article>";
        assert_eq!(extract_paragraphs(html), ["Recorded by Glenn Gould in 1981 ."]);
    }

    #[test]
    fn test_div_flushes_paragraph() {
        let html = "<article>First paragraph of text<div>Second paragraph of text</div></article>";
        assert_eq!(
            extract_paragraphs(html),
            ["First paragraph of text", "Second paragraph of text"]
        );
    }

    #[test]
    fn test_trailing_text_is_flushed() {
        let html = "<article><p>An unterminated paragraph at the end";
        assert_eq!(extract_paragraphs(html), ["An unterminated paragraph at the end"]);
    }

    #[test]
    fn test_entities_decoded() {
        let html = "<article><p>Fr&eacute;d&eacute;ric Chopin &amp; George Sand &#8211; Nohant</p></article>";
        assert_eq!(extract_paragraphs(html), ["Frédéric Chopin & George Sand \u{2013} Nohant"]);
    }

    #[test]
    fn test_comments_ignored() {
        let html = "<article><!-- <p>hidden paragraph text</p> --><p>Visible paragraph text</p></article>";
        assert_eq!(extract_paragraphs(html), ["Visible paragraph text"]);
    }

    #[test]
    fn test_malformed_input_does_not_fail() {
        assert!(extract_paragraphs("").is_empty());
        assert!(extract_paragraphs("<<<>>> <article <p").is_empty());
        let html = "<ARTICLE><P>Upper-case markup still counts</P></ARTICLE>";
        assert_eq!(extract_paragraphs(html), ["Upper-case markup still counts"]);
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Mahler \n\t Symphony&nbsp;No.&nbsp;2  "), "Mahler Symphony No. 2");
        assert_eq!(clean_text("&quot;Resurrection&quot; &amp; more"), "\"Resurrection\" & more");
    }

    #[test]
    fn test_uncommon_named_entities_decoded() {
        assert_eq!(decode_entities("Pr&ocirc;ne &hellip; &Aring;str&ouml;m"), "Prône \u{2026} Åström");
        let html = "<article><p>Fran&ccedil;ois Couperin, Pi&egrave;ces de clavecin</p></article>";
        assert_eq!(extract_paragraphs(html), ["François Couperin, Pièces de clavecin"]);
    }

    #[test]
    fn test_decode_unknown_entity_kept() {
        assert_eq!(decode_entities("&bogus; &#x41;"), "&bogus; A");
    }
}
