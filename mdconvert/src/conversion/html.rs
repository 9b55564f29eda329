//! Best-effort HTML to Markdown conversion.
//!
//! A single forward pass over html5ever's tokenizer: a [`TokenSink`] maps the
//! handful of tags we understand onto Markdown and keeps the text of everything
//! else. No tree is built, so malformed or nested markup simply converts less
//! well. `<script>` and `<style>` bodies, comments and doctypes are dropped.

use std::cell::RefCell;

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts};

/// Convert an HTML document (or fragment) to Markdown.
pub fn html_to_markdown(html: &str) -> String {
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));

    let tokenizer = Tokenizer::new(MarkdownSink::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&input);
    tokenizer.end();

    let out = tokenizer.sink.writer.take().out;
    collapse_blank_lines(out.trim())
}

#[derive(Default)]
struct MarkdownSink {
    writer: RefCell<MarkdownWriter>,
}

impl TokenSink for MarkdownSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        self.writer.borrow_mut().write(token)
    }
}

#[derive(Default)]
struct MarkdownWriter {
    out: String,
    /// Inside a `<script>` or `<style>` element
    in_raw_text: bool,
    /// Open `<a>` elements; `None` for anchors without an href
    links: Vec<Option<String>>,
}

impl MarkdownWriter {
    fn write(&mut self, token: Token) -> TokenSinkResult<()> {
        match token {
            Token::CharacterTokens(text) if !self.in_raw_text => self.out.push_str(&text),
            Token::TagToken(tag) => return self.write_tag(&tag),
            _ => {}
        }
        TokenSinkResult::Continue
    }

    fn write_tag(&mut self, tag: &Tag) -> TokenSinkResult<()> {
        let opening = tag.kind == TagKind::StartTag;
        match (&*tag.name, opening) {
            ("script", true) => {
                self.in_raw_text = true;
                return TokenSinkResult::RawData(RawKind::ScriptData);
            }
            ("style", true) => {
                self.in_raw_text = true;
                return TokenSinkResult::RawData(RawKind::Rawtext);
            }
            ("script" | "style", false) => self.in_raw_text = false,
            ("h1" | "h2" | "h3" | "h4", true) => {
                let level = usize::from(tag.name.as_bytes()[1] - b'0');
                self.out.push_str("\n\n");
                self.out.push_str(&"#".repeat(level));
                self.out.push(' ');
            }
            ("h1" | "h2" | "h3" | "h4" | "p", false) => self.out.push_str("\n\n"),
            ("br", _) => self.out.push('\n'),
            ("b" | "strong", _) => self.out.push_str("**"),
            ("i" | "em", _) => self.out.push('*'),
            ("a", true) => {
                let href = tag
                    .attrs
                    .iter()
                    .find(|attr| &*attr.name.local == "href")
                    .map(|attr| attr.value.to_string());
                if href.is_some() {
                    self.out.push('[');
                }
                self.links.push(href);
            }
            ("a", false) => {
                if let Some(Some(href)) = self.links.pop() {
                    self.out.push_str("](");
                    self.out.push_str(&href);
                    self.out.push(')');
                }
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

/// Collapse runs of three or more newlines down to exactly two.
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;
    for c in text.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines > 2 {
                continue;
            }
        } else {
            newlines = 0;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_paragraphs_and_emphasis() {
        let markdown = html_to_markdown("<h1>Title</h1><p>Hi <b>there</b></p>");
        assert_eq!(markdown, "# Title\n\nHi **there**");
    }

    #[test]
    fn heading_levels_and_attributes() {
        let markdown = html_to_markdown(r#"<H2 class="x">Two</H2><h3>Three</h3><h4 id=a>Four</h4><h5>Five</h5>"#);
        assert_eq!(markdown, "## Two\n\n### Three\n\n#### Four\n\nFive");
    }

    #[test]
    fn drops_scripts_styles_and_comments() {
        let html = "<html><head><STYLE>p { color: red; }</STYLE>\n<script type=\"text/javascript\">\nif (a < b) { alert('<p>x</p>'); }\n</SCRIPT></head><body><!-- hidden > text --><p>Visible</p></body></html>";
        assert_eq!(html_to_markdown(html), "Visible");
    }

    #[test]
    fn links_with_and_without_href() {
        let html = r#"<p>See <a class="ext" href="https://example.com/a?b=1&amp;c=2">the docs</a> or <a name="top">here</a> and <a href='/x'>x</a></p>"#;
        assert_eq!(
            html_to_markdown(html),
            "See [the docs](https://example.com/a?b=1&c=2) or here and [x](/x)"
        );
    }

    #[test]
    fn quoted_attributes_may_contain_angle_brackets() {
        let html = r#"<a title="a > b" href="/cmp">compare</a>"#;
        assert_eq!(html_to_markdown(html), "[compare](/cmp)");
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(html_to_markdown("<p>Fish &amp; chips &lt;3 &eacute;t&eacute;</p>"), "Fish & chips <3 été");
    }

    #[test]
    fn line_breaks_and_italics() {
        let html = "one<br>two<BR/>three<br class=\"c\" />four <i>it</i> <em>em</em> <strong>st</strong>";
        assert_eq!(html_to_markdown(html), "one\ntwo\nthree\nfour *it* *em* **st**");
    }

    #[test]
    fn strips_unknown_tags_and_collapses_blank_lines() {
        let html = "<!DOCTYPE html><div><span>a</span></div>\n\n\n\n<ul><li>b</li></ul><p>c</p><p>d</p>";
        assert_eq!(html_to_markdown(html), "a\n\nbc\n\nd");
    }

    #[test]
    fn stray_angle_brackets_are_text() {
        assert_eq!(html_to_markdown("1 < 2 and <b>bold</b>"), "1 < 2 and **bold**");
    }

    #[test]
    fn unterminated_script_drops_the_rest() {
        assert_eq!(html_to_markdown("<p>keep</p><script>var x = 1;"), "keep");
    }
}
