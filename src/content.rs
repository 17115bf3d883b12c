use std::sync::OnceLock;

use regex::{CaptureMatches, Regex};

/// One segment of an assistant (or user) message: either prose or a fenced
/// code sample. Blocks are derived fresh from the raw text on every render
/// and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Text(String),
    Code { language: String, text: String },
}

impl ContentBlock {
    fn text(raw: &str) -> Self {
        ContentBlock::Text(raw.trim().to_string())
    }

    fn code(language: Option<&str>, raw: &str) -> Self {
        ContentBlock::Code {
            language: language.unwrap_or("plaintext").to_string(),
            text: raw.trim().to_string(),
        }
    }
}

// Fenced region: triple backtick, optional language tag, a newline, then a
// non-greedy body up to the first closing triple backtick. No nesting.
fn fence_re() -> &'static Regex {
    static FENCE_RE: OnceLock<Regex> = OnceLock::new();
    FENCE_RE.get_or_init(|| Regex::new(r"```(\w+)?\n([\s\S]*?)```").unwrap())
}

/// Split `source` into alternating prose/code blocks, in source order.
///
/// Lazy: fences are scanned as the iterator is driven. Restartable by calling
/// `parse` again. Empty prose spans between fences are dropped, so the result
/// has at most one text block between consecutive code blocks.
///
/// An opening fence with no closing delimiter never matches; the dangling
/// remainder (backticks included) comes out as a trailing text block. A
/// partially revealed code block therefore renders as prose until its closing
/// fence appears.
pub fn parse(source: &str) -> Blocks<'_> {
    Blocks {
        source,
        fences: fence_re().captures_iter(source),
        cursor: 0,
        queued_code: None,
        tail_done: false,
    }
}

pub struct Blocks<'a> {
    source: &'a str,
    fences: CaptureMatches<'static, 'a>,
    cursor: usize,
    queued_code: Option<ContentBlock>,
    tail_done: bool,
}

impl<'a> Iterator for Blocks<'a> {
    type Item = ContentBlock;

    fn next(&mut self) -> Option<ContentBlock> {
        if let Some(code) = self.queued_code.take() {
            return Some(code);
        }
        if self.tail_done {
            return None;
        }
        match self.fences.next() {
            Some(caps) => {
                let fence = caps.get(0).expect("group 0 always present");
                let body = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
                let code = ContentBlock::code(caps.get(1).map(|m| m.as_str()), body);

                let leading = self.source[self.cursor..fence.start()].trim();
                self.cursor = fence.end();
                if leading.is_empty() {
                    Some(code)
                } else {
                    self.queued_code = Some(code);
                    Some(ContentBlock::text(leading))
                }
            }
            None => {
                self.tail_done = true;
                let tail = self.source[self.cursor..].trim();
                if tail.is_empty() {
                    None
                } else {
                    Some(ContentBlock::text(tail))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(source: &str) -> Vec<ContentBlock> {
        parse(source).collect()
    }

    #[test]
    fn plain_text_is_one_block() {
        assert_eq!(
            blocks("just some prose"),
            vec![ContentBlock::Text("just some prose".into())]
        );
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(blocks("").is_empty());
        assert!(blocks("   \n  ").is_empty());
    }

    #[test]
    fn single_fenced_block() {
        assert_eq!(
            blocks("```python\nprint(1)\n```"),
            vec![ContentBlock::Code {
                language: "python".into(),
                text: "print(1)".into(),
            }]
        );
    }

    #[test]
    fn language_defaults_to_plaintext() {
        assert_eq!(
            blocks("```\nfoo\n```"),
            vec![ContentBlock::Code {
                language: "plaintext".into(),
                text: "foo".into(),
            }]
        );
    }

    #[test]
    fn prose_around_fences_in_source_order() {
        let source = "Intro text.\n```rust\nlet x = 1;\n```\nMiddle.\n```\ny\n```\nOutro.";
        assert_eq!(
            blocks(source),
            vec![
                ContentBlock::Text("Intro text.".into()),
                ContentBlock::Code {
                    language: "rust".into(),
                    text: "let x = 1;".into(),
                },
                ContentBlock::Text("Middle.".into()),
                ContentBlock::Code {
                    language: "plaintext".into(),
                    text: "y".into(),
                },
                ContentBlock::Text("Outro.".into()),
            ]
        );
    }

    #[test]
    fn whitespace_between_fences_is_dropped() {
        let source = "```\na\n```\n   \n```\nb\n```";
        let got = blocks(source);
        assert_eq!(got.len(), 2);
        assert!(got
            .iter()
            .all(|b| matches!(b, ContentBlock::Code { .. })));
    }

    #[test]
    fn n_fences_yield_n_code_blocks() {
        let source = "a\n```\n1\n```\nb\n```\n2\n```\nc\n```\n3\n```\nd";
        let got = blocks(source);
        let code = got
            .iter()
            .filter(|b| matches!(b, ContentBlock::Code { .. }))
            .count();
        let text = got.len() - code;
        assert_eq!(code, 3);
        assert_eq!(text, 4);
        // No empty text blocks, everything trimmed.
        for block in &got {
            let s = match block {
                ContentBlock::Text(s) => s,
                ContentBlock::Code { text, .. } => text,
            };
            assert!(!s.is_empty());
            assert_eq!(s, s.trim());
        }
    }

    #[test]
    fn unterminated_fence_degrades_to_text() {
        assert_eq!(
            blocks("before\n```python\nprint(1)"),
            vec![ContentBlock::Text("before\n```python\nprint(1)".into())]
        );
    }

    #[test]
    fn first_closing_delimiter_terminates_the_block() {
        // No nesting: the inner "```" closes the fence.
        let source = "```\nouter\n```\nstill prose ```";
        assert_eq!(
            blocks(source),
            vec![
                ContentBlock::Code {
                    language: "plaintext".into(),
                    text: "outer".into(),
                },
                ContentBlock::Text("still prose ```".into()),
            ]
        );
    }

    #[test]
    fn parse_is_restartable() {
        let source = "hello\n```rust\nfn main() {}\n```";
        assert_eq!(blocks(source), blocks(source));
    }
}
