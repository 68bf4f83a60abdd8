// Chunk: docs/chunks/rule_highlighting - Block classifier with carry state

//! Block classifier.
//!
//! Classifies one block of text against a [`Grammar`], producing an ordered,
//! gap-free list of [`ClassifiedSpan`]s and the [`CarryState`] the next block
//! starts in. Classification is a pure function of the grammar, the block
//! text and the incoming carry state.
//!
//! # Algorithm
//!
//! 1. If the block starts inside an open region, the region's end delimiter is
//!    searched from offset 0. Everything up to and including it is one span of
//!    the region's category. With no end delimiter the whole block is that span
//!    and the open state is carried on.
//! 2. Otherwise rules are tried in order at each position. The first match
//!    produces a span and the scan continues after it.
//! 3. A multi-line region with no end in this block covers the rest of the
//!    block and sets the outgoing carry state.
//! 4. Characters no rule matches are coalesced into `Other` spans.

use quill_buffer::TextRange;

use crate::category::Category;
use crate::grammar::{Grammar, Rule};

/// Whether a block ends inside an open multi-line region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CarryState {
    /// The next block starts outside any region.
    #[default]
    None,
    /// The next block starts inside the region rule at `rule`.
    InRegion { rule: usize, category: Category },
}

impl CarryState {
    /// Returns true if a region is open at the end of the block.
    pub fn is_open(&self) -> bool {
        matches!(self, CarryState::InRegion { .. })
    }

    /// The category of the open region, if any.
    pub fn category(&self) -> Option<Category> {
        match self {
            CarryState::None => None,
            CarryState::InRegion { category, .. } => Some(*category),
        }
    }
}

/// A categorized span within a block. Offsets are block-relative bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedSpan {
    pub start: usize,
    pub len: usize,
    pub category: Category,
}

impl ClassifiedSpan {
    pub fn new(start: usize, len: usize, category: Category) -> Self {
        Self { start, len, category }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn range(&self) -> TextRange {
        TextRange::new(self.start, self.len)
    }
}

/// The result of classifying one block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockClassification {
    pub spans: Vec<ClassifiedSpan>,
    pub outgoing: CarryState,
}

/// Classifies one block (a single line, without its newline).
///
/// ```
/// use quill_syntax::{classify, CarryState, Category, Grammar};
///
/// let grammar = Grammar::builder("c")
///     .region("/*", "*/", Category::Comment, true)
///     .build()
///     .unwrap();
///
/// let first = classify(&grammar, "x /* open", CarryState::None);
/// assert!(first.outgoing.is_open());
///
/// let second = classify(&grammar, "still */ y", first.outgoing);
/// assert_eq!(second.spans[0].category, Category::Comment);
/// assert_eq!(second.outgoing, CarryState::None);
/// ```
pub fn classify(grammar: &Grammar, text: &str, incoming: CarryState) -> BlockClassification {
    if text.is_empty() {
        return BlockClassification {
            spans: Vec::new(),
            outgoing: incoming,
        };
    }

    let mut spans = SpanWriter::default();
    let mut pos = 0;

    if let CarryState::InRegion { rule, category } = incoming {
        match grammar.region(rule) {
            Some(region) => match region.find_end(text, 0) {
                Some(end) => {
                    spans.push(0, end, category);
                    pos = end;
                }
                None => {
                    spans.push(0, text.len(), category);
                    return BlockClassification {
                        spans: spans.finish(),
                        outgoing: incoming,
                    };
                }
            },
            // The grammar changed under the carry state; start fresh.
            None => {}
        }
    }

    while pos < text.len() {
        match match_rules(grammar, text, pos) {
            Some(RuleMatch::Span { len, category }) => {
                spans.push(pos, len, category);
                pos += len;
            }
            Some(RuleMatch::OpenRegion { rule, category }) => {
                spans.push(pos, text.len() - pos, category);
                return BlockClassification {
                    spans: spans.finish(),
                    outgoing: CarryState::InRegion { rule, category },
                };
            }
            None => {
                let step = text[pos..].chars().next().map_or(1, char::len_utf8);
                spans.push(pos, step, Category::Other);
                pos += step;
            }
        }
    }

    BlockClassification {
        spans: spans.finish(),
        outgoing: CarryState::None,
    }
}

enum RuleMatch {
    Span { len: usize, category: Category },
    OpenRegion { rule: usize, category: Category },
}

fn match_rules(grammar: &Grammar, text: &str, pos: usize) -> Option<RuleMatch> {
    for (index, rule) in grammar.rules().iter().enumerate() {
        match rule {
            Rule::Keywords(keywords) => {
                if let Some(len) = keywords.match_at(text, pos) {
                    return Some(RuleMatch::Span {
                        len,
                        category: keywords.category(),
                    });
                }
            }
            Rule::Pattern(pattern) => {
                if let Some(len) = pattern.match_at(text, pos) {
                    return Some(RuleMatch::Span {
                        len,
                        category: pattern.category(),
                    });
                }
            }
            Rule::Region(region) => {
                if !region.starts_at(text, pos) {
                    continue;
                }
                let body = pos + region.start_delimiter().len();
                return Some(match region.find_end(text, body) {
                    Some(end) => RuleMatch::Span {
                        len: end - pos,
                        category: region.category(),
                    },
                    None if region.is_multiline() => RuleMatch::OpenRegion {
                        rule: index,
                        category: region.category(),
                    },
                    None => RuleMatch::Span {
                        len: text.len() - pos,
                        category: region.category(),
                    },
                });
            }
        }
    }
    None
}

/// Accumulates spans, merging adjacent `Other` spans.
#[derive(Default)]
struct SpanWriter {
    spans: Vec<ClassifiedSpan>,
}

impl SpanWriter {
    fn push(&mut self, start: usize, len: usize, category: Category) {
        if len == 0 {
            return;
        }
        if category == Category::Other {
            if let Some(last) = self.spans.last_mut() {
                if last.category == Category::Other && last.end() == start {
                    last.len += len;
                    return;
                }
            }
        }
        self.spans.push(ClassifiedSpan::new(start, len, category));
    }

    fn finish(self) -> Vec<ClassifiedSpan> {
        self.spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::PatternShape;

    fn c_like() -> Grammar {
        Grammar::builder("c")
            .keywords(Category::Keyword, ["if", "else", "return"])
            .keywords(Category::DataType, ["int", "char"])
            .pattern(PatternShape::LineComment { marker: "//".into() }, Category::Comment)
            .region("/*", "*/", Category::Comment, true)
            .pattern(
                PatternShape::Quoted {
                    quote: '"',
                    escape: Some('\\'),
                },
                Category::String,
            )
            .pattern(PatternShape::Number, Category::Number)
            .pattern(PatternShape::Call, Category::Function)
            .build()
            .unwrap()
    }

    fn categories(result: &BlockClassification, text: &str) -> Vec<(String, Category)> {
        result
            .spans
            .iter()
            .map(|s| (text[s.start..s.end()].to_string(), s.category))
            .collect()
    }

    fn assert_covers(result: &BlockClassification, text: &str) {
        let mut expected = 0;
        for span in &result.spans {
            assert_eq!(span.start, expected, "gap or overlap before {:?} in {:?}", span, text);
            assert!(span.len > 0, "empty span in {:?}", text);
            expected = span.end();
        }
        assert_eq!(expected, text.len(), "spans must cover {:?}", text);
    }

    // ==================== Keyword boundary ====================

    #[test]
    fn test_keyword_inside_word_is_not_matched() {
        let grammar = c_like();
        let result = classify(&grammar, "ifconfig", CarryState::None);
        assert!(
            result.spans.iter().all(|s| s.category != Category::Keyword),
            "got {:?}",
            result.spans
        );
        assert_eq!(result.spans, vec![ClassifiedSpan::new(0, 8, Category::Other)]);
    }

    #[test]
    fn test_keyword_then_call_parenthesis() {
        let grammar = c_like();
        let result = classify(&grammar, "if (x)", CarryState::None);
        let keywords: Vec<_> = result
            .spans
            .iter()
            .filter(|s| s.category == Category::Keyword)
            .collect();
        assert_eq!(keywords, vec![&ClassifiedSpan::new(0, 2, Category::Keyword)]);
        assert_covers(&result, "if (x)");
    }

    // ==================== Span coverage ====================

    #[test]
    fn test_mixed_line() {
        let grammar = c_like();
        let text = r#"int n = strlen("a\"b") + 42; // done"#;
        let result = classify(&grammar, text, CarryState::None);
        assert_covers(&result, text);
        assert_eq!(
            categories(&result, text),
            vec![
                ("int".to_string(), Category::DataType),
                (" n = ".to_string(), Category::Other),
                ("strlen".to_string(), Category::Function),
                ("(".to_string(), Category::Other),
                (r#""a\"b""#.to_string(), Category::String),
                (") + ".to_string(), Category::Other),
                ("42".to_string(), Category::Number),
                ("; ".to_string(), Category::Other),
                ("// done".to_string(), Category::Comment),
            ]
        );
        assert_eq!(result.outgoing, CarryState::None);
    }

    #[test]
    fn test_coverage_with_multibyte_text() {
        let grammar = c_like();
        for text in ["héllo wörld", "→ if ← 1", "\"ünïcode\" /* ✓ */ x", "日本語"] {
            let result = classify(&grammar, text, CarryState::None);
            assert_covers(&result, text);
        }
    }

    #[test]
    fn test_adjacent_other_runs_coalesce() {
        let grammar = c_like();
        let result = classify(&grammar, "a + b", CarryState::None);
        assert_eq!(result.spans, vec![ClassifiedSpan::new(0, 5, Category::Other)]);
    }

    #[test]
    fn test_plain_text_grammar() {
        let grammar = Grammar::plain_text();
        let result = classify(&grammar, "if (x) /* y */", CarryState::None);
        assert_eq!(result.spans, vec![ClassifiedSpan::new(0, 14, Category::Other)]);
    }

    // ==================== Idempotence ====================

    #[test]
    fn test_idempotent() {
        let grammar = c_like();
        let incoming = CarryState::InRegion {
            rule: 3,
            category: Category::Comment,
        };
        for (text, carry) in [("if x /* y", CarryState::None), ("a */ if 1", incoming)] {
            let first = classify(&grammar, text, carry);
            let second = classify(&grammar, text, carry);
            assert_eq!(first, second);
        }
    }

    // ==================== Carry state ====================

    #[test]
    fn test_unterminated_region_opens_carry() {
        let grammar = c_like();
        let result = classify(&grammar, "x /* a", CarryState::None);
        assert_eq!(
            result.spans,
            vec![
                ClassifiedSpan::new(0, 2, Category::Other),
                ClassifiedSpan::new(2, 4, Category::Comment),
            ]
        );
        assert_eq!(
            result.outgoing,
            CarryState::InRegion {
                rule: 3,
                category: Category::Comment
            }
        );
    }

    #[test]
    fn test_block_inside_region_is_one_span() {
        let grammar = c_like();
        let incoming = classify(&grammar, "/* a", CarryState::None).outgoing;
        let result = classify(&grammar, "if (x) return 1;", incoming);
        assert_eq!(result.spans, vec![ClassifiedSpan::new(0, 16, Category::Comment)]);
        assert_eq!(result.outgoing, incoming);
    }

    #[test]
    fn test_region_closes_then_scan_resumes() {
        let grammar = c_like();
        let incoming = classify(&grammar, "/* a", CarryState::None).outgoing;
        let result = classify(&grammar, "b */ if", incoming);
        assert_eq!(
            result.spans,
            vec![
                ClassifiedSpan::new(0, 4, Category::Comment),
                ClassifiedSpan::new(4, 1, Category::Other),
                ClassifiedSpan::new(5, 2, Category::Keyword),
            ]
        );
        assert_eq!(result.outgoing, CarryState::None);
    }

    #[test]
    fn test_region_closed_on_same_line() {
        let grammar = c_like();
        let result = classify(&grammar, "/* a */ 1", CarryState::None);
        assert_eq!(result.spans[0], ClassifiedSpan::new(0, 7, Category::Comment));
        assert_eq!(result.spans[0].range(), TextRange::new(0, 7));
        assert_eq!(result.outgoing, CarryState::None);
    }

    #[test]
    fn test_empty_block_passes_carry_through() {
        let grammar = c_like();
        let incoming = CarryState::InRegion {
            rule: 3,
            category: Category::Comment,
        };
        let result = classify(&grammar, "", incoming);
        assert!(result.spans.is_empty());
        assert_eq!(result.outgoing, incoming);

        let result = classify(&grammar, "", CarryState::None);
        assert_eq!(result.outgoing, CarryState::None);
    }

    #[test]
    fn test_stale_carry_for_non_region_rule_is_ignored() {
        let grammar = c_like();
        let bogus = CarryState::InRegion {
            rule: 0,
            category: Category::Comment,
        };
        let result = classify(&grammar, "if", bogus);
        assert_eq!(result.spans, vec![ClassifiedSpan::new(0, 2, Category::Keyword)]);
        assert_eq!(result.outgoing, CarryState::None);
    }

    #[test]
    fn test_symmetric_delimiter_region() {
        let grammar = Grammar::builder("py")
            .escaped_region("'''", "'''", '\\', Category::String, true)
            .build()
            .unwrap();
        let result = classify(&grammar, "x = '''doc''' y", CarryState::None);
        assert_eq!(result.spans[1], ClassifiedSpan::new(4, 9, Category::String));
        assert_eq!(result.outgoing, CarryState::None);

        let open = classify(&grammar, "'''doc", CarryState::None).outgoing;
        assert!(open.is_open());
        let close = classify(&grammar, r"a \''' b ''' c", open);
        assert_eq!(close.spans[0], ClassifiedSpan::new(0, 12, Category::String));
    }

    #[test]
    fn test_single_line_region_does_not_carry() {
        let grammar = Grammar::builder("t")
            .region("<", ">", Category::DataType, false)
            .build()
            .unwrap();
        let result = classify(&grammar, "a <b", CarryState::None);
        assert_eq!(result.spans[1], ClassifiedSpan::new(2, 2, Category::DataType));
        assert_eq!(result.outgoing, CarryState::None);
    }

    #[test]
    fn test_first_rule_wins() {
        // "//" is both a line comment and a region start; order decides.
        let comment_first = Grammar::builder("a")
            .pattern(PatternShape::LineComment { marker: "//".into() }, Category::Comment)
            .region("//", "\\\\", Category::String, true)
            .build()
            .unwrap();
        let region_first = Grammar::builder("b")
            .region("//", "\\\\", Category::String, true)
            .pattern(PatternShape::LineComment { marker: "//".into() }, Category::Comment)
            .build()
            .unwrap();

        assert_eq!(
            classify(&comment_first, "// x", CarryState::None).spans[0].category,
            Category::Comment
        );
        let region = classify(&region_first, "// x", CarryState::None);
        assert_eq!(region.spans[0].category, Category::String);
        assert!(region.outgoing.is_open());
    }
}
