// Chunk: docs/chunks/incremental_session - Highlight session with carry-state propagation
//!
//! End-to-end tests through the public API: theme loading, language
//! detection, block classification and incremental sessions.

use std::sync::Arc;
use std::thread;

use quill_syntax::{
    classify, fallback_color, CarryState, Category, Color, Grammar, HighlightSession, LanguageId,
    LanguageRegistry, SessionState, TextEdit, TextRange, Theme, ThemeLoadError, ThemeStore,
};

fn comment_grammar() -> Grammar {
    Grammar::builder("c-comments")
        .keywords(Category::Keyword, ["if"])
        .region("/*", "*/", Category::Comment, true)
        .build()
        .unwrap()
}

fn session_for(text: &str) -> HighlightSession {
    let mut registry = LanguageRegistry::new();
    registry
        .register(LanguageId::new("c-comments"), comment_grammar())
        .unwrap();
    let mut session = HighlightSession::with_text(Arc::new(registry), text);
    session.set_language(LanguageId::new("c-comments"));
    session.set_theme(Theme::fallback());
    session
}

fn categories_of(session: &mut HighlightSession, range: TextRange) -> Vec<(usize, usize, Category)> {
    session
        .classify(range)
        .into_iter()
        .map(|s| (s.start, s.len, s.category))
        .collect()
}

// =============================================================================
// Themes
// =============================================================================

#[test]
fn test_nonexistent_theme_falls_back() {
    let load = ThemeStore::new().load("Nonexistent");
    assert!(load.is_fallback());
    assert!(matches!(load.error, Some(ThemeLoadError::NotFound(_))));
    assert_eq!(load.theme.color_of(Category::Background), Color::rgb(0xff, 0xff, 0xff));
    assert_eq!(load.theme.color_of(Category::Keyword), fallback_color(Category::Keyword));
}

#[test]
fn test_color_of_is_total_for_empty_theme() {
    let theme = Theme::from_json("Empty", r#"{ "type": [], "color": [] }"#).unwrap();
    for category in Category::ALL {
        assert_eq!(theme.color_of(category), fallback_color(category), "{:?}", category);
    }
}

#[test]
fn test_builtin_themes_define_every_category() {
    let store = ThemeStore::new();
    for name in ["Light", "Dark"] {
        let theme = store.try_load(name).unwrap();
        for category in Category::ALL {
            assert!(theme.defines(category), "{} should define {:?}", name, category);
        }
    }
}

// =============================================================================
// Detection
// =============================================================================

#[test]
fn test_detection_determinism() {
    let registry = LanguageRegistry::new();
    assert_eq!(registry.detect("main.cpp"), registry.detect("MAIN.CPP"));
    assert_eq!(registry.detect("README"), LanguageId::plain_text());
    assert_eq!(registry.detect("readme.xyz123"), LanguageId::plain_text());
}

// =============================================================================
// Classifier
// =============================================================================

#[test]
fn test_keyword_boundary() {
    let grammar = comment_grammar();

    let spans = classify(&grammar, "ifconfig", CarryState::None).spans;
    assert_eq!(spans.iter().filter(|s| s.category == Category::Keyword).count(), 0);

    let spans = classify(&grammar, "if (x)", CarryState::None).spans;
    let keywords: Vec<_> = spans
        .iter()
        .filter(|s| s.category == Category::Keyword)
        .map(|s| (s.start, s.len))
        .collect();
    assert_eq!(keywords, vec![(0, 2)]);
}

#[test]
fn test_span_coverage_for_builtin_grammars() {
    let registry = LanguageRegistry::new();
    let samples = [
        ("main.c", "#include <stdio.h>\nint main(void) {\n  /* greet\n   */ printf(\"hi\\n\");\n  return 0;\n}"),
        ("lib.rs", "/// Doc\nfn main() {\n    let s = \"multi\nline\";\n    println!(\"{}\", 'x');\n}"),
        ("app.py", "def f(x):\n    \"\"\"Doc\n    string\"\"\"\n    return x + 1  # done"),
        ("site.css", ".a { color: #fff; /* note\n */ margin: 4px; }"),
        ("page.html", "<!-- c\n--> <a href=\"x\">&amp;</a>"),
        ("q.sql", "SELECT id FROM t -- all\nWHERE x = 'y';"),
        ("run.sh", "echo \"$HOME\n\" # home"),
    ];

    for (file, source) in samples {
        let grammar = registry.grammar_for(&registry.detect(file));
        assert!(!grammar.id().is_plain_text(), "{} should have a grammar", file);
        let mut carry = CarryState::None;
        for line in source.split('\n') {
            let result = classify(&grammar, line, carry);
            let covered: usize = result.spans.iter().map(|s| s.len).sum();
            assert_eq!(covered, line.len(), "{}: spans must cover {:?}", file, line);
            let first = classify(&grammar, line, carry);
            assert_eq!(result, first, "{}: classification must be deterministic", file);
            carry = result.outgoing;
        }
    }
}

// =============================================================================
// Sessions
// =============================================================================

#[test]
fn test_carry_state_propagation() {
    let mut session = session_for("/* open\nif if if\nclose */");
    // Block 2 is inside the comment regardless of its keywords.
    assert_eq!(categories_of(&mut session, TextRange::new(8, 8)), vec![(8, 8, Category::Comment)]);

    // Block 0 no longer opens the comment.
    session.apply_edit(&TextEdit::new(TextRange::new(0, 2), "//"));
    let middle = categories_of(&mut session, TextRange::new(8, 8));
    assert_eq!(
        middle,
        vec![
            (8, 2, Category::Keyword),
            (10, 1, Category::Other),
            (11, 2, Category::Keyword),
            (13, 1, Category::Other),
            (14, 2, Category::Keyword),
        ]
    );
    assert_eq!(session.carry_state(1), Some(CarryState::None));
}

#[test]
fn test_incremental_edit_scenario() {
    let text = "/* a\nb */\nc";
    let mut session = session_for(text);
    assert_eq!(session.block_count(), 3);

    // Block 3 ("c") starts outside the comment.
    let c = text.rfind('c').unwrap();
    assert_eq!(categories_of(&mut session, TextRange::new(c, 1)), vec![(c, 1, Category::Other)]);
    assert_eq!(categories_of(&mut session, TextRange::new(5, 4)), vec![(5, 4, Category::Comment)]);

    // Remove the "/*" opener from block 1.
    session.apply_edit(&TextEdit::delete(session.text(), 0, 0, 0, 2));
    assert_eq!(session.text(), " a\nb */\nc");
    assert!(matches!(session.state(), SessionState::Stale(_)));

    let c = session.text().rfind('c').unwrap();
    assert_eq!(categories_of(&mut session, TextRange::new(c, 1)), vec![(c, 1, Category::Other)]);
    assert_eq!(session.state(), SessionState::Ready);

    // Block 2 was reclassified on the way: plain text now.
    assert_eq!(session.carry_state(0), Some(CarryState::None));
    assert_eq!(session.carry_state(1), Some(CarryState::None));
    assert_eq!(categories_of(&mut session, TextRange::new(3, 4)), vec![(3, 4, Category::Other)]);
}

#[test]
fn test_retyping_opener_restores_comment() {
    let mut session = session_for("/* a\nb */\nc");
    session.apply_edit(&TextEdit::delete(session.text(), 0, 0, 0, 2));
    session.classify(TextRange::new(0, session.text().len()));

    session.apply_edit(&TextEdit::insert(session.text(), 0, 0, "/*"));
    assert_eq!(categories_of(&mut session, TextRange::new(5, 4)), vec![(5, 4, Category::Comment)]);
    assert_eq!(session.carry_state(2), Some(CarryState::None));
}

#[test]
fn test_language_switch_reclassifies() {
    let registry = Arc::new(LanguageRegistry::new());
    let mut session = HighlightSession::with_text(Arc::clone(&registry), "# note\nx = 1");
    session.set_theme(Theme::fallback());
    session.set_language(registry.detect("notes.txt"));
    assert_eq!(categories_of(&mut session, TextRange::new(0, 6)), vec![(0, 6, Category::Other)]);

    session.set_language(registry.resolve_name("Python"));
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(categories_of(&mut session, TextRange::new(0, 6)), vec![(0, 6, Category::Comment)]);
}

#[test]
fn test_theme_switch_changes_colors_only() {
    let registry = Arc::new(LanguageRegistry::new());
    let store = ThemeStore::new();
    let mut session = HighlightSession::with_text(Arc::clone(&registry), "fn main() {}");
    session.set_language(LanguageId::new("rust"));
    session.set_theme(store.load("Light").into_theme());
    let light = session.classify(TextRange::new(0, 2));

    session.set_theme(store.load("Dark").into_theme());
    let dark = session.classify(TextRange::new(0, 2));

    assert_eq!(light[0].category, Category::Keyword);
    assert_eq!(dark[0].category, Category::Keyword);
    assert_ne!(light[0].color, dark[0].color);
}

#[test]
fn test_sessions_share_registry_across_threads() {
    let registry = Arc::new(LanguageRegistry::new());
    let theme = Arc::new(ThemeStore::new().load("Dark").into_theme());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let registry = Arc::clone(&registry);
            let theme = Arc::clone(&theme);
            thread::spawn(move || {
                let text = format!("/* {}\n*/ let x = {};", i, i);
                let mut session = HighlightSession::with_text(registry, text.as_str());
                session.set_language(LanguageId::new("rust"));
                session.set_theme(theme);
                session
                    .classify(TextRange::new(0, text.len()))
                    .iter()
                    .filter(|s| s.category == Category::Comment)
                    .count()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
}
