//! Integration tests for compiled patterns and the matcher.

use trellis_foundation::{TypeId, Value};
use trellis_parser::expr::Literal;
use trellis_parser::{Diagnostic, Pattern, PatternMatch, Quality, RegistryBuilder, Resolved, match_pattern};

// =============================================================================
// Helper Functions
// =============================================================================

fn compile(source: &str) -> Pattern {
    Pattern::compile(source, RegistryBuilder::new().types()).unwrap()
}

fn echo(_slot: usize, text: &str) -> Result<Resolved, Diagnostic> {
    Ok(Resolved::new(Box::new(Literal::single(
        Value::string(text),
        TypeId::STRING,
    ))))
}

fn run(source: &str, input: &str) -> Option<PatternMatch> {
    let mut resolve = echo;
    match_pattern(&compile(source), input, &mut resolve).ok()
}

fn bound(m: &PatternMatch) -> Vec<Option<String>> {
    m.exprs
        .iter()
        .map(|r| {
            r.as_ref()
                .and_then(|r| r.expr.literal_values())
                .and_then(|v| v.first())
                .map(ToString::to_string)
        })
        .collect()
}

// =============================================================================
// Slot Count
// =============================================================================

#[test]
fn every_match_has_one_entry_per_placeholder() {
    let source = "give %object% [to %object%] [with %object% and %object%]";
    let pattern = compile(source);
    for input in ["give a", "give a to b", "give a with b and c", "give a to b with c and d"] {
        let m = run(source, input).unwrap_or_else(|| panic!("no match for {input}"));
        assert_eq!(m.exprs.len(), pattern.slot_count(), "{input}");
    }
}

#[test]
fn excluded_placeholders_stay_unbound() {
    let m = run("give %object% [to %object%] [with %object%]", "give a with c").unwrap();
    assert_eq!(bound(&m), [Some("a".into()), None, Some("c".into())]);
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn the_same_input_always_binds_the_same_way() {
    let source = "add %object% to %object%";
    let first = bound(&run(source, "add 1 to 2 to {x}").unwrap());
    for _ in 0..10 {
        assert_eq!(bound(&run(source, "add 1 to 2 to {x}").unwrap()), first);
    }
    assert_eq!(first, [Some("1 to 2".into()), Some("{x}".into())]);
}

// =============================================================================
// Marks and Groups
// =============================================================================

#[test]
fn marks_combine_by_xor() {
    let source = "(1¦open|2¦close) [4¦all] [the] (8¦doors|windows)";
    assert_eq!(run(source, "open all doors").map(|m| m.mark), Some(1 ^ 4 ^ 8));
    assert_eq!(run(source, "close the windows").map(|m| m.mark), Some(2));
    assert_eq!(run(source, "open all the windows").map(|m| m.mark), Some(1 ^ 4));
    assert!(run(source, "shut the doors").is_none());
}

#[test]
fn optional_groups_may_be_skipped_or_taken() {
    let source = "[the] event (is|was) cancel[l]ed";
    for input in ["event is canceled", "the event was cancelled", "THE Event Is Cancelled"] {
        assert!(run(source, input).is_some(), "{input}");
    }
    assert!(run(source, "the event is").is_none());
}

#[test]
fn plain_punctuation_matches_itself() {
    assert!(run("%object% != %object%", "1 != 2").is_some());
    assert!(run(r"%object% \<= %object%", "1 <= 2").is_some());
    assert!(run("%object% \\* %object%", "2 * 3").is_some());
}

// =============================================================================
// Inline Regexes
// =============================================================================

#[test]
fn inline_regexes_are_whole_word_and_case_insensitive() {
    let m = run(r"command [/]<[a-z]+>", "command /HELP").unwrap();
    assert_eq!(m.regexes[0].text(), "HELP");
    assert!(run(r"stop <\d+> loops", "stop 3x loops").is_none());
}

// =============================================================================
// Diagnostics
// =============================================================================

#[test]
fn the_most_specific_diagnostic_wins() {
    let pattern = compile("give %object% to %object%");
    let mut resolve = |slot: usize, text: &str| match (slot, text) {
        (0, "x") => Err(Diagnostic::not_an_expression("'x' is not an item")),
        (1, _) => Err(Diagnostic::semantic(format!("'{text}' cannot receive items"))),
        _ => echo(slot, text),
    };
    let err = match_pattern(&pattern, "give apple to bob", &mut resolve)
        .unwrap_err()
        .unwrap();
    assert_eq!(err.quality, Quality::SemanticError);
    assert_eq!(err.message, "'bob' cannot receive items");
}

#[test]
fn a_pattern_that_does_not_fit_has_no_diagnostic() {
    let mut resolve = echo;
    let result = match_pattern(&compile("say %object%"), "shout hi", &mut resolve);
    assert!(matches!(result, Err(None)));
}
