//! Integration tests for variable names.

use trellis_foundation::VariableName;

#[test]
fn names_are_case_insensitive() {
    assert_eq!(VariableName::new(" Score "), VariableName::new("score"));
    assert_eq!(VariableName::new("Score").as_str(), "score");
}

#[test]
fn list_names_and_children() {
    let list = VariableName::new("inventory::*");
    assert!(list.is_list());
    assert_eq!(list.list_prefix(), Some("inventory::"));

    let child = list.child("7").unwrap();
    assert_eq!(child.as_str(), "inventory::7");
    assert_eq!(child.last_segment(), "7");
    assert!(child.is_child_of("inventory::"));
    assert!(VariableName::new("score").child("1").is_none());
}

#[test]
fn numeric_segments_sort_by_value() {
    let mut names: Vec<VariableName> = ["l::10", "l::2", "l::b", "l::1", "l::a"]
        .into_iter()
        .map(VariableName::new)
        .collect();
    names.sort();
    let sorted: Vec<&str> = names.iter().map(VariableName::as_str).collect();
    assert_eq!(sorted, ["l::1", "l::2", "l::10", "l::a", "l::b"]);
}
