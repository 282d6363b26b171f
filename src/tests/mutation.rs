use super::{add_comment, apply, delete_comment, edit_comment, insert_annotation, Mutation};
use crate::error::Error;
use crate::marker::{marker_blocks, split_lines, Annotation};
use crate::scanner::scan;

const DOC: &str = "# Agreement\n\nThe parties agree\nto the following.\n\n- Term one\n- Term two\n";

fn fixed(id: &str, content: &str) -> Annotation {
    Annotation {
        author: "You".to_string(),
        date: "2024-05-01T09:30:00.000Z".to_string(),
        id: id.to_string(),
        content: content.to_string(),
        target_section_id: None,
    }
}

fn non_marker_lines(body: &str) -> Vec<String> {
    let lines = split_lines(body);
    let blocks = marker_blocks(&lines);
    lines
        .iter()
        .enumerate()
        .filter(|(i, _)| !blocks.iter().any(|b| (b.start..=b.end).contains(i)))
        .map(|(_, line)| (*line).to_string())
        .collect()
}

#[test]
fn test_insert_after_section_end() {
    let outcome = insert_annotation(DOC, 1, fixed("c-1", "Which parties?")).unwrap();
    assert_eq!(
        outcome.body,
        "# Agreement\n\nThe parties agree\nto the following.\n\n<!--comment:line-3\nauthor: You\ndate: 2024-05-01T09:30:00.000Z\nid: c-1\nWhich parties?\n-->\n\n- Term one\n- Term two\n"
    );
    assert_eq!(outcome.changed, 1);
    assert_eq!(
        outcome.annotation.unwrap().target_section_id.as_deref(),
        Some("line-3")
    );
}

#[test]
fn test_add_then_scan_recovers_comment() {
    let outcome = add_comment(DOC, 1, "You", "hello").unwrap();
    let doc = scan(&outcome.body);
    let section = doc.section_by_id("line-3").unwrap();
    let hellos: Vec<_> = section
        .comments
        .iter()
        .filter(|c| c.content == "hello")
        .collect();
    assert_eq!(hellos.len(), 1);
    assert_eq!(hellos[0].author, "You");
    assert_eq!(doc.comment_count(), 1);
}

#[test]
fn test_add_to_list_item_stays_with_item() {
    // The marker lands after the whole list but its tag points at the first item.
    let outcome = add_comment(DOC, 2, "You", "first term").unwrap();
    let doc = scan(&outcome.body);
    assert_eq!(doc.sections[2].content, vec!["- Term one"]);
    assert_eq!(doc.sections[2].comments[0].content, "first term");
    assert!(doc.sections[3].comments.is_empty());
}

#[test]
fn test_add_to_last_section_without_trailing_newline() {
    let outcome = add_comment("Only line", 0, "You", "note").unwrap();
    assert!(outcome.body.starts_with("Only line\n\n<!--comment:line-1\n"));
    assert!(outcome.body.ends_with("note\n-->"));
    assert_eq!(scan(&outcome.body).sections[0].comments.len(), 1);
}

#[test]
fn test_add_preserves_crlf() {
    let body = "Alpha\r\nbeta\r\n\r\nGamma\r\n";
    let outcome = add_comment(body, 0, "You", "note").unwrap();
    for line in split_lines(&outcome.body).iter().take(10).filter(|l| !l.is_empty()) {
        assert!(line.ends_with('\r'), "line {line:?} lost its CR");
    }
    assert_eq!(scan(&outcome.body).sections[0].comments[0].content, "note");
}

#[test]
fn test_add_skips_adjacent_marker_with_blank_line() {
    let body = "Alpha\n<!--comment:line-1\nauthor: a\ndate: d\nid: old\none\n\ntwo\n-->\n";
    let outcome = add_comment(body, 0, "You", "new note").unwrap();
    assert!(outcome.body.starts_with(body));

    let doc = scan(&outcome.body);
    assert_eq!(doc.sections.len(), 1);
    assert_eq!(doc.sections[0].content, vec!["Alpha"]);
    let contents: Vec<&str> = doc.sections[0]
        .comments
        .iter()
        .map(|c| c.content.as_str())
        .collect();
    assert_eq!(contents, vec!["one\n\ntwo", "new note"]);
}

#[test]
fn test_add_rejects_bad_section_and_empty_text() {
    assert!(matches!(
        add_comment(DOC, 9, "You", "x"),
        Err(Error::SectionOutOfRange { index: 9, count: 4 })
    ));
    assert!(matches!(
        add_comment(DOC, 0, "You", "   "),
        Err(Error::EmptyComment)
    ));
    assert!(matches!(
        add_comment(DOC, 0, "You", "a --> b"),
        Err(Error::InvalidField(_))
    ));
}

#[test]
fn test_section_preserving_delete() {
    let first = insert_annotation(DOC, 0, fixed("a", "one")).unwrap().body;
    let second = insert_annotation(&first, 1, fixed("b", "two")).unwrap().body;
    let third = insert_annotation(&second, 2, fixed("c", "three")).unwrap().body;
    assert_eq!(marker_blocks(&split_lines(&third)).len(), 3);

    let outcome = delete_comment(&third, "b").unwrap();
    assert_eq!(outcome.changed, 1);
    assert_eq!(outcome.annotation.unwrap().content, "two");
    let remaining: Vec<String> = marker_blocks(&split_lines(&outcome.body))
        .into_iter()
        .filter_map(|b| b.annotation.map(|a| a.id))
        .collect();
    assert_eq!(remaining, vec!["a", "c"]);
    assert_eq!(non_marker_lines(&outcome.body), non_marker_lines(&third));
}

#[test]
fn test_delete_unknown_id_is_noop() {
    let body = insert_annotation(DOC, 0, fixed("a", "one")).unwrap().body;
    let outcome = delete_comment(&body, "nope").unwrap();
    assert_eq!(outcome.changed, 0);
    assert_eq!(outcome.body, body);
}

#[test]
fn test_delete_keeps_text_after_close_token() {
    let body = "Alpha\n\n<!--comment\nauthor: a\ndate: d\nid: x\nnote\n--> tail text\nafter";
    let outcome = delete_comment(body, "x").unwrap();
    assert_eq!(outcome.body, "Alpha\n\n tail text\nafter");
}

#[test]
fn test_edit_preserves_identity() {
    let body = "Alpha\n\n<!--comment:line-1\nauthor: A\ndate: D\nid: X\nold text\nover two lines\n-->\n\nBeta\n";
    let outcome = edit_comment(body, "X", "new text").unwrap();
    assert_eq!(
        outcome.body,
        "Alpha\n\n<!--comment:line-1\nauthor: A\ndate: D\nid: X\nnew text\n-->\n\nBeta\n"
    );
    let edited = outcome.annotation.unwrap();
    assert_eq!(
        (edited.id.as_str(), edited.author.as_str(), edited.date.as_str()),
        ("X", "A", "D")
    );
    assert_eq!(edited.content, "new text");
    assert_eq!(edited.target_section_id.as_deref(), Some("line-1"));
}

#[test]
fn test_edit_legacy_marker_stays_legacy() {
    let body = "Alpha\n\n<!--comment\nauthor: A\ndate: D\nid: X\nold\n-->";
    let outcome = edit_comment(body, "X", "new").unwrap();
    assert!(outcome.body.contains("\n<!--comment\nauthor: A"));
}

#[test]
fn test_edit_unknown_id_and_empty_text() {
    assert_eq!(edit_comment(DOC, "nope", "text").unwrap().changed, 0);
    assert!(matches!(edit_comment(DOC, "nope", " "), Err(Error::EmptyComment)));
}

#[test]
fn test_edit_leaves_malformed_neighbours_alone() {
    let body = "Alpha\n\n<!--comment\nbroken\n-->\n\n<!--comment\nauthor: a\ndate: d\nid: ok\nfine\n-->";
    let outcome = edit_comment(body, "ok", "better").unwrap();
    assert!(outcome.body.starts_with("Alpha\n\n<!--comment\nbroken\n-->\n\n"));
    assert!(outcome.body.ends_with("id: ok\nbetter\n-->"));
}

#[test]
fn test_apply_dispatch_and_serde() {
    let json = r#"{"op":"add","section":0,"content":"via plan"}"#;
    let mutation: Mutation = serde_json::from_str(json).unwrap();
    assert_eq!(
        mutation,
        Mutation::Add {
            section: 0,
            content: "via plan".to_string(),
            author: "You".to_string(),
        }
    );

    let added = apply(DOC, &mutation).unwrap();
    let id = added.annotation.unwrap().id;
    let deleted = apply(&added.body, &Mutation::Delete { id }).unwrap();
    assert_eq!(deleted.changed, 1);
    assert_eq!(scan(&deleted.body).comment_count(), 0);
}
