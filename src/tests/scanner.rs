use super::{scan, starts_new_section, ScannedDocument};

const MARKED: &str = "# Title\n\nFirst paragraph\nstill first.\n\n<!--comment:line-3\nauthor: Ada\ndate: 2024-05-01T09:30:00.000Z\nid: c-1\nNice opening.\n-->\n\nSecond paragraph.\n";

#[test]
fn test_blank_lines_close_sections() {
    let doc = scan("One\ntwo\n\nThree\n\n\nFour");
    let contents: Vec<Vec<String>> = doc.sections.iter().map(|s| s.content.clone()).collect();
    assert_eq!(
        contents,
        vec![
            vec!["One".to_string(), "two".to_string()],
            vec!["Three".to_string()],
            vec!["Four".to_string()],
        ]
    );
    assert_eq!(doc.sections[2].start_line, 6);
    assert_eq!(doc.sections[2].section_id, "line-7");
}

#[test]
fn test_trigger_lines_start_new_sections() {
    let doc = scan("# Heading\n## Sub\nbody text\n- item one\n- item two\n**Bold** lead\nNote: a label\n1. first");
    let starts: Vec<usize> = doc.sections.iter().map(|s| s.start_line).collect();
    assert_eq!(starts, vec![0, 1, 3, 4, 5, 6, 7]);
    assert_eq!(doc.sections[1].content, vec!["## Sub", "body text"]);
}

#[test]
fn test_trigger_patterns() {
    assert!(starts_new_section("# h"));
    assert!(starts_new_section("- item"));
    assert!(starts_new_section("* item"));
    assert!(starts_new_section("12) item"));
    assert!(starts_new_section("**Term**: value"));
    assert!(starts_new_section("Effective-date: today"));
    assert!(starts_new_section("Note:"));
    assert!(!starts_new_section("see http://example.com"));
    assert!(!starts_new_section("http://example.com"));
    assert!(!starts_new_section("plain words: not a label"));
    assert!(!starts_new_section("2024 was a year"));
}

#[test]
fn test_section_ids_follow_first_content_line() {
    let doc = scan("\n\n\nLate start\n");
    assert_eq!(doc.sections.len(), 1);
    assert_eq!(doc.sections[0].start_line, 3);
    assert_eq!(doc.sections[0].section_id, "line-4");
}

#[test]
fn test_markers_attach_by_tag_and_are_not_content() {
    let doc = scan(MARKED);
    assert_eq!(doc.sections.len(), 3);
    let first = &doc.sections[1];
    assert_eq!(first.section_id, "line-3");
    assert_eq!(first.content, vec!["First paragraph", "still first."]);
    assert_eq!(first.comments.len(), 1);
    assert_eq!(first.comments[0].content, "Nice opening.");
    assert!(doc.sections[2].comments.is_empty());
    assert!(doc
        .sections
        .iter()
        .all(|s| s.content.iter().all(|l| !l.contains("author:"))));
}

#[test]
fn test_tag_wins_over_position() {
    let body = "- first\n- second\n\n<!--comment:line-1\nauthor: a\ndate: d\nid: x\nabout the first item\n-->";
    let doc = scan(body);
    assert_eq!(doc.sections.len(), 2);
    assert_eq!(doc.sections[0].comments.len(), 1);
    assert!(doc.sections[1].comments.is_empty());
}

#[test]
fn test_legacy_marker_attaches_to_most_recent_section() {
    let body = "Alpha\n\nBeta\n\n<!--comment\nauthor: a\ndate: d\nid: legacy\nnote\n-->\n";
    let doc = scan(body);
    assert!(doc.sections[0].comments.is_empty());
    assert_eq!(doc.sections[1].comments[0].id, "legacy");
}

#[test]
fn test_drifted_tag_falls_back_to_position() {
    let body = "Alpha\n\nBeta\n\n<!--comment:line-99\nauthor: a\ndate: d\nid: drift\nnote\n-->\n";
    let doc = scan(body);
    assert_eq!(doc.sections[1].comments[0].id, "drift");
    assert_eq!(doc.dropped, 0);
}

#[test]
fn test_marker_before_any_section_is_dropped() {
    let body = "<!--comment\nauthor: a\ndate: d\nid: early\nnote\n-->\n\nAlpha\n";
    let doc = scan(body);
    assert_eq!(doc.sections.len(), 1);
    assert_eq!(doc.comment_count(), 0);
    assert_eq!(doc.dropped, 1);
}

#[test]
fn test_marker_inside_open_section_keeps_section_open() {
    let body = "Alpha\n<!--comment\nauthor: a\ndate: d\nid: mid\nnote\n-->\nstill alpha\n";
    let doc = scan(body);
    assert_eq!(doc.sections.len(), 1);
    assert_eq!(doc.sections[0].content, vec!["Alpha", "still alpha"]);
    assert_eq!(doc.sections[0].comments[0].id, "mid");
    assert_eq!(doc.sections[0].end_line, 7);
}

#[test]
fn test_undecodable_marker_is_skipped() {
    let body = "Alpha\n\n<!--comment\nnotafield: x\n-->\n\nBeta";
    let doc = scan(body);
    assert_eq!(doc.sections.len(), 2);
    assert_eq!(doc.comment_count(), 0);
    assert_eq!(doc.skipped.len(), 1);
    assert_eq!((doc.skipped[0].start_line, doc.skipped[0].end_line), (2, 4));
}

#[test]
fn test_unterminated_marker_swallows_rest() {
    let body = "Alpha\n\n<!--comment\nauthor: a\n\nBeta";
    let doc = scan(body);
    assert_eq!(doc.sections.len(), 1);
    assert_eq!(doc.skipped[0].end_line, 5);
}

#[test]
fn test_comments_keep_scan_order() {
    let body = "Alpha\n\n<!--comment:line-1\nauthor: a\ndate: d\nid: one\nfirst\n-->\n<!--comment\nauthor: a\ndate: d\nid: two\nsecond\n-->\n";
    let doc = scan(body);
    let ids: Vec<&str> = doc.sections[0].comments.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["one", "two"]);
}

#[test]
fn test_scan_is_idempotent() {
    assert_eq!(scan(MARKED), scan(MARKED));
}

#[test]
fn test_lookups() {
    let doc = ScannedDocument::scan(MARKED);
    assert_eq!(doc.section_at_line(3).unwrap().section_id, "line-3");
    assert!(doc.section_at_line(1).is_none());
    assert!(doc.section_at_line(6).is_none(), "marker lines belong to no section");
    assert_eq!(doc.section_by_id("line-13").unwrap().index, 2);
    let (section, comment) = doc.find_comment("c-1").unwrap();
    assert_eq!(section.index, 1);
    assert_eq!(comment.author, "Ada");
    assert!(doc.find_comment("missing").is_none());
}

#[test]
fn test_empty_body() {
    let doc = scan("");
    assert!(doc.sections.is_empty());
    assert_eq!(doc.comment_count(), 0);
}
