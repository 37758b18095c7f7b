use super::*;
use crate::models::document::{CommandError, Document};
use std::time::Duration;

fn doc_of(text: &str) -> Document {
    Document::from_text(text)
}

fn set_search(controller: &mut FindController, doc: &mut Document, pattern: &str) {
    controller.change_state(
        doc,
        FindStateUpdate {
            search_string: Some(pattern.to_string()),
            ..Default::default()
        },
        false,
    );
}

fn update() -> FindStateUpdate {
    FindStateUpdate::default()
}

#[test]
fn research_publishes_match_count() {
    let mut doc = doc_of("foo bar foo");
    let mut controller = FindController::default();

    set_search(&mut controller, &mut doc, "foo");
    assert_eq!(controller.state().matches_count(), 2);
    assert_eq!(controller.state().matches_position(), 0);

    set_search(&mut controller, &mut doc, "");
    assert_eq!(controller.state().matches_count(), 0);
    assert_eq!(controller.decorations().count(), 0);
}

#[test]
fn research_with_move_cursor_selects_from_anchor() {
    let mut doc = doc_of("foo bar foo");
    let mut controller = FindController::default();

    doc.set_selection(Selection::collapsed(4));
    controller.on_cursor_moved(&doc, CursorChangeReason::Explicit);
    controller.change_state(
        &mut doc,
        FindStateUpdate {
            search_string: Some("foo".to_string()),
            ..update()
        },
        true,
    );

    assert_eq!(doc.primary_selection().range(), CharRange::new(8, 11));
    assert_eq!(controller.state().matches_position(), 2);
}

#[test]
fn counter_updates_do_not_retrigger_research() {
    let mut doc = doc_of("foo bar foo");
    let mut controller = FindController::default();
    set_search(&mut controller, &mut doc, "foo");

    // 计数回写走 change_match_info，不产生状态变更事件
    let version_before = doc.version();
    controller.move_to_next_match(&mut doc);
    assert_eq!(doc.version(), version_before);
    assert!(!controller.has_pending_research());
}

#[test]
fn navigation_cycles_through_matches() {
    let mut doc = doc_of("foo bar foo");
    let mut controller = FindController::default();
    set_search(&mut controller, &mut doc, "foo");

    controller.move_to_next_match(&mut doc);
    assert_eq!(doc.primary_selection().range(), CharRange::new(0, 3));
    assert_eq!(controller.state().matches_position(), 1);

    controller.move_to_next_match(&mut doc);
    assert_eq!(doc.primary_selection().range(), CharRange::new(8, 11));
    assert_eq!(controller.state().matches_position(), 2);

    controller.move_to_next_match(&mut doc);
    assert_eq!(doc.primary_selection().range(), CharRange::new(0, 3));
}

#[test]
fn prev_navigation_mirrors_next() {
    let mut doc = doc_of("foo bar foo");
    let mut controller = FindController::default();
    set_search(&mut controller, &mut doc, "foo");

    controller.move_to_prev_match(&mut doc);
    assert_eq!(doc.primary_selection().range(), CharRange::new(8, 11));

    controller.move_to_prev_match(&mut doc);
    assert_eq!(doc.primary_selection().range(), CharRange::new(0, 3));

    controller.move_to_prev_match(&mut doc);
    assert_eq!(doc.primary_selection().range(), CharRange::new(8, 11));
}

#[test]
fn zero_width_navigation_never_stalls() {
    let mut doc = doc_of("a\nb\nc");
    let mut controller = FindController::default();
    controller.change_state(
        &mut doc,
        FindStateUpdate {
            search_string: Some("^".to_string()),
            is_regex: Some(true),
            ..update()
        },
        false,
    );
    assert_eq!(controller.state().matches_count(), 3);

    let mut visited = Vec::new();
    for _ in 0..3 {
        controller.move_to_next_match(&mut doc);
        visited.push(doc.primary_selection().range().start);
    }
    visited.sort_unstable();
    assert_eq!(visited, vec![0, 2, 4]);
}

#[test]
fn zero_width_non_anchored_advances_by_column() {
    let mut doc = doc_of("bb");
    let mut controller = FindController::default();
    controller.change_state(
        &mut doc,
        FindStateUpdate {
            search_string: Some("a*".to_string()),
            is_regex: Some(true),
            ..update()
        },
        false,
    );

    doc.set_selection(Selection::collapsed(0));
    controller.move_to_next_match(&mut doc);
    assert_eq!(doc.primary_selection().range(), CharRange::collapsed(1));

    controller.move_to_next_match(&mut doc);
    assert_eq!(doc.primary_selection().range(), CharRange::collapsed(2));
}

#[test]
fn scope_restricts_count_and_navigation() {
    // 0-based 行 0/2/8 含有目标词，作用域为行 1..=3
    let text = "foo\n.\nfoo\n.\n.\n.\n.\n.\nfoo\n.";
    let mut doc = doc_of(text);
    let scope_start = doc.line_to_char(1);
    let scope_end = doc.line_to_char(4);
    let mut controller = FindController::default();

    controller.change_state(
        &mut doc,
        FindStateUpdate {
            search_string: Some("foo".to_string()),
            search_scope: Some(Some(CharRange::new(scope_start, scope_end))),
            ..update()
        },
        false,
    );
    assert_eq!(controller.state().matches_count(), 1);

    let in_scope = CharRange::new(doc.line_to_char(2), doc.line_to_char(2) + 3);
    for _ in 0..3 {
        controller.move_to_next_match(&mut doc);
        assert_eq!(doc.primary_selection().range(), in_scope);
    }

    // 从作用域外出发也会被拉回作用域内
    doc.set_selection(Selection::collapsed(doc.line_to_char(8)));
    controller.move_to_next_match(&mut doc);
    assert_eq!(doc.primary_selection().range(), in_scope);
}

#[test]
fn debounce_coalesces_content_changes() {
    let mut doc = doc_of("foo bar foo");
    let mut controller = FindController::default();
    set_search(&mut controller, &mut doc, "foo");
    assert_eq!(controller.state().matches_count(), 2);

    let t0 = Instant::now();
    let change = doc
        .execute_edits(
            EditSource::User,
            &[(CharRange::collapsed(4), "foo ".to_string())],
        )
        .unwrap();
    controller.on_content_changed(&doc, &change, t0);
    assert!(controller.has_pending_research());
    // 静默期未到
    assert!(!controller.tick(&mut doc, t0 + Duration::from_millis(50)));

    // 第二次编辑重置计时器
    let change = doc
        .execute_edits(
            EditSource::User,
            &[(CharRange::collapsed(4), "foo ".to_string())],
        )
        .unwrap();
    controller.on_content_changed(&doc, &change, t0 + Duration::from_millis(80));
    assert!(!controller.tick(&mut doc, t0 + Duration::from_millis(150)));

    assert!(controller.tick(&mut doc, t0 + Duration::from_millis(200)));
    assert_eq!(controller.state().matches_count(), 4);
    assert!(!controller.has_pending_research());
}

#[test]
fn state_change_supersedes_pending_research() {
    let mut doc = doc_of("foo bar foo");
    let mut controller = FindController::default();
    set_search(&mut controller, &mut doc, "foo");

    let t0 = Instant::now();
    let change = doc
        .execute_edits(
            EditSource::User,
            &[(CharRange::collapsed(4), "foo ".to_string())],
        )
        .unwrap();
    controller.on_content_changed(&doc, &change, t0);
    assert!(controller.has_pending_research());

    // 立即 research 接管，挂起的防抖被取消
    set_search(&mut controller, &mut doc, "bar");
    assert!(!controller.has_pending_research());
    assert_eq!(controller.state().matches_count(), 1);
    assert!(!controller.tick(&mut doc, t0 + Duration::from_millis(500)));
}

#[test]
fn own_edits_do_not_reenter_research() {
    let mut doc = doc_of("foo bar foo");
    let mut controller = FindController::default();
    set_search(&mut controller, &mut doc, "foo");
    controller.change_state(
        &mut doc,
        FindStateUpdate {
            replace_string: Some("baz".to_string()),
            ..update()
        },
        false,
    );

    controller.replace_all(&mut doc).unwrap();
    assert_eq!(doc.text(), "baz bar baz");
    // 自身编辑的变更通知被守卫吞掉，不会遗留挂起的 research
    assert!(!controller.has_pending_research());
    assert!(!controller.ignore_content_changes);
    assert_eq!(controller.state().matches_count(), 0);
}

#[test]
fn guard_released_when_command_fails() {
    let mut doc = doc_of("foo bar foo");
    let mut controller = FindController::default();
    set_search(&mut controller, &mut doc, "foo");

    doc.set_read_only(true);
    let err = controller.replace_all(&mut doc).unwrap_err();
    assert!(matches!(err, CommandError::ReadOnly));
    assert!(!controller.ignore_content_changes);

    // 守卫已释放：后续外部变更照常调度 research
    doc.set_read_only(false);
    let t0 = Instant::now();
    let change = doc
        .execute_edits(EditSource::User, &[(CharRange::collapsed(0), "x".to_string())])
        .unwrap();
    controller.on_content_changed(&doc, &change, t0);
    assert!(controller.has_pending_research());
}

#[test]
fn replace_with_zero_width_match_inserts() {
    let mut doc = doc_of("a\nb");
    let mut controller = FindController::default();
    controller.change_state(
        &mut doc,
        FindStateUpdate {
            search_string: Some("^".to_string()),
            is_regex: Some(true),
            replace_string: Some("- ".to_string()),
            ..update()
        },
        false,
    );

    doc.set_selection(Selection::collapsed(0));
    controller.replace(&mut doc).unwrap();
    assert_eq!(doc.text(), "- a\nb");
    assert_eq!(doc.primary_selection().range(), CharRange::collapsed(2));
}

#[test]
fn replace_keeps_anchor_after_edit() {
    let mut doc = doc_of("foo bar foo");
    let mut controller = FindController::default();
    controller.change_state(
        &mut doc,
        FindStateUpdate {
            search_string: Some("foo".to_string()),
            replace_string: Some("x".to_string()),
            ..update()
        },
        false,
    );

    controller.move_to_next_match(&mut doc);
    controller.replace(&mut doc).unwrap();
    assert_eq!(doc.text(), "x bar foo");
    // 下一次导航从替换文本之后继续
    assert_eq!(controller.decorations().start_position(), 1);
    controller.move_to_next_match(&mut doc);
    assert_eq!(doc.primary_selection().range(), CharRange::new(6, 9));
}

#[test]
fn dispose_cancels_everything() {
    let mut doc = doc_of("foo bar foo");
    let mut controller = FindController::default();
    set_search(&mut controller, &mut doc, "foo");

    let t0 = Instant::now();
    let change = doc
        .execute_edits(EditSource::User, &[(CharRange::collapsed(0), "x".to_string())])
        .unwrap();
    controller.on_content_changed(&doc, &change, t0);
    assert!(controller.has_pending_research());

    controller.dispose();
    assert!(controller.is_disposed());
    assert!(!controller.has_pending_research());
    assert_eq!(controller.decorations().count(), 0);
    assert!(!controller.tick(&mut doc, t0 + Duration::from_millis(500)));

    // 销毁后全部变为空操作
    set_search(&mut controller, &mut doc, "bar");
    assert_eq!(controller.state().matches_count(), 0);
}

#[test]
fn flush_resets_decorations_and_anchor() {
    let mut doc = doc_of("foo bar foo");
    let mut controller = FindController::default();
    set_search(&mut controller, &mut doc, "foo");
    assert_eq!(controller.decorations().count(), 2);

    let t0 = Instant::now();
    let change = doc.set_text("fresh text");
    controller.on_content_changed(&doc, &change, t0);
    assert_eq!(controller.decorations().count(), 0);
    assert_eq!(controller.decorations().start_position(), 0);
    assert!(controller.has_pending_research());

    assert!(controller.tick(&mut doc, t0 + Duration::from_millis(200)));
    assert_eq!(controller.state().matches_count(), 0);
}

#[test]
fn seed_search_string_from_selection_and_word() {
    let mut doc = doc_of("alpha beta alpha");
    let mut controller = FindController::default();

    doc.set_selection(Selection::from_range(CharRange::new(6, 10)));
    controller.seed_search_string_from_selection(&mut doc);
    assert_eq!(controller.state().search_string(), "beta");
    assert_eq!(controller.state().matches_count(), 1);

    doc.set_selection(Selection::collapsed(2));
    controller.seed_search_string_from_selection(&mut doc);
    assert_eq!(controller.state().search_string(), "alpha");
    assert_eq!(controller.state().matches_count(), 2);
}

#[test]
fn invalid_regex_surfaces_as_no_matches() {
    let mut doc = doc_of("foo(");
    let mut controller = FindController::default();
    controller.change_state(
        &mut doc,
        FindStateUpdate {
            search_string: Some("foo(".to_string()),
            is_regex: Some(true),
            ..update()
        },
        false,
    );
    assert_eq!(controller.state().matches_count(), 0);
    assert!(controller.state().last_error().is_some());

    // 关掉正则开关后按字面量命中
    controller.change_state(
        &mut doc,
        FindStateUpdate {
            is_regex: Some(false),
            ..update()
        },
        false,
    );
    assert_eq!(controller.state().matches_count(), 1);
    assert!(controller.state().last_error().is_none());
}

#[test]
fn replace_revealed_restricts_to_editable_range() {
    let mut doc = doc_of("foo foo foo");
    doc.set_editable_range(Some(CharRange::new(4, 11)));
    let mut controller = FindController::default();

    controller.change_state(
        &mut doc,
        FindStateUpdate {
            search_string: Some("foo".to_string()),
            is_replace_revealed: Some(true),
            replace_string: Some("baz".to_string()),
            ..update()
        },
        false,
    );
    assert_eq!(controller.state().matches_count(), 2);

    controller.replace_all(&mut doc).unwrap();
    assert_eq!(doc.text(), "foo baz baz");
}
