/// End-to-end editing scenarios driven through the dispatcher, the way a
/// widget drives it from pointer and button events.
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use collection::*;

fn editor(items: &str) -> Editor<char> {
    Editor::with_items(items.chars().collect(), (), &EditorConfig::default())
}

fn as_string(editor: &Editor<char>) -> String {
    editor.items().iter().collect()
}

#[test]
fn test_undo_redo_inverse() {
    let mut ed = editor("ABC");

    assert_eq!(ed.delete(0), Outcome::Applied);
    assert_eq!(ed.append(vec!['D']), Outcome::Applied);
    ed.click(0, ClickModifier::None);
    assert_eq!(ed.drop_onto(0, DropTarget::after(2)), Outcome::Applied);
    assert_eq!(as_string(&ed), "CDB");

    for expected in ["BCD", "BC", "ABC"] {
        assert_eq!(ed.undo(), Outcome::Applied);
        assert_eq!(as_string(&ed), expected);
    }
    assert!(!ed.can_undo());
    assert_eq!(ed.undo(), Outcome::Unchanged);

    for expected in ["BC", "BCD", "CDB"] {
        assert_eq!(ed.redo(), Outcome::Applied);
        assert_eq!(as_string(&ed), expected);
    }
    assert!(!ed.can_redo());
}

#[test]
fn test_delete_removes_whole_selection() {
    let mut ed = editor("ABCDE");
    ed.click(1, ClickModifier::None);
    ed.click(3, ClickModifier::Toggle);

    assert_eq!(ed.delete(3), Outcome::Applied);
    assert_eq!(as_string(&ed), "ACE");
    assert!(ed.selection().is_empty());
    assert_eq!(ed.selection().anchor(), None);
}

#[test]
fn test_delete_outside_selection_renumbers_selection() {
    let mut ed = editor("ABCDE");
    ed.click(3, ClickModifier::None);

    assert_eq!(ed.delete(0), Outcome::Applied);
    assert_eq!(as_string(&ed), "BCDE");
    assert_eq!(ed.selection().positions(), vec![2]);
    assert_eq!(ed.selection().anchor(), Some(2));
    assert_eq!(ed.selected_items(), vec![&'D']);
}

#[test]
fn test_group_drop_after_last() {
    let mut ed = editor("ABCD");
    ed.click(0, ClickModifier::None);
    ed.click(2, ClickModifier::Toggle);

    assert_eq!(ed.drop_onto(2, DropTarget::after(3)), Outcome::Applied);
    assert_eq!(as_string(&ed), "BDAC");
    assert_eq!(ed.selection().positions(), vec![2, 3]);
}

#[test]
fn test_dragging_unselected_item_moves_only_that_item() {
    let mut ed = editor("ABCD");
    ed.click(0, ClickModifier::None);

    assert_eq!(ed.drop_onto(3, DropTarget::before(0)), Outcome::Applied);
    assert_eq!(as_string(&ed), "DABC");
    assert_eq!(ed.selection().positions(), vec![0]);
}

#[test]
fn test_self_drop_is_noop() {
    let mut ed = editor("ABC");
    ed.click(1, ClickModifier::None);

    assert_eq!(ed.drop_onto(1, DropTarget::before(1)), Outcome::Unchanged);
    assert_eq!(ed.drop_onto(1, DropTarget::after(1)), Outcome::Unchanged);
    assert_eq!(as_string(&ed), "ABC");
    assert_eq!(ed.selection().positions(), vec![1]);
    assert_eq!(ed.history().undo_len(), 0);
}

#[test]
fn test_stale_positions_are_ignored() {
    let mut ed = editor("ABC");
    assert_eq!(ed.delete(10), Outcome::Unchanged);
    assert_eq!(ed.drop_onto(0, DropTarget::before(9)), Outcome::Unchanged);
    assert_eq!(ed.drop_onto(7, DropTarget::before(0)), Outcome::Unchanged);
    assert_eq!(ed.click(5, ClickModifier::None), Outcome::Unchanged);
    assert_eq!(as_string(&ed), "ABC");
    assert!(!ed.can_undo());
}

#[test]
fn test_history_cap_keeps_most_recent() {
    let mut ed: Editor<u32> = Editor::with_items(vec![100], (), &EditorConfig { history_cap: 50 });
    for i in 0..60 {
        ed.append(vec![i]);
    }
    assert_eq!(ed.history().undo_len(), 50);

    while ed.can_undo() {
        ed.undo();
    }
    // oldest surviving restore point is the state before the eleventh edit
    assert_eq!(ed.len(), 11);
}

#[test]
fn test_new_edit_invalidates_redo() {
    let mut ed = editor("AB");
    ed.delete(0);
    ed.undo();
    assert!(ed.can_redo());

    ed.append(vec!['C']);
    assert!(!ed.can_redo());
    assert_eq!(ed.history().redo_len(), 0);
}

#[test]
fn test_first_edit_of_empty_editor_is_not_undoable() {
    let mut ed = editor("");
    ed.append(vec!['A']);
    assert!(!ed.can_undo());

    ed.append(vec!['B']);
    assert!(ed.can_undo());
}

#[test]
fn test_restore_clears_selection() {
    let mut ed = editor("ABC");
    ed.select_all();
    ed.delete(1);
    assert!(ed.is_empty());

    ed.undo();
    assert_eq!(as_string(&ed), "ABC");
    assert!(ed.selection().is_empty());
    assert_eq!(ed.selection().anchor(), None);
}

#[test]
fn test_deferred_collapse_on_group_member() {
    let mut ed = editor("ABCD");
    ed.click(0, ClickModifier::None);
    ed.click(2, ClickModifier::Range);
    assert_eq!(ed.selection().positions(), vec![0, 1, 2]);

    assert_eq!(ed.click(1, ClickModifier::None), Outcome::Unchanged);
    assert_eq!(ed.selection().positions(), vec![0, 1, 2]);
    assert_eq!(ed.pointer_up(1), Outcome::Applied);
    assert_eq!(ed.selection().positions(), vec![1]);
}

#[test]
fn test_group_drag_from_any_member() {
    let mut ed = editor("ABCD");
    ed.click(0, ClickModifier::None);
    ed.click(2, ClickModifier::Range);
    ed.click(1, ClickModifier::None);

    assert_eq!(ed.drop_onto(1, DropTarget::after(3)), Outcome::Applied);
    assert_eq!(as_string(&ed), "DABC");
    assert_eq!(ed.pointer_up(1), Outcome::Unchanged);
    assert_eq!(ed.selection().positions(), vec![1, 2, 3]);
}

#[test]
fn test_insert_shifts_selection() {
    let mut ed = editor("ABC");
    ed.click(1, ClickModifier::None);

    assert_eq!(ed.insert(0, vec!['X', 'Y']), Outcome::Applied);
    assert_eq!(as_string(&ed), "XYABC");
    assert_eq!(ed.selected_items(), vec![&'B']);
    assert_eq!(ed.insert(9, vec!['Z']), Outcome::Unchanged);
}

#[test]
fn test_replace_all_is_undoable() {
    let mut ed = editor("ABC");
    ed.select_all();

    assert_eq!(ed.replace_all(Vec::new()), Outcome::Applied);
    assert!(ed.is_empty());
    assert!(ed.selection().is_empty());

    ed.undo();
    assert_eq!(as_string(&ed), "ABC");
}

#[test]
fn test_busy_guard_and_rejection_listener() {
    let mut ed = editor("AB");
    let reasons = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&reasons);
    ed.on_rejected(move |reason| sink.borrow_mut().push(reason));

    ed.click(0, ClickModifier::None);
    ed.begin_append();
    assert!(ed.is_busy());
    assert_eq!(ed.delete(0), Outcome::Rejected(RejectReason::Busy));
    assert_eq!(ed.drop_onto(0, DropTarget::after(1)), Outcome::Rejected(RejectReason::Busy));
    assert_eq!(ed.redo(), Outcome::Rejected(RejectReason::Busy));
    assert_eq!(ed.replace_all(vec![]), Outcome::Rejected(RejectReason::Busy));
    assert_eq!(ed.load_storage(r#"["Z"]"#), Outcome::Rejected(RejectReason::Busy));

    // selection still works while busy
    assert_eq!(ed.click(1, ClickModifier::None), Outcome::Applied);

    ed.complete_append('C');
    ed.complete_append('D');
    ed.finish_append();
    assert!(!ed.is_busy());
    assert_eq!(as_string(&ed), "ABCD");
    assert_eq!(reasons.borrow().len(), 5);
    assert!(reasons.borrow().iter().all(|r| *r == RejectReason::Busy));

    ed.undo();
    assert_eq!(as_string(&ed), "AB");
}

#[test]
fn test_single_notification_per_action() {
    let mut ed = editor("ABCD");
    let count = Rc::new(Cell::new(0));
    let seen = Rc::clone(&count);
    ed.subscribe(move || seen.set(seen.get() + 1));

    ed.click(0, ClickModifier::None);
    ed.click(2, ClickModifier::Toggle);
    ed.delete(0);
    ed.drop_onto(0, DropTarget::before(0));
    assert_eq!(count.get(), 3);
}

#[test]
fn test_image_batch_params_versioned_with_items() {
    let config = EditorConfig::default();
    let mut ed: Editor<MediaRef, ImageBatchParams> = Editor::with_items(
        vec![MediaRef::new("a.png", "")],
        ImageBatchParams::default(),
        &config,
    );

    ed.begin_param_edit();
    let params = ImageBatchParams {
        width: 512,
        fill: FillMode::Stretch,
        ..ImageBatchParams::default()
    };
    assert_eq!(ed.commit_params(params), Outcome::Applied);
    ed.append(vec![MediaRef::new("b.png", "batch")]);

    ed.undo();
    assert_eq!(ed.len(), 1);
    assert_eq!(ed.params().width, 512);

    ed.undo();
    assert_eq!(ed.params().width, 1080);
    assert_eq!(ed.params().fill, FillMode::Fill);
}

#[test]
fn test_edit_after_focus_discards_pending_param_point() {
    let mut ed: Editor<MediaRef, ImageBatchParams> = Editor::with_items(
        vec![MediaRef::new("a.png", ""), MediaRef::new("b.png", "")],
        ImageBatchParams::default(),
        &EditorConfig::default(),
    );

    ed.begin_param_edit();
    ed.delete(0);
    ed.commit_params(ImageBatchParams {
        height: 720,
        ..ImageBatchParams::default()
    });

    // undoing the parameter change keeps the deletion
    ed.undo();
    assert_eq!(ed.len(), 1);
    assert_eq!(ed.params().height, 1080);
}

#[test]
fn test_retype_selected_json_rows() {
    let rows = vec![
        ListEntry::from_text("1", ValueType::String),
        ListEntry::from_text("true", ValueType::String),
        ListEntry::from_text("x", ValueType::String),
    ];
    let mut ed: Editor<ListEntry> = Editor::with_items(rows, (), &EditorConfig::default());
    ed.click(0, ClickModifier::None);
    ed.click(1, ClickModifier::Range);

    assert_eq!(ed.update_selected(|row| row.retype(ValueType::Number)), Outcome::Applied);
    let values = entries_to_list(ed.items());
    assert_eq!(values, vec![serde_json::json!(1), serde_json::json!(0), serde_json::json!("x")]);

    let copied = copy_list_rows(ed.selected_items());
    assert_eq!(copied, "[\n1,\n0\n]");

    ed.undo();
    assert_eq!(ed.items()[0].value, serde_json::json!("1"));
}

#[test]
fn test_storage_round_trip_for_object_rows() {
    let rows = vec![
        ObjectEntry::from_text("name", "demo", ValueType::String),
        ObjectEntry::from_text("count", "3", ValueType::Number),
        ObjectEntry::from_text("name", "final", ValueType::String),
    ];
    let ed: Editor<ObjectEntry> = Editor::with_items(rows, (), &EditorConfig::default());
    let stored = ed.to_storage().unwrap();

    let mut restored: Editor<ObjectEntry> = Editor::new(&EditorConfig::default());
    assert_eq!(restored.load_storage(&stored), Outcome::Applied);
    assert_eq!(restored.items(), ed.items());
    assert!(!restored.can_undo());

    let object = entries_to_object(restored.items());
    assert_eq!(object.len(), 2);
    assert_eq!(object["name"], serde_json::json!("final"));
    assert_eq!(object["count"], serde_json::json!(3));

    let raw: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(materialize_object(&raw), Some(object));
}

#[test]
fn test_scripted_actions_from_json() {
    let script = r#"[
        {"action": "click", "position": 0},
        {"action": "click", "position": 2, "modifier": "toggle"},
        {"action": "drop", "dragged": 0, "target": 3, "drop_after": true},
        {"action": "undo"},
        {"action": "redo"}
    ]"#;
    let actions: Vec<Action<char>> = serde_json::from_str(script).unwrap();

    let mut ed = editor("ABCD");
    let outcomes: Vec<Outcome> = actions.into_iter().map(|a| ed.dispatch(a)).collect();
    assert!(outcomes.iter().all(|o| *o == Outcome::Applied));
    assert_eq!(as_string(&ed), "BDAC");
}

// NaN serializes to null, which f64 refuses to read back, so the restore
// point recorded before the delete cannot be restored.
fn editor_with_unrestorable_history() -> Editor<f64> {
    let mut ed: Editor<f64> = Editor::with_items(vec![f64::NAN, 1.0], (), &EditorConfig::default());
    assert_eq!(ed.delete(0), Outcome::Applied);
    ed
}

#[test]
fn test_failed_undo_aborts_and_keeps_history() {
    let mut ed = editor_with_unrestorable_history();
    let changes = Rc::new(Cell::new(0));
    let seen = Rc::clone(&changes);
    ed.subscribe(move || seen.set(seen.get() + 1));
    let reasons = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&reasons);
    ed.on_rejected(move |reason| sink.borrow_mut().push(reason));

    assert_eq!(ed.undo(), Outcome::Rejected(RejectReason::RestoreFailed));
    assert_eq!(ed.items(), &[1.0]);
    assert!(ed.can_undo());
    assert!(!ed.can_redo());
    assert_eq!(ed.history().undo_len(), 1);
    assert_eq!(changes.get(), 0);
    assert_eq!(*reasons.borrow(), vec![RejectReason::RestoreFailed]);

    // retrying fails the same way instead of consuming the entry
    assert_eq!(ed.undo(), Outcome::Rejected(RejectReason::RestoreFailed));
    assert!(ed.can_undo());
    assert_eq!(reasons.borrow().len(), 2);
}

#[test]
fn test_failed_undo_leaves_selection_and_later_edits_working() {
    let mut ed = editor_with_unrestorable_history();
    ed.append(vec![2.0]);
    ed.click(1, ClickModifier::None);

    // newest restore point is fine, the one below it is not
    assert_eq!(ed.undo(), Outcome::Applied);
    assert_eq!(ed.items(), &[1.0]);
    assert!(ed.can_redo());

    ed.click(0, ClickModifier::None);
    assert_eq!(ed.undo(), Outcome::Rejected(RejectReason::RestoreFailed));
    assert_eq!(ed.selection().positions(), vec![0]);
    assert!(ed.can_redo());

    assert_eq!(ed.redo(), Outcome::Applied);
    assert_eq!(ed.len(), 2);
    assert_eq!(ed.items()[1], 2.0);
}

#[test]
fn test_update_selected_is_one_notified_step() {
    let mut ed = editor("abc");
    let count = Rc::new(Cell::new(0));
    let seen = Rc::clone(&count);
    ed.subscribe(move || seen.set(seen.get() + 1));

    assert_eq!(ed.update_selected(|c| *c = c.to_ascii_uppercase()), Outcome::Unchanged);
    assert_eq!(count.get(), 0);

    ed.select_all();
    assert_eq!(ed.update_selected(|c| *c = c.to_ascii_uppercase()), Outcome::Applied);
    assert_eq!(as_string(&ed), "ABC");
    assert_eq!(count.get(), 2);

    ed.undo();
    assert_eq!(as_string(&ed), "abc");
}
