use chrono::NaiveDate;
use daylist_core::remote::{ListRecord, NewTaskBody, TaskPatch, TaskRecord};
use daylist_core::task::Task;
use serde_json::json;

#[test]
fn task_creation_payload_matches_the_service_schema() {
    let body = NewTaskBody {
        text: "Buy milk",
        list_id: 3,
        important: true,
        my_day: false,
    };

    let value = serde_json::to_value(&body).expect("serialize");
    assert_eq!(
        value,
        json!({
            "text": "Buy milk",
            "list_id": 3,
            "isImportant": true,
            "myDay": false,
        })
    );
}

#[test]
fn patches_only_carry_the_fields_that_changed() {
    let value = serde_json::to_value(TaskPatch::completed(false)).expect("serialize");
    assert_eq!(value, json!({ "completed": false }));

    let value = serde_json::to_value(TaskPatch::important(true)).expect("serialize");
    assert_eq!(value, json!({ "isImportant": true }));

    let date = NaiveDate::from_ymd_opt(2026, 8, 16).expect("valid date");
    let value = serde_json::to_value(TaskPatch::due_date(date)).expect("serialize");
    assert_eq!(value, json!({ "dueDate": "2026-08-16T00:00:00" }));
}

#[test]
fn clearing_an_assignment_sends_an_explicit_null() {
    let value = serde_json::to_value(TaskPatch::assigned_to(None)).expect("serialize");
    assert_eq!(value, json!({ "assignedTo": null }));

    let value =
        serde_json::to_value(TaskPatch::assigned_to(Some("me".to_string()))).expect("serialize");
    assert_eq!(value, json!({ "assignedTo": "me" }));
}

#[test]
fn task_records_parse_and_convert() {
    let record: TaskRecord = serde_json::from_value(json!({
        "id": 7,
        "text": "Call the bank",
        "completed": false,
        "isImportant": true,
        "myDay": false,
        "dueDate": "2026-08-10T00:00:00",
        "assignedTo": "me",
        "list_id": 2,
        "created_at": "2026-08-06T09:30:00",
        "updated_at": null,
    }))
    .expect("parse record");

    let task = Task::from(record);
    assert_eq!(task.id, 7);
    assert!(task.important);
    assert_eq!(
        task.due_date,
        Some(NaiveDate::from_ymd_opt(2026, 8, 10).expect("valid date"))
    );
    assert_eq!(task.assigned_to.as_deref(), Some("me"));
    assert_eq!(task.list_id, 2);
}

#[test]
fn list_records_embed_their_tasks_and_tolerate_missing_ones() {
    let record: ListRecord = serde_json::from_value(json!({
        "id": 1,
        "name": "My Tasks",
        "tasks": [
            { "id": 4, "text": "a", "list_id": 1 },
            { "id": 5, "text": "b", "completed": true, "list_id": 1 },
        ],
    }))
    .expect("parse list");
    assert_eq!(record.tasks.len(), 2);
    assert!(record.tasks[1].completed);

    let bare: ListRecord = serde_json::from_value(json!({ "id": 2, "name": "Errands" }))
        .expect("parse bare list");
    assert!(bare.tasks.is_empty());
}
