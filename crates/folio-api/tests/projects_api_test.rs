//! API tests for projects: lifecycle, annotation merges, CSV export and the
//! cross-project passage lookup.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;
use uuid::Uuid;

use folio_core::Passage;

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_create_and_list_projects() {
    let app = TestApp::new();
    let first = app.create_project().await;
    let second = app.create_project().await;

    let (status, body) = app.get("/api/projects").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["projects"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![first.to_string(), second.to_string()]);
    assert_eq!(body["projects"][0]["title"], "");
}

#[tokio::test]
async fn test_get_project_includes_page_docs_in_order() {
    let app = TestApp::new();
    let a = app.seed_page("A", "1", None).await;
    let b = app.seed_page("A", "2", None).await;
    let project_id = app.create_project().await;

    let (status, _) = app
        .post(
            "/api/project/update",
            json!({"_id": project_id, "pages": [b.id, Uuid::new_v4(), a.id]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.post("/api/project", json!({"_id": project_id})).await;
    assert_eq!(status, StatusCode::OK);
    let docs = body["project"]["page_docs"].as_array().unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["_id"], b.id.to_string());
    assert_eq!(docs[1]["_id"], a.id.to_string());
    assert_eq!(body["project"]["pages"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_get_project_errors() {
    let app = TestApp::new();

    let (status, body) = app.post("/api/project", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = app
        .post("/api/project", json!({"_id": Uuid::new_v4()}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_touches_only_present_fields() {
    let app = TestApp::new();
    let page = app.seed_page("A", "1", None).await;
    let project_id = app.create_project().await;

    app.post(
        "/api/project/update",
        json!({"_id": project_id, "title": "Voyages", "description": "Logs", "pages": [page.id]}),
    )
    .await;
    let (status, body) = app
        .post(
            "/api/project/update",
            json!({"_id": project_id, "title": "Renamed"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["good"], "good");

    let stored = app.projects.find(project_id).unwrap();
    assert_eq!(stored.title, "Renamed");
    assert_eq!(stored.description, "Logs");
    assert_eq!(stored.pages, vec![page.id]);
}

#[tokio::test]
async fn test_update_rejects_bad_input() {
    let app = TestApp::new();
    let project_id = app.create_project().await;

    let (status, _) = app
        .post(
            "/api/project/update",
            json!({"_id": project_id, "pages": ["not-a-uuid"]}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/project/update",
            json!({"_id": Uuid::new_v4(), "title": "x"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_twice_is_not_found() {
    let app = TestApp::new();
    let project_id = app.create_project().await;

    let (status, body) = app
        .post("/api/project/delete", json!({"_id": project_id}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], project_id.to_string());

    let (status, _) = app
        .post("/api/project/delete", json!({"_id": project_id}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Annotation merge
// =============================================================================

async fn merge(app: &TestApp, project_id: Uuid, page_id: Uuid, metadata: serde_json::Value) -> (StatusCode, serde_json::Value) {
    app.post(
        "/api/project/page/metadata/update",
        json!({"project_id": project_id, "page_id": page_id, "metadata": metadata}),
    )
    .await
}

#[tokio::test]
async fn test_merge_preserves_untouched_fields() {
    let app = TestApp::new();
    let page = app.seed_page("A", "1", None).await;
    let project_id = app.create_project().await;

    merge(&app, project_id, page.id, json!({"page_notes": "keep me"})).await;
    let (status, body) = merge(
        &app,
        project_id,
        page.id,
        json!({"passages": [{"id": "p1", "text": "a passage"}], "passage_notes": {"p1": "why"}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let project = app.projects.find(project_id).unwrap();
    let annotation = project.annotation(page.id).unwrap();
    assert_eq!(annotation.page_notes, "keep me");
    assert_eq!(annotation.passages.len(), 1);
    assert_eq!(annotation.note_for("p1"), Some("why"));
}

#[tokio::test]
async fn test_merge_is_idempotent() {
    let app = TestApp::new();
    let page = app.seed_page("A", "1", None).await;
    let project_id = app.create_project().await;
    let patch = json!({"page_notes": "same", "passages": [{"text": "t"}]});

    let (_, first) = merge(&app, project_id, page.id, patch.clone()).await;
    let after_first = app.projects.find(project_id).unwrap().page_metadata;
    let (_, second) = merge(&app, project_id, page.id, patch).await;
    let after_second = app.projects.find(project_id).unwrap().page_metadata;

    assert_eq!(first["success"], true);
    assert_eq!(second["success"], true);
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn test_merge_normalizes_and_drops_malformed_passages() {
    let app = TestApp::new();
    let page = app.seed_page("A", "1", None).await;
    let project_id = app.create_project().await;

    merge(
        &app,
        project_id,
        page.id,
        json!({
            "passages": [
                {"text": "no id", "start": "3", "end": 9.0},
                {"id": 5, "text": "numeric id", "start": "x"},
                {"id": "no-text"},
                "not a mapping",
                {"id": "null-text", "text": null}
            ],
            "page_notes": null,
            "passage_notes": ["not", "a", "map"]
        }),
    )
    .await;

    let project = app.projects.find(project_id).unwrap();
    let annotation = project.annotation(page.id).unwrap();
    assert_eq!(
        annotation.passages,
        vec![
            Passage {
                id: String::new(),
                text: "no id".to_string(),
                start: 3,
                end: 9,
            },
            Passage {
                id: "5".to_string(),
                text: "numeric id".to_string(),
                start: 0,
                end: 0,
            },
        ]
    );
    assert_eq!(annotation.page_notes, "");
    assert!(annotation.passage_notes.is_empty());
}

#[tokio::test]
async fn test_merge_into_missing_project_is_not_found() {
    let app = TestApp::new();
    let (status, _) = merge(&app, Uuid::new_v4(), Uuid::new_v4(), json!({"page_notes": "x"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(
            "/api/project/page/metadata/update",
            json!({"page_id": Uuid::new_v4(), "metadata": {}}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Export
// =============================================================================

#[tokio::test]
async fn test_export_sorts_and_flattens() {
    let app = TestApp::new();
    let p10 = app.seed_page("Log", "10", Some("1845")).await;
    let p2 = app.seed_page("Log", "2", Some("1845")).await;
    let project_id = app.create_project().await;

    app.post(
        "/api/project/update",
        json!({
            "_id": project_id,
            "title": "Whaling: 1845",
            "pages": [p10.id, p2.id, Uuid::new_v4()],
            "page_keywords": {p2.id.to_string(): "whale, oil"}
        }),
    )
    .await;
    merge(
        &app,
        project_id,
        p2.id,
        json!({
            "passages": [
                {"id": "a", "text": "Thar\nshe blows"},
                {"id": "b", "text": "Second"}
            ],
            "passage_notes": {"a": "first sighting", "b": "  "}
        }),
    )
    .await;

    let (status, body) = app
        .post("/api/project/export/csv", json!({"project_id": project_id}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["filename"], "Whaling_ 1845.csv");

    let csv = body["csv_data"].as_str().unwrap();
    let mut lines = csv.split("\r\n");
    assert_eq!(
        lines.next().unwrap(),
        "Volume,Page Number,Date,Topics,Text,Keywords,Page Notes,Passages"
    );
    let second_row = lines.next().unwrap();
    assert!(second_row.starts_with("Log,2,1845,"));
    assert!(second_row.contains("\"whale, oil\""));
    assert!(csv.contains("\"PASSAGE: Thar she blows | NOTE: first sighting\n\nPASSAGE: Second\""));

    let ten = csv.find("Log,10,").unwrap();
    let two = csv.find("Log,2,").unwrap();
    assert!(two < ten);
}

#[tokio::test]
async fn test_export_missing_project() {
    let app = TestApp::new();
    let (status, _) = app
        .post("/api/project/export/csv", json!({"project_id": Uuid::new_v4()}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Cross-project lookup
// =============================================================================

#[tokio::test]
async fn test_lookup_excludes_current_and_empty_projects() {
    let app = TestApp::new();
    let page = app.seed_page("A", "1", None).await;

    let current = app.create_project().await;
    let other = app.create_project().await;
    let empty = app.create_project().await;
    for id in [current, other, empty] {
        app.post("/api/project/update", json!({"_id": id, "pages": [page.id]}))
            .await;
    }
    app.post(
        "/api/project/update",
        json!({"_id": other, "title": "Other project"}),
    )
    .await;
    for id in [current, other] {
        merge(&app, id, page.id, json!({"passages": [{"id": "p", "text": "hit"}]})).await;
    }

    let (status, body) = app
        .post(
            "/api/page/passages/all-projects",
            json!({"page_id": page.id, "current_project_id": current}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let projects = body["projects"].as_array().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["projectId"], other.to_string());
    assert_eq!(projects[0]["projectTitle"], "Other project");
    assert_eq!(projects[0]["passages"][0]["text"], "hit");

    let (_, body) = app
        .post(
            "/api/page/passages/all-projects",
            json!({"page_id": page.id, "current_project_id": ""}),
        )
        .await;
    assert_eq!(body["projects"].as_array().unwrap().len(), 2);
}
