//! Integration tests for the suggestion endpoints
//!
//! Tests cover:
//! - Anonymous and named submission, including media uploads
//! - Validation failures leaving no record and no blobs behind
//! - Staff routing, status changes and the public tracking view
//! - Resolved list pagination
//! - Bearer authentication and role checks

mod common;

use axum::http::StatusCode;
use civic_common::api::Role;
use civic_common::config::UploadConfig;
use common::{json_request, request, Multipart, TestApp};
use serde_json::json;

// =============================================================================
// Submission
// =============================================================================

#[tokio::test]
async fn test_anonymous_submission_hides_user() {
    let app = TestApp::new().await;
    let token = app.token("student-1", Role::User);

    // Authenticated caller choosing anonymity still leaves no trace
    let (status, body) = app
        .submit(
            Multipart::suggestion("infrastructure", "Broken lights in parking lot"),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "Received");
    assert_eq!(body["anonymous"], true);
    assert!(body.get("user").is_none());
    assert!(body.get("revision").is_none());

    let staff = app.token("staff-1", Role::Staff);
    let id = body["id"].as_str().unwrap();
    let (status, full) = app
        .call(request("GET", &format!("/admin/suggestions/{}", id), Some(&staff)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(full.get("user").is_none());

    let stored: Option<String> = sqlx::query_scalar("SELECT submitter_id FROM suggestions WHERE id = ?")
        .bind(id)
        .fetch_one(&app.db)
        .await
        .unwrap();
    assert_eq!(stored, None);
}

#[tokio::test]
async fn test_anonymous_submitter_absent_from_every_list() {
    let app = TestApp::new().await;
    let token = app.token("student-1", Role::User);
    let staff = app.token("staff-1", Role::Staff);

    let (status, created) = app
        .submit(
            Multipart::suggestion("transport", "Late evening buses are always full"),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, listed) = app.call(request("GET", "/admin/suggestions", Some(&staff))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], 1);
    assert!(listed["items"][0].get("user").is_none());
    assert!(!listed.to_string().contains("student-1"));

    let (status, mine) = app.call(request("GET", "/suggestions/my", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["total"], 0);

    let (status, _) = app
        .call(json_request(
            "PATCH",
            &format!("/admin/suggestions/{}", id),
            Some(&staff),
            json!({ "status": "Resolved" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, resolved) = app.call(request("GET", "/public/resolved", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["items"][0]["id"], id.as_str());
    assert!(resolved["items"][0].get("user").is_none());
    assert!(!resolved.to_string().contains("student-1"));
}

#[tokio::test]
async fn test_public_resolved_list_hides_people() {
    let app = TestApp::new().await;
    let token = app.token("student-42", Role::User);
    let staff = app.token("staff-1", Role::Staff);

    let (status, created) = app
        .submit(
            Multipart::suggestion("library", "Longer library hours during exams")
                .text("anonymous", "false")
                .file("media", "queue.jpg", "image/jpeg", &[0xFF, 0xD8, 0xFF]),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["user"], "student-42");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .call(json_request(
            "PATCH",
            &format!("/admin/suggestions/{}", id),
            Some(&staff),
            json!({
                "status": "Resolved",
                "assignedTo": "Ravi Sharma",
                "actionTaken": "Library now open until midnight in exam weeks"
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, resolved) = app.call(request("GET", "/public/resolved", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["total"], 1);

    let item = &resolved["items"][0];
    let mut keys: Vec<_> = item.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(
        keys,
        vec!["actionTaken", "category", "createdAt", "id", "status", "updatedAt"]
    );
    assert_eq!(item["status"], "Resolved");
    assert_eq!(item["actionTaken"], "Library now open until midnight in exam weeks");

    let text = resolved.to_string();
    assert!(!text.contains("student-42"));
    assert!(!text.contains("Ravi Sharma"));
}

#[tokio::test]
async fn test_named_submission_requires_token() {
    let app = TestApp::new().await;
    let form = || {
        Multipart::suggestion("library", "Longer library hours during exams")
            .text("anonymous", "false")
    };

    let (status, body) = app.submit(form(), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(app.suggestion_count().await, 0);

    let token = app.token("student-7", Role::User);
    let (status, body) = app.submit(form(), Some(&token)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"], "student-7");

    let (status, mine) = app.call(request("GET", "/suggestions/my", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["total"], 1);
    assert_eq!(mine["items"][0]["id"], body["id"]);
}

#[tokio::test]
async fn test_description_boundary() {
    let app = TestApp::new().await;

    let (status, body) = app
        .submit(Multipart::suggestion("infrastructure", "123456789"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");

    let (status, _) = app
        .submit(Multipart::suggestion("infrastructure", "1234567890"), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.suggestion_count().await, 1);
}

#[tokio::test]
async fn test_unknown_category_rejected() {
    let app = TestApp::new().await;
    let (status, _) = app
        .submit(Multipart::suggestion("parking", "Broken lights in parking lot"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.suggestion_count().await, 0);
}

#[tokio::test]
async fn test_submission_with_media() {
    let app = TestApp::new().await;
    let form = Multipart::suggestion("hostel", "Water leak in block C washroom")
        .file("media", "leak.jpg", "image/jpeg", &[0xFF, 0xD8, 0xFF, 0xE0])
        .file("media", "leak.mp4", "video/mp4", &[0, 0, 0, 24, 0x66, 0x74]);

    let (status, body) = app.submit(form, None).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let media = body["media"].as_array().unwrap();
    assert_eq!(media.len(), 2);
    assert_eq!(media[0]["kind"], "image");
    assert_eq!(media[0]["originalName"], "leak.jpg");
    assert_eq!(media[0]["size"], 4);
    assert_eq!(media[1]["kind"], "video");
    assert!(media[0]["url"].as_str().unwrap().starts_with("/uploads/"));
    assert_eq!(app.blobs.len(), 2);
}

#[tokio::test]
async fn test_rejected_media_uploads_nothing() {
    let app = TestApp::new().await;
    let form = Multipart::suggestion("hostel", "Water leak in block C washroom")
        .file("media", "leak.jpg", "image/jpeg", &[0xFF, 0xD8])
        .file("media", "notes.pdf", "application/pdf", b"%PDF-1.4");

    let (status, _) = app.submit(form, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.blobs.is_empty());
    assert_eq!(app.suggestion_count().await, 0);
}

#[tokio::test]
async fn test_too_many_files_rejected() {
    let app = TestApp::with_limits(UploadConfig {
        max_files: 2,
        max_total_bytes: 1024,
    })
    .await;

    let mut form = Multipart::suggestion("events", "More seating at the annual fest");
    for i in 0..3 {
        form = form.file("media", &format!("{}.png", i), "image/png", &[1, 2, 3]);
    }

    let (status, _) = app.submit(form, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.blobs.is_empty());
}

#[tokio::test]
async fn test_upload_failure_is_storage_error() {
    let app = TestApp::new().await;
    app.blobs.fail_puts_after(1);

    let form = Multipart::suggestion("hostel", "Water leak in block C washroom")
        .file("media", "a.jpg", "image/jpeg", &[1])
        .file("media", "b.jpg", "image/jpeg", &[2]);

    let (status, body) = app.submit(form, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "STORAGE_ERROR");
    assert!(app.blobs.is_empty());
    assert_eq!(app.suggestion_count().await, 0);
}

#[tokio::test]
async fn test_malformed_multipart_is_bad_request() {
    let app = TestApp::new().await;
    let req = json_request("POST", "/suggestions", None, json!({ "category": "other" }));

    let (status, body) = app.call(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");
}

// =============================================================================
// Staff workflow and public views
// =============================================================================

#[tokio::test]
async fn test_facilities_routing_and_tracking() {
    let app = TestApp::new().await;
    app.create_department("Facilities").await;
    let staff = app.token("staff-1", Role::Staff);

    let (_, created) = app
        .submit(
            Multipart::suggestion("infrastructure", "Broken lights in parking lot"),
            None,
        )
        .await;
    let id = created["id"].as_str().unwrap().to_string();
    let uri = format!("/admin/suggestions/{}", id);

    let (status, body) = app
        .call(json_request(
            "PATCH",
            &uri,
            Some(&staff),
            json!({ "assignedDepartment": "Facilities", "status": "In Process" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["assignedDepartment"], "Facilities");
    assert_eq!(body["status"], "In Process");

    let (status, _) = app
        .call(json_request(
            "PATCH",
            &uri,
            Some(&staff),
            json!({ "status": "Resolved", "actionTaken": "Replaced bulbs" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, tracked) = app
        .call(request("GET", &format!("/suggestions/track/{}", id), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tracked["status"], "Resolved");
    assert_eq!(tracked["actionTaken"], "Replaced bulbs");
    assert_eq!(tracked["category"], "infrastructure");
    assert!(tracked.get("description").is_none());
    assert!(tracked.get("assignedDepartment").is_none());

    let (_, resolved) = app.call(request("GET", "/public/resolved", None)).await;
    assert_eq!(resolved["total"], 1);
    assert_eq!(resolved["items"][0]["id"], id.as_str());
}

#[tokio::test]
async fn test_invalid_department_leaves_record_unchanged() {
    let app = TestApp::new().await;
    let staff = app.token("staff-1", Role::Staff);

    let (_, created) = app
        .submit(
            Multipart::suggestion("infrastructure", "Broken lights in parking lot"),
            None,
        )
        .await;
    let uri = format!("/admin/suggestions/{}", created["id"].as_str().unwrap());

    let (status, body) = app
        .call(json_request(
            "PATCH",
            &uri,
            Some(&staff),
            json!({ "assignedDepartment": "Nonexistent Dept", "status": "Resolved" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");

    let (_, after) = app.call(request("GET", &uri, Some(&staff))).await;
    assert_eq!(after["status"], "Received");
    assert_eq!(after["assignedDepartment"], serde_json::Value::Null);
    assert_eq!(after["updatedAt"], created["updatedAt"]);
}

#[tokio::test]
async fn test_update_rejects_immutable_fields() {
    let app = TestApp::new().await;
    let staff = app.token("staff-1", Role::Staff);
    let (_, created) = app
        .submit(Multipart::suggestion("sports", "Resurface the basketball court"), None)
        .await;

    let (status, _) = app
        .call(json_request(
            "PATCH",
            &format!("/admin/suggestions/{}", created["id"].as_str().unwrap()),
            Some(&staff),
            json!({ "description": "Something else entirely" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_suggestion_is_not_found() {
    let app = TestApp::new().await;
    let staff = app.token("staff-1", Role::Staff);

    let (status, _) = app.call(request("GET", "/suggestions/track/missing", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(request("DELETE", "/admin/suggestions/missing", Some(&staff)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_removes_record_and_blobs() {
    let app = TestApp::new().await;
    let staff = app.token("staff-1", Role::Staff);
    let form = Multipart::suggestion("canteen", "Broken tray rack in the canteen")
        .file("media", "rack.png", "image/png", &[1, 2, 3]);
    let (_, created) = app.submit(form, None).await;
    let uri = format!("/admin/suggestions/{}", created["id"].as_str().unwrap());

    let response = app.send(request("DELETE", &uri, Some(&staff))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(app.blobs.is_empty());

    let (status, _) = app.call(request("GET", &uri, Some(&staff))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_resolved_pagination_has_no_duplicates() {
    let app = TestApp::new().await;
    let staff = app.token("staff-1", Role::Staff);

    for i in 0..25 {
        let (_, created) = app
            .submit(
                Multipart::suggestion("academic", &format!("Suggestion number {} about labs", i)),
                None,
            )
            .await;
        app.call(json_request(
            "PATCH",
            &format!("/admin/suggestions/{}", created["id"].as_str().unwrap()),
            Some(&staff),
            json!({ "status": "Resolved" }),
        ))
        .await;
    }

    let (_, first) = app
        .call(request("GET", "/public/resolved?page=1&limit=10", None))
        .await;
    let (_, second) = app
        .call(request("GET", "/public/resolved?page=2&limit=10", None))
        .await;

    assert_eq!(first["total"], 25);
    assert_eq!(first["totalPages"], 3);
    let mut ids: Vec<String> = first["items"]
        .as_array()
        .unwrap()
        .iter()
        .chain(second["items"].as_array().unwrap())
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids.len(), 20);
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);
}

#[tokio::test]
async fn test_admin_list_filters_and_stats() {
    let app = TestApp::new().await;
    let staff = app.token("staff-1", Role::Staff);
    app.submit(Multipart::suggestion("transport", "More buses on the night route"), None)
        .await;
    app.submit(Multipart::suggestion("canteen", "Cheaper tea in the canteen please"), None)
        .await;

    let (status, page) = app
        .call(request("GET", "/admin/suggestions?category=transport", Some(&staff)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);

    let (_, page) = app
        .call(request("GET", "/admin/suggestions?q=TEA&status=Received", Some(&staff)))
        .await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["category"], "canteen");

    let (status, _) = app
        .call(request("GET", "/admin/suggestions?from=yesterday", Some(&staff)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, stats) = app
        .call(request("GET", "/admin/suggestions/stats", Some(&staff)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["byStatus"]["Received"], 2);
    assert_eq!(stats["unassigned"], 2);
}

// =============================================================================
// Authentication and roles
// =============================================================================

#[tokio::test]
async fn test_staff_routes_require_staff_role() {
    let app = TestApp::new().await;

    let (status, body) = app.call(request("GET", "/admin/suggestions", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let user = app.token("student-1", Role::User);
    let (status, body) = app.call(request("GET", "/admin/suggestions", Some(&user))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    for role in [Role::Staff, Role::Admin, Role::SuperAdmin] {
        let token = app.token("someone", role);
        let (status, _) = app.call(request("GET", "/admin/suggestions", Some(&token))).await;
        assert_eq!(status, StatusCode::OK, "role {}", role);
    }
}

#[tokio::test]
async fn test_bad_token_rejected_even_on_public_routes() {
    let app = TestApp::new().await;

    let (status, _) = app
        .call(request("GET", "/public/resolved", Some("not-a-jwt")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = civic_common::api::issue_token("mallory", Role::Admin, "other-secret", "civic", 60)
        .unwrap();
    let (status, _) = app
        .call(request("GET", "/admin/suggestions", Some(&forged)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.call(request("GET", "/suggestions/my", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.call(request("GET", "/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "civic-sb");
}
