//! Integration tests for the department registry endpoints

mod common;

use axum::http::StatusCode;
use civic_common::api::Role;
use common::{json_request, request, Multipart, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_duplicate_name_conflicts() {
    let app = TestApp::new().await;
    let admin = app.token("admin-1", Role::Admin);

    let registrar = app.create_department("Registrar").await;
    assert_eq!(registrar["name"], "Registrar");
    assert_eq!(registrar["isActive"], true);

    let (status, body) = app
        .call(json_request(
            "POST",
            "/admin/departments",
            Some(&admin),
            json!({ "name": "  Registrar  " }),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_create_validation() {
    let app = TestApp::new().await;
    let admin = app.token("admin-1", Role::Admin);

    let (status, _) = app
        .call(json_request("POST", "/admin/departments", Some(&admin), json!({ "name": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(json_request(
            "POST",
            "/admin/departments",
            Some(&admin),
            json!({ "name": "IT Services", "email": "nobody" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(json_request(
            "POST",
            "/admin/departments",
            Some(&admin),
            json!({ "name": "IT Services", "isActive": false }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_deactivate_is_idempotent_and_blocks_routing() {
    let app = TestApp::new().await;
    let admin = app.token("admin-1", Role::Admin);
    let staff = app.token("staff-1", Role::Staff);

    let library = app.create_department("Library").await;
    let uri = format!(
        "/admin/departments/{}/deactivate",
        library["id"].as_str().unwrap()
    );

    for _ in 0..2 {
        let (status, body) = app.call(request("POST", &uri, Some(&admin))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isActive"], false);
    }

    let (_, active) = app.call(request("GET", "/departments", None)).await;
    assert_eq!(active["total"], 0);

    let (_, created) = app
        .submit(Multipart::suggestion("library", "Quiet zone on the second floor"), None)
        .await;
    let (status, _) = app
        .call(json_request(
            "PATCH",
            &format!("/admin/suggestions/{}", created["id"].as_str().unwrap()),
            Some(&staff),
            json!({ "assignedDepartment": "Library" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_referenced_department_conflicts() {
    let app = TestApp::new().await;
    let admin = app.token("admin-1", Role::Admin);

    let facilities = app.create_department("Facilities").await;
    let canteen = app.create_department("Canteen Committee").await;

    let (status, _) = app
        .submit(
            Multipart::suggestion("infrastructure", "Broken lights in parking lot")
                .text("assignedDepartment", "Facilities"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let facilities_uri = format!("/admin/departments/{}", facilities["id"].as_str().unwrap());
    let (status, body) = app.call(request("DELETE", &facilities_uri, Some(&admin))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"]["message"].as_str().unwrap().contains("deactivate"));

    let (status, _) = app.call(request("GET", &facilities_uri, Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);

    let canteen_uri = format!("/admin/departments/{}", canteen["id"].as_str().unwrap());
    let response = app.send(request("DELETE", &canteen_uri, Some(&admin))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, _) = app.call(request("GET", &canteen_uri, Some(&admin))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_and_list() {
    let app = TestApp::new().await;
    let admin = app.token("admin-1", Role::Admin);

    let transport = app.create_department("Transport Office").await;
    app.create_department("Academic Section").await;

    let uri = format!("/admin/departments/{}", transport["id"].as_str().unwrap());
    let (status, body) = app
        .call(json_request(
            "PATCH",
            &uri,
            Some(&admin),
            json!({ "head": "Ms. Iyer", "email": "transport@campus.edu" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["head"], "Ms. Iyer");
    assert_eq!(body["name"], "Transport Office");

    let (status, _) = app
        .call(json_request("PATCH", &uri, Some(&admin), json!({ "name": "Renamed" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, all) = app
        .call(request("GET", "/admin/departments?page=1&limit=1", Some(&admin)))
        .await;
    assert_eq!(all["total"], 2);
    assert_eq!(all["totalPages"], 2);
    assert_eq!(all["items"][0]["name"], "Academic Section");

    let (_, search) = app
        .call(request("GET", "/admin/departments?q=iyer", Some(&admin)))
        .await;
    assert_eq!(search["total"], 1);
    assert_eq!(search["items"][0]["name"], "Transport Office");
}

#[tokio::test]
async fn test_registry_requires_admin() {
    let app = TestApp::new().await;
    let staff = app.token("staff-1", Role::Staff);

    let (status, _) = app.call(request("GET", "/admin/departments", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call(json_request(
            "POST",
            "/admin/departments",
            Some(&staff),
            json!({ "name": "Sneaky" }),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let superadmin = app.token("root", Role::SuperAdmin);
    let (status, _) = app
        .call(request("GET", "/admin/departments", Some(&superadmin)))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_public_department_list_is_active_only() {
    let app = TestApp::new().await;
    app.create_department("Sports Council").await;
    let retired = app.create_department("Old Cell").await;
    let admin = app.token("admin-1", Role::Admin);
    app.call(request(
        "POST",
        &format!("/admin/departments/{}/deactivate", retired["id"].as_str().unwrap()),
        Some(&admin),
    ))
    .await;

    let (status, body) = app.call(request("GET", "/departments", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["name"], "Sports Council");
}
