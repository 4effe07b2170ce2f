use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::repositories;
use crate::test_support;

#[tokio::test]
async fn class_listing_carries_active_student_counts() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "teacher@gracebook.local", "Teacher", "pass-123")
            .await;
    let token = test_support::bearer_token(&teacher.id, ctx.state.settings());

    let class = test_support::insert_class(ctx.state.db(), "Lions", "Youth", 2026).await;
    test_support::insert_student(ctx.state.db(), "Active One", 4, &class.id).await;
    let graduated = test_support::insert_student(ctx.state.db(), "Graduated", 6, &class.id).await;
    repositories::students::graduate(
        ctx.state.db(),
        &[graduated.id],
        2025,
        None,
        crate::core::time::primitive_now_utc(),
    )
    .await
    .expect("graduate");

    let response = ctx
        .app
        .oneshot(test_support::json_request(Method::GET, "/api/v1/classes", Some(&token), None))
        .await
        .expect("list classes");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    let listed = body.as_array().expect("classes array");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["student_count"], 1);
}

#[tokio::test]
async fn deleting_class_with_students_conflicts() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_admin(ctx.state.db(), "admin@gracebook.local", "Admin", "admin-pass")
            .await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let class = test_support::insert_class(ctx.state.db(), "Lions", "Youth", 2026).await;
    test_support::insert_student(ctx.state.db(), "Occupant", 4, &class.id).await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/classes/{}", class.id),
            Some(&token),
            None,
        ))
        .await
        .expect("delete class");

    assert_eq!(response.status(), StatusCode::CONFLICT);

    let still_there = repositories::classes::find_by_id(ctx.state.db(), &class.id)
        .await
        .expect("find class");
    assert!(still_there.is_some());
}

#[tokio::test]
async fn departments_are_derived_from_classes() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "teacher@gracebook.local", "Teacher", "pass-123")
            .await;
    let token = test_support::bearer_token(&teacher.id, ctx.state.settings());

    test_support::insert_class(ctx.state.db(), "Lions", "Youth", 2026).await;
    test_support::insert_class(ctx.state.db(), "Tigers", "Youth", 2026).await;
    test_support::insert_class(ctx.state.db(), "Lambs", "Children", 2026).await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/departments",
            Some(&token),
            None,
        ))
        .await
        .expect("list departments");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["departments"], json!(["Children", "Youth"]));
}

#[tokio::test]
async fn attendance_sheet_upserts_per_day() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "teacher@gracebook.local", "Teacher", "pass-123")
            .await;
    let token = test_support::bearer_token(&teacher.id, ctx.state.settings());

    let class = test_support::insert_class(ctx.state.db(), "Lambs", "Children", 2026).await;
    let student = test_support::insert_student(ctx.state.db(), "Hana", 3, &class.id).await;

    let uri = format!("/api/v1/classes/{}/attendance", class.id);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({
                "attended_on": "2026-03-01",
                "records": [{ "student_id": student.id, "status": "absent" }]
            })),
        ))
        .await
        .expect("record sheet");
    assert_eq!(response.status(), StatusCode::OK);

    // Corrected re-submission replaces the earlier mark for the same day.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({
                "attended_on": "2026-03-01",
                "records": [{ "student_id": student.id, "status": "late", "note": "bus" }]
            })),
        ))
        .await
        .expect("correct sheet");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("{uri}?date=2026-03-01"),
            Some(&token),
            None,
        ))
        .await
        .expect("read sheet");
    let body = test_support::read_json(response).await;
    let records = body.as_array().expect("records");
    assert_eq!(records.len(), 1, "response: {body}");
    assert_eq!(records[0]["status"], "late");
    assert_eq!(records[0]["note"], "bus");
}
