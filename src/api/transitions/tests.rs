use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::repositories;
use crate::test_support;

async fn create_transition(
    ctx: &test_support::TestContext,
    token: &str,
    from_year: i32,
    to_year: i32,
) -> serde_json::Value {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/transitions",
            Some(token),
            Some(json!({ "from_year": from_year, "to_year": to_year })),
        ))
        .await
        .expect("create transition");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    body
}

async fn post_step(
    ctx: &test_support::TestContext,
    token: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::POST, uri, Some(token), body))
        .await
        .expect("transition step");
    let status = response.status();
    let body = test_support::read_json(response).await;
    (status, body)
}

#[tokio::test]
async fn transition_starts_pending_with_zero_progress() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_admin(ctx.state.db(), "admin@gracebook.local", "Admin", "admin-pass")
            .await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let class = test_support::insert_class(ctx.state.db(), "Lambs", "Children", 2026).await;
    test_support::insert_student(ctx.state.db(), "Hana", 3, &class.id).await;
    test_support::insert_student(ctx.state.db(), "Jiho", 2, &class.id).await;

    let body = create_transition(&ctx, &token, 2026, 2027).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["total_students"], 2);
    assert_eq!(body["assignment_progress"], 0);
    assert_eq!(body["executed"], false);
    assert_eq!(body["can_execute"], false);
}

#[tokio::test]
async fn duplicate_year_pair_conflicts() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_admin(ctx.state.db(), "admin@gracebook.local", "Admin", "admin-pass")
            .await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    create_transition(&ctx, &token, 2026, 2027).await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/transitions",
            Some(&token),
            Some(json!({ "from_year": 2026, "to_year": 2027 })),
        ))
        .await
        .expect("duplicate transition");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn full_assignment_progress_does_not_execute_the_transition() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_admin(ctx.state.db(), "admin@gracebook.local", "Admin", "admin-pass")
            .await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let class = test_support::insert_class(ctx.state.db(), "Lambs", "Children", 2026).await;
    let student = test_support::insert_student(ctx.state.db(), "Hana", 3, &class.id).await;

    let transition = create_transition(&ctx, &token, 2026, 2027).await;
    let id = transition["id"].as_str().expect("id");

    let (status, body) =
        post_step(&ctx, &token, &format!("/api/v1/transitions/{id}/create-classes"), None).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["status"], "in_progress");
    assert_eq!(body["classes_created"], true);

    let next_classes = repositories::classes::list_active_by_year(ctx.state.db(), 2027)
        .await
        .expect("next-year classes");
    assert_eq!(next_classes.len(), 1);
    let next_class_id = next_classes[0].id.clone();

    let (status, body) = post_step(
        &ctx,
        &token,
        &format!("/api/v1/transitions/{id}/assignments"),
        Some(json!({
            "assignments": [{ "student_id": student.id, "class_id": next_class_id }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["assignment_progress"], 100);
    assert_eq!(body["executed"], false);
    assert_eq!(body["status"], "in_progress");

    // Execution still needs an explicit confirmation.
    let (status, body) =
        post_step(&ctx, &token, &format!("/api/v1/transitions/{id}/execute"), None).await;
    assert_eq!(status, StatusCode::CONFLICT, "response: {body}");
}

#[tokio::test]
async fn execute_promotes_graduates_and_parks_unassigned_students() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_admin(ctx.state.db(), "admin@gracebook.local", "Admin", "admin-pass")
            .await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let class = test_support::insert_class(ctx.state.db(), "Lambs", "Children", 2026).await;
    let assigned = test_support::insert_student(ctx.state.db(), "Assigned", 3, &class.id).await;
    let unassigned = test_support::insert_student(ctx.state.db(), "Unassigned", 2, &class.id).await;
    let senior = test_support::insert_student(ctx.state.db(), "Senior", 6, &class.id).await;

    let transition = create_transition(&ctx, &token, 2026, 2027).await;
    let id = transition["id"].as_str().expect("id").to_string();

    let (status, _) =
        post_step(&ctx, &token, &format!("/api/v1/transitions/{id}/create-classes"), None).await;
    assert_eq!(status, StatusCode::OK);

    let next_classes = repositories::classes::list_active_by_year(ctx.state.db(), 2027)
        .await
        .expect("next-year classes");
    let next_class_id = next_classes[0].id.clone();

    let (status, _) = post_step(
        &ctx,
        &token,
        &format!("/api/v1/transitions/{id}/assignments"),
        Some(json!({
            "assignments": [{ "student_id": assigned.id, "class_id": next_class_id }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) =
        post_step(&ctx, &token, &format!("/api/v1/transitions/{id}/confirm"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        post_step(&ctx, &token, &format!("/api/v1/transitions/{id}/execute"), None).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["status"], "completed");
    assert_eq!(body["executed"], true);

    let assigned = repositories::students::fetch_one_by_id(ctx.state.db(), &assigned.id)
        .await
        .expect("assigned");
    assert_eq!(assigned.class_id, next_class_id);
    assert_eq!(assigned.grade, 4);
    assert!(assigned.is_active);

    let unassigned = repositories::students::fetch_one_by_id(ctx.state.db(), &unassigned.id)
        .await
        .expect("unassigned");
    assert_eq!(unassigned.grade, 3);
    let parked_in = repositories::classes::fetch_one_by_id(ctx.state.db(), &unassigned.class_id)
        .await
        .expect("holding class");
    assert!(parked_in.is_holding);
    assert_eq!(parked_in.year, 2027);
    assert_eq!(parked_in.department, "Children");

    let senior = repositories::students::fetch_one_by_id(ctx.state.db(), &senior.id)
        .await
        .expect("senior");
    assert!(!senior.is_active);
    assert_eq!(senior.graduation_year, Some(2027));
    assert_eq!(senior.grade, 6);

    // A completed transition cannot execute twice.
    let (status, _) =
        post_step(&ctx, &token, &format!("/api/v1/transitions/{id}/execute"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn rollback_after_execution_restores_grades_and_graduates() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_admin(ctx.state.db(), "admin@gracebook.local", "Admin", "admin-pass")
            .await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let class = test_support::insert_class(ctx.state.db(), "Lambs", "Children", 2026).await;
    let student = test_support::insert_student(ctx.state.db(), "Hana", 3, &class.id).await;
    let senior = test_support::insert_student(ctx.state.db(), "Senior", 6, &class.id).await;

    let transition = create_transition(&ctx, &token, 2026, 2027).await;
    let id = transition["id"].as_str().expect("id").to_string();

    let (status, _) =
        post_step(&ctx, &token, &format!("/api/v1/transitions/{id}/create-classes"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) =
        post_step(&ctx, &token, &format!("/api/v1/transitions/{id}/confirm"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) =
        post_step(&ctx, &token, &format!("/api/v1/transitions/{id}/execute"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        post_step(&ctx, &token, &format!("/api/v1/transitions/{id}/rollback"), None).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["status"], "rolled_back");

    let student = repositories::students::fetch_one_by_id(ctx.state.db(), &student.id)
        .await
        .expect("student");
    assert_eq!(student.grade, 3);
    assert!(student.is_active);

    let senior = repositories::students::fetch_one_by_id(ctx.state.db(), &senior.id)
        .await
        .expect("senior");
    assert!(senior.is_active);
    assert_eq!(senior.grade, 6);
    assert_eq!(senior.graduation_year, None);

    // Rolled back is terminal.
    let (status, _) =
        post_step(&ctx, &token, &format!("/api/v1/transitions/{id}/rollback"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn rollback_only_touches_the_executed_roster() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_admin(ctx.state.db(), "admin@gracebook.local", "Admin", "admin-pass")
            .await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let class = test_support::insert_class(ctx.state.db(), "Lambs", "Children", 2026).await;
    let student = test_support::insert_student(ctx.state.db(), "Hana", 3, &class.id).await;

    // Graduated independently before the transition; rollback must not revive them.
    let alumnus = test_support::insert_student(ctx.state.db(), "Alumnus", 6, &class.id).await;
    repositories::students::graduate(
        ctx.state.db(),
        &[alumnus.id.clone()],
        2027,
        None,
        crate::core::time::primitive_now_utc(),
    )
    .await
    .expect("graduate alumnus");

    let transition = create_transition(&ctx, &token, 2026, 2027).await;
    let id = transition["id"].as_str().expect("id").to_string();

    let (status, _) =
        post_step(&ctx, &token, &format!("/api/v1/transitions/{id}/create-classes"), None).await;
    assert_eq!(status, StatusCode::OK);

    let next_classes = repositories::classes::list_active_by_year(ctx.state.db(), 2027)
        .await
        .expect("next-year classes");
    let next_class_id = next_classes[0].id.clone();

    let (status, _) = post_step(
        &ctx,
        &token,
        &format!("/api/v1/transitions/{id}/assignments"),
        Some(json!({
            "assignments": [{ "student_id": student.id, "class_id": next_class_id }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) =
        post_step(&ctx, &token, &format!("/api/v1/transitions/{id}/confirm"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) =
        post_step(&ctx, &token, &format!("/api/v1/transitions/{id}/execute"), None).await;
    assert_eq!(status, StatusCode::OK);

    // Enrolled only after execution; rollback must leave them alone.
    let newcomer = test_support::insert_student(ctx.state.db(), "Newcomer", 2, &next_class_id).await;

    let (status, body) =
        post_step(&ctx, &token, &format!("/api/v1/transitions/{id}/rollback"), None).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");

    let restored = repositories::students::fetch_one_by_id(ctx.state.db(), &student.id)
        .await
        .expect("restored student");
    assert_eq!(restored.grade, 3);
    assert_eq!(restored.class_id, class.id);
    assert!(restored.is_active);

    let alumnus = repositories::students::fetch_one_by_id(ctx.state.db(), &alumnus.id)
        .await
        .expect("alumnus");
    assert!(!alumnus.is_active);
    assert_eq!(alumnus.graduation_year, Some(2027));

    let newcomer = repositories::students::fetch_one_by_id(ctx.state.db(), &newcomer.id)
        .await
        .expect("newcomer");
    assert_eq!(newcomer.grade, 2);
    assert_eq!(newcomer.class_id, next_class_id);
    assert!(newcomer.is_active);
}

#[tokio::test]
async fn transitions_require_admin() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "teacher@gracebook.local", "Teacher", "pass-123")
            .await;
    let token = test_support::bearer_token(&teacher.id, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/transitions",
            Some(&token),
            Some(json!({ "from_year": 2026, "to_year": 2027 })),
        ))
        .await
        .expect("create transition as teacher");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
