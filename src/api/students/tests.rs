use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::repositories;
use crate::services::roster_rules::DELETE_CONFIRMATION_PHRASE;
use crate::test_support;

#[tokio::test]
async fn empty_selection_has_no_commands() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "teacher@gracebook.local", "Teacher", "pass-123")
            .await;
    let token = test_support::bearer_token(&teacher.id, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/students/bulk/commands",
            Some(&token),
            Some(json!({ "student_ids": [] })),
        ))
        .await
        .expect("bulk commands");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn graduate_command_appears_only_with_graduation_grade_students() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "teacher@gracebook.local", "Teacher", "pass-123")
            .await;
    let token = test_support::bearer_token(&teacher.id, ctx.state.settings());

    let class = test_support::insert_class(ctx.state.db(), "Lambs", "Children", 2026).await;
    let younger = test_support::insert_student(ctx.state.db(), "Hana", 3, &class.id).await;
    let senior = test_support::insert_student(ctx.state.db(), "Minjun", 6, &class.id).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/students/bulk/commands",
            Some(&token),
            Some(json!({ "student_ids": [younger.id] })),
        ))
        .await
        .expect("bulk commands");
    let body = test_support::read_json(response).await;
    let commands = body["commands"].as_array().expect("commands");
    assert!(!commands.iter().any(|command| command == "graduate"), "response: {body}");

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/students/bulk/commands",
            Some(&token),
            Some(json!({ "student_ids": [senior.id] })),
        ))
        .await
        .expect("bulk commands");
    let body = test_support::read_json(response).await;
    let commands = body["commands"].as_array().expect("commands");
    assert!(commands.iter().any(|command| command == "graduate"), "response: {body}");
}

#[tokio::test]
async fn bulk_promote_skips_graduation_grade_students() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_admin(ctx.state.db(), "admin@gracebook.local", "Admin", "admin-pass")
            .await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let class = test_support::insert_class(ctx.state.db(), "Doves", "Children", 2026).await;
    let third = test_support::insert_student(ctx.state.db(), "Third Grader", 3, &class.id).await;
    let senior = test_support::insert_student(ctx.state.db(), "Senior", 6, &class.id).await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/students/bulk/promote",
            Some(&token),
            Some(json!({ "student_ids": [third.id, senior.id] })),
        ))
        .await
        .expect("bulk promote");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["promoted"], 1);
    assert_eq!(body["excluded"][0], senior.id);

    let reloaded = repositories::students::fetch_one_by_id(ctx.state.db(), &third.id)
        .await
        .expect("reload student");
    assert_eq!(reloaded.grade, 4);

    let untouched = repositories::students::fetch_one_by_id(ctx.state.db(), &senior.id)
        .await
        .expect("reload senior");
    assert_eq!(untouched.grade, 6);
    assert!(untouched.is_active);
}

#[tokio::test]
async fn bulk_delete_requires_exact_confirmation_phrase() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_admin(ctx.state.db(), "admin@gracebook.local", "Admin", "admin-pass")
            .await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let class = test_support::insert_class(ctx.state.db(), "Sparrows", "Children", 2026).await;
    let student = test_support::insert_student(ctx.state.db(), "Jiho", 2, &class.id).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/students/bulk/delete",
            Some(&token),
            Some(json!({
                "student_ids": [student.id],
                "confirmation": format!(" {DELETE_CONFIRMATION_PHRASE}")
            })),
        ))
        .await
        .expect("bulk delete with padded phrase");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let still_there = repositories::students::find_by_id(ctx.state.db(), &student.id)
        .await
        .expect("find student");
    assert!(still_there.is_some());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/students/bulk/delete",
            Some(&token),
            Some(json!({
                "student_ids": [student.id],
                "confirmation": DELETE_CONFIRMATION_PHRASE
            })),
        ))
        .await
        .expect("bulk delete");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["affected"], 1);

    let gone = repositories::students::find_by_id(ctx.state.db(), &student.id)
        .await
        .expect("find student after delete");
    assert!(gone.is_none());
}

#[tokio::test]
async fn bulk_graduate_accepts_mixed_grade_selections() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_admin(ctx.state.db(), "admin@gracebook.local", "Admin", "admin-pass")
            .await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let class = test_support::insert_class(ctx.state.db(), "Doves", "Children", 2026).await;
    let younger = test_support::insert_student(ctx.state.db(), "Fourth Grader", 4, &class.id).await;
    let senior = test_support::insert_student(ctx.state.db(), "Senior", 6, &class.id).await;

    // The action bar offers graduate for this selection, so the mutation must
    // accept it too.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/students/bulk/commands",
            Some(&token),
            Some(json!({ "student_ids": [younger.id, senior.id] })),
        ))
        .await
        .expect("bulk commands");
    let body = test_support::read_json(response).await;
    let commands = body["commands"].as_array().expect("commands");
    assert!(commands.iter().any(|command| command == "graduate"), "response: {body}");

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/students/bulk/graduate",
            Some(&token),
            Some(json!({
                "student_ids": [younger.id, senior.id],
                "graduation_year": 2026
            })),
        ))
        .await
        .expect("bulk graduate");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["affected"], 2);

    for id in [&younger.id, &senior.id] {
        let graduated = repositories::students::fetch_one_by_id(ctx.state.db(), id)
            .await
            .expect("reload student");
        assert!(!graduated.is_active);
        assert_eq!(graduated.graduation_year, Some(2026));
    }
}

#[tokio::test]
async fn bulk_transfer_rejects_students_already_in_department() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_admin(ctx.state.db(), "admin@gracebook.local", "Admin", "admin-pass")
            .await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let class = test_support::insert_class(ctx.state.db(), "Eagles", "Youth", 2026).await;
    let student = test_support::insert_student(ctx.state.db(), "Seo-yeon", 4, &class.id).await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/students/bulk/transfer",
            Some(&token),
            Some(json!({ "student_ids": [student.id], "department": "Youth" })),
        ))
        .await
        .expect("bulk transfer");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
}

#[tokio::test]
async fn bulk_transfer_lands_students_in_holding_class() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_admin(ctx.state.db(), "admin@gracebook.local", "Admin", "admin-pass")
            .await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let class = test_support::insert_class(ctx.state.db(), "Eagles", "Youth", 2026).await;
    let student = test_support::insert_student(ctx.state.db(), "Dohyun", 4, &class.id).await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/students/bulk/transfer",
            Some(&token),
            Some(json!({ "student_ids": [student.id], "department": "Children" })),
        ))
        .await
        .expect("bulk transfer");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["affected"], 1);

    let moved = repositories::students::fetch_one_by_id(ctx.state.db(), &student.id)
        .await
        .expect("reload student");
    let holding = repositories::classes::fetch_one_by_id(ctx.state.db(), &moved.class_id)
        .await
        .expect("holding class");
    assert!(holding.is_holding);
    assert_eq!(holding.department, "Children");
}

#[tokio::test]
async fn bulk_mutations_require_admin() {
    let ctx = test_support::setup_test_context().await;

    let teacher =
        test_support::insert_teacher(ctx.state.db(), "teacher@gracebook.local", "Teacher", "pass-123")
            .await;
    let token = test_support::bearer_token(&teacher.id, ctx.state.settings());

    let class = test_support::insert_class(ctx.state.db(), "Doves", "Children", 2026).await;
    let student = test_support::insert_student(ctx.state.db(), "Yuna", 1, &class.id).await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/students/bulk/promote",
            Some(&token),
            Some(json!({ "student_ids": [student.id] })),
        ))
        .await
        .expect("bulk promote as teacher");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn bulk_move_rejects_unknown_students() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_admin(ctx.state.db(), "admin@gracebook.local", "Admin", "admin-pass")
            .await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let class = test_support::insert_class(ctx.state.db(), "Doves", "Children", 2026).await;
    let student = test_support::insert_student(ctx.state.db(), "Yuna", 1, &class.id).await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/students/bulk/move",
            Some(&token),
            Some(json!({
                "student_ids": [student.id, "missing-student"],
                "class_id": class.id
            })),
        ))
        .await
        .expect("bulk move");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");

    let unchanged = repositories::students::fetch_one_by_id(ctx.state.db(), &student.id)
        .await
        .expect("reload student");
    assert_eq!(unchanged.class_id, class.id);
}
