//! Integration tests for the booking HTTP surface.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use helpers::{Caller, TestApp};

#[tokio::test]
async fn test_create_booking_takes_a_seat() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let parent = Caller::parent();
    let program = app.program(tutor).await;
    let batch = app.batch(tutor, program, 3).await;
    let student = app.student(parent, "Aarav").await;

    let response = app.book(parent, student, program, batch).await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.data()["status"], "pending");
    assert_eq!(response.data()["payment_status"], "pending");
    assert_eq!(response.data()["amount_cents"], 12_000);

    let availability = app.availability(batch).await;
    assert_eq!(availability["current_enrollment"], 1);
    assert_eq!(availability["remaining_seats"], 2);
    assert_eq!(availability["is_open"], true);
}

#[tokio::test]
async fn test_full_batch_rejects_booking() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let parent = Caller::parent();
    let program = app.program(tutor).await;
    let batch = app.batch(tutor, program, 1).await;
    let first = app.student(parent, "Aarav").await;
    let second = app.student(parent, "Diya").await;

    assert_eq!(
        app.book(parent, first, program, batch).await.status,
        StatusCode::CREATED
    );
    let response = app.book(parent, second, program, batch).await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "BATCH_FULL");
    assert_eq!(app.availability(batch).await["is_open"], false);
}

#[tokio::test]
async fn test_duplicate_booking_rejected() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let parent = Caller::parent();
    let program = app.program(tutor).await;
    let batch = app.batch(tutor, program, 5).await;
    let student = app.student(parent, "Aarav").await;

    app.book(parent, student, program, batch).await;
    let response = app.book(parent, student, program, batch).await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "ALREADY_ENROLLED");
    assert_eq!(app.availability(batch).await["current_enrollment"], 1);
}

#[tokio::test]
async fn test_missing_actor_headers_unauthenticated() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/bookings",
            Some(helpers::booking_body(
                Uuid::now_v7(),
                Uuid::now_v7(),
                Uuid::now_v7(),
            )),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "AUTHENTICATION");
}

#[tokio::test]
async fn test_tutor_cannot_book() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let parent = Caller::parent();
    let program = app.program(tutor).await;
    let batch = app.batch(tutor, program, 5).await;
    let student = app.student(parent, "Aarav").await;

    let response = app.book(tutor, student, program, batch).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_parent_cannot_book_someone_elses_student() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let owner = Caller::parent();
    let stranger = Caller::parent();
    let program = app.program(tutor).await;
    let batch = app.batch(tutor, program, 5).await;
    let student = app.student(owner, "Aarav").await;

    let response = app.book(stranger, student, program, batch).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(app.availability(batch).await["current_enrollment"], 0);
}

#[tokio::test]
async fn test_cancel_releases_seat_and_double_cancel_rejected() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let parent = Caller::parent();
    let program = app.program(tutor).await;
    let batch = app.batch(tutor, program, 1).await;
    let student = app.student(parent, "Aarav").await;
    let booking = helpers::id_of(app.book(parent, student, program, batch).await.data());

    let response = app
        .request(
            "POST",
            &format!("/api/bookings/{booking}/cancel"),
            Some(json!({ "reason": "Moving cities" })),
            Some(parent),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "cancelled");
    assert_eq!(response.data()["cancellation_reason"], "Moving cities");
    assert_eq!(app.availability(batch).await["remaining_seats"], 1);

    let again = app
        .request(
            "POST",
            &format!("/api/bookings/{booking}/cancel"),
            None,
            Some(parent),
        )
        .await;
    assert_eq!(again.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(again.error_code(), "INVALID_TRANSITION");
    assert_eq!(app.availability(batch).await["current_enrollment"], 0);
}

#[tokio::test]
async fn test_rebook_after_cancel() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let parent = Caller::parent();
    let program = app.program(tutor).await;
    let batch = app.batch(tutor, program, 1).await;
    let student = app.student(parent, "Aarav").await;
    let booking = helpers::id_of(app.book(parent, student, program, batch).await.data());

    app.request(
        "POST",
        &format!("/api/bookings/{booking}/cancel"),
        None,
        Some(parent),
    )
    .await;

    let response = app.book(parent, student, program, batch).await;
    assert_eq!(response.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_unknown_ids_not_found() {
    let app = TestApp::new();
    let parent = Caller::parent();
    let unknown = Uuid::now_v7();

    let booking = app
        .request("GET", &format!("/api/bookings/{unknown}"), None, Some(parent))
        .await;
    assert_eq!(booking.status, StatusCode::NOT_FOUND);

    let batch = app
        .request(
            "GET",
            &format!("/api/batches/{unknown}/availability"),
            None,
            None,
        )
        .await;
    assert_eq!(batch.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_id_rejected() {
    let app = TestApp::new();

    let response = app
        .request("GET", "/api/bookings/not-a-uuid", None, Some(Caller::admin()))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION");
}

#[tokio::test]
async fn test_negative_amount_rejected_with_details() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let parent = Caller::parent();
    let program = app.program(tutor).await;
    let batch = app.batch(tutor, program, 5).await;
    let student = app.student(parent, "Aarav").await;

    let mut body = helpers::booking_body(student, program, batch);
    body["amount_cents"] = json!(-1);
    let response = app
        .request("POST", "/api/bookings", Some(body), Some(parent))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["details"]["amount_cents"].is_array());
}

#[tokio::test]
async fn test_booking_in_cancelled_batch_rejected() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let parent = Caller::parent();
    let program = app.program(tutor).await;
    let batch = app.batch(tutor, program, 5).await;
    let student = app.student(parent, "Aarav").await;

    let response = app
        .request(
            "PUT",
            &format!("/api/batches/{batch}"),
            Some(json!({ "status": "cancelled" })),
            Some(tutor),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.book(parent, student, program, batch).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "BATCH_CLOSED");
}

#[tokio::test]
async fn test_payment_confirms_then_refund() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let parent = Caller::parent();
    let program = app.program(tutor).await;
    let batch = app.batch(tutor, program, 5).await;
    let student = app.student(parent, "Aarav").await;
    let booking = helpers::id_of(app.book(parent, student, program, batch).await.data());
    let path = format!("/api/bookings/{booking}/payment");

    let by_parent = app
        .request(
            "POST",
            &path,
            Some(json!({ "status": "completed" })),
            Some(parent),
        )
        .await;
    assert_eq!(by_parent.status, StatusCode::FORBIDDEN);

    let paid = app
        .request(
            "POST",
            &path,
            Some(json!({
                "status": "completed",
                "payment_id": "pay_8812",
                "payment_method": "upi",
            })),
            Some(Caller::system()),
        )
        .await;
    assert_eq!(paid.status, StatusCode::OK);
    assert_eq!(paid.data()["payment_status"], "completed");
    assert_eq!(paid.data()["status"], "confirmed");
    assert_eq!(paid.data()["payment_id"], "pay_8812");

    let too_much = app
        .request(
            "POST",
            &path,
            Some(json!({ "status": "refunded", "refund_amount_cents": 50_000 })),
            Some(Caller::system()),
        )
        .await;
    assert_eq!(too_much.status, StatusCode::BAD_REQUEST);

    let refunded = app
        .request(
            "POST",
            &path,
            Some(json!({
                "status": "refunded",
                "refund_amount_cents": 6_000,
                "reason": "Partial attendance",
            })),
            Some(Caller::system()),
        )
        .await;
    assert_eq!(refunded.status, StatusCode::OK);
    assert_eq!(refunded.data()["refund_amount_cents"], 6_000);

    let replay = app
        .request(
            "POST",
            &path,
            Some(json!({ "status": "completed" })),
            Some(Caller::system()),
        )
        .await;
    assert_eq!(replay.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_status_progression_by_tutor() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let parent = Caller::parent();
    let program = app.program(tutor).await;
    let batch = app.batch(tutor, program, 5).await;
    let student = app.student(parent, "Aarav").await;
    let booking = helpers::id_of(app.book(parent, student, program, batch).await.data());
    let path = format!("/api/bookings/{booking}/status");

    let skip = app
        .request("PUT", &path, Some(json!({ "status": "active" })), Some(tutor))
        .await;
    assert_eq!(skip.status, StatusCode::UNPROCESSABLE_ENTITY);

    for status in ["confirmed", "active", "completed"] {
        let response = app
            .request("PUT", &path, Some(json!({ "status": status })), Some(tutor))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        assert_eq!(response.data()["status"], status);
    }

    // Completion keeps the seat.
    assert_eq!(app.availability(batch).await["current_enrollment"], 1);

    let cancel = app
        .request(
            "POST",
            &format!("/api/bookings/{booking}/cancel"),
            None,
            Some(parent),
        )
        .await;
    assert_eq!(cancel.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_list_bookings_scoped_to_parent() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let parent = Caller::parent();
    let other = Caller::parent();
    let program = app.program(tutor).await;
    let batch = app.batch(tutor, program, 5).await;
    let mine = app.student(parent, "Aarav").await;
    let theirs = app.student(other, "Diya").await;
    app.book(parent, mine, program, batch).await;
    app.book(other, theirs, program, batch).await;

    let response = app
        .request("GET", "/api/bookings?page=1&per_page=10", None, Some(parent))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["total_items"], 1);

    let response = app
        .request(
            "GET",
            &format!("/api/bookings?batch_id={batch}"),
            None,
            Some(tutor),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["total_items"], 2);
}

#[tokio::test]
async fn test_program_availability_and_open_batches() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let parent = Caller::parent();
    let program = app.program(tutor).await;
    let small = app.batch(tutor, program, 1).await;
    let large = app.batch(tutor, program, 4).await;
    let student = app.student(parent, "Aarav").await;
    app.book(parent, student, program, small).await;

    let response = app
        .request(
            "GET",
            &format!("/api/programs/{program}/availability"),
            None,
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["has_availability"], true);
    assert_eq!(response.data()["open_batches"], 1);

    let response = app
        .request("GET", &format!("/api/programs/{program}/batches"), None, None)
        .await;
    let open = response.data().as_array().unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0]["batch_id"], large.to_string());
}

#[tokio::test]
async fn test_capacity_cannot_drop_below_enrollment() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let parent = Caller::parent();
    let program = app.program(tutor).await;
    let batch = app.batch(tutor, program, 3).await;
    for name in ["Aarav", "Diya"] {
        let student = app.student(parent, name).await;
        app.book(parent, student, program, batch).await;
    }

    let response = app
        .request(
            "PUT",
            &format!("/api/batches/{batch}"),
            Some(json!({ "max_students": 1 })),
            Some(tutor),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "PUT",
            &format!("/api/batches/{batch}"),
            Some(json!({ "max_students": 2 })),
            Some(tutor),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(app.availability(batch).await["is_open"], false);
}

#[tokio::test]
async fn test_delete_batch_cascades_cancellation() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let parent = Caller::parent();
    let program = app.program(tutor).await;
    let batch = app.batch(tutor, program, 3).await;
    let student = app.student(parent, "Aarav").await;
    let booking = helpers::id_of(app.book(parent, student, program, batch).await.data());

    let stranger = app
        .request(
            "DELETE",
            &format!("/api/batches/{batch}"),
            None,
            Some(Caller::tutor()),
        )
        .await;
    assert_eq!(stranger.status, StatusCode::FORBIDDEN);

    let response = app
        .request("DELETE", &format!("/api/batches/{batch}"), None, Some(tutor))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["cancelled_bookings"], 1);

    let booking = app
        .request("GET", &format!("/api/bookings/{booking}"), None, Some(parent))
        .await;
    assert_eq!(booking.data()["status"], "cancelled");
    assert_eq!(booking.data()["cancellation_reason"], "Batch deleted");
}

#[tokio::test]
async fn test_get_batch_shows_named_roster() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let parent = Caller::parent();
    let program = app.program(tutor).await;
    let batch = app.batch(tutor, program, 3).await;
    let first = app.student(parent, "Aarav").await;
    let second = app.student(parent, "Diya").await;
    app.book(parent, first, program, batch).await;
    app.book(parent, second, program, batch).await;

    let response = app
        .request("GET", &format!("/api/batches/{batch}"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let data = response.data();
    assert_eq!(helpers::id_of(data), batch);
    assert_eq!(data["name"], "Weekend Batch");
    assert_eq!(data["current_enrollment"], 2);
    assert_eq!(data["program"]["title"], "Robotics for Kids");

    let roster = data["roster"].as_array().unwrap();
    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0]["student_id"], first.to_string());
    assert_eq!(roster[0]["first_name"], "Aarav");
    assert_eq!(roster[1]["first_name"], "Diya");
    assert_eq!(roster[1]["last_name"], "Sharma");

    app.request("DELETE", &format!("/api/batches/{batch}"), None, Some(tutor))
        .await;
    let gone = app
        .request("GET", &format!("/api/batches/{batch}"), None, None)
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_reconcile_reports_clean_store() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let parent = Caller::parent();
    let program = app.program(tutor).await;
    let batch = app.batch(tutor, program, 3).await;
    let student = app.student(parent, "Aarav").await;
    app.book(parent, student, program, batch).await;

    let denied = app
        .request("POST", "/api/admin/reconcile", None, Some(tutor))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let response = app
        .request("POST", "/api/admin/reconcile", None, Some(Caller::admin()))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["batches_checked"], 1);
    assert!(response.data()["repaired"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "ok");
    assert_eq!(response.data()["store"], "memory");
}
