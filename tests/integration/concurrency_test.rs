//! Concurrent booking tests against the full HTTP stack.

mod helpers;

use axum::http::StatusCode;
use futures::future::join_all;

use helpers::{Caller, TestApp};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_seat_goes_to_exactly_one_request() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let program = app.program(tutor).await;
    let batch = app.batch(tutor, program, 1).await;

    let mut contenders = Vec::new();
    for i in 0..10 {
        let parent = Caller::parent();
        let student = app.student(parent, &format!("Student{i}")).await;
        contenders.push((parent, student));
    }

    let attempts = contenders.into_iter().map(|(parent, student)| {
        let router = app.router.clone();
        tokio::spawn(async move {
            helpers::send(
                router,
                "POST",
                "/api/bookings",
                Some(helpers::booking_body(student, program, batch)),
                Some(parent),
            )
            .await
        })
    });
    let responses: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let created = responses
        .iter()
        .filter(|r| r.status == StatusCode::CREATED)
        .count();
    let full = responses
        .iter()
        .filter(|r| r.status == StatusCode::CONFLICT && r.error_code() == "BATCH_FULL")
        .count();
    assert_eq!(created, 1);
    assert_eq!(full, 9);

    let availability = app.availability(batch).await;
    assert_eq!(availability["current_enrollment"], 1);
    assert_eq!(availability["remaining_seats"], 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_remaining_seats_fill_exactly() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let program = app.program(tutor).await;
    let batch = app.batch(tutor, program, 5).await;
    let parent = Caller::parent();

    let mut students = Vec::new();
    for i in 0..12 {
        students.push(app.student(parent, &format!("Student{i}")).await);
    }

    let attempts = students.into_iter().map(|student| {
        let router = app.router.clone();
        tokio::spawn(async move {
            helpers::send(
                router,
                "POST",
                "/api/bookings",
                Some(helpers::booking_body(student, program, batch)),
                Some(parent),
            )
            .await
            .status
        })
    });
    let statuses: Vec<StatusCode> = join_all(attempts)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CREATED).count(), 5);
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(), 7);
    assert_eq!(app.availability(batch).await["current_enrollment"], 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_student_racing_itself_enrolls_once() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let parent = Caller::parent();
    let program = app.program(tutor).await;
    let batch = app.batch(tutor, program, 10).await;
    let student = app.student(parent, "Aarav").await;

    let attempts = (0..8).map(|_| {
        let router = app.router.clone();
        tokio::spawn(async move {
            helpers::send(
                router,
                "POST",
                "/api/bookings",
                Some(helpers::booking_body(student, program, batch)),
                Some(parent),
            )
            .await
        })
    });
    let responses: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(
        responses
            .iter()
            .filter(|r| r.status == StatusCode::CREATED)
            .count(),
        1
    );
    assert!(
        responses
            .iter()
            .filter(|r| r.status != StatusCode::CREATED)
            .all(|r| r.error_code() == "ALREADY_ENROLLED")
    );
    assert_eq!(app.availability(batch).await["current_enrollment"], 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_creates_and_cancels_stay_consistent() {
    let app = TestApp::new();
    let tutor = Caller::tutor();
    let parent = Caller::parent();
    let program = app.program(tutor).await;
    let batch = app.batch(tutor, program, 4).await;

    let mut booked = Vec::new();
    for i in 0..4 {
        let student = app.student(parent, &format!("Early{i}")).await;
        let response = app.book(parent, student, program, batch).await;
        booked.push(helpers::id_of(response.data()));
    }
    let mut newcomers = Vec::new();
    for i in 0..6 {
        newcomers.push(app.student(parent, &format!("Late{i}")).await);
    }

    let cancels = booked.iter().take(2).map(|booking| {
        let router = app.router.clone();
        let path = format!("/api/bookings/{booking}/cancel");
        tokio::spawn(async move {
            helpers::send(router, "POST", &path, None, Some(parent))
                .await
                .status
        })
    });
    let creates = newcomers.iter().map(|student| {
        let router = app.router.clone();
        let body = helpers::booking_body(*student, program, batch);
        tokio::spawn(async move {
            helpers::send(router, "POST", "/api/bookings", Some(body), Some(parent))
                .await
                .status
        })
    });

    let (cancelled, created) = futures::join!(join_all(cancels), join_all(creates));
    assert!(cancelled.into_iter().all(|s| s.unwrap() == StatusCode::OK));
    let created = created
        .into_iter()
        .filter(|s| *s.as_ref().unwrap() == StatusCode::CREATED)
        .count();

    // Two seats freed, so at most two newcomers fit.
    assert!(created <= 2);
    let availability = app.availability(batch).await;
    assert_eq!(availability["current_enrollment"], 2 + created);
    assert!(availability["current_enrollment"].as_u64().unwrap() <= 4);

    let report = helpers::send(
        app.router.clone(),
        "POST",
        "/api/admin/reconcile",
        None,
        Some(Caller::admin()),
    )
    .await;
    assert!(report.data()["repaired"].as_array().unwrap().is_empty());
    assert!(report.data()["over_capacity"].as_array().unwrap().is_empty());
}
