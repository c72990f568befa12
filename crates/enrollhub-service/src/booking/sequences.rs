//! Random operation sequences against one batch.
//!
//! After every step the batch must stay within its ceiling, its counter must
//! match its roster, and the roster must name exactly the students whose
//! bookings still hold a seat.

use proptest::prelude::*;
use proptest::sample::Index;

use enrollhub_core::error::ErrorKind;
use enrollhub_core::types::{BookingId, StudentId};
use enrollhub_entity::booking::BookingStatus;

use crate::testing::Fixture;

const STUDENTS: usize = 6;

#[derive(Debug, Clone)]
enum Op {
    Book(usize),
    Cancel(Index),
    Advance(Index),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..STUDENTS).prop_map(Op::Book),
        2 => any::<Index>().prop_map(Op::Cancel),
        2 => any::<Index>().prop_map(Op::Advance),
    ]
}

/// The next forward status, or `Completed` again for terminal bookings.
fn forward(status: BookingStatus) -> BookingStatus {
    match status {
        BookingStatus::Pending => BookingStatus::Confirmed,
        BookingStatus::Confirmed => BookingStatus::Active,
        _ => BookingStatus::Completed,
    }
}

async fn check_invariants(fx: &Fixture) -> Result<(), TestCaseError> {
    let batch = fx.batch().await;
    prop_assert!(batch.current_enrollment >= 0);
    prop_assert!(batch.current_enrollment <= batch.max_students);
    prop_assert!(batch.is_consistent(), "inconsistent batch {:?}", batch);

    let mut roster: Vec<StudentId> = batch.roster().collect();
    let mut holders: Vec<StudentId> = fx
        .store
        .find_seat_holders_by_batch(fx.batch_id)
        .await
        .unwrap()
        .iter()
        .map(|b| b.student_id)
        .collect();
    roster.sort();
    holders.sort();
    prop_assert_eq!(roster, holders);
    Ok(())
}

async fn run(max_students: i32, ops: Vec<Op>) -> Result<(), TestCaseError> {
    let fx = Fixture::new(max_students).await;
    let mut students = Vec::with_capacity(STUDENTS);
    for _ in 0..STUDENTS {
        students.push(fx.student().await);
    }
    let mut bookings: Vec<BookingId> = Vec::new();

    for op in ops {
        match op {
            Op::Book(i) => {
                let student = students[i];
                let before = fx.batch().await;
                let result = fx.book(student).await;
                if before.roster().any(|s| s == student) {
                    prop_assert_eq!(result.unwrap_err().kind, ErrorKind::AlreadyEnrolled);
                } else if before.current_enrollment >= before.max_students {
                    prop_assert_eq!(result.unwrap_err().kind, ErrorKind::BatchFull);
                } else {
                    let booking = result.unwrap();
                    bookings.push(booking.id);
                }
            }
            Op::Cancel(pick) => {
                if bookings.is_empty() {
                    continue;
                }
                let id = bookings[pick.index(bookings.len())];
                let stored = fx.store.find_booking(id).await.unwrap().unwrap();
                let result = fx.bookings.cancel_booking(&fx.parent_ctx(), id, None).await;
                if stored.is_active() {
                    prop_assert_eq!(result.unwrap().status, BookingStatus::Cancelled);
                } else {
                    prop_assert_eq!(result.unwrap_err().kind, ErrorKind::InvalidTransition);
                }
            }
            Op::Advance(pick) => {
                if bookings.is_empty() {
                    continue;
                }
                let id = bookings[pick.index(bookings.len())];
                let stored = fx.store.find_booking(id).await.unwrap().unwrap();
                let target = forward(stored.status);
                let result = fx.bookings.update_status(&fx.tutor_ctx(), id, target).await;
                if stored.is_active() {
                    prop_assert_eq!(result.unwrap().status, target);
                } else {
                    prop_assert_eq!(result.unwrap_err().kind, ErrorKind::InvalidTransition);
                }
            }
        }
        check_invariants(&fx).await?;
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128, ..ProptestConfig::default()
    })]

    #[test]
    fn test_random_sequences_keep_batch_consistent(
        max_students in 1..5i32,
        ops in prop::collection::vec(op(), 1..40),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(run(max_students, ops))?;
    }
}
