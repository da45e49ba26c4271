// tests/unit/leave_response_tests.rs
//
// 休暇中・休暇予定の表示フラグは基準日と承認状態で決まる。

use crate::common::*;
use portal_backend::api::dto::leave_dto::LeaveApplicationResponse;
use portal_backend::domain::leave_status::LeaveStatus;
use uuid::Uuid;

#[test]
fn approved_leave_is_planned_before_start_and_on_leave_within_range() {
    let applicant = employee(Uuid::new_v4());
    let approved = leave_in(&applicant, LeaveStatus::Approved);

    let before = LeaveApplicationResponse::on(approved.clone(), None, leave_day(4));
    assert!(before.planned_leave);
    assert!(!before.on_leave);

    for day in [5, 6, 7] {
        let during = LeaveApplicationResponse::on(approved.clone(), None, leave_day(day));
        assert!(during.on_leave, "day {}", day);
        assert!(!during.planned_leave, "day {}", day);
    }

    let after = LeaveApplicationResponse::on(approved, None, leave_day(8));
    assert!(!after.on_leave);
    assert!(!after.planned_leave);
}

#[test]
fn unapproved_leave_is_never_flagged() {
    let applicant = employee(Uuid::new_v4());

    for status in [
        LeaveStatus::Draft,
        LeaveStatus::PendingTaskArea,
        LeaveStatus::PendingHead,
        LeaveStatus::Rejected,
        LeaveStatus::Cancelled,
    ] {
        let application = leave_in(&applicant, status);
        for day in [4, 6] {
            let response = LeaveApplicationResponse::on(application.clone(), None, leave_day(day));
            assert!(!response.on_leave, "{} on day {}", status, day);
            assert!(!response.planned_leave, "{} on day {}", status, day);
        }
    }
}

#[test]
fn applicant_area_comes_from_the_owner_context() {
    let area = Uuid::new_v4();
    let applicant = employee(area);
    let application = leave_in(&applicant, LeaveStatus::PendingTaskArea);

    let response = LeaveApplicationResponse::on(application, Some(&owner_of(&applicant)), leave_day(1));
    assert_eq!(response.applicant_task_area_id, Some(area));
    assert_eq!(response.duration_days, 3);
}
