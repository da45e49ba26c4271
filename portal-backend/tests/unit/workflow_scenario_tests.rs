// tests/unit/workflow_scenario_tests.rs
//
// 承認フロー・可視範囲・割り当て規則を純粋なコア関数だけで検証する。

use crate::common::*;
use portal_backend::domain::approval_record_model::ApprovalAction;
use portal_backend::domain::area_assignment::{
    plan_assignment, AreaChoice, AreaSelection, AssignmentPlan,
};
use portal_backend::domain::leave_application_model::Model as LeaveApplication;
use portal_backend::domain::leave_status::LeaveStatus;
use portal_backend::domain::leave_workflow::{self, AuditEntry, LeaveTransition};
use portal_backend::domain::principal::Principal;
use portal_backend::domain::user_role::UserRole;
use portal_backend::domain::visibility::{visibility_filter, OwnerContext, ResourceKind};
use portal_backend::error::{AppError, AppResult, ErrorKind};
use portal_backend::utils::permission::PermissionChecker;
use uuid::Uuid;

/// 比較交換つきで遷移を適用する最小の永続化モデル
struct LeaveLedger {
    current: LeaveApplication,
    visited: Vec<LeaveStatus>,
    records: Vec<AuditEntry>,
}

impl LeaveLedger {
    fn new(application: LeaveApplication) -> Self {
        Self {
            visited: vec![application.status],
            current: application,
            records: Vec::new(),
        }
    }

    fn commit(&mut self, transition: &LeaveTransition) -> AppResult<()> {
        if self.current.status != transition.from {
            return Err(AppError::StateConflict(format!(
                "expected '{}' but found '{}'",
                transition.from, self.current.status
            )));
        }
        self.current = transition.apply_to(&self.current);
        self.visited.push(self.current.status);
        self.records.push(transition.audit.clone());
        Ok(())
    }

    fn snapshot(&self) -> LeaveApplication {
        self.current.clone()
    }
}

struct Org {
    north: Uuid,
    south: Uuid,
    head_north: Principal,
    tam_north: Principal,
    tam_south: Principal,
    employee_north: Principal,
}

fn org() -> Org {
    init_test_env();
    let north = Uuid::new_v4();
    let south = Uuid::new_v4();
    Org {
        north,
        south,
        head_north: head_manager([north]),
        tam_north: task_area_manager(north),
        tam_south: task_area_manager(south),
        employee_north: employee(north),
    }
}

#[test]
fn scenario_a_employee_leave_is_approved_in_two_stages() {
    let o = org();
    let applicant = owner_of(&o.employee_north);
    let mut ledger = LeaveLedger::new(draft_leave(&o.employee_north));

    let submitted = leave_workflow::submit(&o.employee_north, &ledger.snapshot()).unwrap();
    ledger.commit(&submitted).unwrap();
    assert_eq!(ledger.current.status, LeaveStatus::PendingTaskArea);

    let first = leave_workflow::approve(&o.tam_north, &ledger.snapshot(), &applicant, None)
        .unwrap();
    ledger.commit(&first).unwrap();
    assert_eq!(ledger.current.status, LeaveStatus::PendingHead);
    assert!(ledger.current.task_area_manager_approved);
    assert_eq!(
        ledger.current.task_area_manager_approver_id,
        Some(o.tam_north.user_id)
    );

    let second = leave_workflow::approve(
        &o.head_north,
        &ledger.snapshot(),
        &applicant,
        Some("enjoy".to_string()),
    )
    .unwrap();
    ledger.commit(&second).unwrap();
    assert_eq!(ledger.current.status, LeaveStatus::Approved);
    assert!(ledger.current.head_manager_approved);

    assert_eq!(ledger.records.len(), 3);
    let actions: Vec<ApprovalAction> = ledger.records.iter().map(|r| r.action).collect();
    assert_eq!(
        actions,
        vec![
            ApprovalAction::Submitted,
            ApprovalAction::Approved,
            ApprovalAction::Approved
        ]
    );
    assert_eq!(ledger.records[2].comment.as_deref(), Some("enjoy"));
}

#[test]
fn scenario_b_task_area_manager_leave_skips_task_area_stage() {
    let o = org();
    let mut ledger = LeaveLedger::new(draft_leave(&o.tam_north));

    let submitted = leave_workflow::submit(&o.tam_north, &ledger.snapshot()).unwrap();
    ledger.commit(&submitted).unwrap();
    assert_eq!(ledger.current.status, LeaveStatus::PendingHead);

    // 同じ任務区の別の責任者でも任務区段階の承認はできない
    let peer = task_area_manager(o.north);
    let applicant = owner_of(&o.tam_north);
    let denied = leave_workflow::approve(&peer, &ledger.snapshot(), &applicant, None);
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let approved =
        leave_workflow::approve(&o.head_north, &ledger.snapshot(), &applicant, None).unwrap();
    ledger.commit(&approved).unwrap();
    assert_eq!(ledger.current.status, LeaveStatus::Approved);
    assert!(!ledger.current.task_area_manager_approved);
}

#[test]
fn scenario_c_other_area_manager_cannot_view_or_approve() {
    let o = org();
    let employee_owner = owner_of(&o.employee_north);

    assert!(!PermissionChecker::can_view_user(&o.tam_south, &employee_owner));
    assert!(!PermissionChecker::can_view_leave(&o.tam_south, &employee_owner));
    assert!(!PermissionChecker::can_approve_leave(
        &o.tam_south,
        LeaveStatus::PendingTaskArea,
        &employee_owner
    ));

    let pending = leave_in(&o.employee_north, LeaveStatus::PendingTaskArea);
    let result = leave_workflow::approve(&o.tam_south, &pending, &employee_owner, None);
    let error = result.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::AccessDenied);

    // 一覧でも同じルールで除外される
    let filter = visibility_filter(&o.tam_south, ResourceKind::LeaveApplication);
    let visible = filter.apply(vec![(pending, employee_owner)]);
    assert!(visible.is_empty());
}

#[test]
fn scenario_d_head_manager_without_areas_is_rejected() {
    let result = plan_assignment(UserRole::HeadManager, AreaSelection::default());
    let error = result.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Validation);

    // 名前が不正な任務区だけを渡しても同じ
    let result = plan_assignment(
        UserRole::HeadManager,
        AreaSelection::managed([AreaChoice::New("x".to_string())]),
    );
    assert_eq!(result.unwrap_err().kind(), ErrorKind::Validation);
}

#[test]
fn scenario_e_concurrent_approvals_only_one_wins() {
    let o = org();
    let applicant = owner_of(&o.employee_north);
    let mut ledger = LeaveLedger::new(leave_in(&o.employee_north, LeaveStatus::PendingTaskArea));

    // 両者とも同じスナップショットから遷移を計算する
    let snapshot = ledger.snapshot();
    let second_tam = task_area_manager(o.north);
    let a = leave_workflow::approve(&o.tam_north, &snapshot, &applicant, None).unwrap();
    let b = leave_workflow::approve(&second_tam, &snapshot, &applicant, None).unwrap();

    let results = [ledger.commit(&a), ledger.commit(&b)];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(e) if e.is_state_conflict()))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);
    assert_eq!(ledger.records.len(), 1);
    assert_eq!(ledger.current.status, LeaveStatus::PendingHead);
}

#[test]
fn scenario_e_loser_reading_after_the_winner_sees_a_conflict() {
    let o = org();
    let applicant = owner_of(&o.employee_north);
    let mut ledger = LeaveLedger::new(leave_in(&o.employee_north, LeaveStatus::PendingTaskArea));
    let second_tam = task_area_manager(o.north);

    let winner = leave_workflow::approve(&second_tam, &ledger.snapshot(), &applicant, None)
        .unwrap();
    ledger.commit(&winner).unwrap();

    // 敗者は勝者のコミット後の状態を読んでから操作する
    let after = ledger.snapshot();
    for outcome in [
        leave_workflow::approve(&o.tam_north, &after, &applicant, None),
        leave_workflow::reject(&o.tam_north, &after, &applicant, None),
        leave_workflow::approve(&second_tam, &after, &applicant, None),
    ] {
        assert_eq!(outcome.unwrap_err().kind(), ErrorKind::StateConflict);
    }

    // 決裁権のない別任務区の責任者は権限エラーのまま
    let error = leave_workflow::approve(&o.tam_south, &after, &applicant, None).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::AccessDenied);

    assert_eq!(ledger.records.len(), 1);
    assert_eq!(ledger.current.status, LeaveStatus::PendingHead);
}

#[test]
fn approving_an_approved_application_is_a_state_conflict() {
    let o = org();
    let applicant = owner_of(&o.employee_north);
    let approved = leave_in(&o.employee_north, LeaveStatus::Approved);

    for actor in [superuser(), o.head_north.clone(), o.tam_north.clone()] {
        let error = leave_workflow::approve(&actor, &approved, &applicant, None).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::StateConflict);
    }
}

type Step = fn(&Org, &LeaveApplication, &OwnerContext) -> AppResult<LeaveTransition>;

fn employee_submits(o: &Org, app: &LeaveApplication, _: &OwnerContext) -> AppResult<LeaveTransition> {
    leave_workflow::submit(&o.employee_north, app)
}

fn tam_approves(o: &Org, app: &LeaveApplication, applicant: &OwnerContext) -> AppResult<LeaveTransition> {
    leave_workflow::approve(&o.tam_north, app, applicant, None)
}

fn head_approves(o: &Org, app: &LeaveApplication, applicant: &OwnerContext) -> AppResult<LeaveTransition> {
    leave_workflow::approve(&o.head_north, app, applicant, None)
}

fn tam_rejects(o: &Org, app: &LeaveApplication, applicant: &OwnerContext) -> AppResult<LeaveTransition> {
    leave_workflow::reject(&o.tam_north, app, applicant, Some("short staffed".to_string()))
}

fn head_rejects(o: &Org, app: &LeaveApplication, applicant: &OwnerContext) -> AppResult<LeaveTransition> {
    leave_workflow::reject(&o.head_north, app, applicant, None)
}

fn employee_cancels(o: &Org, app: &LeaveApplication, _: &OwnerContext) -> AppResult<LeaveTransition> {
    leave_workflow::cancel(&o.employee_north, app, Some("plans changed".to_string()))
}

#[test]
fn visited_states_never_move_backward() {
    let o = org();
    let applicant = owner_of(&o.employee_north);

    // 却下・取消を含む代表的な経路
    let paths: [&[Step]; 4] = [
        &[employee_submits, tam_approves, head_approves, employee_cancels],
        &[employee_submits, tam_rejects],
        &[employee_submits, tam_approves, head_rejects],
        &[employee_submits, employee_cancels],
    ];

    for path in paths {
        let mut ledger = LeaveLedger::new(draft_leave(&o.employee_north));
        for step in path {
            let transition = step(&o, &ledger.snapshot(), &applicant).unwrap();
            ledger.commit(&transition).unwrap();
        }

        for pair in ledger.visited.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "illegal edge {} -> {}",
                pair[0],
                pair[1]
            );
            if !pair[1].is_terminal() {
                assert!(pair[0].progress_rank() < pair[1].progress_rank());
            }
        }
        assert!(ledger.current.status.is_terminal());
        assert_eq!(ledger.records.len(), path.len());

        // 終端状態からは承認も却下もできない
        let finished = ledger.snapshot();
        assert!(leave_workflow::approve(&superuser(), &finished, &applicant, None).is_err());
        assert!(leave_workflow::reject(&superuser(), &finished, &applicant, None).is_err());
    }
}

#[test]
fn rejection_and_cancellation_guards() {
    let o = org();
    let applicant = owner_of(&o.employee_north);
    let pending = leave_in(&o.employee_north, LeaveStatus::PendingTaskArea);

    // 申請者以外は取消できない
    let error = leave_workflow::cancel(&o.tam_north, &pending, None).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::AccessDenied);

    // 空白のみの理由は未指定として扱う
    let rejected =
        leave_workflow::reject(&o.tam_north, &pending, &applicant, Some("   ".into())).unwrap();
    let outcome = rejected.apply_to(&pending);
    assert_eq!(outcome.status, LeaveStatus::Rejected);
    assert_eq!(outcome.rejected_by, Some(o.tam_north.user_id));
    assert_eq!(outcome.rejection_reason, None);

    // 却下済みは取消できない
    let error = leave_workflow::cancel(&o.employee_north, &outcome, None).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::StateConflict);
}

#[test]
fn superuser_and_head_manager_do_not_apply_for_leave() {
    let o = org();
    for actor in [superuser(), o.head_north.clone()] {
        let draft = draft_leave(&actor);
        let error = leave_workflow::submit(&actor, &draft).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AccessDenied);
    }
}

#[test]
fn scope_is_empty_only_for_unassigned_actors() {
    let o = org();

    assert!(!superuser().scope().is_empty());
    assert!(!o.head_north.scope().is_empty());
    assert!(!o.tam_north.scope().is_empty());
    assert!(!o.employee_north.scope().is_empty());

    let unassigned = [
        Principal::new(Uuid::new_v4(), UserRole::HeadManager),
        Principal::new(Uuid::new_v4(), UserRole::TaskAreaManager),
        Principal::new(Uuid::new_v4(), UserRole::Employee),
    ];
    for actor in unassigned {
        assert!(actor.scope().is_empty(), "{} should have no scope", actor.role);
    }

    assert!(o.head_north.scope().contains(Some(o.north)));
    assert!(!o.head_north.scope().contains(Some(o.south)));
}

#[test]
fn list_filter_and_detail_check_agree() {
    let o = org();
    let employee_south = employee(o.south);
    let owners = vec![
        owner_of(&o.employee_north),
        owner_of(&employee_south),
        owner_of(&o.tam_north),
        owner_of(&o.tam_south),
        owner_of(&o.head_north),
        owner_of(&superuser()),
    ];
    let actors = [
        superuser(),
        o.head_north.clone(),
        o.tam_north.clone(),
        o.tam_south.clone(),
        o.employee_north.clone(),
        employee_south.clone(),
    ];

    for actor in &actors {
        let filter = visibility_filter(actor, ResourceKind::User);
        let listed = filter.apply(owners.clone());
        for owner in &owners {
            let in_list = listed.contains(owner);
            assert_eq!(in_list, PermissionChecker::can_view_user(actor, owner));
        }
        // 自分自身は常に見える
        assert!(filter.matches(&owner_of(actor)));
    }
}

#[test]
fn assignment_plans_follow_the_role() {
    let north = Uuid::new_v4();

    assert_eq!(
        plan_assignment(UserRole::Superuser, AreaSelection::default()).unwrap(),
        AssignmentPlan::Global
    );

    let plan = plan_assignment(
        UserRole::Employee,
        AreaSelection::single(AreaChoice::Existing(north)),
    )
    .unwrap();
    assert_eq!(plan, AssignmentPlan::Single(AreaChoice::Existing(north)));

    // 単一任務区ロールは任務区が必須
    let error = plan_assignment(UserRole::TaskAreaManager, AreaSelection::default()).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Validation);

    // 予約語を含む名前は作成されない
    let error = plan_assignment(
        UserRole::Employee,
        AreaSelection::single(AreaChoice::New("email address".to_string())),
    )
    .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Validation);
}
