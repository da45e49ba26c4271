// portal-backend/src/service/user_service.rs

use crate::domain::area_assignment::{
    plan_assignment, AreaChoice, AreaSelection, AssignmentPlan, ResolvedAssignment,
};
use crate::domain::principal::Principal;
use crate::domain::task_area_model::GLOBAL_TASK_AREA_NAME;
use crate::domain::user_model::{self, validate_coordinates};
use crate::domain::user_role::UserRole;
use crate::domain::visibility::{visibility_filter, OwnerContext, ResourceKind};
use crate::error::{AppError, AppResult};
use crate::repository::task_area_repository::TaskAreaRepository;
use crate::repository::user_repository::UserRepository;
use crate::utils::permission::PermissionChecker;
use crate::utils::transaction::run_atomic;
use sea_orm::{ConnectionTrait, DatabaseConnection};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 新規ユーザーの基本情報
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
}

pub struct UserService {
    db: Arc<DatabaseConnection>,
    user_repository: UserRepository,
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            user_repository: UserRepository::new(db.clone()),
            db,
        }
    }

    /// 参照可能なユーザー一覧
    pub async fn list_users(&self, actor: &Principal) -> AppResult<Vec<user_model::Model>> {
        let filter = visibility_filter(actor, ResourceKind::User);
        let users = self.user_repository.find_visible(&filter).await?;
        Ok(filter.apply(users))
    }

    /// ユーザー詳細（範囲外は存在しない扱い）
    pub async fn get_user(&self, actor: &Principal, id: Uuid) -> AppResult<user_model::Model> {
        let not_found = || AppError::NotFound(format!("User {} not found", id));
        let user = self
            .user_repository
            .find_by_id(id)
            .await?
            .ok_or_else(not_found)?;

        if !PermissionChecker::can_view_user(actor, &OwnerContext::of_user(&user)) {
            debug!(user_id = %actor.user_id, target_id = %id, "User outside scope");
            return Err(not_found());
        }
        Ok(user)
    }

    /// 管轄任務区の一覧（総部責任者のみ意味を持つ）
    pub async fn managed_task_areas(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        Ok(UserRepository::managed_area_ids(self.db.as_ref(), user_id).await?)
    }

    /// ロールと任務区の割り当て
    ///
    /// 検証に失敗した場合は何も書き込まず、書き込み途中の失敗はロールバックされる。
    pub async fn assign_role(
        &self,
        actor: &Principal,
        target_id: Uuid,
        role: UserRole,
        selection: AreaSelection,
    ) -> AppResult<user_model::Model> {
        let target = self
            .user_repository
            .find_by_id(target_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", target_id)))?;

        let target_owner = OwnerContext::of_user(&target);
        if !PermissionChecker::can_manage_user(actor, &target_owner) {
            warn!(
                user_id = %actor.user_id,
                target_id = %target_id,
                "Role assignment denied: target not manageable"
            );
            return Err(AppError::Forbidden(format!(
                "You cannot manage user {}",
                target_id
            )));
        }
        if !PermissionChecker::can_grant_role(actor, role) {
            warn!(
                user_id = %actor.user_id,
                role = %role,
                "Role assignment denied: role not grantable"
            );
            return Err(AppError::Forbidden(format!(
                "You cannot grant the role '{}'",
                role
            )));
        }

        let plan = plan_assignment(role, selection)?;

        let actor = actor.clone();
        let updated = run_atomic(&self.db, "role_assignment", move |txn| {
            Box::pin(async move {
                let resolved = resolve_plan(txn, role, plan).await?;
                ensure_within_scope(&actor, &resolved)?;
                Ok(UserRepository::apply_assignment(txn, target_id, &resolved).await?)
            })
        })
        .await?;

        info!(
            target_id = %updated.id,
            role = %updated.role,
            task_area_id = ?updated.task_area_id,
            "Role assigned"
        );
        Ok(updated)
    }

    /// ユーザー作成
    ///
    /// 付与できるロールと任務区の規則はロール割り当てと同じ。
    /// 任務区の作成からユーザー行の挿入までを1トランザクションで行う。
    pub async fn create_user(
        &self,
        actor: &Principal,
        new_user: NewUser,
        role: UserRole,
        selection: AreaSelection,
    ) -> AppResult<user_model::Model> {
        if !PermissionChecker::can_grant_role(actor, role) {
            warn!(
                user_id = %actor.user_id,
                role = %role,
                "User creation denied: role not grantable"
            );
            return Err(AppError::Forbidden(format!(
                "You cannot create a user with the role '{}'",
                role
            )));
        }

        let plan = plan_assignment(role, selection)?;

        let actor = actor.clone();
        let username = new_user.username.trim().to_string();
        let full_name = new_user.full_name.trim().to_string();
        let created = run_atomic(&self.db, "user_create", move |txn| {
            Box::pin(async move {
                if UserRepository::find_by_username(txn, &username).await?.is_some() {
                    return Err(AppError::ValidationError(format!(
                        "username: '{}' is already taken",
                        username
                    )));
                }
                let resolved = resolve_plan(txn, role, plan).await?;
                ensure_within_scope(&actor, &resolved)?;
                let created =
                    UserRepository::create_with_assignment(txn, &username, &full_name, &resolved)
                        .await?;
                Ok(created)
            })
        })
        .await?;

        info!(
            user_id = %created.id,
            role = %created.role,
            task_area_id = ?created.task_area_id,
            "User created"
        );
        Ok(created)
    }

    /// ユーザーの無効化（スーパーユーザーのみ・自分自身は不可）
    ///
    /// 休暇申請や承認履歴が参照しているため行は削除しない。
    pub async fn deactivate_user(
        &self,
        actor: &Principal,
        target_id: Uuid,
    ) -> AppResult<user_model::Model> {
        if !PermissionChecker::can_deactivate_user(actor, target_id) {
            warn!(
                user_id = %actor.user_id,
                target_id = %target_id,
                "User deactivation denied"
            );
            return Err(AppError::Forbidden(
                "Only a superuser can deactivate other users".to_string(),
            ));
        }

        let target = self
            .user_repository
            .find_by_id(target_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", target_id)))?;

        if self.user_repository.deactivate(target_id).await? {
            info!(target_id = %target_id, username = %target.username, "User deactivated");
        } else {
            debug!(target_id = %target_id, "User already inactive");
        }

        Ok(user_model::Model {
            is_active: false,
            ..target
        })
    }

    /// 自分の位置情報を更新
    pub async fn update_location(
        &self,
        actor: &Principal,
        latitude: f64,
        longitude: f64,
        address: Option<String>,
    ) -> AppResult<user_model::Model> {
        if !PermissionChecker::can_update_location(actor) {
            return Err(AppError::Forbidden(format!(
                "Role '{}' does not report a location",
                actor.role
            )));
        }
        validate_coordinates(latitude, longitude).map_err(AppError::ValidationError)?;

        let address = address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        let updated = self
            .user_repository
            .update_location(actor.user_id, latitude, longitude, address)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", actor.user_id)))?;

        debug!(user_id = %actor.user_id, "Location updated");
        Ok(updated)
    }

    /// 参照可能なユーザーの最新位置
    pub async fn locations(&self, actor: &Principal) -> AppResult<Vec<user_model::Model>> {
        if !PermissionChecker::can_view_locations(actor) {
            return Err(AppError::Forbidden(
                "Only managers can view user locations".to_string(),
            ));
        }
        let filter = visibility_filter(actor, ResourceKind::User);
        let users = self.user_repository.find_visible_with_location(&filter).await?;
        Ok(filter.apply(users))
    }
}

async fn resolve_choice<C>(conn: &C, choice: AreaChoice) -> AppResult<Uuid>
where
    C: ConnectionTrait,
{
    match choice {
        AreaChoice::Existing(id) => match TaskAreaRepository::find_by_id(conn, id).await? {
            None => Err(AppError::ValidationError(format!(
                "task_area: task area {} does not exist",
                id
            ))),
            Some(area) if area.is_global() => Err(AppError::ValidationError(format!(
                "task_area: '{}' is reserved for superusers",
                GLOBAL_TASK_AREA_NAME
            ))),
            Some(area) => Ok(area.id),
        },
        AreaChoice::New(name) => Ok(TaskAreaRepository::get_or_create(conn, &name).await?.id),
    }
}

/// 計画中の任務区を実在のIDに解決する（新しい名前はここで作成される）
async fn resolve_plan<C>(conn: &C, role: UserRole, plan: AssignmentPlan) -> AppResult<ResolvedAssignment>
where
    C: ConnectionTrait,
{
    match plan {
        AssignmentPlan::Global => {
            let global = TaskAreaRepository::get_or_create(conn, GLOBAL_TASK_AREA_NAME).await?;
            Ok(ResolvedAssignment::global(global.id))
        }
        AssignmentPlan::Managed(choices) => {
            let mut areas = BTreeSet::new();
            for choice in choices {
                areas.insert(resolve_choice(conn, choice).await?);
            }
            ResolvedAssignment::managed(areas)
        }
        AssignmentPlan::Single(choice) => {
            let area = resolve_choice(conn, choice).await?;
            Ok(ResolvedAssignment::single(role, area))
        }
    }
}

// 自分の管轄外の任務区へは割り当てられない（スーパーユーザーを除く）
fn ensure_within_scope(actor: &Principal, resolved: &ResolvedAssignment) -> AppResult<()> {
    let scope = actor.scope();
    let outside = resolved
        .task_area_id
        .into_iter()
        .chain(resolved.managed_task_areas.iter().copied())
        .any(|area| !scope.contains(Some(area)));

    if outside {
        warn!(
            user_id = %actor.user_id,
            "Role assignment denied: task area outside scope"
        );
        return Err(AppError::Forbidden(
            "Cannot assign a task area outside your scope".to_string(),
        ));
    }
    Ok(())
}
