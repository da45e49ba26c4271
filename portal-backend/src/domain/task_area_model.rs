// portal-backend/src/domain/task_area_model.rs

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

/// スーパーユーザーが紐づく全体任務区の名前
pub const GLOBAL_TASK_AREA_NAME: &str = "global";

pub const TASK_AREA_NAME_MIN_CHARS: usize = 2;
pub const TASK_AREA_NAME_MAX_CHARS: usize = 30;

/// 任務区エンティティ
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "task_areas")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub name: String,

    #[sea_orm(nullable)]
    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_model::Entity")]
    Users,
}

impl Related<super::user_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            created_at: Set(Utc::now()),
            ..ActiveModelTrait::default()
        }
    }
}

impl Model {
    pub fn is_global(&self) -> bool {
        self.name == GLOBAL_TASK_AREA_NAME
    }
}

// 他のフォーム項目の値が任務区名に紛れ込むのを防ぐための予約語
static RESERVED_NAME_TOKENS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "password",
        "email",
        "date",
        "phone",
        "passport",
        "department",
        "position",
        "permission",
        "expiry",
        "等级",
        "员工等",
        "权限",
        "禁止",
        "系统",
        "护照",
        "信息",
        "密码",
        "邮箱",
        "电话",
        "部门",
        "职位",
        "姓名",
        "拼音",
        "号码",
        "日期",
        "时间",
        "开始",
        "结束",
        "签发",
        "到期",
    ]
});

const FORBIDDEN_NAME_CHARS: [char; 8] = ['<', '>', '{', '}', '[', ']', '|', '\\'];

/// 任務区名の検証。正規化（trim）した名前を返す。
pub fn validate_task_area_name(raw: &str) -> Result<String, String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err("Task area name must not be empty".to_string());
    }

    let length = name.chars().count();
    if length < TASK_AREA_NAME_MIN_CHARS {
        return Err(format!(
            "Task area name must be at least {} characters",
            TASK_AREA_NAME_MIN_CHARS
        ));
    }
    if length > TASK_AREA_NAME_MAX_CHARS {
        return Err(format!(
            "Task area name must be at most {} characters",
            TASK_AREA_NAME_MAX_CHARS
        ));
    }

    if name.chars().any(|c| FORBIDDEN_NAME_CHARS.contains(&c)) {
        return Err("Task area name contains forbidden characters".to_string());
    }

    let lowered = name.to_lowercase();
    if let Some(token) = RESERVED_NAME_TOKENS
        .iter()
        .find(|token| lowered.contains(*token))
    {
        return Err(format!(
            "Task area name must not contain descriptive word '{}'",
            token
        ));
    }

    Ok(name.to_string())
}

pub fn is_valid_task_area_name(raw: &str) -> bool {
    validate_task_area_name(raw).is_ok()
}
