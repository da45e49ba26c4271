// portal-backend/src/utils/validation.rs

use crate::domain::report_model::ReportType;
use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

/// ログイン名（英数字・アンダースコア・ドット）
pub static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.]+$").unwrap());

/// 週次レポートの期間（例: 2024-W07）
pub static WEEKLY_PERIOD_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-W(0[1-9]|[1-4]\d|5[0-3])$").unwrap());

/// 月次レポートの期間（例: 2024-M03）
pub static MONTHLY_PERIOD_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-M(0[1-9]|1[0-2])$").unwrap());

pub const SUMMARY_PERIOD_MAX_CHARS: usize = 50;

/// レポート種別に応じた期間文字列のチェック
pub fn validate_report_period(report_type: ReportType, period: &str) -> Result<(), String> {
    let period = period.trim();
    let valid = match report_type {
        ReportType::Weekly => WEEKLY_PERIOD_REGEX.is_match(period),
        ReportType::Monthly => MONTHLY_PERIOD_REGEX.is_match(period),
        ReportType::Summary => {
            !period.is_empty() && period.chars().count() <= SUMMARY_PERIOD_MAX_CHARS
        }
    };

    if valid {
        Ok(())
    } else {
        Err(format!(
            "report_period: '{}' is not a valid {} period",
            period, report_type
        ))
    }
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_REGEX.is_match(username) {
        Ok(())
    } else {
        let mut error = ValidationError::new("invalid_username");
        error.message = Some("may only contain letters, digits, '_' and '.'".into());
        Err(error)
    }
}

/// 空白のみの文字列を拒否
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be blank".into());
        Err(error)
    } else {
        Ok(())
    }
}
