// portal-backend/src/utils/transaction.rs

//! 複数の書き込みを1つのトランザクションにまとめる
//!
//! ロール割り当て・休暇の状態遷移・ユーザー作成はここを通る。
//! 途中で失敗した場合は全体がロールバックされ、呼び出し元には元のエラーが返る。

use crate::error::{AppError, AppResult};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use tracing::{debug, error, instrument, warn};

pub type TxnFuture<'c, T> = Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'c>>;

/// `operation` を単一トランザクションで実行する
///
/// `unit` はログ上で処理を識別するためのラベル。
/// 状態競合によるロールバックは想定内なので debug で記録する。
#[instrument(skip(db, operation), name = "atomic_unit")]
pub async fn run_atomic<T, F>(
    db: &DatabaseConnection,
    unit: &'static str,
    operation: F,
) -> AppResult<T>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> TxnFuture<'c, T> + Send,
    T: Send,
{
    let started = Instant::now();

    let txn = db.begin().await.map_err(|e| {
        error!(error = %e, "Failed to begin transaction");
        AppError::InternalServerError("Failed to begin transaction".to_string())
    })?;

    let outcome = operation(&txn).await;
    let elapsed_ms = started.elapsed().as_millis();

    match outcome {
        Ok(value) => {
            txn.commit().await.map_err(|e| {
                error!(error = %e, "Failed to commit transaction");
                AppError::InternalServerError("Failed to commit transaction".to_string())
            })?;
            debug!(duration_ms = elapsed_ms, "Committed");
            Ok(value)
        }
        Err(app_error) => {
            if let Err(rollback_error) = txn.rollback().await {
                error!(
                    original_error = %app_error,
                    rollback_error = %rollback_error,
                    "Failed to rollback transaction"
                );
                return Err(AppError::InternalServerError(
                    "Transaction failed and rollback also failed".to_string(),
                ));
            }

            if app_error.is_state_conflict() {
                debug!(duration_ms = elapsed_ms, "Rolled back after losing a concurrent update");
            } else {
                warn!(duration_ms = elapsed_ms, error = %app_error, "Rolled back");
            }
            Err(app_error)
        }
    }
}
