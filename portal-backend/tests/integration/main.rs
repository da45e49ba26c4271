// tests/integration/main.rs
//
// MockDatabase を介してサービス・リポジトリ・ルーターを通しで検証する。

#[path = "../common/mod.rs"]
mod common;

mod alert;
mod leave;
