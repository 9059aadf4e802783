use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("git の実行に失敗しました: {0}")]
    GitSpawn(#[from] std::io::Error),

    #[error("git log が失敗しました: {path}\n理由: {message}")]
    GitLog { path: PathBuf, message: String },

    #[error("コミット日時を解釈できません: {value}")]
    CommitDate {
        value: String,
        source: chrono::ParseError,
    },

    #[error("無効なイメージ名: {0}\nヒント: スタックのサブディレクトリ名を指定してください")]
    InvalidImageName(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
