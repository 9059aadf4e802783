use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Dockerfile not found: {0}")]
    DockerfileNotFound(PathBuf),

    #[error("Build context directory not found: {0}")]
    ContextNotFound(PathBuf),

    #[error("Docker connection error: {0}")]
    DockerConnection(#[from] bollard::errors::Error),

    #[error("Build failed: {0}")]
    BuildFailed(String),

    #[error("repo2docker failed: {0}")]
    Repo2DockerFailed(String),

    #[error("Registry lookup failed for {image}: {message}")]
    ManifestInspect { image: String, message: String },

    #[error("Verification failed for {image}: {status}")]
    VerifyFailed { image: String, status: String },

    #[error("Push failed: {message}")]
    PushFailed { message: String },

    #[error("Invalid image tag: {tag}")]
    InvalidTag { tag: String },

    #[error("Registry auth failed for {registry}: {message}")]
    AuthFailed { registry: String, message: String },

    #[error(transparent)]
    Core(#[from] kaiyo_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            BuildError::ContextNotFound(path) => {
                format!(
                    "ビルドコンテキストが見つかりません: {}\n\
                     \n\
                     スタックのルートで実行しているか確認してください。",
                    path.display()
                )
            }
            BuildError::BuildFailed(msg) => {
                format!(
                    "ビルドに失敗しました: {}\n\
                     \n\
                     Dockerfileの内容を確認してください。",
                    msg
                )
            }
            BuildError::Repo2DockerFailed(msg) => {
                format!(
                    "repo2docker のビルドに失敗しました: {}\n\
                     \n\
                     環境定義（environment.yml 等）の内容を確認してください。",
                    msg
                )
            }
            BuildError::ManifestInspect { image, message } => {
                format!(
                    "レジストリの問い合わせに失敗しました: {}\n\
                     理由: {}\n\
                     \n\
                     --no-cache でキャッシュ探索を省略できます。",
                    image, message
                )
            }
            _ => format!("{}", self),
        }
    }
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;
