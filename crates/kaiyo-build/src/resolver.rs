use crate::error::{BuildError, BuildResult};
use std::path::PathBuf;

/// スタック内のイメージディレクトリからDockerfileとコンテキストを解決する
pub struct DockerfileResolver {
    stack_root: PathBuf,
}

impl DockerfileResolver {
    pub fn new(stack_root: impl Into<PathBuf>) -> Self {
        Self {
            stack_root: stack_root.into(),
        }
    }

    /// Dockerfileのコンテキスト内相対パスを解決
    ///
    /// 検索順序:
    /// 1. `<dir>/Dockerfile`
    /// 2. `<dir>/binder/Dockerfile`
    ///
    /// どちらも存在しない場合は `None`（repo2docker バックエンドで対応）。
    pub fn resolve_dockerfile(&self, image_dir: &str) -> Option<&'static str> {
        let candidates = ["Dockerfile", "binder/Dockerfile"];

        for candidate in candidates {
            let path = self.stack_root.join(image_dir).join(candidate);
            if path.exists() {
                tracing::debug!(
                    "Found Dockerfile for image '{}' at: {}",
                    image_dir,
                    path.display()
                );
                return Some(candidate);
            }
        }

        None
    }

    /// ビルドコンテキストのパスを解決
    ///
    /// コンテキストはイメージディレクトリそのもの。
    pub fn resolve_context(&self, image_dir: &str) -> BuildResult<PathBuf> {
        let context = self.stack_root.join(image_dir);

        if !context.exists() {
            return Err(BuildError::ContextNotFound(context));
        }

        if !context.is_dir() {
            return Err(BuildError::ContextNotFound(context));
        }

        Ok(context)
    }
}
