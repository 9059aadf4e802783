//! repo2docker の呼び出し
//!
//! Dockerfile を持たないイメージディレクトリは repo2docker でビルドする。
//! repo2docker は外部コマンドとして呼び出し、出力はそのまま端末に流す。

use crate::error::{BuildError, BuildResult};
use std::process::Command;

/// repo2docker のデフォルトコマンド名（`KAIYO_R2D_BIN` で上書き可能）
const DEFAULT_PROGRAM: &str = "repo2docker";

/// Jupyter系イメージの規約ユーザー
const USER_ID: u32 = 1000;
const USER_NAME: &str = "jovyan";

/// repo2docker によるイメージビルド
pub struct Repo2Docker {
    program: String,
    subdir: String,
    image_spec: String,
    cache_from: Vec<String>,
}

impl Repo2Docker {
    pub fn new(subdir: impl Into<String>, image_spec: impl Into<String>) -> Self {
        let program =
            std::env::var("KAIYO_R2D_BIN").unwrap_or_else(|_| DEFAULT_PROGRAM.to_string());
        Self {
            program,
            subdir: subdir.into(),
            image_spec: image_spec.into(),
            cache_from: Vec::new(),
        }
    }

    /// レイヤーキャッシュとして利用する既存イメージを指定
    pub fn with_cache_from(mut self, cache_from: Vec<String>) -> Self {
        self.cache_from = cache_from;
        self
    }

    /// repo2docker に渡す引数列
    fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-run".to_string(),
            "--user-id".to_string(),
            USER_ID.to_string(),
            "--user-name".to_string(),
            USER_NAME.to_string(),
            "--image-name".to_string(),
            self.image_spec.clone(),
        ];

        for cache in &self.cache_from {
            args.push("--cache-from".to_string());
            args.push(cache.clone());
        }

        args.push("--subdir".to_string());
        args.push(self.subdir.clone());
        args.push(".".to_string());

        args
    }

    /// ビルドを実行
    ///
    /// repo2docker の出力は継承した stdout/stderr にそのまま流れる。
    pub fn build(&self) -> BuildResult<()> {
        tracing::info!("Building {} with repo2docker", self.image_spec);
        tracing::debug!("{} {}", self.program, self.args().join(" "));

        let status = Command::new(&self.program)
            .args(self.args())
            .status()
            .map_err(|e| {
                BuildError::Repo2DockerFailed(format!(
                    "{} を起動できません: {}",
                    self.program, e
                ))
            })?;

        if !status.success() {
            return Err(BuildError::Repo2DockerFailed(format!(
                "exit status: {}",
                status
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_without_cache() {
        let r2d = Repo2Docker::new("base", "kaiyo/base:2024.05.01");
        assert_eq!(
            r2d.args(),
            vec![
                "--no-run",
                "--user-id",
                "1000",
                "--user-name",
                "jovyan",
                "--image-name",
                "kaiyo/base:2024.05.01",
                "--subdir",
                "base",
                ".",
            ]
        );
    }

    #[test]
    fn test_args_with_cache_from() {
        let r2d = Repo2Docker::new("ocean", "kaiyo/ocean:2024.05.01")
            .with_cache_from(vec!["kaiyo/ocean:2024.04.28".to_string()]);

        let args = r2d.args();
        let pos = args.iter().position(|a| a == "--cache-from").unwrap();
        assert_eq!(args[pos + 1], "kaiyo/ocean:2024.04.28");
        // キャッシュ指定はリポジトリパスより前
        assert_eq!(args.last().unwrap(), ".");
    }

    #[test]
    fn test_build_failure_for_missing_program() {
        let mut r2d = Repo2Docker::new("base", "kaiyo/base:2024.05.01");
        r2d.program = "kaiyo-nonexistent-r2d".to_string();

        let err = r2d.build().unwrap_err();
        assert!(matches!(err, BuildError::Repo2DockerFailed(_)));
    }
}
