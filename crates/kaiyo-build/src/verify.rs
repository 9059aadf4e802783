//! ビルド済みイメージの検証
//!
//! イメージディレクトリに `binder/verify` が存在する場合、ビルドしたばかりの
//! イメージのエントリポイントとして実行する。スクリプトはイメージ内にも
//! 同じ相対パスで取り込まれている前提（スタックの規約）。

use crate::error::{BuildError, BuildResult};
use std::path::PathBuf;
use std::process::Command;

/// 検証スクリプトの規約パス（ホスト側・イメージ内で共通）
const VERIFY_SCRIPT: &str = "binder/verify";

pub struct ImageVerifier {
    stack_root: PathBuf,
}

impl ImageVerifier {
    pub fn new(stack_root: impl Into<PathBuf>) -> Self {
        Self {
            stack_root: stack_root.into(),
        }
    }

    /// 検証スクリプトがホスト側に存在するか
    pub fn has_verify_script(&self, image_dir: &str) -> bool {
        self.stack_root.join(image_dir).join(VERIFY_SCRIPT).exists()
    }

    /// 検証スクリプトをコンテナのエントリポイントとして実行
    pub fn run(&self, image_spec: &str) -> BuildResult<()> {
        tracing::info!("Validating {}", image_spec);

        let status = Command::new("docker")
            .args(["run", "--rm", "-i", "-t", image_spec, VERIFY_SCRIPT])
            .status()?;

        if !status.success() {
            return Err(BuildError::VerifyFailed {
                image: image_spec.to_string(),
                status: status.to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_has_verify_script() {
        let temp = tempdir().unwrap();
        let binder = temp.path().join("ocean/binder");
        fs::create_dir_all(&binder).unwrap();
        fs::write(binder.join("verify"), "#!/bin/sh\npython -c 'import xarray'").unwrap();

        let verifier = ImageVerifier::new(temp.path());
        assert!(verifier.has_verify_script("ocean"));
        assert!(!verifier.has_verify_script("base"));
    }
}
