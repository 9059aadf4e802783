//! git 履歴の探索
//!
//! キャッシュ候補を探すため、対象ディレクトリを変更した過去のコミット日時を
//! 新しい順に取得する。

use crate::error::{CoreError, Result};
use chrono::{DateTime, FixedOffset};
use std::path::PathBuf;
use std::process::Command;

/// 対象パスの変更履歴を git log で辿る
pub struct GitHistory {
    repo_root: PathBuf,
    path: String,
}

impl GitHistory {
    /// リポジトリルートと探索対象パス（リポジトリからの相対）を指定して作成
    pub fn new(repo_root: impl Into<PathBuf>, path: impl Into<String>) -> Self {
        Self {
            repo_root: repo_root.into(),
            path: path.into(),
        }
    }

    /// 対象パスを変更した n 番目（1 始まり、新しい順）のコミット日時
    ///
    /// 履歴が n 件に満たない場合は `None` を返す。
    pub fn modified_date(&self, n: usize) -> Result<Option<DateTime<FixedOffset>>> {
        let output = Command::new("git")
            .arg("log")
            .arg("-n")
            .arg(n.to_string())
            .arg("--pretty=format:%cd")
            .arg("--date=iso-strict")
            .arg("--")
            .arg(&self.path)
            .current_dir(&self.repo_root)
            .output()?;

        if !output.status.success() {
            return Err(CoreError::GitLog {
                path: self.repo_root.clone(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let lines: Vec<&str> = stdout.lines().filter(|l| !l.trim().is_empty()).collect();

        // 履歴が尽きると git log は要求した件数より少ない行を返す
        if lines.len() < n {
            tracing::debug!(
                "History for '{}' exhausted after {} commits",
                self.path,
                lines.len()
            );
            return Ok(None);
        }

        parse_commit_date(lines[n - 1]).map(Some)
    }
}

/// `--date=iso-strict`（RFC 3339）形式のコミット日時をパース
fn parse_commit_date(value: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value.trim()).map_err(|source| CoreError::CommitDate {
        value: value.trim().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::process::Command;
    use tempfile::tempdir;

    #[test]
    fn test_parse_commit_date() {
        let date = parse_commit_date("2024-05-01T12:00:00+09:00").unwrap();
        assert_eq!(date.to_rfc3339(), "2024-05-01T12:00:00+09:00");
    }

    #[test]
    fn test_parse_commit_date_trims_whitespace() {
        assert!(parse_commit_date("  2024-05-01T12:00:00+00:00\n").is_ok());
    }

    #[test]
    fn test_parse_commit_date_invalid() {
        let err = parse_commit_date("Wed May 1 12:00:00 2024").unwrap_err();
        assert!(matches!(err, CoreError::CommitDate { .. }));
    }

    fn git(dir: &std::path::Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(dir)
            .env("GIT_AUTHOR_DATE", "2024-05-01T12:00:00+09:00")
            .env("GIT_COMMITTER_DATE", "2024-05-01T12:00:00+09:00")
            .status()
            .expect("failed to run git");
        assert!(status.success(), "git {:?} failed", args);
    }

    #[test]
    fn test_modified_date_in_real_repository() {
        let temp = tempdir().unwrap();
        git(temp.path(), &["init", "-q"]);

        fs::create_dir(temp.path().join("base")).unwrap();
        fs::write(temp.path().join("base/environment.yml"), "dependencies: []").unwrap();
        git(temp.path(), &["add", "."]);
        git(
            temp.path(),
            &[
                "-c",
                "user.name=kaiyo-test",
                "-c",
                "user.email=test@example.com",
                "commit",
                "-q",
                "-m",
                "add base",
            ],
        );

        let history = GitHistory::new(temp.path(), "base");
        let first = history.modified_date(1).unwrap().unwrap();
        assert_eq!(first.to_rfc3339(), "2024-05-01T12:00:00+09:00");

        // 履歴は 1 件のみなので 2 番目は存在しない
        assert!(history.modified_date(2).unwrap().is_none());

        // 対象パスを触っていないコミットはカウントされない
        let other = GitHistory::new(temp.path(), "notebook");
        assert!(other.modified_date(1).unwrap().is_none());
    }

    #[test]
    fn test_modified_date_outside_repository() {
        let temp = tempdir().unwrap();
        let history = GitHistory::new(temp.path(), ".");
        assert!(history.modified_date(1).is_err());
    }
}
