//! レジストリのキャッシュ探索
//!
//! 直近のコミット履歴から CalVer タグの候補を導出し、レジストリに既に存在
//! する最も新しいイメージを探す。見つかったイメージはビルドのレイヤー
//! キャッシュとして再利用する。

use crate::error::{BuildError, BuildResult};
use crate::progress::DiscoveryProgress;
use kaiyo_core::{CalVer, GitHistory, ImageName};
use std::collections::HashMap;
use std::process::Command;

/// キャッシュ候補として遡るコミット数の上限
pub const MAX_CACHE_PROBES: usize = 100;

/// レジストリ上のイメージ存在確認
pub trait ManifestProbe {
    fn exists(&mut self, spec: &str) -> BuildResult<bool>;
}

/// `docker manifest inspect` によるレジストリ問い合わせ
///
/// 同じ日のコミットは同じタグ候補になるため、結果はスペックごとにメモ化する。
pub struct RegistryProbe {
    memo: HashMap<String, bool>,
}

impl Default for RegistryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryProbe {
    pub fn new() -> Self {
        Self {
            memo: HashMap::new(),
        }
    }
}

impl ManifestProbe for RegistryProbe {
    fn exists(&mut self, spec: &str) -> BuildResult<bool> {
        if let Some(&known) = self.memo.get(spec) {
            return Ok(known);
        }

        let output = Command::new("docker")
            .args(["manifest", "inspect", spec])
            .output()?;

        let exists = if output.status.success() {
            true
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_manifest_unknown(&stderr) {
                false
            } else {
                return Err(BuildError::ManifestInspect {
                    image: spec.to_string(),
                    message: stderr.trim().to_string(),
                });
            }
        };

        tracing::debug!("Registry probe {}: exists={}", spec, exists);
        self.memo.insert(spec.to_string(), exists);
        Ok(exists)
    }
}

/// 「イメージが存在しない」系の応答かどうか
///
/// メッセージの文言はレジストリ実装ごとに異なる。
fn is_manifest_unknown(stderr: &str) -> bool {
    let lower = stderr.to_ascii_lowercase();
    ["manifest unknown", "no such manifest", "name unknown", "not found"]
        .iter()
        .any(|m| lower.contains(m))
}

/// コミット履歴を遡ってキャッシュ候補を探す
pub struct CacheDiscovery<P: ManifestProbe> {
    probe: P,
    max_probes: usize,
}

impl<P: ManifestProbe> CacheDiscovery<P> {
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            max_probes: MAX_CACHE_PROBES,
        }
    }

    /// 上限を指定して作成
    pub fn with_max_probes(probe: P, max_probes: usize) -> Self {
        Self { probe, max_probes }
    }

    /// レジストリに存在する最も新しい CalVer タグ付きイメージを探す
    ///
    /// 対象ディレクトリを変更したコミットを新しい順に最大 `max_probes` 件
    /// 辿り、コミット日のタグがレジストリに存在すればそのスペックを返す。
    /// 履歴が尽きるか上限に達したら `None`。
    pub fn discover(
        &mut self,
        history: &GitHistory,
        image: &ImageName,
    ) -> BuildResult<Option<String>> {
        let progress = DiscoveryProgress::new(image.as_str());

        for n in 1..=self.max_probes {
            let Some(date) = history.modified_date(n)? else {
                break;
            };

            let tag = CalVer::from_commit_date(&date).to_string();
            let candidate = image.tagged(&tag);
            progress.probing(n, self.max_probes, &candidate);

            if self.probe.exists(&candidate)? {
                progress.finish_found(&candidate);
                return Ok(Some(candidate));
            }
        }

        progress.finish_none();
        Ok(None)
    }
}
