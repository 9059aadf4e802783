//! イメージプッシュ処理
//!
//! ビルドしたイメージ（primary と onbuild）をコンテナレジストリにプッシュする。

use crate::auth::RegistryAuth;
use crate::error::{BuildError, BuildResult};
use bollard::Docker;
use colored::Colorize;
use futures_util::StreamExt;
use std::io::Write;

/// イメージプッシュを実行するハンドラ
pub struct ImagePusher {
    docker: Docker,
    auth: RegistryAuth,
}

impl ImagePusher {
    pub fn new(docker: Docker) -> Self {
        Self {
            docker,
            auth: RegistryAuth::new(),
        }
    }

    /// 認証情報マネージャーを指定して作成
    pub fn with_auth(docker: Docker, auth: RegistryAuth) -> Self {
        Self { docker, auth }
    }

    /// イメージをレジストリにプッシュ
    ///
    /// # Arguments
    /// * `image` - イメージ名（タグなし）
    /// * `tag` - CalVer タグ
    ///
    /// # Returns
    /// プッシュ成功時は完全なイメージスペックを返す
    pub async fn push(&self, image: &str, tag: &str) -> BuildResult<String> {
        validate_tag(tag)?;

        let full_image = format!("{}:{}", image, tag);
        let credentials = self.auth.credentials_for(&full_image)?;

        #[allow(deprecated)]
        let options = bollard::image::PushImageOptions::<String> {
            tag: tag.to_string(),
        };

        println!("  → {}", full_image.cyan());

        #[allow(deprecated)]
        let mut stream = self.docker.push_image(image, Some(options), credentials);

        while let Some(result) = stream.next().await {
            let info = result.map_err(|e| BuildError::PushFailed {
                message: e.to_string(),
            })?;

            if let Some(err) = info.error {
                println!();
                return Err(BuildError::PushFailed { message: err });
            }

            if let Some(status) = &info.status {
                match status.as_str() {
                    "Pushing" => {
                        let progress = info.progress.as_deref().unwrap_or("");
                        print!("\r  ↑ {} {}     ", status, progress);
                        std::io::stdout().flush().ok();
                    }
                    "Pushed" | "Layer already exists" => {
                        println!("\r  {} {}                    ", "✓".green(), status);
                    }
                    "Preparing" | "Waiting" => {
                        // 準備中は表示をスキップ（ノイズ軽減）
                    }
                    _ => {
                        println!("\r  ℹ {}                    ", status);
                    }
                }
            }
        }

        println!();
        Ok(full_image)
    }
}

/// タグのバリデーション
///
/// Docker タグの制約:
/// - 128文字以下
/// - 英数字、ピリオド、ハイフン、アンダースコアのみ
/// - 先頭はピリオドまたはハイフンではない
pub fn validate_tag(tag: &str) -> BuildResult<()> {
    if tag.is_empty() {
        return Err(BuildError::InvalidTag {
            tag: "(empty)".to_string(),
        });
    }

    if tag.len() > 128 {
        return Err(BuildError::InvalidTag {
            tag: format!("Tag too long ({} characters, max 128)", tag.len()),
        });
    }

    if tag.starts_with('.') || tag.starts_with('-') {
        return Err(BuildError::InvalidTag {
            tag: tag.to_string(),
        });
    }

    for c in tag.chars() {
        if !c.is_ascii_alphanumeric() && c != '.' && c != '-' && c != '_' {
            return Err(BuildError::InvalidTag {
                tag: format!("Invalid character '{}' in tag: {}", c, tag),
            });
        }
    }

    Ok(())
}
