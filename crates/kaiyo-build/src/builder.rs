use crate::error::{BuildError, BuildResult};
use bollard::Docker;
use bollard::image::BuildImageOptions;
use colored::Colorize;
use futures_util::stream::StreamExt;
use std::collections::HashMap;

pub struct ImageBuilder {
    docker: Docker,
}

impl ImageBuilder {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// イメージをビルド
    ///
    /// # Arguments
    /// * `context_data` - tar.gz形式のビルドコンテキスト
    /// * `dockerfile` - コンテキスト内のDockerfileの相対パス
    /// * `tag` - ビルドするイメージのスペック（`name:tag`）
    /// * `build_args` - `--build-arg` 相当のビルド引数
    /// * `cache_from` - レイヤーキャッシュとして利用する既存イメージ
    pub async fn build_image(
        &self,
        context_data: Vec<u8>,
        dockerfile: &str,
        tag: &str,
        build_args: HashMap<String, String>,
        cache_from: &[String],
    ) -> BuildResult<()> {
        tracing::info!("Building image: {}", tag);

        // build_argsを&str型に変換
        let build_args_refs: HashMap<&str, &str> = build_args
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let options = BuildImageOptions {
            dockerfile,
            t: tag,
            buildargs: build_args_refs,
            cachefrom: cache_from.iter().map(String::as_str).collect(),
            rm: true,      // 中間コンテナを削除
            forcerm: true, // ビルド失敗時も中間コンテナを削除
            ..Default::default()
        };

        tracing::debug!("Build options: {:?}", options);
        if !build_args.is_empty() {
            tracing::debug!("Build args: {:?}", build_args);
        }

        // ビルドストリームの開始
        use bytes::Bytes;
        use http_body_util::{Either, Full};
        let context_bytes = Bytes::from(context_data);
        let body = Full::new(context_bytes);
        let mut stream = self
            .docker
            .build_image(options, None, Some(Either::Left(body)));

        // ビルド進捗の表示
        while let Some(msg) = stream.next().await {
            match msg {
                Ok(output) => {
                    self.handle_build_output(output)?;
                }
                Err(e) => {
                    return Err(BuildError::DockerConnection(e));
                }
            }
        }

        tracing::info!("Successfully built: {}", tag);
        Ok(())
    }

    /// ビルド出力の処理
    fn handle_build_output(&self, output: bollard::models::BuildInfo) -> BuildResult<()> {
        if let Some(stream) = output.stream {
            // ビルドステップの出力
            print!("{}", stream);
        }

        if let Some(error) = output.error {
            return Err(BuildError::BuildFailed(error));
        }

        if let Some(error_detail) = output.error_detail {
            let error_msg = error_detail
                .message
                .unwrap_or_else(|| "Unknown build error".to_string());
            return Err(BuildError::BuildFailed(error_msg));
        }

        if let Some(status) = output.status {
            // ステータスメッセージ（pull等）
            println!("{}", status.cyan());
        }

        Ok(())
    }
}
