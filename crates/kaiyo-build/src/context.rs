use crate::error::{BuildError, BuildResult};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::path::Path;
use tar::Builder;

pub struct ContextBuilder;

impl ContextBuilder {
    /// ビルドコンテキストをtar.gzアーカイブとして作成
    ///
    /// Dockerfile はコンテキスト内（`Dockerfile` または `binder/Dockerfile`）に
    /// あるため、ディレクトリをそのままアーカイブする。
    pub fn create_context(context_path: &Path) -> BuildResult<Vec<u8>> {
        if !context_path.is_dir() {
            return Err(BuildError::ContextNotFound(context_path.to_path_buf()));
        }

        tracing::debug!("Creating build context from: {}", context_path.display());

        let mut archive_data = Vec::new();
        {
            let encoder = GzEncoder::new(&mut archive_data, Compression::default());
            let mut tar = Builder::new(encoder);
            tar.append_dir_all(".", context_path)
                .map_err(BuildError::Io)?;
            tar.finish().map_err(BuildError::Io)?;
        }

        tracing::debug!("Build context created: {} bytes", archive_data.len());
        Self::check_context_size(archive_data.len());

        Ok(archive_data)
    }

    /// コンテキストサイズのチェックと警告
    fn check_context_size(size: usize) {
        const MAX_CONTEXT_SIZE: usize = 500 * 1024 * 1024; // 500MB

        if size > MAX_CONTEXT_SIZE {
            tracing::warn!(
                "警告: ビルドコンテキストが大きすぎます（{}MB）\n\
                 .dockerignoreファイルで不要なファイルを除外することを推奨します。",
                size / 1024 / 1024
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_create_context() {
        let temp_dir = tempdir().unwrap();

        fs::write(temp_dir.path().join("Dockerfile"), "FROM alpine").unwrap();
        fs::write(temp_dir.path().join("environment.yml"), "dependencies: []").unwrap();

        let binder = temp_dir.path().join("binder");
        fs::create_dir(&binder).unwrap();
        fs::write(binder.join("verify"), "#!/bin/sh\nexit 0").unwrap();

        let archive = ContextBuilder::create_context(temp_dir.path()).unwrap();
        assert!(!archive.is_empty());

        // tarアーカイブとして展開できるか確認
        let extract_dir = tempdir().unwrap();
        let mut reader = std::io::Cursor::new(archive);
        let decoder = flate2::read::GzDecoder::new(&mut reader);
        let mut tar = tar::Archive::new(decoder);
        tar.unpack(extract_dir.path()).unwrap();

        assert!(extract_dir.path().join("Dockerfile").exists());
        assert!(extract_dir.path().join("binder/verify").exists());
    }

    #[test]
    fn test_create_context_missing_dir() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("nonexistent");

        let err = ContextBuilder::create_context(&missing).unwrap_err();
        assert!(matches!(err, BuildError::ContextNotFound(_)));
    }
}
