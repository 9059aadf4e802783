//! レジストリ認証
//!
//! `~/.docker/config.json` の auths エントリと credential helper から
//! bollard の DockerCredentials を組み立てる。認証情報が無いことはエラー
//! ではない（公開レジストリには匿名でアクセスできる）。

use crate::error::{BuildError, BuildResult};
use base64::Engine;
use bollard::auth::DockerCredentials;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Docker config.json の構造（必要な部分のみ）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DockerConfig {
    #[serde(default)]
    auths: HashMap<String, AuthEntry>,
    /// credential helper 名（例: "osxkeychain", "desktop"）
    #[serde(default)]
    creds_store: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthEntry {
    /// Base64エンコードされた "username:password"
    auth: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HelperResponse {
    username: String,
    secret: String,
}

/// レジストリ認証を管理
#[derive(Debug)]
pub struct RegistryAuth {
    config_path: PathBuf,
}

impl Default for RegistryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryAuth {
    /// デフォルトで `$DOCKER_CONFIG/config.json`（無ければ `~/.docker/config.json`）を使用
    pub fn new() -> Self {
        let config_dir = std::env::var("DOCKER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|h| h.join(".docker"))
                    .unwrap_or_else(|| PathBuf::from(".docker"))
            });

        Self {
            config_path: config_dir.join("config.json"),
        }
    }

    /// 指定したパスの config.json を使用
    pub fn with_config_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// イメージ名からレジストリの認証情報を取得
    pub fn credentials_for(&self, image: &str) -> BuildResult<Option<DockerCredentials>> {
        let registry = registry_host(image);

        // config.json が存在しない場合は認証なしで続行
        if !self.config_path.exists() {
            tracing::debug!("Docker config.json not found at {:?}", self.config_path);
            return Ok(None);
        }

        let config = self.load_config()?;

        // 1. auths セクションを確認
        if let Some(entry) = config.auths.get(&registry) {
            if let Some(auth_b64) = &entry.auth {
                if let Some(creds) = decode_auth(auth_b64, &registry)? {
                    tracing::debug!("Found credentials in auths for {}", registry);
                    return Ok(Some(creds));
                }
            }
        }

        // 2. credential helper を確認
        if let Some(helper) = &config.creds_store {
            tracing::debug!("Trying credential helper: {}", helper);
            if let Ok(Some(creds)) = query_helper(helper, &registry) {
                return Ok(Some(creds));
            }
        }

        tracing::debug!("No credentials found for {}", registry);
        Ok(None)
    }

    fn load_config(&self) -> BuildResult<DockerConfig> {
        let content =
            std::fs::read_to_string(&self.config_path).map_err(|e| BuildError::AuthFailed {
                registry: self.config_path.display().to_string(),
                message: format!("Failed to read config.json: {}", e),
            })?;

        serde_json::from_str(&content).map_err(|e| BuildError::AuthFailed {
            registry: self.config_path.display().to_string(),
            message: format!("Failed to parse config.json: {}", e),
        })
    }
}

/// イメージ名からレジストリホストを抽出
///
/// # Examples
/// - `ghcr.io/kaiyo/base:tag` -> `ghcr.io`
/// - `kaiyo/base:tag` -> `docker.io`
/// - `localhost:5000/base` -> `localhost:5000`
pub fn registry_host(image: &str) -> String {
    let parts: Vec<&str> = image.split('/').collect();

    if parts.len() >= 2 {
        let first = parts[0];
        // ホストは `.`（ghcr.io 等）か `:`（localhost:5000 等）を含む
        if first.contains('.') || first.contains(':') {
            return first.to_string();
        }
    }

    // デフォルトは Docker Hub
    "docker.io".to_string()
}

/// Base64エンコードされた認証情報をデコード
fn decode_auth(auth_b64: &str, registry: &str) -> BuildResult<Option<DockerCredentials>> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(auth_b64)
        .map_err(|e| BuildError::AuthFailed {
            registry: registry.to_string(),
            message: format!("Failed to decode auth: {}", e),
        })?;

    let auth_str = String::from_utf8(decoded).map_err(|e| BuildError::AuthFailed {
        registry: registry.to_string(),
        message: format!("Invalid UTF-8 in auth: {}", e),
    })?;

    match auth_str.split_once(':') {
        Some((username, password)) => Ok(Some(DockerCredentials {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            serveraddress: Some(registry.to_string()),
            ..Default::default()
        })),
        None => Ok(None),
    }
}

/// credential helper から認証情報を取得
fn query_helper(helper: &str, registry: &str) -> BuildResult<Option<DockerCredentials>> {
    let helper_cmd = format!("docker-credential-{}", helper);

    let mut child = Command::new(&helper_cmd)
        .arg("get")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| BuildError::AuthFailed {
            registry: registry.to_string(),
            message: format!("Failed to run {}: {}", helper_cmd, e),
        })?;

    // レジストリ名を stdin に渡す
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(registry.as_bytes()).ok();
    }

    let output = child.wait_with_output().map_err(|e| BuildError::AuthFailed {
        registry: registry.to_string(),
        message: format!("Credential helper failed: {}", e),
    })?;

    if !output.status.success() {
        // helper が認証情報を持っていない場合は None
        tracing::debug!(
            "Credential helper returned error for {}: {}",
            registry,
            String::from_utf8_lossy(&output.stderr)
        );
        return Ok(None);
    }

    let response: HelperResponse =
        serde_json::from_slice(&output.stdout).map_err(|e| BuildError::AuthFailed {
            registry: registry.to_string(),
            message: format!("Failed to parse credential helper response: {}", e),
        })?;

    Ok(Some(DockerCredentials {
        username: Some(response.username),
        password: Some(response.secret),
        serveraddress: Some(registry.to_string()),
        ..Default::default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_registry_host_with_domain() {
        assert_eq!(registry_host("ghcr.io/kaiyo/base"), "ghcr.io");
        assert_eq!(registry_host("ghcr.io/kaiyo/base:2024.05.01"), "ghcr.io");
        assert_eq!(registry_host("quay.io/kaiyo/ocean"), "quay.io");
    }

    #[test]
    fn test_registry_host_docker_hub_default() {
        assert_eq!(registry_host("kaiyo/base"), "docker.io");
        assert_eq!(registry_host("kaiyo/base:2024.05.01"), "docker.io");
        assert_eq!(registry_host("alpine"), "docker.io");
    }

    #[test]
    fn test_registry_host_with_port() {
        assert_eq!(registry_host("localhost:5000/base"), "localhost:5000");
    }

    #[test]
    fn test_credentials_from_auths_section() {
        let temp = tempdir().unwrap();
        let config_path = temp.path().join("config.json");
        // "user:pass" の base64
        fs::write(
            &config_path,
            r#"{"auths": {"ghcr.io": {"auth": "dXNlcjpwYXNz"}}}"#,
        )
        .unwrap();

        let auth = RegistryAuth::with_config_path(config_path);
        let creds = auth
            .credentials_for("ghcr.io/kaiyo/base:2024.05.01")
            .unwrap()
            .unwrap();

        assert_eq!(creds.username.as_deref(), Some("user"));
        assert_eq!(creds.password.as_deref(), Some("pass"));
        assert_eq!(creds.serveraddress.as_deref(), Some("ghcr.io"));
    }

    #[test]
    fn test_credentials_missing_config_is_none() {
        let temp = tempdir().unwrap();
        let auth = RegistryAuth::with_config_path(temp.path().join("missing.json"));
        assert!(auth.credentials_for("kaiyo/base").unwrap().is_none());
    }

    #[test]
    fn test_credentials_unknown_registry_is_none() {
        let temp = tempdir().unwrap();
        let config_path = temp.path().join("config.json");
        fs::write(
            &config_path,
            r#"{"auths": {"ghcr.io": {"auth": "dXNlcjpwYXNz"}}}"#,
        )
        .unwrap();

        let auth = RegistryAuth::with_config_path(config_path);
        assert!(auth.credentials_for("quay.io/kaiyo/base").unwrap().is_none());
    }

    #[test]
    fn test_credentials_broken_config_is_error() {
        let temp = tempdir().unwrap();
        let config_path = temp.path().join("config.json");
        fs::write(&config_path, "{not json").unwrap();

        let auth = RegistryAuth::with_config_path(config_path);
        assert!(matches!(
            auth.credentials_for("ghcr.io/kaiyo/base"),
            Err(BuildError::AuthFailed { .. })
        ));
    }
}
