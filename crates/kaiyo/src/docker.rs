use colored::Colorize;
use futures_util::stream::StreamExt;
use kaiyo_build::RegistryAuth;

/// イメージスペックを名前とタグに分離
///
/// 例: "kaiyo/base:2024.05.01" -> ("kaiyo/base", "2024.05.01")
///     "localhost:5000/base" -> ("localhost:5000/base", "latest")
pub fn parse_image_tag(image: &str) -> (&str, &str) {
    match image.rsplit_once(':') {
        // レジストリのポート番号（localhost:5000/... 等）はタグではない
        Some((name, tag)) if !tag.contains('/') => (name, tag),
        _ => (image, "latest"),
    }
}

/// キャッシュ用の既存イメージをレジストリからpull
pub async fn pull_image(docker: &bollard::Docker, image: &str) -> anyhow::Result<()> {
    let (image_name, tag) = parse_image_tag(image);

    println!("  ↓ キャッシュイメージをプル中: {}", image.cyan());

    // レジストリの認証情報を取得（あれば）
    let credentials = RegistryAuth::new().credentials_for(image).unwrap_or(None);

    #[allow(deprecated)]
    let options = bollard::image::CreateImageOptions {
        from_image: image_name,
        tag,
        ..Default::default()
    };

    #[allow(deprecated)]
    let mut stream = docker.create_image(Some(options), None, credentials);

    while let Some(info) = stream.next().await {
        match info {
            Ok(bollard::models::CreateImageInfo {
                status: Some(status),
                progress: Some(progress),
                ..
            }) => {
                // 進捗を表示（同じ行に上書き）
                print!("\r  ↓ {}: {}", status, progress);
                use std::io::Write;
                std::io::stdout().flush()?;
            }
            Ok(bollard::models::CreateImageInfo {
                status: Some(status),
                ..
            }) => {
                print!("\r  ↓ {}                    ", status);
                use std::io::Write;
                std::io::stdout().flush()?;
            }
            Err(e) => {
                println!();
                return Err(anyhow::anyhow!("イメージのプルに失敗しました: {}", e));
            }
            _ => {}
        }
    }

    println!();
    println!("  ✓ プル完了");

    Ok(())
}

/// Docker接続を初期化（エラーハンドリング付き）
pub async fn init_docker_with_error_handling() -> anyhow::Result<bollard::Docker> {
    let docker = match bollard::Docker::connect_with_local_defaults() {
        Ok(docker) => docker,
        Err(e) => {
            print_connection_hint(&e);
            return Err(anyhow::anyhow!("Docker接続に失敗しました"));
        }
    };

    // 接続テスト
    if let Err(e) = docker.ping().await {
        print_connection_hint(&e);
        return Err(anyhow::anyhow!("Docker接続に失敗しました"));
    }

    Ok(docker)
}

fn print_connection_hint(e: &bollard::errors::Error) {
    eprintln!();
    eprintln!("{}", "✗ Docker接続エラー".red().bold());
    eprintln!();
    eprintln!("{}", "原因:".yellow());
    eprintln!("  {}", e);
    eprintln!();
    eprintln!("{}", "解決方法:".yellow());
    eprintln!("  • Dockerが起動しているか確認してください");
    eprintln!("  • docker ps コマンドが正常に動作するか確認してください");
}
