use crate::docker;
use colored::Colorize;
use kaiyo_build::{
    BuildError, CacheDiscovery, ContextBuilder, DockerfileResolver, ImageBuilder, ImagePusher,
    ImageVerifier, RegistryProbe, Repo2Docker,
};
use kaiyo_core::{CalVer, GitHistory, ImageName};
use std::collections::HashMap;
use std::path::Path;

/// onbuild イメージのビルドコンテキスト（スタック共通のディレクトリ）
const ONBUILD_DIR: &str = "onbuild";

/// ビルドコマンドを処理
///
/// スタックルート（カレントディレクトリ）で以下を順に実行する:
/// 1. イメージ名を解決
/// 2. コミット履歴からレジストリ上のキャッシュ候補を探索し、あればpull
/// 3. 今日のCalVerタグでprimaryイメージをビルド（Dockerfile または repo2docker）
/// 4. 検証スクリプトがあればコンテナ内で実行
/// 5. primaryの上にonbuildイメージをビルド
/// 6. --push 指定時は両方をレジストリにプッシュ
pub async fn handle_build_command(
    image_dir: &str,
    image_prefix: &str,
    push: bool,
    no_cache: bool,
) -> anyhow::Result<()> {
    let stack_root = std::env::current_dir()?;
    let image_name = ImageName::new(image_prefix, image_dir)?;

    tracing::debug!("Stack root: {}", stack_root.display());
    println!(
        "{}",
        format!("🌊 {} をビルド中...", image_name).green().bold()
    );

    // Docker接続
    let docker_conn = docker::init_docker_with_error_handling().await?;

    // レジストリからキャッシュ候補を探索
    let cache_from = if no_cache {
        println!("  ℹ キャッシュ探索をスキップします");
        Vec::new()
    } else {
        discover_cache(&docker_conn, &stack_root, image_dir, &image_name).await
    };

    // 今日のCalVerタグ
    let calver = CalVer::today().to_string();
    let image_spec = image_name.tagged(&calver);

    let resolver = DockerfileResolver::new(&stack_root);
    let builder = ImageBuilder::new(docker_conn.clone());
    let verifier = ImageVerifier::new(&stack_root);

    // primary イメージのビルド
    match resolver.resolve_dockerfile(image_dir) {
        Some(dockerfile) => {
            // Dockerfileがある場合はDockerで直接ビルド（CALVERをビルド引数で渡す）
            println!(
                "  → Dockerfile: {}",
                format!("{}/{}", image_dir, dockerfile).cyan()
            );
            println!("  → Image: {}", image_spec.cyan());

            let context_path = resolver.resolve_context(image_dir)?;
            let context_data = ContextBuilder::create_context(&context_path)?;

            let mut build_args = HashMap::new();
            build_args.insert("CALVER".to_string(), calver.clone());

            if let Err(e) = builder
                .build_image(
                    context_data,
                    dockerfile,
                    &image_spec,
                    build_args,
                    &cache_from,
                )
                .await
            {
                eprintln!("  {} {}", "✗".red().bold(), e.user_message());
                return Err(anyhow::anyhow!("ビルドに失敗しました"));
            }
        }
        None => {
            // Dockerfileが無い場合はrepo2dockerでビルド
            println!("  → Backend: {}", "repo2docker".cyan());
            println!("  → Image: {}", image_spec.cyan());

            let r2d =
                Repo2Docker::new(image_dir, &image_spec).with_cache_from(cache_from.clone());
            if let Err(e) = r2d.build() {
                eprintln!("  {} {}", "✗".red().bold(), e.user_message());
                return Err(anyhow::anyhow!("ビルドに失敗しました"));
            }

            // 検証スクリプトがあればコンテナのエントリポイントとして実行
            if verifier.has_verify_script(image_dir) {
                println!("{}", format!("🔍 {} を検証中...", image_spec).blue());
                verifier.run(&image_spec)?;
                println!("  {} 検証完了", "✓".green());
            } else {
                println!("  ℹ 検証スクリプトはありません: {}", image_spec);
            }
        }
    }

    println!("  {} ビルド完了", "✓".green());

    // onbuild イメージのビルド
    let onbuild_name = image_name.onbuild();
    let onbuild_spec = onbuild_name.tagged(&calver);
    println!();
    println!(
        "{}",
        format!("🔨 {} をビルド中...", onbuild_spec).green().bold()
    );

    let onbuild_dockerfile = resolver.resolve_dockerfile(ONBUILD_DIR).ok_or_else(|| {
        BuildError::DockerfileNotFound(stack_root.join(ONBUILD_DIR).join("Dockerfile"))
    })?;
    let onbuild_context = resolver.resolve_context(ONBUILD_DIR)?;
    let onbuild_data = ContextBuilder::create_context(&onbuild_context)?;

    let mut onbuild_args = HashMap::new();
    onbuild_args.insert("BASE_IMAGE_SPEC".to_string(), image_spec.clone());

    if let Err(e) = builder
        .build_image(
            onbuild_data,
            onbuild_dockerfile,
            &onbuild_spec,
            onbuild_args,
            &[],
        )
        .await
    {
        eprintln!("  {} {}", "✗".red().bold(), e.user_message());
        return Err(anyhow::anyhow!("onbuildイメージのビルドに失敗しました"));
    }
    println!("  {} ビルド完了", "✓".green());

    // プッシュ
    if push {
        println!();
        println!("{}", "📤 イメージをプッシュ中...".blue().bold());

        let pusher = ImagePusher::new(docker_conn.clone());
        for name in [&image_name, &onbuild_name] {
            match pusher.push(name.as_str(), &calver).await {
                Ok(pushed) => {
                    println!("  {} {}", "✓".green(), pushed.cyan());
                }
                Err(e) => {
                    eprintln!("  {} プッシュエラー: {}", "✗".red().bold(), e);
                    return Err(anyhow::anyhow!("プッシュに失敗しました"));
                }
            }
        }
    }

    // 完了メッセージ
    println!();
    if push {
        println!(
            "{}",
            format!("✓ {}:{} をビルド＆プッシュしました！", image_name, calver)
                .green()
                .bold()
        );
    } else {
        println!(
            "{}",
            format!("✓ {}:{} をビルドしました！", image_name, calver)
                .green()
                .bold()
        );
    }

    Ok(())
}

/// レジストリからキャッシュ候補を探索し、見つかればpullしてスペックを返す
///
/// レジストリの問い合わせやpullに失敗した場合は、警告を出して
/// キャッシュなしのビルドにフォールバックする。
async fn discover_cache(
    docker_conn: &bollard::Docker,
    stack_root: &Path,
    image_dir: &str,
    image_name: &ImageName,
) -> Vec<String> {
    let history = GitHistory::new(stack_root, image_dir);
    let mut discovery = CacheDiscovery::new(RegistryProbe::new());

    match discovery.discover(&history, image_name) {
        Ok(Some(spec)) => {
            println!("  ♻ キャッシュを再利用: {}", spec.cyan());
            if let Err(e) = docker::pull_image(docker_conn, &spec).await {
                eprintln!("  {} {}", "⚠".yellow(), e);
                println!("  ℹ キャッシュなしでビルドします");
                return Vec::new();
            }
            vec![spec]
        }
        Ok(None) => {
            println!("  ℹ 再利用できるキャッシュはありません");
            Vec::new()
        }
        Err(e) => {
            eprintln!("  {} {}", "⚠".yellow(), e.user_message());
            println!("  ℹ キャッシュなしでビルドします");
            Vec::new()
        }
    }
}
