mod build;
mod docker;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "kaiyo")]
#[command(about = "積む。再利用する。科学計算環境は、日付で刻む。", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// スタックのイメージをビルド
    Build {
        /// ビルドするイメージ名（同名のサブディレクトリが必要）
        image: String,
        /// イメージ名のプレフィックス（レジストリや組織名を含む）
        #[arg(long, env = "KAIYO_IMAGE_PREFIX", default_value = "kaiyo/")]
        image_prefix: String,
        /// ビルド後にレジストリにプッシュ
        #[arg(long)]
        push: bool,
        /// レジストリのキャッシュ探索をスキップ
        #[arg(long)]
        no_cache: bool,
    },
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログはstderrに出力（RUST_LOGで制御）
    tracing_subscriber::fmt::init();

    match cli.command {
        Commands::Build {
            image,
            image_prefix,
            push,
            no_cache,
        } => {
            build::handle_build_command(&image, &image_prefix, push, no_cache).await?;
        }
        Commands::Version => {
            println!("kaiyo {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
