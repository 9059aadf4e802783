//! Kaiyo のコアロジック
//!
//! イメージ名の解決、カレンダーバージョンの計算、git 履歴の探索を提供する。
//! Docker やレジストリへの依存はここには置かない。

pub mod calver;
pub mod error;
pub mod history;
pub mod image;

pub use calver::CalVer;
pub use error::{CoreError, Result};
pub use history::GitHistory;
pub use image::ImageName;
