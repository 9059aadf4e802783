//! イメージ名の解決
//!
//! プレフィックス（レジストリや組織名を含む）とスタックのサブディレクトリ名
//! からイメージ名を組み立てる。タグはここでは扱わない。

use crate::error::{CoreError, Result};
use std::fmt;

/// タグを除いたイメージ名（プレフィックス込み）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageName(String);

impl ImageName {
    /// プレフィックスとサブディレクトリ名からイメージ名を組み立てる
    ///
    /// サブディレクトリ名は単一のパス要素でなければならない。
    pub fn new(prefix: &str, name: &str) -> Result<Self> {
        if name.is_empty() || name.contains('/') || name.contains(':') {
            return Err(CoreError::InvalidImageName(name.to_string()));
        }
        Ok(Self(format!("{}{}", prefix, name)))
    }

    /// onbuild イメージの名前（`-onbuild` サフィックス）
    pub fn onbuild(&self) -> ImageName {
        ImageName(format!("{}-onbuild", self.0))
    }

    /// タグ付きのイメージスペック
    pub fn tagged(&self, tag: &str) -> String {
        format!("{}:{}", self.0, tag)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
