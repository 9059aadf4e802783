//! カレンダーバージョン（CalVer）の計算
//!
//! スタックのイメージタグは UTC 日付の `YYYY.MM.DD` 形式。
//! コミット日時から導出する場合も、タイムゾーンは必ず UTC に揃える。

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::fmt;

/// `YYYY.MM.DD` 形式のカレンダーバージョン
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CalVer(NaiveDate);

impl CalVer {
    /// 今日（UTC）のカレンダーバージョン
    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }

    /// コミット日時からカレンダーバージョンを導出
    ///
    /// コミット日時はコミッタのタイムゾーンオフセットを持つため、
    /// UTC に変換してから日付を取り出す。
    pub fn from_commit_date<Tz: TimeZone>(date: &DateTime<Tz>) -> Self {
        Self(date.with_timezone(&Utc).date_naive())
    }
}

impl fmt::Display for CalVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y.%m.%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn test_calver_format_zero_padded() {
        let date = DateTime::parse_from_rfc3339("2024-03-07T10:00:00+00:00").unwrap();
        assert_eq!(CalVer::from_commit_date(&date).to_string(), "2024.03.07");
    }

    #[test]
    fn test_calver_converts_to_utc() {
        // JST の深夜 → UTC では前日
        let date = DateTime::parse_from_rfc3339("2024-03-07T01:30:00+09:00").unwrap();
        assert_eq!(CalVer::from_commit_date(&date).to_string(), "2024.03.06");
    }

    #[test]
    fn test_calver_negative_offset() {
        // 西海岸の夕方 → UTC では翌日
        let date = DateTime::parse_from_rfc3339("2024-12-31T17:00:00-08:00").unwrap();
        assert_eq!(CalVer::from_commit_date(&date).to_string(), "2025.01.01");
    }

    #[test]
    fn test_calver_ordering() {
        let older = DateTime::parse_from_rfc3339("2023-11-01T00:00:00+00:00").unwrap();
        let newer = DateTime::parse_from_rfc3339("2024-02-01T00:00:00+00:00").unwrap();
        assert!(CalVer::from_commit_date(&older) < CalVer::from_commit_date(&newer));
    }
}
