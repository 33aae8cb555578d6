//! 时间工具函数: 业务时区转换
//!
//! 订单号日期和按日过滤都以业务时区 (默认 Asia/Kolkata) 的自然日为准，
//! 存储层只保存 UTC。

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// 业务时区下的日期
pub fn business_date(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// 日期开始 (00:00:00) → UTC
///
/// DST gap fallback: 如果本地时间不存在 (夏令时跳跃)，fallback 到 UTC。
pub fn day_start_utc(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    naive
        .and_local_timezone(tz)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// 业务日的 UTC 区间 `[start, end)`
pub fn day_range_utc(date: NaiveDate, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let next_day = date.succ_opt().unwrap_or(date);
    (day_start_utc(date, tz), day_start_utc(next_day, tz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-03-09").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
        );
        assert!(parse_date("09/03/2025").is_err());
    }

    #[test]
    fn test_business_date_crosses_midnight() {
        let tz: Tz = "Asia/Kolkata".parse().unwrap();
        // 2025-01-01 20:00 UTC = 2025-01-02 01:30 IST
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 20, 0, 0).unwrap();
        assert_eq!(
            business_date(now, tz),
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
        );
    }

    #[test]
    fn test_day_range_utc() {
        let tz: Tz = "Asia/Kolkata".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let (start, end) = day_range_utc(date, tz);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 1, 1, 18, 30, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 2, 18, 30, 0).unwrap());
    }
}
