//! 通用工具函数

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

/// 生成唯一标识符
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// 解析出生日期，支持 `YYYY-MM-DD` 与 RFC 3339 两种格式
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
}

/// 将日期规范化为当天零点 (UTC)
pub fn normalize_date(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

/// 多种展示格式的日期时间
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedDateTime {
    /// `Oct 17, 2023, 8:00 AM`
    pub date_time: String,
    /// `Tue, 10/17/2023`
    pub date_day: String,
    /// `Oct 17, 2023`
    pub date_only: String,
    /// `8:00 AM`
    pub time_only: String,
}

/// 格式化预约时间
pub fn format_date_time(value: &DateTime<Utc>) -> FormattedDateTime {
    FormattedDateTime {
        date_time: value.format("%b %-d, %Y, %-I:%M %p").to_string(),
        date_day: value.format("%a, %m/%d/%Y").to_string(),
        date_only: value.format("%b %-d, %Y").to_string(),
        time_only: value.format("%-I:%M %p").to_string(),
    }
}

/// HTML文本转义
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
