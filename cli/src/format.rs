//! Plain-text rendering helpers for terminal output.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

use ledgerx_engine::{FlashDirection, NoticeKind, NoticeState};

fn currency_symbol(currency: &str) -> Option<&'static str> {
    match currency.to_ascii_uppercase().as_str() {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        _ => None,
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `1234.5, "USD"` -> `$1,234.50`. Unknown currencies keep their code.
pub fn money(value: f64, currency: &str) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    let amount = format!("{}.{cents}", group_thousands(whole));
    match currency_symbol(currency) {
        Some(symbol) => format!("{sign}{symbol}{amount}"),
        None => format!("{sign}{} {amount}", currency.to_ascii_uppercase()),
    }
}

/// Render an API timestamp in `tz`, or `n/a` when it cannot be parsed.
///
/// Timestamps without an offset are taken as already local to `tz`.
pub fn timestamp_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    const PATTERN: &str = "%b %d, %I:%M:%S %p";
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(tz).format(PATTERN).to_string();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        && let Some(local) = tz.from_local_datetime(&naive).earliest()
    {
        return local.format(PATTERN).to_string();
    }
    "n/a".to_string()
}

pub fn timestamp(raw: &str) -> String {
    timestamp_in(raw, &Local)
}

pub fn flash_marker(flash: Option<FlashDirection>) -> &'static str {
    match flash {
        Some(FlashDirection::Up) => " ▲",
        Some(FlashDirection::Down) => " ▼",
        None => "",
    }
}

pub fn notice_line(notice: &NoticeState) -> String {
    let tag = match notice.kind {
        NoticeKind::Waking => "[waking]",
        NoticeKind::Ready => "[ready]",
        NoticeKind::Error => "[error]",
    };
    format!("{tag} {}", notice.message)
}
