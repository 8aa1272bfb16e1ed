use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};

use crate::config::{BUSINESS_TZ_OFFSET_HOURS, VALIDITY_WINDOW_DAYS};

/// Date formats the extractor is known to emit, tried in order. The model
/// contract is DD.MM.YYYY, but the contract is not guaranteed.
const DATE_FORMATS: &[&str] = &["%d.%m.%Y", "%Y-%m-%d", "%d/%m/%Y"];

/// Parse an extracted document date. None when no known format matches.
pub fn parse_doc_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// The fixed civil time zone all date checks run in.
pub fn business_offset() -> FixedOffset {
    FixedOffset::east_opt(BUSINESS_TZ_OFFSET_HOURS * 3600)
        .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap())
}

/// Current instant in the business time zone.
pub fn now_business() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&business_offset())
}

/// A document date is valid while `now <= date + 30 days`, inclusive,
/// compared as civil dates in the business zone. The window is a fixed
/// business rule, not a per-call knob.
pub fn is_within_validity_window(doc_date: NaiveDate, now: DateTime<FixedOffset>) -> bool {
    now.date_naive() <= doc_date + Duration::days(VALIDITY_WINDOW_DAYS)
}
