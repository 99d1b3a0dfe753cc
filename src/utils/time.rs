use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Day-level date shown to candidates in emails and on the PDF.
pub fn to_display_date(dt: DateTime<Utc>) -> String {
    dt.format("%d.%m.%Y").to_string()
}
