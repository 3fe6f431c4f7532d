//! Date formatting for text views.

use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

const LONG_DATE: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");

const SHORT_DATE_TIME: &[BorrowedFormatItem<'static>] = format_description!(
    "[month repr:short] [day padding:none], [year], [hour repr:12 padding:zero]:[minute] [period]"
);

/// `March 1, 2024`, used on cards and the detail header.
pub fn long_date(value: OffsetDateTime) -> String {
    value
        .format(LONG_DATE)
        .unwrap_or_else(|_| value.date().to_string())
}

/// `Mar 1, 2024, 03:04 PM`, used on comments.
pub fn short_date_time(value: OffsetDateTime) -> String {
    value
        .format(SHORT_DATE_TIME)
        .unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn long_date_spells_out_month() {
        assert_eq!(long_date(datetime!(2024-03-01 10:15 UTC)), "March 1, 2024");
    }

    #[test]
    fn short_date_time_uses_twelve_hour_clock() {
        assert_eq!(
            short_date_time(datetime!(2024-03-01 15:04 UTC)),
            "Mar 1, 2024, 03:04 PM"
        );
    }
}
