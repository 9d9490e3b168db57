//! Ukrainian calendar strings used in post headings, plus the digit-sum
//! reduction behind the daily numerology post.

use chrono::{Datelike, Days, NaiveDate};

pub fn month_name_ua(month: u32) -> &'static str {
    match month {
        1 => "січня",
        2 => "лютого",
        3 => "березня",
        4 => "квітня",
        5 => "травня",
        6 => "червня",
        7 => "липня",
        8 => "серпня",
        9 => "вересня",
        10 => "жовтня",
        11 => "листопада",
        12 => "грудня",
        _ => "",
    }
}

pub fn date_line(date: NaiveDate) -> String {
    format!("{} {}", date.day(), month_name_ua(date.month()))
}

/// Monday..Sunday span of the week containing `date`.
pub fn week_range_line(date: NaiveDate) -> String {
    let monday = date - Days::new(u64::from(date.weekday().num_days_from_monday()));
    let sunday = monday + Days::new(6);
    format!("{} — {}", date_line(monday), date_line(sunday))
}

/// Digit sum of the full DDMMYYYY date, reduced until it is a single digit
/// or one of the master numbers 11 and 22.
pub fn life_path_number(date: NaiveDate) -> u32 {
    let mut n = digit_sum(date.day())
        + digit_sum(date.month())
        + digit_sum(date.year().unsigned_abs());
    while n > 9 && n != 11 && n != 22 {
        n = digit_sum(n);
    }
    n
}

fn digit_sum(mut n: u32) -> u32 {
    let mut sum = 0;
    while n > 0 {
        sum += n % 10;
        n /= 10;
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    #[test]
    fn date_line_uses_genitive_month() {
        assert_eq!(date_line(date(2026, 8, 23)), "23 серпня");
        assert_eq!(date_line(date(2026, 1, 1)), "1 січня");
    }

    #[test]
    fn week_range_runs_monday_to_sunday() {
        assert_eq!(week_range_line(date(2026, 8, 19)), "17 серпня — 23 серпня");
        // A Monday maps onto its own week.
        assert_eq!(week_range_line(date(2026, 8, 17)), "17 серпня — 23 серпня");
        // Weeks straddle month boundaries.
        assert_eq!(week_range_line(date(2026, 8, 31)), "31 серпня — 6 вересня");
    }

    #[test]
    fn day_number_reduces_to_single_digit() {
        assert_eq!(life_path_number(date(1990, 6, 15)), 4);
    }

    #[test]
    fn day_number_keeps_master_numbers() {
        assert_eq!(life_path_number(date(1980, 2, 9)), 11);
    }
}
