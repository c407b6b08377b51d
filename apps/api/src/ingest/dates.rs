use chrono::NaiveDate;

pub const PRESENT: &str = "Present";

/// Formats one date-like value for display.
///
/// A bare 4-digit year passes through. Year-month values (`YYYY-MM`, `YYYY-MM-DD`,
/// `YYYY/MM`, `MM/YYYY`) become `Mon YYYY`. "present" in any case becomes `Present`.
/// Anything else is returned trimmed but otherwise unchanged.
pub fn format_date(raw: &str) -> String {
    let value = raw.trim();
    if value.eq_ignore_ascii_case("present") {
        return PRESENT.to_string();
    }
    if value.len() == 4 && value.chars().all(|c| c.is_ascii_digit()) {
        return value.to_string();
    }
    match parse_year_month(value) {
        Some(date) => date.format("%b %Y").to_string(),
        None => value.to_string(),
    }
}

/// Formats an end date; a blank or absent end date means the role is ongoing.
pub fn format_end_date(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        None | Some("") => PRESENT.to_string(),
        Some(value) => format_date(value),
    }
}

/// Renders `"{start} - {end}"`, or just the end when the start is blank.
pub fn format_date_range(start: Option<&str>, end: Option<&str>) -> String {
    let end = format_end_date(end);
    match start.map(str::trim) {
        None | Some("") => end,
        Some(start) => format!("{} - {}", format_date(start), end),
    }
}

fn parse_year_month(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    for (pattern, year_first) in [("-", true), ("/", true), ("/", false)] {
        let Some((a, b)) = value.split_once(pattern) else {
            continue;
        };
        let (year, month) = if year_first { (a, b) } else { (b, a) };
        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            continue;
        }
        let (Ok(year), Ok(month)) = (year.parse::<i32>(), month.parse::<u32>()) else {
            continue;
        };
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, 1) {
            return Some(date);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_passes_through() {
        assert_eq!(format_date("2021"), "2021");
    }

    #[test]
    fn test_year_month_shapes() {
        assert_eq!(format_date("2021-03"), "Mar 2021");
        assert_eq!(format_date("2021-03-17"), "Mar 2021");
        assert_eq!(format_date("2021/11"), "Nov 2021");
        assert_eq!(format_date("7/2019"), "Jul 2019");
    }

    #[test]
    fn test_present_is_canonicalized() {
        assert_eq!(format_date("PRESENT"), "Present");
        assert_eq!(format_date(" present "), "Present");
    }

    #[test]
    fn test_unrecognized_values_are_unchanged() {
        assert_eq!(format_date("Spring 2020"), "Spring 2020");
        assert_eq!(format_date("2021-13"), "2021-13");
    }

    #[test]
    fn test_blank_end_date_is_present() {
        assert_eq!(format_date_range(Some("2018-09"), Some("")), "Sep 2018 - Present");
        assert_eq!(format_date_range(Some("2018"), None), "2018 - Present");
        assert_eq!(format_date_range(None, Some("2020-01")), "Jan 2020");
    }
}
