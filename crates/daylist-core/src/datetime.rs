use anyhow::{Context, anyhow};
use chrono::{Days, NaiveDate};
use regex::Regex;

/// Parses a due-date expression: `YYYY-MM-DD`, `today`, `tomorrow`, or
/// a relative `+Nd` offset from today.
pub fn parse_due_expr(input: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return Err(anyhow!("empty due date"));
    }

    match input.to_ascii_lowercase().as_str() {
        "today" => return Ok(today),
        "tomorrow" => {
            return today
                .checked_add_days(Days::new(1))
                .ok_or_else(|| anyhow!("date out of range"));
        }
        _ => {}
    }

    let rel_re = Regex::new(r"^\+(?P<num>\d+)d$").context("invalid relative date pattern")?;
    if let Some(caps) = rel_re.captures(input) {
        let num: u64 = caps["num"]
            .parse()
            .with_context(|| format!("invalid day offset in '{input}'"))?;
        return today
            .checked_add_days(Days::new(num))
            .ok_or_else(|| anyhow!("date out of range"));
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("invalid due date '{input}', expected YYYY-MM-DD"))
}

pub fn format_due(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{format_due, parse_due_expr};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).expect("valid date")
    }

    #[test]
    fn parses_absolute_date() {
        let parsed = parse_due_expr("2026-12-24", today()).expect("parse date");
        assert_eq!(format_due(parsed), "2026-12-24");
    }

    #[test]
    fn parses_keywords() {
        assert_eq!(
            parse_due_expr("today", today()).expect("parse today"),
            today()
        );
        assert_eq!(
            format_due(parse_due_expr("tomorrow", today()).expect("parse tomorrow")),
            "2026-08-07"
        );
    }

    #[test]
    fn parses_relative_offsets() {
        assert_eq!(
            format_due(parse_due_expr("+10d", today()).expect("parse offset")),
            "2026-08-16"
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_due_expr("next week", today()).is_err());
        assert!(parse_due_expr("08/16/2026", today()).is_err());
        assert!(parse_due_expr("", today()).is_err());
    }
}
