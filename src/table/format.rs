use chrono::NaiveDate;

/// Placeholder for absent values
pub const BLANK: &str = "-";

/// How cells are formatted for display
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFormat {
    /// chrono format string for dates
    pub date_format: String,
    /// Currency code prefixed to the cost column
    pub currency: Option<String>,
    /// Indentation per depth level, in cells
    pub indent: usize,
}

impl Default for DisplayFormat {
    fn default() -> Self {
        DisplayFormat {
            date_format: "%d-%m-%Y".into(),
            currency: None,
            indent: 2,
        }
    }
}

impl DisplayFormat {
    pub fn date(&self, d: Option<NaiveDate>) -> String {
        d.map_or_else(|| BLANK.to_string(), |d| d.format(&self.date_format).to_string())
    }

    pub fn days(&self, days: Option<i64>) -> String {
        match days {
            Some(1) => "1 day".to_string(),
            Some(n) => format!("{} days", n),
            None => BLANK.to_string(),
        }
    }

    pub fn hours(&self, h: f64) -> String {
        format!("{:.2}", h)
    }

    pub fn money(&self, amount: f64) -> String {
        let body = group_thousands(amount);
        match &self.currency {
            Some(code) if !code.is_empty() => format!("{} {}", code, body),
            _ => body,
        }
    }
}

/// `1234567.5` → `1,234,567.50`
fn group_thousands(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_groups_and_prefixes_currency() {
        let mut fmt = DisplayFormat::default();
        assert_eq!(fmt.money(0.0), "0.00");
        assert_eq!(fmt.money(1234567.5), "1,234,567.50");
        assert_eq!(fmt.money(-950.0), "-950.00");
        fmt.currency = Some("SAR".into());
        assert_eq!(fmt.money(1000.0), "SAR 1,000.00");
    }

    #[test]
    fn dates_and_days() {
        let fmt = DisplayFormat::default();
        let d = NaiveDate::from_ymd_opt(2025, 3, 7);
        assert_eq!(fmt.date(d), "07-03-2025");
        assert_eq!(fmt.date(None), "-");
        assert_eq!(fmt.days(Some(1)), "1 day");
        assert_eq!(fmt.days(Some(12)), "12 days");
        assert_eq!(fmt.hours(7.5), "7.50");
    }
}
