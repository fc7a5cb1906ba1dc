//! Метки отчётных месяцев в формате `YYYY-MM`
//!
//! Лексикографический порядок меток совпадает с хронологическим,
//! поэтому помесячные значения хранятся в `BTreeMap<String, f64>`.

use chrono::{Datelike, NaiveDate};

/// Разобрать метку `YYYY-MM` в дату первого дня месяца
pub fn parse_period_label(label: &str) -> Result<NaiveDate, String> {
    let trimmed = label.trim();
    if trimmed.len() != 7 {
        return Err(format!("Invalid period label '{}', expected YYYY-MM", label));
    }
    NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d")
        .map_err(|_| format!("Invalid period label '{}', expected YYYY-MM", label))
}

/// Метка месяца, которому принадлежит дата
pub fn period_label(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Метки всех месяцев, пересекающихся с диапазоном (включительно)
pub fn months_between(date_from: NaiveDate, date_to: NaiveDate) -> Vec<String> {
    let mut labels = Vec::new();
    if date_from > date_to {
        return labels;
    }
    let (mut year, mut month) = (date_from.year(), date_from.month());
    let (end_year, end_month) = (date_to.year(), date_to.month());
    while (year, month) <= (end_year, end_month) {
        labels.push(format!("{:04}-{:02}", year, month));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    labels
}

/// Метка января того же года (начало YTD)
pub fn year_start_label(label: &str) -> Result<String, String> {
    let date = parse_period_label(label)?;
    Ok(format!("{:04}-01", date.year()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_label() {
        let d = parse_period_label("2025-03").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(period_label(d), "2025-03");
    }

    #[test]
    fn test_parse_invalid_labels() {
        for bad in ["2025-13", "2025-3", "March", "", "2025-03-01"] {
            assert!(parse_period_label(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_months_between_crosses_year() {
        let from = NaiveDate::from_ymd_opt(2024, 11, 15).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        assert_eq!(
            months_between(from, to),
            vec!["2024-11", "2024-12", "2025-01", "2025-02"]
        );
        assert!(months_between(to, from).is_empty());
    }

    #[test]
    fn test_year_start_label() {
        assert_eq!(year_start_label("2025-07").unwrap(), "2025-01");
    }
}
