use crate::shared::format::{format_decimal, format_percent};
use anyhow::{Context, Result};
use contracts::dashboards::d100_bsc_scorecard::BscScorecardResponse;
use contracts::shared::aggregation::Subtotal;
use contracts::shared::scoring::compute_achievement;

const HEADERS: [&str; 10] = [
    "Perspective",
    "KPI No.",
    "KPI",
    "Weight",
    "Target",
    "Actual",
    "Achievement",
    "Score",
    "Status",
    "Period",
];

fn subtotal_record(label: &str, total: &Subtotal, period: &str) -> Vec<String> {
    vec![
        label.to_string(),
        String::new(),
        String::new(),
        format_decimal(Some(total.weight)),
        String::new(),
        String::new(),
        format_percent(compute_achievement(total.weight, total.score)),
        format_decimal(Some(total.score)),
        String::new(),
        period.to_string(),
    ]
}

/// Scorecard в CSV: строки KPI, итог по каждой перспективе и общий итог
pub fn scorecard_to_csv(card: &BscScorecardResponse) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());
    writer.write_record(HEADERS)?;

    for group in &card.groups {
        for row in &group.rows {
            writer.write_record([
                group.name.clone(),
                row.code.clone(),
                row.name.clone(),
                format_decimal(Some(row.weight)),
                format_decimal(row.target),
                format_decimal(row.actual),
                format_percent(row.achievement),
                format_decimal(Some(row.score)),
                row.status.display_name().to_string(),
                row.period.clone(),
            ])?;
        }
        writer.write_record(subtotal_record(
            &format!("{} subtotal", group.name),
            &group.subtotal,
            &card.period,
        ))?;
    }
    writer.write_record(subtotal_record("Total", &card.grand_total, &card.period))?;

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboards::d100_bsc_scorecard::service::build_scorecard;
    use contracts::domain::a001_kpi::Kpi;
    use contracts::enums::{KpiCategory, Perspective, UnitOfMeasure, YtdCalculation};
    use contracts::shared::list_query::ListFilter;
    use contracts::shared::scoring::AchievementPolicy;

    #[test]
    fn test_csv_has_rows_subtotals_and_total() {
        let mut kpi = Kpi::new_for_insert(
            "F1.1".into(),
            "Revenue, net".into(),
            Perspective::Financial,
            15.0,
            UnitOfMeasure::Currency,
            KpiCategory::Max,
            YtdCalculation::Accumulative,
        );
        kpi.targets.insert("2025-01".into(), 5.0);
        kpi.actuals.insert("2025-01".into(), 4.5);
        let mut no_target = Kpi::new_for_insert(
            "C1.1".into(),
            "NPS".into(),
            Perspective::Customer,
            10.0,
            UnitOfMeasure::Score,
            KpiCategory::Max,
            YtdCalculation::Average,
        );
        no_target.actuals.insert("2025-01".into(), 3.0);

        let card = build_scorecard(
            &[kpi, no_target],
            "2025-01",
            AchievementPolicy::Ratio,
            &ListFilter::default(),
        );
        let csv = scorecard_to_csv(&card).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("Perspective,KPI No.,KPI"));
        assert!(lines[1].contains("\"Revenue, net\""));
        assert!(lines[1].contains("90.0%"));
        assert!(lines[1].contains("13.50"));
        assert!(lines[3].contains("n/a"));
        assert!(lines[5].starts_with("Total,,,25.00"));
    }
}
