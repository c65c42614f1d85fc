use std::fmt::Write as _;

use pairstat_data::{column::Column, dataset::Dataset, observation::Observation};
use pairstat_stats::summary::IqrFences;

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "NaN".to_owned(), |v| format!("{v:.4}"))
}

fn describe_row(row: &Observation) -> String {
    let datetime = row
        .datetime
        .map_or_else(|| "-".to_owned(), |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string());
    let sex = row.sex.map_or_else(|| "-".to_owned(), |s| s.to_string());
    format!(
        "{datetime}  A={}  B={}  ratio={}  sex={sex}",
        cell(row.a),
        cell(row.b),
        cell(row.ratio),
    )
}

/// IQR outliers of the ratio within each age bucket.
pub(crate) fn ratio_by_age(data: &Dataset) -> String {
    let mut report = String::new();
    for bucket in data.age_buckets() {
        let rows = data
            .rows()
            .iter()
            .filter(|r| r.age.as_ref() == Some(&bucket) && r.ratio.is_some())
            .collect::<Vec<_>>();
        let values = rows.iter().filter_map(|r| r.ratio).collect::<Vec<_>>();
        let outliers = IqrFences::new(&values).map_or_else(Vec::new, |fences| {
            rows.iter()
                .filter(|r| r.ratio.is_some_and(|v| fences.is_outlier(v)))
                .collect()
        });

        if outliers.is_empty() {
            writeln!(report, "Age {}: no outliers", bucket.label()).ok();
        } else {
            writeln!(report, "Age {}: {} outliers", bucket.label(), outliers.len()).ok();
            for row in outliers {
                writeln!(report, "    {}", describe_row(row)).ok();
            }
        }
    }
    if report.is_empty() {
        writeln!(report, "No {} values by age", Column::Ratio).ok();
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outliers_by_age() {
        let csv = "datetime,A,B,poměr,pohlaví,věk\n\
                   2024-01-01 10:00:00,3,2,1.50,1,0-10\n\
                   2024-01-01 11:00:00,3,2,1.51,1,0-10\n\
                   2024-01-01 12:00:00,3,2,1.52,2,0-10\n\
                   2024-01-01 13:00:00,3,2,1.53,2,0-10\n\
                   2024-01-01 14:00:00,9,2,4.50,1,0-10\n\
                   2024-01-02 10:00:00,3,2,1.60,1,20-40\n\
                   2024-01-02 11:00:00,3,2,1.61,2,20-40\n";
        let data = Dataset::from_reader(csv.as_bytes()).unwrap();
        let report = ratio_by_age(&data);
        let lines = report.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Age 0-10: 1 outliers");
        assert_eq!(
            lines[1],
            "    2024-01-01 14:00:00  A=9.0000  B=2.0000  ratio=4.5000  sex=1"
        );
        assert_eq!(lines[2], "Age 20-40: no outliers");
    }
}
