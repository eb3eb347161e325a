use chrono::NaiveDate;

use crate::model::Metric;

/// Cumulative worldwide totals by day, oldest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistorySeries {
    pub cases: Vec<(NaiveDate, u64)>,
    pub deaths: Vec<(NaiveDate, u64)>,
    pub recovered: Vec<(NaiveDate, u64)>,
}

impl HistorySeries {
    pub fn cumulative(&self, metric: Metric) -> &[(NaiveDate, u64)] {
        match metric {
            Metric::Cases => &self.cases,
            Metric::Recovered => &self.recovered,
            Metric::Deaths => &self.deaths,
        }
    }

    /// Day-over-day differences. Negative when upstream revised a total down.
    pub fn daily_new(&self, metric: Metric) -> Vec<(NaiveDate, i64)> {
        self.cumulative(metric)
            .windows(2)
            .map(|pair| {
                let (_, prev) = pair[0];
                let (date, value) = pair[1];
                (date, value as i64 - prev as i64)
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty() && self.deaths.is_empty() && self.recovered.is_empty()
    }
}

/// Chart points (x = day index) plus the y range, for the line chart.
pub fn chart_points(series: &[(NaiveDate, i64)]) -> (Vec<(f64, f64)>, [f64; 2]) {
    let points: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .map(|(idx, (_, value))| (idx as f64, *value as f64))
        .collect();
    let min = points.iter().map(|(_, y)| *y).fold(0.0_f64, f64::min);
    let max = points.iter().map(|(_, y)| *y).fold(0.0_f64, f64::max);
    let max = if max <= min { min + 1.0 } else { max };
    (points, [min, max])
}
