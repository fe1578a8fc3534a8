use crate::datetime::chart_timestamp;
use crate::types::MeasurementPair;

/// One bar of the comparison chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    /// Seconds
    pub time_to_interactive: f64,
    pub url: String,
    pub timestamp: String,
}

/// All the rows of one URL, drawn as one panel in one color.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub url: String,
    pub points: Vec<(String, f64)>,
}

/// Two rows per pair, in pair order then in the order the results were stored.
pub fn project(pairs: &[MeasurementPair]) -> Vec<ChartRow> {
    pairs
        .iter()
        .flat_map(|pair| {
            let timestamp = chart_timestamp(pair.timestamp);
            pair.data.iter().map(move |result| ChartRow {
                time_to_interactive: result.time_to_interactive_ms() / 1000.0,
                url: result.requested_url.clone(),
                timestamp: timestamp.clone(),
            })
        })
        .collect()
}

/// Groups rows by URL, series in order of first appearance, points in row order.
pub fn group_by_url(rows: &[ChartRow]) -> Vec<Series> {
    let mut series: Vec<Series> = Vec::new();

    for row in rows {
        let point = (row.timestamp.clone(), row.time_to_interactive);
        match series.iter_mut().find(|series| series.url == row.url) {
            Some(series) => series.points.push(point),
            None => series.push(Series {
                url: row.url.clone(),
                points: vec![point],
            }),
        }
    }

    series
}
