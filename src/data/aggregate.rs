use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};

use super::model::{AccidentDataset, Record};

// ---------------------------------------------------------------------------
// Aggregated views – everything the dashboard renders
// ---------------------------------------------------------------------------

/// Window of the trailing moving average over the monthly series.
pub const MOVING_AVG_WINDOW: usize = 12;
/// How many provinces the ranking view keeps.
pub const TOP_PROVINCES: usize = 10;
/// How many vehicle categories the ranking view keeps.
pub const TOP_VEHICLES: usize = 12;

/// Headline scalars over the filtered set.
#[derive(Debug, Clone, PartialEq)]
pub struct Kpis {
    /// Row count (one row = one victim).
    pub total_victims: usize,
    /// Distinct crash count; `None` when the source file had no
    /// `id_hecho` column at all.
    pub total_incidents: Option<usize>,
    /// Share of rows with both coordinates present, in percent [0, 100].
    pub geo_coverage_pct: f64,
    /// Statistical mode of the age brackets; `None` when every bracket is
    /// null. Ties break towards the first-encountered bracket.
    pub top_age_bracket: Option<String>,
}

/// One point of the monthly time series.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPoint {
    /// First day of the month.
    pub date: NaiveDate,
    pub victims: u64,
    /// Trailing 12-month mean with a shrinking window at the start of the
    /// series: at index i it averages positions max(0, i-11)..=i.
    pub mm12: f64,
}

/// Everything derived from one (dataset, filter) combination. Built in one
/// pass by [`build_views`]; the UI never aggregates on its own.
#[derive(Debug, Clone)]
pub struct DashboardViews {
    pub kpis: Kpis,
    /// Chronologically ordered, one entry per month present in the data.
    /// Months with no records are absent, not zero-filled.
    pub monthly: Vec<MonthlyPoint>,
    /// (month number 1–12, mean victims across the years present).
    pub seasonality: Vec<(u32, f64)>,
    /// Descending by count, at most [`TOP_PROVINCES`] entries.
    pub top_provinces: Vec<(String, u64)>,
    /// Descending by count, at most [`TOP_VEHICLES`] entries.
    pub top_vehicles: Vec<(String, u64)>,
    /// `[longitude, latitude]` pairs inside the bounding envelope, ready for
    /// an x/y scatter. May be empty ("no georeferenced records").
    pub geo_points: Vec<[f64; 2]>,
}

/// Compute all views over the records selected by `indices`.
///
/// Pure and side-effect free; callers decide what an empty `indices` slice
/// means (the app treats it as the "no data for current selection" state
/// and never calls this).
pub fn build_views(dataset: &AccidentDataset, indices: &[usize]) -> DashboardViews {
    let records: Vec<&Record> = indices.iter().map(|&i| &dataset.records[i]).collect();

    let monthly = monthly_series(&records);
    DashboardViews {
        kpis: kpis(&records, dataset.has_incident_ids),
        seasonality: seasonality(&monthly),
        monthly,
        top_provinces: rank_categories(
            records.iter().filter_map(|r| r.province.as_deref()),
            TOP_PROVINCES,
        ),
        top_vehicles: rank_categories(
            records.iter().filter_map(|r| r.vehicle.as_deref()),
            TOP_VEHICLES,
        ),
        geo_points: geo_points(&records),
    }
}

// ---------------------------------------------------------------------------
// KPIs
// ---------------------------------------------------------------------------

fn kpis(records: &[&Record], has_incident_ids: bool) -> Kpis {
    let total_victims = records.len();

    let total_incidents = has_incident_ids.then(|| {
        records
            .iter()
            .filter_map(|r| r.incident_id.as_deref())
            .collect::<HashSet<_>>()
            .len()
    });

    let with_coords = records.iter().filter(|r| r.has_coordinates()).count();
    let geo_coverage_pct = if total_victims == 0 {
        0.0
    } else {
        with_coords as f64 / total_victims as f64 * 100.0
    };

    let top_age_bracket = rank_categories(
        records.iter().filter_map(|r| r.age_bracket.as_deref()),
        1,
    )
    .into_iter()
    .next()
    .map(|(bracket, _)| bracket);

    Kpis {
        total_victims,
        total_incidents,
        geo_coverage_pct,
        top_age_bracket,
    }
}

// ---------------------------------------------------------------------------
// Monthly series + trailing moving average
// ---------------------------------------------------------------------------

/// Group records by first-of-month date and count them. Records that cannot
/// form a valid date are dropped from this view only.
fn monthly_series(records: &[&Record]) -> Vec<MonthlyPoint> {
    let mut by_month: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for rec in records {
        if let Some(date) = rec.month_date() {
            *by_month.entry(date).or_insert(0) += 1;
        }
    }

    // BTreeMap iteration is already chronological.
    let counts: Vec<(NaiveDate, u64)> = by_month.into_iter().collect();

    let mut series = Vec::with_capacity(counts.len());
    let mut window_sum: u64 = 0;
    for (i, &(date, victims)) in counts.iter().enumerate() {
        window_sum += victims;
        if i >= MOVING_AVG_WINDOW {
            window_sum -= counts[i - MOVING_AVG_WINDOW].1;
        }
        let width = (i + 1).min(MOVING_AVG_WINDOW);
        series.push(MonthlyPoint {
            date,
            victims,
            mm12: window_sum as f64 / width as f64,
        });
    }
    series
}

/// Mean victims per calendar month across all years in the monthly series.
fn seasonality(monthly: &[MonthlyPoint]) -> Vec<(u32, f64)> {
    let mut by_month_number: BTreeMap<u32, (u64, u32)> = BTreeMap::new();
    for point in monthly {
        let entry = by_month_number.entry(point.date.month()).or_insert((0, 0));
        entry.0 += point.victims;
        entry.1 += 1;
    }
    by_month_number
        .into_iter()
        .map(|(month, (sum, n))| (month, sum as f64 / n as f64))
        .collect()
}

// ---------------------------------------------------------------------------
// Category rankings
// ---------------------------------------------------------------------------

/// Count occurrences and keep the `limit` most frequent categories,
/// descending. Equal counts break towards the category seen first, so the
/// result is deterministic for a given iteration order.
fn rank_categories<'a>(
    values: impl Iterator<Item = &'a str>,
    limit: usize,
) -> Vec<(String, u64)> {
    let mut counts: HashMap<&str, (u64, usize)> = HashMap::new();
    for value in values {
        let first_seen = counts.len();
        let entry = counts.entry(value).or_insert((0, first_seen));
        entry.0 += 1;
    }

    let mut ranked: Vec<(&str, (u64, usize))> = counts.into_iter().collect();
    ranked.sort_by(|(_, (count_a, seen_a)), (_, (count_b, seen_b))| {
        count_b.cmp(count_a).then(seen_a.cmp(seen_b))
    });
    ranked.truncate(limit);
    ranked
        .into_iter()
        .map(|(label, (count, _))| (label.to_string(), count))
        .collect()
}

// ---------------------------------------------------------------------------
// Geographic subset
// ---------------------------------------------------------------------------

/// Coordinate pairs inside the bounding envelope, as `[lon, lat]` so they
/// plot directly as x/y points.
fn geo_points(records: &[&Record]) -> Vec<[f64; 2]> {
    records
        .iter()
        .filter_map(|r| r.bounded_coordinates())
        .map(|(lat, lon)| [lon, lat])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{filtered_indices, FilterState};

    fn record(year: i32, month: u32, province: &str) -> Record {
        Record {
            year: Some(year),
            month: Some(month),
            province: Some(province.to_string()),
            ..Record::default()
        }
    }

    fn views_over(records: Vec<Record>) -> DashboardViews {
        let ds = AccidentDataset::from_records(records, true);
        let indices: Vec<usize> = (0..ds.len()).collect();
        build_views(&ds, &indices)
    }

    #[test]
    fn worked_example_from_cordoba() {
        let ds = AccidentDataset::from_records(
            vec![
                record(2019, 3, "Córdoba"),
                record(2019, 3, "Córdoba"),
                record(2020, 1, "Chaco"),
            ],
            true,
        );
        let filters = FilterState {
            years: [2019].into(),
            provinces: ["Córdoba".to_string()].into(),
        };
        let indices = filtered_indices(&ds, &filters);
        assert_eq!(indices.len(), 2);

        let views = build_views(&ds, &indices);
        assert_eq!(views.kpis.total_victims, 2);
        assert_eq!(views.monthly.len(), 1);
        assert_eq!(
            views.monthly[0].date,
            NaiveDate::from_ymd_opt(2019, 3, 1).unwrap()
        );
        assert_eq!(views.monthly[0].victims, 2);
        assert_eq!(views.top_provinces, vec![("Córdoba".to_string(), 2)]);
    }

    #[test]
    fn monthly_series_is_strictly_chronological_without_gap_filling() {
        let views = views_over(vec![
            record(2020, 5, "Salta"),
            record(2018, 11, "Salta"),
            record(2020, 5, "Salta"),
            record(2018, 1, "Salta"),
        ]);
        let dates: Vec<NaiveDate> = views.monthly.iter().map(|p| p.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2018, 11, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 5, 1).unwrap(),
            ]
        );
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(views.monthly[2].victims, 2);
    }

    #[test]
    fn moving_average_uses_a_shrinking_window() {
        // 14 months with counts 1, 2, ..., 14.
        let mut records = Vec::new();
        for i in 0..14u32 {
            let (year, month) = (2019 + (i / 12) as i32, i % 12 + 1);
            for _ in 0..=i {
                records.push(record(year, month, "Mendoza"));
            }
        }
        let views = views_over(records);
        assert_eq!(views.monthly.len(), 14);

        // First point: window of one.
        assert_eq!(views.monthly[0].mm12, 1.0);
        // Third point: mean of 1, 2, 3.
        assert!((views.monthly[2].mm12 - 2.0).abs() < 1e-9);
        // Point 12 (index 11): full window, mean of 1..=12.
        assert!((views.monthly[11].mm12 - 6.5).abs() < 1e-9);
        // Point 14 (index 13): mean of 3..=14.
        assert!((views.monthly[13].mm12 - 8.5).abs() < 1e-9);
    }

    #[test]
    fn invalid_dates_only_drop_from_the_series() {
        let views = views_over(vec![record(2019, 3, "Jujuy"), record(2019, 13, "Jujuy")]);
        assert_eq!(views.kpis.total_victims, 2);
        assert_eq!(views.monthly.len(), 1);
        assert_eq!(views.top_provinces, vec![("Jujuy".to_string(), 2)]);
    }

    #[test]
    fn seasonality_averages_across_years() {
        let views = views_over(vec![
            record(2019, 3, "Córdoba"),
            record(2019, 3, "Córdoba"),
            record(2020, 3, "Córdoba"),
            record(2020, 7, "Córdoba"),
        ]);
        // March: (2 + 1) / 2 years = 1.5; July: 1.0. No other months appear.
        assert_eq!(views.seasonality, vec![(3, 1.5), (7, 1.0)]);
    }

    #[test]
    fn rankings_sort_descending_and_break_ties_by_first_seen() {
        let ranked = rank_categories(
            ["auto", "moto", "moto", "bicicleta", "auto", "peatón"].into_iter(),
            3,
        );
        assert_eq!(
            ranked,
            vec![
                ("auto".to_string(), 2),
                ("moto".to_string(), 2),
                ("bicicleta".to_string(), 1),
            ]
        );
    }

    #[test]
    fn top_provinces_is_bounded_by_total_rows() {
        let mut records = Vec::new();
        for i in 0..30 {
            records.push(record(2019, 1, &format!("Provincia {}", i % 15)));
        }
        let views = views_over(records);
        assert!(views.top_provinces.len() <= TOP_PROVINCES);
        let ranked_total: u64 = views.top_provinces.iter().map(|(_, c)| c).sum();
        assert!(ranked_total as usize <= views.kpis.total_victims);
        assert!(views
            .top_provinces
            .windows(2)
            .all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn geo_views_exclude_out_of_envelope_but_kpis_keep_them() {
        let mut inside = record(2019, 1, "Mendoza");
        inside.latitude = Some(-32.9);
        inside.longitude = Some(-68.8);
        let mut outside = record(2019, 2, "Mendoza");
        outside.latitude = Some(-90.0);
        outside.longitude = Some(-68.8);
        let no_coords = record(2019, 3, "Mendoza");

        let views = views_over(vec![inside, outside, no_coords]);
        assert_eq!(views.geo_points, vec![[-68.8, -32.9]]);
        // Both coordinate-bearing rows count towards coverage.
        assert!((views.kpis.geo_coverage_pct - 2.0 / 3.0 * 100.0).abs() < 1e-9);
        assert_eq!(views.kpis.total_victims, 3);
        assert_eq!(views.top_provinces, vec![("Mendoza".to_string(), 3)]);
    }

    #[test]
    fn coverage_is_zero_without_coordinates() {
        let views = views_over(vec![record(2019, 1, "Formosa")]);
        assert_eq!(views.kpis.geo_coverage_pct, 0.0);
        assert!(views.geo_points.is_empty());
    }

    #[test]
    fn incident_count_degrades_when_column_is_absent() {
        let mut a = record(2019, 1, "Chubut");
        a.incident_id = Some("H-1".to_string());
        let mut b = record(2019, 1, "Chubut");
        b.incident_id = Some("H-1".to_string());
        let mut c = record(2019, 2, "Chubut");
        c.incident_id = Some("H-2".to_string());

        let with_column = AccidentDataset::from_records(vec![a.clone(), b.clone(), c.clone()], true);
        let indices: Vec<usize> = (0..with_column.len()).collect();
        let views = build_views(&with_column, &indices);
        assert_eq!(views.kpis.total_incidents, Some(2));

        let without_column = AccidentDataset::from_records(vec![a, b, c], false);
        let views = build_views(&without_column, &indices);
        assert_eq!(views.kpis.total_incidents, None);
    }

    #[test]
    fn age_bracket_mode_handles_missing_values() {
        let mut a = record(2019, 1, "La Pampa");
        a.age_bracket = Some("25-34".to_string());
        let mut b = record(2019, 1, "La Pampa");
        b.age_bracket = Some("25-34".to_string());
        let mut c = record(2019, 1, "La Pampa");
        c.age_bracket = Some("15-24".to_string());
        let d = record(2019, 1, "La Pampa");

        let views = views_over(vec![a, b, c, d]);
        assert_eq!(views.kpis.top_age_bracket.as_deref(), Some("25-34"));

        let all_null = views_over(vec![record(2019, 1, "La Pampa")]);
        assert_eq!(all_null.kpis.top_age_bracket, None);
    }
}
