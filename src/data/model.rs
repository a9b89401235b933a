use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Bounding envelope for plausible Argentine coordinates
// ---------------------------------------------------------------------------

/// Latitude range covering continental Argentina + Tierra del Fuego.
pub const LATITUDE_RANGE: RangeInclusive<f64> = -56.0..=-20.0;
/// Longitude range covering continental Argentina.
pub const LONGITUDE_RANGE: RangeInclusive<f64> = -75.0..=-50.0;

// ---------------------------------------------------------------------------
// Record – one row of the dataset (one fatal victim)
// ---------------------------------------------------------------------------

/// A single victim record (one row of the source table).
///
/// One crash (`incident_id`) may produce several victim records. Every field
/// is optional: the loader never rejects a row because one cell failed to
/// parse, and each derived view excludes only the rows it cannot use.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub year: Option<i32>,
    /// Calendar month number, 1–12.
    pub month: Option<u32>,
    pub province: Option<String>,
    /// Crash identifier, shared by all victims of the same crash. The whole
    /// column may be absent from the source file.
    pub incident_id: Option<String>,
    /// Age bracket of the victim (the dataset groups ages into ranges).
    pub age_bracket: Option<String>,
    /// Vehicle category of the victim.
    pub vehicle: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Record {
    /// Whether both coordinates are present (regardless of plausibility).
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// The coordinate pair, if present and inside the bounding envelope.
    /// Out-of-envelope points are treated as data errors.
    pub fn bounded_coordinates(&self) -> Option<(f64, f64)> {
        let (lat, lon) = (self.latitude?, self.longitude?);
        if LATITUDE_RANGE.contains(&lat) && LONGITUDE_RANGE.contains(&lon) {
            Some((lat, lon))
        } else {
            None
        }
    }

    /// First-of-month date built from (year, month); `None` when either part
    /// is missing or the combination is not a valid calendar date.
    pub fn month_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year?, self.month?, 1)
    }
}

// ---------------------------------------------------------------------------
// AccidentDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset with precomputed filter-dimension indices.
#[derive(Debug, Clone)]
pub struct AccidentDataset {
    /// All victim records (rows).
    pub records: Vec<Record>,
    /// Distinct non-null years, sorted.
    pub years: BTreeSet<i32>,
    /// Distinct non-null province names, sorted.
    pub provinces: BTreeSet<String>,
    /// Whether the `id_hecho` column existed in the source file. When it
    /// did not, the incidents KPI reports "unavailable" instead of 0.
    pub has_incident_ids: bool,
}

impl AccidentDataset {
    /// Build the filter-dimension indices from the loaded records.
    pub fn from_records(records: Vec<Record>, has_incident_ids: bool) -> Self {
        let mut years = BTreeSet::new();
        let mut provinces = BTreeSet::new();

        for rec in &records {
            if let Some(y) = rec.year {
                years.insert(y);
            }
            if let Some(p) = &rec.province {
                provinces.insert(p.clone());
            }
        }

        AccidentDataset {
            records,
            years,
            provinces,
            has_incident_ids,
        }
    }

    /// Number of victim records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: i32, month: u32, province: &str) -> Record {
        Record {
            year: Some(year),
            month: Some(month),
            province: Some(province.to_string()),
            ..Record::default()
        }
    }

    #[test]
    fn from_records_indexes_distinct_years_and_provinces() {
        let ds = AccidentDataset::from_records(
            vec![
                record(2019, 3, "Córdoba"),
                record(2019, 3, "Córdoba"),
                record(2020, 1, "Chaco"),
                Record::default(), // null year and province are skipped
            ],
            true,
        );
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.years.iter().copied().collect::<Vec<_>>(), vec![2019, 2020]);
        assert_eq!(
            ds.provinces.iter().cloned().collect::<Vec<_>>(),
            vec!["Chaco".to_string(), "Córdoba".to_string()]
        );
    }

    #[test]
    fn bounded_coordinates_rejects_out_of_envelope_points() {
        let mut rec = record(2019, 1, "Mendoza");
        rec.latitude = Some(-32.9);
        rec.longitude = Some(-68.8);
        assert_eq!(rec.bounded_coordinates(), Some((-32.9, -68.8)));

        rec.latitude = Some(-90.0);
        assert!(rec.has_coordinates());
        assert_eq!(rec.bounded_coordinates(), None);

        rec.latitude = None;
        assert!(!rec.has_coordinates());
        assert_eq!(rec.bounded_coordinates(), None);
    }

    #[test]
    fn month_date_drops_invalid_combinations() {
        assert_eq!(
            record(2019, 3, "Córdoba").month_date(),
            NaiveDate::from_ymd_opt(2019, 3, 1)
        );
        assert_eq!(record(2019, 13, "Córdoba").month_date(), None);
        assert_eq!(Record::default().month_date(), None);
    }
}
