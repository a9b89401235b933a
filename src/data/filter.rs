use std::collections::BTreeSet;

use super::model::AccidentDataset;

// ---------------------------------------------------------------------------
// Filter predicate: which years / provinces are selected
// ---------------------------------------------------------------------------

/// The two filter dimensions of the dashboard. A record is kept when its
/// year is in `years` AND its province is in `provinces` (conjunction).
///
/// An empty set on either dimension means "nothing selected" and therefore
/// hides everything; that is a normal state of the interactive loop, not an
/// error. Records with a null year or province never pass an active filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub years: BTreeSet<i32>,
    pub provinces: BTreeSet<String>,
}

impl FilterState {
    /// True when one of the dimensions has nothing selected, so the filtered
    /// set is empty without looking at any record.
    pub fn is_empty_selection(&self) -> bool {
        self.years.is_empty() || self.provinces.is_empty()
    }
}

/// Initialise a [`FilterState`] with all values selected (i.e., show everything).
pub fn init_filter_state(dataset: &AccidentDataset) -> FilterState {
    FilterState {
        years: dataset.years.clone(),
        provinces: dataset.provinces.clone(),
    }
}

/// Return indices of records that pass both filters.
pub fn filtered_indices(dataset: &AccidentDataset, filters: &FilterState) -> Vec<usize> {
    if filters.is_empty_selection() {
        return Vec::new();
    }

    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            let year_ok = rec.year.is_some_and(|y| filters.years.contains(&y));
            let prov_ok = rec
                .province
                .as_ref()
                .is_some_and(|p| filters.provinces.contains(p));
            year_ok && prov_ok
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;

    fn record(year: i32, month: u32, province: &str) -> Record {
        Record {
            year: Some(year),
            month: Some(month),
            province: Some(province.to_string()),
            ..Record::default()
        }
    }

    fn sample_dataset() -> AccidentDataset {
        AccidentDataset::from_records(
            vec![
                record(2019, 3, "Córdoba"),
                record(2019, 3, "Córdoba"),
                record(2020, 1, "Chaco"),
            ],
            true,
        )
    }

    fn filters(years: &[i32], provinces: &[&str]) -> FilterState {
        FilterState {
            years: years.iter().copied().collect(),
            provinces: provinces.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn conjunction_of_year_and_province() {
        let ds = sample_dataset();
        assert_eq!(
            filtered_indices(&ds, &filters(&[2019], &["Córdoba"])),
            vec![0, 1]
        );
        // Year matches but province does not.
        assert!(filtered_indices(&ds, &filters(&[2019], &["Chaco"])).is_empty());
        assert_eq!(
            filtered_indices(&ds, &filters(&[2019, 2020], &["Córdoba", "Chaco"])),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn empty_selection_yields_empty_set() {
        let ds = sample_dataset();
        let no_years = filters(&[], &["Córdoba"]);
        assert!(no_years.is_empty_selection());
        assert!(filtered_indices(&ds, &no_years).is_empty());

        let no_provinces = filters(&[2019], &[]);
        assert!(no_provinces.is_empty_selection());
        assert!(filtered_indices(&ds, &no_provinces).is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let ds = sample_dataset();
        let f = filters(&[2019], &["Córdoba"]);
        let once = filtered_indices(&ds, &f);
        let twice = filtered_indices(&ds, &f);
        assert_eq!(once, twice);
    }

    #[test]
    fn null_year_or_province_never_passes() {
        let mut missing_province = record(2019, 5, "Córdoba");
        missing_province.province = None;
        let ds = AccidentDataset::from_records(
            vec![record(2019, 3, "Córdoba"), missing_province, Record::default()],
            true,
        );
        let all = init_filter_state(&ds);
        assert_eq!(filtered_indices(&ds, &all), vec![0]);
    }

    #[test]
    fn init_selects_everything() {
        let ds = sample_dataset();
        let all = init_filter_state(&ds);
        assert_eq!(filtered_indices(&ds, &all).len(), ds.len());
    }
}
