// Location index - discovers latitude/longitude column pairs per datasource
use crate::domain::snapshot::DataColumn;
use std::ops::Range;

/// A run of consecutive columns sharing one datasource tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasourceGroup {
    /// Running ordinal of the run, counted from 0 in column order.
    pub ordinal: usize,
    pub datasource: usize,
    pub columns: Range<usize>,
}

/// A matched coordinate column pair; becomes one Location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatePair {
    pub lat_index: usize,
    pub lng_index: usize,
    pub ds_ordinal: usize,
    pub datasource: usize,
}

/// Split columns into datasource runs. A new run starts whenever the tag
/// differs from the previous column's.
pub fn group_by_datasource(columns: &[DataColumn]) -> Vec<DatasourceGroup> {
    let mut groups: Vec<DatasourceGroup> = Vec::new();
    for (i, column) in columns.iter().enumerate() {
        let same_run = groups.last().is_some_and(|g| g.datasource == column.datasource);
        if same_run {
            if let Some(group) = groups.last_mut() {
                group.columns.end = i + 1;
            }
        } else {
            groups.push(DatasourceGroup {
                ordinal: groups.len(),
                datasource: column.datasource,
                columns: i..i + 1,
            });
        }
    }
    groups
}

/// Find every lat/lng pair in column order. Within a run the pair is
/// emitted as soon as both keys have been seen, then matching restarts so a
/// datasource can contribute several pairs.
pub fn find_coordinate_pairs(columns: &[DataColumn], lat_key: &str, lng_key: &str) -> Vec<CoordinatePair> {
    let mut pairs = Vec::new();

    for group in group_by_datasource(columns) {
        let mut lat_index = None;
        let mut lng_index = None;

        for i in group.columns.clone() {
            let name = columns[i].data_key.resolved_name();
            if name == lat_key {
                lat_index = Some(i);
            } else if name == lng_key {
                lng_index = Some(i);
            }

            if let (Some(lat), Some(lng)) = (lat_index, lng_index) {
                pairs.push(CoordinatePair {
                    lat_index: lat,
                    lng_index: lng,
                    ds_ordinal: group.ordinal,
                    datasource: group.datasource,
                });
                lat_index = None;
                lng_index = None;
            }
        }
    }

    pairs
}
