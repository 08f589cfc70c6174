// Sample snapshot domain models - one refresh worth of subscription data
use super::telemetry::{SampleValue, TimeSeriesPoint};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Datasource {
    pub name: String,
    pub entity_name: String,
    pub alias_name: Option<String>,
}

impl Datasource {
    pub fn new(name: impl Into<String>, entity_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity_name: entity_name.into(),
            alias_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataKey {
    pub name: String,
    pub label: String,
    /// Explicit alias used when matching coordinate keys.
    pub location_attr_name: Option<String>,
}

impl DataKey {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            location_attr_name: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_location_attr(mut self, attr: impl Into<String>) -> Self {
        self.location_attr_name = Some(attr.into());
        self
    }

    /// Name used to match the key against the configured coordinate keys.
    pub fn resolved_name(&self) -> &str {
        match self.location_attr_name.as_deref() {
            Some(attr) if !attr.is_empty() => attr,
            _ => &self.label,
        }
    }
}

/// One time series of a subscription, tagged with its owning datasource.
#[derive(Debug, Clone, PartialEq)]
pub struct DataColumn {
    /// Index into `SampleSnapshot::datasources`.
    pub datasource: usize,
    pub data_key: DataKey,
    pub data: Vec<TimeSeriesPoint>,
}

impl DataColumn {
    pub fn new(datasource: usize, data_key: DataKey, data: Vec<TimeSeriesPoint>) -> Self {
        Self {
            datasource,
            data_key,
            data,
        }
    }

    pub fn latest(&self) -> Option<&SampleValue> {
        self.data.last().map(|p| &p.value)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampleSnapshot {
    pub datasources: Vec<Datasource>,
    pub data: Vec<DataColumn>,
}

impl SampleSnapshot {
    pub fn new(datasources: Vec<Datasource>, data: Vec<DataColumn>) -> Self {
        Self { datasources, data }
    }

    pub fn column(&self, index: usize) -> Option<&DataColumn> {
        self.data.get(index)
    }

    pub fn datasource(&self, index: usize) -> Option<&Datasource> {
        self.datasources.get(index)
    }

    /// True when both snapshots carry the same datasources and the same
    /// column layout, i.e. only the samples differ.
    pub fn same_layout(&self, other: &SampleSnapshot) -> bool {
        self.datasources == other.datasources
            && self.data.len() == other.data.len()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| a.datasource == b.datasource && a.data_key == b.data_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(ds: usize, key: &str, values: &[f64]) -> DataColumn {
        let data = values
            .iter()
            .enumerate()
            .map(|(i, v)| TimeSeriesPoint::new(i as i64, *v))
            .collect();
        DataColumn::new(ds, DataKey::new(key), data)
    }

    #[test]
    fn test_resolved_name_prefers_alias() {
        let key = DataKey::new("lat").with_label("Lat");
        assert_eq!(key.resolved_name(), "Lat");

        let key = key.with_location_attr("latitude");
        assert_eq!(key.resolved_name(), "latitude");

        let key = DataKey::new("lat").with_location_attr("");
        assert_eq!(key.resolved_name(), "lat");
    }

    #[test]
    fn test_same_layout_ignores_samples() {
        let ds = vec![Datasource::new("Trucks", "Truck 1")];
        let a = SampleSnapshot::new(ds.clone(), vec![column(0, "latitude", &[1.0])]);
        let b = SampleSnapshot::new(ds.clone(), vec![column(0, "latitude", &[2.0, 3.0])]);
        let c = SampleSnapshot::new(ds, vec![column(0, "longitude", &[1.0])]);

        assert!(a.same_layout(&b));
        assert!(!a.same_layout(&c));
        assert_eq!(b.column(0).and_then(|c| c.latest()), Some(&SampleValue::Number(3.0)));
    }
}
