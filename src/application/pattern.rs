// Pattern replacement trait - renders `${...}` templates against live data
use crate::domain::pattern::{LabelValueMap, ReplaceInfo};
use crate::domain::snapshot::{Datasource, SampleSnapshot};

pub trait PatternProvider {
    /// Substitute datasource-level placeholders (entity name and friends).
    fn label_from_datasource(&self, datasource: &Datasource, pattern: &str) -> String;

    /// Resolve the data variables referenced by `pattern` for one datasource.
    fn process_pattern(&self, pattern: &str, snapshot: &SampleSnapshot, ds_index: usize) -> ReplaceInfo;

    /// Render `pattern` with the latest samples of the snapshot.
    fn fill_pattern(&self, pattern: &str, info: &ReplaceInfo, snapshot: &SampleSnapshot) -> String;

    fn to_label_value_map(&self, snapshot: &SampleSnapshot) -> LabelValueMap;
}
