// Pattern replacement descriptors and label/value lookups
use super::telemetry::SampleValue;
use std::collections::BTreeMap;

/// One `${...}` occurrence inside a template.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternVariable {
    /// The full placeholder text, e.g. `${latitude:7}`.
    pub variable: String,
    /// Snapshot column supplying the value, if the name resolved.
    pub column: Option<usize>,
    pub decimals: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReplaceInfo {
    pub variables: Vec<PatternVariable>,
}

impl ReplaceInfo {
    pub fn is_static(&self) -> bool {
        self.variables.is_empty()
    }
}

pub type ValueMap = BTreeMap<String, Option<SampleValue>>;

/// Latest value per data key label, flat and per datasource. This is the
/// data handed to scoring rules.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabelValueMap {
    pub data: ValueMap,
    pub ds_data: Vec<ValueMap>,
}
