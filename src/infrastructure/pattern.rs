// Template pattern provider - `${key}` / `${key:decimals}` / `${#index}` placeholders
use crate::application::pattern::PatternProvider;
use crate::domain::pattern::{LabelValueMap, PatternVariable, ReplaceInfo, ValueMap};
use crate::domain::snapshot::{Datasource, SampleSnapshot};
use crate::domain::telemetry::SampleValue;

const DEFAULT_DECIMALS: usize = 2;

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplatePatterns;

impl TemplatePatterns {
    pub fn new() -> Self {
        Self
    }
}

/// Iterate `(placeholder, inner)` pairs such as `("${speed:1}", "speed:1")`.
fn placeholders(pattern: &str) -> Vec<(&str, &str)> {
    let mut found = Vec::new();
    let mut rest = pattern;
    let mut offset = 0;
    while let Some(start) = rest.find("${") {
        let open = offset + start;
        let Some(len) = pattern[open + 2..].find('}') else {
            break;
        };
        let close = open + 2 + len;
        found.push((&pattern[open..=close], &pattern[open + 2..close]));
        offset = close + 1;
        rest = &pattern[offset..];
    }
    found
}

fn format_value(value: &SampleValue, decimals: usize) -> String {
    match value {
        SampleValue::Number(v) => format!("{:.*}", decimals, v),
        SampleValue::Text(text) => text.clone(),
        SampleValue::Bool(b) => b.to_string(),
    }
}

impl PatternProvider for TemplatePatterns {
    fn label_from_datasource(&self, datasource: &Datasource, pattern: &str) -> String {
        let alias = datasource.alias_name.as_deref().unwrap_or(&datasource.name);
        pattern
            .replace("${entityName}", &datasource.entity_name)
            .replace("${deviceName}", &datasource.entity_name)
            .replace("${aliasName}", alias)
    }

    fn process_pattern(&self, pattern: &str, snapshot: &SampleSnapshot, ds_index: usize) -> ReplaceInfo {
        let variables = placeholders(pattern)
            .into_iter()
            .map(|(variable, inner)| {
                let (label, decimals) = match inner.split_once(':') {
                    Some((label, dec)) => (label, dec.trim().parse().unwrap_or(DEFAULT_DECIMALS)),
                    None => (inner, DEFAULT_DECIMALS),
                };

                let by_index = label
                    .strip_prefix('#')
                    .and_then(|idx| idx.parse::<usize>().ok());
                let column = by_index.or_else(|| {
                    snapshot
                        .data
                        .iter()
                        .position(|c| c.datasource == ds_index && c.data_key.label == label)
                });

                PatternVariable {
                    variable: variable.to_string(),
                    column,
                    decimals,
                }
            })
            .collect();

        ReplaceInfo { variables }
    }

    fn fill_pattern(&self, pattern: &str, info: &ReplaceInfo, snapshot: &SampleSnapshot) -> String {
        let mut result = pattern.to_string();
        for var in &info.variables {
            let text = var
                .column
                .and_then(|idx| snapshot.column(idx))
                .and_then(|column| column.latest())
                .map(|value| format_value(value, var.decimals))
                .unwrap_or_default();
            result = result.replace(&var.variable, &text);
        }
        result
    }

    fn to_label_value_map(&self, snapshot: &SampleSnapshot) -> LabelValueMap {
        let mut data = ValueMap::new();
        let mut ds_data = vec![ValueMap::new(); snapshot.datasources.len()];

        for column in &snapshot.data {
            let label = column.data_key.label.clone();
            let value = column.latest().cloned();
            if let Some(ds_map) = ds_data.get_mut(column.datasource) {
                ds_map.insert(label.clone(), value.clone());
            }
            data.insert(label, value);
        }

        LabelValueMap { data, ds_data }
    }
}
