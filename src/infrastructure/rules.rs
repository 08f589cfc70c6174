//! Scoring rules: user-authored Rhai function bodies that compute a marker
//! color or marker image from live data.
//!
//! A rule body is compiled once, wrapped into a function with a fixed
//! parameter list:
//!
//! - color rule: `fn color_rule(data, dsData, dsIndex)`
//! - marker image rule: `fn marker_image_rule(data, images, dsData, dsIndex)`
//!
//! `data` is the flat label -> latest value map, `dsData` an array of the
//! same maps per datasource, `dsIndex` the ordinal of the rule's datasource
//! and `images` the configured marker image catalog.

use crate::domain::geo::IconDescriptor;
use crate::domain::pattern::{LabelValueMap, ValueMap};
use crate::domain::telemetry::SampleValue;
use rhai::{AST, Array, Dynamic, Engine, Map, Scope};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Color,
    MarkerImage,
}

impl RuleKind {
    fn function_name(&self) -> &'static str {
        match self {
            RuleKind::Color => "color_rule",
            RuleKind::MarkerImage => "marker_image_rule",
        }
    }

    fn params(&self) -> &'static str {
        match self {
            RuleKind::Color => "data, dsData, dsIndex",
            RuleKind::MarkerImage => "data, images, dsData, dsIndex",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::Color => f.write_str("color"),
            RuleKind::MarkerImage => f.write_str("marker image"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("failed to compile {kind} rule: {message}")]
    Compile { kind: RuleKind, message: String },
    #[error("{kind} rule failed: {message}")]
    Runtime { kind: RuleKind, message: String },
    #[error("{kind} rule returned {found}, expected {expected}")]
    InvalidResult {
        kind: RuleKind,
        expected: &'static str,
        found: String,
    },
}

/// Shared, sandboxed Rhai engine used to compile and run every rule.
#[derive(Clone)]
pub struct RuleEngine {
    engine: Rc<Engine>,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEngine {
    pub fn new() -> Self {
        let mut engine = Engine::new();

        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(32);
        engine.set_max_operations(50_000);
        engine.set_max_string_size(4_096);
        engine.set_max_array_size(1_000);
        engine.set_max_map_size(500);

        Self {
            engine: Rc::new(engine),
        }
    }

    pub fn compile(&self, kind: RuleKind, body: &str) -> Result<ScoringRule, RuleError> {
        let script = format!("fn {}({}) {{\n{}\n}}", kind.function_name(), kind.params(), body);
        let ast = self.engine.compile(&script).map_err(|e| RuleError::Compile {
            kind,
            message: e.to_string(),
        })?;

        Ok(ScoringRule {
            engine: Rc::clone(&self.engine),
            ast,
            kind,
        })
    }
}

/// A compiled rule. Every invocation is independent: a failure affects only
/// that call.
pub struct ScoringRule {
    engine: Rc<Engine>,
    ast: AST,
    kind: RuleKind,
}

impl fmt::Debug for ScoringRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoringRule").field("kind", &self.kind).finish()
    }
}

fn to_dynamic(value: &Option<SampleValue>) -> Dynamic {
    match value {
        Some(SampleValue::Number(v)) => Dynamic::from_float(*v),
        Some(SampleValue::Bool(b)) => Dynamic::from_bool(*b),
        Some(SampleValue::Text(s)) => Dynamic::from(s.clone()),
        None => Dynamic::UNIT,
    }
}

fn to_rhai_map(values: &ValueMap) -> Map {
    values
        .iter()
        .map(|(label, value)| (label.as_str().into(), to_dynamic(value)))
        .collect()
}

fn to_rhai_ds_data(labels: &LabelValueMap) -> Array {
    labels
        .ds_data
        .iter()
        .map(|m| Dynamic::from_map(to_rhai_map(m)))
        .collect()
}

impl ScoringRule {
    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    fn call(&self, args: impl rhai::FuncArgs) -> Result<Dynamic, RuleError> {
        let mut scope = Scope::new();
        self.engine
            .call_fn::<Dynamic>(&mut scope, &self.ast, self.kind.function_name(), args)
            .map_err(|e| RuleError::Runtime {
                kind: self.kind,
                message: e.to_string(),
            })
    }

    /// Evaluate a color rule. The raw string is returned unnormalized.
    pub fn color(&self, labels: &LabelValueMap, ds_index: usize) -> Result<String, RuleError> {
        let result = self.call((
            Dynamic::from_map(to_rhai_map(&labels.data)),
            Dynamic::from_array(to_rhai_ds_data(labels)),
            ds_index as rhai::INT,
        ))?;

        let found = result.type_name().to_string();
        result.into_string().map_err(|_| RuleError::InvalidResult {
            kind: self.kind,
            expected: "string",
            found,
        })
    }

    /// Evaluate a marker image rule. `Ok(None)` means the rule chose no image.
    pub fn marker_image(
        &self,
        labels: &LabelValueMap,
        images: &[String],
        ds_index: usize,
        default_size: f64,
    ) -> Result<Option<IconDescriptor>, RuleError> {
        let catalog: Array = images.iter().map(|url| Dynamic::from(url.clone())).collect();
        let result = self.call((
            Dynamic::from_map(to_rhai_map(&labels.data)),
            Dynamic::from_array(catalog),
            Dynamic::from_array(to_rhai_ds_data(labels)),
            ds_index as rhai::INT,
        ))?;

        if result.is_unit() {
            return Ok(None);
        }

        let invalid = |found: String| RuleError::InvalidResult {
            kind: self.kind,
            expected: "map with `url` and `size`",
            found,
        };

        let found = result.type_name().to_string();
        let map = result.try_cast::<Map>().ok_or_else(|| invalid(found))?;

        let url = map
            .get("url")
            .and_then(|v| v.clone().into_string().ok())
            .ok_or_else(|| invalid("map without string `url`".to_string()))?;

        let size = match map.get("size") {
            None => default_size,
            Some(v) if v.is_unit() => default_size,
            Some(v) => v
                .as_float()
                .ok()
                .or_else(|| v.as_int().ok().map(|i| i as f64))
                .ok_or_else(|| invalid(format!("`size` of type {}", v.type_name())))?,
        };

        Ok(Some(IconDescriptor::new(url, size)))
    }
}
