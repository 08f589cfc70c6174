// Replay feed - plays back recorded subscription frames from a JSON file
use crate::application::feed::{FeedEvent, SnapshotFeed};
use crate::domain::snapshot::{DataColumn, DataKey, Datasource, SampleSnapshot};
use crate::domain::telemetry::{SampleValue, TimeSeriesPoint};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

/// Sample time as recorded: epoch milliseconds or an RFC 3339 string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

impl RawTimestamp {
    fn to_millis(&self) -> Result<i64> {
        match self {
            RawTimestamp::Millis(ms) => Ok(*ms),
            RawTimestamp::Text(text) => chrono::DateTime::parse_from_rfc3339(text)
                .map(|time| time.timestamp_millis())
                .with_context(|| format!("Invalid sample timestamp {:?}", text)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDatasource {
    name: String,
    entity_name: String,
    #[serde(default)]
    alias_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawColumn {
    datasource: usize,
    key: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    location_attr: Option<String>,
    #[serde(default)]
    samples: Vec<(RawTimestamp, SampleValue)>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFrame {
    Resize {
        resize: bool,
    },
    Snapshot {
        #[serde(default)]
        datasources: Vec<RawDatasource>,
        #[serde(default)]
        columns: Vec<RawColumn>,
    },
}

fn to_column(raw: RawColumn) -> Result<DataColumn> {
    let mut key = DataKey::new(raw.key);
    if let Some(label) = raw.label {
        key = key.with_label(label);
    }
    if let Some(attr) = raw.location_attr {
        key = key.with_location_attr(attr);
    }

    let data = raw
        .samples
        .into_iter()
        .map(|(time, value)| Ok(TimeSeriesPoint::new(time.to_millis()?, value)))
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Invalid samples for column {}", key.name))?;

    Ok(DataColumn::new(raw.datasource, key, data))
}

/// `None` for frames that carry no event, such as `{"resize": false}`.
fn to_event(frame: RawFrame) -> Result<Option<FeedEvent>> {
    match frame {
        RawFrame::Resize { resize } => Ok(resize.then_some(FeedEvent::Resize)),
        RawFrame::Snapshot { datasources, columns } => {
            let datasources = datasources
                .into_iter()
                .map(|ds| Datasource {
                    name: ds.name,
                    entity_name: ds.entity_name,
                    alias_name: ds.alias_name,
                })
                .collect();
            let data = columns.into_iter().map(to_column).collect::<Result<Vec<_>>>()?;
            Ok(Some(FeedEvent::Data(SampleSnapshot::new(datasources, data))))
        }
    }
}

pub struct ReplayFeed {
    events: VecDeque<FeedEvent>,
    interval: Duration,
    started: bool,
}

impl ReplayFeed {
    pub fn from_json(text: &str) -> Result<Self> {
        let frames: Vec<RawFrame> = serde_json::from_str(text).context("Failed to parse replay frames")?;
        let events = frames
            .into_iter()
            .enumerate()
            .filter_map(|(i, frame)| {
                to_event(frame)
                    .with_context(|| format!("Invalid replay frame {}", i))
                    .transpose()
            })
            .collect::<Result<VecDeque<_>>>()?;

        Ok(Self {
            events,
            interval: Duration::ZERO,
            started: false,
        })
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read replay file {}", path.display()))?;
        let feed = Self::from_json(&text)?;
        tracing::debug!("Loaded {} replay frames from {}", feed.events.len(), path.display());
        Ok(feed)
    }

    /// Pause between consecutive frames.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

#[async_trait]
impl SnapshotFeed for ReplayFeed {
    async fn next_event(&mut self) -> Result<Option<FeedEvent>> {
        if self.events.is_empty() {
            return Ok(None);
        }
        if self.started && !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
        self.started = true;
        Ok(self.events.pop_front())
    }
}
