use chrono::{Local, TimeZone};
use serde::Serialize;

use crate::dom::Element;
use crate::model::TimelineBucket;

/// Attribute a canvas carries its chart configuration in. The page script
/// hands it to Chart.js unchanged.
pub const CHART_ATTR: &str = "data-chart";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

/// Chart.js style configuration: `{ type, data: { labels, datasets } }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub data: ChartData,
}

/// Something a chart configuration can be drawn onto.
pub trait ChartSurface {
    fn draw(&mut self, config: &ChartConfig) -> serde_json::Result<()>;
}

impl ChartSurface for Element {
    fn draw(&mut self, config: &ChartConfig) -> serde_json::Result<()> {
        let json = serde_json::to_string(config)?;
        self.set_attr(CHART_ATTR, &json);
        Ok(())
    }
}

/// Line chart of requests per hour, labelled `HH:MM` in local time.
pub fn timeline_chart(timeline: &[TimelineBucket]) -> ChartConfig {
    timeline_chart_in(timeline, &Local)
}

pub fn timeline_chart_in<Tz: TimeZone>(timeline: &[TimelineBucket], tz: &Tz) -> ChartConfig
where
    Tz::Offset: std::fmt::Display,
{
    let labels = timeline
        .iter()
        .map(|b| b.start.with_timezone(tz).format("%H:%M").to_string())
        .collect();
    let data = timeline.iter().map(|b| b.requests).collect();

    ChartConfig {
        kind: ChartKind::Line,
        data: ChartData {
            labels,
            datasets: vec![Dataset {
                label: "Requests".to_string(),
                data,
            }],
        },
    }
}
