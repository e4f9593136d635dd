//! Plotly figure definitions for each dashboard panel.
//!
//! Figures are plain JSON (`{"data": [...], "layout": {...}}`) that the page
//! hands to `Plotly.newPlot`, so nothing here depends on a plotting library.

use serde_json::{json, Value};

use crate::pipeline::summary::Counts;

/// Colour sets for categorical charts
pub const PASTEL: &[&str] = &[
    "rgb(102, 197, 204)", "rgb(246, 207, 113)", "rgb(248, 156, 116)", "rgb(220, 176, 242)",
    "rgb(135, 197, 95)", "rgb(158, 185, 243)", "rgb(254, 136, 177)", "rgb(201, 219, 116)",
];
pub const SAFE: &[&str] = &[
    "rgb(136, 204, 238)", "rgb(204, 102, 119)", "rgb(221, 204, 119)", "rgb(17, 119, 51)",
    "rgb(51, 34, 136)", "rgb(170, 68, 153)", "rgb(68, 170, 153)", "rgb(153, 153, 51)",
];
pub const SET1: &[&str] = &[
    "rgb(228, 26, 28)", "rgb(55, 126, 184)", "rgb(77, 175, 74)", "rgb(152, 78, 163)",
    "rgb(255, 127, 0)",
];

/// A chart type the dashboard knows how to draw
#[derive(Debug, Clone, PartialEq)]
pub enum ChartKind {
    /// Pie with a hole; slices labelled with percent and label
    Donut { legend_title: String, palette: &'static [&'static str] },
    /// Ranked list drawn as horizontal bars, largest at the top
    RankedBar { value_label: String, category_label: String, colorscale: String, left_margin: u32 },
    /// One vertical bar per category, each in its own colour
    CategoryBar { value_label: String, category_label: String, palette: &'static [&'static str] },
}

/// A single panel: identifier, title, chart type and data
#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
}

impl ChartSpec {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: ChartKind) -> Self {
        Self { id: id.into(), title: title.into(), kind }
    }

    /// Plotly figure for `counts`
    pub fn figure(&self, counts: &Counts) -> Value {
        let labels: Vec<&str> = counts.iter().map(|(label, _)| label.as_str()).collect();
        let values: Vec<usize> = counts.iter().map(|(_, count)| *count).collect();

        match &self.kind {
            ChartKind::Donut { legend_title, palette } => json!({
                "data": [{
                    "type": "pie",
                    "labels": labels,
                    "values": values,
                    "hole": 0.4,
                    "textposition": "inside",
                    "textinfo": "percent+label",
                    "pull": vec![0.05; counts.len()],
                    "marker": { "colors": cycle(palette, counts.len()) },
                }],
                "layout": {
                    "title": { "text": self.title },
                    "legend": { "title": { "text": legend_title } },
                },
            }),
            ChartKind::RankedBar { value_label, category_label, colorscale, left_margin } => {
                // Plotly draws the first bar at the bottom
                let ascending: Vec<(&str, usize)> =
                    labels.iter().copied().zip(values.iter().copied()).rev().collect();
                let bar_labels: Vec<&str> = ascending.iter().map(|(l, _)| *l).collect();
                let bar_values: Vec<usize> = ascending.iter().map(|(_, v)| *v).collect();
                json!({
                    "data": [{
                        "type": "bar",
                        "orientation": "h",
                        "x": bar_values,
                        "y": bar_labels,
                        "text": bar_values,
                        "textposition": "outside",
                        "marker": { "color": bar_values, "colorscale": colorscale },
                    }],
                    "layout": {
                        "title": { "text": self.title },
                        "xaxis": { "title": { "text": value_label } },
                        "yaxis": { "title": { "text": category_label }, "categoryorder": "total ascending" },
                        "margin": { "l": left_margin },
                    },
                })
            }
            ChartKind::CategoryBar { value_label, category_label, palette } => json!({
                "data": [{
                    "type": "bar",
                    "x": labels,
                    "y": values,
                    "text": values,
                    "textposition": "outside",
                    "marker": { "color": cycle(palette, counts.len()) },
                }],
                "layout": {
                    "title": { "text": self.title },
                    "xaxis": { "title": { "text": category_label } },
                    "yaxis": { "title": { "text": value_label } },
                },
            }),
        }
    }
}

fn cycle(palette: &[&str], len: usize) -> Vec<String> {
    palette.iter().cycle().take(len).map(|c| c.to_string()).collect()
}
