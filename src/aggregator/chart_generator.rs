use crate::error::Result;
use crate::model::DailyStats;
use handlebars::Handlebars;
use pulldown_cmark::{Event, Options, Parser};
use serde::{Deserialize, Serialize};
use serde_json::json;
use super::milestone_fetcher::BurndownReport;

const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 48.0;
const MARGIN_BOTTOM: f64 = 96.0;
const Y_TICKS: usize = 5;

const OPEN_COLOR: &str = "#1f77b4";
const IDEAL_COLOR: &str = "#ff7f0e";
const OPENED_COLOR: &str = "#2ca02c";
const CLOSED_COLOR: &str = "#d62728";
const COMMITS_COLOR: &str = "#9467bd";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Svg,
    Html,
    Markdown,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "svg" => Ok(OutputFormat::Svg),
            "html" => Ok(OutputFormat::Html),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    pub title: Option<String>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
            title: None,
        }
    }
}

pub struct ChartGenerator {
    template_engine: Handlebars<'static>,
    format: OutputFormat,
    options: ChartOptions,
}

impl ChartGenerator {
    pub fn new(format: OutputFormat, options: ChartOptions) -> Result<Self> {
        let mut template_engine = Handlebars::new();
        template_engine.set_strict_mode(true);
        template_engine
            .register_template_string("chart", include_str!("../../templates/burndown.svg.hbs"))?;
        template_engine
            .register_template_string("summary", include_str!("../../templates/summary.md.hbs"))?;

        Ok(Self {
            template_engine,
            format,
            options,
        })
    }

    pub fn generate(&self, report: &BurndownReport) -> Result<String> {
        match self.format {
            OutputFormat::Svg => self.generate_svg(report),
            OutputFormat::Html => self.generate_html(report),
            OutputFormat::Markdown => self.generate_markdown(report),
            OutputFormat::Json => self.generate_json(report),
        }
    }

    fn title(&self, report: &BurndownReport) -> String {
        self.options
            .title
            .clone()
            .unwrap_or_else(|| format!("{}: {}", report.project, report.milestone.title))
    }

    fn generate_svg(&self, report: &BurndownReport) -> Result<String> {
        let layout = ChartLayout::new(
            f64::from(self.options.width),
            f64::from(self.options.height),
            report,
        );
        let data = layout.to_template_data(&self.title(report));
        Ok(self.template_engine.render("chart", &data)?)
    }

    fn generate_markdown(&self, report: &BurndownReport) -> Result<String> {
        let window = report.milestone.window;
        let rows: Vec<serde_json::Value> = report
            .series
            .iter()
            .map(|row| {
                json!({
                    "day": row.day.format("%Y-%m-%d").to_string(),
                    "total_open": row.total_open,
                    "ideal": format!("{:.1}", report.ideal.value_at(row.day)),
                    "opened": row.opened,
                    "closed": row.closed,
                    "commits": row.commits,
                })
            })
            .collect();

        let data = json!({
            "project": report.project,
            "milestone": {
                "number": report.milestone.number,
                "title": report.milestone.title,
                "state": report.milestone.state,
            },
            "start": window.start_date.format("%Y-%m-%d").to_string(),
            "end": window.end_date.format("%Y-%m-%d").to_string(),
            "days": report.series.len(),
            "total_issues": report.total_issues,
            "open_at_end": report.series.last().map_or(0, |row| row.total_open),
            "total_commits": report.total_commits,
            "commits_included": report.commits_included,
            "generated_at": report.generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            "rows": rows,
        });

        Ok(self.template_engine.render("summary", &data)?)
    }

    fn generate_json(&self, report: &BurndownReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }

    fn generate_html(&self, report: &BurndownReport) -> Result<String> {
        let markdown = self.generate_markdown(report)?;
        // raw HTML from titles is rendered as text, never passed through
        let parser = Parser::new_ext(&markdown, Options::ENABLE_TABLES).map(|event| match event {
            Event::Html(raw) => Event::Text(raw),
            other => other,
        });
        let mut html = String::new();
        pulldown_cmark::html::push_html(&mut html, parser);

        let svg = self.generate_svg(report)?;
        let title = escape_html(&self.title(report));

        Ok(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{}</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI',
                Helvetica, Arial, sans-serif;
            max-width: 1000px; margin: 0 auto; padding: 20px;
        }}
        h1, h2 {{ border-bottom: 1px solid #e1e4e8; padding-bottom: 0.3em; }}
        table {{ border-collapse: collapse; }}
        th, td {{ border: 1px solid #e1e4e8; padding: 4px 10px; }}
    </style>
</head>
<body>
    <figure class="chart">
{}
    </figure>
    {}
</body>
</html>"#,
            title, svg, html
        ))
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Pixel geometry for the SVG chart, computed from the report's series.
struct ChartLayout<'a> {
    report: &'a BurndownReport,
    width: f64,
    height: f64,
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
    y_max: usize,
    y_step: usize,
}

impl<'a> ChartLayout<'a> {
    fn new(width: f64, height: f64, report: &'a BurndownReport) -> Self {
        let largest = report
            .series
            .iter()
            .flat_map(|row| {
                let commits = if report.commits_included { row.commits } else { 0 };
                [row.total_open, row.opened, row.closed, commits]
            })
            .chain(std::iter::once(report.ideal.start.1))
            .max()
            .unwrap_or(0)
            .max(1);
        let y_step = largest.div_ceil(Y_TICKS).max(1);
        let y_max = largest.div_ceil(y_step) * y_step;

        Self {
            report,
            width,
            height,
            left: MARGIN_LEFT,
            right: (width - MARGIN_RIGHT).max(MARGIN_LEFT + 1.0),
            top: MARGIN_TOP,
            bottom: (height - MARGIN_BOTTOM).max(MARGIN_TOP + 1.0),
            y_max,
            y_step,
        }
    }

    fn slot_width(&self) -> f64 {
        (self.right - self.left) / self.report.series.len().max(1) as f64
    }

    fn x_center(&self, index: usize) -> f64 {
        self.left + self.slot_width() * (index as f64 + 0.5)
    }

    fn y(&self, value: f64) -> f64 {
        self.bottom - (value / self.y_max as f64) * (self.bottom - self.top)
    }

    fn polyline(&self, value: impl Fn(&DailyStats) -> f64) -> String {
        self.report
            .series
            .iter()
            .enumerate()
            .map(|(i, row)| format!("{:.1},{:.1}", self.x_center(i), self.y(value(row))))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn ideal_points(&self) -> String {
        let last = self.report.series.len().saturating_sub(1);
        let (_, start_value) = self.report.ideal.start;
        let (_, end_value) = self.report.ideal.end;
        format!(
            "{:.1},{:.1} {:.1},{:.1}",
            self.x_center(0),
            self.y(start_value as f64),
            self.x_center(last),
            self.y(end_value as f64)
        )
    }

    /// Opened and closed bars sit side by side, each 40% of a day slot.
    fn bars(&self, value: impl Fn(&DailyStats) -> usize, offset: f64) -> Vec<serde_json::Value> {
        let bar_width = self.slot_width() * 0.4;
        self.report
            .series
            .iter()
            .enumerate()
            .filter(|(_, row)| value(row) > 0)
            .map(|(i, row)| {
                let top = self.y(value(row) as f64);
                json!({
                    "x": format!("{:.1}", self.x_center(i) + offset * bar_width),
                    "y": format!("{:.1}", top),
                    "width": format!("{:.1}", bar_width),
                    "height": format!("{:.1}", self.bottom - top),
                    "day": row.day.format("%Y-%m-%d").to_string(),
                    "value": value(row),
                })
            })
            .collect()
    }

    fn y_ticks(&self) -> Vec<serde_json::Value> {
        (0..=self.y_max)
            .step_by(self.y_step)
            .map(|tick| {
                json!({
                    "y": format!("{:.1}", self.y(tick as f64)),
                    "x1": self.left,
                    "x2": self.right,
                    "label_x": self.left - 6.0,
                    "label": tick,
                })
            })
            .collect()
    }

    fn x_labels(&self) -> Vec<serde_json::Value> {
        self.report
            .series
            .iter()
            .enumerate()
            .map(|(i, row)| {
                json!({
                    "x": format!("{:.1}", self.x_center(i)),
                    "y": format!("{:.1}", self.bottom + 14.0),
                    "label": row.day.format("%m-%d").to_string(),
                })
            })
            .collect()
    }

    fn legend(&self) -> Vec<serde_json::Value> {
        let mut entries = vec![
            ("Total Issues", OPEN_COLOR),
            ("Ideal Burndown", IDEAL_COLOR),
            ("Issues Opened", OPENED_COLOR),
            ("Issues Closed", CLOSED_COLOR),
        ];
        if self.report.commits_included {
            entries.insert(2, ("Commits", COMMITS_COLOR));
        }

        let y = self.height - 24.0;
        let mut x = self.left;
        entries
            .into_iter()
            .map(|(label, color)| {
                let entry = json!({
                    "x": x,
                    "y": y,
                    "text_x": x + 16.0,
                    "text_y": y + 10.0,
                    "label": label,
                    "color": color,
                });
                x += 24.0 + label.len() as f64 * 6.5;
                entry
            })
            .collect()
    }

    fn to_template_data(&self, title: &str) -> serde_json::Value {
        let commit_points = if self.report.commits_included {
            self.polyline(|row| row.commits as f64)
        } else {
            String::new()
        };

        json!({
            "width": self.width,
            "height": self.height,
            "title": title,
            "title_x": self.width / 2.0,
            "axis": {
                "left": self.left,
                "right": self.right,
                "top": self.top,
                "bottom": self.bottom,
            },
            "y_ticks": self.y_ticks(),
            "x_labels": self.x_labels(),
            "opened_bars": self.bars(|row| row.opened, -1.0),
            "closed_bars": self.bars(|row| row.closed, 0.0),
            "ideal_points": self.ideal_points(),
            "total_open_points": self.polyline(|row| row.total_open as f64),
            "commit_points": commit_points,
            "legend": self.legend(),
        })
    }
}
