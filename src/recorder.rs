// src/recorder.rs
use std::fs::File;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use chrono::Local;
use csv::Writer;
use serde::Serialize;
use tracing::info;

use crate::angles::AngleSet;
use crate::engine::AngleReport;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct AngleSample {
    pub timestamp: f64,
    pub frame: u64,
    /// One entry per angle, in table order.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AngleSummary {
    pub label: &'static str,
    pub samples: usize,
    /// Share of recorded frames that produced a value, in percent.
    pub coverage: f64,
    pub min: Option<f64>,
    pub mean: Option<f64>,
    pub max: Option<f64>,
}

/// Keeps the angle sequence of a capture and writes it out as CSV.
pub struct AngleRecorder<A: AngleSet> {
    output_dir: PathBuf,
    session_name: String,
    samples: Vec<AngleSample>,
    _angles: PhantomData<A>,
}

impl<A: AngleSet> AngleRecorder<A> {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name.unwrap_or_else(|| {
            format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"))
        });

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
            samples: Vec::new(),
            _angles: PhantomData,
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    pub fn record(&mut self, timestamp: f64, report: &AngleReport<A>) {
        let frame = self.samples.len() as u64;
        self.samples.push(AngleSample {
            timestamp,
            frame,
            values: report.iter().map(|(_, value)| value).collect(),
        });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[AngleSample] {
        &self.samples
    }

    /// `(timestamp, value)` pairs of one angle across the recording.
    pub fn series(&self, angle: A) -> Vec<(f64, Option<f64>)> {
        let Some(column) = A::ALL.iter().position(|a| *a == angle) else {
            return Vec::new();
        };
        self.samples
            .iter()
            .map(|sample| (sample.timestamp, sample.values[column]))
            .collect()
    }

    /// Header `timestamp,frame,<label>...`; absent angles are empty cells.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = Writer::from_writer(writer);

        let mut header = vec!["timestamp", "frame"];
        header.extend(A::labels());
        writer.write_record(&header)?;

        for sample in &self.samples {
            let mut row = Vec::with_capacity(sample.values.len() + 2);
            row.push(sample.timestamp.to_string());
            row.push(sample.frame.to_string());
            row.extend(
                sample
                    .values
                    .iter()
                    .map(|value| value.map(|v| format!("{v:.3}")).unwrap_or_default()),
            );
            writer.write_record(&row)?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn export_csv(&self) -> Result<PathBuf> {
        let csv_path = self.session_dir().join("angles.csv");
        if let Some(parent) = csv_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(&csv_path)?;
        self.write_csv(file)?;

        info!(path = %csv_path.display(), frames = self.samples.len(), "exported angle csv");
        Ok(csv_path)
    }

    pub fn summary(&self) -> Vec<AngleSummary> {
        A::ALL
            .iter()
            .enumerate()
            .map(|(column, angle)| {
                let values: Vec<f64> = self
                    .samples
                    .iter()
                    .filter_map(|sample| sample.values[column])
                    .collect();

                let coverage = if self.samples.is_empty() {
                    0.0
                } else {
                    values.len() as f64 / self.samples.len() as f64 * 100.0
                };
                let mean = (!values.is_empty())
                    .then(|| values.iter().sum::<f64>() / values.len() as f64);

                AngleSummary {
                    label: angle.label(),
                    samples: values.len(),
                    coverage,
                    min: values.iter().copied().reduce(f64::min),
                    mean,
                    max: values.iter().copied().reduce(f64::max),
                }
            })
            .collect()
    }

    pub fn generate_report(&self) -> Result<PathBuf> {
        let report_path = self.session_dir().join("report.html");
        if let Some(parent) = report_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&report_path, self.create_html_report())?;

        info!(path = %report_path.display(), "wrote session report");
        Ok(report_path)
    }

    fn create_html_report(&self) -> String {
        let fmt = |v: Option<f64>| v.map(|v| format!("{v:.1}°")).unwrap_or_else(|| "–".into());

        let rows: String = self
            .summary()
            .iter()
            .map(|s| {
                format!(
                    "        <tr><td>{}</td><td>{:.1}%</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                    s.label,
                    s.coverage,
                    fmt(s.min),
                    fmt(s.mean),
                    fmt(s.max)
                )
            })
            .collect();

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <title>Joint Angle Report - {session}</title>
    <style>
        body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 40px; background: #f5f5f5; }}
        h1 {{ color: #333; }}
        table {{ background: white; border-collapse: collapse; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
        th, td {{ padding: 8px 16px; text-align: left; border-bottom: 1px solid #eee; }}
        th {{ color: #666; }}
    </style>
</head>
<body>
    <h1>Joint Angle Session Report</h1>
    <h2>Session: {session}</h2>
    <p>Frames recorded: {frames}</p>
    <table>
        <tr><th>Angle</th><th>Coverage</th><th>Min</th><th>Mean</th><th>Max</th></tr>
{rows}    </table>
</body>
</html>
"#,
            session = self.session_name,
            frames = self.samples.len(),
            rows = rows,
        )
    }
}
