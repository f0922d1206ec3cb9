//! CSV report writer

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use super::{EvaluationRow, RunSummary};
use crate::benchmarks::Column;
use crate::error::{BenchError, BenchResult};

/// `"{avg_score:.5f}_{YYYYMMDD_HHMMSS}.csv"`
pub fn report_file_name(avg_score: f64, timestamp: DateTime<Local>) -> String {
    format!("{:.5}_{}.csv", avg_score, timestamp.format("%Y%m%d_%H%M%S"))
}

/// Writes the per-item rows of a run
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Render rows with a header line matching `columns`
    pub fn render(columns: &[Column], rows: &[EvaluationRow]) -> BenchResult<Vec<u8>> {
        let mut writer = ::csv::Writer::from_writer(Vec::new());
        writer.write_record(columns.iter().map(Column::header))?;
        for row in rows {
            writer.write_record(columns.iter().map(|column| row.cell(*column)))?;
        }
        writer
            .into_inner()
            .map_err(|e| BenchError::Csv(::csv::Error::from(e.into_error())))
    }

    /// Write the report and return its path
    pub async fn write(
        &self,
        columns: &[Column],
        rows: &[EvaluationRow],
        summary: &RunSummary,
    ) -> BenchResult<PathBuf> {
        let path = self
            .dir
            .join(report_file_name(summary.avg_score, Local::now()));
        let content = Self::render(columns, rows)?;

        tokio::fs::write(&path, content)
            .await
            .map_err(|e| BenchError::output(&path, e))?;

        tracing::debug!(path = %path.display(), rows = rows.len(), "Wrote report");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmarks::DatasetKind;
    use crate::report::CostAggregation;
    use crate::scoring::Answer;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn rows() -> Vec<EvaluationRow> {
        vec![
            EvaluationRow {
                inputs: "Who?".to_string(),
                context: Some("Line one\nLine, two".to_string()),
                prediction: "barack hussein obama".to_string(),
                expected_output: Answer::from("Barack Obama"),
                score: 0.8,
                cost: 0.02,
            },
            EvaluationRow {
                inputs: "When?".to_string(),
                context: Some(String::new()),
                prediction: "1961".to_string(),
                expected_output: Answer::from("1961"),
                score: 1.0,
                cost: 0.03,
            },
        ]
    }

    #[test]
    fn test_file_name() {
        let timestamp = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(report_file_name(0.9, timestamp), "0.90000_20240309_140507.csv");
        assert_eq!(report_file_name(2.0 / 3.0, timestamp), "0.66667_20240309_140507.csv");
    }

    #[test]
    fn test_render_hotpotqa_columns() {
        let bytes = ReportWriter::render(DatasetKind::HotpotQa.columns(), &rows()).unwrap();
        let mut reader = ::csv::Reader::from_reader(bytes.as_slice());

        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            ["question", "context", "prediction", "expected_output", "score", "cost"]
        );

        let records: Vec<::csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][1], "Line one\nLine, two");
        assert_eq!(&records[0][4], "0.8");
        assert_eq!(&records[1][4], "1.0");
    }

    #[tokio::test]
    async fn test_write_names_file_after_score() {
        let dir = TempDir::new().unwrap();
        let rows = rows();
        let summary = RunSummary::from_rows(&rows, CostAggregation::Cumulative);

        let path = ReportWriter::new(dir.path())
            .write(DatasetKind::Drop.columns(), &rows, &summary)
            .await
            .unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("0.90000_"), "{name}");
        assert!(name.ends_with(".csv"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("inputs,prediction,expected_output,score,cost\n"));
    }
}
