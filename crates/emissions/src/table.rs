//! Time-indexed output tables and their CSV export.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use fire_common::{FireError, FireResult, Species, TimeResolution, YearRange};
use serde::Serialize;
use tracing::info;

use crate::reduce::ReductionResult;

/// Name of the time column in exports.
pub const TIME_COLUMN: &str = "Time";

/// One time step of an output table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub time: DateTime<Utc>,
    /// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
    pub label: String,
    pub preliminary: bool,
    /// One value per column; `None` where a column has no data.
    pub values: Vec<Option<f64>>,
}

/// Mean, min and max of one column over the rows that have a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Rows of named scalar columns, ordered by time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputTable {
    pub resolution: TimeResolution,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl OutputTable {
    pub fn new(resolution: TimeResolution, columns: Vec<String>) -> Self {
        Self {
            resolution,
            columns,
            rows: Vec::new(),
        }
    }

    /// Assemble a table from reduced time steps.
    ///
    /// `columns` pairs each band name with its column header; bands not
    /// listed are left out.
    pub fn from_results(
        resolution: TimeResolution,
        columns: &[(&str, &str)],
        results: &[ReductionResult],
    ) -> Self {
        let mut table = Self::new(
            resolution,
            columns.iter().map(|(_, header)| header.to_string()).collect(),
        );
        for result in results {
            let values = columns
                .iter()
                .map(|(band, _)| {
                    result
                        .values
                        .iter()
                        .find(|(name, _)| name == band)
                        .and_then(|(_, v)| *v)
                })
                .collect();
            table.rows.push(TableRow {
                time: result.time,
                label: resolution.format(&result.time),
                preliminary: result.preliminary,
                values,
            });
        }
        table.rows.sort_by_key(|r| r.time);
        table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column in row order.
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// True if any row is preliminary.
    pub fn any_preliminary(&self) -> bool {
        self.rows.iter().any(|r| r.preliminary)
    }

    /// Per-column mean, min and max across rows.
    pub fn summary(&self) -> Vec<ColumnSummary> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let values: Vec<f64> = self.rows.iter().filter_map(|r| r.values[i]).collect();
                let (mean, min, max) = if values.is_empty() {
                    (None, None, None)
                } else {
                    (
                        Some(values.iter().sum::<f64>() / values.len() as f64),
                        values.iter().copied().reduce(f64::min),
                        values.iter().copied().reduce(f64::max),
                    )
                };
                ColumnSummary {
                    column: column.clone(),
                    mean,
                    min,
                    max,
                }
            })
            .collect()
    }

    /// Write `Time` plus the columns as CSV. Missing values are empty cells.
    pub fn write_csv<W: Write>(&self, writer: W) -> FireResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        let header = std::iter::once(TIME_COLUMN).chain(self.columns.iter().map(String::as_str));
        csv.write_record(header).map_err(csv_error)?;
        for row in &self.rows {
            let record = std::iter::once(row.label.clone()).chain(
                row.values
                    .iter()
                    .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
            );
            csv.write_record(record).map_err(csv_error)?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> FireResult<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).map_err(|e| FireError::Internal(e.to_string()))
    }

    /// Write the table to `{dir}/{stem}.csv`, returning the path.
    pub fn export(&self, dir: impl AsRef<Path>, stem: &str) -> FireResult<std::path::PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.csv", stem));
        let file = std::fs::File::create(&path)?;
        self.write_csv(file)?;
        info!(path = %path.display(), rows = self.rows.len(), "Exported table");
        Ok(path)
    }
}

fn csv_error(err: csv::Error) -> FireError {
    FireError::Storage(format!("CSV write failed: {}", err))
}

/// Export file stem, e.g. `CO2_Tg_Annual_EQAS_2010_2012`.
pub fn export_stem(
    species: &Species,
    resolution: TimeResolution,
    region_name: &str,
    years: &YearRange,
) -> String {
    format!(
        "{}_Tg_{}_{}_{}_{}",
        species.band_name(),
        resolution.label(),
        region_name,
        years.start(),
        years.end()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fire_common::time::{month_start, year_start};

    fn results() -> Vec<ReductionResult> {
        vec![
            ReductionResult {
                time: year_start(2011).unwrap(),
                preliminary: false,
                values: vec![("GFEDv4s".into(), Some(2.0)), ("FINNv1p5".into(), None)],
            },
            ReductionResult {
                time: year_start(2010).unwrap(),
                preliminary: false,
                values: vec![("GFEDv4s".into(), Some(1.0)), ("FINNv1p5".into(), Some(0.5))],
            },
        ]
    }

    fn table() -> OutputTable {
        OutputTable::from_results(
            TimeResolution::Annual,
            &[("GFEDv4s", "GFEDv4s"), ("FINNv1p5", "FINNv1.5")],
            &results(),
        )
    }

    #[test]
    fn test_rows_sorted_and_labelled() {
        let t = table();
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows[0].label, "2010");
        assert_eq!(t.column("FINNv1.5").unwrap(), vec![Some(0.5), None]);
    }

    #[test]
    fn test_csv_output() {
        let csv = table().to_csv_string().unwrap();
        assert_eq!(csv, "Time,GFEDv4s,FINNv1.5\n2010,1,0.5\n2011,2,\n");
    }

    #[test]
    fn test_summary() {
        let summary = table().summary();
        assert_eq!(summary[0].mean, Some(1.5));
        assert_eq!(summary[0].min, Some(1.0));
        assert_eq!(summary[0].max, Some(2.0));
        assert_eq!(summary[1].mean, Some(0.5));
    }

    #[test]
    fn test_monthly_labels() {
        let results = vec![ReductionResult {
            time: month_start(2015, 3).unwrap(),
            preliminary: true,
            values: vec![("BA".into(), Some(1.0))],
        }];
        let t = OutputTable::from_results(TimeResolution::Monthly, &[("BA", "BA")], &results);
        assert_eq!(t.rows[0].label, "2015-03");
        assert!(t.any_preliminary());
    }

    #[test]
    fn test_export_stem() {
        let years = YearRange::new(2010, 2012).unwrap();
        assert_eq!(
            export_stem(&Species::Pm25, TimeResolution::Monthly, "EQAS", &years),
            "PM25_Tg_Monthly_EQAS_2010_2012"
        );
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = table().export(dir.path(), "CO_Tg_Annual_Global_2010_2011").unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("Time,GFEDv4s,FINNv1.5\n"));
    }
}
