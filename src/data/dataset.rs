use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use ndarray::{Array2, ArrayView1, Axis};

use crate::error::ScoutsError;

/// Cells × markers expression table.
///
/// Each row carries a free-text label; a row belongs to a sample when its
/// label contains the sample name. Missing measurements are stored as `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    labels: Vec<String>,
    markers: Vec<String>,
    values: Array2<f64>,
}

impl Dataset {
    pub fn new(labels: Vec<String>, markers: Vec<String>, values: Array2<f64>) -> anyhow::Result<Self> {
        let (n_rows, n_cols) = values.dim();
        if labels.len() != n_rows {
            return Err(ScoutsError::MalformedInput(format!(
                "{} row labels for {} rows",
                labels.len(),
                n_rows
            ))
            .into());
        }
        if markers.len() != n_cols {
            return Err(ScoutsError::MalformedInput(format!(
                "{} marker names for {} columns",
                markers.len(),
                n_cols
            ))
            .into());
        }
        if markers.is_empty() {
            return Err(ScoutsError::MalformedInput("no marker columns".to_string()).into());
        }
        let mut seen = HashSet::with_capacity(markers.len());
        if let Some(duplicate) = markers.iter().find(|m| !seen.insert(m.as_str())) {
            return Err(ScoutsError::MalformedInput(format!("duplicate marker '{}'", duplicate)).into());
        }
        Ok(Dataset {
            labels,
            markers,
            values,
        })
    }

    /// Builds a dataset from row-major records, one `(label, values)` per cell.
    pub fn from_rows<L, I>(markers: &[&str], rows: I) -> anyhow::Result<Self>
    where
        L: Into<String>,
        I: IntoIterator<Item = (L, Vec<f64>)>,
    {
        let n_markers = markers.len();
        let mut labels = Vec::new();
        let mut flat = Vec::new();
        for (row_idx, (label, values)) in rows.into_iter().enumerate() {
            if values.len() != n_markers {
                return Err(ScoutsError::MalformedInput(format!(
                    "row {} has {} values, expected {}",
                    row_idx,
                    values.len(),
                    n_markers
                ))
                .into());
            }
            labels.push(label.into());
            flat.extend(values);
        }
        let values = Array2::from_shape_vec((labels.len(), n_markers), flat)?;
        Self::new(
            labels,
            markers.iter().map(|m| m.to_string()).collect(),
            values,
        )
    }

    /// Reads a delimited-text table: header row, label column first, markers after.
    ///
    /// Empty cells become missing values; anything else must parse as a number.
    pub fn from_delimited<R: Read>(reader: R, delimiter: u8) -> anyhow::Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let header = csv_reader
            .headers()
            .map_err(|e| ScoutsError::MalformedInput(e.to_string()))?
            .clone();
        if header.len() < 2 {
            return Err(ScoutsError::MalformedInput(
                "header needs a label column and at least one marker".to_string(),
            )
            .into());
        }
        let markers: Vec<String> = header.iter().skip(1).map(|s| s.to_string()).collect();
        let n_markers = markers.len();

        let mut labels = Vec::new();
        let mut flat = Vec::new();
        for (row_idx, record) in csv_reader.records().enumerate() {
            let record = record.map_err(|e| ScoutsError::MalformedInput(e.to_string()))?;
            labels.push(record.get(0).unwrap_or_default().to_string());
            for (col_idx, field) in record.iter().skip(1).enumerate() {
                flat.push(parse_cell(field, row_idx, col_idx)?);
            }
        }

        let values = Array2::from_shape_vec((labels.len(), n_markers), flat)
            .map_err(|e| ScoutsError::MalformedInput(e.to_string()))?;
        Self::new(labels, markers, values)
    }

    /// Loads a `.csv`, `.tsv` or `.txt` (tab-separated) file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let delimiter = match extension.as_deref() {
            Some("csv") => b',',
            Some("tsv") | Some("txt") => b'\t',
            _ => {
                return Err(ScoutsError::UnsupportedFormat(path.display().to_string()).into());
            }
        };
        let file = std::fs::File::open(path)
            .map_err(|e| ScoutsError::MalformedInput(format!("{}: {}", path.display(), e)))?;
        let dataset = Self::from_delimited(std::io::BufReader::new(file), delimiter)?;
        log::info!(
            "Loaded {} cells x {} markers from {}",
            dataset.n_rows(),
            dataset.n_markers(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_markers(&self) -> usize {
        self.values.ncols()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn value(&self, row: usize, marker: usize) -> f64 {
        self.values[[row, marker]]
    }

    pub fn row(&self, row: usize) -> ArrayView1<'_, f64> {
        self.values.row(row)
    }

    pub fn marker_index(&self, marker: &str) -> Option<usize> {
        self.markers.iter().position(|m| m == marker)
    }

    pub fn belongs_to(&self, row: usize, sample: &str) -> bool {
        self.labels[row].contains(sample)
    }

    /// Indices of the rows whose label contains `sample`, in dataset order.
    pub fn rows_for_sample(&self, sample: &str) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(i, label)| if label.contains(sample) { Some(i) } else { None })
            .collect()
    }

    /// Copies the given rows (in the given order) into a new array.
    pub fn select_rows(&self, rows: &[usize]) -> Array2<f64> {
        self.values.select(Axis(0), rows)
    }

    /// Keeps only `rows`, renumbering them from zero.
    pub(crate) fn retain_rows(&mut self, rows: &[usize]) {
        self.values = self.values.select(Axis(0), rows);
        self.labels = rows.iter().map(|&i| self.labels[i].clone()).collect();
    }

    pub(crate) fn values_mut(&mut self) -> &mut Array2<f64> {
        &mut self.values
    }
}

fn parse_cell(field: &str, row: usize, col: usize) -> anyhow::Result<f64> {
    if field.is_empty() || field.eq_ignore_ascii_case("nan") || field.eq_ignore_ascii_case("na") {
        return Ok(f64::NAN);
    }
    field.parse::<f64>().map_err(|_| {
        ScoutsError::MalformedInput(format!(
            "invalid value '{}' at row {}, column {}",
            field, row, col
        ))
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Sample,CD44,CD45
Ct_001,1.0,2.0
Ct_002,3.5,
Drug_001,4.0,5.0
";

    #[test]
    fn reads_delimited_text_with_missing_cells() {
        let dataset = Dataset::from_delimited(CSV.as_bytes(), b',').unwrap();
        assert_eq!(dataset.n_rows(), 3);
        assert_eq!(dataset.markers(), &["CD44".to_string(), "CD45".to_string()]);
        assert_eq!(dataset.value(1, 0), 3.5);
        assert!(dataset.value(1, 1).is_nan());
        assert_eq!(dataset.rows_for_sample("Ct"), vec![0, 1]);
        assert_eq!(dataset.rows_for_sample("Drug"), vec![2]);
    }

    #[test]
    fn non_numeric_cell_is_malformed() {
        let csv = "Sample,CD44\nCt_001,high\n";
        let err = Dataset::from_delimited(csv.as_bytes(), b',').unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScoutsError>(),
            Some(ScoutsError::MalformedInput(_))
        ));
    }

    #[test]
    fn duplicate_marker_is_malformed() {
        let csv = "Sample,CD44,CD44\nCt_001,1.0,2.0\n";
        let err = Dataset::from_delimited(csv.as_bytes(), b',').unwrap_err();
        assert_eq!(
            err.downcast_ref::<ScoutsError>(),
            Some(&ScoutsError::MalformedInput("duplicate marker 'CD44'".to_string()))
        );

        let err = Dataset::from_rows(&["M", "N", "M"], [("A_1", vec![1.0, 2.0, 3.0])]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScoutsError>(),
            Some(ScoutsError::MalformedInput(_))
        ));
    }

    #[test]
    fn ragged_row_is_malformed() {
        let csv = "Sample,CD44,CD45\nCt_001,1.0\n";
        let err = Dataset::from_delimited(csv.as_bytes(), b',').unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScoutsError>(),
            Some(ScoutsError::MalformedInput(_))
        ));
    }

    #[test]
    fn spreadsheet_extension_is_unsupported() {
        let err = Dataset::from_path("cells.xlsx").unwrap_err();
        assert_eq!(
            err.downcast_ref::<ScoutsError>(),
            Some(&ScoutsError::UnsupportedFormat("cells.xlsx".to_string()))
        );
    }

    #[test]
    fn retain_rows_reindexes() {
        let mut dataset = Dataset::from_delimited(CSV.as_bytes(), b',').unwrap();
        dataset.retain_rows(&[0, 2]);
        assert_eq!(dataset.n_rows(), 2);
        assert_eq!(dataset.labels()[1], "Drug_001");
        assert_eq!(dataset.value(1, 1), 5.0);
    }
}
