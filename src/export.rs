//! TSV export for search results
//!
//! Rows are serialized through their JSON representation so the column
//! set matches the wire payload exactly: camelCase headers, arrays joined
//! with semicolons, nulls as empty cells.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Export is not valid UTF-8")]
    Encoding,

    #[error("Rows are not JSON objects")]
    NotObjects,
}

/// Render a slice of serializable rows as a TSV document.
///
/// Column order follows the first row's key order; rows missing a key
/// emit an empty cell. An empty slice produces an empty document since
/// there is no row to take headers from.
pub fn to_tsv<T: Serialize>(rows: &[T]) -> Result<String, ExportError> {
    if rows.is_empty() {
        return Ok(String::new());
    }

    let values: Vec<Value> = rows
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()?;

    let headers: Vec<String> = match &values[0] {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => return Err(ExportError::NotObjects),
    };

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(Vec::new());
    writer.write_record(&headers)?;

    for value in &values {
        let Value::Object(map) = value else {
            return Err(ExportError::NotObjects);
        };
        let record: Vec<String> = headers
            .iter()
            .map(|h| cell(map.get(h).unwrap_or(&Value::Null)))
            .collect();
        writer.write_record(&record)?;
    }

    let bytes = writer.into_inner().map_err(|_| ExportError::Encoding)?;
    String::from_utf8(bytes).map_err(|_| ExportError::Encoding)
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(cell)
            .collect::<Vec<_>>()
            .join(";"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Row {
        gene_symbol: String,
        score: Option<i64>,
        sources: Vec<String>,
    }

    #[test]
    fn headers_come_from_the_first_row() {
        let rows = vec![Row {
            gene_symbol: "TP53".into(),
            score: Some(3),
            sources: vec!["SIGNOR".into(), "CORUM".into()],
        }];
        let tsv = to_tsv(&rows).unwrap();
        let mut lines = tsv.lines();
        assert_eq!(lines.next(), Some("geneSymbol\tscore\tsources"));
        assert_eq!(lines.next(), Some("TP53\t3\tSIGNOR;CORUM"));
    }

    #[test]
    fn nulls_become_empty_cells() {
        let rows = vec![Row {
            gene_symbol: "KRAS".into(),
            score: None,
            sources: Vec::new(),
        }];
        let tsv = to_tsv(&rows).unwrap();
        assert_eq!(tsv.lines().nth(1), Some("KRAS\t\t"));
    }

    #[test]
    fn empty_input_produces_empty_document() {
        let rows: Vec<Row> = Vec::new();
        assert_eq!(to_tsv(&rows).unwrap(), "");
    }

    #[test]
    fn non_object_rows_are_rejected() {
        let rows = vec![1, 2, 3];
        assert!(matches!(to_tsv(&rows), Err(ExportError::NotObjects)));
    }
}
