//! Canonicalization of the query endpoint's inconsistent success bodies.
//!
//! The remote service serializes query results in three shapes depending
//! on which server code path produced them: column-major arrays with
//! execution metadata, legacy row-object arrays, and bare acknowledgement
//! messages. One ordered classification maps all of them onto
//! [`QueryOutcome`]; callers never branch on raw fields.

use serde_json::Value;

use crate::error::{ClientError, ClientResult};

/// Canonical result of a query execution.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Tabular result rows.
    Rows {
        /// Column names, in result order.
        columns: Vec<String>,
        /// Row-major cell values; every row has `columns.len()` cells.
        rows: Vec<Vec<Value>>,
        /// Number of result rows.
        row_count: usize,
        /// Server-reported execution time.
        execution_time_ms: f64,
    },
    /// DDL/DML acknowledgement with no row data.
    Message {
        /// Server acknowledgement text.
        text: String,
    },
    /// Successful execution with nothing to display.
    Empty,
}

impl QueryOutcome {
    /// Number of result rows (zero for non-tabular outcomes).
    #[must_use]
    pub const fn row_count(&self) -> usize {
        match self {
            Self::Rows { row_count, .. } => *row_count,
            Self::Message { .. } | Self::Empty => 0,
        }
    }
}

/// Classify a raw query-endpoint body into a [`QueryOutcome`].
///
/// The order of checks is a deliberate tie-break: the array shape wins
/// over the legacy row-object shape because some server responses
/// populate both, and only the former carries execution metadata.
///
/// # Errors
///
/// Returns [`ClientError::UnexpectedFormat`] when the payload matches a
/// shape structurally but violates its invariants (most importantly a
/// row whose cell count differs from the column count, which downstream
/// rendering indexes positionally).
pub fn normalize(payload: &Value) -> ClientResult<QueryOutcome> {
    if let Some(data) = payload.get("data").and_then(Value::as_array)
        && !data.is_empty()
    {
        return normalize_array_shape(payload, data);
    }

    if let Some(rows) = payload.get("rows").and_then(Value::as_array)
        && !rows.is_empty()
    {
        return normalize_row_object_shape(rows);
    }

    if let Some(message) = payload.get("message").and_then(Value::as_str)
        && !message.is_empty()
    {
        return Ok(QueryOutcome::Message {
            text: message.to_string(),
        });
    }

    Ok(QueryOutcome::Empty)
}

fn normalize_array_shape(payload: &Value, data: &[Value]) -> ClientResult<QueryOutcome> {
    let columns = match payload.get("columns") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(names)) => names
            .iter()
            .map(|name| {
                name.as_str().map(str::to_string).ok_or_else(|| {
                    ClientError::unexpected_format("column name is not a string")
                })
            })
            .collect::<ClientResult<Vec<String>>>()?,
        Some(other) => {
            return Err(ClientError::unexpected_format(format!(
                "columns field is neither an array nor absent: {other}"
            )));
        }
    };

    let mut rows = Vec::with_capacity(data.len());
    for (index, row) in data.iter().enumerate() {
        let cells = row.as_array().ok_or_else(|| {
            ClientError::unexpected_format(format!("row {index} is not an array"))
        })?;
        if cells.len() != columns.len() {
            return Err(ClientError::unexpected_format(format!(
                "row {index} has {} cells but {} columns were reported",
                cells.len(),
                columns.len()
            )));
        }
        rows.push(cells.clone());
    }

    let execution_time_ms = payload
        .get("execution_time_ms")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    Ok(QueryOutcome::Rows {
        row_count: rows.len(),
        columns,
        rows,
        execution_time_ms,
    })
}

fn normalize_row_object_shape(rows: &[Value]) -> ClientResult<QueryOutcome> {
    let first = rows[0].as_object().ok_or_else(|| {
        ClientError::unexpected_format("legacy rows entry is not an object")
    })?;
    // serde_json is built with preserve_order, so this is the key
    // insertion order of the first row object.
    let columns: Vec<String> = first.keys().cloned().collect();

    let mut projected = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let object = row.as_object().ok_or_else(|| {
            ClientError::unexpected_format(format!("legacy row {index} is not an object"))
        })?;
        let cells = columns
            .iter()
            .map(|column| object.get(column).cloned().unwrap_or(Value::Null))
            .collect();
        projected.push(cells);
    }

    Ok(QueryOutcome::Rows {
        row_count: projected.len(),
        columns,
        rows: projected,
        execution_time_ms: 0.0,
    })
}
