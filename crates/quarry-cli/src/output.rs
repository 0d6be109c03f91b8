//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use quarry_api_models::{FileInfo, MetricsSnapshot, TableInfo};
use quarry_client::{QueryOutcome, TablePage};
use serde_json::{Value, json};

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

pub(crate) fn render_query_outcome(outcome: &QueryOutcome, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&query_outcome_json(outcome))?,
        OutputFormat::Table => match outcome {
            QueryOutcome::Rows {
                columns,
                rows,
                row_count,
                execution_time_ms,
            } => {
                print_grid(columns, rows);
                println!("{row_count} row(s) in {execution_time_ms:.2} ms");
            }
            QueryOutcome::Message { text } => println!("{text}"),
            QueryOutcome::Empty => println!("query returned no data"),
        },
    }
    Ok(())
}

pub(crate) fn render_table_page(page: &TablePage, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&json!({
            "columns": page.columns,
            "rows": page.rows,
            "current_page": page.current_page,
            "total_pages": page.total_pages,
            "total_rows": page.total_rows,
        }))?,
        OutputFormat::Table => {
            print_grid(&page.columns, &page.rows);
            if page.total_rows == 0 {
                println!("table is empty");
            } else {
                println!(
                    "rows {}-{} of {} (page {} of {})",
                    page.first_row_ordinal(),
                    page.last_row_ordinal(),
                    page.total_rows,
                    page.current_page,
                    page.total_pages
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_file_list(files: &[FileInfo], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(files)?,
        OutputFormat::Table => {
            println!("{:<32} {:>12} UPLOADED", "NAME", "SIZE");
            for file in files {
                println!(
                    "{:<32} {:>12} {}",
                    file.filename,
                    format_bytes(file.size),
                    file.uploaded_at
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_table_list(tables: &[TableInfo], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(tables)?,
        OutputFormat::Table => {
            println!("{:<32} {:>10} {:>8} CREATED", "NAME", "ROWS", "COLS");
            for table in tables {
                println!(
                    "{:<32} {:>10} {:>8} {}",
                    table.name,
                    table.row_count,
                    table.columns.len(),
                    table.created_at
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_metrics(snapshot: &MetricsSnapshot, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(snapshot)?,
        OutputFormat::Table => {
            println!("total queries:    {}", snapshot.total_queries);
            println!("avg query time:   {:.2} ms", snapshot.avg_execution_time_ms);
            println!("io operations:    {}", snapshot.total_io_operations);
            println!(
                "cache hit ratio:  {:.1}%",
                snapshot.buffer_cache_hit_ratio * 100.0
            );
            println!("active tables:    {}", snapshot.active_tables);
        }
    }
    Ok(())
}

fn query_outcome_json(outcome: &QueryOutcome) -> Value {
    match outcome {
        QueryOutcome::Rows {
            columns,
            rows,
            row_count,
            execution_time_ms,
        } => json!({
            "columns": columns,
            "rows": rows,
            "row_count": row_count,
            "execution_time_ms": execution_time_ms,
        }),
        QueryOutcome::Message { text } => json!({"message": text}),
        QueryOutcome::Empty => json!({}),
    }
}

fn print_grid(columns: &[String], rows: &[Vec<Value>]) {
    let mut widths: Vec<usize> = columns.iter().map(String::len).collect();
    let rendered: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(index, cell)| {
                    let text = value_to_cell(cell);
                    if let Some(width) = widths.get_mut(index)
                        && text.len() > *width
                    {
                        *width = text.len();
                    }
                    text
                })
                .collect()
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(name, width)| format!("{name:<width$}"))
        .collect();
    println!("{}", header.join("  "));
    for row in rendered {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(index, text)| {
                let width = widths.get(index).copied().unwrap_or(0);
                format!("{text:<width$}")
            })
            .collect();
        println!("{}", line.join("  "));
    }
}

/// Cell rendering keeps strings bare and marks SQL NULL explicitly;
/// everything else falls back to JSON notation.
pub(crate) fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;
    let value = bytes_to_f64(bytes);
    if value >= GIB {
        format!("{:.2} GiB", value / GIB)
    } else if value >= MIB {
        format!("{:.2} MiB", value / MIB)
    } else if value >= KIB {
        format!("{:.2} KiB", value / KIB)
    } else {
        format!("{bytes} B")
    }
}

const fn bytes_to_f64(value: u64) -> f64 {
    #[expect(
        clippy::cast_precision_loss,
        reason = "u64 to f64 conversion is required for human-readable byte formatting"
    )]
    {
        value as f64
    }
}
