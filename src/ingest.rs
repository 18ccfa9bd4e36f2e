//! Arrow interchange
//!
//! Per-day cumulative aggregates arrive as long-format `RecordBatch`es with
//! one row per cell per day; running series leave as a `RecordBatch` with a
//! nullable statistic column.
//!
//! Proportion input columns:
//!
//! | column | type                          |
//! |--------|-------------------------------|
//! | `day`  | Int32 / Int64 / UInt32 / UInt64 |
//! | `cell` | Utf8 (`control`, `ctrl`, `treatment`, `test`) |
//! | `n`    | Int32 / Int64 / UInt32 / UInt64 |
//! | `conv` | Int32 / Int64 / UInt32 / UInt64 |
//!
//! Continuous input replaces `conv` with `mean` and `var` (Float32/Float64).

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
    UInt32Array, UInt64Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::cell::{Cell, ContinuousAggregate, Day, ProportionAggregate};
use crate::series::RunningSeries;
use crate::statistic::DailyAggregate;
use crate::{Error, Result};

/// Control and treatment histories, each sorted by day.
pub type CellHistories<A> = (Vec<A>, Vec<A>);

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    let index = batch
        .schema()
        .index_of(name)
        .map_err(|_| Error::InvalidInput(format!("Column not found: {name}")))?;
    Ok(batch.column(index))
}

fn null_at(name: &str, row: usize) -> Error {
    Error::InvalidInput(format!("Column {name} has a null at row {row}"))
}

/// Read a non-negative integer column as `u64`.
fn unsigned_column(batch: &RecordBatch, name: &str) -> Result<Vec<u64>> {
    let column = column(batch, name)?;
    let signed = |values: Vec<Option<i64>>| -> Result<Vec<u64>> {
        values
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                let v = v.ok_or_else(|| null_at(name, row))?;
                u64::try_from(v).map_err(|_| {
                    Error::InvalidInput(format!("Column {name} is negative at row {row}: {v}"))
                })
            })
            .collect()
    };
    let unsigned = |values: Vec<Option<u64>>| -> Result<Vec<u64>> {
        values
            .into_iter()
            .enumerate()
            .map(|(row, v)| v.ok_or_else(|| null_at(name, row)))
            .collect()
    };

    match column.data_type() {
        DataType::Int32 => {
            let array = column
                .as_any()
                .downcast_ref::<Int32Array>()
                .ok_or_else(|| Error::Other("Failed to downcast to Int32Array".to_string()))?;
            signed(array.iter().map(|v| v.map(i64::from)).collect())
        }
        DataType::Int64 => {
            let array = column
                .as_any()
                .downcast_ref::<Int64Array>()
                .ok_or_else(|| Error::Other("Failed to downcast to Int64Array".to_string()))?;
            signed(array.iter().collect())
        }
        DataType::UInt32 => {
            let array = column
                .as_any()
                .downcast_ref::<UInt32Array>()
                .ok_or_else(|| Error::Other("Failed to downcast to UInt32Array".to_string()))?;
            unsigned(array.iter().map(|v| v.map(u64::from)).collect())
        }
        DataType::UInt64 => {
            let array = column
                .as_any()
                .downcast_ref::<UInt64Array>()
                .ok_or_else(|| Error::Other("Failed to downcast to UInt64Array".to_string()))?;
            unsigned(array.iter().collect())
        }
        other => Err(Error::InvalidInput(format!(
            "Column {name} must be an integer type, got {other:?}"
        ))),
    }
}

fn float_column(batch: &RecordBatch, name: &str) -> Result<Vec<f64>> {
    let column = column(batch, name)?;
    let values: Vec<Option<f64>> = match column.data_type() {
        DataType::Float32 => column
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| Error::Other("Failed to downcast to Float32Array".to_string()))?
            .iter()
            .map(|v| v.map(f64::from))
            .collect(),
        DataType::Float64 => column
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| Error::Other("Failed to downcast to Float64Array".to_string()))?
            .iter()
            .collect(),
        other => {
            return Err(Error::InvalidInput(format!(
                "Column {name} must be a float type, got {other:?}"
            )))
        }
    };
    values
        .into_iter()
        .enumerate()
        .map(|(row, v)| v.ok_or_else(|| null_at(name, row)))
        .collect()
}

fn day_column(batch: &RecordBatch) -> Result<Vec<Day>> {
    unsigned_column(batch, "day")?
        .into_iter()
        .map(|d| {
            Day::try_from(d).map_err(|_| Error::InvalidInput(format!("Day out of range: {d}")))
        })
        .collect()
}

fn cell_column(batch: &RecordBatch) -> Result<Vec<Cell>> {
    let column = column(batch, "cell")?;
    if column.data_type() != &DataType::Utf8 {
        return Err(Error::InvalidInput(format!(
            "Column cell must be Utf8, got {:?}",
            column.data_type()
        )));
    }
    let array = column
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| Error::Other("Failed to downcast to StringArray".to_string()))?;
    array
        .iter()
        .enumerate()
        .map(|(row, label)| Cell::parse(label.ok_or_else(|| null_at("cell", row))?))
        .collect()
}

/// Split rows into per-cell histories sorted by day; a day may appear once
/// per cell.
fn split_cells<A: DailyAggregate>(rows: Vec<(Cell, A)>) -> Result<CellHistories<A>> {
    let (mut control, mut treatment): (Vec<A>, Vec<A>) = (Vec::new(), Vec::new());
    for (cell, aggregate) in rows {
        match cell {
            Cell::Control => control.push(aggregate),
            Cell::Treatment => treatment.push(aggregate),
        }
    }
    for (cell, history) in [(Cell::Control, &mut control), (Cell::Treatment, &mut treatment)] {
        history.sort_by_key(|a| a.day());
        if let Some(pair) = history.windows(2).find(|w| w[0].day() == w[1].day()) {
            return Err(Error::InvalidInput(format!(
                "Cell {cell} has more than one row for day {}",
                pair[0].day()
            )));
        }
    }
    Ok((control, treatment))
}

/// Read cumulative proportion aggregates from a long-format batch.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for missing or mistyped columns, nulls,
/// negative counts, unknown cell labels or duplicate days, and
/// [`Error::Domain`] if a row has more conversions than trials.
pub fn proportion_cells_from_batch(
    batch: &RecordBatch,
) -> Result<CellHistories<ProportionAggregate>> {
    let days = day_column(batch)?;
    let cells = cell_column(batch)?;
    let n = unsigned_column(batch, "n")?;
    let conv = unsigned_column(batch, "conv")?;

    let rows = (0..batch.num_rows())
        .map(|i| Ok((cells[i], ProportionAggregate::new(days[i], n[i], conv[i])?)))
        .collect::<Result<Vec<_>>>()?;
    split_cells(rows)
}

/// Read cumulative continuous aggregates from a long-format batch.
///
/// # Errors
///
/// As [`proportion_cells_from_batch`], plus [`Error::Domain`] for a
/// non-finite mean or an invalid variance.
pub fn continuous_cells_from_batch(
    batch: &RecordBatch,
) -> Result<CellHistories<ContinuousAggregate>> {
    let days = day_column(batch)?;
    let cells = cell_column(batch)?;
    let n = unsigned_column(batch, "n")?;
    let mean = float_column(batch, "mean")?;
    let var = float_column(batch, "var")?;

    let rows = (0..batch.num_rows())
        .map(|i| {
            Ok((
                cells[i],
                ContinuousAggregate::new(days[i], n[i], mean[i], var[i])?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    split_cells(rows)
}

/// Schema produced by [`series_to_batch`].
#[must_use]
pub fn series_schema() -> Schema {
    Schema::new(vec![
        Field::new("look", DataType::UInt64, false),
        Field::new("day", DataType::UInt32, false),
        Field::new("q", DataType::Float64, false),
        Field::new("n", DataType::Float64, false),
        Field::new("statistic", DataType::Float64, true),
        Field::new("degrees_of_freedom", DataType::Float64, true),
    ])
}

/// Export a running series; not-computable looks become null statistics.
///
/// # Errors
///
/// Returns [`Error::Arrow`] if the batch cannot be assembled.
pub fn series_to_batch(series: &RunningSeries) -> Result<RecordBatch> {
    let rows = series.rows();
    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from_iter_values(
            rows.iter().map(|r| r.look as u64),
        )),
        Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.day))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.q))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.n))),
        Arc::new(Float64Array::from(
            rows.iter().map(|r| r.statistic.value()).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            rows.iter()
                .map(|r| r.degrees_of_freedom)
                .collect::<Vec<_>>(),
        )),
    ];
    Ok(RecordBatch::try_new(Arc::new(series_schema()), columns)?)
}
