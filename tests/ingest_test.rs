//! Arrow ingest and export tests

use std::sync::Arc;

use arrow::array::{Array, Float64Array, Int64Array, StringArray, UInt32Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use trueno_seq::config::SequentialConfig;
use trueno_seq::ingest::{
    continuous_cells_from_batch, proportion_cells_from_batch, series_schema, series_to_batch,
};
use trueno_seq::session::{ProportionSession, WelchSession};
use trueno_seq::Error;

fn reference_proportion_batch() -> RecordBatch {
    let schema = Schema::new(vec![
        Field::new("day", DataType::UInt32, false),
        Field::new("cell", DataType::Utf8, false),
        Field::new("n", DataType::UInt64, false),
        Field::new("conv", DataType::UInt64, false),
    ]);
    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(UInt32Array::from(vec![0, 1, 2, 0, 1, 2])),
            Arc::new(StringArray::from(vec![
                "ctrl", "ctrl", "ctrl", "test", "test", "test",
            ])),
            Arc::new(UInt64Array::from(vec![100, 200, 300, 100, 200, 300])),
            Arc::new(UInt64Array::from(vec![10, 20, 30, 15, 32, 54])),
        ],
    )
    .unwrap()
}

#[test]
fn test_proportion_batch_feeds_session() {
    let (ctrl, test) = proportion_cells_from_batch(&reference_proportion_batch()).unwrap();
    let config = SequentialConfig::builder(1000).build().unwrap();
    let mut session = ProportionSession::proportions(config).unwrap();
    session.extend_days(ctrl.into_iter().zip(test)).unwrap();

    let eval = session.evaluate().unwrap();
    assert!((eval.statistic - 2.842_676).abs() < 1e-5);
}

#[test]
fn test_continuous_batch_and_nullable_export() {
    let schema = Schema::new(vec![
        Field::new("day", DataType::Int64, false),
        Field::new("cell", DataType::Utf8, false),
        Field::new("n", DataType::Int64, false),
        Field::new("mean", DataType::Float64, false),
        Field::new("var", DataType::Float64, false),
    ]);
    let batch = RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(Int64Array::from(vec![0, 0, 1, 1])),
            Arc::new(StringArray::from(vec!["control", "treatment", "control", "treatment"])),
            Arc::new(Int64Array::from(vec![0, 40, 50, 90])),
            Arc::new(Float64Array::from(vec![0.0, 21.0, 20.0, 21.5])),
            Arc::new(Float64Array::from(vec![0.0, 100.0, 100.0, 96.0])),
        ],
    )
    .unwrap();

    let (ctrl, test) = continuous_cells_from_batch(&batch).unwrap();
    assert_eq!(ctrl.len(), 2);
    assert_eq!(test[1].n(), 90);

    let config = SequentialConfig::builder(140)
        .max_information(10.0)
        .build()
        .unwrap();
    let mut session = WelchSession::welch(config).unwrap();
    session.extend_days(ctrl.into_iter().zip(test)).unwrap();
    let series = session.running_series().unwrap();

    let exported = series_to_batch(&series).unwrap();
    assert_eq!(exported.schema().as_ref(), &series_schema());
    assert_eq!(exported.num_rows(), 2);

    let statistic = exported
        .column(4)
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert!(statistic.is_null(0));
    assert!(!statistic.is_null(1));
    assert!(statistic.value(1) > 0.0);
}

#[test]
fn test_unknown_cell_label() {
    let schema = Schema::new(vec![
        Field::new("day", DataType::Int64, false),
        Field::new("cell", DataType::Utf8, false),
        Field::new("n", DataType::Int64, false),
        Field::new("conv", DataType::Int64, false),
    ]);
    let batch = RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(Int64Array::from(vec![0])),
            Arc::new(StringArray::from(vec!["holdout"])),
            Arc::new(Int64Array::from(vec![10])),
            Arc::new(Int64Array::from(vec![1])),
        ],
    )
    .unwrap();
    assert!(matches!(
        proportion_cells_from_batch(&batch),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn test_conversions_above_trials_is_domain() {
    let schema = Schema::new(vec![
        Field::new("day", DataType::Int64, false),
        Field::new("cell", DataType::Utf8, false),
        Field::new("n", DataType::Int64, false),
        Field::new("conv", DataType::Int64, false),
    ]);
    let batch = RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(Int64Array::from(vec![0])),
            Arc::new(StringArray::from(vec!["ctrl"])),
            Arc::new(Int64Array::from(vec![10])),
            Arc::new(Int64Array::from(vec![11])),
        ],
    )
    .unwrap();
    assert!(proportion_cells_from_batch(&batch).unwrap_err().is_domain());
}

#[test]
fn test_mean_column_must_be_float() {
    let schema = Schema::new(vec![
        Field::new("day", DataType::Int64, false),
        Field::new("cell", DataType::Utf8, false),
        Field::new("n", DataType::Int64, false),
        Field::new("mean", DataType::Int64, false),
        Field::new("var", DataType::Float64, false),
    ]);
    let batch = RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(Int64Array::from(vec![0])),
            Arc::new(StringArray::from(vec!["ctrl"])),
            Arc::new(Int64Array::from(vec![10])),
            Arc::new(Int64Array::from(vec![3])),
            Arc::new(Float64Array::from(vec![1.0])),
        ],
    )
    .unwrap();
    let err = continuous_cells_from_batch(&batch).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(ref msg) if msg.contains("mean")));
}
