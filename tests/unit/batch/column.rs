use super::*;

#[test]
fn columns_know_their_length_and_type() {
    let c = Column::Float(vec![1.0, 2.0]);
    assert_eq!(c.len(), 2);
    assert!(!c.is_empty());
    assert_eq!(c.value_type(), ValueType::Float);

    assert_eq!(Column::Int(vec![]).len(), 0);
    assert!(Column::Int(vec![]).is_empty());
    assert_eq!(Column::Bool(vec![true]).value_type(), ValueType::Bool);
    assert_eq!(
        Column::Vector(vec![Vec3::ZERO]).value_type(),
        ValueType::Vector
    );
}

#[test]
fn batch_requires_equal_column_lengths() {
    let batch = Batch::new(vec![
        Column::Float(vec![1.0, 2.0]),
        Column::Int(vec![3, 4]),
    ])
    .unwrap();
    assert_eq!(batch.rows(), 2);
    assert_eq!(batch.columns().len(), 2);

    let err = Batch::new(vec![
        Column::Float(vec![1.0, 2.0]),
        Column::Int(vec![3]),
    ])
    .unwrap_err();
    assert!(err.to_string().contains("column length mismatch"));
}

#[test]
fn empty_batch_has_zero_rows() {
    assert_eq!(Batch::new(vec![]).unwrap().rows(), 0);
}

#[test]
fn rows_read_through_row_access() {
    let batch = Batch::new(vec![
        Column::Float(vec![1.0, 2.0]),
        Column::Int(vec![10, 20]),
        Column::Bool(vec![true, false]),
        Column::Vector(vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)]),
    ])
    .unwrap();

    let row = batch.row(1);
    assert_eq!(row.float(0), 2.0);
    assert_eq!(row.int(1), 20);
    assert!(!row.boolean(2));
    assert_eq!(row.vector(3), Vec3::new(0.0, 1.0, 0.0));
}

#[test]
fn mismatched_access_returns_defaults() {
    let batch = Batch::new(vec![Column::Int(vec![5])]).unwrap();
    let row = batch.row(0);
    // Wrong accessor for the column's type.
    assert_eq!(row.float(0), 0.0);
    assert!(!row.boolean(0));
    assert_eq!(row.vector(0), Vec3::ZERO);
    // Column index out of range.
    assert_eq!(row.int(7), 0);
}

#[test]
fn columns_serialize_with_snake_case_tags() {
    let json = serde_json::to_string(&Column::Int(vec![1, 2])).unwrap();
    assert_eq!(json, "{\"int\":[1,2]}");
    let back: Column = serde_json::from_str("{\"float\":[0.5]}").unwrap();
    assert_eq!(back, Column::Float(vec![0.5]));
}
