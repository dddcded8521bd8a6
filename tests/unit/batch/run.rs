use super::*;

fn scalar_inputs() -> Vec<InputDef> {
    vec![
        InputDef::new("x", ValueType::Int),
        InputDef::new("y", ValueType::Float),
    ]
}

#[test]
fn blank_text_compiles_to_no_program() {
    for text in ["", "   ", "\t\n"] {
        let eval = BatchEval::new(text, scalar_inputs(), ValueType::Float).unwrap();
        assert!(eval.program().is_none(), "{text:?}");
    }

    let eval = BatchEval::new("x + 1", scalar_inputs(), ValueType::Float).unwrap();
    assert!(eval.program().is_some());
    assert_eq!(eval.output_type(), ValueType::Float);
    assert_eq!(eval.inputs().len(), 2);
}

#[test]
fn blank_program_fills_defaults() {
    let eval = BatchEval::new("", scalar_inputs(), ValueType::Int).unwrap();
    let batch = Batch::new(vec![
        Column::Int(vec![1, 2, 3]),
        Column::Float(vec![0.0; 3]),
    ])
    .unwrap();
    assert_eq!(eval.run(&batch).unwrap(), Column::Int(vec![0; 3]));

    let eval = BatchEval::new(" ", scalar_inputs(), ValueType::Vector).unwrap();
    assert_eq!(
        eval.run(&batch).unwrap(),
        Column::Vector(vec![Vec3::ZERO; 3])
    );
}

#[test]
fn run_computes_each_row() {
    let eval = BatchEval::new("x * 2 + y", scalar_inputs(), ValueType::Float).unwrap();
    let batch = Batch::new(vec![
        Column::Int(vec![1, 2, 3]),
        Column::Float(vec![0.5, 0.25, 0.125]),
    ])
    .unwrap();
    assert_eq!(
        eval.run(&batch).unwrap(),
        Column::Float(vec![2.5, 4.25, 6.125])
    );
}

#[test]
fn run_spans_multiple_chunks() {
    // Enough rows that several parallel tasks each get a chunk.
    let rows = 3 * MIN_GRAIN_SIZE + 17;
    let eval = BatchEval::new(
        "x * 2",
        vec![InputDef::new("x", ValueType::Int)],
        ValueType::Int,
    )
    .unwrap();
    let values: Vec<i32> = (0..rows as i32).collect();
    let batch = Batch::new(vec![Column::Int(values.clone())]).unwrap();

    let Column::Int(out) = eval.run(&batch).unwrap() else {
        panic!("expected int column");
    };
    assert_eq!(out.len(), rows);
    for (i, v) in out.iter().enumerate() {
        assert_eq!(*v, values[i] * 2, "row {i}");
    }
}

#[test]
fn batch_output_matches_row_at_a_time_eval() {
    let inputs = vec![
        InputDef::new("x", ValueType::Int),
        InputDef::new("v", ValueType::Vector),
    ];
    let eval = BatchEval::new("if(x > 1, v * 2, v)", inputs.clone(), ValueType::Vector).unwrap();
    let vectors: Vec<Vec3> = (0..5).map(|i| Vec3::new(i as f32, 1.0, -1.0)).collect();
    let batch = Batch::new(vec![
        Column::Int(vec![0, 1, 2, 3, 4]),
        Column::Vector(vectors),
    ])
    .unwrap();

    let Column::Vector(out) = eval.run(&batch).unwrap() else {
        panic!("expected vector column");
    };
    let program = eval.program().unwrap();
    for row in 0..batch.rows() {
        assert_eq!(Value::Vector(out[row]), program.eval(&batch.row(row)));
    }
}

#[test]
fn bool_output_column() {
    let eval = BatchEval::new("x > 2", vec![InputDef::new("x", ValueType::Int)], ValueType::Bool)
        .unwrap();
    let batch = Batch::new(vec![Column::Int(vec![1, 2, 3, 4])]).unwrap();
    assert_eq!(
        eval.run(&batch).unwrap(),
        Column::Bool(vec![false, false, true, true])
    );
}

#[test]
fn zero_rows_produce_an_empty_column() {
    let eval = BatchEval::new("x + 1", vec![InputDef::new("x", ValueType::Int)], ValueType::Int)
        .unwrap();
    let batch = Batch::new(vec![Column::Int(vec![])]).unwrap();
    assert_eq!(eval.run(&batch).unwrap(), Column::Int(vec![]));
}

#[test]
fn run_validates_the_column_layout() {
    let eval = BatchEval::new("x + y", scalar_inputs(), ValueType::Float).unwrap();

    let too_few = Batch::new(vec![Column::Int(vec![1])]).unwrap();
    let err = eval.run(&too_few).unwrap_err();
    assert!(err.to_string().contains("expected 2 input columns"));

    let wrong_type = Batch::new(vec![
        Column::Float(vec![1.0]),
        Column::Float(vec![1.0]),
    ])
    .unwrap();
    let err = eval.run(&wrong_type).unwrap_err();
    assert!(err.to_string().contains("'x'"), "{err}");
    assert!(err.to_string().contains("declared int"), "{err}");
}

#[test]
fn compile_errors_surface_from_new() {
    let err = BatchEval::new("x +", scalar_inputs(), ValueType::Float).unwrap_err();
    assert!(err.message().starts_with("expected an operand after operator"));
}
