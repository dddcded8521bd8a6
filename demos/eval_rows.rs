use rowexpr::{Batch, BatchEval, Column, InputDef, ValueType};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let inputs = vec![
        InputDef::new("height", ValueType::Float),
        InputDef::new("limit", ValueType::Float),
    ];
    let eval = BatchEval::new("min(height * 0.5, limit)", inputs, ValueType::Float)?;

    let batch = Batch::new(vec![
        Column::Float(vec![4.0, 18.0, 31.5, 60.0]),
        Column::Float(vec![10.0, 10.0, 12.0, 12.0]),
    ])?;

    let Column::Float(values) = eval.run(&batch)? else {
        anyhow::bail!("expected a float column");
    };
    for (row, v) in values.iter().enumerate() {
        println!("row {row}: {v}");
    }

    Ok(())
}
