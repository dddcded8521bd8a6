use super::*;

#[test]
fn value_reports_its_type() {
    assert_eq!(Value::Float(1.0).value_type(), ValueType::Float);
    assert_eq!(Value::Int(-3).value_type(), ValueType::Int);
    assert_eq!(Value::Bool(true).value_type(), ValueType::Bool);
    assert_eq!(Value::Vector(Vec3::ZERO).value_type(), ValueType::Vector);
}

#[test]
fn defaults_are_neutral() {
    assert_eq!(Value::default_for(ValueType::Float), Value::Float(0.0));
    assert_eq!(Value::default_for(ValueType::Int), Value::Int(0));
    assert_eq!(Value::default_for(ValueType::Bool), Value::Bool(false));
    assert_eq!(
        Value::default_for(ValueType::Vector),
        Value::Vector(Vec3::ZERO)
    );
}

#[test]
fn value_type_display_names_are_stable() {
    assert_eq!(ValueType::Float.to_string(), "float");
    assert_eq!(ValueType::Int.to_string(), "int");
    assert_eq!(ValueType::Bool.to_string(), "bool");
    assert_eq!(ValueType::Vector.to_string(), "vector");
}

#[test]
fn vec3_dot_and_cross() {
    let x = Vec3::new(1.0, 0.0, 0.0);
    let y = Vec3::new(0.0, 1.0, 0.0);
    assert_eq!(x.dot(y), 0.0);
    assert_eq!(x.cross(y), Vec3::new(0.0, 0.0, 1.0));
    assert_eq!(y.cross(x), Vec3::new(0.0, 0.0, -1.0));
    assert_eq!(Vec3::new(2.0, 3.0, 4.0).dot(Vec3::new(5.0, 6.0, 7.0)), 56.0);
}

#[test]
fn vec3_lengths() {
    let v = Vec3::new(3.0, 4.0, 0.0);
    assert_eq!(v.length(), 5.0);
    assert_eq!(v.length_squared(), 25.0);
}

#[test]
fn vec3_normalized_keeps_direction() {
    let v = Vec3::new(0.0, 0.0, 8.0).normalized();
    assert_eq!(v, Vec3::new(0.0, 0.0, 1.0));
    // Zero length is not guarded.
    assert!(Vec3::ZERO.normalized().x.is_nan());
}

#[test]
fn vec3_operators() {
    let a = Vec3::new(1.0, 2.0, 3.0);
    let b = Vec3::new(4.0, 5.0, 6.0);
    assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
    assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
    assert_eq!(-a, Vec3::new(-1.0, -2.0, -3.0));
    assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
    assert_eq!(2.0 * a, a * 2.0);
    assert_eq!(b / 2.0, Vec3::new(2.0, 2.5, 3.0));
}

#[test]
fn serde_names_are_snake_case() {
    assert_eq!(
        serde_json::to_string(&ValueType::Vector).unwrap(),
        "\"vector\""
    );
    assert_eq!(
        serde_json::to_string(&Value::Float(1.5)).unwrap(),
        "{\"float\":1.5}"
    );
    let v: Value = serde_json::from_str("{\"int\":7}").unwrap();
    assert_eq!(v, Value::Int(7));
}
