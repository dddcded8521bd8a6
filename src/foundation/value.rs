//! Public value model: declared types, tagged runtime values and the
//! 3-component vector used by vector expressions.

use std::ops;

/// Declared type of an input variable or of a program's output.
///
/// Booleans exist only at this boundary; on the evaluation stack they are
/// stored as 32-bit integers (0 or 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// 32-bit IEEE-754 float.
    Float,
    /// 32-bit two's-complement integer.
    Int,
    /// Boolean, materialized from the integer 0/1 at the output boundary.
    Bool,
    /// 3-component float vector.
    Vector,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueType::Float => "float",
            ValueType::Int => "int",
            ValueType::Bool => "bool",
            ValueType::Vector => "vector",
        };
        f.write_str(name)
    }
}

/// A 3-component float vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// All-zero vector.
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Build a vector from its components.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Dot product.
    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Right-handed cross product.
    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Euclidean length.
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Squared length.
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Unit-length copy. Not guarded against zero length; a zero vector
    /// normalizes to NaN components.
    pub fn normalized(self) -> Vec3 {
        self / self.length()
    }
}

impl ops::Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl ops::Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl ops::Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl ops::Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl ops::Mul<Vec3> for f32 {
    type Output = Vec3;

    fn mul(self, rhs: Vec3) -> Vec3 {
        rhs * self
    }
}

impl ops::Div<f32> for Vec3 {
    type Output = Vec3;

    fn div(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

/// A typed value crossing the compile/evaluate boundary.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// Scalar float.
    Float(f32),
    /// Scalar integer.
    Int(i32),
    /// Boolean.
    Bool(bool),
    /// 3-component vector.
    Vector(Vec3),
}

impl Value {
    /// The [`ValueType`] this value carries.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Float(_) => ValueType::Float,
            Value::Int(_) => ValueType::Int,
            Value::Bool(_) => ValueType::Bool,
            Value::Vector(_) => ValueType::Vector,
        }
    }

    /// The neutral default for a type: `0.0`, `0`, `false` or the zero
    /// vector. Used when an empty expression means "nothing to compute".
    pub fn default_for(ty: ValueType) -> Value {
        match ty {
            ValueType::Float => Value::Float(0.0),
            ValueType::Int => Value::Int(0),
            ValueType::Bool => Value::Bool(false),
            ValueType::Vector => Value::Vector(Vec3::ZERO),
        }
    }
}

/// One declared input: a name and the type its per-row values will have.
///
/// The compiler resolves identifiers against an ordered slice of these by
/// exact, case-sensitive name match. The declarations are only read during
/// compilation; a compiled [`Program`](crate::Program) does not retain them.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InputDef {
    /// Identifier the expression refers to this input by.
    pub name: String,
    /// Type every row must supply for this input.
    pub value_type: ValueType,
}

impl InputDef {
    /// Build an input declaration.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/value.rs"]
mod tests;
