//! Token model shared by the parser, the code generator and the VM.
//!
//! A token is a kind plus one 32-bit payload slot. The same representation
//! is used for the parsed infix stream and for the compiled postfix program;
//! the static [`TokenInfo`] table is the single source of truth for
//! precedence, arity and argument/result types.

use std::fmt;

use smallvec::SmallVec;

/// Type of one logical value on the simulated (and runtime) stack.
///
/// Booleans are not a slot type; they live on the stack as `Int`. A vector
/// occupies three contiguous scalar slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SlotType {
    Float,
    Int,
    Vec,
}

impl SlotType {
    /// Scalar slots occupied by a value of this type.
    pub(crate) fn slots(self) -> usize {
        match self {
            SlotType::Vec => 3,
            SlotType::Float | SlotType::Int => 1,
        }
    }

    pub(crate) fn is_scalar(self) -> bool {
        self != SlotType::Vec
    }
}

/// Every token kind. Untyped operators double as their float-specialized
/// form; the code generator swaps in the `*Int`/`*Vec` variants once operand
/// types are known, so the VM never branches on value type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TokenKind {
    // Operands.
    ConstFloat,
    ConstInt,
    VarFloat,
    VarInt,
    VarBool,
    VarVec,
    // Structural.
    LParen,
    RParen,
    Comma,
    // Operators.
    Neg,
    NegInt,
    NegVec,
    Not,
    Add,
    AddInt,
    AddVec,
    Sub,
    SubInt,
    SubVec,
    Mul,
    MulInt,
    MulFloatVec,
    MulVecFloat,
    Div,
    DivInt,
    DivVecFloat,
    Pow,
    PowInt,
    Mod,
    ModInt,
    Eq,
    EqInt,
    EqVec,
    Ne,
    NeInt,
    NeVec,
    Gt,
    GtInt,
    Ge,
    GeInt,
    Lt,
    LtInt,
    Le,
    LeInt,
    And,
    Or,
    // Postfix.
    Member,
    // Functions.
    Sqrt,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Max,
    MaxInt,
    Min,
    MinInt,
    Abs,
    AbsInt,
    Sign,
    SignInt,
    Radians,
    Degrees,
    MakeVec,
    NotFn,
    Log,
    Ln,
    PowFn,
    Exp,
    If,
    IfInt,
    IfVec,
    Ceil,
    Floor,
    Fract,
    Round,
    Trunc,
    Compare,
    CompareVec,
    Dot,
    Cross,
    Normalize,
    Length,
    LengthSq,
    // Conversions (emitted by the code generator only).
    IntToFloat,
    FloatToInt,
}

/// Static description of one token kind.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TokenInfo {
    pub(crate) kind: TokenKind,
    pub(crate) name: &'static str,
    pub(crate) precedence: i8,
    pub(crate) arity: u8,
    pub(crate) result: Option<SlotType>,
    pub(crate) args: [Option<SlotType>; 3],
}

// Shorthands to keep the table rows on one line each.
const FL: Option<SlotType> = Some(SlotType::Float);
const IN: Option<SlotType> = Some(SlotType::Int);
const VE: Option<SlotType> = Some(SlotType::Vec);
const NO: Option<SlotType> = None;

use TokenKind as K;

macro_rules! row {
    ($kind:expr, $name:expr, $prec:expr, $arity:expr, $result:expr, $a1:expr, $a2:expr, $a3:expr) => {
        TokenInfo {
            kind: $kind,
            name: $name,
            precedence: $prec,
            arity: $arity,
            result: $result,
            args: [$a1, $a2, $a3],
        }
    };
}

/// Precedence tiers, low to high: `or` < `and` < comparisons < `+ -` <
/// `* / %` < `^` < unary < member access and functions. Equal precedence
/// shunts left-to-right, so every operator (including `^`) is
/// left-associative.
pub(crate) const TOKEN_INFO: [TokenInfo; TokenKind::COUNT] = [
    row!(K::ConstFloat, "const_f", 0, 0, FL, NO, NO, NO),
    row!(K::ConstInt, "const_i", 0, 0, IN, NO, NO, NO),
    row!(K::VarFloat, "var_f", 0, 0, FL, NO, NO, NO),
    row!(K::VarInt, "var_i", 0, 0, IN, NO, NO, NO),
    row!(K::VarBool, "var_b", 0, 0, IN, NO, NO, NO),
    row!(K::VarVec, "var_v", 0, 0, VE, NO, NO, NO),
    row!(K::LParen, "(", 0, 0, NO, NO, NO, NO),
    row!(K::RParen, ")", 0, 0, NO, NO, NO, NO),
    row!(K::Comma, ",", 0, 0, NO, NO, NO, NO),
    row!(K::Neg, "unary -", 7, 1, FL, FL, NO, NO),
    row!(K::NegInt, "unary - (int)", 7, 1, IN, IN, NO, NO),
    row!(K::NegVec, "unary - (vec)", 7, 1, VE, VE, NO, NO),
    row!(K::Not, "!", 7, 1, IN, IN, NO, NO),
    row!(K::Add, "+", 4, 2, FL, FL, FL, NO),
    row!(K::AddInt, "+ (int)", 4, 2, IN, IN, IN, NO),
    row!(K::AddVec, "+ (vec)", 4, 2, VE, VE, VE, NO),
    row!(K::Sub, "-", 4, 2, FL, FL, FL, NO),
    row!(K::SubInt, "- (int)", 4, 2, IN, IN, IN, NO),
    row!(K::SubVec, "- (vec)", 4, 2, VE, VE, VE, NO),
    row!(K::Mul, "*", 5, 2, FL, FL, FL, NO),
    row!(K::MulInt, "* (int)", 5, 2, IN, IN, IN, NO),
    row!(K::MulFloatVec, "* (float,vec)", 5, 2, VE, FL, VE, NO),
    row!(K::MulVecFloat, "* (vec,float)", 5, 2, VE, VE, FL, NO),
    row!(K::Div, "/", 5, 2, FL, FL, FL, NO),
    row!(K::DivInt, "/ (int)", 5, 2, IN, IN, IN, NO),
    row!(K::DivVecFloat, "/ (vec,float)", 5, 2, VE, VE, FL, NO),
    row!(K::Pow, "^", 6, 2, FL, FL, FL, NO),
    row!(K::PowInt, "^ (int)", 6, 2, IN, IN, IN, NO),
    row!(K::Mod, "%", 5, 2, FL, FL, FL, NO),
    row!(K::ModInt, "% (int)", 5, 2, IN, IN, IN, NO),
    row!(K::Eq, "==", 3, 2, IN, FL, FL, NO),
    row!(K::EqInt, "== (int)", 3, 2, IN, IN, IN, NO),
    row!(K::EqVec, "== (vec)", 3, 2, IN, VE, VE, NO),
    row!(K::Ne, "!=", 3, 2, IN, FL, FL, NO),
    row!(K::NeInt, "!= (int)", 3, 2, IN, IN, IN, NO),
    row!(K::NeVec, "!= (vec)", 3, 2, IN, VE, VE, NO),
    row!(K::Gt, ">", 3, 2, IN, FL, FL, NO),
    row!(K::GtInt, "> (int)", 3, 2, IN, IN, IN, NO),
    row!(K::Ge, ">=", 3, 2, IN, FL, FL, NO),
    row!(K::GeInt, ">= (int)", 3, 2, IN, IN, IN, NO),
    row!(K::Lt, "<", 3, 2, IN, FL, FL, NO),
    row!(K::LtInt, "< (int)", 3, 2, IN, IN, IN, NO),
    row!(K::Le, "<=", 3, 2, IN, FL, FL, NO),
    row!(K::LeInt, "<= (int)", 3, 2, IN, IN, IN, NO),
    row!(K::And, "and", 2, 2, IN, IN, IN, NO),
    row!(K::Or, "or", 1, 2, IN, IN, IN, NO),
    row!(K::Member, ".member", 8, 1, FL, VE, NO, NO),
    row!(K::Sqrt, "sqrt", 8, 1, FL, FL, NO, NO),
    row!(K::Sin, "sin", 8, 1, FL, FL, NO, NO),
    row!(K::Cos, "cos", 8, 1, FL, FL, NO, NO),
    row!(K::Tan, "tan", 8, 1, FL, FL, NO, NO),
    row!(K::Asin, "asin", 8, 1, FL, FL, NO, NO),
    row!(K::Acos, "acos", 8, 1, FL, FL, NO, NO),
    row!(K::Atan, "atan", 8, 1, FL, FL, NO, NO),
    row!(K::Atan2, "atan2", 8, 2, FL, FL, FL, NO),
    row!(K::Max, "max", 8, 2, FL, FL, FL, NO),
    row!(K::MaxInt, "max (int)", 8, 2, IN, IN, IN, NO),
    row!(K::Min, "min", 8, 2, FL, FL, FL, NO),
    row!(K::MinInt, "min (int)", 8, 2, IN, IN, IN, NO),
    row!(K::Abs, "abs", 8, 1, FL, FL, NO, NO),
    row!(K::AbsInt, "abs (int)", 8, 1, IN, IN, NO, NO),
    row!(K::Sign, "sign", 8, 1, IN, FL, NO, NO),
    row!(K::SignInt, "sign (int)", 8, 1, IN, IN, NO, NO),
    row!(K::Radians, "to_radians", 8, 1, FL, FL, NO, NO),
    row!(K::Degrees, "to_degrees", 8, 1, FL, FL, NO, NO),
    row!(K::MakeVec, "vec", 8, 3, VE, FL, FL, FL),
    row!(K::NotFn, "not", 8, 1, IN, IN, NO, NO),
    row!(K::Log, "log", 8, 2, FL, FL, FL, NO),
    row!(K::Ln, "ln", 8, 1, FL, FL, NO, NO),
    row!(K::PowFn, "pow", 8, 2, FL, FL, FL, NO),
    row!(K::Exp, "exp", 8, 1, FL, FL, NO, NO),
    row!(K::If, "if", 8, 3, FL, IN, FL, FL),
    row!(K::IfInt, "if (int)", 8, 3, IN, IN, IN, IN),
    row!(K::IfVec, "if (vec)", 8, 3, VE, IN, VE, VE),
    row!(K::Ceil, "ceil", 8, 1, FL, FL, NO, NO),
    row!(K::Floor, "floor", 8, 1, FL, FL, NO, NO),
    row!(K::Fract, "frac", 8, 1, FL, FL, NO, NO),
    row!(K::Round, "round", 8, 1, FL, FL, NO, NO),
    row!(K::Trunc, "trunc", 8, 1, FL, FL, NO, NO),
    row!(K::Compare, "compare", 8, 3, IN, FL, FL, FL),
    row!(K::CompareVec, "compare (vec)", 8, 3, IN, VE, VE, FL),
    row!(K::Dot, "dot", 8, 2, FL, VE, VE, NO),
    row!(K::Cross, "cross", 8, 2, VE, VE, VE, NO),
    row!(K::Normalize, "normalize", 8, 1, VE, VE, NO, NO),
    row!(K::Length, "length", 8, 1, FL, VE, NO, NO),
    row!(K::LengthSq, "length2", 8, 1, FL, VE, NO, NO),
    row!(K::IntToFloat, "i2f", 8, 1, FL, IN, NO, NO),
    row!(K::FloatToInt, "f2i", 8, 1, IN, FL, NO, NO),
];

impl TokenKind {
    pub(crate) const COUNT: usize = TokenKind::FloatToInt as usize + 1;

    pub(crate) fn info(self) -> &'static TokenInfo {
        &TOKEN_INFO[self as usize]
    }

    pub(crate) fn name(self) -> &'static str {
        self.info().name
    }

    pub(crate) fn precedence(self) -> i8 {
        self.info().precedence
    }

    pub(crate) fn arity(self) -> u8 {
        self.info().arity
    }

    pub(crate) fn result_type(self) -> Option<SlotType> {
        self.info().result
    }

    pub(crate) fn is_operand(self) -> bool {
        matches!(
            self,
            K::ConstFloat | K::ConstInt | K::VarFloat | K::VarInt | K::VarBool | K::VarVec
        )
    }

    pub(crate) fn is_operator_or_function(self) -> bool {
        self.info().arity > 0
    }

    pub(crate) fn is_postfix(self) -> bool {
        self == K::Member
    }
}

/// One token: a kind and a 32-bit payload.
///
/// The payload is an i32, an f32 (stored via `to_bits`), an input-table
/// index, a member slot offset, or a conversion stack offset, depending on
/// the kind. All reads are safe bit-casts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    bits: u32,
}

impl Token {
    /// Operator/function/structural token with no payload.
    pub(crate) fn op(kind: TokenKind) -> Self {
        Self { kind, bits: 0 }
    }

    pub(crate) fn with_int(kind: TokenKind, value: i32) -> Self {
        Self {
            kind,
            bits: value as u32,
        }
    }

    pub(crate) fn with_float(kind: TokenKind, value: f32) -> Self {
        Self {
            kind,
            bits: value.to_bits(),
        }
    }

    pub(crate) fn with_index(kind: TokenKind, index: usize) -> Self {
        Self {
            kind,
            bits: index as u32,
        }
    }

    /// Same payload under a specialized kind. The code generator uses this
    /// so payloads (e.g. member offsets) survive overload resolution.
    pub(crate) fn retyped(self, kind: TokenKind) -> Self {
        Self {
            kind,
            bits: self.bits,
        }
    }

    pub(crate) fn as_f32(self) -> f32 {
        f32::from_bits(self.bits)
    }

    pub(crate) fn as_i32(self) -> i32 {
        self.bits as i32
    }

    pub(crate) fn index(self) -> usize {
        self.bits as usize
    }
}

/// Specialized alternatives for one base operator/function kind.
struct OverloadSet {
    base: TokenKind,
    alts: &'static [TokenKind],
}

/// Which type-specialized kinds exist per base kind. Linear scan; resolution
/// happens only at compile time. There is no scalar+vector overload for
/// `+`/`-`: mixed addition is a type error.
const OVERLOADS: &[OverloadSet] = &[
    OverloadSet { base: K::Neg, alts: &[K::NegInt, K::NegVec] },
    OverloadSet { base: K::Abs, alts: &[K::AbsInt] },
    OverloadSet { base: K::Sign, alts: &[K::SignInt] },
    OverloadSet { base: K::Add, alts: &[K::AddInt, K::AddVec] },
    OverloadSet { base: K::Sub, alts: &[K::SubInt, K::SubVec] },
    OverloadSet { base: K::Mul, alts: &[K::MulInt, K::MulVecFloat, K::MulFloatVec] },
    OverloadSet { base: K::Div, alts: &[K::DivInt, K::DivVecFloat] },
    OverloadSet { base: K::Pow, alts: &[K::PowInt] },
    OverloadSet { base: K::Mod, alts: &[K::ModInt] },
    OverloadSet { base: K::Eq, alts: &[K::EqInt, K::EqVec] },
    OverloadSet { base: K::Ne, alts: &[K::NeInt, K::NeVec] },
    OverloadSet { base: K::Gt, alts: &[K::GtInt] },
    OverloadSet { base: K::Ge, alts: &[K::GeInt] },
    OverloadSet { base: K::Lt, alts: &[K::LtInt] },
    OverloadSet { base: K::Le, alts: &[K::LeInt] },
    OverloadSet { base: K::Max, alts: &[K::MaxInt] },
    OverloadSet { base: K::Min, alts: &[K::MinInt] },
    OverloadSet { base: K::If, alts: &[K::IfInt, K::IfVec] },
    OverloadSet { base: K::Compare, alts: &[K::CompareVec] },
];

fn accepts(kind: TokenKind, args: &[SlotType]) -> bool {
    let info = kind.info();
    info.arity as usize == args.len()
        && args.iter().enumerate().all(|(i, &a)| info.args[i] == Some(a))
}

/// Find the kind (the base itself or one of its overloads) whose declared
/// argument types match `args` exactly. `None` means no overload fits and
/// the caller should try implicit conversions.
pub(crate) fn resolve_overload(base: TokenKind, args: &[SlotType]) -> Option<TokenKind> {
    if accepts(base, args) {
        return Some(base);
    }
    let set = OVERLOADS.iter().find(|o| o.base == base)?;
    set.alts.iter().copied().find(|&alt| accepts(alt, args))
}

/// Function-name table, all lowercase, synonyms included. Lookup is
/// case-insensitive (callers lowercase the scanned identifier).
const FUNCTIONS: &[(&str, TokenKind)] = &[
    ("sin", K::Sin),
    ("sine", K::Sin),
    ("cos", K::Cos),
    ("cosine", K::Cos),
    ("tan", K::Tan),
    ("tangent", K::Tan),
    ("asin", K::Asin),
    ("arcsine", K::Asin),
    ("acos", K::Acos),
    ("arccosine", K::Acos),
    ("atan", K::Atan),
    ("arctangent", K::Atan),
    ("atan2", K::Atan2),
    ("max", K::Max),
    ("maximum", K::Max),
    ("min", K::Min),
    ("minimum", K::Min),
    ("sqrt", K::Sqrt),
    ("squareroot", K::Sqrt),
    ("square_root", K::Sqrt),
    ("abs", K::Abs),
    ("absolute", K::Abs),
    ("sign", K::Sign),
    ("toradians", K::Radians),
    ("to_radians", K::Radians),
    ("todegrees", K::Degrees),
    ("to_degrees", K::Degrees),
    ("vec", K::MakeVec),
    ("vector", K::MakeVec),
    ("not", K::NotFn),
    ("log", K::Log),
    ("logarithm", K::Log),
    ("ln", K::Ln),
    ("pow", K::PowFn),
    ("power", K::PowFn),
    ("exp", K::Exp),
    ("exponential", K::Exp),
    ("if", K::If),
    ("ceil", K::Ceil),
    ("floor", K::Floor),
    ("frac", K::Fract),
    ("fraction", K::Fract),
    ("round", K::Round),
    ("truncate", K::Trunc),
    ("trunc", K::Trunc),
    ("compare", K::Compare),
    ("dot", K::Dot),
    ("cross", K::Cross),
    ("normalize", K::Normalize),
    ("length", K::Length),
    ("length2", K::LengthSq),
];

/// Look up a (lowercased) function name.
pub(crate) fn function_for_name(lower: &str) -> Option<TokenKind> {
    FUNCTIONS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|&(_, kind)| kind)
}

/// Consistency checks over the static tables, run under `debug_assertions`
/// on the first compile and exhaustively by unit tests: the info table is
/// indexed by kind, arity agrees with the declared argument types, every
/// operator and function has a result type, and every overload shares its
/// base's arity.
pub(crate) fn tables_are_consistent() -> bool {
    for (i, info) in TOKEN_INFO.iter().enumerate() {
        if info.kind as usize != i {
            return false;
        }
        if info.arity > 0 && info.result.is_none() {
            return false;
        }
        for (slot, arg) in info.args.iter().enumerate() {
            let declared = slot < info.arity as usize;
            if declared != arg.is_some() {
                return false;
            }
        }
    }
    OVERLOADS.iter().all(|set| {
        set.alts
            .iter()
            .all(|alt| alt.arity() == set.base.arity() && !set.alts.contains(&set.base))
    })
}

/// Append-only, randomly indexable token sequence.
///
/// Used as the parser's infix output, the code generator's postfix output
/// and its operator-shunting stack. Inline capacity covers typical
/// expressions without touching the heap.
#[derive(Clone, Debug, Default)]
pub(crate) struct TokenQueue {
    buf: SmallVec<[Token; 64]>,
}

impl TokenQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, token: Token) {
        self.buf.push(token);
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub(crate) fn at(&self, index: usize) -> Token {
        self.buf[index]
    }

    pub(crate) fn last(&self) -> Option<Token> {
        self.buf.last().copied()
    }

    pub(crate) fn pop_last(&mut self) {
        self.buf.pop();
    }

    pub(crate) fn clear(&mut self) {
        self.buf.clear();
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = Token> + '_ {
        self.buf.iter().copied()
    }
}

impl fmt::Display for TokenQueue {
    /// One-line instruction listing, payloads in parentheses.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} tokens:", self.len())?;
        for t in self.iter() {
            match t.kind {
                K::ConstFloat => write!(f, " const_f({})", t.as_f32())?,
                K::ConstInt => write!(f, " const_i({})", t.as_i32())?,
                K::VarFloat | K::VarInt | K::VarBool | K::VarVec => {
                    write!(f, " {}({})", t.kind.name(), t.index())?
                }
                K::Member | K::IntToFloat | K::FloatToInt => {
                    write!(f, " {}({})", t.kind.name(), t.as_i32())?
                }
                _ => write!(f, " {}", t.kind.name())?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/token.rs"]
mod tests;
