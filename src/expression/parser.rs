//! Expression text to infix token stream.
//!
//! Hand-rolled descent over the raw bytes, emitting tokens in source order
//! (parentheses and commas included) for the code generator to shunt.
//! Parsing methods return `bool`; a failing method records a message into a
//! single error slot and the first recording wins, so the reported error is
//! the innermost point where progress stopped. Reaching end of input fails
//! without recording, leaving the enclosing construct to name what was
//! missing.

use crate::expression::token::{Token, TokenKind, TokenQueue, function_for_name};
use crate::foundation::error::CompileError;
use crate::foundation::value::{InputDef, ValueType};

/// Parse `text` against the declared inputs, appending the infix stream to
/// `out` (cleared first). On failure the error carries the byte offset of
/// the offending character and its message ends with the unparsed tail of
/// the source.
pub(crate) fn parse(
    text: &str,
    inputs: &[InputDef],
    out: &mut TokenQueue,
) -> Result<(), CompileError> {
    out.clear();
    let mut parser = Parser {
        text,
        pos: 0,
        inputs,
        error: None,
    };
    if parser.parse_expression(out, false, false) {
        Ok(())
    } else {
        // An empty or all-whitespace expression fails before anything can
        // record a message.
        let (message, offset) = parser.error.unwrap_or(("expected an operand", 0));
        Err(diagnostic(text, message, offset))
    }
}

/// Combine a recorded message with the source tail it points at. A failure
/// at the very end of the input backs up one character so the tail is never
/// empty for non-empty source.
fn diagnostic(text: &str, message: &str, mut offset: usize) -> CompileError {
    if offset >= text.len() {
        offset = text.char_indices().next_back().map_or(0, |(i, _)| i);
    }
    let tail = &text[offset..];
    if tail.is_empty() {
        return CompileError::new(message, Some(offset));
    }
    CompileError::new(format!("{message}\n{tail}"), Some(offset))
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    inputs: &'a [InputDef],
    error: Option<(&'static str, usize)>,
}

impl Parser<'_> {
    fn bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.bytes().get(self.pos + 1).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn record(&mut self, message: &'static str, offset: usize) {
        if self.error.is_none() {
            self.error = Some((message, offset));
        }
    }

    /// Operand, then any number of (operator, operand) pairs. A postfix
    /// operator ends a pair on its own. `term_close`/`term_comma` let a
    /// parenthesized subexpression or function argument stop cleanly at
    /// `)` or `,`.
    fn parse_expression(
        &mut self,
        out: &mut TokenQueue,
        term_close: bool,
        term_comma: bool,
    ) -> bool {
        self.skip_ws();
        if self.at_end() {
            return false;
        }
        if !self.parse_operand_or_unary(out) {
            self.record("expected an operand", self.pos);
            return false;
        }
        loop {
            self.skip_ws();
            if self.at_end() {
                return true;
            }
            if term_close && self.peek() == Some(b')') {
                return true;
            }
            if term_comma && self.peek() == Some(b',') {
                return true;
            }
            if !self.parse_operator(out) {
                self.record("expected an operator", self.pos);
                return false;
            }
            let postfix = out.last().is_some_and(|t| t.kind.is_postfix());
            if !postfix && !self.parse_operand_or_unary(out) {
                self.record("expected an operand after operator", self.pos);
                return false;
            }
        }
    }

    fn parse_operand_or_unary(&mut self, out: &mut TokenQueue) -> bool {
        self.skip_ws();
        if self.at_end() {
            return false;
        }
        // `-` directly before a digit is a sign, handled by the number scan.
        let unary = match self.peek() {
            Some(b'-') if self.peek_next().is_some_and(|b| !b.is_ascii_digit()) => {
                Some(TokenKind::Neg)
            }
            Some(b'!') => Some(TokenKind::Not),
            _ => None,
        };
        match unary {
            Some(kind) => {
                out.push(Token::op(kind));
                self.pos += 1;
                if !self.parse_operand(out) {
                    self.record("expected an operand after unary operator", self.pos);
                    return false;
                }
                true
            }
            None => self.parse_operand(out),
        }
    }

    fn parse_operand(&mut self, out: &mut TokenQueue) -> bool {
        self.skip_ws();
        if self.at_end() {
            return false;
        }
        if self.peek() == Some(b'(') {
            let paren_start = self.pos;
            out.push(Token::op(TokenKind::LParen));
            self.pos += 1;
            if !self.parse_expression(out, true, false) {
                self.record("expected an expression after parenthesis", self.pos);
                return false;
            }
            if !self.parse_right_paren(out) {
                // Overwrite whatever was recorded; the missing `)` is the
                // better diagnosis, pointing back at the opener.
                self.error = Some(("unclosed parenthesis", paren_start));
                return false;
            }
            return true;
        }
        if self.call_follows() {
            return self.parse_function(out);
        }
        if self.parse_number(out) {
            return true;
        }
        if self.ident_len() > 0 {
            return self.parse_variable(out);
        }
        self.record("expected a constant, variable or function", self.pos);
        false
    }

    /// True when an identifier sits at the cursor and its next non-whitespace
    /// character is `(`. Such an identifier is always a call; `max` stays
    /// usable as an input name as long as it is not called.
    fn call_follows(&mut self) -> bool {
        let len = self.ident_len();
        if len == 0 {
            return false;
        }
        let save = self.pos;
        self.pos += len;
        self.skip_ws();
        let found = self.peek() == Some(b'(');
        self.pos = save;
        found
    }

    fn scan_function_name(&mut self) -> Option<TokenKind> {
        self.skip_ws();
        let len = self.ident_len();
        if len == 0 {
            return None;
        }
        let name = self.text[self.pos..self.pos + len].to_ascii_lowercase();
        let kind = function_for_name(&name)?;
        self.pos += len;
        Some(kind)
    }

    fn parse_function(&mut self, out: &mut TokenQueue) -> bool {
        self.skip_ws();
        let Some(kind) = self.scan_function_name() else {
            self.record("unknown function name", self.pos);
            return false;
        };
        out.push(Token::op(kind));
        self.skip_ws();
        if self.peek() != Some(b'(') {
            self.record("expected '('", self.pos);
            return false;
        }
        out.push(Token::op(TokenKind::LParen));
        self.pos += 1;

        let arity = kind.arity() as usize;
        let args_start = self.pos;
        if !self.parse_expression(out, true, arity > 1) {
            self.pos = args_start;
            return false;
        }
        let mut remaining = arity - 1;
        while remaining > 0 {
            remaining -= 1;
            if !self.parse_comma(out) {
                self.pos = args_start;
                return false;
            }
            if !self.parse_expression(out, true, remaining > 0) {
                let message = if arity == 2 {
                    "expected 2 arguments to function"
                } else {
                    "expected 3 arguments to function"
                };
                self.record(message, args_start);
                self.pos = args_start;
                return false;
            }
        }
        self.parse_right_paren(out)
    }

    fn parse_right_paren(&mut self, out: &mut TokenQueue) -> bool {
        self.skip_ws();
        if self.peek() == Some(b')') {
            out.push(Token::op(TokenKind::RParen));
            self.pos += 1;
            true
        } else {
            self.record("expected ')'", self.pos);
            false
        }
    }

    fn parse_comma(&mut self, out: &mut TokenQueue) -> bool {
        self.skip_ws();
        if self.peek() == Some(b',') {
            out.push(Token::op(TokenKind::Comma));
            self.pos += 1;
            true
        } else {
            self.record("expected ','", self.pos);
            false
        }
    }

    fn parse_operator(&mut self, out: &mut TokenQueue) -> bool {
        self.skip_ws();
        let start = self.pos;
        let Some(op) = self.scan_operator() else {
            return false;
        };
        if op == TokenKind::Member {
            let Some(offset) = self.scan_member_offset() else {
                self.pos = start;
                self.record("expected a member name directly after '.'", start);
                return false;
            };
            out.push(Token::with_int(TokenKind::Member, offset));
        } else {
            out.push(Token::op(op));
        }
        true
    }

    /// Longest-first operator scan: unambiguous single characters, then
    /// two-character forms (`or` pairs with `OR` and `||`, `&&` with `and`),
    /// then the singles that prefix a two-character form (a lone `=` counts
    /// as `==`), then `and`/`AND`. Word operators are matched without a
    /// word-boundary check.
    fn scan_operator(&mut self) -> Option<TokenKind> {
        let kind = match self.peek()? {
            b'+' => Some(TokenKind::Add),
            b'-' => Some(TokenKind::Sub),
            b'*' => Some(TokenKind::Mul),
            b'/' => Some(TokenKind::Div),
            b'^' => Some(TokenKind::Pow),
            b'%' => Some(TokenKind::Mod),
            b'.' => Some(TokenKind::Member),
            _ => None,
        };
        if let Some(kind) = kind {
            self.pos += 1;
            return Some(kind);
        }

        let rest = &self.bytes()[self.pos..];
        if rest.len() >= 2 {
            let kind = match &rest[..2] {
                b"==" => Some(TokenKind::Eq),
                b"!=" => Some(TokenKind::Ne),
                b">=" => Some(TokenKind::Ge),
                b"<=" => Some(TokenKind::Le),
                b"or" | b"OR" | b"||" => Some(TokenKind::Or),
                b"&&" => Some(TokenKind::And),
                _ => None,
            };
            if let Some(kind) = kind {
                self.pos += 2;
                return Some(kind);
            }
        }

        let kind = match rest.first() {
            Some(b'>') => Some(TokenKind::Gt),
            Some(b'<') => Some(TokenKind::Lt),
            Some(b'=') => Some(TokenKind::Eq),
            _ => None,
        };
        if let Some(kind) = kind {
            self.pos += 1;
            return Some(kind);
        }

        if rest.len() >= 3 && matches!(&rest[..3], b"and" | b"AND") {
            self.pos += 3;
            return Some(TokenKind::And);
        }
        None
    }

    /// Member character directly after the dot; whitespace is not skipped.
    /// Offsets count down from the top of the stack (z is pushed last).
    fn scan_member_offset(&mut self) -> Option<i32> {
        let offset = match self.peek()? {
            b'x' | b'X' => 2,
            b'y' | b'Y' => 1,
            b'z' | b'Z' => 0,
            _ => return None,
        };
        self.pos += 1;
        Some(offset)
    }

    /// Scan an int and a float literal from the cursor and keep whichever
    /// consumed more text, ints winning ties. An int whose digits overflow
    /// i32 falls through to the float reading.
    fn parse_number(&mut self, out: &mut TokenQueue) -> bool {
        self.skip_ws();
        let int_candidate = {
            let end = self.int_literal_end();
            (end > self.pos)
                .then(|| self.text[self.pos..end].parse::<i32>().ok().map(|v| (end, v)))
                .flatten()
        };
        let float_candidate = {
            let end = self.float_literal_end();
            (end > self.pos)
                .then(|| self.text[self.pos..end].parse::<f32>().ok().map(|v| (end, v)))
                .flatten()
        };
        match (int_candidate, float_candidate) {
            (Some((int_end, v)), float)
                if float.is_none_or(|(float_end, _)| int_end >= float_end) =>
            {
                out.push(Token::with_int(TokenKind::ConstInt, v));
                self.pos = int_end;
                true
            }
            (_, Some((float_end, v))) => {
                out.push(Token::with_float(TokenKind::ConstFloat, v));
                self.pos = float_end;
                true
            }
            _ => false,
        }
    }

    fn int_literal_end(&self) -> usize {
        let bytes = self.bytes();
        let mut end = self.pos;
        if bytes.get(end) == Some(&b'-') {
            end += 1;
        }
        let digits_start = end;
        while bytes.get(end).is_some_and(|b| b.is_ascii_digit()) {
            end += 1;
        }
        if end == digits_start { self.pos } else { end }
    }

    fn float_literal_end(&self) -> usize {
        let bytes = self.bytes();
        let mut end = self.pos;
        if bytes.get(end) == Some(&b'-') {
            end += 1;
        }
        let mantissa_start = end;
        while bytes.get(end).is_some_and(|b| b.is_ascii_digit()) {
            end += 1;
        }
        if bytes.get(end) == Some(&b'.') {
            end += 1;
            while bytes.get(end).is_some_and(|b| b.is_ascii_digit()) {
                end += 1;
            }
        }
        // At least one digit on either side of the dot.
        if end == mantissa_start || bytes[mantissa_start..end] == [b'.'] {
            return self.pos;
        }
        // Exponent, only if it has at least one digit.
        if matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exp = end + 1;
            if matches!(bytes.get(exp), Some(b'+' | b'-')) {
                exp += 1;
            }
            let exp_digits = exp;
            while bytes.get(exp).is_some_and(|b| b.is_ascii_digit()) {
                exp += 1;
            }
            if exp > exp_digits {
                end = exp;
            }
        }
        end
    }

    fn parse_variable(&mut self, out: &mut TokenQueue) -> bool {
        self.skip_ws();
        let len = self.ident_len();
        if len == 0 {
            self.record("expected a variable name", self.pos);
            return false;
        }
        let name = &self.text[self.pos..self.pos + len];

        if let Some(value) = special_const(name) {
            out.push(Token::with_float(TokenKind::ConstFloat, value));
            self.pos += len;
            return true;
        }

        let Some(index) = self.inputs.iter().position(|input| input.name == name) else {
            self.record("unknown input name", self.pos);
            return false;
        };
        let kind = match self.inputs[index].value_type {
            ValueType::Float => TokenKind::VarFloat,
            ValueType::Int => TokenKind::VarInt,
            ValueType::Bool => TokenKind::VarBool,
            ValueType::Vector => TokenKind::VarVec,
        };
        self.pos += len;
        out.push(Token::with_index(kind, index));
        true
    }

    /// Length of `[A-Za-z_][A-Za-z0-9_]*` at the cursor, 0 if none.
    fn ident_len(&self) -> usize {
        let bytes = self.bytes();
        let mut end = self.pos;
        match bytes.get(end) {
            Some(&b) if b == b'_' || b.is_ascii_alphabetic() => end += 1,
            _ => return 0,
        }
        while bytes
            .get(end)
            .is_some_and(|&b| b == b'_' || b.is_ascii_alphanumeric())
        {
            end += 1;
        }
        end - self.pos
    }
}

/// Named constants recognized case-insensitively before the input table is
/// consulted, so an input named `pi` is shadowed.
fn special_const(name: &str) -> Option<f32> {
    if name.eq_ignore_ascii_case("pi") {
        return Some(std::f32::consts::PI);
    }
    if name.eq_ignore_ascii_case("tau") {
        return Some(std::f32::consts::TAU);
    }
    None
}

#[cfg(test)]
#[path = "../../tests/unit/expression/parser.rs"]
mod tests;
