//! Restricted expression language for calculated columns
//!
//! Expressions reference existing columns as free variables and support
//! arithmetic, comparison, logical operators and a fixed allow-list of
//! math functions. Parsed once into an AST, then evaluated row-wise.
//! Structural problems (syntax errors, unresolved column names) abort the
//! operation; per-row domain problems (missing operands, division by
//! zero, sqrt of a negative) degrade to the missing marker.

use crate::error::{Error, Result};
use crate::table::{Table, Value};

/// Binary operators, by the parser's precedence climbing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Column(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

/// Allowed function names with their arity
const FUNCTIONS: &[(&str, usize)] = &[
    ("abs", 1),
    ("sqrt", 1),
    ("floor", 1),
    ("ceil", 1),
    ("round", 1),
    ("exp", 1),
    ("ln", 1),
    ("log10", 1),
    ("min", 2),
    ("max", 2),
    ("pow", 2),
    ("if", 3),
];

/// A parsed, reusable expression
#[derive(Debug, Clone)]
pub struct Expression {
    ast: Expr,
    source: String,
}

impl Expression {
    /// Parse an expression, failing on any syntax error
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        let ast = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(Error::Expression(format!(
                "unexpected trailing input in '{}'",
                source
            )));
        }
        Ok(Self {
            ast,
            source: source.to_string(),
        })
    }

    /// All column names referenced by the expression
    pub fn column_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        collect_refs(&self.ast, &mut refs);
        refs
    }

    /// Fail if any referenced column is absent from the table
    pub fn validate_columns(&self, table: &Table) -> Result<()> {
        for name in self.column_refs() {
            if table.column_index(name).is_none() {
                return Err(Error::Expression(format!(
                    "unknown column '{}' in '{}'",
                    name, self.source
                )));
            }
        }
        Ok(())
    }

    /// Evaluate the expression once per row
    pub fn evaluate(&self, table: &Table) -> Result<Vec<Value>> {
        let mut indices: Vec<(String, usize)> = Vec::new();
        for name in self.column_refs() {
            let idx = table.column_index(name).ok_or_else(|| {
                Error::Expression(format!("unknown column '{}' in '{}'", name, self.source))
            })?;
            indices.push((name.to_string(), idx));
        }

        Ok(table
            .rows
            .iter()
            .map(|row| {
                let ctx = RowContext {
                    indices: &indices,
                    row,
                };
                eval(&self.ast, &ctx)
            })
            .collect())
    }
}

fn collect_refs<'a>(expr: &'a Expr, refs: &mut Vec<&'a str>) {
    match expr {
        Expr::Column(name) => {
            if !refs.contains(&name.as_str()) {
                refs.push(name);
            }
        }
        Expr::Unary(_, inner) => collect_refs(inner, refs),
        Expr::Binary(_, left, right) => {
            collect_refs(left, refs);
            collect_refs(right, refs);
        }
        Expr::Call(_, args) => {
            for arg in args {
                collect_refs(arg, refs);
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Lexer

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
    Comma,
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '+' | '-' | '*' | '/' | '%' | '^' => {
                tokens.push(Token::Op(match c {
                    '+' => "+",
                    '-' => "-",
                    '*' => "*",
                    '/' => "/",
                    '%' => "%",
                    _ => "^",
                }));
                i += 1;
            }
            '=' | '!' | '<' | '>' => {
                let next_eq = chars.get(i + 1) == Some(&'=');
                let op = match (c, next_eq) {
                    ('=', true) => "==",
                    ('!', true) => "!=",
                    ('<', true) => "<=",
                    ('>', true) => ">=",
                    ('<', false) => "<",
                    ('>', false) => ">",
                    ('!', false) => "!",
                    ('=', false) => {
                        return Err(Error::Expression(
                            "single '=' is not an operator, use '=='".to_string(),
                        ))
                    }
                    _ => unreachable!(),
                };
                tokens.push(Token::Op(op));
                i += if next_eq { 2 } else { 1 };
            }
            '&' | '|' => {
                if chars.get(i + 1) == Some(&c) {
                    tokens.push(Token::Op(if c == '&' { "&&" } else { "||" }));
                    i += 2;
                } else {
                    return Err(Error::Expression(format!("unexpected character '{}'", c)));
                }
            }
            '\'' | '"' => {
                let quote = c;
                let mut text = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        Some(&ch) if ch == quote => {
                            i += 1;
                            break;
                        }
                        Some(&ch) => {
                            text.push(ch);
                            i += 1;
                        }
                        None => {
                            return Err(Error::Expression("unterminated string".to_string()))
                        }
                    }
                }
                tokens.push(Token::Str(text));
            }
            '0'..='9' | '.' => {
                let start = i;
                let mut saw_dot = false;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    if chars[i] == '.' {
                        if saw_dot {
                            break;
                        }
                        saw_dot = true;
                    }
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                if saw_dot {
                    let f = text.parse::<f64>().map_err(|_| {
                        Error::Expression(format!("invalid number '{}'", text))
                    })?;
                    tokens.push(Token::Float(f));
                } else {
                    let n = text.parse::<i64>().map_err(|_| {
                        Error::Expression(format!("invalid number '{}'", text))
                    })?;
                    tokens.push(Token::Int(n));
                }
            }
            _ if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                match word.as_str() {
                    "and" => tokens.push(Token::Op("&&")),
                    "or" => tokens.push(Token::Op("||")),
                    "not" => tokens.push(Token::Op("!")),
                    "true" => tokens.push(Token::Ident("true".to_string())),
                    "false" => tokens.push(Token::Ident("false".to_string())),
                    _ => tokens.push(Token::Ident(word)),
                }
            }
            _ => return Err(Error::Expression(format!("unexpected character '{}'", c))),
        }
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Parser (precedence climbing)

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.peek_is_op("||") {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Expr::Binary(BinOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_cmp()?;
        while self.peek_is_op("&&") {
            self.pos += 1;
            let right = self.parse_cmp()?;
            left = Expr::Binary(BinOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_cmp(&mut self) -> Result<Expr> {
        let left = self.parse_add()?;
        let op = match self.peek() {
            Some(Token::Op("==")) => Some(BinOp::Eq),
            Some(Token::Op("!=")) => Some(BinOp::Ne),
            Some(Token::Op("<")) => Some(BinOp::Lt),
            Some(Token::Op("<=")) => Some(BinOp::Le),
            Some(Token::Op(">")) => Some(BinOp::Gt),
            Some(Token::Op(">=")) => Some(BinOp::Ge),
            _ => None,
        };
        match op {
            Some(op) => {
                self.pos += 1;
                let right = self.parse_add()?;
                Ok(Expr::Binary(op, Box::new(left), Box::new(right)))
            }
            None => Ok(left),
        }
    }

    fn parse_add(&mut self) -> Result<Expr> {
        let mut left = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op("+")) => BinOp::Add,
                Some(Token::Op("-")) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_mul()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_mul(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op("*")) => BinOp::Mul,
                Some(Token::Op("/")) => BinOp::Div,
                Some(Token::Op("%")) => BinOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.peek_is_op("-") {
            self.pos += 1;
            let inner = self.parse_unary()?;
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(inner)));
        }
        if self.peek_is_op("!") {
            self.pos += 1;
            let inner = self.parse_unary()?;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(inner)));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_primary()?;
        if self.peek_is_op("^") {
            self.pos += 1;
            // Right-associative
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.peek().cloned() {
            Some(Token::Int(n)) => {
                self.pos += 1;
                Ok(Expr::Int(n))
            }
            Some(Token::Float(f)) => {
                self.pos += 1;
                Ok(Expr::Float(f))
            }
            Some(Token::Str(s)) => {
                self.pos += 1;
                Ok(Expr::Str(s))
            }
            Some(Token::Ident(name)) => {
                self.pos += 1;
                if name == "true" {
                    return Ok(Expr::Bool(true));
                }
                if name == "false" {
                    return Ok(Expr::Bool(false));
                }
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let args = self.parse_args()?;
                    let arity = FUNCTIONS
                        .iter()
                        .find(|(f, _)| *f == name)
                        .map(|(_, a)| *a)
                        .ok_or_else(|| {
                            Error::Expression(format!("unknown function '{}'", name))
                        })?;
                    if args.len() != arity {
                        return Err(Error::Expression(format!(
                            "function '{}' takes {} argument(s), got {}",
                            name,
                            arity,
                            args.len()
                        )));
                    }
                    return Ok(Expr::Call(name, args));
                }
                Ok(Expr::Column(name))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.parse_or()?;
                if self.peek() != Some(&Token::RParen) {
                    return Err(Error::Expression("expected ')'".to_string()));
                }
                self.pos += 1;
                Ok(inner)
            }
            other => Err(Error::Expression(format!(
                "unexpected token: {:?}",
                other
            ))),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.parse_or()?);
            match self.peek() {
                Some(Token::Comma) => self.pos += 1,
                Some(Token::RParen) => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(Error::Expression("expected ',' or ')'".to_string())),
            }
        }
        Ok(args)
    }

    fn peek_is_op(&self, op: &str) -> bool {
        matches!(self.peek(), Some(Token::Op(o)) if *o == op)
    }
}

// ---------------------------------------------------------------------------
// Evaluator

struct RowContext<'a> {
    indices: &'a [(String, usize)],
    row: &'a [Value],
}

impl RowContext<'_> {
    fn lookup(&self, name: &str) -> Value {
        self.indices
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, idx)| self.row[*idx].clone())
            .unwrap_or(Value::Missing)
    }
}

fn eval(expr: &Expr, ctx: &RowContext<'_>) -> Value {
    match expr {
        Expr::Int(n) => Value::Int(*n),
        Expr::Float(f) => Value::Float(*f),
        Expr::Str(s) => Value::Text(s.clone()),
        Expr::Bool(b) => Value::Bool(*b),
        Expr::Column(name) => ctx.lookup(name),
        Expr::Unary(op, inner) => eval_unary(*op, eval(inner, ctx)),
        Expr::Binary(op, left, right) => eval_binary(*op, left, right, ctx),
        Expr::Call(name, args) => eval_call(name, args, ctx),
    }
}

fn eval_unary(op: UnaryOp, value: Value) -> Value {
    match op {
        UnaryOp::Neg => match value {
            Value::Int(i) => Value::Int(-i),
            Value::Float(f) => Value::Float(-f),
            _ => Value::Missing,
        },
        UnaryOp::Not => match value {
            Value::Bool(b) => Value::Bool(!b),
            _ => Value::Missing,
        },
    }
}

fn eval_binary(op: BinOp, left: &Expr, right: &Expr, ctx: &RowContext<'_>) -> Value {
    // Logical operators short-circuit on a decided left side
    if op == BinOp::Or || op == BinOp::And {
        return eval_logical(op, left, right, ctx);
    }

    let lhs = eval(left, ctx);
    let rhs = eval(right, ctx);

    match op {
        BinOp::Eq => eval_equality(&lhs, &rhs, false),
        BinOp::Ne => eval_equality(&lhs, &rhs, true),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => eval_ordering(op, &lhs, &rhs),
        _ => eval_arithmetic(op, &lhs, &rhs),
    }
}

fn eval_logical(op: BinOp, left: &Expr, right: &Expr, ctx: &RowContext<'_>) -> Value {
    let lhs = eval(left, ctx);
    match (op, &lhs) {
        (BinOp::Or, Value::Bool(true)) => Value::Bool(true),
        (BinOp::And, Value::Bool(false)) => Value::Bool(false),
        (_, Value::Bool(_)) => match eval(right, ctx) {
            Value::Bool(b) => Value::Bool(b),
            _ => Value::Missing,
        },
        _ => Value::Missing,
    }
}

fn eval_equality(lhs: &Value, rhs: &Value, negate: bool) -> Value {
    if lhs.is_missing() || rhs.is_missing() {
        return Value::Missing;
    }
    let equal = match (lhs.as_number(), rhs.as_number()) {
        (Some(a), Some(b)) => a == b,
        _ => lhs.render() == rhs.render(),
    };
    Value::Bool(equal != negate)
}

fn eval_ordering(op: BinOp, lhs: &Value, rhs: &Value) -> Value {
    if lhs.is_missing() || rhs.is_missing() {
        return Value::Missing;
    }
    let ordering = match (lhs.as_number(), rhs.as_number()) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => Some(lhs.render().cmp(&rhs.render())),
    };
    let Some(ordering) = ordering else {
        return Value::Missing;
    };
    let holds = match op {
        BinOp::Lt => ordering == std::cmp::Ordering::Less,
        BinOp::Le => ordering != std::cmp::Ordering::Greater,
        BinOp::Gt => ordering == std::cmp::Ordering::Greater,
        BinOp::Ge => ordering != std::cmp::Ordering::Less,
        _ => unreachable!(),
    };
    Value::Bool(holds)
}

fn eval_arithmetic(op: BinOp, lhs: &Value, rhs: &Value) -> Value {
    // Integer arithmetic stays integral where exact
    if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
        match op {
            BinOp::Add => {
                if let Some(n) = a.checked_add(*b) {
                    return Value::Int(n);
                }
            }
            BinOp::Sub => {
                if let Some(n) = a.checked_sub(*b) {
                    return Value::Int(n);
                }
            }
            BinOp::Mul => {
                if let Some(n) = a.checked_mul(*b) {
                    return Value::Int(n);
                }
            }
            BinOp::Mod => {
                if *b == 0 {
                    return Value::Missing;
                }
                return Value::Int(a % b);
            }
            _ => {}
        }
    }

    let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) else {
        return Value::Missing;
    };
    let result = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => {
            if b == 0.0 {
                return Value::Missing;
            }
            a / b
        }
        BinOp::Mod => {
            if b == 0.0 {
                return Value::Missing;
            }
            a % b
        }
        BinOp::Pow => a.powf(b),
        _ => unreachable!(),
    };
    if result.is_finite() {
        Value::Float(result)
    } else {
        Value::Missing
    }
}

fn eval_call(name: &str, args: &[Expr], ctx: &RowContext<'_>) -> Value {
    if name == "if" {
        return match eval(&args[0], ctx) {
            Value::Bool(true) => eval(&args[1], ctx),
            Value::Bool(false) => eval(&args[2], ctx),
            _ => Value::Missing,
        };
    }

    let values: Vec<Value> = args.iter().map(|a| eval(a, ctx)).collect();

    // Integer-preserving unary functions
    if values.len() == 1 {
        if let Value::Int(i) = values[0] {
            match name {
                "abs" => return Value::Int(i.abs()),
                "floor" | "ceil" | "round" => return Value::Int(i),
                _ => {}
            }
        }
    }

    let numbers: Option<Vec<f64>> = values.iter().map(Value::as_number).collect();
    let Some(numbers) = numbers else {
        return Value::Missing;
    };

    let result = match name {
        "abs" => numbers[0].abs(),
        "sqrt" => {
            if numbers[0] < 0.0 {
                return Value::Missing;
            }
            numbers[0].sqrt()
        }
        "floor" => numbers[0].floor(),
        "ceil" => numbers[0].ceil(),
        "round" => numbers[0].round(),
        "exp" => numbers[0].exp(),
        "ln" => {
            if numbers[0] <= 0.0 {
                return Value::Missing;
            }
            numbers[0].ln()
        }
        "log10" => {
            if numbers[0] <= 0.0 {
                return Value::Missing;
            }
            numbers[0].log10()
        }
        "min" => numbers[0].min(numbers[1]),
        "max" => numbers[0].max(numbers[1]),
        "pow" => numbers[0].powf(numbers[1]),
        _ => return Value::Missing,
    };

    if result.is_finite() {
        Value::Float(result)
    } else {
        Value::Missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    fn table() -> Table {
        Table::from_rows(
            vec!["price".into(), "quantity".into(), "label".into()],
            vec![
                vec![Value::Int(10), Value::Int(2), Value::Text("a".into())],
                vec![Value::Missing, Value::Int(3), Value::Text("b".into())],
                vec![Value::Float(2.5), Value::Int(4), Value::Text("a".into())],
            ],
        )
    }

    #[test]
    fn test_calculated_column_with_missing_operand() {
        let expr = Expression::parse("price * quantity").unwrap();
        let values = expr.evaluate(&table()).unwrap();

        assert_eq!(values[0], Value::Int(20));
        assert_eq!(values[1], Value::Missing);
        assert_eq!(values[2], Value::Float(10.0));
    }

    #[test]
    fn test_division_by_zero_degrades_to_missing() {
        let t = Table::from_rows(
            vec!["a".into(), "b".into()],
            vec![
                vec![Value::Int(10), Value::Int(2)],
                vec![Value::Int(10), Value::Int(0)],
            ],
        );
        let expr = Expression::parse("a / b").unwrap();
        let values = expr.evaluate(&t).unwrap();

        assert_eq!(values[0], Value::Float(5.0));
        assert_eq!(values[1], Value::Missing);
    }

    #[test]
    fn test_precedence_and_parentheses() {
        let t = Table::from_rows(vec!["x".into()], vec![vec![Value::Int(1)]]);
        let cases = [
            ("2 + 3 * 4", Value::Int(14)),
            ("(2 + 3) * 4", Value::Int(20)),
            ("2 ^ 3 ^ 2", Value::Float(512.0)),
            ("-2 + 5", Value::Int(3)),
            ("7 % 4", Value::Int(3)),
        ];
        for (source, expected) in cases {
            let expr = Expression::parse(source).unwrap();
            assert_eq!(expr.evaluate(&t).unwrap()[0], expected, "{}", source);
        }
    }

    #[test]
    fn test_comparisons_and_logic() {
        let expr = Expression::parse("price > 5 and quantity < 10").unwrap();
        let values = expr.evaluate(&table()).unwrap();
        assert_eq!(values[0], Value::Bool(true));
        // Missing price poisons the conjunction
        assert_eq!(values[1], Value::Missing);
        assert_eq!(values[2], Value::Bool(false));
    }

    #[test]
    fn test_string_equality() {
        let expr = Expression::parse("label == 'a'").unwrap();
        let values = expr.evaluate(&table()).unwrap();
        assert_eq!(values[0], Value::Bool(true));
        assert_eq!(values[1], Value::Bool(false));
    }

    #[test]
    fn test_conditional_function() {
        let expr = Expression::parse("if(quantity > 2, 'bulk', 'single')").unwrap();
        let values = expr.evaluate(&table()).unwrap();
        assert_eq!(values[0], Value::Text("single".into()));
        assert_eq!(values[1], Value::Text("bulk".into()));
    }

    #[test]
    fn test_math_functions() {
        let t = Table::from_rows(vec!["x".into()], vec![vec![Value::Int(9)]]);
        let cases = [
            ("sqrt(x)", Value::Float(3.0)),
            ("abs(-x)", Value::Int(9)),
            ("max(x, 100)", Value::Float(100.0)),
            ("sqrt(-1 * x)", Value::Missing),
        ];
        for (source, expected) in cases {
            let expr = Expression::parse(source).unwrap();
            assert_eq!(expr.evaluate(&t).unwrap()[0], expected, "{}", source);
        }
    }

    #[test]
    fn test_syntax_errors() {
        for source in ["price +", "1 +* 2", "(1 + 2", "'unterminated", "price = 3"] {
            assert!(Expression::parse(source).is_err(), "{}", source);
        }
    }

    #[test]
    fn test_unknown_function_rejected() {
        let err = Expression::parse("system('rm')").unwrap_err();
        assert!(matches!(err, Error::Expression(_)));
    }

    #[test]
    fn test_unresolved_column_aborts() {
        let expr = Expression::parse("price * missing_col").unwrap();
        let err = expr.evaluate(&table()).unwrap_err();
        assert!(matches!(err, Error::Expression(_)));
    }

    #[test]
    fn test_column_refs_deduplicated() {
        let expr = Expression::parse("price + price * quantity").unwrap();
        assert_eq!(expr.column_refs(), vec!["price", "quantity"]);
    }
}
