//! Formula Abstract Syntax Tree types

use std::fmt;

/// Formula expression AST
///
/// Trees are immutable once parsed and may be evaluated against any number
/// of rows. `Display` writes canonical formula text that parses back to an
/// equal tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),

    // === References ===
    /// Row field reference, `[name]`
    FieldRef(String),

    // === Operators ===
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    // === Function call ===
    Function {
        /// Upper-cased function name as written (aliases are not resolved)
        name: String,
        args: Vec<FormulaExpr>,
    },
}

impl FormulaExpr {
    /// Names of all fields the expression reads, in order of appearance,
    /// without duplicates
    pub fn field_refs(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_field_refs(&mut out);
        out
    }

    fn collect_field_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            FormulaExpr::FieldRef(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.collect_field_refs(out);
                right.collect_field_refs(out);
            }
            FormulaExpr::UnaryOp { operand, .. } => operand.collect_field_refs(out),
            FormulaExpr::Function { args, .. } => {
                for arg in args {
                    arg.collect_field_refs(out);
                }
            }
            FormulaExpr::Number(_) | FormulaExpr::String(_) | FormulaExpr::Boolean(_) => {}
        }
    }
}

impl fmt::Display for FormulaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaExpr::Number(n) => write!(f, "{}", n),
            FormulaExpr::String(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            FormulaExpr::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            FormulaExpr::FieldRef(name) => write!(f, "[{}]", name),
            // Always parenthesized so the text does not depend on precedence
            FormulaExpr::BinaryOp { op, left, right } => {
                write!(f, "({} {} {})", left, op, right)
            }
            FormulaExpr::UnaryOp { op, operand } => write!(f, "{}({})", op, operand),
            FormulaExpr::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Text
    Concat,
}

impl BinaryOperator {
    /// Operator symbol as written in formulas
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Concat => "&",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Negate => f.write_str("-"),
        }
    }
}
