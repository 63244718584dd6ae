//! Built-in functions
//!
//! The function set is closed: every supported function is a [`Function`]
//! variant, and names (French and English aliases included) resolve to a
//! variant through [`Function::from_name`]. Anything else is an unknown
//! function.

pub mod date;
pub mod logical;
pub mod math;
pub mod text;

use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Function implementation signature
pub type FunctionImpl = fn(&[FormulaValue], &EvaluationContext) -> FormulaResult<FormulaValue>;

/// Function definition
#[derive(Clone, Copy)]
pub struct FunctionDef {
    /// Canonical function name (uppercase)
    pub name: &'static str,
    /// Alternative names, French names included
    pub aliases: &'static [&'static str],
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

impl FunctionDef {
    const fn new(
        name: &'static str,
        aliases: &'static [&'static str],
        min_args: usize,
        max_args: Option<usize>,
        implementation: FunctionImpl,
    ) -> Self {
        Self {
            name,
            aliases,
            min_args,
            max_args,
            implementation,
        }
    }
}

impl fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDef")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish()
    }
}

/// Supported functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    // Logical
    If,
    And,
    Or,
    Not,

    // Math
    Sum,
    Average,
    Min,
    Max,
    Abs,
    Round,

    // Text
    Replace,
    Substitute,
    Concat,
    Mid,
    Left,
    Right,
    Len,
    Find,
    Contains,
    Trim,
    Upper,
    Lower,
    Capitalize,
    Proper,

    // Date
    Year,
    Month,
    Day,
    Today,
    Date,
    DateDif,
}

/// Name and alias lookup table (lazily initialized)
static FUNCTION_NAMES: OnceLock<HashMap<&'static str, Function>> = OnceLock::new();

impl Function {
    /// Every supported function
    pub const ALL: &'static [Function] = &[
        Function::If,
        Function::And,
        Function::Or,
        Function::Not,
        Function::Sum,
        Function::Average,
        Function::Min,
        Function::Max,
        Function::Abs,
        Function::Round,
        Function::Replace,
        Function::Substitute,
        Function::Concat,
        Function::Mid,
        Function::Left,
        Function::Right,
        Function::Len,
        Function::Find,
        Function::Contains,
        Function::Trim,
        Function::Upper,
        Function::Lower,
        Function::Capitalize,
        Function::Proper,
        Function::Year,
        Function::Month,
        Function::Day,
        Function::Today,
        Function::Date,
        Function::DateDif,
    ];

    /// Resolve a function name or alias, case-insensitively
    pub fn from_name(name: &str) -> Option<Function> {
        let names = FUNCTION_NAMES.get_or_init(|| {
            let mut names = HashMap::new();
            for function in Function::ALL {
                let def = function.def();
                names.insert(def.name, *function);
                for alias in def.aliases {
                    names.insert(*alias, *function);
                }
            }
            names
        });
        names.get(name.trim().to_uppercase().as_str()).copied()
    }

    /// Canonical name
    pub fn name(&self) -> &'static str {
        self.def().name
    }

    /// Definition: names, arity and implementation
    pub fn def(&self) -> FunctionDef {
        match self {
            Function::If => FunctionDef::new("IF", &["SI"], 2, Some(3), logical::fn_if),
            Function::And => FunctionDef::new("AND", &["ET"], 1, None, logical::fn_and),
            Function::Or => FunctionDef::new("OR", &["OU"], 1, None, logical::fn_or),
            Function::Not => FunctionDef::new("NOT", &["NON"], 1, Some(1), logical::fn_not),

            Function::Sum => FunctionDef::new("SUM", &["SOMME"], 0, None, math::fn_sum),
            Function::Average => FunctionDef::new(
                "AVERAGE",
                &["MOYENNE", "AVG"],
                0,
                None,
                math::fn_average,
            ),
            Function::Min => FunctionDef::new("MIN", &[], 1, None, math::fn_min),
            Function::Max => FunctionDef::new("MAX", &[], 1, None, math::fn_max),
            Function::Abs => FunctionDef::new("ABS", &[], 1, Some(1), math::fn_abs),
            Function::Round => {
                FunctionDef::new("ROUND", &["ARRONDI"], 1, Some(2), math::fn_round)
            }

            Function::Replace => {
                FunctionDef::new("REPLACE", &["REMPLACER"], 3, Some(3), text::fn_replace)
            }
            Function::Substitute => FunctionDef::new(
                "SUBSTITUTE",
                &["SUBSTITUER"],
                3,
                Some(3),
                text::fn_substitute,
            ),
            Function::Concat => FunctionDef::new(
                "CONCAT",
                &["CONCATENER", "CONCATENATE"],
                1,
                None,
                text::fn_concat,
            ),
            Function::Mid => FunctionDef::new(
                "MID",
                &["EXTRAIRE", "SUBSTRING"],
                2,
                Some(3),
                text::fn_mid,
            ),
            Function::Left => FunctionDef::new("LEFT", &["GAUCHE"], 2, Some(2), text::fn_left),
            Function::Right => {
                FunctionDef::new("RIGHT", &["DROITE"], 2, Some(2), text::fn_right)
            }
            Function::Len => FunctionDef::new(
                "LEN",
                &["LONGUEUR", "LENGTH"],
                1,
                Some(1),
                text::fn_len,
            ),
            Function::Find => FunctionDef::new(
                "FIND",
                &["TROUVE", "SEARCH"],
                2,
                Some(3),
                text::fn_find,
            ),
            Function::Contains => FunctionDef::new(
                "CONTAINS",
                &["CONTIENT", "INCLUS"],
                2,
                Some(2),
                text::fn_contains,
            ),
            Function::Trim => FunctionDef::new(
                "TRIM",
                &["SUPPRESPACE", "NETTOYER"],
                1,
                Some(1),
                text::fn_trim,
            ),
            Function::Upper => {
                FunctionDef::new("UPPER", &["MAJUSCULE"], 1, Some(1), text::fn_upper)
            }
            Function::Lower => {
                FunctionDef::new("LOWER", &["MINUSCULE"], 1, Some(1), text::fn_lower)
            }
            Function::Capitalize => FunctionDef::new(
                "CAPITALIZE",
                &["CAPITALISEPREMIER"],
                1,
                Some(1),
                text::fn_capitalize,
            ),
            Function::Proper => FunctionDef::new(
                "PROPER",
                &["CAPITALISEMOTS", "TITLE"],
                1,
                Some(1),
                text::fn_proper,
            ),

            Function::Year => FunctionDef::new("YEAR", &["ANNEE"], 1, Some(1), date::fn_year),
            Function::Month => FunctionDef::new("MONTH", &["MOIS"], 1, Some(1), date::fn_month),
            Function::Day => FunctionDef::new("DAY", &["JOUR"], 1, Some(1), date::fn_day),
            Function::Today => {
                FunctionDef::new("TODAY", &["AUJOURDHUI"], 0, Some(0), date::fn_today)
            }
            Function::Date => FunctionDef::new("DATE", &[], 3, Some(3), date::fn_date),
            Function::DateDif => {
                FunctionDef::new("DATEDIF", &[], 3, Some(3), date::fn_datedif)
            }
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// First error among the arguments, if any
pub(crate) fn first_error(args: &[FormulaValue]) -> Option<FormulaValue> {
    args.iter()
        .find_map(|arg| arg.get_error())
        .map(FormulaValue::Error)
}
