//! Parse-once, evaluate-many
//!
//! [`CompiledFormula`] holds a parsed expression that can be evaluated
//! against any number of rows. [`FormulaCache`] memoizes parsing by formula
//! text, parse failures included, so a formula repeated across a grid is
//! parsed and reported once.

use crate::ast::FormulaExpr;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{evaluate, EvaluationContext, EvaluationOptions, FormulaValue};
use crate::parser::parse_formula;
use log::debug;
use rowcalc_core::Row;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Entries kept before the cache starts over
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

static GLOBAL_CACHE: OnceLock<FormulaCache> = OnceLock::new();

type CacheEntry = Result<Arc<FormulaExpr>, FormulaError>;

/// Memo of parsed formulas keyed by formula text
///
/// When the cache grows past its capacity it is cleared and starts over.
#[derive(Debug)]
pub struct FormulaCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    capacity: usize,
}

impl FormulaCache {
    /// Create an empty cache
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// Process-wide cache used by [`CompiledFormula::compile`]
    pub fn global() -> &'static FormulaCache {
        GLOBAL_CACHE.get_or_init(|| FormulaCache::new(DEFAULT_CACHE_CAPACITY))
    }

    /// Parse `formula`, or return the result of an earlier parse
    pub fn get_or_parse(&self, formula: &str) -> FormulaResult<Arc<FormulaExpr>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get(formula) {
            return entry.clone();
        }

        let entry = parse_formula(formula).map(Arc::new);
        if entries.len() >= self.capacity {
            debug!(
                "formula cache reached {} entries, clearing it",
                entries.len()
            );
            entries.clear();
        }
        entries.insert(formula.to_string(), entry.clone());
        entry
    }

    /// Number of cached formulas
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached formula
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for FormulaCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

/// A parsed formula
///
/// # Example
/// ```rust
/// use rowcalc_core::Row;
/// use rowcalc_formula::{CompiledFormula, FormulaValue};
///
/// let formula = CompiledFormula::compile("[Prix] * [Qte]").unwrap();
/// let row = Row::new().with("Prix", "10 €").with("Qte", 12);
/// assert_eq!(formula.evaluate(&row), FormulaValue::Number(120.0));
/// ```
#[derive(Debug, Clone)]
pub struct CompiledFormula {
    source: String,
    expr: Arc<FormulaExpr>,
}

impl CompiledFormula {
    /// Parse a formula through the global cache
    pub fn compile(formula: &str) -> FormulaResult<Self> {
        Self::compile_with(FormulaCache::global(), formula)
    }

    /// Parse a formula through the given cache
    pub fn compile_with(cache: &FormulaCache, formula: &str) -> FormulaResult<Self> {
        let expr = cache.get_or_parse(formula)?;
        Ok(Self {
            source: formula.to_string(),
            expr,
        })
    }

    /// Wrap an already built expression
    pub fn from_expr(expr: FormulaExpr) -> Self {
        Self {
            source: expr.to_string(),
            expr: Arc::new(expr),
        }
    }

    /// Formula text this was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parsed expression
    pub fn expr(&self) -> &FormulaExpr {
        &self.expr
    }

    /// Fields the formula reads
    pub fn field_refs(&self) -> Vec<&str> {
        self.expr.field_refs()
    }

    /// Evaluate against a row with default options
    pub fn evaluate(&self, row: &Row) -> FormulaValue {
        self.evaluate_with(row, &EvaluationOptions::default())
    }

    /// Evaluate against a row
    ///
    /// Evaluation failures (unknown function, wrong arity, nesting limit)
    /// come back as error values; the result is finalized per `options`.
    pub fn evaluate_with(&self, row: &Row, options: &EvaluationOptions) -> FormulaValue {
        let ctx = EvaluationContext::with_options(row, options.clone());
        match evaluate(&self.expr, &ctx) {
            Ok(value) => options.finalize(value),
            Err(err) => {
                debug!("formula {:?} failed: {}", self.source, err);
                FormulaValue::Error(err.error_value())
            }
        }
    }
}

impl PartialEq for CompiledFormula {
    fn eq(&self, other: &Self) -> bool {
        self.expr == other.expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;
    use pretty_assertions::assert_eq;
    use rowcalc_core::ErrorValue;

    #[test]
    fn test_cache_reuses_parsed_formula() {
        let cache = FormulaCache::new(8);
        let first = cache.get_or_parse("SOMME([A], [B])").unwrap();
        let second = cache.get_or_parse("SOMME([A], [B])").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_remembers_parse_errors() {
        let cache = FormulaCache::new(8);
        for _ in 0..2 {
            match cache.get_or_parse("SUM(1") {
                Err(FormulaError::Parse { kind, .. }) => {
                    assert_eq!(kind, ParseErrorKind::UnbalancedParenthesis)
                }
                other => panic!("Expected parse error, got {:?}", other),
            }
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_clears_when_full() {
        let cache = FormulaCache::new(2);
        cache.get_or_parse("1").unwrap();
        cache.get_or_parse("2").unwrap();
        assert_eq!(cache.len(), 2);
        cache.get_or_parse("3").unwrap();
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_compiled_formula_evaluates_many_rows() {
        let formula = CompiledFormula::compile("[A] * [B]").unwrap();
        assert_eq!(formula.field_refs(), vec!["A", "B"]);

        let rows = [
            Row::new().with("A", 10).with("B", 10),
            Row::new().with("A", "2,5").with("B", 4),
            Row::new(),
        ];
        let results: Vec<FormulaValue> = rows.iter().map(|row| formula.evaluate(row)).collect();
        assert_eq!(
            results,
            vec![
                FormulaValue::Number(100.0),
                FormulaValue::Number(10.0),
                FormulaValue::Number(0.0),
            ]
        );
    }

    #[test]
    fn test_evaluation_failures_become_error_values() {
        let row = Row::new();
        assert_eq!(
            CompiledFormula::compile("INCONNUE(1)").unwrap().evaluate(&row),
            FormulaValue::Error(ErrorValue::Name)
        );
        assert_eq!(
            CompiledFormula::compile("ABS()").unwrap().evaluate(&row),
            FormulaValue::Error(ErrorValue::Value)
        );
    }

    #[test]
    fn test_from_expr_keeps_canonical_source() {
        let expr = parse_formula("majuscule([nom])").unwrap();
        let formula = CompiledFormula::from_expr(expr);
        assert_eq!(formula.source(), "MAJUSCULE([nom])");
        assert_eq!(
            formula.evaluate(&Row::new().with("nom", "dupont")),
            FormulaValue::String("DUPONT".into())
        );
    }
}
