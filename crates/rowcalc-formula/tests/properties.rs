//! Property tests for pattern replacement, date differences and formula text

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rowcalc_formula::functions::date::datedif;
use rowcalc_formula::functions::text::{replace_first, substitute_all};
use rowcalc_formula::{parse_formula, BinaryOperator, FormulaExpr, UnaryOperator};

const UNITS: [&str; 6] = ["d", "m", "y", "md", "ym", "yd"];

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    // 1990-01-01 plus up to ~60 years
    (0i64..22_000).prop_map(|days| {
        NaiveDate::from_ymd_opt(1990, 1, 1).unwrap() + Duration::days(days)
    })
}

fn leaf() -> impl Strategy<Value = FormulaExpr> {
    prop_oneof![
        (0u32..100_000, 0u32..4).prop_map(|(n, scale)| {
            FormulaExpr::Number(n as f64 / 10f64.powi(scale as i32))
        }),
        "[a-zA-Z0-9 ,.()\"'-]{0,12}".prop_map(FormulaExpr::String),
        any::<bool>().prop_map(FormulaExpr::Boolean),
        "[A-Za-z_][A-Za-z0-9_]{0,8}".prop_map(FormulaExpr::FieldRef),
    ]
}

fn binary_operator() -> impl Strategy<Value = BinaryOperator> {
    prop::sample::select(vec![
        BinaryOperator::Add,
        BinaryOperator::Subtract,
        BinaryOperator::Multiply,
        BinaryOperator::Divide,
        BinaryOperator::Power,
        BinaryOperator::Equal,
        BinaryOperator::NotEqual,
        BinaryOperator::LessThan,
        BinaryOperator::LessEqual,
        BinaryOperator::GreaterThan,
        BinaryOperator::GreaterEqual,
        BinaryOperator::Concat,
    ])
}

fn expr_strategy() -> impl Strategy<Value = FormulaExpr> {
    leaf().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            (binary_operator(), inner.clone(), inner.clone()).prop_map(|(op, left, right)| {
                FormulaExpr::BinaryOp {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }),
            inner.clone().prop_map(|operand| FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
            }),
            (
                prop::sample::select(vec!["SUM", "REMPLACER", "DATEDIF", "CONCAT", "SI"]),
                prop::collection::vec(inner, 0..4),
            )
                .prop_map(|(name, args)| FormulaExpr::Function {
                    name: name.to_string(),
                    args,
                }),
        ]
    })
}

proptest! {
    #[test]
    fn invalid_patterns_are_replaced_literally(
        prefix in "[a-z ]{0,8}",
        suffix in "[a-z ]{0,8}",
        pattern in prop::sample::select(vec!["(", "[", "a(b", "*", "+x", "x{2"]),
        replacement in "[A-Z]{0,4}",
    ) {
        let subject = format!("{}{}{}", prefix, pattern, suffix);
        prop_assert_eq!(
            replace_first(&subject, pattern, &replacement),
            subject.replacen(pattern, &replacement, 1)
        );
    }

    #[test]
    fn only_the_first_match_is_replaced(
        parts in prop::collection::vec("[a-z]{0,5}", 1..5),
        replacement in "[A-Z]{0,4}",
    ) {
        let subject = parts.join("-");
        prop_assert_eq!(
            replace_first(&subject, "-", &replacement),
            subject.replacen('-', &replacement, 1)
        );
    }

    #[test]
    fn substitute_matches_str_replace(
        subject in "[ab(). ]{0,16}",
        search in "[ab().]{1,3}",
        replacement in "[xy]{0,3}",
    ) {
        prop_assert_eq!(
            substitute_all(&subject, &search, &replacement),
            subject.replace(&search, &replacement)
        );
    }

    #[test]
    fn datedif_of_a_date_with_itself_is_zero(date in date_strategy()) {
        for unit in UNITS {
            prop_assert_eq!(datedif(date, date, unit), Some(0));
        }
    }

    #[test]
    fn datedif_ignores_argument_order(a in date_strategy(), b in date_strategy()) {
        for unit in UNITS {
            let forward = datedif(a, b, unit);
            prop_assert_eq!(forward, datedif(b, a, unit));
            prop_assert!(forward.unwrap_or(-1) >= 0, "unit {} gave {:?}", unit, forward);
        }
    }

    #[test]
    fn datedif_components_stay_in_range(a in date_strategy(), b in date_strategy()) {
        let months = datedif(a, b, "m").unwrap_or(-1);
        prop_assert_eq!(datedif(a, b, "y"), Some(months / 12));
        prop_assert_eq!(datedif(a, b, "ym"), Some(months % 12));
        prop_assert!(datedif(a, b, "md").unwrap_or(-1) < 31);
        prop_assert!(datedif(a, b, "yd").unwrap_or(-1) < 366);
    }

    #[test]
    fn display_parses_back_to_the_same_tree(expr in expr_strategy()) {
        let text = expr.to_string();
        let reparsed = parse_formula(&text);
        prop_assert_eq!(reparsed.as_ref(), Ok(&expr), "formula text {}", text);
    }
}
