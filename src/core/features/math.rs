//! Calculator widget with AST-based math evaluation, plus percentages
//!
//! Uses meval for safe expression parsing and evaluation.

use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{FieldSpec, WidgetInput, WidgetOutput};
use super::Calculator;
use super::unit_converter::format_number;
use meval::Expr;
use std::str::FromStr;

/// Evaluate a mathematical expression using AST-based evaluation
pub fn evaluate_expression(expression: &str) -> AppResult<f64> {
    // Accept the symbols people paste from other calculators
    let cleaned = expression.trim()
        .replace('×', "*")
        .replace('÷', "/")
        .replace('−', "-");

    let expr = Expr::from_str(&cleaned)
        .map_err(|e| AppError::Validation(format!("Failed to parse expression '{}': {}", cleaned, e)))?;

    let result = expr.eval()
        .map_err(|e| AppError::Calculation(format!("Failed to evaluate expression '{}': {}", cleaned, e)))?;

    if result.is_nan() {
        return Err(AppError::Calculation("Result is NaN (Not a Number)".to_string()));
    }
    if result.is_infinite() {
        return Err(AppError::Calculation("Result is infinite".to_string()));
    }

    Ok(result)
}

#[derive(Debug, Clone)]
pub struct ExpressionWidget;

impl Calculator for ExpressionWidget {
    fn id(&self) -> &str {
        "calculator"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![FieldSpec::text("expression", "Expression")]
    }

    fn compute(&self, input: &WidgetInput) -> AppResult<WidgetOutput> {
        let expression = input
            .text("expression")
            .ok_or_else(|| AppError::Validation("Missing 'expression' parameter".to_string()))?;
        let result = evaluate_expression(expression)?;

        Ok(WidgetOutput::new(format_number(result)).value("result", result))
    }
}

/// "X% of Y" and "X is what % of Y"
#[derive(Debug, Clone)]
pub struct PercentageWidget;

impl Calculator for PercentageWidget {
    fn id(&self) -> &str {
        "percentage"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::number("x", "X"),
            FieldSpec::number("y", "Y"),
            FieldSpec::choice("mode", "Mode", &["percent_of", "ratio"], "percent_of"),
        ]
    }

    fn compute(&self, input: &WidgetInput) -> AppResult<WidgetOutput> {
        let x = input.number("x")?;
        let y = input.number("y")?;

        match input.text_or("mode", "percent_of") {
            "percent_of" => {
                let result = x / 100.0 * y;
                Ok(WidgetOutput::new(format_number(result)).value("result", result))
            }
            "ratio" => {
                if y == 0.0 {
                    return Err(AppError::Calculation("Division by zero".to_string()));
                }
                let result = x / y * 100.0;
                Ok(WidgetOutput::new(format!("{}%", format_number(result))).value("result", result))
            }
            other => Err(AppError::Validation(format!("Unknown mode: {}", other))),
        }
    }
}
