//! Calculator widgets with enum dispatch
//!
//! Every tool key that has a concrete widget maps to a factory in
//! `WIDGET_FACTORIES`. The set is closed and known at compile time, so the
//! widgets live in an `enum_dispatch` enum instead of trait objects.
//! Unrecognized keys fall through to the "not implemented" placeholder.

use crate::shared::error::{AppError, AppResult, ConversionError};
use crate::shared::types::{FieldSpec, WidgetInput, WidgetOutput, WidgetState};
use enum_dispatch::enum_dispatch;
use log::{debug, warn};
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub mod unit_converter;
pub mod health;
pub mod finance;
pub mod date_time;
pub mod math;
pub mod placeholder;

use unit_converter::{MeasurementCategory, UnitConverterWidget};

/// Shown under finance and tax results
pub const SIMPLIFIED_ESTIMATE: &str = "Simplified estimate. Not financial advice.";

/// Common behaviour of every calculator widget
#[enum_dispatch]
pub trait Calculator: Send + Sync {
    /// Tool key this widget renders for
    fn id(&self) -> &str;

    /// Input fields, in display order
    fn fields(&self) -> Vec<FieldSpec>;

    /// Apply the widget's formula to the raw input
    fn compute(&self, input: &WidgetInput) -> AppResult<WidgetOutput>;

    /// False only for the placeholder
    fn is_implemented(&self) -> bool {
        true
    }
}

#[enum_dispatch(Calculator)]
#[derive(Debug, Clone)]
pub enum AppWidget {
    UnitConverter(UnitConverterWidget),
    Bmi(health::BmiWidget),
    Bmr(health::BmrWidget),
    Loan(finance::LoanWidget),
    CompoundInterest(finance::CompoundInterestWidget),
    Tip(finance::TipWidget),
    Discount(finance::DiscountWidget),
    Percentage(math::PercentageWidget),
    Expression(math::ExpressionWidget),
    Age(date_time::AgeWidget),
    DateDiff(date_time::DateDiffWidget),
    NotImplemented(placeholder::NotImplementedWidget),
}

type WidgetFactory = fn() -> AppWidget;

/// Tool key → widget constructor, built once
static WIDGET_FACTORIES: Lazy<HashMap<&'static str, WidgetFactory>> = Lazy::new(|| {
    fn converter(key: &'static str, category: MeasurementCategory) -> AppWidget {
        AppWidget::UnitConverter(UnitConverterWidget::new(key, category))
    }

    let entries: [(&'static str, WidgetFactory); 18] = [
        ("length", || converter("length", MeasurementCategory::Length)),
        ("weight", || converter("weight", MeasurementCategory::Weight)),
        ("volume", || converter("volume", MeasurementCategory::Volume)),
        ("area", || converter("area", MeasurementCategory::Area)),
        ("speed", || converter("speed", MeasurementCategory::Speed)),
        ("time-units", || converter("time-units", MeasurementCategory::Time)),
        ("data-storage", || converter("data-storage", MeasurementCategory::DataStorage)),
        ("temperature", || converter("temperature", MeasurementCategory::Temperature)),
        ("bmi", || AppWidget::Bmi(health::BmiWidget)),
        ("bmr", || AppWidget::Bmr(health::BmrWidget)),
        ("loan", || AppWidget::Loan(finance::LoanWidget)),
        ("compound-interest", || AppWidget::CompoundInterest(finance::CompoundInterestWidget)),
        ("tip", || AppWidget::Tip(finance::TipWidget)),
        ("discount", || AppWidget::Discount(finance::DiscountWidget)),
        ("percentage", || AppWidget::Percentage(math::PercentageWidget)),
        ("calculator", || AppWidget::Expression(math::ExpressionWidget)),
        ("age", || AppWidget::Age(date_time::AgeWidget::default())),
        ("date-diff", || AppWidget::DateDiff(date_time::DateDiffWidget)),
    ];

    let factories: HashMap<_, _> = entries.into_iter().collect();
    debug!("[Widgets] Registered {} widget factories", factories.len());
    factories
});

/// Resolve a tool key to its widget; unknown keys get the placeholder
pub fn dispatch(tool_key: &str) -> AppWidget {
    match WIDGET_FACTORIES.get(tool_key) {
        Some(factory) => factory(),
        None => {
            debug!("[Widgets] No widget for '{}', using placeholder", tool_key);
            AppWidget::NotImplemented(placeholder::NotImplementedWidget::new(tool_key))
        }
    }
}

pub fn has_widget(tool_key: &str) -> bool {
    WIDGET_FACTORIES.contains_key(tool_key)
}

/// Run a widget and fold every failure into a quiet UI state
pub fn evaluate(widget: &AppWidget, input: &WidgetInput) -> WidgetState {
    let free_inputs: Vec<FieldSpec> = widget
        .fields()
        .into_iter()
        .filter(|f| f.is_free_input())
        .collect();
    if !free_inputs.is_empty() && free_inputs.iter().all(|f| input.is_blank(&f.key)) {
        return WidgetState::Empty;
    }

    match widget.compute(input) {
        Ok(output) => match output.values.iter().find(|(_, v)| !v.is_finite()) {
            Some((name, value)) => {
                warn!("[Widgets] '{}' produced non-finite {} = {}", widget.id(), name, value);
                WidgetState::Invalid {
                    message_key: "error.calculation".to_string(),
                    detail: format!("Result '{}' is out of range", name),
                }
            }
            None => WidgetState::Ready(output),
        },
        Err(AppError::Conversion(ConversionError::UnknownUnit { .. })) => WidgetState::CannotConvert {
            message_key: "error.cannot_convert".to_string(),
        },
        Err(e) if e.is_invalid_input() => WidgetState::Invalid {
            message_key: "error.invalid_input".to_string(),
            detail: e.to_string(),
        },
        Err(e) => {
            warn!("[Widgets] '{}' failed: {}", widget.id(), e);
            WidgetState::Invalid {
                message_key: "error.calculation".to_string(),
                detail: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_known_keys() {
        for key in ["length", "temperature", "bmi", "loan", "calculator", "age"] {
            let widget = dispatch(key);
            assert_eq!(widget.id(), key);
            assert!(widget.is_implemented());
        }
    }

    #[test]
    fn test_dispatch_unknown_falls_back() {
        let widget = dispatch("periodic-table");
        assert!(matches!(widget, AppWidget::NotImplemented(_)));
        assert_eq!(widget.id(), "periodic-table");
        assert!(!widget.is_implemented());
        assert!(!has_widget("periodic-table"));
    }

    #[test]
    fn test_evaluate_blank_is_empty() {
        let widget = dispatch("length");
        let input = WidgetInput::from_pairs([("from", "m"), ("to", "km")]);
        assert_eq!(evaluate(&widget, &input), WidgetState::Empty);
    }

    #[test]
    fn test_evaluate_invalid_input() {
        let widget = dispatch("length");
        let input = WidgetInput::from_pairs([("value", "abc"), ("from", "m"), ("to", "km")]);
        match evaluate(&widget, &input) {
            WidgetState::Invalid { message_key, .. } => assert_eq!(message_key, "error.invalid_input"),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_evaluate_unknown_unit() {
        let widget = dispatch("length");
        let input = WidgetInput::from_pairs([("value", "3"), ("from", "m"), ("to", "kg")]);
        assert!(matches!(evaluate(&widget, &input), WidgetState::CannotConvert { .. }));
    }

    fn assert_calculation_error(state: WidgetState) {
        match state {
            WidgetState::Invalid { message_key, .. } => assert_eq!(message_key, "error.calculation"),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_evaluate_overflow_is_calculation_error() {
        let widget = dispatch("compound-interest");
        let input = WidgetInput::from_pairs([("principal", "1000"), ("rate", "100"), ("years", "1000000")]);
        assert_calculation_error(evaluate(&widget, &input));
    }

    #[test]
    fn test_evaluate_loan_long_term_stays_finite() {
        let widget = dispatch("loan");
        let input = WidgetInput::from_pairs([("principal", "1000"), ("rate", "5"), ("years", "1000000")]);
        match evaluate(&widget, &input) {
            WidgetState::Ready(output) => {
                assert!(output.values.values().all(|v| v.is_finite()));
                assert_ne!(output.primary, "NaN");
            }
            WidgetState::Invalid { message_key, .. } => assert_eq!(message_key, "error.calculation"),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_evaluate_loan_tiny_rate_stays_finite() {
        let widget = dispatch("loan");
        let input = WidgetInput::from_pairs([("principal", "1200"), ("rate", "0.0000000000000001"), ("years", "1")]);
        match evaluate(&widget, &input) {
            WidgetState::Ready(output) => assert_eq!(output.primary, "100"),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_evaluate_converter_overflow() {
        let widget = dispatch("data-storage");
        let input = WidgetInput::from_pairs([("value", "1e308"), ("from", "tb"), ("to", "bit")]);
        assert!(matches!(evaluate(&widget, &input), WidgetState::Invalid { .. }));
    }

    #[test]
    fn test_evaluate_ready() {
        let widget = dispatch("temperature");
        let input = WidgetInput::from_pairs([("value", "100"), ("from", "celsius"), ("to", "kelvin")]);
        match evaluate(&widget, &input) {
            WidgetState::Ready(output) => assert_eq!(output.primary, "373.15 kelvin"),
            other => panic!("unexpected state {:?}", other),
        }
    }
}
