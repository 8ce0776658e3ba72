//! Finance estimators
//!
//! These formulas are deliberately simplified and every result carries the
//! "simplified estimate" disclaimer.

use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{FieldSpec, WidgetInput, WidgetOutput};
use super::{Calculator, SIMPLIFIED_ESTIMATE};
use super::unit_converter::format_number_with;

fn money(value: f64) -> String {
    format_number_with(value, 2)
}

fn non_negative(input: &WidgetInput, key: &str) -> AppResult<f64> {
    let value = input.number(key)?;
    if value < 0.0 {
        return Err(AppError::Validation(format!("'{}' cannot be negative", key)));
    }
    Ok(value)
}

fn estimate(output: WidgetOutput) -> WidgetOutput {
    WidgetOutput {
        disclaimer: Some(SIMPLIFIED_ESTIMATE.to_string()),
        ..output
    }
}

/// Fixed-rate amortized monthly payment
pub fn monthly_payment(principal: f64, annual_rate_percent: f64, months: f64) -> f64 {
    let r = annual_rate_percent / 100.0 / 12.0;
    let growth = (1.0 + r).powf(months);
    if r == 0.0 || growth == 1.0 {
        // Rate too small to register in f64
        return principal / months;
    }
    if growth.is_infinite() {
        // Interest-only limit for very long terms
        return principal * r;
    }
    principal * r * growth / (growth - 1.0)
}

/// A = P(1 + r/n)^(nt)
pub fn compound_amount(principal: f64, annual_rate_percent: f64, periods_per_year: f64, years: f64) -> f64 {
    let r = annual_rate_percent / 100.0;
    principal * (1.0 + r / periods_per_year).powf(periods_per_year * years)
}

#[derive(Debug, Clone)]
pub struct LoanWidget;

impl Calculator for LoanWidget {
    fn id(&self) -> &str {
        "loan"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::number("principal", "Loan amount"),
            FieldSpec::number("rate", "Annual interest rate (%)"),
            FieldSpec::number("years", "Term (years)"),
        ]
    }

    fn compute(&self, input: &WidgetInput) -> AppResult<WidgetOutput> {
        let principal = non_negative(input, "principal")?;
        let rate = non_negative(input, "rate")?;
        let months = non_negative(input, "years")? * 12.0;
        if months == 0.0 {
            return Err(AppError::Validation("'years' must be greater than zero".to_string()));
        }

        let payment = monthly_payment(principal, rate, months);
        let total = payment * months;

        Ok(estimate(
            WidgetOutput::new(money(payment))
                .value("monthly_payment", payment)
                .value("total_paid", total)
                .value("total_interest", total - principal)
                .detail("total_paid", money(total))
                .detail("total_interest", money(total - principal)),
        ))
    }
}

#[derive(Debug, Clone)]
pub struct CompoundInterestWidget;

impl Calculator for CompoundInterestWidget {
    fn id(&self) -> &str {
        "compound-interest"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::number("principal", "Initial amount"),
            FieldSpec::number("rate", "Annual interest rate (%)"),
            FieldSpec::number("years", "Years"),
            FieldSpec::choice("frequency", "Compounding per year", &["1", "4", "12", "365"], "12"),
        ]
    }

    fn compute(&self, input: &WidgetInput) -> AppResult<WidgetOutput> {
        let principal = non_negative(input, "principal")?;
        let rate = non_negative(input, "rate")?;
        let years = non_negative(input, "years")?;
        let frequency = input.number_or("frequency", 12.0)?;
        if frequency <= 0.0 {
            return Err(AppError::Validation("'frequency' must be greater than zero".to_string()));
        }

        let amount = compound_amount(principal, rate, frequency, years);

        Ok(estimate(
            WidgetOutput::new(money(amount))
                .value("amount", amount)
                .value("interest", amount - principal)
                .detail("interest", money(amount - principal)),
        ))
    }
}

#[derive(Debug, Clone)]
pub struct TipWidget;

impl Calculator for TipWidget {
    fn id(&self) -> &str {
        "tip"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::number("bill", "Bill amount"),
            FieldSpec::number("percent", "Tip (%)").with_default("15"),
            FieldSpec::number("people", "Split between").with_default("1"),
        ]
    }

    fn compute(&self, input: &WidgetInput) -> AppResult<WidgetOutput> {
        let bill = non_negative(input, "bill")?;
        let percent = input.number_or("percent", 15.0)?;
        let people = input.number_or("people", 1.0)?.floor();
        if people < 1.0 {
            return Err(AppError::Validation("'people' must be at least 1".to_string()));
        }

        let tip = bill * percent / 100.0;
        let total = bill + tip;
        let per_person = total / people;

        Ok(WidgetOutput::new(money(tip))
            .value("tip", tip)
            .value("total", total)
            .value("per_person", per_person)
            .detail("total", money(total))
            .detail("per_person", money(per_person)))
    }
}

#[derive(Debug, Clone)]
pub struct DiscountWidget;

impl Calculator for DiscountWidget {
    fn id(&self) -> &str {
        "discount"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::number("price", "Original price"),
            FieldSpec::number("percent", "Discount (%)"),
        ]
    }

    fn compute(&self, input: &WidgetInput) -> AppResult<WidgetOutput> {
        let price = non_negative(input, "price")?;
        let percent = non_negative(input, "percent")?;
        let saved = price * percent / 100.0;
        let final_price = price - saved;

        Ok(WidgetOutput::new(money(final_price))
            .value("final_price", final_price)
            .value("saved", saved)
            .detail("saved", money(saved)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_payment() {
        // 200k over 30 years at 6%
        let payment = monthly_payment(200_000.0, 6.0, 360.0);
        assert!((payment - 1199.10).abs() < 0.01);
    }

    #[test]
    fn test_zero_rate_loan() {
        assert_eq!(monthly_payment(1200.0, 0.0, 12.0), 100.0);
    }

    #[test]
    fn test_monthly_payment_extremes_are_finite() {
        assert_eq!(monthly_payment(1200.0, 1e-16, 12.0), 100.0);
        let payment = monthly_payment(1000.0, 5.0, 12_000_000.0);
        assert!(payment.is_finite());
        assert!((payment - 1000.0 * 0.05 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_loan_widget() {
        let input = WidgetInput::from_pairs([("principal", "1200"), ("rate", "0"), ("years", "1")]);
        let output = LoanWidget.compute(&input).unwrap();
        assert_eq!(output.primary, "100");
        assert_eq!(output.values["total_interest"], 0.0);
        assert_eq!(output.disclaimer.as_deref(), Some(SIMPLIFIED_ESTIMATE));
    }

    #[test]
    fn test_loan_rejects_zero_term() {
        let input = WidgetInput::from_pairs([("principal", "1200"), ("rate", "5"), ("years", "0")]);
        assert!(LoanWidget.compute(&input).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_compound_interest() {
        // 1000 at 5% compounded yearly for 2 years
        let amount = compound_amount(1000.0, 5.0, 1.0, 2.0);
        assert!((amount - 1102.5).abs() < 1e-9);

        let input = WidgetInput::from_pairs([
            ("principal", "1000"),
            ("rate", "5"),
            ("years", "2"),
            ("frequency", "1"),
        ]);
        let output = CompoundInterestWidget.compute(&input).unwrap();
        assert_eq!(output.primary, "1102.5");
    }

    #[test]
    fn test_tip_split() {
        let input = WidgetInput::from_pairs([("bill", "100"), ("percent", "20"), ("people", "4")]);
        let output = TipWidget.compute(&input).unwrap();
        assert_eq!(output.values["tip"], 20.0);
        assert_eq!(output.values["per_person"], 30.0);
    }

    #[test]
    fn test_discount() {
        let input = WidgetInput::from_pairs([("price", "80"), ("percent", "25")]);
        let output = DiscountWidget.compute(&input).unwrap();
        assert_eq!(output.primary, "60");
        assert_eq!(output.values["saved"], 20.0);
    }
}
