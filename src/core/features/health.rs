//! Health metrics: body mass index and basal metabolic rate

use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{FieldSpec, WidgetInput, WidgetOutput};
use super::Calculator;
use super::unit_converter::format_number_with;

fn positive(input: &WidgetInput, key: &str) -> AppResult<f64> {
    let value = input.number(key)?;
    if value <= 0.0 {
        return Err(AppError::Validation(format!("'{}' must be greater than zero", key)));
    }
    Ok(value)
}

/// WHO adult weight classes
pub fn bmi_class(bmi: f64) -> &'static str {
    if bmi < 18.5 {
        "underweight"
    } else if bmi < 25.0 {
        "normal"
    } else if bmi < 30.0 {
        "overweight"
    } else {
        "obese"
    }
}

#[derive(Debug, Clone)]
pub struct BmiWidget;

impl Calculator for BmiWidget {
    fn id(&self) -> &str {
        "bmi"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::number("weight", "Weight (kg)"),
            FieldSpec::number("height", "Height (cm)"),
        ]
    }

    fn compute(&self, input: &WidgetInput) -> AppResult<WidgetOutput> {
        let weight = positive(input, "weight")?;
        let height_m = positive(input, "height")? / 100.0;
        let bmi = weight / (height_m * height_m);

        Ok(WidgetOutput::new(format_number_with(bmi, 1))
            .value("bmi", bmi)
            .detail("category", bmi_class(bmi)))
    }
}

/// Mifflin-St Jeor resting energy expenditure
#[derive(Debug, Clone)]
pub struct BmrWidget;

impl Calculator for BmrWidget {
    fn id(&self) -> &str {
        "bmr"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::number("weight", "Weight (kg)"),
            FieldSpec::number("height", "Height (cm)"),
            FieldSpec::number("age", "Age (years)"),
            FieldSpec::choice("sex", "Sex", &["male", "female"], "male"),
        ]
    }

    fn compute(&self, input: &WidgetInput) -> AppResult<WidgetOutput> {
        let weight = positive(input, "weight")?;
        let height = positive(input, "height")?;
        let age = positive(input, "age")?;
        let offset = match input.text_or("sex", "male") {
            "male" => 5.0,
            "female" => -161.0,
            other => return Err(AppError::Validation(format!("Unknown sex option: {}", other))),
        };

        let bmr = 10.0 * weight + 6.25 * height - 5.0 * age + offset;

        Ok(WidgetOutput::new(format!("{} kcal/day", format_number_with(bmr, 0)))
            .value("bmr", bmr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi() {
        let input = WidgetInput::from_pairs([("weight", "70"), ("height", "175")]);
        let output = BmiWidget.compute(&input).unwrap();
        assert!((output.values["bmi"] - 22.857).abs() < 1e-3);
        assert_eq!(output.primary, "22.9");
        assert_eq!(output.details[0].value, "normal");
    }

    #[test]
    fn test_bmi_rejects_zero_height() {
        let input = WidgetInput::from_pairs([("weight", "70"), ("height", "0")]);
        let err = BmiWidget.compute(&input).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_bmi_classes() {
        assert_eq!(bmi_class(17.0), "underweight");
        assert_eq!(bmi_class(18.5), "normal");
        assert_eq!(bmi_class(27.0), "overweight");
        assert_eq!(bmi_class(30.0), "obese");
    }

    #[test]
    fn test_bmr() {
        let input = WidgetInput::from_pairs([
            ("weight", "70"),
            ("height", "175"),
            ("age", "30"),
            ("sex", "female"),
        ]);
        let output = BmrWidget.compute(&input).unwrap();
        // 700 + 1093.75 - 150 - 161
        assert_eq!(output.values["bmr"], 1482.75);
        assert_eq!(output.primary, "1483 kcal/day");
    }
}
