//! Unit conversion commands

use crate::core::features::unit_converter::{all_units, category_of, convert_in, parse_unit_from_text, MeasurementCategory};
use crate::shared::error::{AppError, AppResult, ConversionError};
use crate::shared::types::{ConvertUnitsRequest, ConvertUnitsResponse, GetUnitsResponse, ParseUnitResponse, UnitDTO};
use crate::CalculatorHub;

fn resolve_category(request: &ConvertUnitsRequest) -> AppResult<MeasurementCategory> {
    match &request.category {
        Some(key) => MeasurementCategory::from_key(key)
            .ok_or_else(|| AppError::Validation(format!("Unknown category: {}", key))),
        None => category_of(&request.from_unit).ok_or_else(|| {
            AppError::from(ConversionError::UnknownUnit {
                unit: request.from_unit.clone(),
                category: "any".to_string(),
            })
        }),
    }
}

/// Convert an amount, formatted with the configured precision
pub async fn convert_units_command(hub: &CalculatorHub, request: ConvertUnitsRequest) -> AppResult<ConvertUnitsResponse> {
    let category = resolve_category(&request)?;
    // Request units are caller input; reject them here instead of in the engine
    for unit in [&request.from_unit, &request.to_unit] {
        if !category.kind().contains(unit) {
            return Err(ConversionError::UnknownUnit {
                unit: unit.clone(),
                category: category.key().to_string(),
            }
            .into());
        }
    }
    let result = convert_in(category, request.amount, &request.from_unit, &request.to_unit)?;

    Ok(ConvertUnitsResponse {
        result,
        formatted_result: hub.format_number(result),
        from_unit: request.from_unit,
        to_unit: request.to_unit,
        category: category.key().to_string(),
    })
}

pub async fn get_all_units_command() -> AppResult<GetUnitsResponse> {
    Ok(GetUnitsResponse { units: all_units() })
}

pub async fn get_units_for_category_command(category: String) -> AppResult<Vec<UnitDTO>> {
    let category = MeasurementCategory::from_key(&category)
        .ok_or_else(|| AppError::Validation(format!("Unknown category: {}", category)))?;
    Ok(all_units()
        .into_iter()
        .filter(|unit| unit.category == category.key())
        .collect())
}

/// Extract "<amount> <unit>" from free text such as "12 km" or "25°C"
pub async fn parse_text_command(text: String) -> AppResult<ParseUnitResponse> {
    let (amount, unit, category) = parse_unit_from_text(&text)?;

    Ok(ParseUnitResponse {
        amount,
        unit: unit.to_string(),
        category: category.key().to_string(),
    })
}
