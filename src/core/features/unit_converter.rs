use crate::shared::error::{AppResult, ConversionError};
use crate::shared::types::{FieldSpec, UnitDTO, WidgetInput, WidgetOutput};
use super::Calculator;
use log::{debug, error};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

/// Decimal places shown for converted values
pub const DISPLAY_DECIMALS: usize = 6;

/// Non-zero magnitudes below this print in scientific notation
const SCIENTIFIC_LOWER: f64 = 1e-6;

/// Magnitudes at or above this print in scientific notation
const SCIENTIFIC_UPPER: f64 = 1e15;

// ============================================================================
// Unit Tables
// ============================================================================

/// Measurement categories with a conversion table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum MeasurementCategory {
    Length,
    Weight,
    Volume,
    Area,
    Speed,
    Time,
    DataStorage,
    Temperature,
}

impl MeasurementCategory {
    pub const ALL: [MeasurementCategory; 8] = [
        MeasurementCategory::Length,
        MeasurementCategory::Weight,
        MeasurementCategory::Volume,
        MeasurementCategory::Area,
        MeasurementCategory::Speed,
        MeasurementCategory::Time,
        MeasurementCategory::DataStorage,
        MeasurementCategory::Temperature,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MeasurementCategory::Length => "length",
            MeasurementCategory::Weight => "weight",
            MeasurementCategory::Volume => "volume",
            MeasurementCategory::Area => "area",
            MeasurementCategory::Speed => "speed",
            MeasurementCategory::Time => "time",
            MeasurementCategory::DataStorage => "data_storage",
            MeasurementCategory::Temperature => "temperature",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    /// Conversion table for this category
    pub fn kind(self) -> &'static ConversionKind {
        &CATEGORY_TABLES[&self]
    }

    /// Units pre-selected when a converter opens
    fn default_pair(self) -> (&'static str, &'static str) {
        match self {
            MeasurementCategory::Length => ("m", "ft"),
            MeasurementCategory::Weight => ("kg", "lb"),
            MeasurementCategory::Volume => ("l", "gal"),
            MeasurementCategory::Area => ("m2", "ft2"),
            MeasurementCategory::Speed => ("km/h", "mph"),
            MeasurementCategory::Time => ("h", "min"),
            MeasurementCategory::DataStorage => ("mb", "gb"),
            MeasurementCategory::Temperature => ("celsius", "fahrenheit"),
        }
    }
}

/// Unit with its multiplier to the category's base unit
#[derive(Debug, Clone)]
pub struct UnitDefinition {
    pub key: &'static str,
    pub name: &'static str,
    pub factor: f64, // How many base units per 1 of this unit
}

const fn unit(key: &'static str, name: &'static str, factor: f64) -> UnitDefinition {
    UnitDefinition { key, name, factor }
}

/// Linear multiplier table for one measurement category
#[derive(Debug, Clone)]
pub struct UnitTable {
    category: &'static str,
    units: Vec<UnitDefinition>,
    index: HashMap<&'static str, usize>,
}

impl UnitTable {
    pub fn new(category: &'static str, units: Vec<UnitDefinition>) -> Self {
        let index = units
            .iter()
            .enumerate()
            .map(|(i, u)| (u.key, i))
            .collect();
        Self { category, units, index }
    }

    pub fn category(&self) -> &'static str {
        self.category
    }

    pub fn factor(&self, unit: &str) -> Option<f64> {
        self.index.get(unit).map(|&i| self.units[i].factor)
    }

    pub fn units(&self) -> &[UnitDefinition] {
        &self.units
    }

    pub fn base_unit(&self) -> Option<&UnitDefinition> {
        self.units.iter().find(|u| u.factor == 1.0)
    }

    /// Exactly one base unit, all factors strictly positive and finite, unique keys
    pub fn validate(&self) -> Result<(), String> {
        if self.index.len() != self.units.len() {
            return Err(format!("{}: duplicate unit keys", self.category));
        }
        if let Some(bad) = self
            .units
            .iter()
            .find(|u| !u.factor.is_finite() || u.factor <= 0.0)
        {
            return Err(format!(
                "{}: unit '{}' has invalid factor {}",
                self.category, bad.key, bad.factor
            ));
        }
        let bases = self.units.iter().filter(|u| u.factor == 1.0).count();
        if bases != 1 {
            return Err(format!(
                "{}: expected exactly one base unit, found {}",
                self.category, bases
            ));
        }
        Ok(())
    }
}

/// Affine scale converted through a common pivot unit
#[derive(Debug, Clone)]
pub struct AffineScale {
    pub key: &'static str,
    pub name: &'static str,
    pub to_pivot: fn(f64) -> f64,
    pub from_pivot: fn(f64) -> f64,
}

#[derive(Debug, Clone)]
pub struct AffineTable {
    category: &'static str,
    scales: Vec<AffineScale>,
}

impl AffineTable {
    pub fn new(category: &'static str, scales: Vec<AffineScale>) -> Self {
        Self { category, scales }
    }

    pub fn scale(&self, key: &str) -> Option<&AffineScale> {
        self.scales.iter().find(|s| s.key == key)
    }

    pub fn scales(&self) -> &[AffineScale] {
        &self.scales
    }
}

/// How a category converts: plain multipliers, or offset+scale through a pivot
#[derive(Debug, Clone)]
pub enum ConversionKind {
    Linear(UnitTable),
    Affine(AffineTable),
}

impl ConversionKind {
    pub fn category(&self) -> &'static str {
        match self {
            ConversionKind::Linear(t) => t.category,
            ConversionKind::Affine(t) => t.category,
        }
    }

    pub fn contains(&self, unit: &str) -> bool {
        match self {
            ConversionKind::Linear(t) => t.factor(unit).is_some(),
            ConversionKind::Affine(t) => t.scale(unit).is_some(),
        }
    }

    /// (key, display name) for every unit in table order
    pub fn unit_names(&self) -> Vec<(&'static str, &'static str)> {
        match self {
            ConversionKind::Linear(t) => t.units.iter().map(|u| (u.key, u.name)).collect(),
            ConversionKind::Affine(t) => t.scales.iter().map(|s| (s.key, s.name)).collect(),
        }
    }
}

// Temperature pivots through Celsius
fn identity(v: f64) -> f64 {
    v
}

fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

fn celsius_to_fahrenheit(c: f64) -> f64 {
    (c * 9.0 / 5.0) + 32.0
}

fn kelvin_to_celsius(k: f64) -> f64 {
    k - 273.15
}

fn celsius_to_kelvin(c: f64) -> f64 {
    c + 273.15
}

/// Thread-safe category tables initialized once at startup
static CATEGORY_TABLES: Lazy<HashMap<MeasurementCategory, ConversionKind>> = Lazy::new(|| {
    let mut tables = HashMap::new();

    // Length (base: meters)
    tables.insert(MeasurementCategory::Length, ConversionKind::Linear(UnitTable::new("length", vec![
        unit("mm", "Millimeters", 0.001),
        unit("cm", "Centimeters", 0.01),
        unit("m", "Meters", 1.0),
        unit("km", "Kilometers", 1000.0),
        unit("in", "Inches", 0.0254),
        unit("ft", "Feet", 0.3048),
        unit("yd", "Yards", 0.9144),
        unit("mi", "Miles", 1609.344),
        unit("nmi", "Nautical Miles", 1852.0),
    ])));

    // Weight (base: grams)
    tables.insert(MeasurementCategory::Weight, ConversionKind::Linear(UnitTable::new("weight", vec![
        unit("mg", "Milligrams", 0.001),
        unit("g", "Grams", 1.0),
        unit("kg", "Kilograms", 1000.0),
        unit("t", "Metric Tons", 1_000_000.0),
        unit("oz", "Ounces", 28.349523125),
        unit("lb", "Pounds", 453.59237),
        unit("st", "Stones", 6350.29318),
    ])));

    // Volume (base: liters)
    tables.insert(MeasurementCategory::Volume, ConversionKind::Linear(UnitTable::new("volume", vec![
        unit("ml", "Milliliters", 0.001),
        unit("l", "Liters", 1.0),
        unit("m3", "Cubic Meters", 1000.0),
        unit("tsp", "Teaspoons", 0.00492892159375),
        unit("tbsp", "Tablespoons", 0.01478676478125),
        unit("fl-oz", "Fluid Ounces", 0.0295735295625),
        unit("cup", "Cups", 0.2365882365),
        unit("pint", "Pints", 0.473176473),
        unit("quart", "Quarts", 0.946352946),
        unit("gal", "Gallons", 3.785411784),
    ])));

    // Area (base: square meters)
    tables.insert(MeasurementCategory::Area, ConversionKind::Linear(UnitTable::new("area", vec![
        unit("mm2", "Square Millimeters", 1e-6),
        unit("cm2", "Square Centimeters", 1e-4),
        unit("m2", "Square Meters", 1.0),
        unit("ha", "Hectares", 10_000.0),
        unit("km2", "Square Kilometers", 1_000_000.0),
        unit("in2", "Square Inches", 0.00064516),
        unit("ft2", "Square Feet", 0.09290304),
        unit("yd2", "Square Yards", 0.83612736),
        unit("acre", "Acres", 4046.8564224),
        unit("mi2", "Square Miles", 2_589_988.110336),
    ])));

    // Speed (base: m/s)
    tables.insert(MeasurementCategory::Speed, ConversionKind::Linear(UnitTable::new("speed", vec![
        unit("m/s", "Meters/Second", 1.0),
        unit("km/h", "Kilometers/Hour", 1.0 / 3.6),
        unit("mph", "Miles/Hour", 0.44704),
        unit("kn", "Knots", 1852.0 / 3600.0),
        unit("ft/s", "Feet/Second", 0.3048),
    ])));

    // Time (base: seconds, year = 365.25 days)
    tables.insert(MeasurementCategory::Time, ConversionKind::Linear(UnitTable::new("time", vec![
        unit("ms", "Milliseconds", 0.001),
        unit("s", "Seconds", 1.0),
        unit("min", "Minutes", 60.0),
        unit("h", "Hours", 3600.0),
        unit("day", "Days", 86_400.0),
        unit("week", "Weeks", 604_800.0),
        unit("year", "Years", 31_557_600.0),
    ])));

    // Data storage (base: bytes, binary prefixes)
    tables.insert(MeasurementCategory::DataStorage, ConversionKind::Linear(UnitTable::new("data_storage", vec![
        unit("bit", "Bits", 0.125),
        unit("byte", "Bytes", 1.0),
        unit("kb", "Kilobytes", 1024.0),
        unit("mb", "Megabytes", 1_048_576.0),
        unit("gb", "Gigabytes", 1_073_741_824.0),
        unit("tb", "Terabytes", 1_099_511_627_776.0),
    ])));

    // Temperature (pivot: Celsius)
    tables.insert(MeasurementCategory::Temperature, ConversionKind::Affine(AffineTable::new("temperature", vec![
        AffineScale { key: "celsius", name: "Celsius", to_pivot: identity, from_pivot: identity },
        AffineScale { key: "fahrenheit", name: "Fahrenheit", to_pivot: fahrenheit_to_celsius, from_pivot: celsius_to_fahrenheit },
        AffineScale { key: "kelvin", name: "Kelvin", to_pivot: kelvin_to_celsius, from_pivot: celsius_to_kelvin },
    ])));

    tables
});

// ============================================================================
// Conversion
// ============================================================================

/// Unit keys come from widget wiring, never from free text, so a miss is a
/// bug: debug builds of the app panic here, release builds log at `error`
/// and the widget shows "cannot convert". The crate's own tests exercise the
/// release path.
fn unknown_unit(unit: &str, kind: &ConversionKind) -> ConversionError {
    error!("[UnitConverter] Unknown unit '{}' for {}", unit, kind.category());
    #[cfg(not(test))]
    debug_assert!(false, "unknown unit '{}' for {}", unit, kind.category());
    ConversionError::UnknownUnit {
        unit: unit.to_string(),
        category: kind.category().to_string(),
    }
}

/// Convert `value` from one unit to another within a single table
///
/// Linear tables compute `value * factor(from) / factor(to)`; affine tables
/// go through the pivot unit. Pure and deterministic.
pub fn convert(
    value: f64,
    from_unit: &str,
    to_unit: &str,
    kind: &ConversionKind,
) -> Result<f64, ConversionError> {
    if !value.is_finite() {
        return Err(ConversionError::InvalidInput(format!(
            "{} is not a finite number",
            value
        )));
    }

    let result = match kind {
        ConversionKind::Linear(table) => {
            let from = table.factor(from_unit).ok_or_else(|| unknown_unit(from_unit, kind))?;
            let to = table.factor(to_unit).ok_or_else(|| unknown_unit(to_unit, kind))?;
            if from_unit == to_unit {
                return Ok(value);
            }
            value * from / to
        }
        ConversionKind::Affine(table) => {
            let from = table.scale(from_unit).ok_or_else(|| unknown_unit(from_unit, kind))?;
            let to = table.scale(to_unit).ok_or_else(|| unknown_unit(to_unit, kind))?;
            if from_unit == to_unit {
                return Ok(value);
            }
            (to.from_pivot)((from.to_pivot)(value))
        }
    };

    if !result.is_finite() {
        return Err(ConversionError::InvalidInput(format!(
            "{} {} is out of range in {}",
            value, from_unit, to_unit
        )));
    }

    debug!(
        "[UnitConverter] {} {} → {} {} ({})",
        value, from_unit, result, to_unit, kind.category()
    );

    Ok(result)
}

/// Convert using the built-in table for `category`
pub fn convert_in(
    category: MeasurementCategory,
    value: f64,
    from_unit: &str,
    to_unit: &str,
) -> Result<f64, ConversionError> {
    convert(value, from_unit, to_unit, category.kind())
}

/// Category owning a unit key (keys are unique across tables)
pub fn category_of(unit: &str) -> Option<MeasurementCategory> {
    MeasurementCategory::ALL
        .into_iter()
        .find(|c| c.kind().contains(unit))
}

/// All built-in units, sorted by category then label
pub fn all_units() -> Vec<UnitDTO> {
    let mut units: Vec<UnitDTO> = MeasurementCategory::ALL
        .into_iter()
        .flat_map(|category| {
            category
                .kind()
                .unit_names()
                .into_iter()
                .map(move |(key, name)| UnitDTO {
                    id: key.to_string(),
                    label: name.to_string(),
                    category: category.key().to_string(),
                })
        })
        .collect();

    units.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.label.cmp(&b.label)));
    units
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse user-entered text as a finite quantity
///
/// Accepts a comma as decimal separator ("12,5"); when both separators
/// appear, commas are treated as thousands separators ("1,234.5"). A comma
/// after the last dot ("1.234,5") is rejected as ambiguous.
pub fn parse_quantity(text: &str) -> Result<f64, ConversionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ConversionError::InvalidInput("Empty text".to_string()));
    }

    let normalized = if let Some(dot) = trimmed.rfind('.') {
        // "1.234,5" uses the other convention; refuse rather than misread it
        if trimmed[dot..].contains(',') {
            return Err(ConversionError::InvalidInput(format!(
                "Ambiguous decimal separators: {}",
                trimmed
            )));
        }
        trimmed.replace(',', "")
    } else {
        trimmed.replace(',', ".")
    };

    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ConversionError::InvalidInput(format!(
            "Could not parse quantity: {}",
            trimmed
        ))),
    }
}

// Unit aliases mapping to canonical table keys
fn normalize_unit(unit: &str) -> Option<&'static str> {
    let unit_lower = unit.trim().to_lowercase();
    match unit_lower.as_str() {
        // Length
        "mm" | "millimeter" | "millimeters" | "millimetre" | "millimetres" => Some("mm"),
        "cm" | "centimeter" | "centimeters" | "centimetre" | "centimetres" => Some("cm"),
        "m" | "meter" | "meters" | "metre" | "metres" => Some("m"),
        "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => Some("km"),
        "in" | "inch" | "inches" => Some("in"),
        "ft" | "foot" | "feet" => Some("ft"),
        "yd" | "yard" | "yards" => Some("yd"),
        "mi" | "mile" | "miles" => Some("mi"),
        "nmi" => Some("nmi"),
        // Weight
        "mg" | "milligram" | "milligrams" => Some("mg"),
        "g" | "gram" | "grams" => Some("g"),
        "kg" | "kilogram" | "kilograms" => Some("kg"),
        "t" | "tonne" | "tonnes" => Some("t"),
        "oz" | "ounce" | "ounces" => Some("oz"),
        "lb" | "lbs" | "pound" | "pounds" => Some("lb"),
        "st" | "stone" | "stones" => Some("st"),
        // Volume
        "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => Some("ml"),
        "l" | "liter" | "liters" | "litre" | "litres" => Some("l"),
        "m3" | "m³" => Some("m3"),
        "tsp" | "teaspoon" | "teaspoons" => Some("tsp"),
        "tbsp" | "tablespoon" | "tablespoons" => Some("tbsp"),
        "fl-oz" | "floz" => Some("fl-oz"),
        "cup" | "cups" => Some("cup"),
        "pint" | "pints" => Some("pint"),
        "quart" | "quarts" => Some("quart"),
        "gal" | "gallon" | "gallons" => Some("gal"),
        // Area
        "mm2" | "mm²" => Some("mm2"),
        "cm2" | "cm²" => Some("cm2"),
        "m2" | "m²" => Some("m2"),
        "ha" | "hectare" | "hectares" => Some("ha"),
        "km2" | "km²" => Some("km2"),
        "in2" | "in²" => Some("in2"),
        "ft2" | "ft²" => Some("ft2"),
        "yd2" | "yd²" => Some("yd2"),
        "acre" | "acres" => Some("acre"),
        "mi2" | "mi²" => Some("mi2"),
        // Speed
        "m/s" => Some("m/s"),
        "km/h" | "kmh" | "kph" => Some("km/h"),
        "mph" => Some("mph"),
        "kn" | "kt" | "knot" | "knots" => Some("kn"),
        "ft/s" => Some("ft/s"),
        // Time
        "ms" | "millisecond" | "milliseconds" => Some("ms"),
        "s" | "sec" | "secs" | "second" | "seconds" => Some("s"),
        "min" | "mins" | "minute" | "minutes" => Some("min"),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some("h"),
        "day" | "days" => Some("day"),
        "week" | "weeks" => Some("week"),
        "year" | "years" => Some("year"),
        // Data storage
        "bit" | "bits" => Some("bit"),
        "byte" | "bytes" => Some("byte"),
        "kb" => Some("kb"),
        "mb" => Some("mb"),
        "gb" => Some("gb"),
        "tb" => Some("tb"),
        // Temperature
        "c" | "°c" | "celsius" => Some("celsius"),
        "f" | "°f" | "fahrenheit" => Some("fahrenheit"),
        "k" | "kelvin" => Some("kelvin"),
        _ => None,
    }
}

static RE_NUMBER_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([+-]?\d+(?:\.\d+)?)\s*(°?[a-zA-Z][a-zA-Z0-9/²³\-]*)")
        .expect("Failed to compile number-unit pattern")
});

static RE_UNIT_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(°?[a-zA-Z][a-zA-Z/²³\-]*)\s*([+-]?\d+(?:\.\d+)?)")
        .expect("Failed to compile unit-number pattern")
});

/// Extract the first amount/unit pair from free text ("12 km", "25°C", "mph 60")
pub fn parse_unit_from_text(text: &str) -> Result<(f64, &'static str, MeasurementCategory), ConversionError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ConversionError::InvalidInput("Empty text".to_string()));
    }

    // Comma decimal separators become dots
    let normalized_text = text.replace(',', ".");

    let number_first = RE_NUMBER_UNIT
        .captures(&normalized_text)
        .and_then(|caps| Some((caps[1].parse::<f64>().ok()?, normalize_unit(&caps[2])?)));

    let pair = number_first.or_else(|| {
        RE_UNIT_NUMBER
            .captures(&normalized_text)
            .and_then(|caps| Some((caps[2].parse::<f64>().ok()?, normalize_unit(&caps[1])?)))
    });

    let (amount, unit) = pair.ok_or_else(|| {
        debug!("[UnitConverter] Failed to parse: '{}'", text);
        ConversionError::InvalidInput(format!("Could not parse unit from text: {}", text))
    })?;

    let category = category_of(unit).ok_or_else(|| ConversionError::UnknownUnit {
        unit: unit.to_string(),
        category: "any".to_string(),
    })?;

    debug!("[UnitConverter] Extracted: {} {} from '{}'", amount, unit, text);
    Ok((amount, unit, category))
}

// ============================================================================
// Formatting
// ============================================================================

/// Format a converted value for display with the default precision
pub fn format_number(value: f64) -> String {
    format_number_with(value, DISPLAY_DECIMALS)
}

// Round to `decimals` places, strip trailing zeros, and switch to scientific
// notation for tiny or huge magnitudes so small results never print as "0".
pub fn format_number_with(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value.is_sign_positive() { "∞".to_string() } else { "-∞".to_string() };
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if magnitude < SCIENTIFIC_LOWER || magnitude >= SCIENTIFIC_UPPER {
        return format_scientific(value, decimals);
    }

    let fixed = format!("{:.*}", decimals, value);
    let trimmed = strip_trailing_zeros(&fixed);
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn format_scientific(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*e}", decimals, value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => format!("{}e{}", strip_trailing_zeros(mantissa), exponent),
        None => formatted,
    }
}

fn strip_trailing_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

// ============================================================================
// Widget
// ============================================================================

/// Converter widget bound to one measurement category
#[derive(Debug, Clone)]
pub struct UnitConverterWidget {
    key: &'static str,
    category: MeasurementCategory,
}

impl UnitConverterWidget {
    pub fn new(key: &'static str, category: MeasurementCategory) -> Self {
        Self { key, category }
    }

    pub fn category(&self) -> MeasurementCategory {
        self.category
    }
}

impl Calculator for UnitConverterWidget {
    fn id(&self) -> &str {
        self.key
    }

    fn fields(&self) -> Vec<FieldSpec> {
        let units: Vec<&str> = self
            .category
            .kind()
            .unit_names()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        let (from, to) = self.category.default_pair();

        vec![
            FieldSpec::number("value", "Value"),
            FieldSpec::choice("from", "From", &units, from),
            FieldSpec::choice("to", "To", &units, to),
        ]
    }

    fn compute(&self, input: &WidgetInput) -> AppResult<WidgetOutput> {
        let (default_from, default_to) = self.category.default_pair();
        let amount = input.number("value")?;
        let from_unit = input.text_or("from", default_from);
        let to_unit = input.text_or("to", default_to);

        let converted = convert_in(self.category, amount, from_unit, to_unit)?;

        Ok(WidgetOutput::new(format!("{} {}", format_number(converted), to_unit))
            .value("result", converted)
            .detail("from", format!("{} {}", format_number(amount), from_unit)))
    }
}
