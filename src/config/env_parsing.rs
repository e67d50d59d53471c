use crate::error::ConfigurationError;

/// Parses the literal `True` / `False` spelling used by the deployment environment.
///
/// Anything else, including lowercase spellings and numbers, is rejected instead of
/// being defaulted.
pub fn parse_bool_literal(name: &'static str, value: &str) -> Result<bool, ConfigurationError> {
    match value.trim_end() {
        "True" => Ok(true),
        "False" => Ok(false),
        _ => Err(ConfigurationError::InvalidBool {
            name,
            value: value.to_string(),
        }),
    }
}

/// Parses a probability-like value and checks it lies in `[0, 1]`.
pub fn parse_unit_interval(name: &'static str, value: &str) -> Result<f32, ConfigurationError> {
    let parsed: f32 = value
        .trim()
        .parse()
        .map_err(|_| ConfigurationError::InvalidFloat {
            name,
            value: value.to_string(),
        })?;
    if !parsed.is_finite() || !(0.0..=1.0).contains(&parsed) {
        return Err(ConfigurationError::OutOfRange {
            name,
            value: parsed,
            min: 0.0,
            max: 1.0,
        });
    }
    Ok(parsed)
}

/// Parses a strictly positive count.
pub fn parse_positive_count(name: &'static str, value: &str) -> Result<usize, ConfigurationError> {
    let parsed: usize = value
        .trim()
        .parse()
        .map_err(|_| ConfigurationError::InvalidInteger {
            name,
            value: value.to_string(),
        })?;
    if parsed == 0 {
        return Err(ConfigurationError::Zero { name });
    }
    Ok(parsed)
}
