//! Field checks for stall and review input.
//!
//! Every check takes the raw text the caller typed and returns either the
//! parsed value or a [`ValidationError`]; none of them panic or touch the
//! store.

use crate::{
    error::ValidationError,
    format,
    location::{Location, StallChanges, Street},
};

pub const IGN_MAX: usize = 50;
pub const STALL_NAME_MAX: usize = 100;
pub const ITEMS_SOLD_MAX: usize = 200;
pub const REVIEW_TEXT_MAX: usize = 1000;

const NOT_POSITIVE: &str = "stall number must be a positive number";
const NOT_WHOLE: &str = "Warp Hall stall numbers must be whole numbers";

/// Mall stall numbers may be fractional, Warp Hall ones may not.
pub fn stall_number(raw: &str, location: Location) -> Result<f64, ValidationError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidNumber(NOT_POSITIVE))?;

    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::InvalidNumber(NOT_POSITIVE));
    }
    if location == Location::WarpHall && (value.fract() != 0.0 || value > f64::from(i32::MAX)) {
        return Err(ValidationError::InvalidNumber(NOT_WHOLE));
    }

    Ok(value)
}

/// [`stall_number`] narrowed to the Warp Hall key type.
pub fn warp_hall_number(raw: &str) -> Result<i32, ValidationError> {
    // whole and within i32 range after the check above
    stall_number(raw, Location::WarpHall).map(|value| value as i32)
}

pub fn street_name(raw: &str) -> Result<Street, ValidationError> {
    Street::from_name(raw.trim()).ok_or_else(|| ValidationError::InvalidEnum(raw.to_string()))
}

pub fn rating(raw: &str) -> Result<i32, ValidationError> {
    match raw.trim().parse::<i32>() {
        Ok(value) if (1..=5).contains(&value) => Ok(value),
        _ => Err(ValidationError::OutOfRange),
    }
}

/// Required free-text field: trimmed, non-empty, at most `max` characters.
pub fn text(field: &'static str, raw: &str, max: usize) -> Result<String, ValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(value.to_string())
}

/// Optional field of an edit; blank means "keep the stored value".
fn optional_text(
    field: &'static str,
    raw: Option<&String>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    match raw.map(|value| value.trim()) {
        None | Some("") => Ok(None),
        Some(value) => text(field, value, max).map(Some),
    }
}

/// Normalizes an edit: blank fields are dropped, the rest are checked.
pub fn changes(location: Location, raw: &StallChanges) -> Result<StallChanges, ValidationError> {
    let changes = StallChanges {
        ign: optional_text(format::LABEL_IGN, raw.ign.as_ref(), IGN_MAX)?,
        stall_name: optional_text(
            format::LABEL_STALL_NAME,
            raw.stall_name.as_ref(),
            STALL_NAME_MAX,
        )?,
        items_sold: optional_text(
            format::LABEL_ITEMS_SOLD,
            raw.items_sold.as_ref(),
            ITEMS_SOLD_MAX,
        )?,
    };

    if location == Location::WarpHall && changes.items_sold.is_some() {
        return Err(ValidationError::NotApplicable(format::LABEL_ITEMS_SOLD));
    }
    Ok(changes)
}
