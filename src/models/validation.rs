use serde_json::{Map, Value};

use super::{CreatePetRequest, UpdatePetRequest, ValidationError, ValidationResult};

/// Trait for validating input models
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

/// Validation constants
pub const MAX_PET_NAME_LENGTH: usize = 100;
pub const MAX_BREED_LENGTH: usize = 100;
pub const MAX_PET_AGE: u32 = 100;
pub const MAX_IMAGE_URL_LENGTH: usize = 500;

impl Validate for CreatePetRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_known_fields(&self.fields)
    }
}

impl Validate for UpdatePetRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_known_fields(&self.fields)
    }
}

/// Check the known pet fields a body carries. Absent or `null` fields pass,
/// and every other field is stored as sent.
pub fn validate_known_fields(fields: &Map<String, Value>) -> ValidationResult<()> {
    if let Some(name) = present(fields, "name") {
        validate_pet_name(expect_str("name", name)?)?;
    }
    if let Some(breed) = present(fields, "breed") {
        validate_breed(expect_str("breed", breed)?)?;
    }
    if let Some(age) = present(fields, "age") {
        validate_age_value(age)?;
    }
    if let Some(image_url) = present(fields, "imageUrl") {
        validate_image_url(expect_str("imageUrl", image_url)?)?;
    }
    Ok(())
}

fn present<'a>(fields: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    fields.get(field).filter(|value| !value.is_null())
}

fn expect_str<'a>(field: &str, value: &'a Value) -> ValidationResult<&'a str> {
    value.as_str().ok_or_else(|| ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: "Must be a string".to_string(),
    })
}

fn validate_age_value(value: &Value) -> ValidationResult<()> {
    let Some(age) = value.as_u64() else {
        return Err(ValidationError::InvalidValue {
            field: "age".to_string(),
            value: value.to_string(),
            reason: "Must be a non-negative integer".to_string(),
        });
    };

    match u32::try_from(age) {
        Ok(age) => validate_age(age),
        Err(_) => Err(ValidationError::OutOfRange {
            field: "age".to_string(),
            min: "0".to_string(),
            max: MAX_PET_AGE.to_string(),
            value: age.to_string(),
        }),
    }
}

/// Validate pet name
pub fn validate_pet_name(name: &str) -> ValidationResult<()> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "name".to_string(),
        });
    }

    let length = trimmed.chars().count();
    if length > MAX_PET_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max_length: MAX_PET_NAME_LENGTH,
            actual_length: length,
        });
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidValue {
            field: "name".to_string(),
            value: name.to_string(),
            reason: "Contains invalid control characters".to_string(),
        });
    }

    Ok(())
}

/// Validate breed
pub fn validate_breed(breed: &str) -> ValidationResult<()> {
    let length = breed.trim().chars().count();

    if length > MAX_BREED_LENGTH {
        return Err(ValidationError::TooLong {
            field: "breed".to_string(),
            max_length: MAX_BREED_LENGTH,
            actual_length: length,
        });
    }

    Ok(())
}

/// Validate age in years
pub fn validate_age(age: u32) -> ValidationResult<()> {
    if age > MAX_PET_AGE {
        return Err(ValidationError::OutOfRange {
            field: "age".to_string(),
            min: "0".to_string(),
            max: MAX_PET_AGE.to_string(),
            value: age.to_string(),
        });
    }

    Ok(())
}

/// Validate image URL or upload path
pub fn validate_image_url(image_url: &str) -> ValidationResult<()> {
    let length = image_url.trim().chars().count();

    if length > MAX_IMAGE_URL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "imageUrl".to_string(),
            max_length: MAX_IMAGE_URL_LENGTH,
            actual_length: length,
        });
    }

    Ok(())
}
