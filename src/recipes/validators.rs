use super::models::{CookingTimeInput, IngredientsInput, RecipeDraft, RecipeRequest};
use crate::common::{ApiError, ValidationResult, Validator};

pub const DEFAULT_CUISINE: &str = "Not specified";

const REQUIRED_FIELDS: [&str; 5] = [
    "name",
    "ingredients",
    "instructions",
    "imageUrl",
    "cookingTime",
];

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Required fields that are absent or blank, in declaration order
pub fn missing_fields(request: &RecipeRequest) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .into_iter()
        .filter(|field| match *field {
            "name" => is_blank(&request.name),
            "ingredients" => match &request.ingredients {
                None => true,
                Some(IngredientsInput::List(items)) => items.is_empty(),
                Some(IngredientsInput::Text(text)) => text.trim().is_empty(),
            },
            "instructions" => is_blank(&request.instructions),
            "imageUrl" => is_blank(&request.image_url),
            "cookingTime" => match &request.cooking_time {
                None => true,
                Some(CookingTimeInput::Text(text)) => text.trim().is_empty(),
                Some(CookingTimeInput::Minutes(_) | CookingTimeInput::Fractional(_)) => false,
            },
            _ => false,
        })
        .collect()
}

fn parse_cooking_time(input: &CookingTimeInput) -> Option<i64> {
    match input {
        CookingTimeInput::Minutes(minutes) => Some(*minutes),
        // -0.5 must still read as negative
        CookingTimeInput::Fractional(minutes) if *minutes < 0.0 => Some(minutes.floor() as i64),
        CookingTimeInput::Fractional(minutes) => Some(minutes.trunc() as i64),
        CookingTimeInput::Text(text) => text.trim().parse::<i64>().ok(),
    }
}

fn split_ingredients(input: &IngredientsInput) -> Vec<String> {
    let items: Vec<String> = match input {
        IngredientsInput::List(items) => items.iter().map(|i| i.trim().to_string()).collect(),
        IngredientsInput::Text(text) => text.split(',').map(|i| i.trim().to_string()).collect(),
    };
    items.into_iter().filter(|i| !i.is_empty()).collect()
}

pub struct RecipeValidator;

impl Validator<RecipeRequest> for RecipeValidator {
    fn validate(&self, data: &RecipeRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let Some(name) = &data.name {
            if name.trim().chars().count() > 200 {
                result.add_error("name", "Recipe name must not exceed 200 characters");
            }
        }

        if let Some(ingredients) = &data.ingredients {
            if split_ingredients(ingredients).is_empty() {
                result.add_error("ingredients", "At least one ingredient is required");
            }
        }

        if let Some(cooking_time) = &data.cooking_time {
            match parse_cooking_time(cooking_time) {
                None => result.add_error("cookingTime", "Cooking time must be a whole number of minutes"),
                Some(minutes) if minutes < 0 => {
                    result.add_error("cookingTime", "Cooking time must not be negative")
                }
                Some(_) => {}
            }
        }

        if let Some(url) = &data.image_url {
            let url = url.trim();
            if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
                result.add_error(
                    "imageUrl",
                    "Image URL must start with http:// or https://",
                );
            }
        }

        result
    }
}

/// Checks a request and turns it into a draft
///
/// Missing required fields are reported together first; value errors
/// (negative cooking time, bad URL) after that.
pub fn into_draft(request: RecipeRequest) -> Result<RecipeDraft, ApiError> {
    let missing = missing_fields(&request);
    if !missing.is_empty() {
        return Err(ApiError::ValidationError(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    RecipeValidator.validate(&request).into_result()?;

    let (Some(name), Some(ingredients), Some(instructions), Some(image_url), Some(cooking_time)) = (
        request.name,
        request.ingredients,
        request.instructions,
        request.image_url,
        request.cooking_time,
    ) else {
        return Err(ApiError::ValidationError("Missing required fields".to_string()));
    };

    let cuisine = request
        .cuisine
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CUISINE.to_string());

    Ok(RecipeDraft {
        name: name.trim().to_string(),
        cuisine,
        ingredients: split_ingredients(&ingredients),
        instructions,
        image_url: image_url.trim().to_string(),
        cooking_time: parse_cooking_time(&cooking_time).unwrap_or(0),
    })
}
