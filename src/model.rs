//! Core data types for the nutrition log
//!
//! - `FoodRecord`: a catalog search result, identified by its `FoodId`
//! - `NutritionProfile`: the four calorie/macro values for one food
//! - `LoggedEntry`: a food record enriched with its nutrition profile

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque food identifier as handed out by the catalog
///
/// Spoonacular hands out numeric ids, other catalogs use strings. The
/// original wire form is preserved so a logged entry posts back the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FoodId {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for FoodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoodId::Numeric(id) => write!(f, "{}", id),
            FoodId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for FoodId {
    fn from(id: i64) -> Self {
        FoodId::Numeric(id)
    }
}

impl From<&str> for FoodId {
    fn from(id: &str) -> Self {
        FoodId::Text(id.to_string())
    }
}

impl From<String> for FoodId {
    fn from(id: String) -> Self {
        FoodId::Text(id)
    }
}

/// A food item returned by a catalog search, before nutrition lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodRecord {
    pub id: FoodId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl FoodRecord {
    pub fn new(id: impl Into<FoodId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image: None,
        }
    }

    /// Builder method: set the image URL
    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }
}

/// Calories and macros (grams) for one food item
///
/// Fields are optional on the wire. A missing field counts as zero in every
/// aggregate; use the accessors rather than the raw fields when summing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionProfile {
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
}

impl NutritionProfile {
    /// Profile with all four values present
    pub fn new(calories: f64, protein: f64, carbs: f64, fat: f64) -> Self {
        Self {
            calories: Some(calories),
            protein: Some(protein),
            carbs: Some(carbs),
            fat: Some(fat),
        }
    }

    /// Profile carrying only a calorie value
    pub fn calories_only(calories: f64) -> Self {
        Self {
            calories: Some(calories),
            ..Default::default()
        }
    }

    pub fn calories(&self) -> f64 {
        self.calories.unwrap_or(0.0)
    }

    pub fn protein(&self) -> f64 {
        self.protein.unwrap_or(0.0)
    }

    pub fn carbs(&self) -> f64 {
        self.carbs.unwrap_or(0.0)
    }

    pub fn fat(&self) -> f64 {
        self.fat.unwrap_or(0.0)
    }

    /// True when none of the four values is present
    pub fn is_empty(&self) -> bool {
        self.calories.is_none() && self.protein.is_none() && self.carbs.is_none() && self.fat.is_none()
    }

    /// Check that every present value is a finite, non-negative number
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("calories", self.calories),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fat", self.fat),
        ];

        for (name, value) in fields {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(format!("{} must be a non-negative number, got {}", name, v));
                }
            }
        }

        Ok(())
    }
}

/// A food record enriched with its nutrition profile
///
/// Serializes as `{id, title, image?, nutrition: {...}}`, the body of
/// `POST /api/log-food`. Entries are immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedEntry {
    #[serde(flatten)]
    pub food: FoodRecord,
    #[serde(default)]
    pub nutrition: NutritionProfile,
}

impl LoggedEntry {
    pub fn new(food: FoodRecord, nutrition: NutritionProfile) -> Self {
        Self { food, nutrition }
    }

    pub fn id(&self) -> &FoodId {
        &self.food.id
    }

    pub fn title(&self) -> &str {
        &self.food.title
    }
}
