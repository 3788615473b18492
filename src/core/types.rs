// src/core/types.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sentinel facet value meaning "do not constrain this dimension".
pub const ALL: &str = "All";

/// Shown in place of any nutrient the source document did not provide.
pub const NOT_AVAILABLE: &str = "not available";

/// The whole extracted document. Read-only once loaded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub drinks: Vec<Drink>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Dataset {
    pub fn drink(&self, id: &str) -> Option<&Drink> {
        self.drinks.iter().find(|d| d.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub extracted_at: Option<String>,
    #[serde(default)]
    pub total_drinks: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drink {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sizes: Vec<Size>,
}

impl Drink {
    /// The exact (size, milk) variant, if this drink offers it.
    pub fn variant(&self, size: &str, milk_type: &str) -> Option<&MilkVariant> {
        self.sizes
            .iter()
            .find(|s| s.size == size)?
            .milk_variants
            .iter()
            .find(|v| v.milk_type == milk_type)
    }

    pub fn has_variants(&self) -> bool {
        self.sizes.iter().any(|s| !s.milk_variants.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub size: String,
    #[serde(rename = "milkVariants", default)]
    pub milk_variants: Vec<MilkVariant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilkVariant {
    #[serde(rename = "milkType")]
    pub milk_type: String,
    #[serde(default)]
    pub nutrition: Nutrition,
}

/// A single nutrient reading. The extractor writes energy values as numbers
/// and everything else as the text found in the PDF cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NutrientValue {
    Number(serde_json::Number),
    Text(String),
}

impl NutrientValue {
    fn is_blank(&self) -> bool {
        matches!(self, NutrientValue::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for NutrientValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NutrientValue::Number(n) => write!(f, "{n}"),
            NutrientValue::Text(s) => f.write_str(s.trim()),
        }
    }
}

/// Known nutrients in display order: (key, label, unit).
pub const NUTRIENTS: &[(&str, &str, &str)] = &[
    ("calories", "Calories", "kcal"),
    ("energy_kj", "Energy", "kJ"),
    ("fat", "Fat", "g"),
    ("saturated_fat", "Saturated fat", "g"),
    ("carbs", "Carbohydrates", "g"),
    ("sugar", "Sugar", "g"),
    ("protein", "Protein", "g"),
    ("salt", "Salt", "g"),
    ("fiber", "Fiber", "g"),
    ("caffeine", "Caffeine", "mg"),
];

/// Nutrient name -> value. Every field is optional; `null` and blank strings
/// count as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nutrition(BTreeMap<String, Option<NutrientValue>>);

impl Nutrition {
    pub fn get(&self, key: &str) -> Option<&NutrientValue> {
        self.0
            .get(key)
            .and_then(Option::as_ref)
            .filter(|v| !v.is_blank())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: NutrientValue) {
        self.0.insert(key.into(), Some(value));
    }

    /// Display string for one nutrient, with its unit when the value is a bare number.
    pub fn display(&self, key: &str) -> String {
        let Some(value) = self.get(key) else {
            return NOT_AVAILABLE.to_string();
        };
        let text = value.to_string();
        let unit = NUTRIENTS
            .iter()
            .find(|(k, _, _)| *k == key)
            .map(|(_, _, unit)| *unit);
        match unit {
            Some(unit) if text.parse::<f64>().is_ok() => format!("{text} {unit}"),
            _ => text,
        }
    }

    /// (label, display) rows: known nutrients first, then any extra keys in key order.
    pub fn rows(&self) -> Vec<(String, String)> {
        let mut rows: Vec<(String, String)> = NUTRIENTS
            .iter()
            .map(|(key, label, _)| (label.to_string(), self.display(key)))
            .collect();
        for key in self.0.keys() {
            if NUTRIENTS.iter().all(|(k, _, _)| k != key) {
                rows.push((key.clone(), self.display(key)));
            }
        }
        rows
    }
}

/// A starred (drink, size, milk) variant. Name and nutrition are copied when
/// the favorite is created and never re-resolved against the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    #[serde(rename = "drinkId")]
    pub drink_id: String,
    #[serde(rename = "drinkName")]
    pub drink_name: String,
    pub size: String,
    #[serde(rename = "milkType")]
    pub milk_type: String,
    #[serde(default)]
    pub nutrition: Nutrition,
}

impl FavoriteEntry {
    pub fn is(&self, drink_id: &str, size: &str, milk_type: &str) -> bool {
        self.drink_id == drink_id && self.size == size && self.milk_type == milk_type
    }
}
