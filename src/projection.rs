//! Chart Data Projection
//!
//! Pure functions mapping a log snapshot to the datasets the charts consume.
//! Everything is recomputed on every call.
//!
//! Sums run at full precision. Rounding to one decimal only happens when a
//! `RunningTotals` value is produced, never on intermediate sums.

use crate::model::LoggedEntry;
use serde::Serialize;

/// Label used when an entry has no title
pub const UNKNOWN_FOOD: &str = "Unknown Food";

const MACRO_COLORS: [&str; 3] = ["#FF6384", "#36A2EB", "#FFCE56"];
const CALORIES_COLOR: &str = "#FF6384";
const PROTEIN_COLOR: &str = "#36A2EB";
const CARBS_COLOR: &str = "#FFCE56";
const FAT_COLOR: &str = "#4BC0C0";
const CALORIE_LINE_COLOR: &str = "rgb(75, 192, 192)";

/// Session-wide protein/carbs/fat sums
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MacroTotals {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// One bar group in the per-meal chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealPoint {
    /// 1-based position in the log
    pub meal_number: usize,
    /// Entry title, or "Unknown Food"
    pub label: String,
    /// Positional label, "Meal N"
    pub meal_label: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Cumulative sums rounded to one decimal for display
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunningTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl RunningTotals {
    fn from_sums(sums: &Sums) -> Self {
        Self {
            calories: round1(sums.calories),
            protein: round1(sums.protein),
            carbs: round1(sums.carbs),
            fat: round1(sums.fat),
        }
    }
}

#[derive(Default)]
struct Sums {
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
}

impl Sums {
    fn add(&mut self, entry: &LoggedEntry) {
        self.calories += entry.nutrition.calories();
        self.protein += entry.nutrition.protein();
        self.carbs += entry.nutrition.carbs();
        self.fat += entry.nutrition.fat();
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Elementwise protein/carbs/fat sum; missing fields count as zero
pub fn macro_totals(entries: &[LoggedEntry]) -> MacroTotals {
    entries.iter().fold(MacroTotals::default(), |mut acc, entry| {
        acc.protein += entry.nutrition.protein();
        acc.carbs += entry.nutrition.carbs();
        acc.fat += entry.nutrition.fat();
        acc
    })
}

/// One point per entry, in log order
pub fn per_meal_series(entries: &[LoggedEntry]) -> Vec<MealPoint> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let title = entry.title().trim();
            MealPoint {
                meal_number: index + 1,
                label: if title.is_empty() {
                    UNKNOWN_FOOD.to_string()
                } else {
                    title.to_string()
                },
                meal_label: format!("Meal {}", index + 1),
                calories: entry.nutrition.calories(),
                protein: entry.nutrition.protein(),
                carbs: entry.nutrition.carbs(),
                fat: entry.nutrition.fat(),
            }
        })
        .collect()
}

/// Totals over the whole log, rounded for display
pub fn running_totals(entries: &[LoggedEntry]) -> RunningTotals {
    let mut sums = Sums::default();
    for entry in entries {
        sums.add(entry);
    }
    RunningTotals::from_sums(&sums)
}

/// Running totals after each entry; element `i` covers entries `0..=i`
pub fn running_series(entries: &[LoggedEntry]) -> Vec<RunningTotals> {
    let mut sums = Sums::default();
    entries
        .iter()
        .map(|entry| {
            sums.add(entry);
            RunningTotals::from_sums(&sums)
        })
        .collect()
}

/// All derived views of one snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Projection {
    pub macro_totals: MacroTotals,
    pub per_meal: Vec<MealPoint>,
    pub running_totals: RunningTotals,
    pub running_series: Vec<RunningTotals>,
}

impl Projection {
    pub fn from_entries(entries: &[LoggedEntry]) -> Self {
        Self {
            macro_totals: macro_totals(entries),
            per_meal: per_meal_series(entries),
            running_totals: running_totals(entries),
            running_series: running_series(entries),
        }
    }

    /// Render the chart datasets: macro doughnut, per-meal bars, calorie line
    pub fn chart_datasets(&self) -> ChartSet {
        let macros = ChartData {
            labels: vec![
                "Protein".to_string(),
                "Carbohydrates".to_string(),
                "Fat".to_string(),
            ],
            datasets: vec![ChartDataset {
                label: "Macronutrient Distribution".to_string(),
                data: vec![
                    self.macro_totals.protein,
                    self.macro_totals.carbs,
                    self.macro_totals.fat,
                ],
                colors: MACRO_COLORS.iter().map(|c| c.to_string()).collect(),
            }],
        };

        let series = |label: &str, color: &str, value: fn(&MealPoint) -> f64| ChartDataset {
            label: label.to_string(),
            data: self.per_meal.iter().map(value).collect(),
            colors: vec![color.to_string()],
        };

        let per_meal = ChartData {
            labels: self.per_meal.iter().map(|p| p.label.clone()).collect(),
            datasets: vec![
                series("Calories", CALORIES_COLOR, |p| p.calories),
                series("Protein (g)", PROTEIN_COLOR, |p| p.protein),
                series("Carbohydrates (g)", CARBS_COLOR, |p| p.carbs),
                series("Fat (g)", FAT_COLOR, |p| p.fat),
            ],
        };

        let calorie_line = ChartData {
            labels: self.per_meal.iter().map(|p| p.meal_label.clone()).collect(),
            datasets: vec![series("Calories per Meal", CALORIE_LINE_COLOR, |p| p.calories)],
        };

        ChartSet {
            macros,
            per_meal,
            calorie_line,
        }
    }
}

/// Labels plus datasets, the shape chart widgets take
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

/// Single dataset for a chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<f64>,
    /// One color for the whole series, or one per slice
    pub colors: Vec<String>,
}

/// Every chart the dashboard draws
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub macros: ChartData,
    pub per_meal: ChartData,
    pub calorie_line: ChartData,
}
