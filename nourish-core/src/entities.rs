//! Domain entities synced between the client and the nutrition service.
//!
//! Wire names are camelCase (and `_id` for document ids) so that blobs
//! written by this client and documents returned by the service share one
//! JSON shape.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macronutrient grams for a meal or a daily total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Macros {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// A single meal in a plan or daily progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Ingredient lines in `"name|portion|unit"` form.
    #[serde(default)]
    pub ingredients: Vec<String>,
    pub calories: f64,
    pub macros: Macros,
    pub category: String,
    pub prep_time: u32,
    pub done: bool,
}

/// The fixed meal slots of a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealSlots {
    pub breakfast: Meal,
    pub lunch: Meal,
    pub dinner: Meal,
    #[serde(default)]
    pub snacks: Vec<Meal>,
}

/// Consumed-vs-goal pair for one macronutrient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroProgress {
    pub consumed: f64,
    pub goal: f64,
}

/// Water intake in glasses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterProgress {
    pub consumed: u32,
    pub goal: u32,
}

/// A workout entry in daily progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub name: String,
    pub category: String,
    /// Duration in minutes.
    pub duration: u32,
    pub calories_burned: f64,
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

/// One day of tracked progress against the active plan.
///
/// This is the entity behind the "today" store; it is day-scoped, so the
/// cached copy is invalidated across a local date rollover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyProgress {
    /// Local date in `YYYY-MM-DD` form.
    pub date: String,
    pub plan_id: String,
    pub user_id: String,
    pub water: WaterProgress,
    pub calories_consumed: f64,
    pub calories_goal: f64,
    pub protein: MacroProgress,
    pub carbs: MacroProgress,
    pub fat: MacroProgress,
    #[serde(default)]
    pub workouts: Vec<Workout>,
    pub meals: MealSlots,
}

/// Lifecycle of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    InProgress,
    Achieved,
}

/// A milestone inside a goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

/// One recorded progress value for a goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
    /// Local date in `YYYY-MM-DD` form.
    pub date: String,
    pub value: f64,
}

/// A user goal (weight, hydration, workout count, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub current: f64,
    pub target: f64,
    pub unit: String,
    pub icon: String,
    pub status: GoalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestones: Option<Vec<Milestone>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_history: Option<Vec<ProgressPoint>>,
}

impl Goal {
    /// A goal created on the client, before the server has assigned its
    /// document id. The temporary id is unique and sortable by creation
    /// time; the server's id replaces it on reconcile.
    pub fn new_local(
        title: impl Into<String>,
        target: f64,
        unit: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            id: format!("goal_{}", Uuid::now_v7()),
            title: title.into(),
            description: String::new(),
            current: 0.0,
            target,
            unit: unit.into(),
            icon: icon.into(),
            status: GoalStatus::InProgress,
            start_date: None,
            milestones: None,
            progress_history: None,
        }
    }
}

/// A favorited recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub calories: f64,
    pub macros: Macros,
}

/// The user's favorites: full recipe documents plus liked meal ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteSet {
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub meal_ids: Vec<String>,
}

impl FavoriteSet {
    /// Whether the given meal id is favorited.
    pub fn contains_meal(&self, meal_id: &str) -> bool {
        self.meal_ids.iter().any(|id| id == meal_id)
    }

    /// Whether the given recipe id is favorited.
    pub fn contains_recipe(&self, recipe_id: &str) -> bool {
        self.recipes.iter().any(|r| r.id == recipe_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_meal(id: &str) -> Meal {
        Meal {
            id: id.to_string(),
            name: "Oatmeal".to_string(),
            icon: None,
            ingredients: vec!["oats|80|g".to_string(), "milk|200|ml".to_string()],
            calories: 320.0,
            macros: Macros {
                protein: 12.0,
                carbs: 54.0,
                fat: 6.0,
            },
            category: "breakfast".to_string(),
            prep_time: 10,
            done: false,
        }
    }

    #[test]
    fn test_meal_wire_names() {
        let meal = sample_meal("m1");
        let json = serde_json::to_value(&meal).expect("serialize");
        assert_eq!(json["_id"], "m1");
        assert_eq!(json["prepTime"], 10);
        assert!(json.get("icon").is_none());

        let back: Meal = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, meal);
    }

    #[test]
    fn test_goal_accepts_both_id_spellings() {
        let wire = serde_json::json!({
            "_id": "g1",
            "title": "Drink more water",
            "current": 4.0,
            "target": 8.0,
            "unit": "glasses",
            "icon": "water",
            "status": "in_progress"
        });
        let goal: Goal = serde_json::from_value(wire).expect("deserialize _id");
        assert_eq!(goal.id, "g1");
        assert_eq!(goal.status, GoalStatus::InProgress);

        let local = serde_json::json!({
            "id": "g2",
            "title": "Weekly workouts",
            "current": 1.0,
            "target": 3.0,
            "unit": "sessions",
            "icon": "workout",
            "status": "achieved"
        });
        let goal: Goal = serde_json::from_value(local).expect("deserialize id alias");
        assert_eq!(goal.id, "g2");
        assert_eq!(goal.status, GoalStatus::Achieved);
    }

    #[test]
    fn test_local_goal_ids_are_unique() {
        let a = Goal::new_local("Drink more water", 8.0, "glasses", "water");
        let b = Goal::new_local("Drink more water", 8.0, "glasses", "water");
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("goal_"));
        assert_eq!(a.status, GoalStatus::InProgress);
    }

    #[test]
    fn test_favorite_set_membership() {
        let favorites = FavoriteSet {
            recipes: vec![Recipe {
                id: "r1".to_string(),
                name: "Lentil soup".to_string(),
                calories: 410.0,
                macros: Macros::default(),
            }],
            meal_ids: vec!["m1".to_string()],
        };
        assert!(favorites.contains_meal("m1"));
        assert!(!favorites.contains_meal("m2"));
        assert!(favorites.contains_recipe("r1"));
        assert!(!favorites.contains_recipe("r2"));
    }

    #[test]
    fn test_daily_progress_round_trip() {
        let progress = DailyProgress {
            date: "2024-06-01".to_string(),
            plan_id: "p1".to_string(),
            user_id: "u1".to_string(),
            water: WaterProgress { consumed: 3, goal: 8 },
            calories_consumed: 1200.0,
            calories_goal: 2100.0,
            protein: MacroProgress {
                consumed: 60.0,
                goal: 120.0,
            },
            carbs: MacroProgress {
                consumed: 140.0,
                goal: 250.0,
            },
            fat: MacroProgress {
                consumed: 30.0,
                goal: 70.0,
            },
            workouts: vec![],
            meals: MealSlots {
                breakfast: sample_meal("m1"),
                lunch: sample_meal("m2"),
                dinner: sample_meal("m3"),
                snacks: vec![],
            },
        };

        let json = serde_json::to_string(&progress).expect("serialize");
        assert!(json.contains("caloriesConsumed"));
        assert!(json.contains("planId"));
        let back: DailyProgress = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, progress);
    }
}
