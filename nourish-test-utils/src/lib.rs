//! Nourish Test Utilities
//!
//! Centralized test infrastructure for the Nourish workspace:
//! - In-memory preference bridge with failure injection
//! - Scripted remote sources with call recording
//! - Entity fixtures for common scenarios

// Re-export core types for convenience
pub use nourish_core::{
    CacheError, CachePolicy, DailyProgress, FavoriteSet, Goal, GoalStatus, MacroProgress,
    Macros, Meal, MealSlots, Milestone, MutationError, NourishError, NourishResult,
    RemoteError, StorageError, WaterProgress,
};

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use nourish_sync::{PreferencesBridge, RemoteSource};
use serde_json::Value;

// ============================================================================
// MOCK PREFERENCE BRIDGE
// ============================================================================

/// In-memory preference bridge with switchable write failures.
///
/// Stands in for the native preference plugin: asynchronous, durable for
/// the life of the test, and able to start failing on demand to exercise
/// the overlay's evict-on-persist-failure path.
#[derive(Default)]
pub struct MemoryBridge {
    map: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryBridge {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed the bridge with pre-existing "on disk" data.
    pub fn with_entries(entries: &[(&str, &str)]) -> Arc<Self> {
        let bridge = Self::default();
        {
            let mut map = bridge.lock();
            for (key, value) in entries {
                map.insert(key.to_string(), value.to_string());
            }
        }
        Arc::new(bridge)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.map.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent read fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Direct look at what the "disk" holds.
    pub fn stored(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PreferencesBridge for MemoryBridge {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::op("get", key, "injected read failure"));
        }
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::op("set", key, "injected write failure"));
        }
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::op("remove", key, "injected write failure"));
        }
        self.lock().remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable {
                reason: "injected write failure".to_string(),
            });
        }
        self.lock().clear();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable {
                reason: "injected read failure".to_string(),
            });
        }
        Ok(self.lock().keys().cloned().collect())
    }
}

// ============================================================================
// SCRIPTED REMOTE SOURCE
// ============================================================================

/// Remote source that replays queued responses and records every call.
///
/// When the fetch queue runs dry, the source keeps returning the last
/// scripted fetch response (a steady backend); an unscripted mutate fails.
pub struct ScriptedSource<T> {
    fetches: Mutex<VecDeque<Result<T, RemoteError>>>,
    last_fetch: Mutex<Option<Result<T, RemoteError>>>,
    mutations: Mutex<VecDeque<Result<T, RemoteError>>>,
    fetch_calls: AtomicUsize,
    mutate_calls: AtomicUsize,
    recorded_patches: Mutex<Vec<Value>>,
}

impl<T: Clone> ScriptedSource<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fetches: Mutex::new(VecDeque::new()),
            last_fetch: Mutex::new(None),
            mutations: Mutex::new(VecDeque::new()),
            fetch_calls: AtomicUsize::new(0),
            mutate_calls: AtomicUsize::new(0),
            recorded_patches: Mutex::new(Vec::new()),
        })
    }

    /// A source that always serves the same value.
    pub fn always(value: T) -> Arc<Self> {
        let source = Self::new();
        *source.last_fetch.lock().unwrap_or_else(PoisonError::into_inner) = Some(Ok(value));
        source
    }

    /// A source whose every call fails with the given user-facing message.
    pub fn failing(message: &str) -> Arc<Self> {
        let source = Self::new();
        *source.last_fetch.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Err(RemoteError::network(message)));
        source
    }

    pub fn push_fetch(&self, response: Result<T, RemoteError>) {
        self.fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    pub fn push_mutation(&self, response: Result<T, RemoteError>) {
        self.mutations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn mutate_calls(&self) -> usize {
        self.mutate_calls.load(Ordering::SeqCst)
    }

    /// Patches seen by `mutate_entity`, in call order.
    pub fn recorded_patches(&self) -> Vec<Value> {
        self.recorded_patches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> RemoteSource<T> for ScriptedSource<T> {
    async fn fetch_entity(&self, _id: &str) -> Result<T, RemoteError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(response) => {
                *self
                    .last_fetch
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(response.clone());
                response
            }
            None => self
                .last_fetch
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
                .unwrap_or_else(|| Err(RemoteError::network("no scripted response"))),
        }
    }

    async fn mutate_entity(&self, _id: &str, patch: Value) -> Result<T, RemoteError> {
        self.mutate_calls.fetch_add(1, Ordering::SeqCst);
        self.recorded_patches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(patch);
        self.mutations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::network("no scripted mutation")))
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

fn fixture_meal(id: &str, name: &str, category: &str, calories: f64) -> Meal {
    Meal {
        id: id.to_string(),
        name: name.to_string(),
        icon: None,
        ingredients: vec![],
        calories,
        macros: Macros {
            protein: calories * 0.1,
            carbs: calories * 0.12,
            fat: calories * 0.04,
        },
        category: category.to_string(),
        prep_time: 15,
        done: false,
    }
}

/// A day of progress with 1200 of 2100 kcal consumed.
pub fn sample_progress(date: &str) -> DailyProgress {
    DailyProgress {
        date: date.to_string(),
        plan_id: "plan_1".to_string(),
        user_id: "user_42".to_string(),
        water: WaterProgress { consumed: 3, goal: 8 },
        calories_consumed: 1200.0,
        calories_goal: 2100.0,
        protein: MacroProgress {
            consumed: 55.0,
            goal: 120.0,
        },
        carbs: MacroProgress {
            consumed: 150.0,
            goal: 260.0,
        },
        fat: MacroProgress {
            consumed: 35.0,
            goal: 70.0,
        },
        workouts: vec![],
        meals: MealSlots {
            breakfast: fixture_meal("meal_b", "Oatmeal", "breakfast", 320.0),
            lunch: fixture_meal("meal_l", "Chicken bowl", "lunch", 540.0),
            dinner: fixture_meal("meal_d", "Salmon & rice", "dinner", 610.0),
            snacks: vec![fixture_meal("meal_s", "Greek yogurt", "snack", 140.0)],
        },
    }
}

/// Two goals, one in progress and one achieved.
pub fn sample_goals() -> Vec<Goal> {
    vec![
        Goal {
            id: "goal_water".to_string(),
            title: "Drink more water".to_string(),
            description: "8 glasses a day".to_string(),
            current: 4.0,
            target: 8.0,
            unit: "glasses".to_string(),
            icon: "water".to_string(),
            status: GoalStatus::InProgress,
            start_date: Some("2024-05-01".to_string()),
            milestones: None,
            progress_history: None,
        },
        Goal {
            id: "goal_steps".to_string(),
            title: "Daily steps".to_string(),
            description: String::new(),
            current: 10_000.0,
            target: 10_000.0,
            unit: "steps".to_string(),
            icon: "workout".to_string(),
            status: GoalStatus::Achieved,
            start_date: Some("2024-04-01".to_string()),
            milestones: None,
            progress_history: None,
        },
    ]
}

/// A favorites set with one recipe and one liked meal.
pub fn sample_favorites() -> FavoriteSet {
    FavoriteSet {
        recipes: vec![nourish_core::Recipe {
            id: "recipe_1".to_string(),
            name: "Lentil soup".to_string(),
            calories: 410.0,
            macros: Macros {
                protein: 24.0,
                carbs: 58.0,
                fat: 9.0,
            },
        }],
        meal_ids: vec!["meal_b".to_string()],
    }
}
