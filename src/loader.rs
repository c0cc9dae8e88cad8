//! Letter-by-letter population of the "browse all" view.
//!
//! [`ProgressiveLoadState`] is a plain value advanced by [`ProgressiveLoadState::reduce`];
//! [`ProgressiveLoader`] drives it against a [`RecipeStore`], one letter in
//! flight at a time, so partial results are usable after every step.

use std::collections::{BTreeSet, HashSet};

use crate::recipe::Recipe;
use crate::store::{ALPHABET, RecipeStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle { next: usize },
    Fetching { index: usize },
    Done,
}

impl Default for LoadPhase {
    fn default() -> Self {
        Self::Idle { next: 0 }
    }
}

#[derive(Debug, Clone)]
pub enum LoadEvent {
    /// Request to advance. Ignored while a search term is active.
    Tick { searching: bool },
    LetterLoaded { index: usize, recipes: Vec<Recipe> },
    LetterFailed { index: usize },
}

/// Side effect requested by the reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadCommand {
    Fetch { index: usize, letter: char },
}

#[derive(Debug, Clone, Default)]
pub struct ProgressiveLoadState {
    phase: LoadPhase,
    completed: BTreeSet<char>,
    recipes: Vec<Recipe>,
    seen: HashSet<String>,
}

impl ProgressiveLoadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn next_letter_index(&self) -> usize {
        match self.phase {
            LoadPhase::Idle { next } => next,
            LoadPhase::Fetching { index } => index,
            LoadPhase::Done => ALPHABET.len(),
        }
    }

    pub fn in_flight(&self) -> bool {
        matches!(self.phase, LoadPhase::Fetching { .. })
    }

    /// True until every letter has been attempted.
    pub fn is_loading(&self) -> bool {
        self.next_letter_index() < ALPHABET.len()
    }

    pub fn completed_letters(&self) -> &BTreeSet<char> {
        &self.completed
    }

    /// Accumulated recipes, unique by id, in first-seen order.
    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn progress(&self) -> f64 {
        self.completed.len() as f64 / ALPHABET.len() as f64 * 100.0
    }

    pub fn reduce(&mut self, event: LoadEvent) -> Option<LoadCommand> {
        match event {
            LoadEvent::Tick { searching: true } => None,
            LoadEvent::Tick { searching: false } => match self.phase {
                LoadPhase::Idle { next } if next < ALPHABET.len() => {
                    self.phase = LoadPhase::Fetching { index: next };
                    Some(LoadCommand::Fetch {
                        index: next,
                        letter: ALPHABET[next],
                    })
                }
                LoadPhase::Idle { .. } => {
                    self.phase = LoadPhase::Done;
                    None
                }
                LoadPhase::Fetching { .. } | LoadPhase::Done => None,
            },
            LoadEvent::LetterLoaded { index, recipes } => {
                if self.finish(index) {
                    self.merge(recipes);
                }
                None
            }
            LoadEvent::LetterFailed { index } => {
                self.finish(index);
                None
            }
        }
    }

    fn finish(&mut self, index: usize) -> bool {
        if self.phase != (LoadPhase::Fetching { index }) {
            tracing::debug!(index, phase = ?self.phase, "ignoring stale letter result");
            return false;
        }
        self.completed.insert(ALPHABET[index]);
        self.phase = LoadPhase::Idle { next: index + 1 };
        true
    }

    fn merge(&mut self, recipes: Vec<Recipe>) {
        for recipe in recipes {
            if self.seen.insert(recipe.id.clone()) {
                self.recipes.push(recipe);
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct ProgressiveLoader {
    state: ProgressiveLoadState,
}

impl ProgressiveLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ProgressiveLoadState {
        &self.state
    }

    /// One tick: fetches at most one letter and folds the outcome into the state.
    pub async fn step(&mut self, store: &RecipeStore, searching: bool) -> LoadPhase {
        let Some(LoadCommand::Fetch { index, letter }) =
            self.state.reduce(LoadEvent::Tick { searching })
        else {
            return self.state.phase();
        };

        let event = match store.try_get_by_starting_letter(letter).await {
            Ok(recipes) => LoadEvent::LetterLoaded { index, recipes },
            Err(err) => {
                tracing::warn!(%letter, kind = err.kind(), %err, "letter failed; continuing");
                LoadEvent::LetterFailed { index }
            }
        };
        self.state.reduce(event);
        tracing::debug!(
            %letter,
            progress = self.state.progress(),
            recipes = self.state.recipes().len(),
            "letter completed"
        );

        self.state.phase()
    }

    /// Steps until done, or until `max_letters` letters have been attempted
    /// by this call. `on_step` sees the state after every completed letter.
    pub async fn run<F>(&mut self, store: &RecipeStore, max_letters: Option<usize>, mut on_step: F)
    where
        F: FnMut(&ProgressiveLoadState),
    {
        let mut attempted = 0usize;
        loop {
            if max_letters.is_some_and(|max| attempted >= max) {
                return;
            }
            if self.step(store, false).await == LoadPhase::Done {
                return;
            }
            attempted += 1;
            on_step(&self.state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{FakeRecipeApi, recipe};

    fn tick(state: &mut ProgressiveLoadState) -> Option<LoadCommand> {
        state.reduce(LoadEvent::Tick { searching: false })
    }

    #[test]
    fn tick_starts_fetch_and_blocks_second_fetch() {
        let mut state = ProgressiveLoadState::new();
        assert_eq!(
            tick(&mut state),
            Some(LoadCommand::Fetch {
                index: 0,
                letter: 'a'
            })
        );
        assert!(state.in_flight());
        assert_eq!(tick(&mut state), None);
        assert_eq!(state.phase(), LoadPhase::Fetching { index: 0 });
    }

    #[test]
    fn failure_advances_like_success() {
        let mut state = ProgressiveLoadState::new();
        tick(&mut state);
        state.reduce(LoadEvent::LetterFailed { index: 0 });
        assert_eq!(state.phase(), LoadPhase::Idle { next: 1 });
        assert!(state.completed_letters().contains(&'a'));
        assert!((state.progress() - 100.0 / 26.0).abs() < 1e-9);
    }

    #[test]
    fn stale_results_are_ignored() {
        let mut state = ProgressiveLoadState::new();
        tick(&mut state);
        state.reduce(LoadEvent::LetterLoaded {
            index: 0,
            recipes: vec![recipe("1", "Apple Pie", "Dessert")],
        });
        state.reduce(LoadEvent::LetterLoaded {
            index: 0,
            recipes: vec![recipe("2", "Apricot Tart", "Dessert")],
        });
        assert_eq!(state.recipes().len(), 1);
        assert_eq!(state.completed_letters().len(), 1);
        assert_eq!(state.phase(), LoadPhase::Idle { next: 1 });
    }

    #[test]
    fn duplicate_ids_across_letters_are_merged() {
        let mut state = ProgressiveLoadState::new();
        tick(&mut state);
        state.reduce(LoadEvent::LetterLoaded {
            index: 0,
            recipes: vec![recipe("1", "Apple Pie", "Dessert"), recipe("2", "Bread", "Side")],
        });
        tick(&mut state);
        state.reduce(LoadEvent::LetterLoaded {
            index: 1,
            recipes: vec![recipe("2", "Bread", "Side"), recipe("3", "Beans", "Side")],
        });
        let ids: Vec<_> = state.recipes().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn searching_suspends_without_reset() {
        let mut state = ProgressiveLoadState::new();
        tick(&mut state);
        state.reduce(LoadEvent::LetterFailed { index: 0 });

        assert_eq!(state.reduce(LoadEvent::Tick { searching: true }), None);
        assert_eq!(state.phase(), LoadPhase::Idle { next: 1 });

        assert_eq!(
            tick(&mut state),
            Some(LoadCommand::Fetch {
                index: 1,
                letter: 'b'
            })
        );
    }

    #[test]
    fn final_tick_transitions_to_done() {
        let mut state = ProgressiveLoadState::new();
        for index in 0..ALPHABET.len() {
            tick(&mut state);
            state.reduce(LoadEvent::LetterFailed { index });
        }
        assert_eq!(state.phase(), LoadPhase::Idle { next: 26 });
        assert!(!state.is_loading());
        assert_eq!(tick(&mut state), None);
        assert_eq!(state.phase(), LoadPhase::Done);
        assert_eq!(tick(&mut state), None);
        assert_eq!(state.completed_letters().len(), 26);
    }

    #[tokio::test]
    async fn run_completes_all_letters_despite_failures() {
        let api = FakeRecipeApi::default()
            .with_letter('a', vec![recipe("1", "Apple Pie", "Dessert")])
            .with_letter('k', vec![recipe("11", "Kedgeree", "Breakfast")])
            .failing_letter('c')
            .failing_letter('x');
        let store = RecipeStore::new(Arc::new(api));

        let mut loader = ProgressiveLoader::new();
        let mut progress = Vec::new();
        loader
            .run(&store, None, |state| progress.push(state.progress()))
            .await;

        let state = loader.state();
        assert_eq!(state.phase(), LoadPhase::Done);
        assert_eq!(state.completed_letters().len(), 26);
        assert_eq!(state.progress(), 100.0);
        assert_eq!(state.recipes().len(), 2);
        assert_eq!(progress.len(), 26);
        assert!(progress.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn run_can_stop_early_and_resume() {
        let api = FakeRecipeApi::default()
            .with_letter('a', vec![recipe("1", "Apple Pie", "Dessert")])
            .with_letter('d', vec![recipe("4", "Dal", "Vegetarian")]);
        let store = RecipeStore::new(Arc::new(api));

        let mut loader = ProgressiveLoader::new();
        loader.run(&store, Some(3), |_| {}).await;
        assert_eq!(loader.state().phase(), LoadPhase::Idle { next: 3 });
        assert!(loader.state().is_loading());
        assert_eq!(loader.state().recipes().len(), 1);

        assert_eq!(loader.step(&store, true).await, LoadPhase::Idle { next: 3 });

        loader.run(&store, Some(1), |_| {}).await;
        assert_eq!(loader.state().phase(), LoadPhase::Idle { next: 4 });
        assert_eq!(loader.state().recipes().len(), 2);
    }
}
