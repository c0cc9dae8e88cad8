use std::fmt;

use serde::{Serialize, Serializer};

use crate::loader::ProgressiveLoadState;
use crate::recipe::Recipe;
use crate::selection::SelectionStore;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Up to this many pages are listed without ellipsis compression.
const MAX_UNCOMPRESSED_PAGES: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    Page(usize),
    Ellipsis,
}

impl fmt::Display for PageMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(page) => write!(f, "{page}"),
            Self::Ellipsis => f.write_str("..."),
        }
    }
}

impl Serialize for PageMarker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Page(page) => serializer.serialize_u64(*page as u64),
            Self::Ellipsis => serializer.serialize_str("..."),
        }
    }
}

/// Items of 1-indexed `page`, in their existing order. Out of range pages are empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_items.div_ceil(page_size)
}

/// Page links to display: everything for short lists, otherwise first and
/// last page plus a window around `current`, gaps collapsed to an ellipsis.
pub fn page_numbers(current: usize, total: usize) -> Vec<PageMarker> {
    use PageMarker::{Ellipsis, Page};

    if total <= MAX_UNCOMPRESSED_PAGES {
        return (1..=total).map(Page).collect();
    }

    let mut markers = Vec::with_capacity(MAX_UNCOMPRESSED_PAGES);
    if current <= 4 {
        markers.extend((1..=5).map(Page));
        markers.push(Ellipsis);
        markers.push(Page(total));
    } else if current >= total - 3 {
        markers.push(Page(1));
        markers.push(Ellipsis);
        markers.extend((total - 4..=total).map(Page));
    } else {
        markers.push(Page(1));
        markers.push(Ellipsis);
        markers.extend((current - 1..=current + 1).map(Page));
        markers.push(Ellipsis);
        markers.push(Page(total));
    }
    markers
}

/// Everything the list can draw from at render time.
#[derive(Debug, Clone, Copy)]
pub struct RecipeSources<'a> {
    pub search_results: &'a [Recipe],
    pub search_pending: bool,
    /// `None` when this session does not load progressively.
    pub progressive: Option<&'a ProgressiveLoadState>,
    pub initial: &'a [Recipe],
    pub initial_loading: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeCard {
    pub recipe: Recipe,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipePage {
    pub cards: Vec<RecipeCard>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_recipes: usize,
    pub page_numbers: Vec<PageMarker>,
    pub is_loading: bool,
    pub partial: bool,
    pub progress: Option<f64>,
}

/// Search term, category filter and current page of the recipe list.
#[derive(Debug, Clone)]
pub struct RecipeListView {
    search_term: String,
    category: Option<String>,
    current_page: usize,
    page_size: usize,
}

impl RecipeListView {
    pub fn new(page_size: usize) -> Self {
        Self {
            search_term: String::new(),
            category: None,
            current_page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn is_searching(&self) -> bool {
        !self.search_term.trim().is_empty()
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        let term = term.into();
        if term != self.search_term {
            self.search_term = term;
            self.current_page = 1;
        }
    }

    /// `None` or an empty name clears the filter.
    pub fn set_category(&mut self, category: Option<String>) {
        let category = category.filter(|c| !c.is_empty());
        if category != self.category {
            self.category = category;
            self.current_page = 1;
        }
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    pub fn next_page(&mut self, total_pages: usize) {
        if self.current_page < total_pages {
            self.current_page += 1;
        }
    }

    pub fn prev_page(&mut self) {
        if self.current_page > 1 {
            self.current_page -= 1;
        }
    }

    fn effective<'a>(&self, sources: &RecipeSources<'a>) -> &'a [Recipe] {
        if self.is_searching() {
            sources.search_results
        } else {
            match sources.progressive {
                Some(progressive) if !progressive.recipes().is_empty() => progressive.recipes(),
                _ => sources.initial,
            }
        }
    }

    fn is_loading(&self, sources: &RecipeSources<'_>) -> bool {
        if self.is_searching() {
            sources.search_pending
        } else {
            sources.progressive.is_some_and(ProgressiveLoadState::is_loading)
                || sources.initial_loading
        }
    }

    pub fn render(&self, sources: RecipeSources<'_>, selection: &SelectionStore) -> RecipePage {
        let all = self.effective(&sources);
        let filtered: Vec<&Recipe> = match self.category.as_deref() {
            Some(category) => all.iter().filter(|r| r.category == category).collect(),
            None => all.iter().collect(),
        };

        let total_recipes = filtered.len();
        let total_pages = total_pages(total_recipes, self.page_size);
        let current_page = self.current_page.min(total_pages.max(1));

        let cards = paginate(&filtered, current_page, self.page_size)
            .iter()
            .map(|recipe| RecipeCard {
                recipe: (*recipe).clone(),
                selected: selection.is_selected(&recipe.id),
            })
            .collect();

        let is_loading = self.is_loading(&sources);
        RecipePage {
            cards,
            current_page,
            total_pages,
            total_recipes,
            page_numbers: page_numbers(current_page, total_pages),
            is_loading,
            partial: is_loading && !all.is_empty(),
            progress: sources.progressive.map(ProgressiveLoadState::progress),
        }
    }
}
