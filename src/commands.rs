use std::io::Write;
use std::sync::Arc;

use anyhow::Context as _;
use serde::Serialize;

use crate::api::HttpRecipeApi;
use crate::cli::{
    BrowseArgs, SearchArgs, SelectCommand, SelectToggleArgs, ShoppingListArgs, ShowArgs,
};
use crate::config::Config;
use crate::listing::{PageMarker, RecipeListView, RecipePage, RecipeSources};
use crate::loader::ProgressiveLoader;
use crate::recipe::Recipe;
use crate::selection::SelectionStore;
use crate::shopping::{CheckedIngredients, IngredientAggregate, ShoppingList};
use crate::storage::FsKeyValueStore;
use crate::store::RecipeStore;

/// Long-lived pieces shared by every command in one process.
pub struct Session {
    pub config: Config,
    pub store: RecipeStore,
    pub selection: SelectionStore,
}

impl Session {
    pub fn open(config: Config) -> anyhow::Result<Self> {
        let api = HttpRecipeApi::new(config.api_url.clone(), config.http_timeout)
            .context("create recipe api client")?;
        let store = RecipeStore::new(Arc::new(api));
        let storage = FsKeyValueStore::new(&config.data_dir);
        let selection = SelectionStore::open(Arc::new(storage));
        Ok(Self {
            config,
            store,
            selection,
        })
    }

    fn list_view(&self, category: Option<String>) -> RecipeListView {
        let mut view = RecipeListView::new(self.config.page_size);
        view.set_category(category);
        view
    }
}

pub async fn search(
    session: &Session,
    args: SearchArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut view = session.list_view(args.category);
    view.set_search_term(args.term);
    view.go_to_page(args.page);

    let (search_results, initial) = if view.is_searching() {
        (session.store.search_by_name(view.search_term()).await, Vec::new())
    } else {
        (Vec::new(), session.store.get_initial_recipes().await)
    };

    let page = view.render(
        RecipeSources {
            search_results: &search_results,
            search_pending: false,
            progressive: None,
            initial: &initial,
            initial_loading: false,
        },
        &session.selection,
    );
    write_page(out, &page, args.json)
}

pub async fn browse(
    session: &Session,
    args: BrowseArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut view = session.list_view(args.category);
    view.go_to_page(args.page);

    if args.batched {
        let all = session
            .store
            .load_all_batched(args.batch_size, |progress| {
                tracing::info!(progress = format!("{progress:.0}%"), "batch loaded");
            })
            .await;
        let page = view.render(
            RecipeSources {
                search_results: &[],
                search_pending: false,
                progressive: None,
                initial: &all,
                initial_loading: false,
            },
            &session.selection,
        );
        return write_page(out, &page, args.json);
    }

    let initial = session.store.get_initial_recipes().await;
    let mut loader = ProgressiveLoader::new();
    loader
        .run(&session.store, Some(args.max_letters), |state| {
            tracing::info!(
                progress = format!("{:.0}%", state.progress()),
                recipes = state.recipes().len(),
                "letter loaded"
            );
        })
        .await;

    let page = view.render(
        RecipeSources {
            search_results: &[],
            search_pending: false,
            progressive: Some(loader.state()),
            initial: &initial,
            initial_loading: false,
        },
        &session.selection,
    );
    write_page(out, &page, args.json)
}

pub async fn show(session: &Session, args: ShowArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let recipe = session
        .store
        .get_by_id(&args.id)
        .await
        .ok_or_else(|| anyhow::anyhow!("recipe not found: {}", args.id))?;
    write_recipe(out, &recipe, session.selection.is_selected(&recipe.id))
}

pub async fn categories(session: &Session, out: &mut impl Write) -> anyhow::Result<()> {
    let categories = session.store.get_categories().await;
    if categories.is_empty() {
        tracing::warn!("no categories available");
    }
    for category in categories {
        writeln!(out, "{category}")?;
    }
    Ok(())
}

pub async fn select(
    session: &mut Session,
    command: SelectCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        SelectCommand::Toggle(SelectToggleArgs { id }) => {
            // Unselecting works from the stored copy, without the API.
            let recipe = match session.selection.get(&id).cloned() {
                Some(recipe) => recipe,
                None => session
                    .store
                    .get_by_id(&id)
                    .await
                    .ok_or_else(|| anyhow::anyhow!("recipe not found: {id}"))?,
            };
            let selected = session.selection.toggle(&recipe)?;
            let verb = if selected { "selected" } else { "unselected" };
            writeln!(
                out,
                "{verb} {} ({} selected)",
                recipe.name,
                session.selection.len()
            )?;
        }
        SelectCommand::Clear => {
            session.selection.clear()?;
            writeln!(out, "cleared selection")?;
        }
        SelectCommand::List => {
            if session.selection.is_empty() {
                writeln!(out, "No recipes selected.")?;
            }
            for recipe in session.selection.recipes() {
                writeln!(out, "{}\t{}", recipe.id, recipe.name)?;
            }
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ShoppingListItem<'a> {
    #[serde(flatten)]
    ingredient: &'a IngredientAggregate,
    checked: bool,
}

#[derive(Debug, Serialize)]
struct ShoppingListOutput<'a> {
    recipe_count: usize,
    ingredient_instances: usize,
    unique_ingredients: usize,
    items: Vec<ShoppingListItem<'a>>,
}

pub fn shopping_list(
    session: &Session,
    args: ShoppingListArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let list = ShoppingList::from_recipes(session.selection.recipes());
    let mut checked = CheckedIngredients::new();
    for name in &args.checked {
        if !checked.is_checked(name) {
            checked.toggle(name);
        }
    }
    write_shopping_list(out, &list, &checked, args.json)
}

fn write_page(out: &mut impl Write, page: &RecipePage, json: bool) -> anyhow::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, page).context("serialize page")?;
        writeln!(out)?;
        return Ok(());
    }

    if page.cards.is_empty() {
        if !page.is_loading {
            writeln!(out, "No recipes found. Try adjusting your search or filters.")?;
        }
        return Ok(());
    }

    match page.progress.filter(|_| page.partial) {
        Some(progress) => writeln!(
            out,
            "Showing partial results while loading more recipes... ({progress:.0}% loaded)"
        )?,
        None => writeln!(
            out,
            "Showing {} of {} recipes",
            page.cards.len(),
            page.total_recipes
        )?,
    }

    for card in &page.cards {
        let mark = if card.selected { "[x]" } else { "[ ]" };
        let recipe = &card.recipe;
        write!(out, "{mark} {}\t{}", recipe.id, recipe.name)?;
        match (recipe.category.as_str(), recipe.area.as_str()) {
            ("", "") => writeln!(out)?,
            (category, "") => writeln!(out, " ({category})")?,
            ("", area) => writeln!(out, " ({area})")?,
            (category, area) => writeln!(out, " ({category}, {area})")?,
        }
    }

    if page.total_pages > 1 {
        let numbers: Vec<String> = page
            .page_numbers
            .iter()
            .map(|marker| match marker {
                PageMarker::Page(n) if *n == page.current_page => format!("[{n}]"),
                other => other.to_string(),
            })
            .collect();
        writeln!(out, "Pages: {}", numbers.join(" "))?;
    }
    Ok(())
}

fn write_recipe(out: &mut impl Write, recipe: &Recipe, selected: bool) -> anyhow::Result<()> {
    writeln!(out, "{}", recipe.name)?;
    writeln!(out, "id: {}", recipe.id)?;
    if !recipe.category.is_empty() {
        writeln!(out, "category: {}", recipe.category)?;
    }
    if !recipe.area.is_empty() {
        writeln!(out, "area: {}", recipe.area)?;
    }
    let tags = recipe.tags();
    if !tags.is_empty() {
        writeln!(out, "tags: {}", tags.join(", "))?;
    }
    writeln!(out, "selected: {}", if selected { "yes" } else { "no" })?;

    writeln!(out)?;
    writeln!(out, "Ingredients:")?;
    for (ingredient, measure) in recipe.ingredients() {
        if measure.is_empty() {
            writeln!(out, "- {ingredient}")?;
        } else {
            writeln!(out, "- {ingredient}: {measure}")?;
        }
    }

    if !recipe.instructions.trim().is_empty() {
        writeln!(out)?;
        writeln!(out, "Instructions:")?;
        writeln!(out, "{}", recipe.instructions.trim())?;
    }

    if let Some(url) = recipe.youtube_url() {
        writeln!(out)?;
        writeln!(out, "video: {url}")?;
    }
    if let Some(url) = recipe.source_url() {
        writeln!(out, "source: {url}")?;
    }
    Ok(())
}

fn write_shopping_list(
    out: &mut impl Write,
    list: &ShoppingList,
    checked: &CheckedIngredients,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        let output = ShoppingListOutput {
            recipe_count: list.recipe_count,
            ingredient_instances: list.ingredient_instances,
            unique_ingredients: list.unique_ingredients,
            items: list
                .ingredients
                .iter()
                .map(|ingredient| ShoppingListItem {
                    ingredient,
                    checked: checked.is_checked(&ingredient.name),
                })
                .collect(),
        };
        serde_json::to_writer_pretty(&mut *out, &output).context("serialize shopping list")?;
        writeln!(out)?;
        return Ok(());
    }

    if list.recipe_count == 0 {
        writeln!(out, "No recipes selected.")?;
        return Ok(());
    }

    writeln!(
        out,
        "{} recipes, {} ingredients ({} unique)",
        list.recipe_count, list.ingredient_instances, list.unique_ingredients
    )?;
    for ingredient in &list.ingredients {
        let mark = if checked.is_checked(&ingredient.name) {
            "[x]"
        } else {
            "[ ]"
        };
        write!(out, "{mark} {}", ingredient.name)?;
        if !ingredient.measures.is_empty() {
            write!(out, ": {}", ingredient.measures.join(", "))?;
        }
        writeln!(out, "  ({})", ingredient.recipes.join(", "))?;
    }
    Ok(())
}
