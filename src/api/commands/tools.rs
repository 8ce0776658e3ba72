//! Catalog, preference and widget commands

use crate::core::features::{dispatch, evaluate, Calculator};
use crate::core::navigation::search;
use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{CategorySection, FieldSpec, PreferencesSnapshot, ToolDTO, WidgetInput, WidgetState};
use crate::CalculatorHub;
use log::debug;

/// Home grid sections in the user's category order
pub async fn list_tools_command(hub: &CalculatorHub) -> AppResult<Vec<CategorySection>> {
    let registry = hub.registry();
    let order = hub.preferences().category_order();
    Ok(registry
        .ordered_categories(&order)
        .into_iter()
        .map(|category| registry.section(category))
        .collect())
}

pub async fn search_tools_command(hub: &CalculatorHub, query: String) -> AppResult<Vec<ToolDTO>> {
    Ok(search(hub.registry(), hub.preferences(), &query)
        .into_iter()
        .map(ToolDTO::from)
        .collect())
}

/// Star or unstar a tool; returns the new state
pub async fn toggle_favorite_command(hub: &CalculatorHub, key: String) -> AppResult<bool> {
    let tool = hub.registry().require(&key)?;
    Ok(hub.preferences().toggle_favorite(tool.key))
}

pub async fn get_preferences_command(hub: &CalculatorHub) -> AppResult<PreferencesSnapshot> {
    Ok(hub.preferences().snapshot())
}

pub async fn clear_favorites_command(hub: &CalculatorHub) -> AppResult<()> {
    hub.preferences().clear_favorites();
    Ok(())
}

pub async fn clear_recents_command(hub: &CalculatorHub) -> AppResult<()> {
    hub.preferences().clear_recents();
    Ok(())
}

/// Persist a category order; every key must name a known category
pub async fn set_category_order_command(hub: &CalculatorHub, order: Vec<String>) -> AppResult<()> {
    if let Some(unknown) = order.iter().find(|key| hub.registry().category(key).is_none()) {
        return Err(AppError::Validation(format!("Unknown category: {}", unknown)));
    }
    hub.preferences().set_category_order(order);
    Ok(())
}

pub async fn reset_category_order_command(hub: &CalculatorHub) -> AppResult<()> {
    hub.preferences().reset_category_order();
    Ok(())
}

pub async fn get_widget_fields_command(hub: &CalculatorHub, key: String) -> AppResult<Vec<FieldSpec>> {
    let tool = hub.registry().require(&key)?;
    Ok(dispatch(tool.key).fields())
}

/// Evaluate a widget against raw field text
pub async fn run_widget_command(hub: &CalculatorHub, key: String, input: WidgetInput) -> AppResult<WidgetState> {
    let tool = hub.registry().require(&key)?;
    let widget = dispatch(tool.key);
    let state = evaluate(&widget, &input);
    debug!("[Widget] {} evaluated", tool.key);
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_toggle_favorite_validates_key() {
        let hub = CalculatorHub::in_memory();
        assert!(toggle_favorite_command(&hub, "bmi".to_string()).await.unwrap());
        assert!(matches!(
            toggle_favorite_command(&hub, "nope".to_string()).await,
            Err(AppError::ToolNotFound(_))
        ));
        let prefs = get_preferences_command(&hub).await.unwrap();
        assert_eq!(prefs.favorites, vec!["bmi"]);
    }

    #[tokio::test]
    async fn test_category_order_applies_to_listing() {
        let hub = CalculatorHub::in_memory();
        set_category_order_command(&hub, vec!["reference".to_string()]).await.unwrap();
        let sections = list_tools_command(&hub).await.unwrap();
        assert_eq!(sections[0].key, "reference");

        assert!(set_category_order_command(&hub, vec!["bogus".to_string()]).await.is_err());

        reset_category_order_command(&hub).await.unwrap();
        let sections = list_tools_command(&hub).await.unwrap();
        assert_eq!(sections[0].key, "converters");
    }

    #[tokio::test]
    async fn test_run_widget_states() {
        let hub = CalculatorHub::in_memory();

        let empty = run_widget_command(&hub, "bmi".to_string(), WidgetInput::new()).await.unwrap();
        assert_eq!(empty, WidgetState::Empty);

        let input = WidgetInput::from_pairs([("weight", "abc"), ("height", "180")]);
        let invalid = run_widget_command(&hub, "bmi".to_string(), input).await.unwrap();
        assert!(matches!(invalid, WidgetState::Invalid { .. }));

        let input = WidgetInput::from_pairs([("weight", "70"), ("height", "175")]);
        let ready = run_widget_command(&hub, "bmi".to_string(), input).await.unwrap();
        assert!(matches!(ready, WidgetState::Ready(_)));
    }

    #[tokio::test]
    async fn test_unknown_widget_key() {
        let hub = CalculatorHub::in_memory();
        assert!(run_widget_command(&hub, "missing".to_string(), WidgetInput::new()).await.is_err());
        assert!(get_widget_fields_command(&hub, "missing".to_string()).await.is_err());
    }

    #[tokio::test]
    async fn test_clear_commands() {
        let hub = CalculatorHub::in_memory();
        hub.preferences().add_recent("bmi");
        toggle_favorite_command(&hub, "loan".to_string()).await.unwrap();
        clear_recents_command(&hub).await.unwrap();
        clear_favorites_command(&hub).await.unwrap();
        let prefs = get_preferences_command(&hub).await.unwrap();
        assert!(prefs.favorites.is_empty());
        assert!(prefs.recents.is_empty());
    }

    #[tokio::test]
    async fn test_search_tools() {
        let hub = CalculatorHub::in_memory();
        let results = search_tools_command(&hub, "loan".to_string()).await.unwrap();
        assert_eq!(results[0].key, "loan");
    }
}
