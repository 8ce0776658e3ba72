//! Route parsing and view resolution for the widget layer
//!
//! The shell hands us a path; we answer with a fully resolved `View`.
//! Opening a calculator is the only navigation with a side effect: the
//! tool is recorded into recents once per tool change.

use crate::core::features::{dispatch, Calculator};
use crate::core::preferences::PreferenceStore;
use crate::core::registry::{Tool, ToolRegistry};
use crate::shared::types::{CategorySection, FieldSpec, ToolDTO};
use log::{debug, warn};
use serde::Serialize;
use std::sync::Arc;
use ts_rs::TS;

pub const HOME_ROUTE: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Favorites,
    Recent,
    Search { query: String },
    Calculator { id: String },
    Unknown { path: String },
}

fn decode(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            warn!("[Navigation] Undecodable route segment '{}': {}", raw, e);
            raw.to_string()
        }
    }
}

fn query_param(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (key == name).then(|| decode(&value.replace('+', " ")))
    })
}

impl Route {
    pub fn parse(path: &str) -> Route {
        let (path_part, query) = path.split_once('?').unwrap_or((path, ""));
        let trimmed = path_part.trim_end_matches('/');

        match trimmed {
            "" => Route::Home,
            "/favorites" => Route::Favorites,
            "/recent" => Route::Recent,
            "/search" => Route::Search {
                query: query_param(query, "q").unwrap_or_default(),
            },
            _ => match trimmed.strip_prefix("/calculator/") {
                Some(id) if !id.is_empty() && !id.contains('/') => Route::Calculator { id: decode(id) },
                _ => Route::Unknown { path: path.to_string() },
            },
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => HOME_ROUTE.to_string(),
            Route::Favorites => "/favorites".to_string(),
            Route::Recent => "/recent".to_string(),
            Route::Search { query } => format!("/search?q={}", urlencoding::encode(query)),
            Route::Calculator { id } => format!("/calculator/{}", urlencoding::encode(id)),
            Route::Unknown { path } => path.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(tag = "view", content = "data", rename_all = "kebab-case")]
#[ts(export)]
pub enum View {
    Home { sections: Vec<CategorySection> },
    Favorites { tools: Vec<ToolDTO> },
    Recent { tools: Vec<ToolDTO> },
    Search { query: String, results: Vec<ToolDTO> },
    Calculator {
        tool: ToolDTO,
        is_favorite: bool,
        implemented: bool,
        fields: Vec<FieldSpec>,
    },
    NotFound { requested: String, back: String },
}

/// Match quality of `query` against a tool, 0 when it does not match
fn match_tier(tool: &Tool, query: &str) -> u32 {
    let label = tool.label.to_lowercase();
    let key = tool.key;

    if label == query || key == query {
        4
    } else if label.starts_with(query) || key.starts_with(query) {
        3
    } else if label
        .split(|c: char| c.is_whitespace() || c == '-' || c == '&')
        .chain(key.split('-'))
        .any(|word| !word.is_empty() && word.starts_with(query))
    {
        2
    } else if label.contains(query) || key.contains(query) {
        1
    } else {
        0
    }
}

/// Case-insensitive search over label and key
///
/// Exact beats prefix beats word-prefix beats substring. A favorite wins
/// within its tier; otherwise catalog order is kept.
pub fn search<'a>(registry: &'a ToolRegistry, preferences: &PreferenceStore, query: &str) -> Vec<&'a Tool> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(&Tool, f64)> = registry
        .tools()
        .filter_map(|tool| {
            let tier = match_tier(tool, &query);
            if tier == 0 {
                return None;
            }
            let mut score = tier as f64 * 10.0;
            if preferences.is_favorite(tool.key) {
                score += 5.0;
            }
            Some((tool, score))
        })
        .collect();

    // Stable sort keeps catalog order on ties
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().map(|(tool, _)| tool).collect()
}

pub struct Navigator {
    registry: &'static ToolRegistry,
    preferences: Arc<PreferenceStore>,
    current_tool: Option<String>,
}

impl Navigator {
    pub fn new(registry: &'static ToolRegistry, preferences: Arc<PreferenceStore>) -> Self {
        Self { registry, preferences, current_tool: None }
    }

    /// Tool currently on screen, if any
    pub fn current_tool(&self) -> Option<&str> {
        self.current_tool.as_deref()
    }

    pub fn navigate(&mut self, path: &str) -> View {
        let route = Route::parse(path);
        debug!("[Navigation] {} -> {:?}", path, route);

        if !matches!(route, Route::Calculator { .. }) {
            self.current_tool = None;
        }

        match route {
            Route::Home => self.home(),
            Route::Favorites => View::Favorites {
                tools: self.resolve(&self.preferences.favorites()),
            },
            Route::Recent => View::Recent {
                tools: self.resolve(&self.preferences.recents()),
            },
            Route::Search { query } => {
                let results = search(self.registry, &self.preferences, &query)
                    .into_iter()
                    .map(ToolDTO::from)
                    .collect();
                View::Search { query, results }
            }
            Route::Calculator { id } => self.open_calculator(&id),
            Route::Unknown { path } => Self::not_found(path),
        }
    }

    fn home(&self) -> View {
        let order = self.preferences.category_order();
        let sections = self
            .registry
            .ordered_categories(&order)
            .into_iter()
            .map(|category| self.registry.section(category))
            .collect();
        View::Home { sections }
    }

    /// Stored keys to tools, skipping keys no longer in the catalog
    fn resolve(&self, keys: &[String]) -> Vec<ToolDTO> {
        keys.iter()
            .filter_map(|key| {
                let tool = self.registry.lookup(key);
                if tool.is_none() {
                    debug!("[Navigation] Skipping stale tool key '{}'", key);
                }
                tool
            })
            .map(ToolDTO::from)
            .collect()
    }

    fn open_calculator(&mut self, id: &str) -> View {
        let tool = match self.registry.lookup(id) {
            Some(tool) => tool,
            None => {
                self.current_tool = None;
                return Self::not_found(Route::Calculator { id: id.to_string() }.path());
            }
        };

        if self.current_tool.as_deref() != Some(tool.key) {
            self.preferences.add_recent(tool.key);
            self.current_tool = Some(tool.key.to_string());
        }

        let widget = dispatch(tool.key);
        View::Calculator {
            tool: ToolDTO::from(tool),
            is_favorite: self.preferences.is_favorite(tool.key),
            implemented: widget.is_implemented(),
            fields: widget.fields(),
        }
    }

    fn not_found(requested: String) -> View {
        View::NotFound { requested, back: HOME_ROUTE.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn navigator() -> Navigator {
        Navigator::new(ToolRegistry::builtin(), Arc::new(PreferenceStore::in_memory()))
    }

    #[test]
    fn test_parse_routes() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("/favorites"), Route::Favorites);
        assert_eq!(Route::parse("/recent/"), Route::Recent);
        assert_eq!(
            Route::parse("/search?q=compound+interest"),
            Route::Search { query: "compound interest".to_string() }
        );
        assert_eq!(
            Route::parse("/calculator/date%2Ddiff"),
            Route::Calculator { id: "date-diff".to_string() }
        );
        assert!(matches!(Route::parse("/settings"), Route::Unknown { .. }));
        assert!(matches!(Route::parse("/calculator/"), Route::Unknown { .. }));
    }

    #[test]
    fn test_route_path_round_trip() {
        let route = Route::Search { query: "a&b c".to_string() };
        assert_eq!(Route::parse(&route.path()), route);
    }

    #[test]
    fn test_open_calculator_records_recent_once() {
        let mut nav = navigator();
        nav.navigate("/calculator/bmi");
        nav.navigate("/calculator/bmi");
        nav.navigate("/calculator/loan");
        nav.navigate("/calculator/bmi");
        assert_eq!(nav.preferences.recents(), vec!["bmi", "loan"]);
        assert_eq!(nav.current_tool(), Some("bmi"));
    }

    #[test]
    fn test_unknown_calculator_is_not_found() {
        let mut nav = navigator();
        match nav.navigate("/calculator/nonexistent-tool-key") {
            View::NotFound { back, .. } => assert_eq!(back, "/"),
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert!(nav.preferences.recents().is_empty());
    }

    #[test]
    fn test_calculator_view() {
        let mut nav = navigator();
        nav.preferences.toggle_favorite("bmi");
        match nav.navigate("/calculator/bmi") {
            View::Calculator { tool, is_favorite, implemented, fields } => {
                assert_eq!(tool.key, "bmi");
                assert!(is_favorite);
                assert!(implemented);
                assert!(!fields.is_empty());
            }
            other => panic!("expected Calculator, got {:?}", other),
        }

        match nav.navigate("/calculator/periodic-table") {
            View::Calculator { implemented, .. } => assert!(!implemented),
            other => panic!("expected Calculator, got {:?}", other),
        }
    }

    #[test]
    fn test_favorites_skip_stale_keys() {
        let mut nav = navigator();
        nav.preferences.toggle_favorite("loan");
        nav.preferences.toggle_favorite("renamed-tool");
        match nav.navigate("/favorites") {
            View::Favorites { tools } => {
                let keys: Vec<&str> = tools.iter().map(|t| t.key.as_str()).collect();
                assert_eq!(keys, vec!["loan"]);
            }
            other => panic!("expected Favorites, got {:?}", other),
        }
    }

    #[test]
    fn test_home_respects_category_order() {
        let mut nav = navigator();
        nav.preferences.set_category_order(vec!["math".to_string()]);
        match nav.navigate("/") {
            View::Home { sections } => {
                assert_eq!(sections[0].key, "math");
                assert_eq!(sections.len(), ToolRegistry::builtin().categories().len());
            }
            other => panic!("expected Home, got {:?}", other),
        }
    }

    #[test]
    fn test_search_ranking() {
        let registry = ToolRegistry::builtin();
        let prefs = PreferenceStore::in_memory();

        let keys: Vec<&str> = search(registry, &prefs, "BMI").iter().map(|t| t.key).collect();
        assert_eq!(keys[0], "bmi");

        let keys: Vec<&str> = search(registry, &prefs, "interest").iter().map(|t| t.key).collect();
        assert_eq!(keys, vec!["compound-interest"]);

        assert!(search(registry, &prefs, "   ").is_empty());
        assert!(search(registry, &prefs, "zzzz").is_empty());
    }

    #[test]
    fn test_search_favorite_boost_within_tier() {
        let registry = ToolRegistry::builtin();
        let prefs = PreferenceStore::in_memory();

        // Several tools start with "d"; catalog order puts data-storage first
        let before: Vec<&str> = search(registry, &prefs, "d").iter().map(|t| t.key).collect();
        prefs.toggle_favorite("discount");
        let after: Vec<&str> = search(registry, &prefs, "d").iter().map(|t| t.key).collect();

        assert_ne!(before[0], "discount");
        assert_eq!(after[0], "discount");
    }

    #[test]
    fn test_leaving_calculator_resets_current_tool() {
        let mut nav = navigator();
        nav.navigate("/calculator/bmi");
        nav.navigate("/");
        assert_eq!(nav.current_tool(), None);
        nav.navigate("/calculator/loan");
        nav.navigate("/calculator/bmi");
        assert_eq!(nav.preferences.recents(), vec!["bmi", "loan"]);
    }
}
