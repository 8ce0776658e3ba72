//! Static tool catalog
//!
//! Single source of truth for which tools exist, how they are labelled and
//! which category owns them. Built once at startup and never mutated.

use crate::core::features::has_widget;
use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{CategorySection, ToolDTO};
use log::{debug, info};
use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    pub key: &'static str,
    /// Localization key for the display name
    pub name_key: String,
    /// English fallback label
    pub label: &'static str,
    pub icon: &'static str,
    pub category: &'static str,
}

impl Tool {
    pub fn is_implemented(&self) -> bool {
        has_widget(self.key)
    }
}

impl From<&Tool> for ToolDTO {
    fn from(tool: &Tool) -> Self {
        ToolDTO {
            key: tool.key.to_string(),
            name_key: tool.name_key.clone(),
            label: tool.label.to_string(),
            icon: tool.icon.to_string(),
            category: tool.category.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub key: &'static str,
    pub name_key: String,
    pub label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
    /// Tool keys in catalog order
    pub tools: Vec<&'static str>,
}

/// Catalog source data: one category with its (key, label, icon) tools
pub struct CategoryDefinition {
    pub key: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
    pub tools: &'static [(&'static str, &'static str, &'static str)],
}

pub const BUILTIN_CATALOG: &[CategoryDefinition] = &[
    CategoryDefinition {
        key: "converters",
        label: "Converters",
        color: "#3B82F6",
        icon: "ruler",
        tools: &[
            ("length", "Length", "ruler"),
            ("weight", "Weight", "scale"),
            ("volume", "Volume", "beaker"),
            ("area", "Area", "square"),
            ("speed", "Speed", "gauge"),
            ("time-units", "Time", "hourglass"),
            ("data-storage", "Data Storage", "database"),
            ("temperature", "Temperature", "thermometer"),
        ],
    },
    CategoryDefinition {
        key: "finance",
        label: "Finance",
        color: "#10B981",
        icon: "wallet",
        tools: &[
            ("loan", "Loan", "bank"),
            ("compound-interest", "Compound Interest", "trending-up"),
            ("tip", "Tip", "receipt"),
            ("discount", "Discount", "tag"),
            ("income-tax", "Income Tax", "file-text"),
        ],
    },
    CategoryDefinition {
        key: "health",
        label: "Health",
        color: "#EF4444",
        icon: "heart",
        tools: &[
            ("bmi", "BMI", "activity"),
            ("bmr", "BMR", "flame"),
        ],
    },
    CategoryDefinition {
        key: "date-time",
        label: "Date & Time",
        color: "#F59E0B",
        icon: "calendar",
        tools: &[
            ("age", "Age", "cake"),
            ("date-diff", "Date Difference", "calendar-range"),
            ("stopwatch", "Stopwatch", "timer"),
        ],
    },
    CategoryDefinition {
        key: "math",
        label: "Math",
        color: "#8B5CF6",
        icon: "calculator",
        tools: &[
            ("calculator", "Calculator", "calculator"),
            ("percentage", "Percentage", "percent"),
        ],
    },
    CategoryDefinition {
        key: "reference",
        label: "Reference",
        color: "#6B7280",
        icon: "book",
        tools: &[
            ("periodic-table", "Periodic Table", "atom"),
            ("grammar-rules", "Grammar Rules", "type"),
            ("history-timeline", "History Timeline", "landmark"),
        ],
    },
];

static BUILTIN_REGISTRY: Lazy<ToolRegistry> = Lazy::new(|| {
    ToolRegistry::from_definitions(BUILTIN_CATALOG).expect("Built-in tool catalog is invalid")
});

/// Indexed catalog with O(1) key lookup
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
    index: HashMap<&'static str, usize>,
    categories: Vec<Category>,
    category_index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    /// The compiled-in catalog
    pub fn builtin() -> &'static ToolRegistry {
        &BUILTIN_REGISTRY
    }

    /// Build and validate a catalog; keys must be unique and each tool listed once
    pub fn from_definitions(definitions: &[CategoryDefinition]) -> AppResult<Self> {
        let mut tools: Vec<Tool> = Vec::new();
        let mut index: HashMap<&'static str, usize> = HashMap::new();
        let mut categories: Vec<Category> = Vec::new();
        let mut category_index: HashMap<&'static str, usize> = HashMap::new();

        for def in definitions {
            if category_index.insert(def.key, categories.len()).is_some() {
                return Err(AppError::Config(format!("Duplicate category key: {}", def.key)));
            }

            for &(key, label, icon) in def.tools {
                if let Some(&existing) = index.get(key) {
                    let owner = &tools[existing];
                    return Err(AppError::Config(format!(
                        "Tool '{}' listed in both '{}' and '{}'",
                        key, owner.category, def.key
                    )));
                }
                index.insert(key, tools.len());
                tools.push(Tool {
                    key,
                    name_key: format!("tools.{}", key),
                    label,
                    icon,
                    category: def.key,
                });
            }

            categories.push(Category {
                key: def.key,
                name_key: format!("categories.{}", def.key),
                label: def.label,
                color: def.color,
                icon: def.icon,
                tools: def.tools.iter().map(|&(key, _, _)| key).collect(),
            });
        }

        let registry = Self { tools, index, categories, category_index };
        let pending: Vec<&str> = registry
            .tools
            .iter()
            .filter(|t| !t.is_implemented())
            .map(|t| t.key)
            .collect();
        info!(
            "[ToolRegistry] Loaded {} tools in {} categories",
            registry.tools.len(),
            registry.categories.len()
        );
        if !pending.is_empty() {
            debug!("[ToolRegistry] Placeholder tools: {}", pending.join(", "));
        }

        Ok(registry)
    }

    /// Re-check the catalog invariants: unique keys, every tool owned by
    /// exactly one category listing that agrees with `Tool::category`
    pub fn validate(&self) -> AppResult<()> {
        for tool in &self.tools {
            let owners: Vec<&str> = self
                .categories
                .iter()
                .filter(|c| c.tools.contains(&tool.key))
                .map(|c| c.key)
                .collect();
            if owners != [tool.category] {
                return Err(AppError::Config(format!(
                    "Tool '{}' has owners {:?}, expected [{}]",
                    tool.key, owners, tool.category
                )));
            }
        }
        if self.index.len() != self.tools.len() || self.category_index.len() != self.categories.len() {
            return Err(AppError::Config("Duplicate keys in catalog".to_string()));
        }
        Ok(())
    }

    /// Metadata for a tool key; `None` for stale or renamed keys
    pub fn lookup(&self, key: &str) -> Option<&Tool> {
        self.index.get(key).map(|&i| &self.tools[i])
    }

    /// Like `lookup`, but as a `ToolNotFound` error for `?` chains
    pub fn require(&self, key: &str) -> AppResult<&Tool> {
        self.lookup(key)
            .ok_or_else(|| AppError::ToolNotFound(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// All tools in catalog order
    pub fn tools(&self) -> impl Iterator<Item = &Tool> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Categories in catalog order
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, key: &str) -> Option<&Category> {
        self.category_index.get(key).map(|&i| &self.categories[i])
    }

    pub fn tools_in(&self, category: &Category) -> Vec<&Tool> {
        category.tools.iter().filter_map(|key| self.lookup(key)).collect()
    }

    /// Categories in the user's saved order; unknown keys dropped, missing ones appended
    pub fn ordered_categories(&self, saved_order: &[String]) -> Vec<&Category> {
        let mut ordered: Vec<&Category> = Vec::with_capacity(self.categories.len());
        for key in saved_order {
            if let Some(category) = self.category(key) {
                if !ordered.iter().any(|c| c.key == category.key) {
                    ordered.push(category);
                }
            }
        }
        for category in &self.categories {
            if !ordered.iter().any(|c| c.key == category.key) {
                ordered.push(category);
            }
        }
        ordered
    }

    pub fn section(&self, category: &Category) -> CategorySection {
        CategorySection {
            key: category.key.to_string(),
            name_key: category.name_key.clone(),
            label: category.label.to_string(),
            color: category.color.to_string(),
            icon: category.icon.to_string(),
            tools: self.tools_in(category).into_iter().map(ToolDTO::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_consistent() {
        let registry = ToolRegistry::builtin();
        assert!(!registry.is_empty());
        registry.validate().unwrap();
        for tool in registry.tools() {
            let category = registry.category(tool.category).unwrap();
            assert!(category.tools.contains(&tool.key));
            let owners = registry
                .categories()
                .iter()
                .filter(|c| c.tools.contains(&tool.key))
                .count();
            assert_eq!(owners, 1, "{} must belong to exactly one category", tool.key);
        }
    }

    #[test]
    fn test_lookup() {
        let registry = ToolRegistry::builtin();
        let bmi = registry.lookup("bmi").unwrap();
        assert_eq!(bmi.category, "health");
        assert_eq!(bmi.name_key, "tools.bmi");
        assert!(bmi.is_implemented());
    }

    #[test]
    fn test_lookup_not_found() {
        let registry = ToolRegistry::builtin();
        assert!(registry.lookup("nonexistent-tool-key").is_none());
        assert!(matches!(
            registry.require("nonexistent-tool-key"),
            Err(AppError::ToolNotFound(_))
        ));
    }

    #[test]
    fn test_reference_tools_are_placeholders() {
        let registry = ToolRegistry::builtin();
        assert!(!registry.lookup("periodic-table").unwrap().is_implemented());
    }

    #[test]
    fn test_duplicate_tool_rejected() {
        const DUPLICATE: &[CategoryDefinition] = &[
            CategoryDefinition { key: "a", label: "A", color: "#000", icon: "x", tools: &[("bmi", "BMI", "x")] },
            CategoryDefinition { key: "b", label: "B", color: "#000", icon: "x", tools: &[("bmi", "BMI", "x")] },
        ];
        assert!(matches!(ToolRegistry::from_definitions(DUPLICATE), Err(AppError::Config(_))));
    }

    #[test]
    fn test_duplicate_category_rejected() {
        const DUPLICATE: &[CategoryDefinition] = &[
            CategoryDefinition { key: "a", label: "A", color: "#000", icon: "x", tools: &[] },
            CategoryDefinition { key: "a", label: "A", color: "#000", icon: "x", tools: &[] },
        ];
        assert!(ToolRegistry::from_definitions(DUPLICATE).is_err());
    }

    #[test]
    fn test_ordered_categories() {
        let registry = ToolRegistry::builtin();
        let saved = vec!["health".to_string(), "gone".to_string(), "finance".to_string(), "health".to_string()];
        let ordered: Vec<&str> = registry.ordered_categories(&saved).iter().map(|c| c.key).collect();
        assert_eq!(ordered[0], "health");
        assert_eq!(ordered[1], "finance");
        assert_eq!(ordered[2], "converters");
        assert_eq!(ordered.len(), registry.categories().len());
    }

    #[test]
    fn test_section_lists_tools_in_order() {
        let registry = ToolRegistry::builtin();
        let health = registry.category("health").unwrap();
        let section = registry.section(health);
        let keys: Vec<&str> = section.tools.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["bmi", "bmr"]);
    }
}
