use crate::shared::error::AppResult;
use crate::shared::types::{FieldSpec, WidgetInput, WidgetOutput};
use super::Calculator;

/// Stand-in for catalog entries without a concrete widget
#[derive(Debug, Clone)]
pub struct NotImplementedWidget {
    key: String,
}

impl NotImplementedWidget {
    pub fn new(key: &str) -> Self {
        Self { key: key.to_string() }
    }
}

impl Calculator for NotImplementedWidget {
    fn id(&self) -> &str {
        &self.key
    }

    fn fields(&self) -> Vec<FieldSpec> {
        Vec::new()
    }

    fn compute(&self, _input: &WidgetInput) -> AppResult<WidgetOutput> {
        Ok(WidgetOutput::new("").detail("status", "widget.not_implemented"))
    }

    fn is_implemented(&self) -> bool {
        false
    }
}
