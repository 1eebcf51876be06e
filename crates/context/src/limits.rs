//! Size limits for context assembly.

use meetwise_config::ContextConfig;

/// Every cap the context stages enforce. Lengths are in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextLimits {
    /// Most records in any context window
    pub max_records: usize,
    /// Per-record cap for windows feeding insight extraction
    pub extraction_item_chars: usize,
    /// Per-record cap for windows feeding summary comparison
    pub comparison_item_chars: usize,
    /// Cap on each synthesized insight field
    pub insight_field_chars: usize,
    /// Cap on the rendered insights block
    pub insights_section_chars: usize,
    /// Cap on the rendered delta block
    pub delta_section_chars: usize,
    /// Items kept per delta category
    pub delta_category_items: usize,
    /// `tool_used` tag whose records form the history
    pub history_tool: String,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self::from_config(&ContextConfig::default())
    }
}

impl ContextLimits {
    pub fn from_config(config: &ContextConfig) -> Self {
        Self {
            max_records: config.max_records,
            extraction_item_chars: config.extraction_item_chars,
            comparison_item_chars: config.comparison_item_chars,
            insight_field_chars: config.insight_field_chars,
            insights_section_chars: config.insights_section_chars,
            delta_section_chars: config.delta_section_chars,
            delta_category_items: config.delta_category_items,
            history_tool: config.history_tool.clone(),
        }
    }

    /// Window parameters for a given use.
    pub fn window(&self, purpose: WindowPurpose) -> WindowSpec {
        let item_cap = match purpose {
            WindowPurpose::Extraction => self.extraction_item_chars,
            WindowPurpose::Comparison => self.comparison_item_chars,
        };
        WindowSpec {
            tag: self.history_tool.clone(),
            max_count: self.max_records,
            item_cap,
        }
    }
}

/// What a context window will be used for; decides its per-item cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPurpose {
    /// Feeding the insight synthesizer
    Extraction,
    /// Feeding the delta engine
    Comparison,
}

/// Selector parameters for one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    pub tag: String,
    pub max_count: usize,
    pub item_cap: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_config_defaults() {
        let limits = ContextLimits::default();
        assert_eq!(limits.max_records, 3);
        assert_eq!(limits.insight_field_chars, 500);
        assert_eq!(limits.insights_section_chars, 1200);
        assert_eq!(limits.delta_section_chars, 800);
        assert_eq!(limits.delta_category_items, 5);
        assert_eq!(limits.history_tool, "summarization");
    }

    #[test]
    fn window_caps_by_purpose() {
        let limits = ContextLimits::default();
        assert_eq!(limits.window(WindowPurpose::Extraction).item_cap, 1200);
        assert_eq!(limits.window(WindowPurpose::Comparison).item_cap, 2000);
        assert_eq!(limits.window(WindowPurpose::Comparison).max_count, 3);
    }
}
