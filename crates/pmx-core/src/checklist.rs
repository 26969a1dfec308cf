//! Client-side checklist state: the local completion overlay, category grouping,
//! progress, and the expand/collapse selection of the priority matrix.
//!
//! The overlay is the source of truth for completion while a view is open. Whatever
//! `is_checked` the fetched catalog carried is replaced on load.

use crate::RecommendationItem;
use std::collections::BTreeSet;
use thiserror::Error;

/// Name of the client-local key holding the completed id list.
pub const OVERLAY_KEY: &str = "priority-items-checked";

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("overlay is not a JSON id list: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("overlay io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistence for the serialized overlay.
pub trait OverlayStore {
    fn load(&self) -> Result<Option<String>, OverlayError>;
    fn save(&self, raw: &str) -> Result<(), OverlayError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionOverlay {
    ids: BTreeSet<i64>,
}

impl CompletionOverlay {
    pub fn parse(raw: &str) -> Result<Self, OverlayError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let ids: Vec<i64> = serde_json::from_str(raw)?;
        Ok(Self {
            ids: ids.into_iter().collect(),
        })
    }

    pub fn from_items(items: &[RecommendationItem]) -> Self {
        Self {
            ids: items
                .iter()
                .filter(|item| item.is_checked)
                .map(|item| item.id)
                .collect(),
        }
    }

    pub fn to_json(&self) -> String {
        let ids: Vec<i64> = self.ids.iter().copied().collect();
        serde_json::to_string(&ids).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<i64> for CompletionOverlay {
    fn from_iter<T: IntoIterator<Item = i64>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn of<'a>(items: impl IntoIterator<Item = &'a RecommendationItem>) -> Self {
        let mut progress = Self::default();
        for item in items {
            progress.total += 1;
            if item.is_checked {
                progress.completed += 1;
            }
        }
        progress
    }

    /// Whole percentage rounded half up; an empty set reports 0.
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let completed = self.completed.min(self.total) as u64;
        let total = self.total as u64;
        ((200 * completed + total) / (2 * total)) as u32
    }
}

/// Accent of a category header, derived from its label. First match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryAccent {
    Critical,
    High,
    Medium,
    Low,
    Neutral,
}

impl CategoryAccent {
    pub fn from_label(label: &str) -> Self {
        if label.contains("CRITICAL") {
            CategoryAccent::Critical
        } else if label.contains("HIGH") {
            CategoryAccent::High
        } else if label.contains("MEDIUM") {
            CategoryAccent::Medium
        } else if label.contains("LOW") || label.contains("STRATEGIC") {
            CategoryAccent::Low
        } else {
            CategoryAccent::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryAccent::Critical => "red",
            CategoryAccent::High => "orange",
            CategoryAccent::Medium => "yellow",
            CategoryAccent::Low => "green",
            CategoryAccent::Neutral => "gray",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoryGroup<'a> {
    pub category: &'a str,
    pub items: Vec<&'a RecommendationItem>,
}

impl CategoryGroup<'_> {
    pub fn progress(&self) -> Progress {
        Progress::of(self.items.iter().copied())
    }

    pub fn accent(&self) -> CategoryAccent {
        CategoryAccent::from_label(self.category)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChecklistView {
    items: Vec<RecommendationItem>,
    expanded: Option<i64>,
}

impl ChecklistView {
    pub fn new(mut items: Vec<RecommendationItem>, overlay: &CompletionOverlay) -> Self {
        for item in &mut items {
            item.is_checked = overlay.contains(item.id);
        }
        Self {
            items,
            expanded: None,
        }
    }

    pub fn items(&self) -> &[RecommendationItem] {
        &self.items
    }

    pub fn item(&self, id: i64) -> Option<&RecommendationItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Flips one item and returns the overlay to persist, or `None` for an unknown id.
    pub fn toggle(&mut self, id: i64) -> Option<CompletionOverlay> {
        let item = self.items.iter_mut().find(|item| item.id == id)?;
        item.is_checked = !item.is_checked;
        Some(self.overlay())
    }

    pub fn overlay(&self) -> CompletionOverlay {
        CompletionOverlay::from_items(&self.items)
    }

    pub fn expanded(&self) -> Option<i64> {
        self.expanded
    }

    pub fn is_expanded(&self, id: i64) -> bool {
        self.expanded == Some(id)
    }

    pub fn set_expanded(&mut self, id: i64, open: bool) {
        if open {
            self.expanded = Some(id);
        } else if self.expanded == Some(id) {
            self.expanded = None;
        }
    }

    pub fn toggle_expanded(&mut self, id: i64) {
        let open = !self.is_expanded(id);
        self.set_expanded(id, open);
    }

    /// Items partitioned by category in first-seen order.
    pub fn groups(&self) -> Vec<CategoryGroup<'_>> {
        let mut groups: Vec<CategoryGroup<'_>> = Vec::new();
        for item in &self.items {
            match groups
                .iter_mut()
                .find(|group| group.category == item.category)
            {
                Some(group) => group.items.push(item),
                None => groups.push(CategoryGroup {
                    category: &item.category,
                    items: vec![item],
                }),
            }
        }
        groups
    }

    pub fn progress(&self) -> Progress {
        Progress::of(&self.items)
    }
}

/// A view bound to its overlay store. Toggles are written through before returning.
pub struct ChecklistSession<S: OverlayStore> {
    view: ChecklistView,
    store: S,
    warning: Option<String>,
}

impl<S: OverlayStore> ChecklistSession<S> {
    /// Loads the overlay from `store`; unreadable or corrupt overlays count as empty.
    pub fn open(items: Vec<RecommendationItem>, store: S) -> Self {
        let (overlay, warning) = match store.load() {
            Ok(Some(raw)) => match CompletionOverlay::parse(&raw) {
                Ok(overlay) => (overlay, None),
                Err(err) => (CompletionOverlay::default(), Some(err.to_string())),
            },
            Ok(None) => (CompletionOverlay::default(), None),
            Err(err) => (CompletionOverlay::default(), Some(err.to_string())),
        };
        Self {
            view: ChecklistView::new(items, &overlay),
            store,
            warning,
        }
    }

    /// Returns the new checked state, or `None` when the id is not in the catalog.
    /// A failed save leaves the item as it was.
    pub fn toggle(&mut self, id: i64) -> Result<Option<bool>, OverlayError> {
        let Some(overlay) = self.view.toggle(id) else {
            return Ok(None);
        };
        if let Err(err) = self.store.save(&overlay.to_json()) {
            self.view.toggle(id);
            return Err(err);
        }
        Ok(Some(overlay.contains(id)))
    }

    pub fn view(&self) -> &ChecklistView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ChecklistView {
        &mut self.view
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }
}
