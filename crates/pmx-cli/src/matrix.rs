use pmx_core::checklist::{CategoryGroup, ChecklistView, Progress};
use pmx_core::RecommendationItem;
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Debug, Serialize)]
pub struct ProgressSummary {
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
}

impl From<Progress> for ProgressSummary {
    fn from(progress: Progress) -> Self {
        Self {
            completed: progress.completed,
            total: progress.total,
            percentage: progress.percentage(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategorySummary<'a> {
    pub category: &'a str,
    pub accent: &'static str,
    pub progress: ProgressSummary,
    pub items: Vec<&'a RecommendationItem>,
}

#[derive(Debug, Serialize)]
pub struct MatrixSummary<'a> {
    pub progress: ProgressSummary,
    pub expanded: Option<i64>,
    pub categories: Vec<CategorySummary<'a>>,
}

pub fn summarize(view: &ChecklistView) -> MatrixSummary<'_> {
    MatrixSummary {
        progress: view.progress().into(),
        expanded: view.expanded(),
        categories: view
            .groups()
            .into_iter()
            .map(|group| CategorySummary {
                category: group.category,
                accent: group.accent().as_str(),
                progress: group.progress().into(),
                items: group.items,
            })
            .collect(),
    }
}

pub fn render_text(view: &ChecklistView) -> String {
    let mut out = String::new();
    let overall = view.progress();
    let _ = writeln!(
        out,
        "Overall Progress: {}% ({} of {} complete)",
        overall.percentage(),
        overall.completed,
        overall.total
    );
    let _ = writeln!(out, "{}", progress_bar(overall.percentage(), 40));

    for group in view.groups() {
        out.push('\n');
        render_group(&mut out, view, &group);
    }
    out
}

fn render_group(out: &mut String, view: &ChecklistView, group: &CategoryGroup<'_>) {
    let progress = group.progress();
    let _ = writeln!(
        out,
        "[{}] {}  {} / {} completed  {}% progress",
        group.accent().as_str(),
        group.category,
        progress.completed,
        progress.total,
        progress.percentage()
    );
    for item in &group.items {
        let mark = if item.is_checked { "[x]" } else { "[ ]" };
        let pillar = item
            .pillar_kind()
            .map(|pillar| pillar.as_str())
            .unwrap_or(item.pillar.as_str());
        let _ = writeln!(
            out,
            "  {mark} {:>3}  {} {}  ({})  {}  {}  {}",
            item.item_number,
            item.priority().icon(),
            item.recommendation,
            item.technical(),
            pillar,
            item.effort,
            item.business_value
        );
        if view.is_expanded(item.id) {
            for (label, text) in item.detail_sections() {
                let _ = writeln!(out, "        {label}:");
                for line in text.lines() {
                    let _ = writeln!(out, "          {line}");
                }
            }
        }
    }
}

fn progress_bar(percentage: u32, width: usize) -> String {
    let filled = (percentage.min(100) as usize * width) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmx_core::checklist::CompletionOverlay;
    use pmx_storage::snapshot::catalog_snapshot;

    fn view(checked: &[i64]) -> ChecklistView {
        let overlay: CompletionOverlay = checked.iter().copied().collect();
        ChecklistView::new(catalog_snapshot().expect("snapshot"), &overlay)
    }

    #[test]
    fn text_output_reports_overall_and_category_progress() {
        let text = render_text(&view(&[1, 2]));
        assert!(text.starts_with("Overall Progress: 7% (2 of 28 complete)"));
        assert!(text.contains("[red] CRITICAL PRIORITY (0-30 Days)  2 / 7 completed  29% progress"));
        assert!(text.contains("[green] STRATEGIC (90+ Days)  0 / 7 completed  0% progress"));
        assert!(text.contains("[x]   1  🔴 Implement Managed Identities"));
        assert!(text.contains("[ ]   3  🔴 Configure Distributed Tracing"));
    }

    #[test]
    fn expanded_row_shows_detail_sections() {
        let mut view = view(&[]);
        assert!(!render_text(&view).contains("Implementation Steps:"));

        view.set_expanded(3, true);
        let text = render_text(&view);
        assert!(text.contains("Description:"));
        assert!(text.contains("Implementation Steps:"));
        assert!(!text.contains("Compliance Notes:"));
    }

    #[test]
    fn summary_groups_in_first_seen_order() {
        let view = view(&[28]);
        let summary = summarize(&view);
        assert_eq!(summary.progress.completed, 1);
        assert_eq!(summary.progress.percentage, 4);
        let names: Vec<&str> = summary.categories.iter().map(|c| c.category).collect();
        assert_eq!(
            names,
            vec![
                "CRITICAL PRIORITY (0-30 Days)",
                "HIGH PRIORITY (30-60 Days)",
                "MEDIUM PRIORITY (60-90 Days)",
                "STRATEGIC (90+ Days)"
            ]
        );
        assert_eq!(summary.categories[3].progress.percentage, 14);
        assert_eq!(summary.categories[3].accent, "green");
    }

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(0, 4), "[----]");
        assert_eq!(progress_bar(50, 4), "[##--]");
        assert_eq!(progress_bar(100, 4), "[####]");
    }
}
