use anyhow::{Context, Result};
use pmx_core::RecommendationItem;
use serde_json::json;

const ITEMS_PATH: &str = "/api/priority-items";

fn items_url(base: &str) -> String {
    format!("{}{ITEMS_PATH}", base.trim_end_matches('/'))
}

pub async fn fetch_items(client: &reqwest::Client, base: &str) -> Result<Vec<RecommendationItem>> {
    let url = items_url(base);
    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("Failed to reach {url}"))?
        .error_for_status()
        .context("Failed to load priority items")?;
    response
        .json()
        .await
        .context("Failed to parse priority items")
}

pub async fn set_checked(
    client: &reqwest::Client,
    base: &str,
    id: i64,
    is_checked: bool,
) -> Result<()> {
    let url = format!("{}/{id}", items_url(base));
    client
        .patch(&url)
        .json(&json!({ "is_checked": is_checked }))
        .send()
        .await
        .with_context(|| format!("Failed to reach {url}"))?
        .error_for_status()
        .with_context(|| format!("Failed to update item {id}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_url_tolerates_trailing_slash() {
        assert_eq!(
            items_url("http://127.0.0.1:3000/"),
            "http://127.0.0.1:3000/api/priority-items"
        );
        assert_eq!(
            items_url("http://127.0.0.1:3000"),
            "http://127.0.0.1:3000/api/priority-items"
        );
    }
}
