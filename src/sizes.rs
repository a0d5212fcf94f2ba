use crate::config::NS_ARTICLE;
use crate::models::SizedPage;
use anyhow::Result;
use rustc_hash::FxHashMap;
use tracing::info;

/// Page tables store titles with underscores, langlinks with spaces
pub fn normalize_title(title: &str) -> String {
    title.replace(' ', "_")
}

/// Look up the second-edition article size for each primary article.
///
/// Several primary articles may link to the same second-edition title, so the
/// inverse index keeps every id per title. Only namespace 0 pages are matched.
pub fn resolve_sizes<I>(
    second_pages: I,
    second_titles: &FxHashMap<u32, String>,
) -> Result<FxHashMap<u32, u64>>
where
    I: IntoIterator<Item = Result<SizedPage>>,
{
    let mut by_title: FxHashMap<String, Vec<u32>> = FxHashMap::default();
    for (id, title) in second_titles {
        by_title.entry(normalize_title(title)).or_default().push(*id);
    }

    let mut sizes = FxHashMap::default();
    for page in second_pages {
        let page = page?;
        if page.namespace != NS_ARTICLE {
            continue;
        }
        if let Some(ids) = by_title.get(&page.title) {
            for id in ids {
                sizes.insert(*id, page.size);
            }
        }
    }

    info!(
        titles = by_title.len(),
        resolved = sizes.len(),
        "Resolved second edition sizes"
    );

    Ok(sizes)
}
