use crate::config::NS_ARTICLE;
use crate::models::PageRow;
use anyhow::Result;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::info;

pub struct TitleLookup {
    pub titles: FxHashMap<u32, String>,
    /// Pages outside namespace 0
    pub skipped: u64,
}

/// Map each found article id to its namespace 0 title in the primary edition
pub fn resolve_titles<I>(pages: I, found_ids: &FxHashSet<u32>) -> Result<TitleLookup>
where
    I: IntoIterator<Item = Result<PageRow>>,
{
    let mut lookup = TitleLookup {
        titles: FxHashMap::default(),
        skipped: 0,
    };

    for page in pages {
        let page = page?;
        if page.namespace != NS_ARTICLE {
            lookup.skipped += 1;
            continue;
        }
        if found_ids.contains(&page.id) {
            lookup.titles.insert(page.id, page.title);
        }
    }

    info!(
        resolved = lookup.titles.len(),
        wanted = found_ids.len(),
        skipped = lookup.skipped,
        "Resolved article titles"
    );

    Ok(lookup)
}
