use crate::models::LangLink;
use anyhow::Result;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::info;

/// Per-article interlanguage link counts
#[derive(Default)]
pub struct LinkTally {
    pub counts: FxHashMap<u32, u32>,
    /// Title in the second edition, last one seen wins
    pub second_titles: FxHashMap<u32, String>,
    /// Articles whose count reached the threshold
    pub found_ids: FxHashSet<u32>,
    pub links_seen: u64,
    pub links_counted: u64,
}

impl LinkTally {
    /// Drop counts and titles of articles that never reached the threshold
    pub fn retain_found(&mut self) {
        let found = &self.found_ids;
        self.counts.retain(|id, _| found.contains(id));
        self.second_titles.retain(|id, _| found.contains(id));
        self.counts.shrink_to_fit();
        self.second_titles.shrink_to_fit();
    }
}

/// Count interlanguage links per article.
///
/// With `qualifying` set, links from articles outside it are ignored. The set
/// is consumed and freed once counting finishes. An article joins `found_ids`
/// when its count hits `threshold` exactly, so it is added once even though
/// counting carries on past the threshold.
pub fn count_links<I>(
    links: I,
    qualifying: Option<FxHashSet<u32>>,
    threshold: u32,
    second_lang: &str,
) -> Result<LinkTally>
where
    I: IntoIterator<Item = Result<LangLink>>,
{
    let mut tally = LinkTally::default();

    for link in links {
        let link = link?;
        tally.links_seen += 1;
        if let Some(ids) = &qualifying {
            if !ids.contains(&link.page_id) {
                continue;
            }
        }
        tally.links_counted += 1;

        if link.lang == second_lang {
            tally.second_titles.insert(link.page_id, link.title);
        }

        let count = tally.counts.entry(link.page_id).or_insert(0);
        *count += 1;
        if *count == threshold {
            tally.found_ids.insert(link.page_id);
        }
    }
    drop(qualifying);

    info!(
        seen = tally.links_seen,
        counted = tally.links_counted,
        articles = tally.counts.len(),
        found = tally.found_ids.len(),
        "Counted interlanguage links"
    );

    Ok(tally)
}
