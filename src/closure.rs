use crate::config::NS_CATEGORY;
use crate::models::{CategoryLink, PageRow};
use crate::parser::RecordSource;
use anyhow::Result;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{info, warn};

/// Pages found below a root category
pub struct CategoryClosure {
    /// Every page filed under the root or a discovered subcategory
    pub page_ids: FxHashSet<u32>,
    /// Known category titles, root included
    pub categories: FxHashSet<String>,
    /// `(parent, child)` pairs in discovery order
    pub discovered: Vec<(String, String)>,
    /// Expansion rounds that found at least one candidate to resolve
    pub iterations: u32,
    /// True when the round cap stopped expansion with subcategories still unexplored
    pub truncated: bool,
}

/// Collect the page ids under `root` and its subcategories.
///
/// Direct members are always collected. Each of up to `max_iterations` rounds
/// then resolves the newest members against the page table, and any that are
/// category pages have their own members collected. The loop stops early once
/// a round discovers no new subcategory, so trees deeper than the cap yield a
/// partial closure.
pub fn resolve<L, P>(
    root: &str,
    max_iterations: u32,
    category_links: &L,
    pages: &P,
) -> Result<CategoryClosure>
where
    L: RecordSource<CategoryLink>,
    P: RecordSource<PageRow>,
{
    let mut closure = CategoryClosure {
        page_ids: FxHashSet::default(),
        categories: FxHashSet::from_iter([root.to_string()]),
        discovered: Vec::new(),
        iterations: 0,
        truncated: false,
    };

    info!(root, "Searching for subcategories");

    let mut frontier: FxHashSet<String> = FxHashSet::from_iter([root.to_string()]);
    let mut candidates = collect_members(&frontier, category_links, &mut closure.page_ids)?;

    while !candidates.is_empty() {
        if closure.iterations == max_iterations {
            closure.truncated = true;
            break;
        }
        closure.iterations += 1;

        let known = closure.discovered.len();
        frontier = FxHashSet::default();
        for page in pages.records()? {
            let page = page?;
            if page.namespace != NS_CATEGORY {
                continue;
            }
            let Some(parent) = candidates.get(&page.id) else {
                continue;
            };
            if closure.categories.insert(page.title.clone()) {
                closure.discovered.push((parent.clone(), page.title.clone()));
                frontier.insert(page.title);
            }
        }

        info!(
            iteration = closure.iterations,
            subcategories = frontier.len(),
            "Resolved candidate pages"
        );
        for (parent, child) in &closure.discovered[known..] {
            info!("{}->{}", parent, child);
        }

        if frontier.is_empty() {
            break;
        }
        candidates = collect_members(&frontier, category_links, &mut closure.page_ids)?;
    }

    if closure.truncated {
        warn!(
            max_iterations,
            pending = candidates.len(),
            "Iteration cap reached; category closure may be incomplete"
        );
    }

    info!(
        pages = closure.page_ids.len(),
        categories = closure.categories.len(),
        iterations = closure.iterations,
        "Category closure resolved"
    );

    Ok(closure)
}

/// Scan the category links once, recording pages filed under any `frontier`
/// category. Returns the pages not seen before, mapped to the category that
/// introduced them.
fn collect_members<L>(
    frontier: &FxHashSet<String>,
    category_links: &L,
    page_ids: &mut FxHashSet<u32>,
) -> Result<FxHashMap<u32, String>>
where
    L: RecordSource<CategoryLink>,
{
    let mut candidates = FxHashMap::default();
    for link in category_links.records()? {
        let link = link?;
        if frontier.contains(&link.category) && page_ids.insert(link.page_id) {
            candidates.insert(link.page_id, link.category);
        }
    }
    info!(new_pages = candidates.len(), "Collected category members");
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(page_id: u32, category: &str) -> CategoryLink {
        CategoryLink {
            page_id,
            category: category.to_string(),
        }
    }

    fn page(id: u32, namespace: i32, title: &str) -> PageRow {
        PageRow {
            id,
            namespace,
            title: title.to_string(),
        }
    }

    /// Sports > Athletics > Running > Sprinting, each level with one article
    fn tree() -> (Vec<CategoryLink>, Vec<PageRow>) {
        let links = vec![
            link(10, "Sports"),
            link(11, "Sports"),
            link(20, "Athletics"),
            link(21, "Athletics"),
            link(30, "Running"),
            link(31, "Running"),
            link(40, "Sprinting"),
            link(99, "Cooking"),
        ];
        let pages = vec![
            page(10, 14, "Athletics"),
            page(11, 0, "Sport"),
            page(20, 0, "Marathon"),
            page(21, 14, "Running"),
            page(30, 0, "Jogging"),
            page(31, 14, "Sprinting"),
            page(40, 0, "100_metres"),
            page(99, 0, "Soup"),
        ];
        (links, pages)
    }

    fn sorted(ids: &FxHashSet<u32>) -> Vec<u32> {
        let mut ids: Vec<u32> = ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn zero_iterations_returns_direct_members() {
        let (links, pages) = tree();
        let closure = resolve("Sports", 0, &links, &pages).unwrap();
        assert_eq!(sorted(&closure.page_ids), vec![10, 11]);
        assert!(closure.discovered.is_empty());
        assert!(closure.truncated);
    }

    #[test]
    fn each_iteration_descends_one_level() {
        let (links, pages) = tree();
        let one = resolve("Sports", 1, &links, &pages).unwrap();
        assert_eq!(sorted(&one.page_ids), vec![10, 11, 20, 21]);

        let two = resolve("Sports", 2, &links, &pages).unwrap();
        assert_eq!(sorted(&two.page_ids), vec![10, 11, 20, 21, 30, 31]);
        assert_eq!(
            two.discovered,
            vec![
                ("Sports".to_string(), "Athletics".to_string()),
                ("Athletics".to_string(), "Running".to_string()),
            ]
        );
    }

    #[test]
    fn stops_early_when_no_new_subcategories() {
        let (links, pages) = tree();
        let closure = resolve("Sports", 10, &links, &pages).unwrap();
        assert_eq!(sorted(&closure.page_ids), vec![10, 11, 20, 21, 30, 31, 40]);
        assert_eq!(closure.iterations, 4);
        assert!(!closure.truncated);
        assert!(!closure.page_ids.contains(&99));
    }

    #[test]
    fn page_reachable_by_two_paths_is_recorded_once() {
        let links = vec![
            link(10, "A"),
            link(11, "A"),
            link(50, "A"),
            link(50, "B"),
            link(50, "C"),
        ];
        let pages = vec![page(10, 14, "B"), page(11, 14, "C"), page(50, 0, "Shared")];
        let closure = resolve("A", 3, &links, &pages).unwrap();
        assert_eq!(sorted(&closure.page_ids), vec![10, 11, 50]);
    }

    #[test]
    fn category_cycles_terminate() {
        let links = vec![link(1, "A"), link(2, "B")];
        let pages = vec![page(1, 14, "B"), page(2, 14, "A")];
        let closure = resolve("A", 100, &links, &pages).unwrap();
        assert_eq!(sorted(&closure.page_ids), vec![1, 2]);
        assert_eq!(closure.discovered.len(), 1);
        assert!(!closure.truncated);
    }

    #[test]
    fn unknown_root_is_empty() {
        let (links, pages) = tree();
        let closure = resolve("Nothing", 3, &links, &pages).unwrap();
        assert!(closure.page_ids.is_empty());
        assert_eq!(closure.iterations, 0);
    }
}
