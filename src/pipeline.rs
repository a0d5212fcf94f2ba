use crate::config::RunConfig;
use crate::models::{LangLink, PageRow, ReportRow, SizedPage};
use crate::parser::DumpFile;
use crate::stats::RunSummary;
use crate::{closure, langlinks, report, sizes, titles};
use anyhow::{bail, Result};
use std::time::Instant;
use tracing::info;

/// Run every stage and write the report to `config.output`.
///
/// Each stage finishes its dump before the next one starts; the closure set
/// and the counts of non-qualifying articles are freed as soon as they have
/// been consumed.
pub fn run(config: &RunConfig) -> Result<RunSummary> {
    let (rows, summary) = build_report(config)?;
    report::write_report(&config.output, &rows)?;
    Ok(RunSummary {
        rows_written: rows.len(),
        ..summary
    })
}

/// All stages except writing the report file
pub fn build_report(config: &RunConfig) -> Result<(Vec<ReportRow>, RunSummary)> {
    if config.threshold == 0 {
        bail!("Link threshold must be at least 1");
    }

    let show_progress = !config.quiet;
    let category_links = DumpFile::new(&config.dumps.category_links).with_progress(show_progress);
    let pages = DumpFile::new(&config.dumps.pages).with_progress(show_progress);
    let lang_links = DumpFile::new(&config.dumps.lang_links).with_progress(show_progress);
    let second_pages = DumpFile::new(&config.dumps.second_pages).with_progress(show_progress);

    let mut summary = RunSummary::default();

    let start = Instant::now();
    let qualifying = match &config.root_category {
        Some(root) => {
            let closure =
                closure::resolve(root, config.max_iterations, &category_links, &pages)?;
            summary.closure_pages = Some(closure.page_ids.len());
            summary.subcategories = closure.discovered.len();
            summary.closure_iterations = closure.iterations;
            summary.closure_truncated = closure.truncated;
            Some(closure.page_ids)
        }
        None => {
            info!("No root category, counting links of all articles");
            None
        }
    };
    summary.closure_time = start.elapsed();

    info!("Counting links");
    let start = Instant::now();
    let mut tally = langlinks::count_links(
        lang_links.scan::<LangLink>()?,
        qualifying,
        config.threshold,
        &config.second_lang,
    )?;
    tally.retain_found();
    summary.links_seen = tally.links_seen;
    summary.links_counted = tally.links_counted;
    summary.articles_found = tally.found_ids.len();
    summary.second_titles = tally.second_titles.len();
    summary.counting_time = start.elapsed();

    let start = Instant::now();
    info!(lang = %config.second_lang, "Looking up second edition page sizes");
    let sizes = sizes::resolve_sizes(second_pages.scan::<SizedPage>()?, &tally.second_titles)?;
    summary.sizes_resolved = sizes.len();

    info!("Looking up titles");
    let lookup = titles::resolve_titles(pages.scan::<PageRow>()?, &tally.found_ids)?;
    summary.titles_resolved = lookup.titles.len();
    summary.titles_skipped = lookup.skipped;

    let rows = report::assemble(&tally, &lookup.titles, &sizes);
    summary.lookup_time = start.elapsed();

    Ok((rows, summary))
}
