use crate::config::MISSING;
use crate::langlinks::LinkTally;
use crate::models::ReportRow;
use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Dump strings keep SQL escaping; only `\'` is undone for display
pub fn unescape_title(title: &str) -> String {
    title.replace(r"\'", "'")
}

/// Ordering of a row in the report, on the still-escaped titles.
///
/// A missing second title compares as the `---` sentinel; a missing size
/// sorts after every size.
fn sort_key(row: &ReportRow) -> (u32, &str, &str, bool, Option<u64>) {
    (
        row.count,
        row.title.as_str(),
        row.second_title.as_deref().unwrap_or(MISSING),
        row.second_size.is_none(),
        row.second_size,
    )
}

/// Join counts, titles and sizes into rows sorted by count.
///
/// Rows are sorted on the raw dump titles and unescaped afterwards. Found
/// articles without a namespace 0 title are left out.
pub fn assemble(
    tally: &LinkTally,
    titles: &FxHashMap<u32, String>,
    sizes: &FxHashMap<u32, u64>,
) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = tally
        .found_ids
        .iter()
        .filter_map(|id| {
            let Some(title) = titles.get(id) else {
                debug!(id, "No article title for found id");
                return None;
            };
            Some(ReportRow {
                count: tally.counts.get(id).copied().unwrap_or_default(),
                title: title.clone(),
                second_title: tally.second_titles.get(id).cloned(),
                second_size: sizes.get(id).copied(),
            })
        })
        .collect();
    rows.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));

    for row in &mut rows {
        row.title = unescape_title(&row.title);
        if let Some(second) = row.second_title.as_mut() {
            *second = unescape_title(second);
        }
    }
    rows
}

/// Write one ` | `-separated line per row, replacing `path` only once complete
pub fn write_report(path: &Path, rows: &[ReportRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let tmp_path = path.with_extension("tmp");
    let file = File::create(&tmp_path)
        .with_context(|| format!("Failed to create report file: {:?}", tmp_path))?;
    let mut writer = BufWriter::with_capacity(128 * 1024, file);
    for row in rows {
        writeln!(writer, "{}", row)?;
    }
    writer.flush().context("Failed to flush report")?;
    drop(writer);

    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to move report into place: {:?}", path))?;

    info!(rows = rows.len(), path = %path.display(), "Report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;
    use tempfile::TempDir;

    fn tally(entries: &[(u32, u32, Option<&str>)]) -> LinkTally {
        LinkTally {
            counts: entries.iter().map(|(id, c, _)| (*id, *c)).collect(),
            second_titles: entries
                .iter()
                .filter_map(|(id, _, t)| t.map(|t| (*id, t.to_string())))
                .collect(),
            found_ids: entries.iter().map(|(id, _, _)| *id).collect::<FxHashSet<_>>(),
            ..Default::default()
        }
    }

    #[test]
    fn rows_sorted_by_count_then_title() {
        let tally = tally(&[(1, 60, None), (2, 49, None), (3, 49, None)]);
        let titles = FxHashMap::from_iter([
            (1, "Alpha".to_string()),
            (2, "Zulu".to_string()),
            (3, "Mike".to_string()),
        ]);
        let rows = assemble(&tally, &titles, &FxHashMap::default());
        let order: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(order, vec!["Mike", "Zulu", "Alpha"]);
    }

    #[test]
    fn escaped_apostrophes_are_unescaped() {
        let tally = tally(&[(1, 50, Some(r"Trīsdesmitgadu kara\'s"))]);
        let titles = FxHashMap::from_iter([(1, r"Thirty_Years\'_War".to_string())]);
        let rows = assemble(&tally, &titles, &FxHashMap::default());
        assert_eq!(rows[0].title, "Thirty_Years'_War");
        assert_eq!(rows[0].second_title.as_deref(), Some("Trīsdesmitgadu kara's"));
    }

    #[test]
    fn equal_counts_sort_on_escaped_titles() {
        let tally = tally(&[(1, 50, None), (2, 50, None)]);
        let titles = FxHashMap::from_iter([
            (1, r"Newton\'s_laws".to_string()),
            (2, "NewtonB".to_string()),
        ]);
        let rows = assemble(&tally, &titles, &FxHashMap::default());
        let order: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(order, vec!["NewtonB", "Newton's_laws"]);
    }

    #[test]
    fn missing_second_title_sorts_as_sentinel() {
        let tally = tally(&[(1, 50, None), (2, 50, Some("!Sākums")), (3, 50, Some("Ābece"))]);
        let titles = FxHashMap::from_iter([
            (1, "Same".to_string()),
            (2, "Same".to_string()),
            (3, "Same".to_string()),
        ]);
        let rows = assemble(&tally, &titles, &FxHashMap::default());
        let order: Vec<Option<&str>> = rows.iter().map(|r| r.second_title.as_deref()).collect();
        assert_eq!(order, vec![Some("!Sākums"), None, Some("Ābece")]);
    }

    #[test]
    fn missing_size_sorts_after_sizes() {
        let tally = tally(&[(1, 50, Some("Sports")), (2, 50, Some("Sports"))]);
        let titles = FxHashMap::from_iter([(1, "Sport".to_string()), (2, "Sport".to_string())]);
        let sizes = FxHashMap::from_iter([(2, 900_000)]);
        let rows = assemble(&tally, &titles, &sizes);
        let order: Vec<Option<u64>> = rows.iter().map(|r| r.second_size).collect();
        assert_eq!(order, vec![Some(900_000), None]);
    }

    #[test]
    fn missing_second_edition_uses_sentinels() {
        let tally = tally(&[(1, 50, None)]);
        let titles = FxHashMap::from_iter([(1, "Marathon".to_string())]);
        let rows = assemble(&tally, &titles, &FxHashMap::default());
        assert_eq!(rows[0].to_string(), "50 | Marathon | --- | ---");
    }

    #[test]
    fn found_ids_without_title_are_omitted() {
        let tally = tally(&[(1, 50, None), (2, 50, None)]);
        let titles = FxHashMap::from_iter([(2, "Marathon".to_string())]);
        let rows = assemble(&tally, &titles, &FxHashMap::default());
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn report_file_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("titles.txt");
        let rows = vec![
            ReportRow {
                count: 49,
                title: "Marathon".to_string(),
                second_title: Some("Maratons".to_string()),
                second_size: Some(512),
            },
            ReportRow {
                count: 51,
                title: "Sport".to_string(),
                second_title: None,
                second_size: None,
            },
        ];
        write_report(&path, &rows).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "49 | Marathon | Maratons | 512\n51 | Sport | --- | ---\n");
        assert!(!path.with_extension("tmp").exists());
    }
}
