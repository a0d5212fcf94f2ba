use std::path::{Path, PathBuf};

/// Number of interlanguage links an article needs to be reported
pub const DEFAULT_THRESHOLD: u32 = 49;

/// Subcategory expansion rounds below the root category
pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

/// Namespace of content articles
pub const NS_ARTICLE: i32 = 0;

/// Namespace of category pages
pub const NS_CATEGORY: i32 = 14;

/// Language code of the second edition whose titles and sizes are reported
pub const DEFAULT_SECOND_LANG: &str = "lv";

pub const DEFAULT_PRIMARY_WIKI: &str = "enwiki";
pub const DEFAULT_SECOND_WIKI: &str = "lvwiki";

pub const DEFAULT_MIRROR: &str = "https://dumps.wikimedia.org";

pub const DEFAULT_OUTPUT: &str = "titles.txt";

/// Progress update interval (tick every N dump lines)
pub const PROGRESS_INTERVAL: u64 = 64;

/// Sentinel printed for a missing second-edition title or size
pub const MISSING: &str = "---";

/// Position of the page length field, counted from the end of a page tuple
pub const SIZE_FIELD_FROM_END: usize = 3;

/// Dump tables read by a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpTable {
    CategoryLinks,
    LangLinks,
    Page,
}

impl DumpTable {
    pub fn name(self) -> &'static str {
        match self {
            DumpTable::CategoryLinks => "categorylinks",
            DumpTable::LangLinks => "langlinks",
            DumpTable::Page => "page",
        }
    }
}

/// `enwiki` + `page` -> `enwiki-latest-page.sql.gz`
pub fn dump_filename(wiki: &str, table: DumpTable) -> String {
    format!("{}-latest-{}.sql.gz", wiki, table.name())
}

/// `https://dumps.wikimedia.org` + `enwiki` -> `https://dumps.wikimedia.org/enwiki/latest/`
pub fn dump_root_url(mirror: &str, wiki: &str) -> String {
    format!("{}/{}/latest/", mirror.trim_end_matches('/'), wiki)
}

/// Local paths of the four dumps a run reads
#[derive(Debug, Clone)]
pub struct DumpPaths {
    pub category_links: PathBuf,
    pub lang_links: PathBuf,
    pub pages: PathBuf,
    pub second_pages: PathBuf,
}

impl DumpPaths {
    pub fn in_dir(dir: &Path, primary_wiki: &str, second_wiki: &str) -> Self {
        Self {
            category_links: dir.join(dump_filename(primary_wiki, DumpTable::CategoryLinks)),
            lang_links: dir.join(dump_filename(primary_wiki, DumpTable::LangLinks)),
            pages: dir.join(dump_filename(primary_wiki, DumpTable::Page)),
            second_pages: dir.join(dump_filename(second_wiki, DumpTable::Page)),
        }
    }
}

pub struct RunConfig {
    pub root_category: Option<String>,
    pub dumps: DumpPaths,
    pub output: PathBuf,
    pub threshold: u32,
    pub max_iterations: u32,
    pub second_lang: String,
    /// Hide progress spinners (tests, non-interactive runs)
    pub quiet: bool,
}
