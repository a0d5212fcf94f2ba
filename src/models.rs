use crate::config::MISSING;
use std::fmt;

/// `page_id` is filed under `category` (one `categorylinks` tuple)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLink {
    pub page_id: u32,
    pub category: String,
}

/// Leading `(id, namespace, title)` fields of a `page` tuple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRow {
    pub id: u32,
    pub namespace: i32,
    pub title: String,
}

/// Interlanguage link from a primary-edition article to `title` in edition `lang`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangLink {
    pub page_id: u32,
    pub lang: String,
    pub title: String,
}

/// Second-edition `page` tuple with its byte length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizedPage {
    pub namespace: i32,
    pub title: String,
    pub size: u64,
}

/// One line of the final report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub count: u32,
    pub title: String,
    pub second_title: Option<String>,
    pub second_size: Option<u64>,
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut count = itoa::Buffer::new();
        write!(
            f,
            "{} | {} | {} | ",
            count.format(self.count),
            self.title,
            self.second_title.as_deref().unwrap_or(MISSING)
        )?;
        match self.second_size {
            Some(size) => f.write_str(itoa::Buffer::new().format(size)),
            None => f.write_str(MISSING),
        }
    }
}
