use std::time::Duration;

/// Counters collected over one run, printed at the end
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    /// Pages in the category closure, `None` for an unfiltered run
    pub closure_pages: Option<usize>,
    pub subcategories: usize,
    pub closure_iterations: u32,
    pub closure_truncated: bool,
    pub links_seen: u64,
    pub links_counted: u64,
    pub articles_found: usize,
    pub second_titles: usize,
    pub sizes_resolved: usize,
    pub titles_resolved: usize,
    pub titles_skipped: u64,
    pub rows_written: usize,
    pub closure_time: Duration,
    pub counting_time: Duration,
    pub lookup_time: Duration,
}

impl RunSummary {
    pub fn total_time(&self) -> Duration {
        self.closure_time + self.counting_time + self.lookup_time
    }

    pub fn print(&self) {
        println!();
        println!("=== Summary ===");
        if let Some(pages) = self.closure_pages {
            println!("Closure pages:      {}", pages);
            println!("Subcategories:      {}", self.subcategories);
            println!(
                "Iterations:         {}{}",
                self.closure_iterations,
                if self.closure_truncated { " (capped)" } else { "" }
            );
            println!("Closure time:       {:.2}s", self.closure_time.as_secs_f64());
        }
        println!("Links seen:         {}", self.links_seen);
        println!("Links counted:      {}", self.links_counted);
        println!("Articles found:     {}", self.articles_found);
        println!("Second titles:      {}", self.second_titles);
        println!("Sizes resolved:     {}", self.sizes_resolved);
        println!("Titles resolved:    {}", self.titles_resolved);
        println!("Skipped titles:     {}", self.titles_skipped);
        println!("Rows written:       {}", self.rows_written);
        println!("Counting time:      {:.2}s", self.counting_time.as_secs_f64());
        println!("Lookup time:        {:.2}s", self.lookup_time.as_secs_f64());
        println!("Total time:         {:.2}s", self.total_time().as_secs_f64());
    }
}
