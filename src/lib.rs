//! Interwiki: find Wikipedia articles with many interlanguage links
//!
//! Streams the SQL dumps of one wiki and reports every article linked from at
//! least a threshold number of other language editions, together with its
//! title and article size in a second edition:
//!
//! 1. **Category closure** (optional) -- Expand a root category into the pages
//!    of its subcategory tree, descending a bounded number of levels
//! 2. **Link counting** -- Tally `langlinks` rows per article and note the
//!    second-edition title
//! 3. **Size lookup** -- Match second-edition titles against that edition's
//!    `page` dump to find article sizes
//! 4. **Title lookup** -- Resolve counted article ids to their titles
//! 5. **Report** -- Join everything into rows sorted by link count
//!
//! Every stage reads its dump once, front to back, one line at a time, and
//! hands its result to the next stage as a plain value.
//!
//! # Key Modules
//!
//! - [`parser`] -- Tuple tokenizer and streaming dump scanner (gzip/bzip2)
//! - [`closure`] -- Bounded breadth-first category expansion
//! - [`langlinks`] -- Interlanguage link counting with threshold detection
//! - [`sizes`] -- Second-edition article sizes by title
//! - [`titles`] -- Primary-edition article titles by id
//! - [`report`] -- Row assembly and report file output
//! - [`pipeline`] -- Runs the stages in order
//! - [`fetch`] -- Locates or downloads the dumps
//! - [`models`] -- Row types for each dump
//! - [`stats`] -- Run summary counters
//! - [`config`] -- Constants and run configuration
//!
//! # Example Usage
//!
//! ```bash
//! # All articles with at least 49 interlanguage links
//! interwiki --dump-dir dumps/
//!
//! # Only articles under Category:Sports, three levels deep
//! interwiki Sports --dump-dir dumps/ --iterations 3 -o sports.txt
//! ```

pub mod closure;
pub mod config;
pub mod fetch;
pub mod langlinks;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod sizes;
pub mod stats;
pub mod titles;
