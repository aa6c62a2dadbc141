//! # ruleset-docs
//!
//! Turns a tree of rule-set XML files into documentation: one Markdown page
//! per rule-set, an index page, a merged rule-set file, and a menu spliced
//! into a site descriptor.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! ```text
//! 1. Scan      rulesets/  →  entries           (directory walk, deterministic order)
//! 2. Convert   entries    →  <target>/*/*.md   (analyze + escape + ruleset-to-docs)
//! 3. Site      entries    →  merged, index,    (merge-ruleset, generate-index,
//!                            site descriptor    create-ruleset-menu, add-to-site-descriptor)
//! ```
//!
//! The first error aborts the run. Nothing is retried.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: walks the rules directory and returns [`types::RulesetEntry`] values |
//! | [`convert`] | Stage 2: per-file analysis, escaping and page rendering |
//! | [`site`] | Stage 3: merged rule-set, index page, site menu |
//! | [`pipeline`] | Runs all stages; builds engines from config |
//! | [`transform`] | [`transform::Transformer`] trait, native and `xsltproc` engines |
//! | [`analyzer`] | [`analyzer::RuleAnalyzer`] trait, no-op and catalog analyzers |
//! | [`backbone`] | The `<rulesets>` document listing every rule-set |
//! | [`xml`] | Owned XML tree on top of `quick-xml` |
//! | [`config`] | Layered `ruleset-docs.toml` loading and validation |
//! | [`naming`] | Category, page path, link and anchor naming |
//! | [`types`] | Types shared between stages |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Swappable Transform Engine
//!
//! Every output is produced by one call to [`transform::Transformer`] with a
//! named template. The native engine needs no external tools; the `xsltproc`
//! engine runs real XSLT stylesheets for sites that already maintain them.
//! Tests use a recording mock.
//!
//! ## Escape Once, Before Rendering
//!
//! Example and XPath text is entity-escaped (`&` then `<`) in the parsed
//! document right before the page transform, exactly once per node. Pages
//! put that text in `<pre>` blocks, which display it as written.
//!
//! ## Scoped Temp Files
//!
//! The menu fragment and the updated site descriptor go through
//! `tempfile::NamedTempFile`s, so they are deleted on every exit path.

pub mod analyzer;
pub mod backbone;
pub mod config;
pub mod convert;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod scan;
pub mod site;
pub mod transform;
pub mod types;
pub mod xml;

#[cfg(test)]
pub(crate) mod test_helpers;
