//! # scrapestack
//!
//! Example-driven web scraping: show the scraper a value from a page once,
//! and it learns a structural rule it can reapply to other pages with the
//! same or similar layout.
//!
//! Each learned rule (a [`Stack`]) records the ancestor path of the example
//! match (tag names plus discriminating `class`/`id` signatures) along with
//! how to extract the value: text, direct-only text, or an attribute,
//! optionally resolved against a base URL.
//!
//! ## Quick Start
//!
//! ```
//! use scrapestack::{BuildOptions, Document, ResultOptions, Scraper, Wanted};
//!
//! let training = Document::parse(
//!     "<ul><li class='title'>First Post</li><li class='title'>Second Post</li></ul>",
//! );
//!
//! let mut scraper = Scraper::new();
//! let found = scraper
//!     .build(&training, &Wanted::list(["First Post"]), &BuildOptions::new())
//!     .unwrap();
//! assert!(found.contains(&"First Post".to_string()));
//!
//! // Reapply the learned rules to a structurally similar page
//! let page = Document::parse(
//!     "<ul><li class='title'>Fresh Post</li><li class='title'>Another</li></ul>",
//! );
//! let titles = scraper.get_result_similar(&page, &ResultOptions::new()).unwrap();
//! assert_eq!(titles, vec!["Fresh Post", "Another"]);
//! ```
//!
//! ## Persistence
//!
//! A rule set saves to a stable JSON file ([`Scraper::save`]) and loads back
//! with ids, hashes, and aliases intact ([`Scraper::load`]); files from the
//! older bare-array format load too.

pub mod dom;
pub mod error;
pub mod learn;
pub mod locate;
pub(crate) mod persist;
pub mod scraper;
pub mod stack;
pub mod text;

pub use dom::{Document, NodeId};
pub use error::{Error, Result};
pub use learn::{BuildOptions, Wanted};
pub use locate::ResultOptions;
pub use scraper::Scraper;
pub use stack::{Stack, StackEntry};
pub use text::{FuzzyText, Target, normalize, similarity_ratio, text_match};
