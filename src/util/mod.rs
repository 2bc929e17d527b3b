//! Utility functions for common operations.
//!
//! - **Text processing**: markup stripping and entity decoding for feed text
//!
//! # Examples
//!
//! ```
//! use ubuntu_tales::util::clean_html;
//!
//! let title = clean_html(Some("<b>The Lion &amp; the Hare</b>"));
//! assert_eq!(title, "The Lion & the Hare");
//! ```

mod text;

pub use text::clean_html;
