//! Terminal text helpers for the CLI's tabular output.
//!
//! ```
//! use curio::util::{display_width, pad_to_width};
//!
//! assert_eq!(display_width("Patch"), 5);
//! assert_eq!(pad_to_width("Patch", 8), "Patch   ");
//! ```

mod text;

pub use text::{display_width, pad_to_width, strip_control_chars, truncate_to_width};
