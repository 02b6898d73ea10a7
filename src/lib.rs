//! Run hierarchical collections of HTTP requests.
//!
//! A [`Collection`] executes its children in order and stops at the first
//! one that does not succeed. Each message brackets its work with `pre` and
//! `post` hooks that always run. After a run, [`execute_summary`] flattens
//! the leaf results into path-numbered entries.

pub mod collection;
pub mod error;
pub mod message;
pub mod parser;
pub mod summary;
pub mod test_request;
pub mod transport;

pub use collection::Collection;
pub use error::{Error, Result};
pub use message::{Message, Outcome};
pub use parser::{parse_http_file, parse_http_str};
pub use summary::{execute_summary, render_table, Status, SummaryEntry};
pub use test_request::TestRequest;
pub use transport::{Body, HyperTransport, RequestOptions, Response, Transport};
