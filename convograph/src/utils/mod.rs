//! Shared utilities.
//!
//! Date/time helpers: parsing the export's conversation timestamps and
//! formatting values for Cypher `datetime()` parameters.

pub mod datetime;

pub use datetime::{format_neo4j_datetime, parse_conversation_time, CONVERSATION_TIME_FORMAT};
