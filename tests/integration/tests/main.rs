//! End-to-end tests for the query element.
//!
//! Every test drives [`ldq_query::LdapQueryElement`] through its public
//! surface: configuration text in, process data out, with a replay
//! directory standing in for the server.

mod common;
mod concurrency;
mod pipeline;
mod release;
