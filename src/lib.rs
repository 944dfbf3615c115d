//! Bolt - REST query broker over relational and wide-column table stores
//!
//! Requests arrive either as a structured JSON query document or as
//! ad-hoc filter parameters, are translated into backend queries, and the
//! typed rows that come back are serialized into one uniform JSON shape.

pub mod engine;
