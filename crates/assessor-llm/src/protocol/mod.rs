//! Wire format types for the upstream model API

pub mod anthropic;
