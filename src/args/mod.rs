//! CLI argument types and parsing helpers.
mod cli;
pub(crate) mod parsers;
mod types;

#[cfg(test)]
mod test_support;

pub use cli::AgentArgs;
pub use types::PositiveUsize;

#[cfg(test)]
pub(crate) use test_support::parse_test_args;
