use clap::Parser;

use crate::error::{AppError, AppResult};

use super::AgentArgs;

pub(crate) fn parse_test_args<I, T>(args: I) -> AppResult<AgentArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    AgentArgs::try_parse_from(args).map_err(AppError::from)
}
