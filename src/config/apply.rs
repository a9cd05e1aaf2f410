use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{AgentArgs, PositiveUsize};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

fn ensure_positive_usize(value: usize, field: &str) -> AppResult<PositiveUsize> {
    PositiveUsize::try_from(value).map_err(|_err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
        })
    })
}

/// Applies configuration values to CLI arguments.
///
/// Values given on the command line always win over the file.
///
/// # Errors
///
/// Returns an error when a config value is invalid.
pub fn apply_config(
    args: &mut AgentArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "url")
        && let Some(url) = config.url.clone()
    {
        args.url = Some(url);
    }

    if !is_cli(matches, "workers")
        && let Some(workers) = config.workers
    {
        args.workers = ensure_positive_usize(workers, "workers")?;
    }

    if !is_cli(matches, "duration")
        && let Some(duration) = config.duration.as_ref()
    {
        args.duration = Some(duration.to_duration().map_err(|err| {
            AppError::config(ConfigError::InvalidDuration {
                field: "duration",
                source: err,
            })
        })?);
    }

    if !is_cli(matches, "max_actions")
        && let Some(max_actions) = config.max_actions
    {
        args.max_actions = Some(ensure_positive_usize(max_actions, "max_actions")?);
    }

    if !is_cli(matches, "seed")
        && let Some(seed) = config.seed
    {
        args.seed = Some(seed);
    }

    if !is_cli(matches, "token")
        && let Some(token) = config.token.clone()
    {
        args.token = token;
    }

    if !is_cli(matches, "invalid_token")
        && let Some(token) = config.invalid_token.clone()
    {
        args.invalid_token = token;
    }

    if !is_cli(matches, "auth_header")
        && let Some(header) = config.auth_header.clone()
    {
        args.auth_header = header;
    }

    if !is_cli(matches, "blob_sizes")
        && let Some(sizes) = config.blob_sizes.as_ref()
    {
        args.blob_sizes = sizes
            .to_sizes()
            .map_err(|err| AppError::config(ConfigError::InvalidBlobSizes { source: err }))?;
    }

    if !is_cli(matches, "request_timeout")
        && let Some(timeout) = config.timeout.as_ref()
    {
        args.request_timeout = timeout.to_duration().map_err(|err| {
            AppError::config(ConfigError::InvalidDuration {
                field: "timeout",
                source: err,
            })
        })?;
    }

    if !is_cli(matches, "negative_auth")
        && let Some(negative_auth) = config.negative_auth
    {
        args.negative_auth = negative_auth;
    }

    if !is_cli(matches, "export_json")
        && let Some(path) = config.export_json.clone()
    {
        args.export_json = Some(path);
    }

    if !is_cli(matches, "verbose")
        && let Some(verbose) = config.verbose
    {
        args.verbose = verbose;
    }

    if !is_cli(matches, "no_color")
        && let Some(no_color) = config.no_color
    {
        args.no_color = no_color;
    }

    Ok(())
}
