mod agent;
mod app;
mod args;
mod config;
mod entry;
mod error;
mod metrics;
mod shutdown;
mod system;

use error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
