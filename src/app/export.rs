use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::AppResult;
use crate::metrics::AggregateReport;

pub(crate) async fn export_json(path: &str, report: &AggregateReport) -> AppResult<()> {
    let json = serde_json::to_vec_pretty(report)?;
    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&json).await?;
    writer.flush().await?;
    Ok(())
}
