//! 데이터셋 인덱스 읽기 명령어.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use trader_data::{DatasetIndex, TimeSeriesDataset};

/// `index` 문자열(`5m`, `5m:close`, `5m:open,close`)로 읽어 앞 `limit`개 행을 CSV로 씁니다.
///
/// 반환값은 출력한 행 수입니다.
pub fn read_dataset<W: io::Write>(
    path: &Path,
    index: &str,
    limit: Option<usize>,
    out: W,
) -> Result<usize> {
    let index = DatasetIndex::parse(index)?;
    let dataset = TimeSeriesDataset::open(path)
        .with_context(|| format!("Failed to open dataset at {}", path.display()))?;

    let mut table = dataset
        .read(index.clone())
        .with_context(|| format!("Failed to read {}", index))?;
    if let Some(n) = limit {
        table = table.head(n);
    }

    table.write_csv(out)?;
    Ok(table.num_rows())
}
