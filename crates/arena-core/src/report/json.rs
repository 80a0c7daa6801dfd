use crate::model::ExecutionSummary;
use std::io::Write;
use std::path::Path;

/// Write `value` as pretty JSON, replacing `out` atomically.
pub fn write_json_atomic<T: serde::Serialize>(value: &T, out: &Path) -> anyhow::Result<()> {
    let dir = match out.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(serde_json::to_string_pretty(value)?.as_bytes())?;
    tmp.flush()?;
    tmp.persist(out).map_err(|e| e.error)?;
    Ok(())
}

pub fn write_summary_json(summary: &ExecutionSummary, out: &Path) -> anyhow::Result<()> {
    write_json_atomic(summary, out)
}
