use crate::model::{DutyShift, Roster};
use csv::WriterBuilder;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Export JSON du roster (jolie mise en forme)
pub fn export_roster_json<P: AsRef<Path>>(path: P, roster: &Roster) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(roster)?;
    fs::write(path, s)?;
    Ok(())
}

/// Export CSV des gardes: header `id,kind,date,floor,assignee_id,completed`
pub fn write_duties_csv<W: Write>(writer: W, duties: &[DutyShift]) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(false).from_writer(writer);
    w.write_record(["id", "kind", "date", "floor", "assignee_id", "completed"])?;
    for d in duties {
        let date = d.date.to_string();
        let floor = d.floor.map(|f| f.to_string()).unwrap_or_default();
        w.write_record([
            d.id.as_str(),
            d.kind.as_str(),
            date.as_str(),
            floor.as_str(),
            d.assignee_id.as_str(),
            if d.completed { "true" } else { "false" },
        ])?;
    }
    w.flush()?;
    Ok(())
}

pub fn export_duties_csv<P: AsRef<Path>>(path: P, duties: &[DutyShift]) -> anyhow::Result<()> {
    let file = fs::File::create(path)?;
    write_duties_csv(file, duties)
}
