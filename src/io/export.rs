//! CSV export for the per-slot component table and the per-event table.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::disagg::assemble::{EventRecord, SlotComponentRow};

/// Column header of the long per-slot table.
const SLOT_HEADER: &str = "kind,slot,slot_orig,chg,dch,erg,mc,iteration,nevent,ichg,idch";

/// Column header of the per-event table.
const EVENT_HEADER: &str = "kind,nevent,slot_min,slot_max,iteration,ichg,idch,\
                            comp_ichg,comp_idch,res_ichg,res_idch,\
                            wgt_center_ichg,wgt_center_idch,val_comp_ichg,val_comp_idch,\
                            ichg_final,idch_final,time_diff_icd,ival_comp_net,eval_comp_net,eff";

/// Undefined values are written as empty fields.
fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Exports the per-slot component table to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_slots_csv(rows: &[SlotComponentRow], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_slots_csv(rows, io::BufWriter::new(file))
}

/// Writes the per-slot component table as CSV to any writer.
///
/// Floats are written with full round-trip precision, so identical inputs
/// produce identical bytes.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_slots_csv(rows: &[SlotComponentRow], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SLOT_HEADER.split(','))?;

    for r in rows {
        wtr.write_record(&[
            r.kind.clone(),
            r.slot.to_string(),
            r.slot_orig.to_string(),
            r.chg.to_string(),
            r.dch.to_string(),
            r.erg.to_string(),
            r.mc.to_string(),
            r.iteration.to_string(),
            opt(r.nevent),
            r.ichg.to_string(),
            r.idch.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports the per-event table to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_events_csv(records: &[EventRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_events_csv(records, io::BufWriter::new(file))
}

/// Writes the per-event table as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_events_csv(records: &[EventRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(EVENT_HEADER.split(',').map(str::trim))?;

    for r in records {
        wtr.write_record(&[
            r.kind.clone(),
            r.nevent.to_string(),
            r.slot_min.to_string(),
            r.slot_max.to_string(),
            r.iteration.to_string(),
            r.ichg.to_string(),
            r.idch.to_string(),
            r.comp_ichg.to_string(),
            r.comp_idch.to_string(),
            r.res_ichg.to_string(),
            r.res_idch.to_string(),
            opt(r.wgt_center_ichg),
            opt(r.wgt_center_idch),
            r.val_comp_ichg.to_string(),
            r.val_comp_idch.to_string(),
            r.ichg_final.to_string(),
            r.idch_final.to_string(),
            opt(r.time_diff_icd),
            r.ival_comp_net.to_string(),
            r.eval_comp_net.to_string(),
            r.eff.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
