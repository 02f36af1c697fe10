//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use std::io;
use vsaudit_types::{snapshot::UNKNOWN_AGE_DAYS, AuditReport, Classification, FlattenedSnapshot};

/// Which part of the report a command asked for
#[derive(Debug, Clone, Copy)]
pub enum ReportScope {
    Full,
    Orphans,
    Snapshots,
}

/// Output renderer for CLI results
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Snapshots at least this old are highlighted
    age_warning_days: i64,
}

impl OutputRenderer {
    pub fn new(json_output: bool, age_warning_days: i64) -> Self {
        Self {
            json_output,
            age_warning_days,
        }
    }

    /// Render the audit report for the requested scope
    pub fn render(&self, report: &AuditReport, scope: ReportScope) -> io::Result<()> {
        if self.json_output {
            return self.render_json(report, scope);
        }
        match scope {
            ReportScope::Full => {
                self.render_classifications(report);
                self.render_snapshots(&report.snapshots);
                self.render_coverage(report);
            }
            ReportScope::Orphans => {
                self.render_classifications(report);
                self.render_coverage(report);
            }
            ReportScope::Snapshots => self.render_snapshots(&report.snapshots),
        }
        Ok(())
    }

    fn render_json(&self, report: &AuditReport, scope: ReportScope) -> io::Result<()> {
        let value = match scope {
            ReportScope::Full => serde_json::to_value(report),
            ReportScope::Orphans => {
                serde_json::to_value(report.orphans().collect::<Vec<_>>())
            }
            ReportScope::Snapshots => serde_json::to_value(&report.snapshots),
        }
        .map_err(io::Error::other)?;
        println!(
            "{}",
            serde_json::to_string_pretty(&value).map_err(io::Error::other)?
        );
        Ok(())
    }

    fn render_classifications(&self, report: &AuditReport) {
        let orphans: Vec<_> = report
            .classifications
            .iter()
            .filter(|r| {
                matches!(
                    r.status,
                    Classification::Orphaned | Classification::UnregisteredOwned
                )
            })
            .collect();

        if orphans.is_empty() {
            println!("No orphaned disk files found.");
        } else {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    Cell::new("Path").add_attribute(Attribute::Bold),
                    Cell::new("Size").add_attribute(Attribute::Bold),
                    Cell::new("Status").add_attribute(Attribute::Bold),
                    Cell::new("Reason").add_attribute(Attribute::Bold),
                    Cell::new("Confidence").add_attribute(Attribute::Bold),
                ]);
            for record in &orphans {
                let status = Cell::new(record.status.as_str());
                let status = if record.status == Classification::Orphaned {
                    status.fg(Color::Red)
                } else {
                    status.fg(Color::Yellow)
                };
                table.add_row(vec![
                    Cell::new(&record.file.full_path),
                    Cell::new(format_size(record.file.size_bytes)),
                    status,
                    Cell::new(&record.reason_code),
                    Cell::new(confidence_label(record)),
                ]);
            }
            println!("{table}");
        }

        let in_use = count(report, Classification::InUse);
        let template = count(report, Classification::TemplateOwned);
        println!(
            "{} file(s) examined: {in_use} in use, {template} template-owned, {} orphaned, {} unregistered",
            report.classifications.len(),
            count(report, Classification::Orphaned),
            count(report, Classification::UnregisteredOwned),
        );
        println!();
    }

    fn render_snapshots(&self, snapshots: &[FlattenedSnapshot]) {
        if snapshots.is_empty() {
            println!("No snapshots found.");
            println!();
            return;
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("VM").add_attribute(Attribute::Bold),
                Cell::new("Snapshot").add_attribute(Attribute::Bold),
                Cell::new("Created").add_attribute(Attribute::Bold),
                Cell::new("Age").add_attribute(Attribute::Bold),
                Cell::new("State").add_attribute(Attribute::Bold),
            ]);
        for snap in snapshots {
            let created = snap
                .created_at
                .map_or_else(|| "unknown".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
            let age = Cell::new(format_age(snap));
            let age = if snap.age_days >= self.age_warning_days {
                age.fg(Color::Red)
            } else {
                age
            };
            table.add_row(vec![
                Cell::new(&snap.vm_name),
                Cell::new(&snap.name),
                Cell::new(created),
                age,
                Cell::new(&snap.state),
            ]);
        }
        println!("{table}");
        println!(
            "{} snapshot(s), oldest first. Ages of {} day(s) or more are highlighted.",
            snapshots.len(),
            self.age_warning_days
        );
        println!();
    }

    fn render_coverage(&self, report: &AuditReport) {
        let cov = &report.coverage;
        println!(
            "Coverage: {} VM(s) visited ({} skipped), {} datastore(s) scanned ({} skipped), {} helper file(s) excluded",
            cov.vms_visited,
            cov.vms_skipped,
            cov.datastores_scanned,
            cov.datastores_skipped,
            cov.dependent_files_excluded,
        );
    }
}

fn count(report: &AuditReport, status: Classification) -> usize {
    report
        .classifications
        .iter()
        .filter(|r| r.status == status)
        .count()
}

fn confidence_label(record: &vsaudit_types::ClassificationRecord) -> &'static str {
    match record.confidence {
        vsaudit_types::Confidence::Definite => "definite",
        vsaudit_types::Confidence::Heuristic => "heuristic",
    }
}

fn format_size(bytes: i64) -> String {
    const KIB: f64 = 1024.0;
    #[allow(clippy::cast_precision_loss)]
    let bytes = bytes as f64;
    if bytes >= KIB * KIB * KIB {
        format!("{:.1} GiB", bytes / (KIB * KIB * KIB))
    } else if bytes >= KIB * KIB {
        format!("{:.1} MiB", bytes / (KIB * KIB))
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes / KIB)
    } else {
        format!("{bytes:.0} B")
    }
}

fn format_age(snap: &FlattenedSnapshot) -> String {
    if snap.age_days == UNKNOWN_AGE_DAYS {
        "unknown".to_string()
    } else {
        format!("{}d {}h", snap.age_days, snap.age_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_pick_a_readable_unit() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MiB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GiB");
    }
}
