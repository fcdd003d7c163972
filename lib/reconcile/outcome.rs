use super::types::RunReport;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FATAL: u8 = 1;
pub const EXIT_PARTIAL_FAILURE: u8 = 2;

/// End-of-run console output and process status for a run that reached `Done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub exit_code: u8,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

pub fn summarize(report: &RunReport) -> RunSummary {
    if !report.is_complete() {
        return RunSummary {
            exit_code: EXIT_PARTIAL_FAILURE,
            stdout: Vec::new(),
            stderr: vec![format!(
                "The following page ID(s) could not be updated: {}",
                report.failed_ids().join(", ")
            )],
        };
    }

    let first = report.high_water_mark + 1;
    let mut stdout = Vec::new();
    if report.candidates == 0 {
        stdout.push("No tickets to update.".to_string());
    } else if report.assignments.dry_run {
        stdout.extend(
            report
                .assignments
                .assigned
                .iter()
                .map(|assignment| format!("{} -> {}", assignment.page_id, assignment.number)),
        );
        stdout.push(format!(
            "Dry run: {} ticket(s) would be numbered starting at {first}.",
            report.numbered()
        ));
    } else {
        let last = report
            .assignments
            .assigned
            .last()
            .map_or(report.high_water_mark, |assignment| assignment.number);
        stdout.push(format!(
            "Numbered {} ticket(s), {first} through {last}.",
            report.numbered()
        ));
    }

    RunSummary {
        exit_code: EXIT_SUCCESS,
        stdout,
        stderr: Vec::new(),
    }
}
