//! `nativemod doctor` command

use std::sync::Arc;

use anyhow::{bail, Result};

use crate::cli::DoctorArgs;
use nativemod::ops::{doctor, format_report, DoctorOptions};
use nativemod::util::Shell;

pub fn execute(args: DoctorArgs, shell: &Arc<Shell>) -> Result<()> {
    let options = DoctorOptions {
        source_dir: Some(args.dir),
        os: args.os,
    };

    let report = doctor(options)?;

    if shell.is_json() {
        let checks: Vec<_> = report
            .checks
            .iter()
            .map(|c| {
                serde_json::json!({
                    "name": c.name,
                    "passed": c.passed,
                    "required": c.required,
                    "message": c.message,
                    "path": c.path,
                })
            })
            .collect();
        shell.json_event(&serde_json::json!({
            "reason": "doctor",
            "passed": report.all_required_passed(),
            "checks": checks,
        }));
    } else {
        print!("{}", format_report(&report, shell.is_verbose()));
    }

    if !report.all_required_passed() {
        bail!("{} required check(s) failed", report.required_failed_count());
    }

    Ok(())
}
