//! `xapian-bridge doctor` command

use anyhow::Result;

use xapian_bridge::ops::{doctor, format_report};

pub fn execute(verbose: bool) -> Result<()> {
    let (ctx, _config) = super::load_context(verbose)?;
    let report = doctor(&ctx)?;

    print!("{}", format_report(&report, verbose));

    // Exit with error code if required checks failed
    if !report.all_required_passed() {
        std::process::exit(1);
    }

    Ok(())
}
