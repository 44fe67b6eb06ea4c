//! `xapian-bridge flags` command

use anyhow::Result;

use crate::cli::FlagsArgs;
use xapian_bridge::builder::assemble;

pub fn execute(args: FlagsArgs) -> Result<()> {
    let (ctx, config) = super::load_context(false)?;
    let request = super::flag_request(&args.core, &ctx, &config)?;
    let flags = assemble(&request)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&flags)?);
        return Ok(());
    }

    if !args.link {
        println!("{}", flags.include_flags);
    }
    if !args.compile {
        println!("{}", flags.link_flags);
    }

    Ok(())
}
