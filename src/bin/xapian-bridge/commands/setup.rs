//! `xapian-bridge setup` command

use anyhow::Result;

use crate::cli::{SetupArgs, StyleArg};
use xapian_bridge::builder::DirectiveStyle;
use xapian_bridge::ops::{setup, SetupOptions};
use xapian_bridge::util::diagnostic::{emit, suggestions, Diagnostic};

pub fn execute(args: SetupArgs, color: bool) -> Result<()> {
    let (ctx, config) = super::load_context(false)?;
    let request = super::flag_request(&args.core, &ctx, &config)?;

    let options = SetupOptions {
        request,
        source_dir: ctx.resolve(&args.source_dir),
        out_dir: args
            .out_dir
            .as_deref()
            .map(|dir| ctx.resolve(dir))
            .unwrap_or_else(|| ctx.default_out_dir()),
        style: match args.style {
            StyleArg::Make => DirectiveStyle::Make,
            StyleArg::Cgo => DirectiveStyle::Cgo,
        },
        no_build: args.no_build,
        force: args.force,
    };

    let result = setup(&options)?;

    println!("Wrote {}", result.makefile.display());
    if result.rebuilt {
        println!("Built {}", result.library.display());
    } else if !options.no_build {
        println!("Up to date: {}", result.library.display());
    }
    if options.no_build {
        let warning = Diagnostic::warning("the bridge library was not built (--no-build)")
            .with_location(options.out_dir.clone())
            .with_suggestion(suggestions::BRIDGE_LIBRARY);
        emit(&warning, color);
    } else {
        println!(
            "help: export {}={}",
            xapian_bridge::util::config::LIBRARY_ENV,
            result.library.display()
        );
    }

    Ok(())
}
