//! Command implementations

pub mod completions;
pub mod doctor;
pub mod flags;
pub mod setup;

use anyhow::{bail, Result};

use crate::cli::{CoreArgs, StageArg};
use xapian_bridge::builder::{CoreMode, FlagRequest, Stage};
use xapian_bridge::util::{Config, GlobalContext};

/// Build a flag request from the command line, falling back to config.
pub fn flag_request(args: &CoreArgs, ctx: &GlobalContext, config: &Config) -> Result<FlagRequest> {
    let mode = if args.with_core {
        CoreMode::WithCore {
            cxxflags: args.cxxflags.clone(),
            libs: args.libs.clone().unwrap_or_default(),
        }
    } else {
        let core_dir = match (&args.core, &config.core.source_dir) {
            (Some(dir), _) | (None, Some(dir)) => ctx.resolve(dir),
            (None, None) => bail!(
                "no xapian-core tree given\n\
                 help: pass --core <DIR>, set [core] source_dir in .xapian-bridge/config.toml, \
                 or use --with-core"
            ),
        };
        let stage = match args.stage {
            StageArg::Build => Stage::Build,
            StageArg::Install => Stage::Install,
        };
        CoreMode::WithoutCore { core_dir, stage }
    };

    let mut request = FlagRequest::from_config(mode, config);
    if let Some(path) = &args.pc_file {
        request.pc_file = Some(ctx.resolve(path));
    } else if let Some(path) = request.pc_file.take() {
        request.pc_file = Some(ctx.resolve(&path));
    }
    if let Some(path) = &args.config_header {
        request.config_header = Some(ctx.resolve(path));
    }
    if let Some(package) = &args.package {
        request.package = package.clone();
    }
    request.extra_cxxflags.extend(args.extra_cxxflags.iter().cloned());
    request.extra_cppflags.extend(args.extra_cppflags.iter().cloned());
    request.extra_ldflags.extend(args.extra_ldflags.iter().cloned());
    request.min_version = args.min_version.clone();

    Ok(request)
}

/// Context and merged configuration for the current directory.
pub fn load_context(verbose: bool) -> Result<(GlobalContext, Config)> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(verbose);
    let config = ctx.load_config();
    Ok((ctx, config))
}
