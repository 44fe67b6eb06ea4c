//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// xapian-bridge - build the native bridge to the Xapian search engine
#[derive(Parser)]
#[command(name = "xapian-bridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the compile/link flags for the bridge
    Flags(FlagsArgs),

    /// Splice the flags into the bridge template and build it
    Setup(SetupArgs),

    /// Check the build environment
    Doctor,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Where the native flags come from.
#[derive(Args, Debug, Clone)]
pub struct CoreArgs {
    /// xapian-core build or install tree
    #[arg(long, value_name = "DIR", conflicts_with = "with_core")]
    pub core: Option<PathBuf>,

    /// Use flags computed by an outer build system
    #[arg(long, requires = "libs")]
    pub with_core: bool,

    /// Compile flags for --with-core
    #[arg(long, value_name = "FLAGS", allow_hyphen_values = true, default_value = "")]
    pub cxxflags: String,

    /// Link flags for --with-core
    #[arg(long, value_name = "FLAGS", allow_hyphen_values = true)]
    pub libs: Option<String>,

    /// Read the build tree directly or ask pkg-config about the install
    #[arg(long, value_enum, default_value_t = StageArg::Build)]
    pub stage: StageArg,

    /// Exact path of the package metadata descriptor
    #[arg(long, value_name = "FILE")]
    pub pc_file: Option<PathBuf>,

    /// Generated configuration header (defaults to <core>/config.h)
    #[arg(long, value_name = "FILE")]
    pub config_header: Option<PathBuf>,

    /// Package name used to pick between several descriptors
    #[arg(long)]
    pub package: Option<String>,

    /// Extra C++ compiler flag (repeatable)
    #[arg(long = "extra-cxxflag", value_name = "FLAG", allow_hyphen_values = true)]
    pub extra_cxxflags: Vec<String>,

    /// Extra preprocessor flag (repeatable)
    #[arg(long = "extra-cppflag", value_name = "FLAG", allow_hyphen_values = true)]
    pub extra_cppflags: Vec<String>,

    /// Extra linker flag (repeatable)
    #[arg(long = "extra-ldflag", value_name = "FLAG", allow_hyphen_values = true)]
    pub extra_ldflags: Vec<String>,

    /// Minimum xapian-core version
    #[arg(long, value_name = "VERSION")]
    pub min_version: Option<semver::Version>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageArg {
    Build,
    Install,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleArg {
    /// `NAME = flags` makefile assignments
    Make,
    /// `#cgo NAME: flags` directives
    Cgo,
}

#[derive(Args)]
pub struct FlagsArgs {
    #[command(flatten)]
    pub core: CoreArgs,

    /// Show compile flags only
    #[arg(long, conflicts_with = "link")]
    pub compile: bool,

    /// Show link flags only
    #[arg(long)]
    pub link: bool,

    /// Print the full flag set as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct SetupArgs {
    #[command(flatten)]
    pub core: CoreArgs,

    /// Directory holding Makefile.in and the bridge sources
    #[arg(long, value_name = "DIR", default_value = "bridge")]
    pub source_dir: PathBuf,

    /// Output directory (defaults to .xapian-bridge/bridge)
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Directive style of the spliced lines
    #[arg(long, value_enum, default_value_t = StyleArg::Make)]
    pub style: StyleArg,

    /// Only splice and copy, don't run make
    #[arg(long)]
    pub no_build: bool,

    /// Rebuild even when nothing changed
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
