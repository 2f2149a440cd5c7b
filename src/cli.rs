use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "zipstream")]
#[command(version)]
#[command(about = "Validate and inspect the trailer of a ZIP64 archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipstream package.appx         print the central directory location\n  \
  zipstream -l package.appx      list entries\n  \
  RUST_LOG=trace zipstream big.zip   trace every decoded field")]
pub struct Cli {
    /// ZIP64 archive path
    #[arg(value_name = "FILE")]
    pub file: String,

    /// List entries (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely with sizes, method and timestamps
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Log each parsing step to stderr
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    pub fn is_listing(&self) -> bool {
        self.list || self.verbose
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "warn" }
    }
}
