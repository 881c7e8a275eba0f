use clap::{ArgAction, ArgGroup, Parser};
use tracing::Level;

use crate::runtime::{VmConfig, DEFAULT_HEAP_CAPACITY, MAX_CALL_DEPTH};

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
#[clap(group(ArgGroup::new("input").required(true).args(&["file", "demo"])))]
pub struct Config {
    /// Assembly file to run
    pub file: Option<String>,

    /// Run the built in demo program instead of a file
    #[clap(long)]
    pub demo: bool,

    /// Address execution starts at
    #[clap(short, long, default_value_t = 0)]
    pub entry: usize,

    /// Number of objects that may be live at once
    #[clap(long, default_value_t = DEFAULT_HEAP_CAPACITY)]
    pub heap_capacity: usize,

    /// Deepest call depth a CALL may enter
    #[clap(long, default_value_t = MAX_CALL_DEPTH)]
    pub max_depth: usize,

    /// Print the decoded program instead of running it
    #[clap(short, long)]
    pub disassemble: bool,

    /// Print the machine state to stderr once the run stops
    #[clap(long)]
    pub dump: bool,

    /// Disable terminal colors in errors and dumps
    #[clap(long)]
    pub no_color: bool,

    /// Log more (-v info, -vv debug, -vvv every instruction)
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Config {
    pub fn vm_config(&self) -> VmConfig {
        VmConfig::default()
            .with_heap_capacity(self.heap_capacity)
            .with_max_call_depth(self.max_depth)
    }

    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    pub fn colored(&self) -> bool {
        !self.no_color
    }
}

impl TryFrom<Vec<&str>> for Config {
    type Error = String;
    fn try_from(args: Vec<&str>) -> Result<Self, Self::Error> {
        match Config::try_parse_from(args) {
            Ok(config) => Ok(config),
            Err(e) => Err(e.to_string()),
        }
    }
}
