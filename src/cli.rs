//! Command-line surface
//!
//! `-h` is taken by `--handle` to match the subscription filter shorthand,
//! so the automatic short help flag is disabled and help stays on `--help`.

use clap::Parser;

use crate::endpoint::{public_base_url, Geo};
use crate::session::Session;

#[derive(Debug, Parser)]
#[command(name = "jetstream")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Emit Jetstream JSON messages to the console, one per line")]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// The collections to subscribe to. If not provided, subscribe to all.
    #[arg(short = 'c', long = "collection")]
    pub collections: Vec<String>,

    /// The DIDs to subscribe to. If not provided, subscribe to all.
    #[arg(short = 'd', long = "did")]
    pub dids: Vec<String>,

    /// The ATProto handles to subscribe to. If not provided, subscribe to all.
    #[arg(short = 'h', long = "handle")]
    pub handles: Vec<String>,

    /// The cursor to start from. If not provided, start from 'now'.
    #[arg(short = 'u', long, default_value_t = 0)]
    pub cursor: u64,

    /// The Jetstream URL to connect to.
    #[arg(long = "url")]
    pub base_url: Option<String>,

    /// The public Jetstream service geography to connect to.
    #[arg(short = 'g', long, value_enum, default_value_t = Geo::UsWest)]
    pub geo: Geo,

    /// The public Jetstream instance number to connect to.
    #[arg(short = 'i', long, default_value_t = 1)]
    pub instance: u32,

    /// Enable Zstandard compression.
    #[arg(long)]
    pub compress: bool,

    /// Print help.
    #[arg(long, action = clap::ArgAction::HelpLong)]
    help: Option<bool>,
}

impl Cli {
    /// Build the subscription session described by these arguments.
    ///
    /// An explicit `--url` wins over the geography/instance default.
    pub fn session(&self) -> Session {
        let base_url = self
            .base_url
            .clone()
            .unwrap_or_else(|| public_base_url(self.geo, self.instance));

        Session {
            base_url,
            collections: self.collections.clone(),
            dids: self.dids.clone(),
            handles: self.handles.clone(),
            cursor: self.cursor,
            compress: self.compress,
        }
    }
}
