use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use mc_connect4::{DifficultyConfig, Rules, SearchConfig};

use crate::routes::SessionLimits;

/// HTTP front end for the Monte Carlo Connect Four engine.
#[derive(Debug, Parser)]
#[command(name = "mc-connect4-server", version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "MC4_ADDR", default_value = "0.0.0.0:3000")]
    pub addr: String,

    /// Search worker threads (defaults to the available parallelism)
    #[arg(long, env = "MC4_THREADS")]
    pub threads: Option<usize>,

    /// Abort a search after this many milliseconds
    #[arg(long, env = "MC4_TIME_LIMIT_MS")]
    pub time_limit_ms: Option<u64>,

    /// Playouts per column in a new session's first game
    #[arg(long, env = "MC4_INITIAL_SAMPLES", default_value_t = 35)]
    pub initial_samples: u32,

    /// Directory with the web client
    #[arg(long, env = "MC4_STATIC_DIR", default_value = "web/dist")]
    pub static_dir: PathBuf,

    /// Most sessions kept at once; the least recently used is dropped first
    #[arg(long, env = "MC4_MAX_SESSIONS", default_value_t = 1024)]
    pub max_sessions: usize,

    /// Drop sessions untouched for this many seconds
    #[arg(long, env = "MC4_SESSION_IDLE_SECS", default_value_t = 1800)]
    pub session_idle_secs: u64,
}

impl Cli {
    pub fn rules(&self) -> Rules {
        Rules::default()
    }

    pub fn search_config(&self) -> SearchConfig {
        let defaults = SearchConfig::default();
        SearchConfig {
            threads: self.threads.unwrap_or(defaults.threads).max(1),
            time_limit: self.time_limit_ms.map(Duration::from_millis),
        }
    }

    pub fn difficulty_config(&self) -> DifficultyConfig {
        DifficultyConfig {
            initial_samples: self.initial_samples,
            ..DifficultyConfig::default()
        }
    }

    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            max_sessions: self.max_sessions.max(1),
            idle_timeout: Duration::from_secs(self.session_idle_secs),
        }
    }
}
