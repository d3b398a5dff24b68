use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cern", version, about = "Chat with Cern from the terminal")]
pub struct Cli {
    /// Base URL of the Cern API server.
    #[arg(long, global = true, env = "CERN_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// File holding the session id between runs (defaults to the platform data dir).
    #[arg(long, global = true, env = "CERN_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive chat; `/thought N` toggles reasoning, `/reset` starts over, `/quit` exits.
    Chat,

    /// Send a single prompt and print the reply.
    Send {
        /// The prompt text.
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,

        /// Also print the reasoning behind the reply.
        #[arg(long)]
        thought: bool,
    },

    /// Forget the stored session id.
    Reset,

    /// Print version information.
    Version,
}
