// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use std::io::Write;

use cern_api_client::{
    ApiClient, FileSessionStorage, SessionManager, SessionStorage, SubmitOutcome, TranscriptRole,
};
use clap::Parser;
use cli::{Cli, Commands};
use repl::{Input, parse_input, render_entry};
use tokio::io::{AsyncBufReadExt, BufReader};

mod cli;
mod logging;
mod repl;

type Manager = SessionManager<ApiClient, FileSessionStorage>;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = run().await {
        log::error!("{}", e);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    logging::init()?;

    let args = Cli::parse();

    let storage = match &args.session_file {
        Some(path) => FileSessionStorage::new(path),
        None => FileSessionStorage::with_default_path()?,
    };

    match &args.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
        Commands::Reset => {
            storage.clear()?;
            println!("Session cleared.");
        }
        Commands::Send { prompt, thought } => {
            let mgr = SessionManager::new(ApiClient::new(&args.api_url)?, storage);
            mgr.restore_session();
            send_once(&mgr, &prompt.join(" "), *thought).await?;
        }
        Commands::Chat => {
            let mgr = SessionManager::new(ApiClient::new(&args.api_url)?, storage);
            mgr.restore_session();
            chat(&mgr).await?;
        }
    }

    Ok(())
}

async fn send_once(mgr: &Manager, prompt: &str, show_thought: bool) -> Result<()> {
    if mgr.submit_turn(prompt).await == SubmitOutcome::Skipped {
        return Err(Error::Custom("prompt is empty".to_string()));
    }

    let transcript = mgr.transcript();
    if let Some(reply) = transcript.last() {
        println!("{}", reply.content);
        if show_thought && let Some(thought) = &reply.thought {
            println!("\nCern's Thought Process: {thought}");
        }
    }
    Ok(())
}

async fn chat(mgr: &Manager) -> Result<()> {
    for (i, entry) in mgr.transcript().iter().enumerate() {
        println!("{}", render_entry(i, entry));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Reset => {
                mgr.forget_session();
                println!("Session cleared; the next message starts a new conversation.");
            }
            Input::Thought(index) => match mgr.toggle_explanation(index) {
                Some(_) => {
                    if let Some(entry) = mgr.transcript().get(index) {
                        println!("{}", render_entry(index, entry));
                    }
                }
                None => println!("No thought attached to entry {index}."),
            },
            Input::Unknown(cmd) => {
                println!("Unknown command {cmd}. Try /thought N, /reset or /quit.");
            }
            Input::Prompt(text) => {
                let before = mgr.transcript().len();
                mgr.submit_turn(text).await;
                for (i, entry) in mgr.transcript().iter().enumerate().skip(before) {
                    if entry.role == TranscriptRole::Cern {
                        println!("{}", render_entry(i, entry));
                    }
                }
            }
        }
    }

    Ok(())
}
