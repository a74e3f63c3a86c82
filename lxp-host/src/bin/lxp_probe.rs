//! lxp-probe - exercise a running lxp-host from the command line
//!
//! `resolve` runs the launcher's entry-point discovery against a hosted
//! course. `play` acts as a course: it opens a SCORM session, sets values
//! and finishes, with every write going through the same fire-and-forget
//! path the launcher uses.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lxp_common::scorm::{resolve_entry_point, EntrySource, ScormRuntime, SessionContext};
use lxp_host::client::{HttpProbe, HttpProgressSink};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lxp-probe")]
#[command(about = "Entry-point resolution and SCORM session replay against lxp-host")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the entry point a launcher would load
    Resolve {
        /// Launcher URL or course directory URL (with trailing slash)
        url: String,
    },
    /// Replay a SCORM session: Initialize, SetValue per pair, Terminate
    Play {
        /// Host base URL
        #[arg(long, default_value = "http://localhost:3000")]
        server: String,

        #[arg(long)]
        course: String,

        #[arg(long, default_value = "test-user")]
        user: String,

        /// element=value pairs, e.g. cmi.core.lesson_status=completed
        #[arg(required = true)]
        values: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let client = reqwest::Client::new();

    match args.command {
        Command::Resolve { url } => {
            let probe = HttpProbe::new(client, &url)?;
            let entry = resolve_entry_point(&probe).await;
            let how = match entry.source {
                EntrySource::Candidate => "candidate",
                EntrySource::Listing => "listing",
                EntrySource::Fallback => "fallback",
            };
            println!("{} ({})", entry.file, how);
        }
        Command::Play {
            server,
            course,
            user,
            values,
        } => {
            let pairs = values
                .iter()
                .map(|pair| match pair.split_once('=') {
                    Some((element, value)) if !element.is_empty() => Ok((element, value)),
                    _ => bail!("Expected element=value, got {pair}"),
                })
                .collect::<Result<Vec<_>>>()?;

            let sink = HttpProgressSink::new(client, &server)
                .with_context(|| format!("Bad server URL {server}"))?;
            let session = SessionContext {
                user_id: user,
                course_id: course,
            };
            let runtime = ScormRuntime::new(session, Arc::new(sink));
            let api = runtime.as_2004();

            println!("Initialize -> {}", api.Initialize(""));
            for (element, value) in &pairs {
                println!("SetValue({element}, {value}) -> {}", api.SetValue(element, value));
            }
            println!("Terminate -> {}", api.Terminate(""));

            runtime.flush().await;
            println!("{} writes dispatched", pairs.len());
        }
    }

    Ok(())
}
