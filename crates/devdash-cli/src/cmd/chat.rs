use crate::output::{format_chat, format_log, print_table};
use devdash_core::collab::{HttpAssistant, HttpBuildVerifier};
use devdash_core::session::{Session, Turn};
use devdash_core::store::{ProjectStore, RemoteProjectStore};
use devdash_core::sync::SyncClient;
use devdash_core::types::Status;
use devdash_core::workflow::render_progress;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Type a message to chat with the assistant.
  build project            run build verification
  decompose task: <text>   break a task into CLI commands
  /status <Status>         move the project to another stage
  /next                    advance to the following stage
  /progress                show the stage strip
  /quit                    save and exit";

/// Interactive dashboard for one project. Edits are saved in the background;
/// leaving the session flushes whatever is still pending.
pub fn run(root: &Path, server: Option<&str>, id: &str) -> anyhow::Result<()> {
    let (config, api) = super::connect(root, server)?;
    let store: Arc<dyn ProjectStore> = Arc::new(RemoteProjectStore::new(api.clone()));

    // Collaborator calls can run as long as the server lets them.
    let slow_api = devdash_core::http::ApiClient::new(
        api.base_url(),
        config.ai.timeout().max(config.build.timeout()) + Duration::from_secs(5),
    )?;
    let assistant = Arc::new(HttpAssistant::new(slow_api.clone()));
    let builder = Arc::new(HttpBuildVerifier::new(slow_api));

    let rt = super::runtime()?;
    rt.block_on(async move {
        let sync = match SyncClient::activate(store.clone(), id, config.sync.window()).await {
            Ok(sync) => sync,
            Err(e) => {
                eprintln!("Could not open project {id}: {e}");
                return back_to_list(store.as_ref()).await;
            }
        };
        let session = Session::new(sync, assistant, builder);
        let outcome = repl(&session).await;

        if let Err(e) = session.sync().flush().await {
            eprintln!("warning: final save failed: {e}");
        }
        outcome
    })
}

async fn back_to_list(store: &dyn ProjectStore) -> anyhow::Result<()> {
    let projects = store.list_projects().await?;
    if projects.is_empty() {
        println!("No projects yet.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = projects
        .iter()
        .map(|p| vec![p.id.clone(), p.name.clone(), p.status.to_string()])
        .collect();
    print_table(&["ID", "NAME", "STATUS"], &rows);
    Ok(())
}

async fn repl(session: &Session) -> anyhow::Result<()> {
    let project = session.sync().snapshot();
    println!("{} ({})", project.name, project.id);
    println!("{}", render_progress(project.status));
    for msg in &project.chat_history {
        println!("{}", format_chat(msg));
    }
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => println!("{HELP}"),
            "/progress" => println!("{}", render_progress(session.sync().status())),
            "/next" => match session.sync().status().next() {
                Some(status) => {
                    session.sync().set_status(status);
                    println!("{}", render_progress(status));
                }
                None => eprintln!("already at the final stage"),
            },
            _ if line.starts_with("/status") => {
                let arg = line.trim_start_matches("/status").trim();
                match arg.parse::<Status>() {
                    Ok(status) => {
                        session.sync().set_status(status);
                        println!("{}", render_progress(status));
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }
            _ => {
                let before = session.sync().status();
                let turn = session.send(line).await;
                print_turn(&turn);
                let after = session.sync().status();
                if after != before {
                    println!("{}", render_progress(after));
                }
            }
        }
    }
    Ok(())
}

fn print_turn(turn: &Turn) {
    // The user's own line is already on screen.
    for line in turn.logs.iter().skip(1) {
        println!("{}", format_log(line));
    }
    for msg in turn.chat.iter().skip(1) {
        println!("{}", format_chat(msg));
    }
}
