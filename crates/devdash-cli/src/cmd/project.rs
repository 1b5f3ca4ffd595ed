use crate::output::{print_json, print_table};
use clap::Subcommand;
use devdash_core::store::{ProjectStore, RemoteProjectStore};
use devdash_core::types::{Project, ProjectPatch, Status};
use devdash_core::workflow::render_progress;
use std::path::Path;

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// List every project
    List,
    /// Create a project in Planning
    Create {
        /// Project name
        name: String,
    },
    /// Show one project with its progress, chat and logs
    Show { id: String },
    /// Set a project's status (Planning, Development, Testing, Deployment, Completed)
    Status { id: String, status: String },
    /// Delete a project
    Delete { id: String },
}

pub fn run(
    root: &Path,
    server: Option<&str>,
    subcmd: ProjectSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    let (_, api) = super::connect(root, server)?;
    let store = RemoteProjectStore::new(api);
    let rt = super::runtime()?;

    rt.block_on(async {
        match subcmd {
            ProjectSubcommand::List => list(&store, json).await,
            ProjectSubcommand::Create { name } => {
                let project = store.create_project(&name).await?;
                if json {
                    print_json(&project)
                } else {
                    println!("Created project '{}' ({})", project.name, project.id);
                    Ok(())
                }
            }
            ProjectSubcommand::Show { id } => {
                let project = store.get_project(&id).await?;
                if json {
                    print_json(&project)
                } else {
                    show(&project);
                    Ok(())
                }
            }
            ProjectSubcommand::Status { id, status } => {
                let status: Status = status.parse()?;
                let project = store
                    .update_project(&id, ProjectPatch::status(status))
                    .await?;
                if json {
                    print_json(&project)
                } else {
                    println!("{}", render_progress(project.status));
                    Ok(())
                }
            }
            ProjectSubcommand::Delete { id } => {
                store.delete_project(&id).await?;
                if json {
                    print_json(&serde_json::json!({ "deleted": id }))
                } else {
                    println!("Deleted project {id}");
                    Ok(())
                }
            }
        }
    })
}

async fn list(store: &RemoteProjectStore, json: bool) -> anyhow::Result<()> {
    let projects = store.list_projects().await?;
    if json {
        return print_json(&projects);
    }
    if projects.is_empty() {
        println!("No projects yet. Create one with `devdash project create <name>`.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = projects
        .iter()
        .map(|p| {
            vec![
                p.id.clone(),
                p.name.clone(),
                p.status.to_string(),
                p.chat_history.len().to_string(),
                p.logs.len().to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "STATUS", "CHAT", "LOGS"], &rows);
    Ok(())
}

fn show(project: &Project) {
    println!("{} ({})", project.name, project.id);
    println!("{}", render_progress(project.status));
    if !project.chat_history.is_empty() {
        println!();
        for msg in &project.chat_history {
            println!("{}", crate::output::format_chat(msg));
        }
    }
    if !project.logs.is_empty() {
        println!();
        for line in &project.logs {
            println!("{}", crate::output::format_log(line));
        }
    }
}
