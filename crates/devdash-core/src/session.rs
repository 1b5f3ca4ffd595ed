//! What happens when the user sends a line on the dashboard.
//!
//! Every turn appends the user's message, then branches on the hard-coded
//! triggers in [`Trigger`]. Collaborator failures never escape: they become
//! `[ERROR]` log lines and an assistant chat notice, and the turn completes.

use std::sync::Arc;

use crate::collab::{Assistant, BuildVerifier};
use crate::error::DashError;
use crate::sync::SyncClient;
use crate::types::{BuildReport, ChatMessage, Sender, Status};
use crate::workflow::Trigger;

/// Entries appended during one [`Session::send`], in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Turn {
    pub chat: Vec<ChatMessage>,
    pub logs: Vec<String>,
}

impl Turn {
    pub fn is_empty(&self) -> bool {
        self.chat.is_empty() && self.logs.is_empty()
    }
}

pub struct Session {
    sync: SyncClient,
    assistant: Arc<dyn Assistant>,
    builder: Arc<dyn BuildVerifier>,
}

/// Writes through to the sync client and remembers what it wrote.
struct Recorder<'a> {
    sync: &'a SyncClient,
    turn: Turn,
}

impl Recorder<'_> {
    fn log(&mut self, line: impl Into<String>) {
        let line = line.into();
        self.sync.push_log(line.clone());
        self.turn.logs.push(line);
    }

    fn say(&mut self, sender: Sender, text: impl Into<String>) {
        let msg = self.sync.push_chat(sender, text);
        self.turn.chat.push(msg);
    }

    fn ai(&mut self, text: impl Into<String>) {
        self.say(Sender::Ai, text);
    }
}

fn self_healing_prompt(report: &BuildReport) -> String {
    let detail = if report.stderr.is_empty() {
        &report.message
    } else {
        &report.stderr
    };
    format!(
        "The project build failed with the following error:\n\n{detail}\n\n\
         Please provide corrected code snippets or CLI commands to fix this issue."
    )
}

impl Session {
    pub fn new(
        sync: SyncClient,
        assistant: Arc<dyn Assistant>,
        builder: Arc<dyn BuildVerifier>,
    ) -> Self {
        Self {
            sync,
            assistant,
            builder,
        }
    }

    pub fn sync(&self) -> &SyncClient {
        &self.sync
    }

    /// Handle one line of user input. Blank input does nothing.
    pub async fn send(&self, input: &str) -> Turn {
        let input = input.trim();
        if input.is_empty() {
            return Turn::default();
        }

        let mut rec = Recorder {
            sync: &self.sync,
            turn: Turn::default(),
        };
        rec.say(Sender::User, input);
        rec.log(format!("[USER] {input}"));

        match Trigger::classify(input) {
            Trigger::Build => self.build(&mut rec).await,
            Trigger::Decompose(task) => self.decompose(&mut rec, &task).await,
            Trigger::Chat => self.chat(&mut rec, input).await,
        }
        rec.turn
    }

    async fn build(&self, rec: &mut Recorder<'_>) {
        rec.log("[INFO] User requested build. Running build verification...");
        self.sync.set_status(Status::Testing);

        let report = match self.builder.verify().await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "build verification unreachable");
                rec.log(format!("[ERROR] Error during build verification: {e}"));
                rec.ai("An error occurred during build verification.");
                return;
            }
        };

        if report.success {
            rec.log("[SUCCESS] Build completed successfully.");
            if !report.stdout.is_empty() {
                rec.log(report.stdout.clone());
            }
            self.sync.set_status(Status::Deployment);
            rec.ai("Build successful. Ready for deployment.");
            return;
        }

        rec.log(format!("[ERROR] Build failed: {}", report.message));
        let output = if report.stderr.is_empty() {
            &report.stdout
        } else {
            &report.stderr
        };
        if !output.is_empty() {
            rec.log(output.clone());
        }
        rec.log("[INFO] Build failed. Asking the assistant for a self-healing suggestion...");
        rec.ai("Build failed. Initiating self-healing with the assistant.");

        match self.assistant.chat(&self_healing_prompt(&report)).await {
            Ok(fix) => {
                rec.log(format!("[AI] Self-healing suggestion: {fix}"));
                rec.ai(format!("Suggested fix: {fix}"));
            }
            Err(e) => {
                rec.log(format!("[ERROR] Self-healing request failed: {e}"));
                rec.ai("The assistant could not suggest a fix.");
            }
        }
    }

    async fn decompose(&self, rec: &mut Recorder<'_>, task: &str) {
        rec.log("[INFO] User requested task decomposition.");
        rec.ai(format!("Decomposing task: \"{task}\"..."));

        match self.assistant.decompose(task).await {
            Ok(commands) => {
                rec.log("[AI] Task decomposed into commands:");
                for (i, cmd) in commands.iter().enumerate() {
                    let n = i + 1;
                    rec.log(format!("  {n}. {} - {}", cmd.command, cmd.description));
                    rec.ai(format!(
                        "Command {n}:\n{}\n ({})",
                        cmd.command, cmd.description
                    ));
                }
                self.sync.set_status(Status::Development);
            }
            Err(DashError::Parse { message, raw }) => {
                rec.log(format!(
                    "[ERROR] Could not decompose task: {message}. Raw output: {raw}"
                ));
                rec.ai(format!("The assistant could not decompose the task: {message}"));
            }
            Err(e) => {
                rec.log(format!("[ERROR] Error during task decomposition: {e}"));
                rec.ai("An error occurred during task decomposition.");
            }
        }
    }

    async fn chat(&self, rec: &mut Recorder<'_>, prompt: &str) {
        rec.log(format!("[INFO] Sending prompt to assistant: \"{prompt}\""));
        match self.assistant.chat(prompt).await {
            Ok(text) => {
                rec.log(format!("[AI] Response: {text}"));
                rec.ai(text);
            }
            Err(e) => {
                rec.log(format!("[ERROR] Error communicating with the assistant: {e}"));
                rec.ai("An error occurred while communicating with the assistant.");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::testing::MemoryStore;
    use crate::types::CliCommand;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeAssistant {
        prompts: Mutex<Vec<String>>,
        fail_chat: bool,
        commands: Option<Vec<CliCommand>>,
    }

    #[async_trait]
    impl Assistant for FakeAssistant {
        async fn chat(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail_chat {
                return Err(DashError::Transport("connection refused".into()));
            }
            Ok("run npm install".into())
        }

        async fn decompose(&self, task: &str) -> Result<Vec<CliCommand>> {
            self.prompts.lock().unwrap().push(task.to_string());
            self.commands.clone().ok_or_else(|| DashError::Parse {
                message: "model output is not a command list".into(),
                raw: "Sure! Here you go".into(),
            })
        }
    }

    struct FakeBuilder(Option<BuildReport>);

    #[async_trait]
    impl BuildVerifier for FakeBuilder {
        async fn verify(&self) -> Result<BuildReport> {
            self.0
                .clone()
                .ok_or_else(|| DashError::Transport("verifier down".into()))
        }
    }

    fn passing() -> BuildReport {
        BuildReport {
            success: true,
            message: "Build successful.".into(),
            stdout: "compiled 12 modules".into(),
            stderr: String::new(),
        }
    }

    fn failing() -> BuildReport {
        BuildReport {
            success: false,
            message: "Build failed.".into(),
            stdout: String::new(),
            stderr: "Module not found: 'react'".into(),
        }
    }

    async fn session(
        store: &Arc<MemoryStore>,
        assistant: FakeAssistant,
        build: Option<BuildReport>,
    ) -> (Session, Arc<FakeAssistant>) {
        let sync = SyncClient::activate(store.clone(), "proj-1", Duration::from_millis(1000))
            .await
            .unwrap();
        let assistant = Arc::new(assistant);
        let session = Session::new(sync, assistant.clone(), Arc::new(FakeBuilder(build)));
        (session, assistant)
    }

    fn alpha() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_project("proj-1", "Alpha"))
    }

    #[tokio::test(start_paused = true)]
    async fn blank_input_is_ignored() {
        let store = alpha();
        let (s, _) = session(&store, FakeAssistant::default(), None).await;
        assert!(s.send("   ").await.is_empty());
        assert!(s.sync().snapshot().chat_history.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn successful_build_moves_to_deployment() {
        let store = alpha();
        let (s, _) = session(&store, FakeAssistant::default(), Some(passing())).await;

        let turn = s.send("build project").await;

        let project = s.sync().snapshot();
        assert_eq!(project.status, Status::Deployment);
        assert!(project
            .logs
            .contains(&"[SUCCESS] Build completed successfully.".to_string()));
        assert!(project.logs.contains(&"compiled 12 modules".to_string()));
        assert_eq!(turn.chat[0].sender, Sender::User);
        assert_eq!(turn.chat[0].text, "build project");
        assert_eq!(
            turn.chat.last().unwrap().text,
            "Build successful. Ready for deployment."
        );

        // Debounced write lands the final state.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let stored = store.stored("proj-1").unwrap();
        assert_eq!(stored.status, Status::Deployment);
        assert_eq!(stored.logs, project.logs);
        assert_eq!(store.updates().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_build_stays_in_testing_and_self_heals() {
        let store = alpha();
        let (s, assistant) = session(&store, FakeAssistant::default(), Some(failing())).await;

        let turn = s.send("Please BUILD PROJECT now").await;

        assert_eq!(s.sync().status(), Status::Testing);
        assert!(turn
            .logs
            .contains(&"[ERROR] Build failed: Build failed.".to_string()));
        assert!(turn.logs.contains(&"Module not found: 'react'".to_string()));
        assert!(turn
            .logs
            .contains(&"[AI] Self-healing suggestion: run npm install".to_string()));

        let ai: Vec<_> = turn
            .chat
            .iter()
            .filter(|m| m.sender == Sender::Ai)
            .map(|m| m.text.as_str())
            .collect();
        assert_eq!(
            ai,
            vec![
                "Build failed. Initiating self-healing with the assistant.",
                "Suggested fix: run npm install",
            ]
        );

        let prompts = assistant.prompts.lock().unwrap();
        assert!(prompts[0].contains("Module not found: 'react'"));
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_verifier_is_reported_inline() {
        let store = alpha();
        let (s, _) = session(&store, FakeAssistant::default(), None).await;

        let turn = s.send("build project").await;

        assert!(turn.logs.last().unwrap().starts_with("[ERROR] Error during build verification:"));
        assert_eq!(
            turn.chat.last().unwrap().text,
            "An error occurred during build verification."
        );
        assert_eq!(s.sync().status(), Status::Testing);
    }

    #[tokio::test(start_paused = true)]
    async fn decompose_lists_commands_and_moves_to_development() {
        let store = alpha();
        let assistant = FakeAssistant {
            commands: Some(vec![
                CliCommand {
                    command: "npx create-next-app web".into(),
                    description: "scaffold".into(),
                },
                CliCommand {
                    command: "npm run dev".into(),
                    description: "start".into(),
                },
            ]),
            ..Default::default()
        };
        let (s, assistant) = session(&store, assistant, None).await;

        let turn = s.send("Decompose task: build a landing page").await;

        assert_eq!(
            assistant.prompts.lock().unwrap().as_slice(),
            ["build a landing page"]
        );
        assert_eq!(s.sync().status(), Status::Development);
        assert!(turn
            .logs
            .contains(&"  1. npx create-next-app web - scaffold".to_string()));
        assert!(turn.logs.contains(&"  2. npm run dev - start".to_string()));
        assert_eq!(turn.chat[1].text, "Decomposing task: \"build a landing page\"...");
        assert_eq!(turn.chat[2].text, "Command 1:\nnpx create-next-app web\n (scaffold)");
        assert_eq!(turn.chat.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn decompose_parse_failure_logs_raw_text() {
        let store = alpha();
        let (s, _) = session(&store, FakeAssistant::default(), None).await;

        let turn = s.send("decompose task: anything").await;

        let last_log = turn.logs.last().unwrap();
        assert!(last_log.starts_with("[ERROR] Could not decompose task"));
        assert!(last_log.contains("Sure! Here you go"));
        assert_eq!(s.sync().status(), Status::Planning);
    }

    #[tokio::test(start_paused = true)]
    async fn plain_chat_appends_reply() {
        let store = alpha();
        let (s, _) = session(&store, FakeAssistant::default(), None).await;

        let turn = s.send("how do I start?").await;

        assert_eq!(
            turn.logs,
            vec![
                "[USER] how do I start?".to_string(),
                "[INFO] Sending prompt to assistant: \"how do I start?\"".to_string(),
                "[AI] Response: run npm install".to_string(),
            ]
        );
        assert_eq!(turn.chat.len(), 2);
        assert_eq!(turn.chat[1].sender, Sender::Ai);
        assert_eq!(s.sync().status(), Status::Planning);
    }

    #[tokio::test(start_paused = true)]
    async fn chat_failure_is_reported_inline() {
        let store = alpha();
        let assistant = FakeAssistant {
            fail_chat: true,
            ..Default::default()
        };
        let (s, _) = session(&store, assistant, None).await;

        let turn = s.send("hello").await;

        assert!(turn.logs[2].starts_with("[ERROR] Error communicating with the assistant"));
        assert_eq!(
            turn.chat[1].text,
            "An error occurred while communicating with the assistant."
        );
    }
}
