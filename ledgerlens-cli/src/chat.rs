use anyhow::Result;
use ledgerlens_core::Model;
use ledgerlens_finance::{ask, ChatCommand, ChatContext, Summary, HELP_TEXT};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::state::chat_dir;

/// Append-only daily transcript, one line per message
pub struct ChatLog {
    path: PathBuf,
}

impl ChatLog {
    pub fn open_today(home: &Path) -> Result<Self> {
        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        let path = chat_dir(home)?.join(format!("{today}.md"));
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, role: &str, msg: &str) -> Result<()> {
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(
            f,
            "- {} [{}] {}",
            chrono::Local::now().to_rfc3339(),
            role,
            msg.replace('\n', " ")
        )?;
        Ok(())
    }
}

fn record(log: &mut Option<ChatLog>, role: &str, msg: &str) {
    if let Some(l) = log {
        if let Err(e) = l.append(role, msg) {
            tracing::warn!(path = %l.path().display(), error = %e, "chat log write failed");
        }
    }
}

/// Read questions from `input` until an exit word or end of input.
pub async fn run_repl<M, R, W>(
    model: &M,
    summary: &Summary,
    mut input: R,
    mut out: W,
    mut log: Option<ChatLog>,
) -> Result<()>
where
    M: Model + ?Sized,
    R: BufRead,
    W: Write,
{
    let context = ChatContext::from_summary(summary);

    writeln!(out, "\n{}", "=".repeat(50))?;
    writeln!(out, "CHAT: ask questions about your statement")?;
    writeln!(out, "Type /help for commands, 'exit' to quit.")?;
    writeln!(out, "{}", "=".repeat(50))?;
    record(&mut log, "system", "session_start");

    let mut line = String::new();
    loop {
        write!(out, "\nYou: ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }

        match ChatCommand::parse(&line) {
            ChatCommand::Empty => continue,
            ChatCommand::Exit => {
                writeln!(out, "Goodbye!")?;
                break;
            }
            ChatCommand::Help => writeln!(out, "{HELP_TEXT}")?,
            ChatCommand::Summary => writeln!(out, "{}", summary.render())?,
            ChatCommand::Ask(question) => {
                record(&mut log, "user", question);
                match ask(model, &context, question).await {
                    Ok(reply) => {
                        writeln!(out, "\nAssistant: {reply}")?;
                        record(&mut log, "assistant", &reply);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "chat request failed");
                        writeln!(out, "\nError: {e:#}")?;
                        record(&mut log, "error", &format!("{e:#}"));
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use async_trait::async_trait;
    use ledgerlens_core::AnnotatedStatement;
    use std::io::Cursor;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Oracle {
        questions: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Model for Oracle {
        async fn invoke(&self, user: &str, system: &str) -> Result<String> {
            assert!(system.starts_with("You are a helpful financial assistant"));
            self.questions.lock().unwrap().push(user.to_string());
            if user.contains("offline") {
                bail!("connection refused");
            }
            Ok(format!("answer to '{user}'"))
        }
    }

    async fn run(script: &str, log: Option<ChatLog>) -> (String, Vec<String>) {
        let model = Oracle::default();
        let summary = Summary::from_statement(&AnnotatedStatement::default());
        let mut out = Vec::new();
        run_repl(&model, &summary, Cursor::new(script.to_string()), &mut out, log)
            .await
            .unwrap();
        let questions = model.questions.lock().unwrap().clone();
        (String::from_utf8(out).unwrap(), questions)
    }

    #[tokio::test]
    async fn test_questions_forwarded_until_exit() {
        let (out, questions) = run("\n   \nWhat did I spend most on?\nQUIT\nnever asked\n", None).await;
        assert_eq!(questions, vec!["What did I spend most on?"]);
        assert!(out.contains("Assistant: answer to 'What did I spend most on?'"));
        assert!(out.trim_end().ends_with("Goodbye!"));
    }

    #[tokio::test]
    async fn test_local_commands_skip_model() {
        let (out, questions) = run("/help\n/summary\nq\n", None).await;
        assert!(questions.is_empty());
        assert!(out.contains("/summary  print the statement summary"));
        assert!(out.contains("PROCESSING SUMMARY"));
    }

    #[tokio::test]
    async fn test_failed_call_keeps_looping() {
        let (out, questions) = run("are you offline?\nstill there?\n", None).await;
        assert_eq!(questions.len(), 2);
        assert!(out.contains("Error: connection refused"));
        assert!(out.contains("Assistant: answer to 'still there?'"));
    }

    #[tokio::test]
    async fn test_end_of_input_ends_loop() {
        let (out, questions) = run("hello", None).await;
        assert_eq!(questions, vec!["hello"]);
        assert!(!out.contains("Goodbye!"));
    }

    #[tokio::test]
    async fn test_exchanges_logged() {
        let tmp = tempfile::tempdir().unwrap();
        let log = ChatLog::open_today(tmp.path()).unwrap();
        let path = log.path().to_path_buf();
        run("how much on travel?\nexit\n", Some(log)).await;

        let text = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("[system] session_start"));
        assert!(lines[1].contains("[user] how much on travel?"));
        assert!(lines[2].contains("[assistant] answer to 'how much on travel?'"));
    }
}
