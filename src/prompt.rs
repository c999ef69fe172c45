use std::io::{self, BufRead, IsTerminal, Write};

use async_trait::async_trait;
use fleet_dispatcher::{BatchReport, NeverRedrive, RedriveDecider, RedriveUpTo};
use tracing::warn;

use crate::render::render_summary;

/// Asks on the terminal whether to re-run the failed targets.
pub struct TerminalRedrivePrompt;

impl TerminalRedrivePrompt {
    fn ask(question: &str) -> io::Result<bool> {
        let mut stdout = io::stdout();
        write!(stdout, "{question} [y/N]: ")?;
        stdout.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(is_yes(&answer))
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[async_trait]
impl RedriveDecider for TerminalRedrivePrompt {
    async fn should_redrive(&self, report: &BatchReport) -> bool {
        let summary = report.summary();
        let question = format!(
            "{}\nRe-run `{}` on the {} failed target(s)?",
            render_summary(&summary),
            report.command,
            summary.unsuccessful()
        );

        match tokio::task::spawn_blocking(move || Self::ask(&question)).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                warn!("读取用户输入失败: {}", e);
                false
            }
            Err(e) => {
                warn!("读取用户输入的任务异常退出: {}", e);
                false
            }
        }
    }
}

/// `--redrive` answers yes once; otherwise ask only when stdin is a terminal.
pub fn redrive_decider(redrive_flag: bool) -> Box<dyn RedriveDecider> {
    if redrive_flag {
        Box::new(RedriveUpTo::new(1))
    } else if io::stdin().is_terminal() {
        Box::new(TerminalRedrivePrompt)
    } else {
        Box::new(NeverRedrive)
    }
}
