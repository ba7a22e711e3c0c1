use crate::cache::{CacheService, RefreshPolicy};
use crate::commands;
use crate::event::{Event, EventHandler};
use color_eyre::Result;
use serde::Serialize;
use std::io::Write;
use tracing::info;

/// Line-oriented console over the cache service
pub struct App<W: Write> {
  service: CacheService,

  /// Where command output goes
  out: W,

  /// Whether to quit
  should_quit: bool,
}

impl<W: Write> App<W> {
  pub fn new(service: CacheService, out: W) -> Self {
    Self {
      service,
      out,
      should_quit: false,
    }
  }

  pub async fn run(mut self) -> Result<()> {
    let mut events = EventHandler::new();
    info!("Ready. Type a command, or Ctrl-C to stop:\n{}", commands::usage());

    while !self.should_quit {
      match events.next().await {
        Some(Event::Line(line)) => self.execute_command(&line)?,
        Some(Event::Closed) => {
          info!("stdin closed, serving until Ctrl-C");
        }
        Some(Event::Interrupt) | None => self.should_quit = true,
      }
    }

    self.service.shutdown();
    Ok(())
  }

  fn execute_command(&mut self, input: &str) -> Result<()> {
    let cmd = match commands::resolve(input) {
      Some(cmd) => cmd.name,
      None if input.trim().is_empty() => return Ok(()),
      None => {
        writeln!(
          self.out,
          "Unknown command: {}\n{}",
          input.trim(),
          commands::usage()
        )?;
        return Ok(());
      }
    };

    match cmd {
      "snapshot" => {
        let snapshot = self.service.snapshot();
        self.print_json(&snapshot)?;
      }
      "refresh" => {
        self.service.request_refresh(RefreshPolicy::Always);
        writeln!(self.out, "Manual cache refresh started.")?;
      }
      "sync" => {
        self.service.request_refresh(RefreshPolicy::IfStale);
        writeln!(self.out, "Refresh requested if the cache is stale.")?;
      }
      "health" => {
        let health = self.service.health();
        self.print_json(&health)?;
      }
      "quit" => self.should_quit = true,
      _ => {}
    }
    Ok(())
  }

  fn print_json<T: Serialize>(&mut self, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut self.out, value)?;
    writeln!(self.out)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::aggregate::{Pipeline, PipelineSettings};
  use crate::jira::fake::{issue, page, FakeClient};
  use std::collections::BTreeSet;
  use std::sync::Arc;
  use std::time::Duration;

  async fn app() -> App<Vec<u8>> {
    let client = Arc::new(
      FakeClient::new().with_board(1, "Alpha", vec![page(vec![issue("AL-1")], 1)]),
    );
    let settings = PipelineSettings {
      project_key: "AL".to_string(),
      excluded_boards: BTreeSet::new(),
      page_size: 50,
    };
    let service = CacheService::start(Pipeline::new(client, settings), Duration::from_secs(3600))
      .await
      .unwrap();
    App::new(service, Vec::new())
  }

  fn output(app: &App<Vec<u8>>) -> String {
    String::from_utf8(app.out.clone()).unwrap()
  }

  #[tokio::test]
  async fn test_snapshot_prints_rows() {
    let mut app = app().await;
    app.execute_command("snapshot").unwrap();

    let value: serde_json::Value = serde_json::from_str(&output(&app)).unwrap();
    assert_eq!(value["rows"][0]["issue_key"], "AL-1");
    assert_eq!(value["rows"][0]["assignee"], "Unassigned");
    assert!(value["last_updated"].is_string());
  }

  #[tokio::test]
  async fn test_health_prints_timestamps() {
    let mut app = app().await;
    app.execute_command("h").unwrap();

    let value: serde_json::Value = serde_json::from_str(&output(&app)).unwrap();
    assert!(value["last_updated"].is_string());
    assert!(value["now"].is_string());
  }

  #[tokio::test]
  async fn test_unknown_and_quit() {
    let mut app = app().await;
    app.execute_command("deploy").unwrap();
    assert!(output(&app).starts_with("Unknown command: deploy"));
    assert!(!app.should_quit);

    app.execute_command("q").unwrap();
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_refresh_is_acknowledged() {
    let mut app = app().await;
    app.execute_command("refresh").unwrap();
    assert_eq!(output(&app), "Manual cache refresh started.\n");
  }
}
