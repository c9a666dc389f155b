use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use civiresolve_assistant::services::{format_preview, IssuesClient};
use civiresolve_assistant::{logger, ChatAgent, ChatSession, Config, KnowledgeBase};

const HELP: &str = "Commands: /topics, /issues, /clear, /quit";

fn main() -> Result<()> {
    logger::init();
    log::info!("🚀 CiviResolve assistant started");

    // Replies are computed on the runtime's workers while this thread reads input
    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let _guard = rt.enter();

    let config = Config::from_env();
    log::info!("📁 Configuration loaded");

    let knowledge = Arc::new(KnowledgeBase::load(config.knowledge_base_path.as_deref())?);
    let agent = ChatAgent::new(&config, Arc::clone(&knowledge));
    let mode = match (config.has_gemini_key(), agent.has_remote()) {
        (_, true) => "Gemini + local knowledge",
        (true, false) => "local knowledge only, Gemini session failed to start",
        (false, false) => "local knowledge only",
    };
    let mut session = ChatSession::new(agent, &config.greeting);

    let issues = match IssuesClient::new(&config) {
        Ok(client) => Some(client),
        Err(e) => {
            log::warn!("⚠️ Issue preview disabled: {:#}", e);
            None
        }
    };

    println!("{} ({})", config.assistant_name, mode);
    println!("Session {}", session.id());
    print_latest_issues(&rt, issues.as_ref(), config.latest_issues_limit);
    println!("{}", HELP);
    println!();
    println!("{}", config.greeting);

    let timeout = Duration::from_secs(config.request_timeout_secs.max(1) + 5);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;

        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/topics" => {
                println!("Topics: {}", knowledge.topics());
                continue;
            }
            "/issues" => {
                print_latest_issues(&rt, issues.as_ref(), config.latest_issues_limit);
                continue;
            }
            "/clear" => {
                session.clear();
                println!("{}", config.greeting);
                continue;
            }
            _ => {}
        }

        if !session.submit(&line) {
            continue;
        }

        println!("Thinking...");
        while session.is_loading() {
            if session.wait_for_reply(timeout).is_none() {
                log::warn!("No reply within {:?}", timeout);
                println!("Still working on it, please wait.");
            }
        }
        if let Some(reply) = session.messages().last() {
            println!("{}\n", reply.content);
        }
    }

    log::info!("👋 CiviResolve assistant stopped");
    Ok(())
}

fn print_latest_issues(rt: &tokio::runtime::Runtime, client: Option<&IssuesClient>, limit: usize) {
    let Some(client) = client else { return };

    match rt.block_on(client.latest(limit)) {
        Ok(issues) => println!("{}", format_preview(&issues, client.media_base_url())),
        Err(e) => log::error!("Error fetching public issues: {:#}", e),
    }
}
