//! gutcheck - ingredient audit agent CLI

mod config;
mod tools;

use clap::Parser;
use std::sync::Arc;

use gutcheck_agent::{AuditEvent, Auditor, AuditorConfig, OpenAiCapability, SessionStore};
use gutcheck_ai::ChatClient;

/// gutcheck - blunt health audits for ingredient lists
#[derive(Parser, Debug)]
#[command(name = "gutcheck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model to use (default: gpt-4o-mini)
    #[arg(short, long)]
    model: Option<String>,

    /// Success criteria applied to every turn
    #[arg(long)]
    criteria: Option<String>,

    /// Run in non-interactive mode with a single product or URL
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("gutcheck=debug")
            .init();
    }

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Load config file
    let cfg = config::Config::load();

    // Merge config with CLI args (CLI takes precedence)
    let model = args
        .model
        .or(cfg.model.clone())
        .unwrap_or_else(|| gutcheck_ai::client::DEFAULT_MODEL.to_string());
    let criteria = args.criteria.or(cfg.criteria.clone());

    if cfg.get_api_key("openai").is_none() {
        eprintln!("Error: No OpenAI API key found");
        eprintln!();
        eprintln!("Set your API key with: export OPENAI_API_KEY=your-key");
        eprintln!("Or add it to config file: gutcheck --init-config");
        std::process::exit(1);
    }
    if cfg.get_api_key("serper").is_none() {
        eprintln!("Warning: SERPER_API_KEY not set; ingredient research will be unavailable");
    }

    let store = SessionStore::new();
    let mut auditor = build_auditor(&cfg, &model, &store)?;
    let mut printer = spawn_event_printer(&auditor);

    // Non-interactive mode
    if let Some(command) = args.command {
        let result = run_one(&mut auditor, &command, criteria.as_deref()).await;
        auditor.shutdown();
        printer.abort();
        return result;
    }

    // Interactive mode
    println!("gutcheck ({})", model);
    println!("Paste a product URL or ingredients list. /reset starts over, /quit exits.");
    println!();

    loop {
        use std::io::Write;
        print!("> ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" | "/exit" => break,
            "/reset" => {
                // Discard the session (releasing its fetch handle) and
                // start a fresh one with a new token.
                auditor.shutdown();
                printer.abort();
                auditor = build_auditor(&cfg, &model, &store)?;
                printer = spawn_event_printer(&auditor);
                println!("Session reset.");
                continue;
            }
            "/help" => {
                println!("/reset  start a fresh session");
                println!("/quit   exit");
                continue;
            }
            _ => {}
        }

        match auditor.run_turn(input, criteria.as_deref()).await {
            Ok(exchange) => {
                println!("\n{}\n", exchange.reply);
            }
            Err(e) => {
                // The transcript so far is preserved; only this turn failed.
                eprintln!("[turn failed: {}]", e);
            }
        }
    }

    auditor.shutdown();
    printer.abort();
    Ok(())
}

fn build_auditor(
    cfg: &config::Config,
    model: &str,
    store: &SessionStore,
) -> anyhow::Result<Auditor> {
    let api_key = cfg
        .get_api_key("openai")
        .ok_or_else(|| anyhow::anyhow!("no OpenAI API key"))?;
    let client = ChatClient::new(api_key).with_model(model);
    let capability = Arc::new(OpenAiCapability::new(client));

    let (tool_set, handle) = tools::provide_tools(cfg.get_api_key("serper"))?;

    let config = AuditorConfig {
        max_steps: cfg.max_steps.unwrap_or(AuditorConfig::default().max_steps),
    };
    let mut auditor = Auditor::new(config, capability, store.clone());
    auditor.set_tools(tool_set);
    auditor.set_resource(Box::new(handle));
    tracing::debug!(session = %auditor.session_token(), "session created");
    Ok(auditor)
}

async fn run_one(
    auditor: &mut Auditor,
    input: &str,
    criteria: Option<&str>,
) -> anyhow::Result<()> {
    println!("gutcheck> {}", input);
    println!();
    match auditor.run_turn(input, criteria).await {
        Ok(exchange) => {
            println!("{}", exchange.reply);
            Ok(())
        }
        Err(e) => {
            eprintln!("[turn failed: {}]", e);
            Err(e.into())
        }
    }
}

/// Narrate tool activity and verdicts while a turn runs
fn spawn_event_printer(auditor: &Auditor) -> tokio::task::JoinHandle<()> {
    let mut receiver = auditor.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = receiver.recv().await {
            match event {
                AuditEvent::ToolExecutionStart { tool_name, .. } => {
                    println!("[Running {}...]", tool_name);
                }
                AuditEvent::ToolExecutionEnd {
                    tool_name,
                    result,
                    is_error,
                    ..
                } => {
                    if is_error {
                        println!("[{} failed: {}]", tool_name, result);
                    } else {
                        let preview = truncate_chars(&result, 200);
                        println!("[{}: {}]", tool_name, preview);
                    }
                }
                AuditEvent::EvaluationEnd {
                    success_criteria_met,
                    user_input_needed,
                    ..
                } => {
                    if user_input_needed {
                        println!("[Evaluator: needs your input]");
                    } else if !success_criteria_met {
                        println!("[Evaluator: rejected, revising...]");
                    }
                }
                _ => {}
            }
        }
    })
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
