use chrono::Local;
use colored::*;
use rustyline::error::ReadlineError;
use stockchat::{
    core::config::ChatConfig,
    init,
    repl::{self, ChatMessage, ChatSession},
};

fn print_message(message: &ChatMessage) {
    let time = message.timestamp.with_timezone(&Local).format("%H:%M:%S");
    if message.is_user {
        println!("{} {}", format!("[{}] you:", time).cyan(), message.text);
    } else {
        println!("{}", format!("[{}] analyst:", time).green());
        if let Some(line) = message.quote_line() {
            println!("{}", line.bold());
        }
        println!("{}\n", message.text);
    }
}

fn print_help() {
    println!("Ask about a stock, e.g. \"Analyze AAPL\" or \"What's the market outlook?\"");
    println!("  /quote  show the last loaded quote");
    println!("  /clear  start over");
    println!("  /quit   exit");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    log::debug!("Logger initialized");

    let config = ChatConfig::from_env()?;
    let service = init::build_service(&config)?;
    if !service.has_llm() {
        eprintln!("{}", "GEMINI_API_KEY is not set; replies will fail.".yellow());
    }

    let mut session = ChatSession::new(service);
    let mut rl = repl::create_editor()?;

    print_message(&session.messages()[0]);
    println!("{}", "Type /help for commands, /quit to exit".dimmed());

    loop {
        let readline = rl.readline(&format!("{}", "> ".green().bold()));
        match readline {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                rl.add_history_entry(input)?;

                match input {
                    "/quit" | "quit" => break,
                    "/help" => {
                        print_help();
                        continue;
                    }
                    "/clear" => {
                        session.clear();
                        print_message(&session.messages()[0]);
                        continue;
                    }
                    "/quote" => {
                        match session.current_quote() {
                            Some(quote) => println!("{}", repl::quote_banner(quote).bold()),
                            None => println!("No quote loaded yet."),
                        }
                        continue;
                    }
                    _ => {}
                }

                println!("{}", "Analyzing...".dimmed());
                if let Some(reply) = session.send(input).await {
                    print_message(reply);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    println!("Goodbye!");
    repl::save_history(&mut rl)?;

    Ok(())
}
