//! natter - terminal chat client for a streaming assistant backend

mod commands;

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use natter_backend::{BackendClient, BackendConfig};
use natter_store::{Chat, ChatStore, FileStore, MemoryStore, Role, StateStore};

use commands::Command;

/// natter - chat with a streaming assistant from the terminal
#[derive(Parser, Debug)]
#[command(name = "natter")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Streaming endpoint (overrides config file and environment)
    #[arg(long)]
    stream_url: Option<String>,

    /// Base chat endpoint (overrides config file and environment)
    #[arg(long)]
    backend_url: Option<String>,

    /// Bearer token for the Authorization header
    #[arg(long)]
    auth_token: Option<String>,

    /// Keep chats in memory only (skip on-disk persistence)
    #[arg(long)]
    ephemeral: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "natter_backend=debug,natter_store=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = BackendConfig::load();
    if let Some(url) = args.backend_url {
        config.backend_url = url;
    }
    if let Some(url) = args.stream_url {
        config.stream_url = url;
    }
    if let Some(token) = args.auth_token {
        config.auth_token = Some(token);
    }

    let persist: Box<dyn StateStore> = if args.ephemeral {
        Box::new(MemoryStore::new())
    } else {
        Box::new(FileStore::new())
    };
    let store = Arc::new(ChatStore::new(persist, Arc::new(BackendClient::new(config))));

    println!("natter - type a message, or /help for commands");
    print_chat_list(&store);

    let stdin = io::stdin();
    loop {
        prompt(&store);
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let Some(command) = Command::parse(&line) else {
            continue;
        };
        match command {
            Command::Quit => break,
            Command::Help => print_help(),
            Command::List => print_chat_list(&store),
            Command::History => print_history(&store),
            Command::New(title) => {
                let title = title.unwrap_or_else(|| "new chat".to_string());
                store.create_chat(&title);
                print_chat_list(&store);
            }
            Command::Select(index) => match chat_at(&store, index) {
                Some(chat) => store.select_chat(&chat.id),
                None => println!("no chat #{}", index),
            },
            Command::Rename(index, title) => match chat_at(&store, index) {
                Some(chat) => store.edit_chat(&chat.id, &title),
                None => println!("no chat #{}", index),
            },
            Command::Delete(index) => match chat_at(&store, index) {
                Some(chat) => {
                    store.delete_chat(&chat.id);
                    print_chat_list(&store);
                }
                None => println!("no chat #{}", index),
            },
            Command::Say(text) => send_and_print(&store, &text).await,
        }
    }

    Ok(())
}

fn prompt(store: &Arc<ChatStore>) {
    let title = store
        .get_selected_chat()
        .map(|chat| chat.title)
        .unwrap_or_else(|| "no chat".to_string());
    print!("[{}] > ", title);
    let _ = io::stdout().flush();
}

fn chat_at(store: &Arc<ChatStore>, index: usize) -> Option<Chat> {
    index
        .checked_sub(1)
        .and_then(|i| store.chats().into_iter().nth(i))
}

fn print_chat_list(store: &Arc<ChatStore>) {
    let chats = store.chats();
    if chats.is_empty() {
        println!("(no chats yet)");
        return;
    }
    let selected = store.selected_chat_id();
    for (i, chat) in chats.iter().enumerate() {
        let marker = if selected.as_deref() == Some(chat.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{} {}. {} ({} messages)",
            marker,
            i + 1,
            chat.title,
            chat.messages.len()
        );
    }
}

fn print_history(store: &Arc<ChatStore>) {
    if store.no_messages() {
        println!("(no messages)");
        return;
    }
    for message in store.messages() {
        println!("{}: {}", message.role.as_str(), message.text);
    }
}

fn print_help() {
    println!("  /new [title]        create a chat");
    println!("  /list               list chats");
    println!("  /select <n>         switch to chat n");
    println!("  /rename <n> <title> retitle chat n");
    println!("  /delete <n>         delete chat n");
    println!("  /history            show the selected chat");
    println!("  /quit               exit");
    println!("  anything else is sent to the assistant");
}

/// Send a message, ticking a busy indicator while the reply streams, and
/// print the settled assistant reply.
async fn send_and_print(store: &Arc<ChatStore>, text: &str) {
    let signal = store.busy_signal();
    let ticker = tokio::spawn(async move {
        // Small delay so instant failures don't flash the indicator.
        tokio::time::sleep(Duration::from_millis(150)).await;
        while signal.is_busy() {
            print!(".");
            let _ = io::stdout().flush();
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    });

    store.send_message(text, Role::User).await;
    ticker.abort();

    if let Some(chat) = store.get_selected_chat() {
        if let Some(reply) = chat.messages.iter().rev().find(|m| m.role == Role::Assistant) {
            println!("\nassistant: {}", reply.text);
        }
    }
}
