//! CLI command execution.
//!
//! Conversation commands work on the saved store directly. `chat` drives a
//! [`ChatSession`] over either the relay server or the upstream API.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::error::SessionError;
use crate::models::{Conversation, Message};
use crate::relay::{GeminiRelay, HttpRelay, Relay};
use crate::server;
use crate::session::ChatSession;
use crate::store::{
    ConversationStore, FileConversationStore, FileStorage, KeyValuePersistence, MemoryStorage,
    PersistencePort,
};

use super::args::{Cli, Commands};

/// Resolve the data directory: explicit, platform data dir, then `~/.geochat`.
fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    dirs::data_dir()
        .map(|d| d.join("geochat"))
        .or_else(|| dirs::home_dir().map(|h| h.join(".geochat")))
        .context("Could not find a data directory; pass --data-dir")
}

fn open_store(data_dir: Option<PathBuf>) -> Result<FileConversationStore> {
    let dir = resolve_data_dir(data_dir)?;
    let storage = FileStorage::open_at(&dir)
        .with_context(|| format!("Failed to open data directory {}", dir.display()))?;
    Ok(ConversationStore::initialize(KeyValuePersistence::new(storage)))
}

async fn chat_with<R: Relay>(
    data_dir: Option<PathBuf>,
    ephemeral: bool,
    relay: &R,
) -> Result<()> {
    if ephemeral {
        let store = ConversationStore::initialize(KeyValuePersistence::new(MemoryStorage::new()));
        run_chat(ChatSession::new(store), relay).await
    } else {
        run_chat(ChatSession::new(open_store(data_dir)?), relay).await
    }
}

/// Execute the CLI command.
pub async fn execute(cli: Cli) -> Result<()> {
    let Cli { data_dir, command } = cli;

    match command {
        Commands::Serve { port, upstream } => {
            let relay = GeminiRelay::new(upstream.to_config())?;
            server::start_server(port, relay).await
        }
        Commands::Chat {
            server,
            direct,
            ephemeral,
            upstream,
        } => {
            if direct {
                let relay = GeminiRelay::new(upstream.to_config())?;
                chat_with(data_dir, ephemeral, &relay).await
            } else {
                let relay = HttpRelay::new(&server)?;
                debug!(url = relay.url(), "Using relay server");
                chat_with(data_dir, ephemeral, &relay).await
            }
        }
        Commands::List => {
            list_conversations(&open_store(data_dir)?);
            Ok(())
        }
        Commands::Show { id } => {
            let store = open_store(data_dir)?;
            let id = id.unwrap_or_else(|| store.active_id().to_string());
            let Some(conversation) = store.conversation(&id) else {
                bail!("No conversation with id {id}");
            };
            print_transcript(conversation);
            Ok(())
        }
        Commands::New => {
            let mut store = open_store(data_dir)?;
            let conversation = store.create_conversation();
            println!("Started {} ({})", conversation.name, conversation.id);
            Ok(())
        }
        Commands::Rename { id, name } => {
            let mut store = open_store(data_dir)?;
            let name = name.join(" ");
            if store.conversation(&id).is_none() {
                bail!("No conversation with id {id}");
            }
            if !store.rename_conversation(&id, &name) {
                bail!("Conversation name cannot be empty");
            }
            println!("Renamed {id} to {}", name.trim());
            Ok(())
        }
        Commands::Use { id } => {
            let mut store = open_store(data_dir)?;
            if !store.set_active(&id) {
                bail!("No conversation with id {id}");
            }
            println!("Active conversation: {}", store.active().name);
            Ok(())
        }
        Commands::Clear => {
            let mut store = open_store(data_dir)?;
            store.clear_active();
            println!("Cleared {}", store.active().name);
            Ok(())
        }
        Commands::Reset => {
            let mut store = open_store(data_dir)?;
            store.reset();
            println!("Deleted all saved conversations");
            Ok(())
        }
    }
}

// === Output ===

fn list_conversations<P: PersistencePort>(store: &ConversationStore<P>) {
    for conversation in store.conversations() {
        let marker = if conversation.id == store.active_id() {
            "*"
        } else {
            " "
        };
        let created = conversation
            .created_at()
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        println!(
            "{marker} {}  {}  ({} messages, created {created})",
            conversation.id,
            conversation.name,
            conversation.messages.len()
        );
    }
}

fn print_message(message: &Message) {
    println!("{}: {}\n", message.sender, message.text);
}

fn print_transcript(conversation: &Conversation) {
    println!("== {} ==\n", conversation.name);
    for message in &conversation.messages {
        print_message(message);
    }
}

// === Interactive chat ===

/// A `/command` typed at the chat prompt.
#[derive(Debug, PartialEq, Eq)]
enum SlashCommand {
    New,
    List,
    Switch(String),
    Rename(String),
    Clear,
    Help,
    Quit,
    Unknown(String),
}

impl SlashCommand {
    /// Parse the text after the leading `/`.
    fn parse(input: &str) -> Self {
        let (name, rest) = input
            .trim()
            .split_once(char::is_whitespace)
            .map_or((input.trim(), ""), |(n, r)| (n, r.trim()));
        match name {
            "new" => Self::New,
            "list" => Self::List,
            "switch" | "use" => Self::Switch(rest.to_string()),
            "rename" => Self::Rename(rest.to_string()),
            "clear" => Self::Clear,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

const CHAT_HELP: &str = "\
/new             start a new conversation
/list            list conversations
/switch <id>     switch to another conversation
/rename <name>   rename the current conversation
/clear           reset the current conversation
/quit            leave";

/// Apply a slash command. Returns `false` when the chat should end.
fn apply_slash<P: PersistencePort>(session: &mut ChatSession<P>, command: SlashCommand) -> bool {
    let store = session.store_mut();
    match command {
        SlashCommand::New => {
            let conversation = store.create_conversation();
            print_transcript(conversation);
        }
        SlashCommand::List => list_conversations(store),
        SlashCommand::Switch(id) => {
            if store.set_active(&id) {
                print_transcript(store.active());
            } else {
                println!("No conversation with id {id}");
            }
        }
        SlashCommand::Rename(name) => {
            let id = store.active_id().to_string();
            if store.rename_conversation(&id, &name) {
                println!("Renamed to {}", store.active().name);
            } else {
                println!("Conversation name cannot be empty");
            }
        }
        SlashCommand::Clear => {
            store.clear_active();
            print_transcript(store.active());
        }
        SlashCommand::Help => println!("{CHAT_HELP}"),
        SlashCommand::Quit => return false,
        SlashCommand::Unknown(name) => println!("Unknown command /{name}, try /help"),
    }
    true
}

async fn run_chat<P, R>(mut session: ChatSession<P>, relay: &R) -> Result<()>
where
    P: PersistencePort,
    R: Relay,
{
    print_transcript(session.store().active());
    println!("Type /help for commands.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{}> ", session.store().active().name);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };

        if let Some(command) = line.trim_start().strip_prefix('/') {
            if !apply_slash(&mut session, SlashCommand::parse(command)) {
                break;
            }
            continue;
        }

        let pending = match session.begin_send(&line) {
            Ok(pending) => pending,
            Err(SessionError::EmptyMessage) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        println!("Gemini AI is typing...");
        let outcome = relay.respond(&pending.message, &pending.history).await;
        let reply = session.complete(pending, outcome);
        print_message(&reply);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayError;
    use tempfile::tempdir;

    #[test]
    fn parse_slash_commands() {
        assert_eq!(SlashCommand::parse("new"), SlashCommand::New);
        assert_eq!(
            SlashCommand::parse("switch  abc "),
            SlashCommand::Switch("abc".to_string())
        );
        assert_eq!(
            SlashCommand::parse("rename Ocean Currents"),
            SlashCommand::Rename("Ocean Currents".to_string())
        );
        assert_eq!(SlashCommand::parse("quit"), SlashCommand::Quit);
        assert_eq!(
            SlashCommand::parse("frobnicate"),
            SlashCommand::Unknown("frobnicate".to_string())
        );
    }

    #[test]
    fn slash_rename_and_quit() {
        let mut session = ChatSession::new(ConversationStore::initialize(
            KeyValuePersistence::new(MemoryStorage::new()),
        ));
        assert!(apply_slash(
            &mut session,
            SlashCommand::Rename("Glaciers".to_string())
        ));
        assert_eq!(session.store().active().name, "Glaciers");
        assert!(!apply_slash(&mut session, SlashCommand::Quit));
    }

    #[test]
    fn store_persists_between_opens() {
        let dir = tempdir().unwrap();
        let data_dir = Some(dir.path().to_path_buf());

        let id = {
            let mut store = open_store(data_dir.clone()).unwrap();
            let id = store.create_conversation().id.clone();
            store.rename_conversation(&id, "Hydrology");
            id
        };

        let store = open_store(data_dir).unwrap();
        assert_eq!(store.active_id(), id);
        assert_eq!(store.active().name, "Hydrology");
        assert_eq!(store.conversations().len(), 2);
    }

    /// Relay answering every turn with its message count.
    struct CountingRelay;

    impl Relay for CountingRelay {
        async fn respond(
            &self,
            message: &str,
            history: &[Message],
        ) -> Result<String, RelayError> {
            Ok(format!("{message}: {} before", history.len()))
        }
    }

    #[tokio::test]
    async fn relay_trait_drives_session() {
        let mut session = ChatSession::new(ConversationStore::initialize(
            KeyValuePersistence::new(MemoryStorage::new()),
        ));
        let pending = session.begin_send("hello").unwrap();
        let outcome = CountingRelay
            .respond(&pending.message, &pending.history)
            .await;
        let reply = session.complete(pending, outcome);
        assert_eq!(reply.text, "hello: 1 before");
    }
}
