use crate::config::Config;
use crate::error::Result;
use crate::providers::Role;
use crate::storage::{ConversationStore, ConversationTurn, SqliteStorage};
use colored::Colorize;
use prettytable::{format, Table};

const PREVIEW_CHARS: usize = 80;

/// Print every turn of a conversation
pub async fn handle_history(config: &Config, conversation_id: &str) -> Result<()> {
    let storage = SqliteStorage::new(&config.storage)?;
    let turns = storage.list_by_conversation(conversation_id).await?;

    if turns.is_empty() {
        println!(
            "{}",
            format!("No turns found for conversation {}.", conversation_id).yellow()
        );
        return Ok(());
    }

    println!("\nConversation {}:", conversation_id.cyan());
    history_table(&turns).printstd();
    println!();

    Ok(())
}

fn history_table(turns: &[ConversationTurn]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "Time".bold(),
        "Role".bold(),
        "Message".bold()
    ]);

    for turn in turns {
        let role = match turn.role {
            Role::User => turn.role.as_str().green(),
            Role::Assistant => turn.role.as_str().blue(),
        };
        table.add_row(prettytable::row![
            turn.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            role,
            preview(&turn.content)
        ]);
    }

    table
}

/// First line of `content`, cut to a readable width
fn preview(content: &str) -> String {
    let line = content.lines().next().unwrap_or_default();
    if line.chars().count() > PREVIEW_CHARS {
        let cut: String = line.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{}...", cut)
    } else if content.lines().nth(1).is_some() {
        format!("{} ...", line)
    } else {
        line.to_string()
    }
}
