use crate::cli::FlashcardCommand;
use crate::config::Config;
use crate::error::{FlashtutorError, Result};
use crate::storage::{FlashcardSet, FlashcardSetSummary, FlashcardStore, SqliteStorage};
use colored::Colorize;
use prettytable::{format, Table};

/// Handle flashcard browsing commands
pub async fn handle_flashcards(config: &Config, command: FlashcardCommand) -> Result<()> {
    let storage = SqliteStorage::new(&config.storage)?;

    match command {
        FlashcardCommand::List => {
            let sets = storage.list_summaries().await?;

            if sets.is_empty() {
                println!("{}", "No flashcard sets found.".yellow());
                return Ok(());
            }

            println!("\nFlashcard Sets:");
            summary_table(&sets).printstd();
            println!();
            println!(
                "Use {} to view a set.",
                "flashtutor flashcards show <ID>".cyan()
            );
            println!();
        }
        FlashcardCommand::Show { id } => {
            let set = storage
                .get(&id)
                .await?
                .ok_or_else(|| FlashtutorError::NotFound(format!("flashcard set {}", id)))?;

            println!(
                "\n{} {}",
                set.topic.bold(),
                format!("({} cards, {})", set.flashcards.len(), set.created_at.format("%Y-%m-%d %H:%M"))
                    .dimmed()
            );
            card_table(&set).printstd();
            println!();
        }
    }

    Ok(())
}

fn summary_table(sets: &[FlashcardSetSummary]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row!["ID".bold(), "Topic".bold()]);
    for set in sets {
        table.add_row(prettytable::row![set.id.cyan(), set.topic]);
    }
    table
}

fn card_table(set: &FlashcardSet) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row!["#".bold(), "Term".bold(), "Definition".bold()]);
    for (index, card) in set.flashcards.iter().enumerate() {
        table.add_row(prettytable::row![index + 1, card.term, card.definition]);
    }
    table
}
