//! Debug listing of the `games` collection

use crate::database::{DocumentDatabase, GAMES_COLLECTION};
use crate::display::format_game_list;
use crate::error::BackupResult;
use crate::models::GameSummary;

/// List every game with its identifier and identifier type
pub async fn games_report(database: &dyn DocumentDatabase) -> BackupResult<String> {
    let documents = database.find_all(GAMES_COLLECTION).await?;
    let games: Vec<GameSummary> = documents
        .iter()
        .enumerate()
        .map(|(i, document)| GameSummary::from_document(i + 1, document))
        .collect();
    Ok(format_game_list(&games))
}
