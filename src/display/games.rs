//! Debug listing of stored games

use crate::models::GameSummary;

/// Format every game's title and identifier, flagging records that look wrong
pub fn format_game_list(games: &[GameSummary]) -> String {
    if games.is_empty() {
        return "No games found.".to_string();
    }

    let mut output = String::new();
    output.push_str("Games in the database\n");
    output.push_str("=====================\n");

    for game in games {
        output.push_str(&format!("{}. {}\n", game.index, game.title));
        output.push_str(&format!("   ID:      {}\n", game.id));
        output.push_str(&format!("   ID type: {}\n", game.id_type));
        for issue in &game.issues {
            output.push_str(&format!("   ! {}\n", issue));
        }
        output.push('\n');
    }

    let non_oid = games.iter().filter(|g| !g.has_object_id()).count();
    output.push_str(&format!("Total: {} game(s)", games.len()));
    if non_oid > 0 {
        output.push_str(&format!(", {} without an ObjectId", non_oid));
    }
    output.push('\n');
    output
}
