use crate::error::GameError;

/// Parses a position written as column digits in play order, e.g. `"0011223"`.
/// Whitespace is ignored; range checks happen when the columns are replayed.
pub fn parse_history(history: &str) -> Result<Vec<usize>, GameError> {
    history
        .chars()
        .enumerate()
        .filter(|(_, ch)| !ch.is_whitespace())
        .map(|(position, ch)| {
            ch.to_digit(10)
                .map(|digit| digit as usize)
                .ok_or_else(|| GameError::ParseMove {
                    position,
                    reason: format!("expected column digit, found {ch}"),
                })
        })
        .collect()
}
