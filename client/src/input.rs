//! Translates typed lines into player intents.

use shared::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Move(Direction),
    Interact,
    Quit,
}

impl Intent {
    pub fn from_key(key: char) -> Option<Self> {
        if let Some(direction) = Direction::from_key(key) {
            return Some(Intent::Move(direction));
        }
        match key.to_ascii_lowercase() {
            'e' => Some(Intent::Interact),
            'q' => Some(Intent::Quit),
            _ => None,
        }
    }
}

/// Every recognised key in `line`, in order. Unknown keys and whitespace
/// are skipped, and nothing after a quit is kept.
pub fn parse_line(line: &str) -> Vec<Intent> {
    let mut intents = Vec::new();
    for intent in line.chars().filter_map(Intent::from_key) {
        intents.push(intent);
        if intent == Intent::Quit {
            break;
        }
    }
    intents
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wasd_keys() {
        assert_eq!(Intent::from_key('w'), Some(Intent::Move(Direction::Up)));
        assert_eq!(Intent::from_key('A'), Some(Intent::Move(Direction::Left)));
        assert_eq!(Intent::from_key('s'), Some(Intent::Move(Direction::Down)));
        assert_eq!(Intent::from_key('d'), Some(Intent::Move(Direction::Right)));
    }

    #[test]
    fn test_action_keys() {
        assert_eq!(Intent::from_key('e'), Some(Intent::Interact));
        assert_eq!(Intent::from_key('Q'), Some(Intent::Quit));
        assert_eq!(Intent::from_key('x'), None);
    }

    #[test]
    fn test_parse_line_keeps_order() {
        assert_eq!(
            parse_line("dd e"),
            vec![
                Intent::Move(Direction::Right),
                Intent::Move(Direction::Right),
                Intent::Interact
            ]
        );
    }

    #[test]
    fn test_parse_line_stops_at_quit() {
        assert_eq!(parse_line("wqd"), vec![Intent::Move(Direction::Up), Intent::Quit]);
        assert!(parse_line("  ?!").is_empty());
    }
}
