use crate::models::{Game, NewGame};

const DEMO_GAMES: &[(&str, &str)] = &[
    ("Fibbage XL", "Party Pack 1"),
    ("Drawful", "Party Pack 1"),
    ("Quiplash XL", "Party Pack 2"),
    ("Bidiots", "Party Pack 2"),
    ("Earwax", "Party Pack 2"),
    ("Quiplash 2", "Party Pack 3"),
    ("Trivia Murder Party", "Party Pack 3"),
    ("Guesspionage", "Party Pack 3"),
    ("Tee K.O.", "Party Pack 3"),
    ("Fibbage 3", "Party Pack 4"),
    ("Survive the Internet", "Party Pack 4"),
    ("Bracketeering", "Party Pack 4"),
    ("Split the Room", "Party Pack 5"),
    ("Mad Verse City", "Party Pack 5"),
    ("Push The Button", "Party Pack 6"),
    ("Joke Boat", "Party Pack 6"),
];

/// Catalog seeded into an empty database.
pub fn demo_games() -> Vec<NewGame> {
    DEMO_GAMES
        .iter()
        .map(|(name, pack)| NewGame {
            name: name.to_string(),
            pack: Some(pack.to_string()),
            img: None,
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameFilter {
    pub name: Option<String>,
    pub pack: Option<String>,
}

impl GameFilter {
    pub fn matches(&self, game: &Game) -> bool {
        let name_ok = match self.name.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => game
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        };
        let pack_ok = match self.pack.as_deref() {
            Some(pack) if !pack.is_empty() => game.pack.as_deref() == Some(pack),
            _ => true,
        };
        name_ok && pack_ok
    }

    pub fn apply(&self, games: Vec<Game>) -> Vec<Game> {
        games.into_iter().filter(|g| self.matches(g)).collect()
    }
}

/// Distinct non-empty pack names, sorted.
pub fn packs(games: &[Game]) -> Vec<String> {
    let mut packs: Vec<String> = games
        .iter()
        .filter_map(|g| g.pack.clone())
        .filter(|p| !p.is_empty())
        .collect();
    packs.sort();
    packs.dedup();
    packs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashSet;

    fn game(name: &str, pack: Option<&str>) -> Game {
        Game {
            id: name.to_lowercase(),
            name: name.to_string(),
            pack: pack.map(str::to_string),
            img: None,
            created: Utc::now(),
            updated: Utc::now(),
        }
    }

    #[test]
    fn demo_names_are_unique() {
        let games = demo_games();
        assert!(!games.is_empty());
        let names: HashSet<&str> = games.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names.len(), games.len());
    }

    #[test]
    fn name_filter_is_case_insensitive() {
        let filter = GameFilter {
            name: Some("QUIP".into()),
            pack: None,
        };
        assert!(filter.matches(&game("Quiplash 2", Some("Party Pack 3"))));
        assert!(!filter.matches(&game("Drawful", None)));
    }

    #[test]
    fn pack_filter_is_exact() {
        let filter = GameFilter {
            name: None,
            pack: Some("Party Pack 3".into()),
        };
        let kept = filter.apply(vec![
            game("Quiplash 2", Some("Party Pack 3")),
            game("Quiplash XL", Some("Party Pack 2")),
            game("Drawful", None),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "Quiplash 2");
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let games = vec![game("A", None), game("B", Some(""))];
        assert_eq!(GameFilter::default().apply(games.clone()), games);
    }

    #[test]
    fn packs_are_sorted_and_distinct() {
        let games = vec![
            game("A", Some("Party Pack 3")),
            game("B", Some("Party Pack 1")),
            game("C", Some("Party Pack 3")),
            game("D", Some("")),
            game("E", None),
        ];
        assert_eq!(packs(&games), vec!["Party Pack 1", "Party Pack 3"]);
    }
}
