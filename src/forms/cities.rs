//! City autocomplete for the departure/arrival fields.

use crate::constants::MAX_CITY_SUGGESTIONS;

/// Cities served by the marketplace. The backend accepts free text; this
/// list only feeds the suggestion dropdown.
pub const CITIES: [&str; 36] = [
    "Agadir",
    "Al Hoceïma",
    "Béni Mellal",
    "Berkane",
    "Berrechid",
    "Casablanca",
    "Dakhla",
    "El Jadida",
    "Errachidia",
    "Essaouira",
    "Fès",
    "Guelmim",
    "Ifrane",
    "Kénitra",
    "Khémisset",
    "Khouribga",
    "Ksar El Kébir",
    "Larache",
    "Laâyoune",
    "Marrakech",
    "Meknès",
    "Mohammedia",
    "Nador",
    "Ouarzazate",
    "Oujda",
    "Rabat",
    "Safi",
    "Salé",
    "Settat",
    "Sidi Kacem",
    "Tanger",
    "Taza",
    "Témara",
    "Tétouan",
    "Tiznit",
    "Youssoufia",
];

/// Suggestions for the text typed so far: cities starting with the input
/// (case-insensitive), falling back to substring matches only when no
/// name starts with it. Capped at [`MAX_CITY_SUGGESTIONS`].
pub fn suggest(input: &str) -> Vec<&'static str> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let mut out: Vec<&'static str> = CITIES
        .iter()
        .copied()
        .filter(|c| c.to_lowercase().starts_with(&needle))
        .take(MAX_CITY_SUGGESTIONS)
        .collect();
    if out.is_empty() {
        out = CITIES
            .iter()
            .copied()
            .filter(|c| c.to_lowercase().contains(&needle))
            .take(MAX_CITY_SUGGESTIONS)
            .collect();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_only_when_prefix_matches_exist() {
        for city in suggest("t") {
            assert!(city.to_lowercase().starts_with('t'), "{city} does not start with t");
        }
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(suggest("casa"), suggest("CASA"));
        assert!(suggest("casa").contains(&"Casablanca"));
    }

    #[test]
    fn test_capped_at_ten() {
        // Single letters hit many names; the cap must hold for all of them.
        for letter in ["a", "b", "c", "e", "k", "m", "s", "t"] {
            assert!(suggest(letter).len() <= MAX_CITY_SUGGESTIONS);
        }
    }

    #[test]
    fn test_substring_fallback() {
        // Nothing starts with "jadid", but El Jadida contains it.
        assert_eq!(suggest("jadid"), vec!["El Jadida"]);
    }

    #[test]
    fn test_empty_input_suggests_nothing() {
        assert!(suggest("").is_empty());
        assert!(suggest("   ").is_empty());
    }
}
