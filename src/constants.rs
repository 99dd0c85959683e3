//! Domain tables and limits shared across forms and views.

/// Transport categories a listing can be posted under.
///
/// `code()` is the enum value the backend expects; `label()` is what the
/// dropdowns display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportType {
    Colis,
    Palette,
    Carton,
    Fragile,
    Demenagement,
    Vehicule,
    Meuble,
    Autre,
}

impl TransportType {
    pub const ALL: [TransportType; 8] = [
        TransportType::Colis,
        TransportType::Palette,
        TransportType::Carton,
        TransportType::Fragile,
        TransportType::Demenagement,
        TransportType::Vehicule,
        TransportType::Meuble,
        TransportType::Autre,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TransportType::Colis => "Colis",
            TransportType::Palette => "Palette",
            TransportType::Carton => "Carton",
            TransportType::Fragile => "Fragile",
            TransportType::Demenagement => "Déménagement",
            TransportType::Vehicule => "Véhicule",
            TransportType::Meuble => "Meuble",
            TransportType::Autre => "Autre",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            TransportType::Colis => "colis",
            TransportType::Palette => "palette",
            TransportType::Carton => "carton",
            TransportType::Fragile => "fragile",
            TransportType::Demenagement => "demenagement",
            TransportType::Vehicule => "vehicule",
            TransportType::Meuble => "meuble",
            TransportType::Autre => "autre",
        }
    }

    pub fn from_label(label: &str) -> Option<TransportType> {
        Self::ALL.iter().copied().find(|t| t.label() == label)
    }

    pub fn from_code(code: &str) -> Option<TransportType> {
        Self::ALL.iter().copied().find(|t| t.code() == code)
    }

    /// Package-like categories must carry explicit dimensions; the bulky
    /// categories (moving, vehicle, furniture) are quoted on description.
    pub fn requires_dimensions(self) -> bool {
        matches!(
            self,
            TransportType::Colis
                | TransportType::Palette
                | TransportType::Carton
                | TransportType::Fragile
        )
    }
}

/// Extra services a client can request on a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingOption {
    Chargement,
    Dechargement,
    Montage,
    Emballage,
}

impl ListingOption {
    pub const ALL: [ListingOption; 4] = [
        ListingOption::Chargement,
        ListingOption::Dechargement,
        ListingOption::Montage,
        ListingOption::Emballage,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ListingOption::Chargement => "Chargement",
            ListingOption::Dechargement => "Déchargement",
            ListingOption::Montage => "Montage",
            ListingOption::Emballage => "Emballage",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            ListingOption::Chargement => "chargement",
            ListingOption::Dechargement => "dechargement",
            ListingOption::Montage => "montage",
            ListingOption::Emballage => "emballage",
        }
    }
}

/// Photo attachment limits for a listing.
pub const MAX_LISTING_PHOTOS: usize = 5;
pub const MAX_PHOTO_BYTES: u64 = 5 * 1024 * 1024;

/// City autocomplete never shows more than this many suggestions.
pub const MAX_CITY_SUGGESTIONS: usize = 10;

/// A review comment shorter than this is rejected before any network call.
pub const MIN_REVIEW_COMMENT_LEN: usize = 10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_code_round_trip() {
        for t in TransportType::ALL {
            assert_eq!(TransportType::from_label(t.label()), Some(t));
            assert_eq!(TransportType::from_code(t.code()), Some(t));
        }
    }

    #[test]
    fn test_dimension_requirement_set() {
        let required: Vec<&str> = TransportType::ALL
            .iter()
            .filter(|t| t.requires_dimensions())
            .map(|t| t.code())
            .collect();
        assert_eq!(required, ["colis", "palette", "carton", "fragile"]);
    }
}
