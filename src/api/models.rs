use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub nom: String,
    #[serde(default)]
    pub prenom: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub nom: String,
    #[serde(default)]
    pub prenom: Option<String>,
    pub email: String,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub ville: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub role: String,
    #[serde(default)]
    pub email_verifie: bool,
    #[serde(default)]
    pub note_moyenne: Option<f64>,
    #[serde(default)]
    pub nombre_avis: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    pub longueur: f64,
    pub largeur: f64,
    pub hauteur: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListingOptions {
    #[serde(default)]
    pub chargement: bool,
    #[serde(default)]
    pub dechargement: bool,
    #[serde(default)]
    pub montage: bool,
    #[serde(default)]
    pub emballage: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ListingSummary {
    pub id: String,
    pub titre: String,
    pub type_transport: String,
    pub ville_depart: String,
    pub ville_arrivee: String,
    pub date_debut: String,
    #[serde(default)]
    pub statut: Option<String>,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub budget: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub titre: String,
    pub description: String,
    pub type_transport: String,
    pub ville_depart: String,
    pub ville_arrivee: String,
    pub date_debut: String,
    #[serde(default)]
    pub date_fin: Option<String>,
    #[serde(default)]
    pub poids: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub options: ListingOptions,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub statut: Option<String>,
    #[serde(default)]
    pub client: Option<UserSummary>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Listing {
    pub fn summary(&self) -> ListingSummary {
        ListingSummary {
            id: self.id.clone(),
            titre: self.titre.clone(),
            type_transport: self.type_transport.clone(),
            ville_depart: self.ville_depart.clone(),
            ville_arrivee: self.ville_arrivee.clone(),
            date_debut: self.date_debut.clone(),
            statut: self.statut.clone(),
            urgent: self.urgent,
            budget: self.budget,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: String,
    pub annonce_id: String,
    #[serde(default)]
    pub transporteur: Option<UserSummary>,
    pub montant: f64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub date_proposee: Option<String>,
    #[serde(default)]
    pub statut: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub note: f64,
    pub commentaire: String,
    #[serde(default)]
    pub auteur: Option<UserSummary>,
    #[serde(default)]
    pub destinataire_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub interlocuteur: String,
    #[serde(default)]
    pub dernier_message: Option<String>,
    #[serde(default)]
    pub non_lus: u32,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub expediteur_id: String,
    pub contenu: String,
    #[serde(default)]
    pub lu: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_wire_keys_are_french_camel_case() {
        let json = serde_json::json!({
            "id": "a1",
            "titre": "Cartons de livres",
            "description": "Trois cartons à livrer",
            "typeTransport": "carton",
            "villeDepart": "Casablanca",
            "villeArrivee": "Rabat",
            "dateDebut": "2026-08-10",
            "dimensions": { "longueur": 50.0, "largeur": 40.0, "hauteur": 30.0 },
            "options": { "chargement": true }
        });
        let listing: Listing = serde_json::from_value(json).unwrap();
        assert_eq!(listing.ville_depart, "Casablanca");
        assert!(listing.options.chargement);
        assert!(!listing.options.emballage);
        assert!(listing.date_fin.is_none());
        let dims = listing.dimensions.unwrap();
        assert_eq!(dims.hauteur, 30.0);
    }
}
