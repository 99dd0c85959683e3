//! The four-step listing-creation wizard.
//!
//! Step gating is intentionally lighter than the full schema: `next()`
//! only checks the current step's required fields, while `submit()` runs
//! the whole schema before producing a [`SubmissionPlan`]. Submission is a
//! state-machine transition that only exists on the last step; there are
//! no other guards anywhere in the UI.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::api::error::ApiError;
use crate::api::models::Listing;
use crate::constants::TransportType;
use crate::forms::photos::{PhotoAttachment, PhotoSet};
use crate::forms::validation::{
    self, ValidationError, parse_date, parse_optional_date, parse_optional_positive,
    require_date_order, require_min_len, require_positive, require_text,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    General,
    Cities,
    DetailsOptions,
    PhotosReview,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::General,
        WizardStep::Cities,
        WizardStep::DetailsOptions,
        WizardStep::PhotosReview,
    ];

    pub fn index(self) -> usize {
        match self {
            WizardStep::General => 0,
            WizardStep::Cities => 1,
            WizardStep::DetailsOptions => 2,
            WizardStep::PhotosReview => 3,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::General => "Informations générales",
            WizardStep::Cities => "Villes et dates",
            WizardStep::DetailsOptions => "Détails et options",
            WizardStep::PhotosReview => "Photos et récapitulatif",
        }
    }

    fn next(self) -> Option<WizardStep> {
        WizardStep::ALL.get(self.index() + 1).copied()
    }

    fn prev(self) -> Option<WizardStep> {
        self.index().checked_sub(1).map(|i| WizardStep::ALL[i])
    }
}

/// Raw field state, mirroring the entries on screen. Numeric and date
/// fields stay as text until validation; empty text means "absent".
#[derive(Debug, Clone, Default)]
pub struct ListingDraft {
    pub titre: String,
    pub description: String,
    pub type_transport: Option<TransportType>,
    pub ville_depart: String,
    pub ville_arrivee: String,
    pub date_debut: String,
    pub date_fin: String,
    pub poids: String,
    pub longueur: String,
    pub largeur: String,
    pub hauteur: String,
    pub budget: String,
    pub chargement: bool,
    pub dechargement: bool,
    pub montage: bool,
    pub emballage: bool,
    pub urgent: bool,
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("la soumission n'est possible qu'à la dernière étape")]
    NotAtFinalStep,
    #[error("le formulaire contient des erreurs")]
    Invalid(Vec<ValidationError>),
}

/// Everything `submit()` decided: the create payload and the photos to
/// upload once the backend hands back a listing id.
#[derive(Debug)]
pub struct SubmissionPlan {
    pub payload: Value,
    pub photos: Vec<PhotoAttachment>,
}

#[derive(Debug, Error)]
pub enum SubmitFailure {
    #[error(transparent)]
    Create(#[from] ApiError),
    /// The listing exists; only the photos are missing. Not rolled back.
    #[error("annonce créée, mais l'envoi des photos a échoué : {error}")]
    Photos { listing: Box<Listing>, error: ApiError },
}

/// Runs the two network legs in order: one create call, then one photo
/// upload scoped to the returned id, skipped when there are no photos.
/// A photo failure leaves the created listing in place.
pub async fn submit_listing<C, U, CFut, UFut>(
    plan: &SubmissionPlan,
    create: C,
    upload: U,
) -> Result<Listing, SubmitFailure>
where
    C: FnOnce(Value) -> CFut,
    CFut: std::future::Future<Output = Result<Listing, ApiError>>,
    U: FnOnce(String, Vec<PhotoAttachment>) -> UFut,
    UFut: std::future::Future<Output = Result<(), ApiError>>,
{
    let listing = create(plan.payload.clone()).await?;
    if !plan.photos.is_empty() {
        if let Err(error) = upload(listing.id.clone(), plan.photos.clone()).await {
            return Err(SubmitFailure::Photos { listing: Box::new(listing), error });
        }
    }
    Ok(listing)
}

pub struct ListingWizard {
    step: WizardStep,
    pub draft: ListingDraft,
    pub photos: PhotoSet,
}

impl ListingWizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::General,
            draft: ListingDraft::default(),
            photos: PhotoSet::new(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// Advance one step if the current step's required fields hold.
    /// On failure the wizard stays in place and the single blocking
    /// message is returned for the toast.
    pub fn next(&mut self) -> Result<WizardStep, ValidationError> {
        self.check_step(self.step)?;
        if let Some(n) = self.step.next() {
            self.step = n;
        }
        Ok(self.step)
    }

    /// Going back never validates.
    pub fn prev(&mut self) -> WizardStep {
        if let Some(p) = self.step.prev() {
            self.step = p;
        }
        self.step
    }

    /// Lightweight per-step gate, not the full schema.
    pub fn check_step(&self, step: WizardStep) -> Result<(), ValidationError> {
        let d = &self.draft;
        match step {
            WizardStep::General => {
                require_text("titre", "Titre", &d.titre)?;
                if d.type_transport.is_none() {
                    return Err(ValidationError::new("typeTransport", "Type de transport requis"));
                }
                Ok(())
            }
            WizardStep::Cities => {
                require_text("villeDepart", "Ville de départ", &d.ville_depart)?;
                require_text("villeArrivee", "Ville d'arrivée", &d.ville_arrivee)?;
                let debut = parse_date("dateDebut", "Date de départ", &d.date_debut)?;
                if let Some(fin) = parse_optional_date("dateFin", "Date d'arrivée", &d.date_fin)? {
                    require_date_order("dateFin", debut, fin)?;
                }
                Ok(())
            }
            WizardStep::DetailsOptions => {
                if d.type_transport.is_some_and(|t| t.requires_dimensions()) {
                    require_positive("longueur", "Longueur", &d.longueur)?;
                    require_positive("largeur", "Largeur", &d.largeur)?;
                    require_positive("hauteur", "Hauteur", &d.hauteur)?;
                }
                parse_optional_positive("poids", "Poids", &d.poids)?;
                parse_optional_positive("budget", "Budget", &d.budget)?;
                Ok(())
            }
            WizardStep::PhotosReview => Ok(()),
        }
    }

    /// Only valid from the last step; runs the full schema and builds the
    /// create payload (optional fields omitted when absent, transport
    /// label mapped to its backend code).
    pub fn submit(&self) -> Result<SubmissionPlan, WizardError> {
        if self.step != WizardStep::PhotosReview {
            return Err(WizardError::NotAtFinalStep);
        }
        let payload = self.validate_full().map_err(WizardError::Invalid)?;
        Ok(SubmissionPlan {
            payload,
            photos: self.photos.as_slice().to_vec(),
        })
    }

    fn validate_full(&self) -> Result<Value, Vec<ValidationError>> {
        let d = &self.draft;
        let mut errors: Vec<ValidationError> = Vec::new();
        let push = |res: Result<(), ValidationError>, errors: &mut Vec<ValidationError>| {
            if let Err(e) = res {
                errors.push(e);
            }
        };

        push(require_text("titre", "Titre", &d.titre), &mut errors);
        push(
            require_min_len("description", "Description", &d.description, 10),
            &mut errors,
        );
        let ttype = match d.type_transport {
            Some(t) => Some(t),
            None => {
                errors.push(ValidationError::new("typeTransport", "Type de transport requis"));
                None
            }
        };
        push(require_text("villeDepart", "Ville de départ", &d.ville_depart), &mut errors);
        push(require_text("villeArrivee", "Ville d'arrivée", &d.ville_arrivee), &mut errors);

        let debut = match parse_date("dateDebut", "Date de départ", &d.date_debut) {
            Ok(v) => Some(v),
            Err(e) => {
                errors.push(e);
                None
            }
        };
        let fin = match parse_optional_date("dateFin", "Date d'arrivée", &d.date_fin) {
            Ok(v) => v,
            Err(e) => {
                errors.push(e);
                None
            }
        };
        if let (Some(debut), Some(fin)) = (debut, fin) {
            push(require_date_order("dateFin", debut, fin), &mut errors);
        }

        let poids = match parse_optional_positive("poids", "Poids", &d.poids) {
            Ok(v) => v,
            Err(e) => {
                errors.push(e);
                None
            }
        };
        let budget = match parse_optional_positive("budget", "Budget", &d.budget) {
            Ok(v) => v,
            Err(e) => {
                errors.push(e);
                None
            }
        };

        // Dimensions only exist for package-like transport types; for the
        // others the fields are ignored even if filled in.
        let mut dims: Option<(f64, f64, f64)> = None;
        if ttype.is_some_and(|t| t.requires_dimensions()) {
            let l = Self::collect_positive("longueur", "Longueur", &d.longueur, &mut errors);
            let w = Self::collect_positive("largeur", "Largeur", &d.largeur, &mut errors);
            let h = Self::collect_positive("hauteur", "Hauteur", &d.hauteur, &mut errors);
            if let (Some(l), Some(w), Some(h)) = (l, w, h) {
                dims = Some((l, w, h));
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let ttype = ttype.expect("checked above");
        let mut map = Map::new();
        map.insert("titre".into(), Value::String(d.titre.trim().to_string()));
        map.insert("description".into(), Value::String(d.description.trim().to_string()));
        map.insert("typeTransport".into(), Value::String(ttype.code().to_string()));
        map.insert("villeDepart".into(), Value::String(d.ville_depart.trim().to_string()));
        map.insert("villeArrivee".into(), Value::String(d.ville_arrivee.trim().to_string()));
        map.insert("dateDebut".into(), Value::String(d.date_debut.trim().to_string()));
        if !d.date_fin.trim().is_empty() {
            map.insert("dateFin".into(), Value::String(d.date_fin.trim().to_string()));
        }
        if let Some(p) = poids {
            map.insert("poids".into(), json_number(p));
        }
        if let Some(b) = budget {
            map.insert("budget".into(), json_number(b));
        }
        if let Some((l, w, h)) = dims {
            let mut dim_map = Map::new();
            dim_map.insert("longueur".into(), json_number(l));
            dim_map.insert("largeur".into(), json_number(w));
            dim_map.insert("hauteur".into(), json_number(h));
            map.insert("dimensions".into(), Value::Object(dim_map));
            map.insert("volume".into(), json_number(volume_m3(h, w, l)));
        }
        let mut options = Map::new();
        options.insert("chargement".into(), Value::Bool(d.chargement));
        options.insert("dechargement".into(), Value::Bool(d.dechargement));
        options.insert("montage".into(), Value::Bool(d.montage));
        options.insert("emballage".into(), Value::Bool(d.emballage));
        map.insert("options".into(), Value::Object(options));
        map.insert("urgent".into(), Value::Bool(d.urgent));

        Ok(Value::Object(map))
    }

    fn collect_positive(
        field: &'static str,
        label: &str,
        value: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Option<f64> {
        match validation::require_positive(field, label, value) {
            Ok(v) => Some(v),
            Err(e) => {
                errors.push(e);
                None
            }
        }
    }
}

/// Dimensions are entered in centimetres; volume travels in cubic metres,
/// rounded to 2 decimals.
pub fn volume_m3(hauteur: f64, largeur: f64, longueur: f64) -> f64 {
    let v = (hauteur * largeur * longueur) / 1_000_000.0;
    (v * 100.0).round() / 100.0
}

fn json_number(v: f64) -> Value {
    serde_json::Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;

    fn tomorrow() -> String {
        chrono::Local::now()
            .date_naive()
            .succ_opt()
            .unwrap()
            .format("%Y-%m-%d")
            .to_string()
    }

    fn photo(name: &str) -> PhotoAttachment {
        PhotoAttachment {
            path: PathBuf::from(format!("/tmp/{name}")),
            name: name.to_string(),
            len: 1024,
            mime: "image/jpeg".to_string(),
        }
    }

    fn filled_wizard(ttype: TransportType) -> ListingWizard {
        let mut w = ListingWizard::new();
        w.draft.titre = "Colis de Casablanca à Rabat".into();
        w.draft.description = "Deux cartons de livres bien emballés".into();
        w.draft.type_transport = Some(ttype);
        w.draft.ville_depart = "Casablanca".into();
        w.draft.ville_arrivee = "Rabat".into();
        w.draft.date_debut = tomorrow();
        if ttype.requires_dimensions() {
            w.draft.longueur = "50".into();
            w.draft.largeur = "40".into();
            w.draft.hauteur = "30".into();
        }
        w
    }

    fn advance_to_last(w: &mut ListingWizard) {
        w.next().unwrap();
        w.next().unwrap();
        w.next().unwrap();
        assert_eq!(w.step(), WizardStep::PhotosReview);
    }

    fn fake_listing(id: &str) -> Listing {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "titre": "t",
            "description": "d",
            "typeTransport": "colis",
            "villeDepart": "Casablanca",
            "villeArrivee": "Rabat",
            "dateDebut": "2026-08-10",
        }))
        .unwrap()
    }

    #[test]
    fn test_empty_title_blocks_step_one_with_single_message() {
        let mut w = ListingWizard::new();
        w.draft.type_transport = Some(TransportType::Colis);
        let err = w.next().unwrap_err();
        assert_eq!(w.step(), WizardStep::General);
        assert_eq!(err.message, "Titre requis");
    }

    #[test]
    fn test_prev_is_unconditional() {
        let mut w = filled_wizard(TransportType::Colis);
        w.next().unwrap();
        w.draft.titre.clear();
        assert_eq!(w.prev(), WizardStep::General);
        assert_eq!(w.prev(), WizardStep::General);
    }

    #[test]
    fn test_submit_rejected_before_last_step() {
        let w = filled_wizard(TransportType::Colis);
        assert!(matches!(w.submit(), Err(WizardError::NotAtFinalStep)));
    }

    #[test]
    fn test_full_schema_catches_what_step_gating_let_through() {
        let mut w = filled_wizard(TransportType::Colis);
        w.draft.description = "court".into();
        advance_to_last(&mut w);
        match w.submit() {
            Err(WizardError::Invalid(errors)) => {
                assert!(errors.iter().any(|e| e.field == "description"));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_dimensions_omitted_for_bulky_types() {
        let mut w = filled_wizard(TransportType::Demenagement);
        // Even with leftover dimension text, the payload must not carry it.
        w.draft.longueur = "120".into();
        w.draft.largeur = "80".into();
        w.draft.hauteur = "60".into();
        advance_to_last(&mut w);
        let plan = w.submit().unwrap();
        assert!(plan.payload.get("dimensions").is_none());
        assert!(plan.payload.get("volume").is_none());
        assert_eq!(plan.payload["typeTransport"], "demenagement");
    }

    #[test]
    fn test_dimensions_and_volume_for_package_types() {
        let mut w = filled_wizard(TransportType::Carton);
        advance_to_last(&mut w);
        let plan = w.submit().unwrap();
        let dims = &plan.payload["dimensions"];
        assert_eq!(dims["longueur"], 50.0);
        assert_eq!(dims["hauteur"], 30.0);
        // 30 * 40 * 50 cm³ = 0.06 m³
        assert_eq!(plan.payload["volume"], 0.06);
    }

    #[test]
    fn test_volume_rounded_to_two_decimals() {
        assert_eq!(volume_m3(67.0, 45.0, 123.0), 0.37);
        assert_eq!(volume_m3(100.0, 100.0, 100.0), 1.0);
        assert_eq!(volume_m3(30.0, 40.0, 50.0), 0.06);
    }

    #[test]
    fn test_optional_fields_omitted_when_empty() {
        let mut w = filled_wizard(TransportType::Colis);
        advance_to_last(&mut w);
        let plan = w.submit().unwrap();
        assert!(plan.payload.get("poids").is_none());
        assert!(plan.payload.get("budget").is_none());
        assert!(plan.payload.get("dateFin").is_none());
    }

    #[test]
    fn test_date_fin_before_date_debut_rejected() {
        let mut w = filled_wizard(TransportType::Colis);
        w.draft.date_fin = "2020-01-01".into();
        w.next().unwrap();
        // Step 1 passes; the step 2 gate trips on the ordering rule.
        let blocked = w.next().unwrap_err();
        assert_eq!(blocked.field, "dateFin");
        assert_eq!(w.step(), WizardStep::Cities);
    }

    #[tokio::test]
    async fn test_submit_runs_create_then_scoped_upload() {
        let mut w = filled_wizard(TransportType::Colis);
        w.photos.add(vec![photo("a.jpg"), photo("b.jpg")]);
        advance_to_last(&mut w);
        let plan = w.submit().unwrap();

        let calls: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let result = submit_listing(
            &plan,
            |payload| {
                calls.borrow_mut().push("create".to_string());
                assert_eq!(payload["typeTransport"], "colis");
                assert_eq!(payload["villeDepart"], "Casablanca");
                assert_eq!(payload["villeArrivee"], "Rabat");
                async { Ok(fake_listing("a42")) }
            },
            |listing_id, photos| {
                calls.borrow_mut().push(format!("upload:{}:{}", listing_id, photos.len()));
                async { Ok(()) }
            },
        )
        .await
        .unwrap();

        assert_eq!(result.id, "a42");
        assert_eq!(*calls.borrow(), vec!["create".to_string(), "upload:a42:2".to_string()]);
    }

    #[tokio::test]
    async fn test_no_upload_leg_without_photos() {
        let mut w = filled_wizard(TransportType::Colis);
        advance_to_last(&mut w);
        let plan = w.submit().unwrap();

        let calls: RefCell<Vec<String>> = RefCell::new(Vec::new());
        submit_listing(
            &plan,
            |_| {
                calls.borrow_mut().push("create".to_string());
                async { Ok(fake_listing("a1")) }
            },
            |_, _| {
                calls.borrow_mut().push("upload".to_string());
                async { Ok(()) }
            },
        )
        .await
        .unwrap();
        assert_eq!(*calls.borrow(), vec!["create".to_string()]);
    }

    #[tokio::test]
    async fn test_photo_failure_keeps_created_listing() {
        let mut w = filled_wizard(TransportType::Colis);
        w.photos.add(vec![photo("a.jpg")]);
        advance_to_last(&mut w);
        let plan = w.submit().unwrap();

        let result = submit_listing(
            &plan,
            |_| async { Ok(fake_listing("a7")) },
            |_, _| async { Err(ApiError::Network("timeout".into())) },
        )
        .await;

        match result {
            Err(SubmitFailure::Photos { listing, .. }) => assert_eq!(listing.id, "a7"),
            other => panic!("expected Photos failure, got {other:?}"),
        }
    }
}
