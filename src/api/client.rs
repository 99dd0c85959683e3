use reqwest::Client as HttpClient;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::models::{
    AuthResponse, Conversation, Listing, ListingSummary, Message, Quote, Review, UserProfile,
};
use crate::forms::photos::PhotoAttachment;

pub struct ApiClient {
    pub http: HttpClient,
}

impl ApiClient {
    pub fn new() -> Self {
        Self { http: HttpClient::new() }
    }

    fn base_api(base_url: &str) -> String {
        let trimmed = base_url.trim_end_matches('/');
        if trimmed.ends_with("/api") { trimmed.to_string() } else { format!("{}/api", trimmed) }
    }

    fn with_auth(req: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
        match token {
            Some(t) => req.header("Authorization", format!("Bearer {}", t)),
            None => req,
        }
    }

    /// Unwrap the backend's `data` envelope, or decode an error body into
    /// the `{ message }` / `{ errors: [...] }` taxonomy.
    async fn take_data<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        let status = resp.status();
        let body: Value = resp.json().await?;
        if !status.is_success() {
            return Err(ApiError::from_body(status.as_u16(), &body));
        }
        let data = body.get("data").cloned().unwrap_or(body);
        serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// For calls where only success matters (password reset, deletes, ...).
    async fn take_ok(resp: reqwest::Response) -> Result<(), ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body: Value = resp.json().await.unwrap_or(Value::Null);
        Err(ApiError::from_body(status.as_u16(), &body))
    }

    // ----- auth -----

    pub async fn login(&self, base_url: &str, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let endpoint = format!("{}/auth/login", Self::base_api(base_url));
        let body = serde_json::json!({ "email": email, "motDePasse": password });
        let resp = self.http.post(&endpoint).json(&body).send().await?;
        Self::take_data(resp).await
    }

    pub async fn register(
        &self,
        base_url: &str,
        nom: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<AuthResponse, ApiError> {
        let endpoint = format!("{}/auth/register", Self::base_api(base_url));
        let body = serde_json::json!({
            "nom": nom,
            "email": email,
            "motDePasse": password,
            "role": role,
        });
        let resp = self.http.post(&endpoint).json(&body).send().await?;
        Self::take_data(resp).await
    }

    pub async fn forgot_password(&self, base_url: &str, email: &str) -> Result<(), ApiError> {
        let endpoint = format!("{}/auth/forgot-password", Self::base_api(base_url));
        let body = serde_json::json!({ "email": email });
        let resp = self.http.post(&endpoint).json(&body).send().await?;
        Self::take_ok(resp).await
    }

    pub async fn reset_password(&self, base_url: &str, reset_token: &str, password: &str) -> Result<(), ApiError> {
        let endpoint = format!("{}/auth/reset-password", Self::base_api(base_url));
        let body = serde_json::json!({ "token": reset_token, "motDePasse": password });
        let resp = self.http.post(&endpoint).json(&body).send().await?;
        Self::take_ok(resp).await
    }

    pub async fn verify_email(&self, base_url: &str, verify_token: &str) -> Result<(), ApiError> {
        let endpoint = format!("{}/auth/verify-email", Self::base_api(base_url));
        let body = serde_json::json!({ "token": verify_token });
        let resp = self.http.post(&endpoint).json(&body).send().await?;
        Self::take_ok(resp).await
    }

    // ----- listings -----

    /// Browse listings, optionally filtered by departure/arrival city.
    pub async fn listings(
        &self,
        base_url: &str,
        token: &str,
        ville_depart: Option<&str>,
        ville_arrivee: Option<&str>,
    ) -> Result<Vec<ListingSummary>, ApiError> {
        let endpoint = format!("{}/annonces", Self::base_api(base_url));
        let mut req = Self::with_auth(self.http.get(&endpoint), Some(token));
        if let Some(v) = ville_depart {
            req = req.query(&[("villeDepart", v)]);
        }
        if let Some(v) = ville_arrivee {
            req = req.query(&[("villeArrivee", v)]);
        }
        let resp = req.send().await?;
        Self::take_data(resp).await
    }

    pub async fn my_listings(&self, base_url: &str, token: &str) -> Result<Vec<ListingSummary>, ApiError> {
        let endpoint = format!("{}/annonces/mes", Self::base_api(base_url));
        let resp = Self::with_auth(self.http.get(&endpoint), Some(token)).send().await?;
        Self::take_data(resp).await
    }

    pub async fn listing(&self, base_url: &str, token: &str, id: &str) -> Result<Listing, ApiError> {
        let endpoint = format!("{}/annonces/{}", Self::base_api(base_url), id);
        let resp = Self::with_auth(self.http.get(&endpoint), Some(token)).send().await?;
        Self::take_data(resp).await
    }

    /// The payload comes pre-built by the wizard (optional fields already
    /// omitted, transport label already mapped to its backend code).
    pub async fn create_listing(&self, base_url: &str, token: &str, payload: &Value) -> Result<Listing, ApiError> {
        let endpoint = format!("{}/annonces", Self::base_api(base_url));
        let resp = Self::with_auth(self.http.post(&endpoint), Some(token))
            .json(payload)
            .send()
            .await?;
        Self::take_data(resp).await
    }

    pub async fn update_listing(&self, base_url: &str, token: &str, id: &str, payload: &Value) -> Result<Listing, ApiError> {
        let endpoint = format!("{}/annonces/{}", Self::base_api(base_url), id);
        let resp = Self::with_auth(self.http.put(&endpoint), Some(token))
            .json(payload)
            .send()
            .await?;
        Self::take_data(resp).await
    }

    pub async fn delete_listing(&self, base_url: &str, token: &str, id: &str) -> Result<(), ApiError> {
        let endpoint = format!("{}/annonces/{}", Self::base_api(base_url), id);
        let resp = Self::with_auth(self.http.delete(&endpoint), Some(token)).send().await?;
        Self::take_ok(resp).await
    }

    /// Second leg of the wizard submission: multipart upload keyed by the
    /// id the create call returned. Failure here leaves the listing as-is.
    pub async fn upload_listing_photos(
        &self,
        base_url: &str,
        token: &str,
        listing_id: &str,
        photos: &[PhotoAttachment],
    ) -> Result<(), ApiError> {
        let endpoint = format!("{}/annonces/{}/photos", Self::base_api(base_url), listing_id);
        let mut form = multipart::Form::new();
        for photo in photos {
            let bytes = tokio::fs::read(&photo.path)
                .await
                .map_err(|e| ApiError::Network(format!("{}: {}", photo.name, e)))?;
            let part = multipart::Part::bytes(bytes)
                .file_name(photo.name.clone())
                .mime_str(&photo.mime)
                .map_err(|e| ApiError::Decode(e.to_string()))?;
            form = form.part("photos", part);
        }
        let resp = Self::with_auth(self.http.post(&endpoint), Some(token))
            .multipart(form)
            .send()
            .await?;
        Self::take_ok(resp).await
    }

    // ----- quotes -----

    pub async fn create_quote(
        &self,
        base_url: &str,
        token: &str,
        annonce_id: &str,
        montant: f64,
        message: Option<&str>,
        date_proposee: Option<&str>,
    ) -> Result<Quote, ApiError> {
        let endpoint = format!("{}/devis", Self::base_api(base_url));
        let mut body = serde_json::json!({ "annonceId": annonce_id, "montant": montant });
        if let Some(m) = message {
            body["message"] = Value::String(m.to_string());
        }
        if let Some(d) = date_proposee {
            body["dateProposee"] = Value::String(d.to_string());
        }
        let resp = Self::with_auth(self.http.post(&endpoint), Some(token))
            .json(&body)
            .send()
            .await?;
        Self::take_data(resp).await
    }

    pub async fn listing_quotes(&self, base_url: &str, token: &str, annonce_id: &str) -> Result<Vec<Quote>, ApiError> {
        let endpoint = format!("{}/annonces/{}/devis", Self::base_api(base_url), annonce_id);
        let resp = Self::with_auth(self.http.get(&endpoint), Some(token)).send().await?;
        Self::take_data(resp).await
    }

    pub async fn my_quotes(&self, base_url: &str, token: &str) -> Result<Vec<Quote>, ApiError> {
        let endpoint = format!("{}/devis/mes", Self::base_api(base_url));
        let resp = Self::with_auth(self.http.get(&endpoint), Some(token)).send().await?;
        Self::take_data(resp).await
    }

    pub async fn accept_quote(&self, base_url: &str, token: &str, quote_id: &str) -> Result<Quote, ApiError> {
        let endpoint = format!("{}/devis/{}/accepter", Self::base_api(base_url), quote_id);
        let resp = Self::with_auth(self.http.put(&endpoint), Some(token)).send().await?;
        Self::take_data(resp).await
    }

    pub async fn refuse_quote(&self, base_url: &str, token: &str, quote_id: &str) -> Result<Quote, ApiError> {
        let endpoint = format!("{}/devis/{}/refuser", Self::base_api(base_url), quote_id);
        let resp = Self::with_auth(self.http.put(&endpoint), Some(token)).send().await?;
        Self::take_data(resp).await
    }

    // ----- reviews -----

    pub async fn create_review(
        &self,
        base_url: &str,
        token: &str,
        destinataire_id: &str,
        note: u8,
        commentaire: &str,
    ) -> Result<Review, ApiError> {
        let endpoint = format!("{}/avis", Self::base_api(base_url));
        let body = serde_json::json!({
            "destinataireId": destinataire_id,
            "note": note,
            "commentaire": commentaire,
        });
        let resp = Self::with_auth(self.http.post(&endpoint), Some(token))
            .json(&body)
            .send()
            .await?;
        Self::take_data(resp).await
    }

    pub async fn user_reviews(&self, base_url: &str, token: &str, user_id: &str) -> Result<Vec<Review>, ApiError> {
        let endpoint = format!("{}/utilisateurs/{}/avis", Self::base_api(base_url), user_id);
        let resp = Self::with_auth(self.http.get(&endpoint), Some(token)).send().await?;
        Self::take_data(resp).await
    }

    // ----- messaging -----

    pub async fn conversations(&self, base_url: &str, token: &str) -> Result<Vec<Conversation>, ApiError> {
        let endpoint = format!("{}/conversations", Self::base_api(base_url));
        let resp = Self::with_auth(self.http.get(&endpoint), Some(token)).send().await?;
        Self::take_data(resp).await
    }

    pub async fn messages(&self, base_url: &str, token: &str, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        let endpoint = format!("{}/conversations/{}/messages", Self::base_api(base_url), conversation_id);
        let resp = Self::with_auth(self.http.get(&endpoint), Some(token)).send().await?;
        Self::take_data(resp).await
    }

    pub async fn send_message(
        &self,
        base_url: &str,
        token: &str,
        conversation_id: &str,
        contenu: &str,
    ) -> Result<Message, ApiError> {
        let endpoint = format!("{}/conversations/{}/messages", Self::base_api(base_url), conversation_id);
        let body = serde_json::json!({ "contenu": contenu });
        let resp = Self::with_auth(self.http.post(&endpoint), Some(token))
            .json(&body)
            .send()
            .await?;
        Self::take_data(resp).await
    }

    // ----- profile -----

    pub async fn profile(&self, base_url: &str, token: &str) -> Result<UserProfile, ApiError> {
        let endpoint = format!("{}/utilisateurs/moi", Self::base_api(base_url));
        let resp = Self::with_auth(self.http.get(&endpoint), Some(token)).send().await?;
        Self::take_data(resp).await
    }

    pub async fn update_profile(&self, base_url: &str, token: &str, payload: &Value) -> Result<UserProfile, ApiError> {
        let endpoint = format!("{}/utilisateurs/moi", Self::base_api(base_url));
        let resp = Self::with_auth(self.http.put(&endpoint), Some(token))
            .json(payload)
            .send()
            .await?;
        Self::take_data(resp).await
    }

    pub async fn upload_profile_photo(
        &self,
        base_url: &str,
        token: &str,
        photo: &PhotoAttachment,
    ) -> Result<UserProfile, ApiError> {
        let endpoint = format!("{}/utilisateurs/moi/photo", Self::base_api(base_url));
        let bytes = tokio::fs::read(&photo.path)
            .await
            .map_err(|e| ApiError::Network(format!("{}: {}", photo.name, e)))?;
        let part = multipart::Part::bytes(bytes)
            .file_name(photo.name.clone())
            .mime_str(&photo.mime)
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        let form = multipart::Form::new().part("photo", part);
        let resp = Self::with_auth(self.http.post(&endpoint), Some(token))
            .multipart(form)
            .send()
            .await?;
        Self::take_data(resp).await
    }

    pub async fn upload_document(
        &self,
        base_url: &str,
        token: &str,
        path: &std::path::Path,
        name: &str,
    ) -> Result<(), ApiError> {
        let endpoint = format!("{}/utilisateurs/moi/documents", Self::base_api(base_url));
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::Network(format!("{}: {}", name, e)))?;
        let part = multipart::Part::bytes(bytes).file_name(name.to_string());
        let form = multipart::Form::new().part("document", part);
        let resp = Self::with_auth(self.http.post(&endpoint), Some(token))
            .multipart(form)
            .send()
            .await?;
        Self::take_ok(resp).await
    }
}
