pub mod listing_detail;
pub mod listing_wizard;
pub mod login;
pub mod main_window;
pub mod messages;
pub mod profile;
pub mod reviews_panel;

use crate::api::error::ApiError;

/// One toast per message: a plain failure gives one, a structured
/// `{ errors: [...] }` body gives one per field error.
pub fn toast_api_error(overlay: &adw::ToastOverlay, err: &ApiError) {
    for msg in err.toast_messages() {
        overlay.add_toast(adw::Toast::new(&msg));
    }
}
