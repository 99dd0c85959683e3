use adw::prelude::*;
use gtk4 as gtk;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::api::models::Review;
use crate::app::Session;
use crate::reviews::{
    RatingStats, SortOrder, StarFill, insert_review, sort_reviews, star_row, validate_review,
};
use crate::utils::TaskGuard;

/// Read-only star strip. The half star is a clipped overlay: a filled
/// star drawn over the empty one, cut at 50% width.
pub fn star_strip(rating: f64) -> gtk::Box {
    let row = gtk::Box::new(gtk::Orientation::Horizontal, 2);
    for fill in star_row(rating) {
        match fill {
            StarFill::Full => {
                let lbl = gtk::Label::new(Some("★"));
                lbl.add_css_class("accent");
                row.append(&lbl);
            }
            StarFill::Half => {
                let over = gtk::Overlay::new();
                let empty = gtk::Label::new(Some("☆"));
                empty.add_css_class("dim-label");
                over.set_child(Some(&empty));
                // Show only the left half of the filled glyph.
                let half_wrap = gtk::Box::new(gtk::Orientation::Horizontal, 0);
                half_wrap.set_overflow(gtk::Overflow::Hidden);
                half_wrap.set_width_request(8);
                half_wrap.set_halign(gtk::Align::Start);
                let half = gtk::Label::new(Some("★"));
                half.add_css_class("accent");
                half_wrap.append(&half);
                over.add_overlay(&half_wrap);
                row.append(&over);
            }
            StarFill::Empty => {
                let lbl = gtk::Label::new(Some("☆"));
                lbl.add_css_class("dim-label");
                row.append(&lbl);
            }
        }
    }
    row
}

/// Five clickable stars for the submission form; 0 until a star is picked.
pub struct StarPicker {
    root: gtk::Box,
    value: Cell<u8>,
    buttons: Vec<gtk::Button>,
}

impl StarPicker {
    pub fn new() -> Rc<Self> {
        let root = gtk::Box::new(gtk::Orientation::Horizontal, 2);
        let mut buttons = Vec::new();
        for _ in 0..5 {
            let btn = gtk::Button::with_label("☆");
            btn.add_css_class("flat");
            root.append(&btn);
            buttons.push(btn);
        }
        let this = Rc::new(Self { root, value: Cell::new(0), buttons });
        for (i, btn) in this.buttons.iter().enumerate() {
            let this2 = this.clone();
            btn.connect_clicked(move |_| {
                this2.set_value((i + 1) as u8);
            });
        }
        this
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn value(&self) -> u8 {
        self.value.get()
    }

    pub fn set_value(&self, value: u8) {
        self.value.set(value);
        for (i, btn) in self.buttons.iter().enumerate() {
            btn.set_label(if (i as u8) < value { "★" } else { "☆" });
        }
    }
}

/// Reviews about one user: stats header, sortable list, and (for other
/// users' profiles) the submission form.
pub struct ReviewsPanel {
    root: gtk::Box,
    overlay: adw::ToastOverlay,
    session: Session,
    user_id: String,
    stats_box: gtk::Box,
    list: gtk::ListBox,
    sort_dropdown: gtk::DropDown,
    reviews: RefCell<Vec<Review>>,
    stats: RefCell<RatingStats>,
    order: Cell<usize>,
    guard: RefCell<Option<TaskGuard>>,
}

impl ReviewsPanel {
    pub fn new(
        overlay: &adw::ToastOverlay,
        session: Session,
        user_id: &str,
        can_review: bool,
    ) -> Rc<Self> {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 8);

        let header = gtk::Box::new(gtk::Orientation::Horizontal, 8);
        let title = gtk::Label::new(Some("Avis"));
        title.add_css_class("heading");
        title.set_halign(gtk::Align::Start);
        title.set_hexpand(true);
        header.append(&title);
        let sort_dropdown = gtk::DropDown::from_strings(
            &SortOrder::ALL.map(|o| o.label()),
        );
        header.append(&sort_dropdown);
        root.append(&header);

        let stats_box = gtk::Box::new(gtk::Orientation::Vertical, 4);
        root.append(&stats_box);

        let scroller = gtk::ScrolledWindow::builder().vexpand(true).min_content_height(160).build();
        let list = gtk::ListBox::new();
        scroller.set_child(Some(&list));
        root.append(&scroller);

        let this = Rc::new(Self {
            root,
            overlay: overlay.clone(),
            session,
            user_id: user_id.to_string(),
            stats_box,
            list,
            sort_dropdown,
            reviews: RefCell::new(Vec::new()),
            stats: RefCell::new(RatingStats::new()),
            order: Cell::new(0),
            guard: RefCell::new(None),
        });

        {
            let this2 = this.clone();
            this.sort_dropdown.connect_selected_notify(move |dd| {
                this2.order.set(dd.selected() as usize);
                let order = this2.current_order();
                sort_reviews(&mut this2.reviews.borrow_mut(), order);
                this2.render();
            });
        }

        if can_review {
            Self::build_submit_form(&this);
        }

        this
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    fn current_order(&self) -> SortOrder {
        SortOrder::ALL[self.order.get().min(SortOrder::ALL.len() - 1)]
    }

    pub fn load(this: &Rc<Self>) {
        let Some((base_url, token)) = this.session.auth() else { return };
        let user_id = this.user_id.clone();
        let (rx, guard) = crate::utils::run_cancellable_to_main(async move {
            let client = crate::api::client::ApiClient::new();
            client.user_reviews(&base_url, &token, &user_id).await
        });
        *this.guard.borrow_mut() = Some(guard);
        let this = this.clone();
        rx.attach(None, move |res| {
            match res {
                Ok(mut reviews) => {
                    let order = this.current_order();
                    sort_reviews(&mut reviews, order);
                    *this.stats.borrow_mut() = RatingStats::from_reviews(&reviews);
                    *this.reviews.borrow_mut() = reviews;
                    this.render();
                }
                Err(err) => crate::ui::toast_api_error(&this.overlay, &err),
            }
            glib::ControlFlow::Continue
        });
    }

    fn build_submit_form(this: &Rc<Self>) {
        let form = gtk::Box::new(gtk::Orientation::Vertical, 6);
        let form_title = gtk::Label::new(Some("Laisser un avis"));
        form_title.add_css_class("heading");
        form_title.set_halign(gtk::Align::Start);
        form.append(&form_title);

        let picker = StarPicker::new();
        form.append(&picker.widget());

        let comment_entry = gtk::Entry::new();
        comment_entry.set_placeholder_text(Some("Votre commentaire (10 caractères minimum)"));
        comment_entry.set_hexpand(true);
        form.append(&comment_entry);

        let submit_btn = gtk::Button::with_label("Publier l'avis");
        submit_btn.add_css_class("suggested-action");
        submit_btn.set_halign(gtk::Align::End);
        form.append(&submit_btn);
        this.root.append(&form);

        let this = this.clone();
        submit_btn.connect_clicked(move |_| {
            let note = picker.value();
            let commentaire = comment_entry.text().to_string();
            if let Err(e) = validate_review(note, &commentaire) {
                this.overlay.add_toast(adw::Toast::new(&e.message));
                return;
            }
            let Some((base_url, token)) = this.session.auth() else { return };
            let user_id = this.user_id.clone();
            let rx = crate::utils::run_async_to_main(async move {
                let client = crate::api::client::ApiClient::new();
                client.create_review(&base_url, &token, &user_id, note, &commentaire).await
            });
            let this2 = this.clone();
            let picker2 = picker.clone();
            let comment_entry2 = comment_entry.clone();
            rx.attach(None, move |res| {
                match res {
                    Ok(review) => {
                        // Incremental stats stay consistent with a full
                        // recompute over the list.
                        this2.stats.borrow_mut().add(review.note);
                        let order = this2.current_order();
                        insert_review(&mut this2.reviews.borrow_mut(), review, order);
                        this2.render();
                        picker2.set_value(0);
                        comment_entry2.set_text("");
                        this2.overlay.add_toast(adw::Toast::new("Avis publié."));
                    }
                    Err(err) => crate::ui::toast_api_error(&this2.overlay, &err),
                }
                glib::ControlFlow::Continue
            });
        });
    }

    fn render(&self) {
        while let Some(child) = self.stats_box.first_child() {
            self.stats_box.remove(&child);
        }
        let stats = *self.stats.borrow();
        let summary = gtk::Box::new(gtk::Orientation::Horizontal, 8);
        let mean_label = gtk::Label::new(Some(&format!("{:.1}", stats.mean)));
        mean_label.add_css_class("title-2");
        summary.append(&mean_label);
        summary.append(&star_strip(stats.mean));
        let count_label = gtk::Label::new(Some(&format!("({} avis)", stats.count)));
        count_label.add_css_class("dim-label");
        summary.append(&count_label);
        self.stats_box.append(&summary);

        for (i, n) in stats.histogram.iter().enumerate().rev() {
            let row = gtk::Label::new(Some(&format!("{} ★ : {}", i + 1, n)));
            row.add_css_class("dim-label");
            row.set_halign(gtk::Align::Start);
            self.stats_box.append(&row);
        }

        while let Some(child) = self.list.first_child() {
            self.list.remove(&child);
        }
        for review in self.reviews.borrow().iter() {
            let row = gtk::ListBoxRow::new();
            row.set_activatable(false);
            let cell = gtk::Box::new(gtk::Orientation::Vertical, 2);
            cell.set_margin_top(6);
            cell.set_margin_bottom(6);
            cell.set_margin_start(8);
            cell.set_margin_end(8);

            let head = gtk::Box::new(gtk::Orientation::Horizontal, 8);
            head.append(&star_strip(review.note));
            let auteur = review
                .auteur
                .as_ref()
                .map(|a| a.nom.clone())
                .unwrap_or_else(|| "Anonyme".to_string());
            let meta = match &review.created_at {
                Some(d) => format!("{} · {}", auteur, crate::utils::format_date(d)),
                None => auteur,
            };
            let meta_label = gtk::Label::new(Some(&meta));
            meta_label.add_css_class("dim-label");
            head.append(&meta_label);
            cell.append(&head);

            let comment = gtk::Label::new(Some(&review.commentaire));
            comment.set_halign(gtk::Align::Start);
            comment.set_wrap(true);
            cell.append(&comment);

            row.set_child(Some(&cell));
            self.list.append(&row);
        }
    }
}
