//! Review collection and rating aggregation.
//!
//! Stats are maintained incrementally (O(1) per accepted review) and must
//! stay numerically consistent with a full recomputation from the list.

use crate::api::models::Review;
use crate::constants::MIN_REVIEW_COMMENT_LEN;
use crate::forms::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Recent,
    Highest,
    Lowest,
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [SortOrder::Recent, SortOrder::Highest, SortOrder::Lowest];

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Recent => "Plus récents",
            SortOrder::Highest => "Mieux notés",
            SortOrder::Lowest => "Moins bien notés",
        }
    }
}

/// Local gate before any network call: a star must be selected and the
/// comment must carry some substance.
pub fn validate_review(note: u8, commentaire: &str) -> Result<(), ValidationError> {
    if note == 0 {
        return Err(ValidationError::new("note", "Sélectionnez une note"));
    }
    if commentaire.trim().chars().count() < MIN_REVIEW_COMMENT_LEN {
        return Err(ValidationError::new(
            "commentaire",
            format!("Commentaire : {} caractères minimum", MIN_REVIEW_COMMENT_LEN),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RatingStats {
    pub count: u32,
    pub mean: f64,
    /// `histogram[0]` counts 1-star reviews, `histogram[4]` 5-star.
    pub histogram: [u32; 5],
}

impl RatingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full recomputation, the reference the incremental path must match.
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let mut stats = Self::new();
        for r in reviews {
            stats.add(r.note);
        }
        stats
    }

    /// O(1) running update: `new_mean = (count*mean + note) / (count+1)`.
    pub fn add(&mut self, note: f64) {
        let total = self.count as f64 * self.mean + note;
        self.count += 1;
        self.mean = total / self.count as f64;
        let bucket = (note.round().clamp(1.0, 5.0) as usize) - 1;
        self.histogram[bucket] += 1;
    }
}

pub fn sort_reviews(reviews: &mut [Review], order: SortOrder) {
    match order {
        SortOrder::Recent => {
            // ISO timestamps compare lexicographically; undated entries sink.
            reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        SortOrder::Highest => {
            reviews.sort_by(|a, b| b.note.partial_cmp(&a.note).unwrap_or(std::cmp::Ordering::Equal));
        }
        SortOrder::Lowest => {
            reviews.sort_by(|a, b| a.note.partial_cmp(&b.note).unwrap_or(std::cmp::Ordering::Equal));
        }
    }
}

/// Prepend a freshly accepted review, then restore the active order.
pub fn insert_review(reviews: &mut Vec<Review>, review: Review, order: SortOrder) {
    reviews.insert(0, review);
    sort_reviews(reviews, order);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarFill {
    Full,
    Half,
    Empty,
}

/// Star row for a rating: `floor(r)` full stars, one half star when the
/// fractional remainder reaches 0.5, the rest empty. Always 5 slots.
pub fn star_row(rating: f64) -> [StarFill; 5] {
    let r = rating.clamp(0.0, 5.0);
    let full = r.floor() as usize;
    let half = r - r.floor() >= 0.5;
    let mut row = [StarFill::Empty; 5];
    for (i, slot) in row.iter_mut().enumerate() {
        if i < full {
            *slot = StarFill::Full;
        } else if i == full && half {
            *slot = StarFill::Half;
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(note: f64, created_at: &str) -> Review {
        Review {
            id: format!("r-{note}-{created_at}"),
            note,
            commentaire: "Transporteur ponctuel et soigneux".to_string(),
            auteur: None,
            destinataire_id: None,
            created_at: Some(created_at.to_string()),
        }
    }

    #[test]
    fn test_validate_review_gate() {
        assert!(validate_review(0, "Très bon transporteur").is_err());
        assert!(validate_review(4, "Court").is_err());
        assert!(validate_review(4, "Très bon transporteur").is_ok());
    }

    #[test]
    fn test_incremental_matches_full_recompute() {
        let sequences: [&[f64]; 4] = [
            &[5.0],
            &[1.0, 5.0, 3.0],
            &[4.0, 4.0, 2.0, 5.0, 1.0, 3.0, 3.0],
            &[2.0, 2.0, 2.0, 5.0, 5.0, 5.0, 1.0, 4.0, 3.0, 4.0],
        ];
        for notes in sequences {
            let mut incremental = RatingStats::new();
            let mut list = Vec::new();
            for (i, &note) in notes.iter().enumerate() {
                incremental.add(note);
                list.push(review(note, &format!("2026-08-{:02}", i + 1)));
                let full = RatingStats::from_reviews(&list);
                assert_eq!(incremental.count, full.count);
                assert!((incremental.mean - full.mean).abs() < 1e-9);
                assert_eq!(incremental.histogram, full.histogram);
            }
            let plain_mean: f64 = notes.iter().sum::<f64>() / notes.len() as f64;
            assert!((incremental.mean - plain_mean).abs() < 1e-9);
        }
    }

    #[test]
    fn test_star_row_breakdown() {
        let cases: [(f64, usize, bool); 6] = [
            (0.0, 0, false),
            (2.0, 2, false),
            (3.4, 3, false),
            (3.5, 3, true),
            (4.6, 4, true),
            (5.0, 5, false),
        ];
        for (rating, full, half) in cases {
            let row = star_row(rating);
            assert_eq!(row.len(), 5);
            assert_eq!(row.iter().filter(|s| **s == StarFill::Full).count(), full, "rating {rating}");
            assert_eq!(
                row.iter().filter(|s| **s == StarFill::Half).count(),
                usize::from(half),
                "rating {rating}"
            );
            assert_eq!(
                row.iter().filter(|s| **s == StarFill::Empty).count(),
                5 - full - usize::from(half)
            );
        }
    }

    #[test]
    fn test_insert_review_resorts_by_active_order() {
        let mut list = vec![review(5.0, "2026-08-01"), review(2.0, "2026-08-02")];
        sort_reviews(&mut list, SortOrder::Recent);
        assert_eq!(list[0].note, 2.0);

        insert_review(&mut list, review(4.0, "2026-08-03"), SortOrder::Recent);
        assert_eq!(list[0].created_at.as_deref(), Some("2026-08-03"));

        insert_review(&mut list, review(1.0, "2026-08-04"), SortOrder::Highest);
        let notes: Vec<f64> = list.iter().map(|r| r.note).collect();
        assert_eq!(notes, vec![5.0, 4.0, 2.0, 1.0]);

        sort_reviews(&mut list, SortOrder::Lowest);
        assert_eq!(list[0].note, 1.0);
    }
}
