//! Change detection
//!
//! Compares a freshly fetched, newest-first listing sequence against the
//! checkpoint recorded for a source and returns the listings that appeared
//! above it. Pure: no I/O and no state.

use crate::types::Listing;

/// Return the listings in `fetched` that are newer than `checkpoint`.
///
/// - No checkpoint (first run for a source): returns nothing, so the first
///   fetch only records a baseline.
/// - Checkpoint found at index `k`: returns `fetched[..k]` in original order.
/// - Checkpoint not found anywhere (it scrolled out of the visible window):
///   returns all of `fetched`. This flood case is intentional.
pub fn detect(fetched: &[Listing], checkpoint: Option<&Listing>) -> Vec<Listing> {
    let Some(checkpoint) = checkpoint else {
        return Vec::new();
    };

    let boundary = fetched
        .iter()
        .position(|listing| listing == checkpoint)
        .unwrap_or(fetched.len());

    fetched[..boundary].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn listing(company: &str, role: &str, location: &str) -> Listing {
        Listing::new(company, role, location)
    }

    fn window() -> Vec<Listing> {
        vec![
            listing("Globex", "Dev", "LA"),
            listing("Initech", "QA", "Austin"),
            listing("Acme", "Engineer", "NYC"),
            listing("Old", "Role", "Loc"),
        ]
    }

    #[test]
    fn test_no_checkpoint_returns_empty() {
        assert!(detect(&window(), None).is_empty());
        assert!(detect(&[], None).is_empty());
    }

    #[test]
    fn test_checkpoint_at_top_returns_empty() {
        let fetched = window();
        assert!(detect(&fetched, Some(&fetched[0])).is_empty());
    }

    #[test]
    fn test_checkpoint_in_middle_returns_prefix_in_order() {
        let fetched = window();
        let checkpoint = listing("Acme", "Engineer", "NYC");

        let new = detect(&fetched, Some(&checkpoint));

        assert_eq!(new, fetched[..2].to_vec());
        assert_eq!(new[0].company, "Globex");
        assert_eq!(new[1].company, "Initech");
    }

    #[test]
    fn test_checkpoint_missing_returns_everything() {
        let fetched = window();
        let checkpoint = listing("Foo", "Bar", "Baz");

        assert_eq!(detect(&fetched, Some(&checkpoint)), fetched);
    }

    #[test]
    fn test_empty_fetch_with_checkpoint_returns_empty() {
        let checkpoint = listing("Acme", "Engineer", "NYC");
        assert!(detect(&[], Some(&checkpoint)).is_empty());
    }

    #[test]
    fn test_match_ignores_apply_link_and_date() {
        let fetched = vec![
            listing("Globex", "Dev", "LA"),
            listing("Acme", "Engineer", "NYC")
                .with_apply_link("https://new.example")
                .with_date_posted("Mar 03"),
        ];
        let checkpoint = listing("Acme", "Engineer", "NYC")
            .with_apply_link("https://old.example")
            .with_date_posted("Jan 01");

        let new = detect(&fetched, Some(&checkpoint));
        assert_eq!(new, vec![listing("Globex", "Dev", "LA")]);
    }

    #[test]
    fn test_stops_at_first_match() {
        // A repeated identity lower in the window must not extend the result.
        let fetched = vec![
            listing("Globex", "Dev", "LA"),
            listing("Acme", "Engineer", "NYC"),
            listing("Hooli", "SRE", "SF"),
            listing("Acme", "Engineer", "NYC"),
        ];
        let new = detect(&fetched, Some(&listing("Acme", "Engineer", "NYC")));
        assert_eq!(new.len(), 1);
    }

    #[test]
    fn test_detect_is_deterministic() {
        let fetched = window();
        let checkpoint = listing("Old", "Role", "Loc");
        assert_eq!(
            detect(&fetched, Some(&checkpoint)),
            detect(&fetched, Some(&checkpoint))
        );
        assert_eq!(detect(&fetched, Some(&checkpoint)).len(), 3);
    }
}
