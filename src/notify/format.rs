//! Plain-text message bodies

use crate::types::Listing;
use std::fmt::Write;
use url::Url;

/// A rendered subject and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub body: String,
}

/// Message announcing new listings for a source
pub fn new_listings_message(label: &str, listings: &[Listing]) -> Message {
    let mut body = format!("New internship listings found in {label}:\n\n");

    for listing in listings {
        write_listing(&mut body, listing);
        body.push_str(&"=".repeat(20));
        body.push_str("\n\n");
    }

    Message {
        subject: format!("New Internship Listings - {label}"),
        body,
    }
}

/// Status message for a run that found nothing new
pub fn no_changes_message(label: &str, top: &Listing) -> Message {
    let mut body = format!("No new listings found in {label}.\n\nCurrent top listing:\n");
    write_listing(&mut body, top);

    Message {
        subject: format!("No New Listings - {label}"),
        body,
    }
}

fn write_listing(body: &mut String, listing: &Listing) {
    // Writing to a String cannot fail.
    let _ = writeln!(body, "Company: {}", listing.company);
    let _ = writeln!(body, "Role: {}", listing.role);
    let _ = writeln!(body, "Location: {}", listing.location);
    let _ = writeln!(body, "Date Posted: {}", listing.date_posted);
    let _ = writeln!(body, "Apply: {}", listing.apply_link);
}

/// Self-service removal link: `{public_url}/unsubscribe/{address}?token={token}`
pub fn unsubscribe_link(public_url: &str, address: &str, token: &str) -> Option<String> {
    let mut url = Url::parse(public_url).ok()?;
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .push("unsubscribe")
        .push(address);
    url.query_pairs_mut().append_pair("token", token);
    Some(url.into())
}

/// Append an unsubscribe footer to a body
pub fn with_unsubscribe_footer(body: &str, link: &str) -> String {
    format!("{body}\n--\nTo stop receiving these emails, visit: {link}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn acme() -> Listing {
        Listing::new("Acme", "Engineer", "NYC")
            .with_apply_link("https://acme.example/apply")
            .with_date_posted("Jan 01")
    }

    #[test]
    fn test_new_listings_message() {
        let message = new_listings_message("Canadian Tech Internships 2026", &[acme()]);

        assert_eq!(
            message.subject,
            "New Internship Listings - Canadian Tech Internships 2026"
        );
        assert_eq!(
            message.body,
            "New internship listings found in Canadian Tech Internships 2026:\n\n\
             Company: Acme\nRole: Engineer\nLocation: NYC\nDate Posted: Jan 01\n\
             Apply: https://acme.example/apply\n====================\n\n"
        );
    }

    #[test]
    fn test_new_listings_message_keeps_order() {
        let globex = Listing::new("Globex", "Dev", "LA");
        let message = new_listings_message("Label", &[globex, acme()]);

        let globex_at = message.body.find("Globex").unwrap();
        let acme_at = message.body.find("Acme").unwrap();
        assert!(globex_at < acme_at);
    }

    #[test]
    fn test_no_changes_message() {
        let message = no_changes_message("Label", &acme());

        assert_eq!(message.subject, "No New Listings - Label");
        assert!(message.body.starts_with("No new listings found in Label."));
        assert!(message.body.contains("Current top listing:\nCompany: Acme\n"));
    }

    #[test]
    fn test_unsubscribe_link() {
        let link = unsubscribe_link("https://watch.example.com/", "a+b@example.com", "tok 1");
        assert_eq!(
            link.as_deref(),
            Some("https://watch.example.com/unsubscribe/a+b@example.com?token=tok+1")
        );

        assert!(unsubscribe_link("not a url", "a@example.com", "t").is_none());
    }

    #[test]
    fn test_with_unsubscribe_footer() {
        let body = with_unsubscribe_footer("Hello\n", "https://x/unsubscribe/a");
        assert!(body.starts_with("Hello\n"));
        assert!(body.ends_with("visit: https://x/unsubscribe/a\n"));
    }
}
