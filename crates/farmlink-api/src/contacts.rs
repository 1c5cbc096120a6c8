//! Chat contacts are not stored. They are derived on every request from the
//! caller's offers: anyone on the other side of an offer is a contact, with
//! the latest message and unread count attached.

use std::collections::HashMap;

use axum::{Extension, extract::State};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use farmlink_db::ThreadSummary;
use farmlink_types::models::{Contact, Offer, User};

use crate::error::ApiError;
use crate::extract::Json;
use crate::middleware::CurrentUser;
use crate::state::{AppState, run_blocking};

/// A distinct counterparty and the newest offer connecting them to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferLink {
    pub contact: Uuid,
    pub last_offer_at: DateTime<Utc>,
}

/// Distinct counterparties of `user` across `offers`, in order of first
/// appearance. Offers where `user` is not a party, or that pair a user with
/// themself, contribute nothing.
pub fn offer_links(user: Uuid, offers: &[Offer]) -> Vec<OfferLink> {
    let mut seen: HashMap<Uuid, usize> = HashMap::new();
    let mut links: Vec<OfferLink> = Vec::new();

    for offer in offers {
        let Some(contact) = offer.parties.counterpart(user) else {
            continue;
        };

        match seen.get(&contact) {
            Some(&idx) => {
                let link = &mut links[idx];
                if offer.created_at > link.last_offer_at {
                    link.last_offer_at = offer.created_at;
                }
            }
            None => {
                seen.insert(contact, links.len());
                links.push(OfferLink {
                    contact,
                    last_offer_at: offer.created_at,
                });
            }
        }
    }

    links
}

/// Pair a contact with the time of its most recent interaction: the later
/// of its last message and its newest offer.
fn summarize(user: User, link: OfferLink, thread: ThreadSummary) -> (DateTime<Utc>, Contact) {
    let last_message_time = thread.last_message.as_ref().map(|m| m.created_at);
    let interacted_at = last_message_time.map_or(link.last_offer_at, |t| t.max(link.last_offer_at));

    let contact = Contact {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        last_message: thread.last_message.map(|m| m.content),
        last_message_time,
        unread_count: thread.unread,
    };
    (interacted_at, contact)
}

/// Most recent interaction first; ties broken by id so the order is stable.
pub fn order_contacts(mut entries: Vec<(DateTime<Utc>, Contact)>) -> Vec<Contact> {
    entries.sort_by(|(a_at, a), (b_at, b)| b_at.cmp(a_at).then_with(|| a.id.cmp(&b.id)));
    entries.into_iter().map(|(_, contact)| contact).collect()
}

/// GET /api/chat/contacts
pub async fn list_contacts(
    State(state): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let user_id = me.id;

    let entries = run_blocking(&state, move |db| {
        let offers = db.offers_involving(user_id)?;
        let links = offer_links(user_id, &offers);
        debug!(
            "Contacts for {}: {} offers, {} distinct counterparties",
            user_id,
            offers.len(),
            links.len()
        );

        let mut entries = Vec::with_capacity(links.len());
        for link in links {
            let Some(user) = db.get_user_by_id(link.contact)? else {
                warn!("Offer counterparty '{}' has no user record", link.contact);
                continue;
            };
            let thread = db.thread_summary(user_id, user.id)?;
            entries.push(summarize(user, link, thread));
        }
        Ok(entries)
    })
    .await?;

    Ok(Json(order_contacts(entries)))
}
