//! Selection-preserving list refresh
//!
//! A refresh can add, remove and reorder headers. The selection follows the
//! message identifier, not its row, so the user keeps their place.

use libjkm::{MessageHeader, MessageId};

/// Choose the selection after `previous` is replaced by `incoming`
///
/// In order of preference:
/// 1. the previously selected id, if `incoming` still contains it
/// 2. the previously selected row index, if still in bounds
/// 3. the first row
///
/// An empty `incoming` clears the selection.
pub fn reconcile(
    previous: &[MessageHeader],
    selected: Option<MessageId>,
    incoming: &[MessageHeader],
) -> Option<MessageId> {
    if incoming.is_empty() {
        return None;
    }

    if let Some(id) = selected {
        if incoming.iter().any(|h| h.matches(id)) {
            return Some(id);
        }
        if let Some(index) = previous.iter().position(|h| h.matches(id)) {
            if let Some(header) = incoming.get(index) {
                return Some(header.id);
            }
        }
    }

    incoming.first().map(|h| h.id)
}
