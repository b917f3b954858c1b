//! Record id helpers.
//!
//! The backend assigns durable ids on insert. Optimistically created records
//! carry a client-generated id with the `temp-` prefix until the server row
//! comes back; the prefix keeps the two distinguishable everywhere a record
//! is held before confirmation. A temporary id must never be used where a
//! durable id is required, in particular as a push-subscription filter.

use uuid::Uuid;

/// Prefix marking client-generated ids that have not been confirmed yet.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Generate a fresh temporary id.
pub fn temp_id() -> String {
    format!("{}{}", TEMP_ID_PREFIX, Uuid::new_v4())
}

/// Returns true if the id is a temporary client-generated one.
pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_id_has_prefix() {
        let id = temp_id();
        assert!(is_temp_id(&id));
    }

    #[test]
    fn test_temp_ids_are_unique() {
        assert_ne!(temp_id(), temp_id());
    }

    #[test]
    fn test_server_id_is_not_temp() {
        assert!(!is_temp_id("3fa85f64-5717-4562-b3fc-2c963f66afa6"));
        assert!(!is_temp_id(""));
    }
}
