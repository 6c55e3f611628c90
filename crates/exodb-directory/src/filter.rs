//! Search filter construction.
//!
//! The filter strings here are part of the message-database schema contract
//! and must keep their exact shape; only the embedded values vary.

/// Filter matching the unique server entry for a message database.
pub fn server_by_name(name: &str) -> String {
    format!("(&(objectClass=server)(cn={}))", escape_value(name))
}

/// Filter matching a mailbox user entry by username.
pub fn user_by_name(username: &str) -> String {
    format!("(&(objectClass=user)(cn={}))", escape_value(username))
}

/// Escape special characters in filter values (RFC 4515).
pub fn escape_value(value: &str) -> String {
    value
        .replace('\\', "\\5c")
        .replace('*', "\\2a")
        .replace('(', "\\28")
        .replace(')', "\\29")
        .replace('\0', "\\00")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_filter_shape() {
        assert_eq!(
            server_by_name("mdb1"),
            "(&(objectClass=server)(cn=mdb1))"
        );
    }

    #[test]
    fn test_user_filter_shape() {
        assert_eq!(
            user_by_name("jdoe"),
            "(&(objectClass=user)(cn=jdoe))"
        );
    }

    #[test]
    fn test_escape_value() {
        assert_eq!(escape_value("John Doe"), "John Doe");
        assert_eq!(escape_value("jd*"), "jd\\2a");
        assert_eq!(escape_value("(admin)"), "\\28admin\\29");
        assert_eq!(escape_value("a\\b"), "a\\5cb");
    }

    #[test]
    fn test_filter_injection_is_neutralized() {
        let filter = user_by_name("x)(objectClass=*");
        assert_eq!(
            filter,
            "(&(objectClass=user)(cn=x\\29\\28objectClass=\\2a))"
        );
    }
}
