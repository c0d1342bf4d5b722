//! CSV rendering for the export endpoint
//!
//! Produces a single well-formed delimited document: a date header row,
//! a column-header row, then one row per user with username and age.

use chrono::Utc;

use crate::domain::{DomainError, User};

/// Render the export document for the given users.
pub fn render_csv(users: &[User]) -> Result<Vec<u8>, DomainError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let csv_err = |e: csv::Error| DomainError::Internal(format!("CSV error: {}", e));

    writer
        .write_record(["Current Date:", &Utc::now().format("%Y-%m-%d").to_string()])
        .map_err(csv_err)?;
    writer.write_record(["Username", "Age"]).map_err(csv_err)?;

    for user in users {
        writer
            .write_record([user.username.as_str(), &user.age.to_string()])
            .map_err(csv_err)?;
    }

    writer
        .into_inner()
        .map_err(|e| DomainError::Internal(format!("CSV error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(username: &str, age: i32) -> User {
        User {
            id: "id".to_string(),
            username: username.to_string(),
            password_hash: "hash".to_string(),
            is_admin: false,
            age,
            hobbies: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn renders_header_rows_and_one_row_per_user() {
        let bytes = render_csv(&[user("alice", 30), user("bob", 45)]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Current Date:,"));
        assert_eq!(lines[1], "Username,Age");
        assert_eq!(lines[2], "alice,30");
        assert_eq!(lines[3], "bob,45");
    }

    #[test]
    fn quotes_usernames_containing_delimiters() {
        let bytes = render_csv(&[user("last, first", 20)]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.lines().nth(2).unwrap().starts_with('"'));
    }
}
