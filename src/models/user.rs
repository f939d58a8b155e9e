use serde::Serialize;

use crate::database::record::{Record, RecordError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Registers locations and pins them onto open shifts (`type: user`)
    Requester,
    Gatherer,
    Unknown,
}

impl UserRole {
    pub fn parse(value: &str) -> Self {
        match value {
            "user" => UserRole::Requester,
            "gatherer" => UserRole::Gatherer,
            _ => UserRole::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub role: UserRole,
    pub country: String,
}

impl User {
    pub fn from_record(record: &Record) -> Result<Self, RecordError> {
        Ok(Self {
            id: record.required_str("id")?,
            username: record.str_or_default("username"),
            firstname: record.str_or_default("firstname"),
            lastname: record.str_or_default("lastname"),
            role: UserRole::parse(&record.str_or_default("type")),
            country: record.str_or_default("country"),
        })
    }

    pub fn is_gatherer(&self) -> bool {
        self.role == UserRole::Gatherer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_comes_from_type_attribute() {
        let gatherer = Record::from_value(json!({"id": "g1", "type": "gatherer", "username": "gina"})).unwrap();
        let user = User::from_record(&gatherer).unwrap();
        assert!(user.is_gatherer());
        assert_eq!(user.username, "gina");

        let requester = Record::from_value(json!({"id": "u1", "type": "user"})).unwrap();
        assert_eq!(User::from_record(&requester).unwrap().role, UserRole::Requester);

        let untyped = Record::from_value(json!({"id": "u2"})).unwrap();
        assert_eq!(User::from_record(&untyped).unwrap().role, UserRole::Unknown);
    }
}
