use crate::database::record::{Record, RecordError};

/// A pickup address registered by a requester
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub id: String,
    pub created_by: String,
    pub name: String,
    pub balance: f64,
    pub country: String,
    pub city: String,
    pub state: String,
    pub address_1: String,
    pub address_2: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn from_record(record: &Record) -> Result<Self, RecordError> {
        Ok(Self {
            id: record.required_str("id")?,
            created_by: record.str_or_default("created_by"),
            name: record.str_or_default("name"),
            balance: record.f64_or_default("balance"),
            country: record.str_or_default("country"),
            city: record.str_or_default("city"),
            state: record.str_or_default("state"),
            address_1: record.str_or_default("address_1"),
            address_2: record.str_or_default("address_2"),
            latitude: record.f64_or_default("latitude"),
            longitude: record.f64_or_default("longitude"),
        })
    }
}
