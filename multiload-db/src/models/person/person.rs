use heapless::String as HeaplessString;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::identifiable::Identifiable;

/// Database model for person type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonType {
    Natural,
    Legal,
    System,
    Unknown,
}

impl std::fmt::Display for PersonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersonType::Natural => write!(f, "Natural"),
            PersonType::Legal => write!(f, "Legal"),
            PersonType::System => write!(f, "System"),
            PersonType::Unknown => write!(f, "Unknown"),
        }
    }
}

impl FromStr for PersonType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Natural" => Ok(PersonType::Natural),
            "Legal" => Ok(PersonType::Legal),
            "System" => Ok(PersonType::System),
            "Unknown" => Ok(PersonType::Unknown),
            _ => Err(()),
        }
    }
}

/// Database model for Person
/// The reference entity used by the multi-identifier loading layer and its tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonModel {
    pub id: Uuid,

    pub person_type: PersonType,

    pub first_name: HeaplessString<100>,
    pub last_name: HeaplessString<100>,

    pub date_of_birth: Option<chrono::NaiveDate>,
}

impl Identifiable for PersonModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl std::fmt::Display for PersonModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Person [{}] {} {}",
            self.id, self.first_name, self.last_name
        )
    }
}
