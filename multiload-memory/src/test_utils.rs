use heapless::String as HeaplessString;
use multiload_db::models::person::{PersonModel, PersonType};
use uuid::Uuid;

pub fn create_test_person(first_name: &str, last_name: &str) -> PersonModel {
    PersonModel {
        id: Uuid::new_v4(),
        person_type: PersonType::Natural,
        first_name: HeaplessString::try_from(first_name).unwrap(),
        last_name: HeaplessString::try_from(last_name).unwrap(),
        date_of_birth: None,
    }
}

pub fn create_test_person_with_dob(
    first_name: &str,
    last_name: &str,
    date_of_birth: chrono::NaiveDate,
) -> PersonModel {
    PersonModel {
        id: Uuid::new_v4(),
        person_type: PersonType::Natural,
        first_name: HeaplessString::try_from(first_name).unwrap(),
        last_name: HeaplessString::try_from(last_name).unwrap(),
        date_of_birth: Some(date_of_birth),
    }
}
