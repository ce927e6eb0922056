use crate::models::{Doctor, Facility};

fn matches(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Doctors whose name, specialization or department contains `query`, ignoring case
pub fn filter_doctors<'a>(doctors: &'a [Doctor], query: &str) -> Vec<&'a Doctor> {
    let needle = query.trim().to_lowercase();
    doctors
        .iter()
        .filter(|d| {
            needle.is_empty()
                || matches(&d.name, &needle)
                || matches(&d.specialization, &needle)
                || d.department.as_deref().is_some_and(|dep| matches(dep, &needle))
        })
        .collect()
}

/// Facilities whose name, type or address contains `query`, ignoring case
pub fn filter_facilities<'a>(facilities: &'a [Facility], query: &str) -> Vec<&'a Facility> {
    let needle = query.trim().to_lowercase();
    facilities
        .iter()
        .filter(|f| {
            needle.is_empty()
                || matches(&f.name, &needle)
                || matches(f.facility_type.as_str(), &needle)
                || (f.address.is_some() && matches(&f.formatted_address(), &needle))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doctors() -> Vec<Doctor> {
        serde_json::from_value(json!([
            {"_id": "d1", "name": "Dr. Meera Iyer", "specialization": "Cardiology"},
            {"_id": "d2", "name": "Dr. Rahul Das", "specialization": "ENT", "department": "Surgery"},
        ]))
        .unwrap()
    }

    fn facilities() -> Vec<Facility> {
        serde_json::from_value(json!([
            {"_id": "f1", "name": "City Hospital", "facilityType": "Hospital",
             "address": {"street": "12 MG Road", "city": "Pune"}},
            {"_id": "f2", "name": "Green Clinic", "facilityType": "Clinic", "address": "Andheri, Mumbai"},
            {"_id": "f3", "name": "Lab One"},
        ]))
        .unwrap()
    }

    fn ids<T: crate::models::HasId>(list: &[&T]) -> Vec<String> {
        list.iter().map(|x| x.id().to_string()).collect()
    }

    #[test]
    fn test_filter_doctors() {
        let all = doctors();
        assert_eq!(ids(&filter_doctors(&all, "")), vec!["d1", "d2"]);
        assert_eq!(ids(&filter_doctors(&all, "CARDIO")), vec!["d1"]);
        assert_eq!(ids(&filter_doctors(&all, "surgery")), vec!["d2"]);
        assert!(filter_doctors(&all, "dermatology").is_empty());
    }

    #[test]
    fn test_filter_facilities() {
        let all = facilities();
        assert_eq!(ids(&filter_facilities(&all, "  ")).len(), 3);
        assert_eq!(ids(&filter_facilities(&all, "pune")), vec!["f1"]);
        assert_eq!(ids(&filter_facilities(&all, "clinic")), vec!["f2"]);
        assert_eq!(ids(&filter_facilities(&all, "mumbai")), vec!["f2"]);
        // "No address provided" placeholder must not match
        assert!(filter_facilities(&all, "provided").is_empty());
    }
}
