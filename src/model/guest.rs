use std::fmt;

use serde::{
    de::{IgnoredAny, MapAccess, Visitor},
    Deserialize, Deserializer, Serialize,
};

/// A registered guest. Guests have no id, they are identified by the
/// case-insensitive (first name, last name, email) triple.
///
/// Deserialization is lenient: keys match ignoring case, unknown keys are
/// skipped, and missing or `null` fields (or a `null` guest) are empty.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl Guest {
    pub fn new(first_name: &str, last_name: &str, email: &str) -> Self {
        Guest {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
        }
    }

    /// Compares the identity triple, ignoring case
    pub fn same_identity(&self, other: &Guest) -> bool {
        eq_ignore_case(&self.first_name, &other.first_name)
            && eq_ignore_case(&self.last_name, &other.last_name)
            && eq_ignore_case(&self.email, &other.email)
    }

    /// Case-insensitive substring match against the first or last name
    pub fn name_contains(&self, query: &str) -> bool {
        let query = query.to_lowercase();

        self.first_name.to_lowercase().contains(&query)
            || self.last_name.to_lowercase().contains(&query)
    }

    pub fn new_test() -> Self {
        Guest::new("John", "Doe", "john.doe@example.com")
    }
}

impl<'de> Deserialize<'de> for Guest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_option(NullableGuestVisitor)
    }
}

struct NullableGuestVisitor;

impl<'de> Visitor<'de> for NullableGuestVisitor {
    type Value = Guest;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a guest object or null")
    }

    fn visit_none<E>(self) -> Result<Guest, E> {
        Ok(Guest::default())
    }

    fn visit_unit<E>(self) -> Result<Guest, E> {
        Ok(Guest::default())
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Guest, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(GuestVisitor)
    }
}

struct GuestVisitor;

impl<'de> Visitor<'de> for GuestVisitor {
    type Value = Guest;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a guest object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Guest, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut guest = Guest::default();

        // A repeated key overwrites the earlier value
        while let Some(key) = map.next_key::<String>()? {
            let field = if key.eq_ignore_ascii_case("firstName") {
                &mut guest.first_name
            } else if key.eq_ignore_ascii_case("lastName") {
                &mut guest.last_name
            } else if key.eq_ignore_ascii_case("email") {
                &mut guest.email
            } else {
                map.next_value::<IgnoredAny>()?;
                continue;
            };

            if let Some(value) = map.next_value::<Option<String>>()? {
                *field = value;
            }
        }

        Ok(guest)
    }
}

// Unicode aware, `str::eq_ignore_ascii_case` would miss non-ascii names
fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GuestPage {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub guests: Vec<Guest>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GuestCount {
    pub total: usize,
}
