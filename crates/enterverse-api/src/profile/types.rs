use serde::{Deserialize, Serialize};

/// `GET /users/{id}` envelope.
#[derive(Debug, Deserialize)]
pub struct ProfileResponse {
    pub data: Profile,
}

/// The signed-in user's public profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: u64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub avatar: Option<String>,
}

impl Profile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_profile() {
        let json = r#"{
            "data": {
                "id": 2,
                "email": "janet.weaver@reqres.in",
                "first_name": "Janet",
                "last_name": "Weaver",
                "avatar": "https://reqres.in/img/faces/2-image.jpg"
            },
            "support": {"url": "https://reqres.in/#support-heading", "text": "..."}
        }"#;

        let resp: ProfileResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data.id, 2);
        assert_eq!(resp.data.display_name(), "Janet Weaver");
        assert!(resp.data.avatar.is_some());
    }
}
