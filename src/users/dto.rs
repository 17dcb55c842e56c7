use serde::Deserialize;

/// Admin create body; same field rules as self-registration.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<String>,
}

/// Admin update body. Absent and empty fields are both "leave unchanged",
/// matching how the admin form submits partial edits.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl UpdateUserRequest {
    fn present(value: Option<String>) -> Option<String> {
        value.filter(|v| !v.trim().is_empty())
    }

    /// Drops empty strings so they do not overwrite existing columns.
    pub fn normalized(self) -> Self {
        Self {
            name: Self::present(self.name),
            email: Self::present(self.email),
            password: Self::present(self.password),
            role: Self::present(self.role),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_drops_empty_strings() {
        let req = UpdateUserRequest {
            name: Some("  ".into()),
            email: Some("new@x.com".into()),
            password: Some("".into()),
            role: None,
        };
        let norm = req.normalized();
        assert!(norm.name.is_none());
        assert_eq!(norm.email.as_deref(), Some("new@x.com"));
        assert!(norm.password.is_none());
        assert!(norm.role.is_none());
    }
}
