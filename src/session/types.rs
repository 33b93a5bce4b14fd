use serde::{Deserialize, Serialize};

/// JWT claims structure containing session information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    pub session_id: String,
    pub user_id: String,
    pub email: String,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

/// Payload returned inside the envelope on successful sign-up/login
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    pub token: String, // The signed session token
    pub user_id: String,
    pub email: String,
    pub name: String,
}

/// Request body for POST /auth/sign-up
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub confirm_password: String,
}

/// Request body for POST /auth/login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_claims_serialization() {
        let claims = SessionClaims {
            session_id: "test-id".to_string(),
            user_id: "user-1".to_string(),
            email: "staff@example.com".to_string(),
            exp: 1234567890,
            iat: 1234567800,
        };

        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("test-id"));
        assert!(json.contains("staff@example.com"));

        let deserialized: SessionClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, claims);
    }

    #[test]
    fn test_sign_up_request_deserialization() {
        let body = r#"{"email":"a@b.c","name":"A","password":"x","confirm_password":"x"}"#;
        let request: SignUpRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.email, "a@b.c");
        assert_eq!(request.password, request.confirm_password);
    }
}
