use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who a token speaks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i32,
    pub user_uuid: Uuid,
    pub user_email: String,
}

/// JWT payload. Field names are the wire names the todo service reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i32,
    #[serde(rename = "userUuid")]
    pub user_uuid: Uuid,
    pub user_email: String,
    pub iat: i64, // issued at (unix timestamp)
    pub exp: i64, // expires at (unix timestamp)
    pub iss: String,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            user_uuid: self.user_uuid,
            user_email: self.user_email.clone(),
        }
    }
}

/// Payload as it arrives off the wire, before required fields are checked.
#[derive(Debug, Deserialize)]
pub(crate) struct RawClaims {
    #[serde(rename = "userId")]
    pub user_id: Option<i32>,
    #[serde(rename = "userUuid")]
    pub user_uuid: Option<String>,
    pub user_email: Option<String>,
    pub iat: Option<i64>,
    pub exp: Option<i64>,
    pub iss: Option<String>,
}

impl RawClaims {
    /// `None` when any identity field is absent, empty or unparseable.
    pub(crate) fn into_claims(self) -> Option<Claims> {
        let user_id = self.user_id.filter(|id| *id > 0)?;
        let user_uuid = self
            .user_uuid
            .as_deref()
            .and_then(|s| Uuid::parse_str(s).ok())?;
        let user_email = self.user_email.filter(|e| !e.is_empty())?;
        Some(Claims {
            user_id,
            user_uuid,
            user_email,
            iat: self.iat.unwrap_or_default(),
            exp: self.exp?,
            iss: self.iss.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawClaims {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn claims_serialize_with_wire_names() {
        let claims = Claims {
            user_id: 7,
            user_uuid: Uuid::nil(),
            user_email: "a@b.com".into(),
            iat: 1,
            exp: 2,
            iss: "todoapp".into(),
        };
        let v = serde_json::to_value(&claims).unwrap();
        assert_eq!(v["userId"], 7);
        assert_eq!(v["userUuid"], Uuid::nil().to_string());
        assert_eq!(v["user_email"], "a@b.com");
    }

    #[test]
    fn complete_payload_converts() {
        let uuid = Uuid::new_v4();
        let claims = raw(json!({
            "userId": 3, "userUuid": uuid.to_string(), "user_email": "x@y.io", "iat": 10, "exp": 20, "iss": "i"
        }))
        .into_claims()
        .expect("complete");
        assert_eq!(claims.user_uuid, uuid);
        assert_eq!(claims.identity().user_id, 3);
    }

    #[test]
    fn missing_or_bad_identity_fields_are_rejected() {
        let uuid = Uuid::new_v4().to_string();
        assert!(raw(json!({ "userUuid": uuid, "user_email": "x@y.io", "exp": 20 })).into_claims().is_none());
        assert!(raw(json!({ "userId": 0, "userUuid": uuid, "user_email": "x@y.io", "exp": 20 })).into_claims().is_none());
        assert!(raw(json!({ "userId": 1, "userUuid": "nope", "user_email": "x@y.io", "exp": 20 })).into_claims().is_none());
        assert!(raw(json!({ "userId": 1, "userUuid": uuid, "user_email": "", "exp": 20 })).into_claims().is_none());
    }
}
