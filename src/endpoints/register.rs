use crate::endpoints::{ApiError, AuthResponse};
use crate::session::Role;
use reqwest::Client;
use serde_derive::Serialize;
use std::fmt::{self, Debug, Formatter};

/// A new account, as the registration form collects it.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
    /// How the registration fee is being paid. Only meaningful for
    /// members; admins register without one.
    pub payment: Option<Payment<'a>>,
}

/// The registration fee payment, passed through to the server untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment<'a> {
    pub method: &'a str,
    pub details: serde_json::Value,
}

/// Create an account and log straight into it.
///
/// Same contract as [`super::login()`]: a token plus the new identity on
/// success, a classified error otherwise.
pub async fn register(
    client: &Client,
    base_url: &str,
    registration: &Registration<'_>,
) -> Result<AuthResponse, ApiError> {
    // The fee only applies to members; admin payloads omit the payment
    // fields entirely.
    let payment = match registration.role {
        Role::Member => registration.payment.as_ref(),
        Role::Admin => None,
    };

    let data = Data {
        username: registration.username,
        email: registration.email,
        password: registration.password,
        role: registration.role,
        payment_method: payment.map(|payment| payment.method),
        payment_details: payment.map(|payment| &payment.details),
    };

    let response =
        super::post(client, base_url, "auth/register", &data).await?;

    let body = response.text().await?;
    log::trace!("Response: {}", body);

    let parsed: AuthResponse = serde_json::from_str(&body)?;
    log::info!(
        "Registered {} as a {}",
        parsed.identity.username,
        parsed.identity.role
    );

    Ok(parsed)
}

#[derive(Serialize)]
struct Data<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
    role: Role,
    #[serde(
        rename = "paymentMethod",
        skip_serializing_if = "Option::is_none"
    )]
    payment_method: Option<&'a str>,
    #[serde(
        rename = "paymentDetails",
        skip_serializing_if = "Option::is_none"
    )]
    payment_details: Option<&'a serde_json::Value>,
}

// Payloads get logged at trace level; keep the password out of them.
impl Debug for Data<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Data")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .field("payment_method", &self.payment_method)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_payloads_carry_the_payment_fields() {
        let details = serde_json::json!({ "upiId": "alice@upi" });
        let data = Data {
            username: "alice",
            email: "alice@example.com",
            password: "hunter22",
            role: Role::Member,
            payment_method: Some("upi"),
            payment_details: Some(&details),
        };

        let value = serde_json::to_value(&data).unwrap();

        assert_eq!(value["role"], "member");
        assert_eq!(value["paymentMethod"], "upi");
        assert_eq!(value["paymentDetails"]["upiId"], "alice@upi");
    }

    #[test]
    fn admin_payloads_omit_the_payment_fields() {
        let data = Data {
            username: "dewey",
            email: "dewey@example.com",
            password: "hunter22",
            role: Role::Admin,
            payment_method: None,
            payment_details: None,
        };

        let value = serde_json::to_value(&data).unwrap();

        assert_eq!(value["role"], "admin");
        assert!(value.get("paymentMethod").is_none());
        assert!(value.get("paymentDetails").is_none());
    }
}
