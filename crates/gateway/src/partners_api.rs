//! Partner portal: accounts, client book, and commission earnings.

use axum::extract::State;
use axum::response::Json;
use deskhand_core::PartnerEarnings;
use deskhand_store::NewPartnerClient;
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthedPartner;
use crate::{ApiError, SharedState};

#[derive(Deserialize)]
pub struct PartnerSignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub phone: String,
}

pub async fn signup_handler(
    State(state): State<SharedState>,
    Json(request): Json<PartnerSignupRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if request.name.is_empty() || request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Name, email, and password are required"));
    }
    if state.store.partner_by_email(&request.email).await?.is_some() {
        return Err(ApiError::bad_request("Email already registered"));
    }

    let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::internal(format!("Password hashing failed: {e}")))?;

    let partner = state
        .store
        .create_partner(
            &request.name,
            &request.email,
            &password_hash,
            &request.company,
            &request.phone,
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Partner account created successfully",
        "token": partner.id,
        "partner": { "id": partner.id, "name": partner.name, "email": partner.email },
    })))
}

#[derive(Deserialize)]
pub struct PartnerLoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login_handler(
    State(state): State<SharedState>,
    Json(request): Json<PartnerLoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let partner = state
        .store
        .partner_by_email(&request.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    let valid = bcrypt::verify(&request.password, &partner.password_hash).unwrap_or(false);
    if !valid {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    Ok(Json(json!({
        "success": true,
        "token": partner.id,
        "partner": { "id": partner.id, "name": partner.name, "email": partner.email },
    })))
}

#[derive(Deserialize)]
pub struct AddClientRequest {
    pub client_name: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub client_phone: String,
    #[serde(default)]
    pub client_company: String,
    pub billing_amount: f64,
    pub billing_period: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub preferences: String,
}

pub async fn add_client_handler(
    State(state): State<SharedState>,
    AuthedPartner(ctx): AuthedPartner,
    Json(request): Json<AddClientRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if request.client_name.is_empty() {
        return Err(ApiError::bad_request("Client name is required"));
    }
    if !matches!(request.billing_period.as_str(), "monthly" | "quarterly" | "yearly") {
        return Err(ApiError::bad_request(
            "Billing period must be monthly, quarterly, or yearly",
        ));
    }

    let client = state
        .store
        .add_partner_client(
            &ctx.partner_id,
            NewPartnerClient {
                client_name: request.client_name,
                client_email: request.client_email,
                client_phone: request.client_phone,
                client_company: request.client_company,
                billing_amount: request.billing_amount,
                billing_period: request.billing_period,
                notes: request.notes,
                preferences: request.preferences,
            },
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Client added successfully!",
        "client_id": client.id,
        "partner_earnings": client.partner_earnings,
    })))
}

pub async fn list_clients_handler(
    State(state): State<SharedState>,
    AuthedPartner(ctx): AuthedPartner,
) -> Result<Json<serde_json::Value>, ApiError> {
    let clients = state.store.partner_clients(&ctx.partner_id).await?;
    Ok(Json(json!({ "success": true, "clients": clients })))
}

pub async fn earnings_handler(
    State(state): State<SharedState>,
    AuthedPartner(ctx): AuthedPartner,
) -> Result<Json<serde_json::Value>, ApiError> {
    let clients = state.store.partner_clients(&ctx.partner_id).await?;
    let earnings = PartnerEarnings::compute(&clients);
    Ok(Json(json!({ "success": true, "earnings": earnings })))
}

#[cfg(test)]
mod tests {
    use crate::auth::tests::{body_json, json_request};
    use crate::build_router;
    use crate::test_support::test_state;
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    async fn partner_signup(state: crate::SharedState, email: &str) -> String {
        let response = build_router(state)
            .oneshot(json_request(
                "POST",
                "/api/partners/signup",
                None,
                json!({
                    "name": "Jo Agency",
                    "email": email,
                    "password": "secret-password",
                    "company": "Jo & Co",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn partner_flow_clients_and_earnings() {
        let state = test_state().await;
        let token = partner_signup(state.clone(), "jo@agency.example").await;

        // Add two clients
        for (name, amount, period) in [("Corner Shop", 100.0, "monthly"), ("Gym", 1000.0, "yearly")]
        {
            let response = build_router(state.clone())
                .oneshot(json_request(
                    "POST",
                    "/api/partners/clients",
                    Some(&token),
                    json!({
                        "client_name": name,
                        "billing_amount": amount,
                        "billing_period": period,
                    }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = build_router(state.clone())
            .oneshot(json_request("GET", "/api/partners/clients", Some(&token), json!({})))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["clients"].as_array().unwrap().len(), 2);

        let response = build_router(state)
            .oneshot(json_request("GET", "/api/partners/earnings", Some(&token), json!({})))
            .await
            .unwrap();
        let earnings = body_json(response).await["earnings"].clone();
        assert_eq!(earnings["monthly"], 60.0);
        assert_eq!(earnings["yearly"], 600.0);
        assert_eq!(earnings["total"], 660.0);
    }

    #[tokio::test]
    async fn invalid_billing_period_rejected() {
        let state = test_state().await;
        let token = partner_signup(state.clone(), "jo@agency.example").await;

        let response = build_router(state)
            .oneshot(json_request(
                "POST",
                "/api/partners/clients",
                Some(&token),
                json!({
                    "client_name": "Shop",
                    "billing_amount": 10.0,
                    "billing_period": "weekly",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn owner_token_is_not_a_partner_token() {
        let state = test_state().await;
        let owner_token = crate::auth::tests::signup(state.clone(), "owner@example.com").await;

        let response = build_router(state)
            .oneshot(json_request(
                "GET",
                "/api/partners/clients",
                Some(&owner_token),
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
