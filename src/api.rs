//! REST API server for MedShare
//!
//! Exposes account registration and login, profile management, and the
//! donation, data-registration and consent transaction flows on top of a
//! `UserRepository` and a `ChainClient`.

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequestParts, Path, Query, Request, State,
    },
    http::{self, request::Parts, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::address::AccountAddress;
use crate::amount::CcdAmount;
use crate::auth::{self, Claims, TokenService};
use crate::chain::{ChainClient, HistoryEntry, HttpChainClient, MockChainClient};
use crate::config::{ChainBackend, Config, UserStoreBackend};
use crate::error::MedShareError;
use crate::formatter;
use crate::nonce::resolve_next_nonce;
use crate::persistence::SqliteUserRepository;
use crate::transaction::{
    decode_hex_data, decode_memo, ContractAddress, ContractCall, PreparedTransaction,
    SignedTransaction, TransactionBuilder,
};
use crate::users::{InMemoryUserRepository, NewUser, PublicUser, UserRepository};
use crate::wallet::{parse_wallet_export_value, WalletExport};

const DEFAULT_HISTORY_LIMIT: u32 = 20;
const MAX_HISTORY_LIMIT: u32 = 100;

/// Per-deployment settings used when building transactions.
#[derive(Debug, Clone)]
pub struct TransactionSettings {
    pub expiry_minutes: u64,
    pub consent_contract: ContractAddress,
    pub consent_receive_name: String,
    pub consent_max_energy: u64,
    pub default_recipient: Option<AccountAddress>,
}

impl TransactionSettings {
    pub fn from_config(config: &Config) -> Result<Self, MedShareError> {
        let default_recipient = config
            .donation
            .default_recipient
            .as_deref()
            .map(AccountAddress::parse)
            .transpose()
            .map_err(|e| MedShareError::Config(format!("donation.default_recipient: {}", e)))?;

        Ok(TransactionSettings {
            expiry_minutes: config.chain.expiry_minutes,
            consent_contract: ContractAddress {
                index: config.contract.index,
                subindex: config.contract.subindex,
            },
            consent_receive_name: config.contract.consent_receive_name(),
            consent_max_energy: config.contract.max_energy,
            default_recipient,
        })
    }
}

impl Default for TransactionSettings {
    fn default() -> Self {
        TransactionSettings {
            expiry_minutes: crate::transaction::DEFAULT_EXPIRY_MINUTES,
            consent_contract: ContractAddress {
                index: 0,
                subindex: 0,
            },
            consent_receive_name: "medshare_consent.give_consent".to_string(),
            consent_max_energy: 30_000,
            default_recipient: None,
        }
    }
}

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub chain: Arc<dyn ChainClient>,
    pub tokens: TokenService,
    pub settings: TransactionSettings,
    api_stats: Arc<RwLock<ApiStats>>,
}

/// API statistics and monitoring
#[derive(Debug, Default)]
struct ApiStats {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    users_registered: u64,
    transactions_prepared: u64,
    transactions_submitted: u64,
    start_time: Option<Instant>,
}

impl ApiStats {
    fn new() -> Self {
        ApiStats {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    fn record_request(&mut self, success: bool) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
    }
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        chain: Arc<dyn ChainClient>,
        tokens: TokenService,
        settings: TransactionSettings,
    ) -> Self {
        Self {
            users,
            chain,
            tokens,
            settings,
            api_stats: Arc::new(RwLock::new(ApiStats::new())),
        }
    }

    /// Builds the repository and chain client the configuration selects.
    pub fn from_config(config: &Config) -> Result<Self, MedShareError> {
        let users: Arc<dyn UserRepository> = match config.database.backend {
            UserStoreBackend::Memory => Arc::new(InMemoryUserRepository::new()),
            UserStoreBackend::Sqlite => Arc::new(SqliteUserRepository::open(&config.database.path)?),
        };

        let chain: Arc<dyn ChainClient> = match config.chain.backend {
            ChainBackend::Node => Arc::new(HttpChainClient::new(
                config.chain.node_url.clone(),
                config.chain.request_timeout(),
            )?),
            ChainBackend::Mock => {
                tracing::warn!("using the in-memory mock chain; nothing reaches a real node");
                let opening_balance = CcdAmount::from_ccd(config.chain.mock_opening_balance_ccd)
                    .map_err(|e| MedShareError::Config(format!("chain.mock_opening_balance_ccd: {}", e)))?;
                Arc::new(MockChainClient::new().with_open_accounts(opening_balance))
            }
        };

        let tokens = TokenService::new(&config.auth.jwt_secret, config.auth.token_ttl()?);
        let settings = TransactionSettings::from_config(config)?;

        Ok(Self::new(users, chain, tokens, settings))
    }

    /// Get API statistics
    pub async fn get_stats(&self) -> Result<ApiStatsResponse, MedShareError> {
        let total_users = self.users.count()?;
        let stats = self.api_stats.read().await;
        let uptime = stats.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0);

        Ok(ApiStatsResponse {
            total_requests: stats.total_requests,
            successful_requests: stats.successful_requests,
            failed_requests: stats.failed_requests,
            users_registered: stats.users_registered,
            transactions_prepared: stats.transactions_prepared,
            transactions_submitted: stats.transactions_submitted,
            total_users,
            uptime_seconds: uptime,
            chain: self.chain.name(),
        })
    }

    async fn note_registration(&self) {
        self.api_stats.write().await.users_registered += 1;
    }

    async fn note_prepared(&self) {
        self.api_stats.write().await.transactions_prepared += 1;
    }

    async fn note_submitted(&self) {
        self.api_stats.write().await.transactions_submitted += 1;
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Service(MedShareError),
    InvalidInput(String),
    NotFound(String),
}

impl ApiError {
    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Service(err) => {
                if err.is_client_error() {
                    tracing::debug!(error = %err, "request rejected");
                }
                Self::service_status(err)
            }
        }
    }

    fn service_status(err: MedShareError) -> (StatusCode, String) {
        match err {
            MedShareError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            MedShareError::UserExists => {
                (StatusCode::BAD_REQUEST, "Email already registered".to_string())
            }
            e @ MedShareError::WalletExport(_) => (StatusCode::BAD_REQUEST, e.to_string()),
            MedShareError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            e @ MedShareError::MissingToken => (StatusCode::UNAUTHORIZED, e.to_string()),
            MedShareError::InvalidToken(reason) => {
                tracing::debug!(reason = %reason, "rejected token");
                (StatusCode::FORBIDDEN, "Invalid token".to_string())
            }
            MedShareError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            e @ (MedShareError::NonceUnavailable(_) | MedShareError::Node(_)) => {
                tracing::error!(error = %e, "node request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "Blockchain node request failed".to_string(),
                )
            }
            e @ (MedShareError::Database(_)
            | MedShareError::Crypto(_)
            | MedShareError::Config(_)
            | MedShareError::Internal(_)) => {
                tracing::error!(error = %e, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<MedShareError> for ApiError {
    fn from(err: MedShareError) -> Self {
        ApiError::Service(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidInput(format!("Invalid path: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidInput(format!("Invalid query: {}", rejection.body_text()))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Authentication
// ============================================================================

/// Claims of the bearer token on the request. Rejects with 401 when no token
/// is present and 403 when it does not verify.
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(MedShareError::MissingToken)?;

        Ok(AuthUser(state.tokens.verify(token)?))
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct DonationRequest {
    pub wallet_export: Option<Value>,
    pub to_address: Option<String>,
    pub amount: Option<Value>,
    pub memo: Option<String>,
    pub cause: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterDataRequest {
    pub wallet_export: Option<Value>,
    pub data: Option<String>,
    pub data_type: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ConsentRequest {
    pub wallet_export: Option<Value>,
    pub file_name: Option<String>,
    pub additional_info: Option<Value>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: PublicUser,
    pub token: String,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub user: PublicUser,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub account: String,
    pub transactions: Vec<HistoryEntry>,
    pub count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceAmount {
    pub ccd: String,
    pub micro_ccd: String,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub account: String,
    pub balance: BalanceAmount,
    pub nonce: String,
}

#[derive(Serialize)]
pub struct ApiStatsResponse {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub users_registered: u64,
    pub transactions_prepared: u64,
    pub transactions_submitted: u64,
    pub total_users: usize,
    pub uptime_seconds: u64,
    pub chain: &'static str,
}

#[derive(Deserialize)]
struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    limit: u32,
}

fn default_history_limit() -> u32 {
    DEFAULT_HISTORY_LIMIT
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Trimmed, non-empty value of an optional request field.
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_path_address(raw: &str) -> Result<AccountAddress, ApiError> {
    AccountAddress::parse(raw).map_err(|_| ApiError::InvalidInput("Invalid account address".to_string()))
}

async fn prepare_for(
    state: &AppState,
    wallet_export: &Value,
) -> Result<(WalletExport, TransactionBuilder), ApiError> {
    let wallet = parse_wallet_export_value(wallet_export)?;
    let nonce = resolve_next_nonce(state.chain.as_ref(), &wallet.address).await?;
    let builder =
        TransactionBuilder::new(wallet.address, nonce).expires_in_minutes(state.settings.expiry_minutes);
    Ok((wallet, builder))
}

fn log_prepared(kind: &str, tx: &PreparedTransaction) {
    tracing::info!(
        kind = kind,
        sender = %tx.header.sender,
        nonce = tx.header.nonce,
        energy = tx.header.energy,
        "transaction prepared"
    );
}

// ============================================================================
// Middleware
// ============================================================================

/// Request statistics middleware
async fn stats_middleware(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let success = response.status().is_success();
    let mut stats = state.api_stats.write().await;
    stats.record_request(success);

    response
}

/// Logs method, path, status and duration of every request.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        path = %path,
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints
pub fn build_api_router(state: Arc<AppState>) -> Router {
    // Reflect the request's origin so browser clients can send credentials
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![
            http::header::CONTENT_TYPE,
            http::header::AUTHORIZATION,
        ])
        .allow_credentials(true);

    Router::new()
        // Account endpoints
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/profile", get(get_profile).put(update_profile))
        // Transaction endpoints
        .route("/transactions/donate", post(create_donation))
        .route("/transactions/register-data", post(register_medical_data))
        .route("/transactions/give-consent", post(give_consent))
        .route(
            "/transactions/history/:account_address",
            get(get_transaction_history),
        )
        .route(
            "/transactions/balance/:account_address",
            get(get_account_balance),
        )
        // System endpoints
        .route("/health", get(health_check))
        .route("/stats", get(get_api_stats))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            stats_middleware,
        ))
        .with_state(state)
        .layer(cors)
}

/// Serve the API on all interfaces until the process is stopped.
pub async fn run_api_server(state: Arc<AppState>, port: u16) -> Result<(), MedShareError> {
    let app = build_api_router(state.clone());
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, chain = state.chain.name(), "API server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Route Handlers: accounts
// ============================================================================

async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(req) = payload?;
    let email = req.email.unwrap_or_default();
    let password = req.password.unwrap_or_default();
    let name = req.name.unwrap_or_default();

    auth::validate_registration(&email, &password, &name)?;

    let password_hash = tokio::task::spawn_blocking(move || auth::hash_password(&password))
        .await
        .map_err(|e| MedShareError::Internal(format!("hashing task failed: {}", e)))??;

    let user = state.users.create(NewUser {
        email,
        password_hash,
        name: name.trim().to_string(),
    })?;
    let token = state.tokens.issue(&user)?;
    state.note_registration().await;

    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user: user.to_public(),
            token,
        }),
    ))
}

async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(req) = payload?;
    let (Some(email), Some(password)) = (present(&req.email), req.password.filter(|p| !p.is_empty()))
    else {
        return Err(ApiError::InvalidInput(
            "Email and password are required".to_string(),
        ));
    };

    let user = state
        .users
        .find_by_email(email)?
        .ok_or(MedShareError::InvalidCredentials)?;

    let stored_hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || auth::verify_password(&password, &stored_hash))
        .await
        .map_err(|e| MedShareError::Internal(format!("verification task failed: {}", e)))?;
    if !valid {
        tracing::debug!(user_id = %user.id, "password mismatch");
        return Err(MedShareError::InvalidCredentials.into());
    }

    let token = state.tokens.issue(&user)?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user: user.to_public(),
        token,
    }))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state
        .users
        .find_by_id(&claims.id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ProfileResponse {
        message: None,
        user: user.to_public(),
    }))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let Json(req) = payload?;
    if matches!(&req.name, Some(name) if name.trim().is_empty()) {
        return Err(ApiError::InvalidInput("Name cannot be empty".to_string()));
    }

    let user = state
        .users
        .update_profile(&claims.id, present(&req.name))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ProfileResponse {
        message: Some("Profile updated successfully".to_string()),
        user: user.to_public(),
    }))
}

// ============================================================================
// Route Handlers: transactions
// ============================================================================

async fn create_donation(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    payload: Result<Json<DonationRequest>, JsonRejection>,
) -> Result<Json<formatter::PreparedResponse<formatter::DonationDetails>>, ApiError> {
    let Json(req) = payload?;
    let missing =
        || ApiError::InvalidInput("Wallet export, recipient address, and amount are required".to_string());

    let wallet_export = req.wallet_export.as_ref().ok_or_else(missing)?;
    let amount = req.amount.as_ref().filter(|v| !v.is_null()).ok_or_else(missing)?;
    let to = match present(&req.to_address) {
        Some(raw) => AccountAddress::parse(raw)
            .map_err(|_| ApiError::InvalidInput("Invalid recipient address".to_string()))?,
        None => state.settings.default_recipient.ok_or_else(missing)?,
    };

    let amount = CcdAmount::from_json(amount)
        .ok()
        .filter(|a| !a.is_zero())
        .ok_or_else(|| ApiError::InvalidInput("Invalid amount".to_string()))?;

    let memo = req.memo.filter(|m| !m.is_empty());
    let memo_bytes = memo.as_deref().map(decode_memo).transpose()?;

    let (_, builder) = prepare_for(&state, wallet_export).await?;
    let tx = builder.transfer(to, amount, memo_bytes)?;

    log_prepared("transfer", &tx);
    tracing::debug!(user_id = %claims.id, to = %to, amount = %amount, "donation prepared");
    state.note_prepared().await;

    Ok(Json(formatter::donation_response(&tx, memo, req.cause)))
}

async fn register_medical_data(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    payload: Result<Json<RegisterDataRequest>, JsonRejection>,
) -> Result<Json<formatter::PreparedResponse<formatter::DataRegistrationDetails>>, ApiError> {
    let Json(req) = payload?;
    let (Some(wallet_export), Some(data)) = (req.wallet_export.as_ref(), present(&req.data)) else {
        return Err(ApiError::InvalidInput(
            "Wallet export and data are required".to_string(),
        ));
    };

    let data = decode_hex_data(data)?;
    let (_, builder) = prepare_for(&state, wallet_export).await?;
    let tx = builder.register_data(data)?;

    log_prepared("register_data", &tx);
    tracing::debug!(user_id = %claims.id, "data registration prepared");
    state.note_prepared().await;

    Ok(Json(formatter::data_registration_response(&tx, req.data_type)))
}

async fn give_consent(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConsentRequest>, JsonRejection>,
) -> Result<Json<formatter::ConsentResponse>, ApiError> {
    let Json(req) = payload?;
    let (Some(wallet_export), Some(file_name)) = (req.wallet_export.as_ref(), present(&req.file_name))
    else {
        return Err(ApiError::InvalidInput(
            "Wallet export and file name are required".to_string(),
        ));
    };

    let (wallet, builder) = prepare_for(&state, wallet_export).await?;
    let parameter = json!({
        "account": wallet.address.to_string(),
        "fileName": file_name,
        "additionalInfo": req.additional_info.clone().unwrap_or(Value::Null),
        "consentedAt": chrono::Utc::now().to_rfc3339(),
    });
    let call = ContractCall::with_json_parameter(
        state.settings.consent_contract,
        state.settings.consent_receive_name.clone(),
        state.settings.consent_max_energy,
        &parameter,
    )?;
    let tx = builder.contract_call(call)?;
    log_prepared("contract_call", &tx);

    let Some(signer) = wallet.signer() else {
        state.note_prepared().await;
        return Ok(Json(formatter::consent_unsigned(&tx, file_name)));
    };

    let signatures = signer.sign_digest(&tx.sign_digest());
    let signed = SignedTransaction::new(tx, signatures);
    let hash = state.chain.submit_transaction(&signed).await?;
    state.note_submitted().await;

    tracing::info!(
        sender = %wallet.address,
        hash = %hash,
        keys = signer.key_count(),
        "consent submitted"
    );

    Ok(Json(formatter::consent_submitted(
        &signed.transaction,
        file_name,
        hash,
    )))
}

async fn get_transaction_history(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Path(account_address) = path?;
    let Query(query) = query?;
    let address = parse_path_address(&account_address)?;
    let limit = query.limit.clamp(1, MAX_HISTORY_LIMIT);

    let transactions = state.chain.transaction_history(&address, limit).await?;

    Ok(Json(HistoryResponse {
        account: address.to_string(),
        count: transactions.len(),
        transactions,
    }))
}

async fn get_account_balance(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let Path(account_address) = path?;
    let address = parse_path_address(&account_address)?;

    let info = state
        .chain
        .account_info(&address)
        .await?
        .ok_or_else(|| ApiError::NotFound("Account not found on blockchain".to_string()))?;

    Ok(Json(BalanceResponse {
        account: info.address.to_string(),
        balance: BalanceAmount {
            ccd: info.balance.to_ccd_string(),
            micro_ccd: info.balance.micro_ccd().to_string(),
        },
        nonce: info.next_nonce.to_string(),
    }))
}

// ============================================================================
// Route Handlers: system
// ============================================================================

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.chain.check_connection().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "chain": state.chain.name(),
                "nodeReachable": true,
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, chain = state.chain.name(), "node connection check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "chain": state.chain.name(),
                    "nodeReachable": false,
                    "timestamp": chrono::Utc::now().to_rfc3339()
                })),
            )
        }
    }
}

async fn get_api_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiStatsResponse>, ApiError> {
    Ok(Json(state.get_stats().await?))
}
