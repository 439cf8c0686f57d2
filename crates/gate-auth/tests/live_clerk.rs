//! # Live integration tests for gate-auth
//!
//! These tests require live Clerk credentials. They are skipped (not failed)
//! when credentials are missing.
//!
//! ## Required environment variables
//!
//! ```bash
//! GATEHOUSE_CLERK__SECRET_KEY=sk_test_...
//! ```
//!
//! Optional: `GATEHOUSE_TEST__USER_ID=user_...` to pin a specific test user.
//! If not set, tests resolve the most recently created user from the Backend API.
//!
//! ## Run
//!
//! ```bash
//! cargo test -p gate-auth --test live_clerk -- --nocapture
//! ```

use gate_auth::{
    AuthError, Gatehouse, ListMembersParams, MembershipLookup, MetadataGateway, MetadataPatch,
};
use gate_config::{ClerkConfig, GatehouseConfig};
use gate_core::UserId;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("GATEHOUSE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

fn clerk_config() -> Option<ClerkConfig> {
    init_tracing();
    let config = GatehouseConfig::load_with_dotenv().ok()?;
    config.require_clerk().ok().cloned()
}

/// `GATEHOUSE_TEST__USER_ID`, or the most recent user from the Backend API.
async fn resolve_test_user_id(config: &ClerkConfig) -> anyhow::Result<Option<String>> {
    if let Ok(uid) = std::env::var("GATEHOUSE_TEST__USER_ID")
        && uid.starts_with("user_")
    {
        return Ok(Some(uid));
    }

    let users: serde_json::Value = reqwest::Client::new()
        .get(format!("{}/users?limit=1&order_by=-created_at", config.api_base()))
        .header("Authorization", format!("Bearer {}", config.secret_key))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(users
        .as_array()
        .and_then(|u| u.first())
        .and_then(|u| u["id"].as_str())
        .map(String::from))
}

/// First organization the test user belongs to, if any.
async fn resolve_test_org_id(config: &ClerkConfig, user_id: &str) -> anyhow::Result<Option<String>> {
    let memberships: serde_json::Value = reqwest::Client::new()
        .get(format!(
            "{}/users/{user_id}/organization_memberships?limit=1",
            config.api_base()
        ))
        .header("Authorization", format!("Bearer {}", config.secret_key))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(memberships["data"]
        .as_array()
        .and_then(|d| d.first())
        .and_then(|m| m["organization"]["id"].as_str())
        .map(String::from))
}

fn bearer(jwt: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {jwt}")).expect("valid header"),
    );
    headers
}

// ---------------------------------------------------------------------------
// Session resolution
// ---------------------------------------------------------------------------

/// Mint a session token for the test user and resolve it end to end.
#[tokio::test]
async fn minted_session_resolves_to_user_record() -> anyhow::Result<()> {
    let Some(config) = clerk_config() else {
        eprintln!("SKIP: GATEHOUSE_CLERK__SECRET_KEY not set");
        return Ok(());
    };
    let Some(user_id) = resolve_test_user_id(&config).await? else {
        eprintln!("SKIP: could not resolve test user_id");
        return Ok(());
    };

    let gatehouse = Gatehouse::from_config(&config)?;
    let session_id = match gatehouse.client().create_session(&user_id).await {
        Ok(id) => id,
        Err(error) => {
            eprintln!("SKIP: session creation not permitted on this instance: {error}");
            return Ok(());
        }
    };
    let token = gatehouse
        .client()
        .refresh_session_token(&session_id, None, None)
        .await?;
    assert!(token.expires_at()? > chrono::Utc::now());

    let record = gatehouse.resolve_user(&bearer(&token.jwt)).await?;
    assert_eq!(record.user_id, UserId::Str(user_id.clone()));
    assert!(record.public_metadata.is_some());

    eprintln!("  PASS: resolved user={} org={:?}", record.user_id, record.org_id);
    Ok(())
}

/// A garbage token is a clean not-signed-in, not a resolution failure.
#[tokio::test]
async fn invalid_token_is_not_signed_in() -> anyhow::Result<()> {
    let Some(config) = clerk_config() else {
        eprintln!("SKIP: GATEHOUSE_CLERK__SECRET_KEY not set");
        return Ok(());
    };

    let gatehouse = Gatehouse::from_config(&config)?;
    let err = gatehouse
        .resolve_user(&bearer("invalid.jwt.token"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, AuthError::NotSignedIn { .. }),
        "expected NotSignedIn, got {err:?}"
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

#[tokio::test]
async fn membership_listing_and_lookup() -> anyhow::Result<()> {
    let Some(config) = clerk_config() else {
        eprintln!("SKIP: GATEHOUSE_CLERK__SECRET_KEY not set");
        return Ok(());
    };
    let Some(user_id) = resolve_test_user_id(&config).await? else {
        eprintln!("SKIP: could not resolve test user_id");
        return Ok(());
    };
    let Some(org_id) = resolve_test_org_id(&config, &user_id).await? else {
        eprintln!("SKIP: test user has no organization membership");
        return Ok(());
    };

    let gatehouse = Gatehouse::from_config(&config)?;
    let client = gatehouse.client();

    let listing = client
        .list_members(
            &org_id,
            &ListMembersParams {
                limit: 1000,
                ..Default::default()
            },
        )
        .await;
    assert!(listing.error().is_none(), "listing failed: {listing:?}");
    assert!(listing.members().len() <= 500);
    assert!(listing.total_count() >= 1);

    let member = client
        .find_membership(&org_id, &user_id)
        .await?
        .expect("test user should be a member");
    assert_eq!(member.user_id, user_id);
    assert!(!member.role.is_empty());

    let missing = client.list_members("org_does_not_exist", &ListMembersParams::default()).await;
    assert!(missing.error().is_some());
    assert_eq!(missing.total_count(), 0);
    Ok(())
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Set a private key on the test user, then remove it again.
#[tokio::test]
async fn user_private_metadata_merge_and_delete() -> anyhow::Result<()> {
    let Some(config) = clerk_config() else {
        eprintln!("SKIP: GATEHOUSE_CLERK__SECRET_KEY not set");
        return Ok(());
    };
    let Some(user_id) = resolve_test_user_id(&config).await? else {
        eprintln!("SKIP: could not resolve test user_id");
        return Ok(());
    };

    let gatehouse = Gatehouse::from_config(&config)?;
    let client = gatehouse.client();

    let mut meta = serde_json::Map::new();
    meta.insert("gatehouse_live_test".into(), json!(true));
    let updated = client
        .update_user_metadata(&user_id, &MetadataPatch::private(meta))
        .await?;
    assert_eq!(updated["private_metadata"]["gatehouse_live_test"], json!(true));

    let cleared = client
        .update_user_metadata(
            &user_id,
            &MetadataPatch::default().remove_private_key("gatehouse_live_test"),
        )
        .await?;
    assert!(cleared["private_metadata"].get("gatehouse_live_test").is_none());
    Ok(())
}
