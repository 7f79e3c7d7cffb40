//! Stripe integration via REST API (no SDK dependency)

use hmac::{Hmac, Mac};
use sha2::Sha256;

use shared::models::SubscriptionInterval;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One checkout line, priced inline (`price_data`) so the storefront never has
/// to mirror its catalog into Stripe Products/Prices.
pub struct CheckoutLine {
    pub name: String,
    pub description: Option<String>,
    pub currency: String,
    /// Unit amount in minor units (cents)
    pub unit_amount: i64,
    pub quantity: i64,
    /// Present for subscription products
    pub recurring: Option<(SubscriptionInterval, i32)>,
}

/// Everything needed to create a checkout session.
pub struct CheckoutSessionRequest<'a> {
    pub lines: &'a [CheckoutLine],
    pub success_url: &'a str,
    pub cancel_url: &'a str,
    pub customer_email: Option<&'a str>,
    /// Metadata echoed back in `checkout.session.completed`; the webhook
    /// rebuilds the order from these three keys.
    pub store_id: i64,
    pub user_id: Option<&'a str>,
    /// JSON-encoded cart lines (`[{"product_id":..,"quantity":..}]`)
    pub items_json: &'a str,
}

/// Created session: id for reconciliation, url for the customer redirect.
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Build the form-encoded body for the checkout sessions endpoint.
///
/// Mixed carts containing any subscription line use `subscription` mode;
/// one-time-only carts use `payment` mode.
fn checkout_form(req: &CheckoutSessionRequest<'_>) -> Vec<(String, String)> {
    let mode = if req.lines.iter().any(|l| l.recurring.is_some()) {
        "subscription"
    } else {
        "payment"
    };

    let mut form: Vec<(String, String)> = vec![
        ("mode".into(), mode.into()),
        ("success_url".into(), req.success_url.into()),
        ("cancel_url".into(), req.cancel_url.into()),
        ("metadata[store_id]".into(), req.store_id.to_string()),
        ("metadata[items]".into(), req.items_json.into()),
    ];

    if let Some(user_id) = req.user_id {
        form.push(("metadata[user_id]".into(), user_id.into()));
    }
    if let Some(email) = req.customer_email {
        form.push(("customer_email".into(), email.into()));
    }

    for (i, line) in req.lines.iter().enumerate() {
        form.push((format!("line_items[{i}][quantity]"), line.quantity.to_string()));
        form.push((
            format!("line_items[{i}][price_data][currency]"),
            line.currency.clone(),
        ));
        form.push((
            format!("line_items[{i}][price_data][unit_amount]"),
            line.unit_amount.to_string(),
        ));
        form.push((
            format!("line_items[{i}][price_data][product_data][name]"),
            line.name.clone(),
        ));
        if let Some(desc) = line.description.as_deref().filter(|d| !d.is_empty()) {
            form.push((
                format!("line_items[{i}][price_data][product_data][description]"),
                desc.into(),
            ));
        }
        if let Some((interval, count)) = &line.recurring {
            form.push((
                format!("line_items[{i}][price_data][recurring][interval]"),
                interval.as_str().into(),
            ));
            form.push((
                format!("line_items[{i}][price_data][recurring][interval_count]"),
                count.to_string(),
            ));
        }
    }

    form
}

/// Create a Stripe Checkout Session
pub async fn create_checkout_session(
    secret_key: &str,
    req: &CheckoutSessionRequest<'_>,
) -> Result<CheckoutSession, BoxError> {
    let form = checkout_form(req);

    let client = reqwest::Client::new();
    let resp: serde_json::Value = client
        .post("https://api.stripe.com/v1/checkout/sessions")
        .basic_auth(secret_key, None::<&str>)
        .form(&form)
        .send()
        .await?
        .json()
        .await?;

    match (resp["id"].as_str(), resp["url"].as_str()) {
        (Some(id), Some(url)) => Ok(CheckoutSession {
            id: id.to_string(),
            url: url.to_string(),
        }),
        _ => Err(format!("Stripe create_checkout failed: {resp}").into()),
    }
}

/// Verify Stripe webhook signature (HMAC-SHA256)
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signature = "";
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }

    if timestamp.is_empty() || signature.is_empty() {
        return Err("Invalid Stripe-Signature header");
    }

    let signed_payload = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap_or(""));
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(signed_payload.as_bytes());

    // Decode hex signature and use constant-time comparison via hmac::verify_slice
    let sig_bytes = hex::decode(signature).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "Webhook signature mismatch")?;

    // Reject events older than 5 minutes to prevent replay attacks
    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > 300 {
        return Err("Webhook timestamp too old");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let signed_payload = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap());
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(signed_payload.as_bytes());
        let sig = hex::encode(mac.finalize().into_bytes());
        format!("t={timestamp},v1={sig}")
    }

    #[test]
    fn valid_signature_passes() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let header = sign(payload, "whsec_test", chrono::Utc::now().timestamp());
        assert!(verify_webhook_signature(payload, &header, "whsec_test").is_ok());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let header = sign(payload, "whsec_test", chrono::Utc::now().timestamp());
        let err = verify_webhook_signature(b"{\"type\":\"evil\"}", &header, "whsec_test");
        assert_eq!(err, Err("Webhook signature mismatch"));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let payload = b"{}";
        let header = sign(payload, "whsec_test", chrono::Utc::now().timestamp());
        assert!(verify_webhook_signature(payload, &header, "whsec_other").is_err());
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let payload = b"{}";
        let header = sign(payload, "whsec_test", chrono::Utc::now().timestamp() - 600);
        assert_eq!(
            verify_webhook_signature(payload, &header, "whsec_test"),
            Err("Webhook timestamp too old")
        );
    }

    #[test]
    fn malformed_header_is_rejected() {
        assert!(verify_webhook_signature(b"{}", "garbage", "whsec_test").is_err());
        assert!(verify_webhook_signature(b"{}", "t=123", "whsec_test").is_err());
        assert!(verify_webhook_signature(b"{}", "v1=abcd", "whsec_test").is_err());
    }

    #[test]
    fn payment_cart_uses_payment_mode() {
        let lines = vec![CheckoutLine {
            name: "Mug".into(),
            description: None,
            currency: "usd".into(),
            unit_amount: 1250,
            quantity: 2,
            recurring: None,
        }];
        let req = CheckoutSessionRequest {
            lines: &lines,
            success_url: "https://s.example/ok",
            cancel_url: "https://s.example/no",
            customer_email: Some("c@example.com"),
            store_id: 3,
            user_id: Some("user_1"),
            items_json: r#"[{"product_id":10,"quantity":2}]"#,
        };

        let form = checkout_form(&req);
        let get = |k: &str| form.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());

        assert_eq!(get("mode"), Some("payment"));
        assert_eq!(get("metadata[store_id]"), Some("3"));
        assert_eq!(get("metadata[user_id]"), Some("user_1"));
        assert_eq!(
            get("metadata[items]"),
            Some(r#"[{"product_id":10,"quantity":2}]"#)
        );
        assert_eq!(get("line_items[0][quantity]"), Some("2"));
        assert_eq!(get("line_items[0][price_data][unit_amount]"), Some("1250"));
        assert_eq!(
            get("line_items[0][price_data][product_data][name]"),
            Some("Mug")
        );
        assert_eq!(get("line_items[0][price_data][recurring][interval]"), None);
    }

    #[test]
    fn mixed_cart_uses_subscription_mode() {
        let lines = vec![
            CheckoutLine {
                name: "Mug".into(),
                description: None,
                currency: "usd".into(),
                unit_amount: 1250,
                quantity: 1,
                recurring: None,
            },
            CheckoutLine {
                name: "Coffee Club".into(),
                description: Some("Monthly beans".into()),
                currency: "usd".into(),
                unit_amount: 1999,
                quantity: 1,
                recurring: Some((SubscriptionInterval::Month, 1)),
            },
        ];
        let req = CheckoutSessionRequest {
            lines: &lines,
            success_url: "https://s.example/ok",
            cancel_url: "https://s.example/no",
            customer_email: None,
            store_id: 1,
            user_id: None,
            items_json: "[]",
        };

        let form = checkout_form(&req);
        let get = |k: &str| form.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());

        assert_eq!(get("mode"), Some("subscription"));
        assert_eq!(get("metadata[user_id]"), None);
        assert_eq!(get("customer_email"), None);
        assert_eq!(
            get("line_items[1][price_data][recurring][interval]"),
            Some("month")
        );
        assert_eq!(
            get("line_items[1][price_data][recurring][interval_count]"),
            Some("1")
        );
        assert_eq!(
            get("line_items[1][price_data][product_data][description]"),
            Some("Monthly beans")
        );
    }
}
