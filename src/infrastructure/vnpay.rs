use std::collections::BTreeMap;

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, FixedOffset, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::payment::{GatewayOutcome, PaymentAttempt};
use crate::domain::ports::PaymentGateway;

type HmacSha512 = Hmac<Sha512>;

const VERSION: &str = "2.1.0";
const SECURE_HASH: &str = "vnp_SecureHash";
const SECURE_HASH_TYPE: &str = "vnp_SecureHashType";
/// VNPay timestamps are Vietnam local time (UTC+7).
const GATEWAY_UTC_OFFSET_SECS: i32 = 7 * 3600;

/// VNPay merchant credentials and endpoints.
#[derive(Debug, Clone)]
pub struct VnpayGateway {
    tmn_code: String,
    hash_secret: String,
    pay_url: String,
    return_url: String,
}

impl VnpayGateway {
    pub fn new(tmn_code: String, hash_secret: String, pay_url: String, return_url: String) -> Self {
        Self {
            tmn_code,
            hash_secret,
            pay_url,
            return_url,
        }
    }

    fn mac(&self) -> Result<HmacSha512, DomainError> {
        HmacSha512::new_from_slice(self.hash_secret.as_bytes())
            .map_err(|e| DomainError::Internal(format!("vnpay hash key: {e}")))
    }

    /// Form-encodes the `vnp_*` parameters in key order, as the gateway hashes them.
    fn signing_data(params: &BTreeMap<String, String>) -> Result<String, DomainError> {
        let signed: BTreeMap<&str, &str> = params
            .iter()
            .filter(|(k, v)| {
                k.starts_with("vnp_") && *k != SECURE_HASH && *k != SECURE_HASH_TYPE && !v.is_empty()
            })
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        serde_urlencoded::to_string(signed)
            .map_err(|e| DomainError::Internal(format!("vnpay query encoding: {e}")))
    }

    fn sign(&self, data: &str) -> Result<String, DomainError> {
        let mut mac = self.mac()?;
        mac.update(data.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

fn gateway_time(at: DateTime<Utc>) -> Result<String, DomainError> {
    let offset = FixedOffset::east_opt(GATEWAY_UTC_OFFSET_SECS)
        .ok_or_else(|| DomainError::Internal("invalid gateway offset".to_string()))?;
    Ok(at.with_timezone(&offset).format("%Y%m%d%H%M%S").to_string())
}

/// Amounts travel in the smallest unit: VND × 100.
fn gateway_amount(amount: &BigDecimal) -> Result<i64, DomainError> {
    (amount * BigDecimal::from(100))
        .with_scale(0)
        .to_i64()
        .ok_or_else(|| DomainError::Internal(format!("amount {amount} out of range")))
}

fn charged_amount(raw: &str) -> Result<BigDecimal, DomainError> {
    let minor: i64 = raw
        .parse()
        .map_err(|_| DomainError::InvalidInput("vnp_Amount is malformed".to_string()))?;
    Ok(BigDecimal::from(minor) / BigDecimal::from(100))
}

impl PaymentGateway for VnpayGateway {
    fn redirect_url(&self, attempt: &PaymentAttempt, client_ip: &str) -> Result<String, DomainError> {
        let txn_ref = attempt.id.simple().to_string();
        let params: BTreeMap<String, String> = [
            ("vnp_Version", VERSION.to_string()),
            ("vnp_Command", "pay".to_string()),
            ("vnp_TmnCode", self.tmn_code.clone()),
            ("vnp_Amount", gateway_amount(&attempt.amount)?.to_string()),
            ("vnp_CurrCode", "VND".to_string()),
            ("vnp_TxnRef", txn_ref.clone()),
            ("vnp_OrderInfo", format!("Thanh toan don hang {txn_ref}")),
            ("vnp_OrderType", "other".to_string()),
            ("vnp_Locale", "vn".to_string()),
            ("vnp_ReturnUrl", self.return_url.clone()),
            ("vnp_IpAddr", client_ip.to_string()),
            ("vnp_CreateDate", gateway_time(attempt.created_at)?),
            ("vnp_ExpireDate", gateway_time(attempt.expires_at)?),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let query = Self::signing_data(&params)?;
        let signature = self.sign(&query)?;
        Ok(format!("{}?{}&{}={}", self.pay_url, query, SECURE_HASH, signature))
    }

    fn verify_callback(&self, params: &BTreeMap<String, String>) -> Result<GatewayOutcome, DomainError> {
        let provided = params
            .get(SECURE_HASH)
            .filter(|s| !s.is_empty())
            .ok_or(DomainError::InvalidSignature)?;
        let provided = hex::decode(provided).map_err(|_| DomainError::InvalidSignature)?;

        let mut mac = self.mac()?;
        mac.update(Self::signing_data(params)?.as_bytes());
        mac.verify_slice(&provided)
            .map_err(|_| DomainError::InvalidSignature)?;

        let txn_ref = params
            .get("vnp_TxnRef")
            .and_then(|r| Uuid::parse_str(r).ok())
            .ok_or_else(|| DomainError::InvalidInput("vnp_TxnRef is missing or malformed".to_string()))?;
        let response_code = params
            .get("vnp_ResponseCode")
            .cloned()
            .ok_or_else(|| DomainError::InvalidInput("vnp_ResponseCode is missing".to_string()))?;
        let amount = params
            .get("vnp_Amount")
            .ok_or_else(|| DomainError::InvalidInput("vnp_Amount is missing".to_string()))
            .and_then(|raw| charged_amount(raw))?;

        Ok(GatewayOutcome {
            txn_ref,
            response_code,
            amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::domain::payment::PaymentAttemptStatus;
    use crate::infrastructure::test_support::checkout_request;

    fn gateway() -> VnpayGateway {
        VnpayGateway::new(
            "DEMO0001".to_string(),
            "SECRETKEY".to_string(),
            "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string(),
            "http://localhost:3000/payment/return".to_string(),
        )
    }

    fn attempt(amount: &str) -> PaymentAttempt {
        let created_at = Utc.with_ymd_and_hms(2025, 3, 1, 2, 30, 0).unwrap();
        PaymentAttempt {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            request: checkout_request(None),
            amount: BigDecimal::from_str(amount).unwrap(),
            status: PaymentAttemptStatus::Pending,
            order_id: None,
            expires_at: created_at + Duration::minutes(15),
            created_at,
        }
    }

    fn query_params(url: &str) -> BTreeMap<String, String> {
        let (_, query) = url.split_once('?').unwrap();
        serde_urlencoded::from_str(query).unwrap()
    }

    #[test]
    fn redirect_carries_amount_times_100_and_local_time() {
        let a = attempt("460000");
        let url = gateway().redirect_url(&a, "127.0.0.1").unwrap();
        assert!(url.starts_with("https://sandbox.vnpayment.vn/paymentv2/vpcpay.html?"));

        let params = query_params(&url);
        assert_eq!(params["vnp_Amount"], "46000000");
        assert_eq!(params["vnp_TxnRef"], a.id.simple().to_string());
        assert_eq!(params["vnp_CreateDate"], "20250301093000");
        assert_eq!(params["vnp_ExpireDate"], "20250301094500");
        assert_eq!(params["vnp_SecureHash"].len(), 128);
    }

    #[test]
    fn signed_callback_verifies() {
        let a = attempt("1000");
        let mut params = query_params(&gateway().redirect_url(&a, "127.0.0.1").unwrap());
        params.remove(SECURE_HASH);
        params.insert("vnp_ResponseCode".to_string(), "00".to_string());
        let signature = gateway().sign(&VnpayGateway::signing_data(&params).unwrap()).unwrap();
        params.insert(SECURE_HASH.to_string(), signature);
        params.insert(SECURE_HASH_TYPE.to_string(), "HmacSHA512".to_string());

        let outcome = gateway().verify_callback(&params).unwrap();
        assert_eq!(outcome.txn_ref, a.id);
        assert!(outcome.is_approved());
        assert_eq!(outcome.amount, a.amount);
        assert!(outcome.ensure_amount(&a.amount).is_ok());
    }

    #[test]
    fn signed_callback_with_other_amount_is_reported() {
        let a = attempt("1000");
        let mut params = query_params(&gateway().redirect_url(&a, "127.0.0.1").unwrap());
        params.remove(SECURE_HASH);
        params.insert("vnp_ResponseCode".to_string(), "00".to_string());
        params.insert("vnp_Amount".to_string(), "100".to_string());
        let signature = gateway().sign(&VnpayGateway::signing_data(&params).unwrap()).unwrap();
        params.insert(SECURE_HASH.to_string(), signature);

        let outcome = gateway().verify_callback(&params).unwrap();
        assert_eq!(outcome.amount, BigDecimal::from(1));
        assert!(matches!(
            outcome.ensure_amount(&a.amount),
            Err(DomainError::PaymentAmountMismatch { .. })
        ));
    }

    #[test]
    fn tampered_callback_is_rejected() {
        let a = attempt("1000");
        let mut params = query_params(&gateway().redirect_url(&a, "127.0.0.1").unwrap());
        params.insert("vnp_Amount".to_string(), "1".to_string());
        assert!(matches!(
            gateway().verify_callback(&params),
            Err(DomainError::InvalidSignature)
        ));

        params.remove(SECURE_HASH);
        assert!(matches!(
            gateway().verify_callback(&params),
            Err(DomainError::InvalidSignature)
        ));
    }
}
