use std::env;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use thiserror::Error;

const DEFAULT_VNPAY_URL: &str = "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable '{0}'")]
    Missing(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct VnpayConfig {
    pub tmn_code: String,
    pub hash_secret: String,
    pub pay_url: String,
    pub return_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_pool_size: u32,
    pub jwt_secret: String,
    /// Flat shipping fee added to every order.
    pub shipping_fee: BigDecimal,
    pub payment_expiry_minutes: i64,
    pub vnpay: VnpayConfig,
}

impl AppConfig {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));
        let or_default = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let shipping_fee = parse("SHIPPING_FEE", get("SHIPPING_FEE"), BigDecimal::zero())?;
        if shipping_fee < BigDecimal::zero() {
            return Err(ConfigError::Invalid {
                name: "SHIPPING_FEE",
                reason: "must not be negative".to_string(),
            });
        }
        let payment_expiry_minutes = parse("PAYMENT_EXPIRY_MINUTES", get("PAYMENT_EXPIRY_MINUTES"), 15)?;
        if payment_expiry_minutes <= 0 {
            return Err(ConfigError::Invalid {
                name: "PAYMENT_EXPIRY_MINUTES",
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            host: or_default("HOST", "0.0.0.0"),
            port: parse("PORT", get("PORT"), 8080)?,
            database_url: required("DATABASE_URL")?,
            db_pool_size: parse("DB_POOL_SIZE", get("DB_POOL_SIZE"), 10)?,
            jwt_secret: required("JWT_SECRET")?,
            shipping_fee,
            payment_expiry_minutes,
            vnpay: VnpayConfig {
                tmn_code: or_default("VNPAY_TMN_CODE", ""),
                hash_secret: or_default("VNPAY_HASH_SECRET", ""),
                pay_url: or_default("VNPAY_URL", DEFAULT_VNPAY_URL),
                return_url: or_default("VNPAY_RETURN_URL", "http://localhost:8080/api/return_checkout_vnpay"),
            },
        })
    }
}

fn parse<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/orders"),
        ("JWT_SECRET", "s3cret"),
    ];

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&REQUIRED).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.db_pool_size, 10);
        assert_eq!(cfg.shipping_fee, BigDecimal::zero());
        assert_eq!(cfg.payment_expiry_minutes, 15);
        assert_eq!(cfg.vnpay.pay_url, DEFAULT_VNPAY_URL);
    }

    #[test]
    fn missing_secret_is_reported_by_name() {
        let err = config(&[("DATABASE_URL", "postgres://localhost/orders")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORT", "eighty"));
        assert!(matches!(
            config(&vars),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("SHIPPING_FEE", "-5"));
        assert!(matches!(
            config(&vars),
            Err(ConfigError::Invalid { name: "SHIPPING_FEE", .. })
        ));
    }

    #[test]
    fn shipping_fee_is_decimal() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("SHIPPING_FEE", "30000.50"));
        let cfg = config(&vars).unwrap();
        assert_eq!(cfg.shipping_fee, BigDecimal::from_str("30000.5").unwrap());
    }
}
