use chrono::Duration;

use crate::application::cart_service::CartService;
use crate::application::checkout_service::CheckoutService;
use crate::application::coupon_service::CouponService;
use crate::application::order_service::OrderService;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::infrastructure::cart_repo::DieselCartRepository;
use crate::infrastructure::coupon_repo::DieselCouponRepository;
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::infrastructure::payment_repo::DieselPaymentRepository;
use crate::infrastructure::vnpay::VnpayGateway;

pub type Checkout = CheckoutService<DieselOrderRepository, DieselPaymentRepository, VnpayGateway>;

/// Services shared by every worker, wired to the Diesel repositories.
pub struct AppState {
    pub carts: CartService<DieselCartRepository>,
    pub coupons: CouponService<DieselCouponRepository>,
    pub orders: OrderService<DieselOrderRepository>,
    pub checkout: Checkout,
}

impl AppState {
    pub fn new(pool: DbPool, config: &AppConfig) -> Self {
        let vnpay = &config.vnpay;
        let gateway = VnpayGateway::new(
            vnpay.tmn_code.clone(),
            vnpay.hash_secret.clone(),
            vnpay.pay_url.clone(),
            vnpay.return_url.clone(),
        );

        Self {
            carts: CartService::new(DieselCartRepository::new(pool.clone())),
            coupons: CouponService::new(DieselCouponRepository::new(pool.clone())),
            orders: OrderService::new(DieselOrderRepository::new(pool.clone())),
            checkout: CheckoutService::new(
                DieselOrderRepository::new(pool.clone()),
                DieselPaymentRepository::new(pool),
                gateway,
                config.shipping_fee.clone(),
                Duration::minutes(config.payment_expiry_minutes),
            ),
        }
    }
}
